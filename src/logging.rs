//! 诊断日志初始化
//!
//! 诊断信息通过 `tracing` 输出到stderr，受 `RUST_LOG` 控制；
//! 面向用户的进度提示仍然直接打印到stdout。

use tracing_subscriber::{EnvFilter, fmt, layer::SubscriberExt, util::SubscriberInitExt};

/// 未设置 `RUST_LOG` 时的默认过滤规则
pub fn default_filter(verbose: bool) -> &'static str {
    if verbose { "ev_supervisor=debug" } else { "warn" }
}

/// 安装全局subscriber，重复调用时静默忽略
pub fn init(verbose: bool) {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(default_filter(verbose)));

    let _ = tracing_subscriber::registry()
        .with(filter)
        .with(fmt::layer().with_writer(std::io::stderr).compact())
        .try_init();
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_filter() {
        assert_eq!(default_filter(false), "warn");
        assert_eq!(default_filter(true), "ev_supervisor=debug");
    }

    #[test]
    fn test_init_twice_does_not_panic() {
        init(false);
        init(true);
    }
}
