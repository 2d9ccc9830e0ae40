//! 进程退出码

use crate::render::RenderError;

/// 执行成功
pub const OK: i32 = 0;
/// 流水线、配置或IO失败
pub const FAILURE: i32 = 1;
/// 报告或图表元数据不合法
pub const INVALID_METADATA: i32 = 2;

/// 根据错误链中的根因选择退出码
pub fn for_error(err: &anyhow::Error) -> i32 {
    let invalid_metadata = err.chain().any(|cause| {
        matches!(
            cause.downcast_ref::<RenderError>(),
            Some(RenderError::InvalidMetadata(_))
        )
    });
    if invalid_metadata {
        INVALID_METADATA
    } else {
        FAILURE
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use anyhow::Context;

    #[test]
    fn test_invalid_metadata_maps_to_two() {
        let err: anyhow::Result<()> =
            Err(RenderError::InvalidMetadata("title too long".to_string())).context("render");
        assert_eq!(for_error(&err.unwrap_err()), INVALID_METADATA);
    }

    #[test]
    fn test_other_errors_map_to_one() {
        let status = anyhow::Error::from(RenderError::Status {
            status: 500,
            body: String::new(),
        });
        assert_eq!(for_error(&status), FAILURE);
        assert_eq!(for_error(&anyhow::anyhow!("boom")), FAILURE);
    }
}
