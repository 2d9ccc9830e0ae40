//! 监督流程的错误类型

use thiserror::Error;

use crate::supervisor::invoker::AgentError;
use crate::supervisor::state::Stage;

/// 监督流程中会中止整个任务的错误
#[derive(Debug, Error)]
pub enum SupervisorError {
    /// 步数超过上限。这是防止失控循环的熔断，调用方必须放弃本次运行
    #[error(
        "supervisor exceeded maximum total steps ({max_steps}) before running '{agent}'; aborting to avoid an infinite loop"
    )]
    StepLimitExceeded {
        agent: String,
        total_steps: usize,
        max_steps: usize,
    },

    /// 失败计数超过上限
    #[error("supervisor exceeded maximum retries ({max_retries}) before running '{agent}' (retry count {retry_count})")]
    RetryLimitExceeded {
        agent: String,
        retry_count: usize,
        max_retries: usize,
    },

    /// 阶段只能向前推进
    #[error("supervisor stage cannot move backwards from '{from}' to '{to}'")]
    StageRegression { from: Stage, to: Stage },

    /// 智能体调用失败，原样向上传播
    #[error("agent '{agent}' failed: {source}")]
    AgentFailed {
        agent: String,
        #[source]
        source: AgentError,
    },
}

impl SupervisorError {
    /// 是否属于循环安全类的致命错误
    pub fn is_fatal(&self) -> bool {
        matches!(
            self,
            SupervisorError::StepLimitExceeded { .. }
                | SupervisorError::RetryLimitExceeded { .. }
                | SupervisorError::StageRegression { .. }
        )
    }

    /// 出错时正在处理的智能体
    pub fn agent(&self) -> Option<&str> {
        match self {
            SupervisorError::StepLimitExceeded { agent, .. }
            | SupervisorError::RetryLimitExceeded { agent, .. }
            | SupervisorError::AgentFailed { agent, .. } => Some(agent),
            SupervisorError::StageRegression { .. } => None,
        }
    }
}
