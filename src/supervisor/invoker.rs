//! 协作智能体边界：消息、调用接口与错误类型

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::sync::Arc;
use thiserror::Error;

use crate::supervisor::response::AgentResponse;

/// 消息角色
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MessageRole {
    System,
    User,
    Assistant,
}

/// 提交给协作智能体的单条消息
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AgentMessage {
    pub role: MessageRole,
    pub content: String,
}

impl AgentMessage {
    pub fn user(content: impl Into<String>) -> Self {
        Self {
            role: MessageRole::User,
            content: content.into(),
        }
    }

    pub fn system(content: impl Into<String>) -> Self {
        Self {
            role: MessageRole::System,
            content: content.into(),
        }
    }
}

/// 协作智能体调用失败
#[derive(Debug, Error)]
pub enum AgentError {
    #[error("LLM request failed: {0}")]
    Llm(String),

    #[error("LLM request timed out after {0} seconds")]
    Timeout(u64),

    #[error("agent unavailable: {0}")]
    Unavailable(String),
}

/// 可调用的协作智能体
///
/// 接收结构化消息列表，异步返回形态不定的结果。
#[async_trait]
pub trait AgentInvoker: Send + Sync {
    async fn invoke(&self, messages: &[AgentMessage]) -> Result<AgentResponse, AgentError>;
}

/// 注入到编排器中的单个智能体配置
#[derive(Clone)]
pub struct AgentSpec {
    pub invoker: Arc<dyn AgentInvoker>,
    /// 关注领域描述，为空时使用通用描述
    pub focus: Option<String>,
    /// 是否要求在回答中附带新闻链接
    pub requires_citations: bool,
}

impl AgentSpec {
    pub fn new(invoker: Arc<dyn AgentInvoker>) -> Self {
        Self {
            invoker,
            focus: None,
            requires_citations: false,
        }
    }

    pub fn with_focus(mut self, focus: impl Into<String>) -> Self {
        self.focus = Some(focus.into());
        self
    }

    pub fn with_citations(mut self, requires_citations: bool) -> Self {
        self.requires_citations = requires_citations;
        self
    }
}

impl fmt::Debug for AgentSpec {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("AgentSpec")
            .field("focus", &self.focus)
            .field("requires_citations", &self.requires_citations)
            .finish_non_exhaustive()
    }
}
