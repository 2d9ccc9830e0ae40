//! 单个智能体的调用包装：构造提示、登记步骤、调用协作方并记录结果

use futures::future::BoxFuture;
use serde_json::{Map, Value};
use std::future::Future;
use tracing::{error, info};

use crate::i18n::TargetLanguage;
use crate::supervisor::error::SupervisorError;
use crate::supervisor::invoker::{AgentMessage, AgentSpec};
use crate::supervisor::response::AgentResponse;
use crate::supervisor::state::{SnapshotRecord, SupervisorState, ToPrimitive};

/// 未配置关注领域时使用的通用描述
pub const DEFAULT_FOCUS: &str = "your designated analysis scope";

/// 提示词参数
#[derive(Debug, Clone, PartialEq)]
pub struct PromptOptions {
    /// 要求回答的最大句数
    pub sentence_limit: usize,
    /// 回答语言
    pub language: TargetLanguage,
}

impl Default for PromptOptions {
    fn default() -> Self {
        Self {
            sentence_limit: 6,
            language: TargetLanguage::default(),
        }
    }
}

/// 由任务与关注领域组合出唯一的一条用户消息
pub fn build_agent_message(task: &str, spec: &AgentSpec, options: &PromptOptions) -> AgentMessage {
    let focus = spec
        .focus
        .as_deref()
        .filter(|focus| !focus.trim().is_empty())
        .unwrap_or(DEFAULT_FOCUS);
    let language = options.language.english_name();

    let mut content = format!(
        "{task}\n\nFocus on: {focus}\nProvide key facts in {limit} sentences or less in {language}. \
         Include only essential metrics and insights. Mention assumptions or risks concisely if necessary.",
        limit = options.sentence_limit,
    );
    if spec.requires_citations {
        content.push_str(&format!(
            " Include at least two URLs from recent relevant news after the {language} explanation."
        ));
    }
    AgentMessage::user(content)
}

/// 每个步骤完成后的进度回调，同步或异步
pub enum ProgressHandler {
    Sync(Box<dyn Fn(&SnapshotRecord) + Send + Sync>),
    Async(Box<dyn Fn(SnapshotRecord) -> BoxFuture<'static, ()> + Send + Sync>),
}

impl ProgressHandler {
    pub fn sync<F>(handler: F) -> Self
    where
        F: Fn(&SnapshotRecord) + Send + Sync + 'static,
    {
        ProgressHandler::Sync(Box::new(handler))
    }

    pub fn asynchronous<F, Fut>(handler: F) -> Self
    where
        F: Fn(SnapshotRecord) -> Fut + Send + Sync + 'static,
        Fut: Future<Output = ()> + Send + 'static,
    {
        ProgressHandler::Async(Box::new(move |record| Box::pin(handler(record))))
    }

    /// 同步回调直接调用，异步回调等待其完成
    pub async fn notify(&self, record: &SnapshotRecord) {
        match self {
            ProgressHandler::Sync(handler) => handler(record),
            ProgressHandler::Async(handler) => handler(record.clone()).await,
        }
    }
}

impl std::fmt::Debug for ProgressHandler {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ProgressHandler::Sync(_) => f.write_str("ProgressHandler::Sync"),
            ProgressHandler::Async(_) => f.write_str("ProgressHandler::Async"),
        }
    }
}

/// 写入快照的步骤结果：摘要与原始返回
#[derive(Debug)]
pub struct StepOutcome<'a> {
    pub summary: &'a str,
    pub raw: &'a AgentResponse,
}

impl ToPrimitive for StepOutcome<'_> {
    fn to_primitive(&self) -> Value {
        let mut map = Map::new();
        map.insert("summary".to_string(), self.summary.to_primitive());
        map.insert("raw".to_string(), self.raw.to_primitive());
        Value::Object(map)
    }
}

/// 调用一个智能体并把结果写入状态
///
/// 失败时 `retry_count` 加一并立即返回错误，不做任何本地重试。
pub async fn invoke_agent(
    agent_id: &str,
    spec: &AgentSpec,
    state: &mut SupervisorState,
    options: &PromptOptions,
    progress: Option<&ProgressHandler>,
) -> Result<String, SupervisorError> {
    let message = build_agent_message(state.task_input(), spec, options);

    state.step(agent_id)?;
    info!(
        agent = agent_id,
        step = state.total_steps(),
        stage = %state.stage(),
        "running agent"
    );

    let response = match spec.invoker.invoke(std::slice::from_ref(&message)).await {
        Ok(response) => response,
        Err(source) => {
            state.register_failure();
            error!(
                agent = agent_id,
                retry_count = state.retry_count(),
                error = %source,
                "agent failed"
            );
            return Err(SupervisorError::AgentFailed {
                agent: agent_id.to_string(),
                source,
            });
        }
    };

    let summary = response.summarise();
    state.log(agent_id, summary.clone());
    state.record_decision(summary.clone());
    let record = state.snapshot(
        agent_id,
        &StepOutcome {
            summary: &summary,
            raw: &response,
        },
    );

    if let Some(progress) = progress {
        progress.notify(&record).await;
    }

    Ok(summary)
}
