//! 智能体目录与编排名单
//!
//! 分析层：finance → market → oem → policy → supply
//! 校验层：cross → hallu → report

use async_trait::async_trait;
use std::fmt::Display;
use std::sync::Arc;
use std::time::Duration;

use crate::llm::client::LLMClient;
use crate::supervisor::invoker::{
    AgentError, AgentInvoker, AgentMessage, AgentSpec, MessageRole,
};
use crate::supervisor::response::AgentResponse;

/// 智能体所属层级
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum AgentKind {
    Analysis,
    Validation,
}

/// 内置的八个智能体角色
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum AgentRole {
    Finance,
    Market,
    Oem,
    Policy,
    Supply,
    CrossLayer,
    Hallucination,
    ReportQuality,
}

impl AgentRole {
    /// 分析层默认执行顺序
    pub const ANALYSIS: [AgentRole; 5] = [
        AgentRole::Finance,
        AgentRole::Market,
        AgentRole::Oem,
        AgentRole::Policy,
        AgentRole::Supply,
    ];

    /// 校验层默认执行顺序
    pub const VALIDATION: [AgentRole; 3] = [
        AgentRole::CrossLayer,
        AgentRole::Hallucination,
        AgentRole::ReportQuality,
    ];

    /// 稳定的智能体标识，也是笔记的键
    pub fn id(&self) -> &'static str {
        match self {
            AgentRole::Finance => "finance_agent",
            AgentRole::Market => "market_agent",
            AgentRole::Oem => "oem_agent",
            AgentRole::Policy => "policy_agent",
            AgentRole::Supply => "supply_agent",
            AgentRole::CrossLayer => "cross_agent",
            AgentRole::Hallucination => "hallu_agent",
            AgentRole::ReportQuality => "report_agent",
        }
    }

    pub fn kind(&self) -> AgentKind {
        match self {
            AgentRole::CrossLayer | AgentRole::Hallucination | AgentRole::ReportQuality => {
                AgentKind::Validation
            }
            _ => AgentKind::Analysis,
        }
    }

    /// 追加在任务后面的关注领域描述
    pub fn focus(&self) -> &'static str {
        match self {
            AgentRole::Finance => {
                "capital markets, funding flows, stock movements, and profitability indicators"
            }
            AgentRole::Market => "market demand, pricing, sales mix, and regional share dynamics",
            AgentRole::Oem => "OEM strategies, product launches, and competitive positioning",
            AgentRole::Policy => {
                "major policy, regulatory, and incentive signals affecting EV adoption"
            }
            AgentRole::Supply => "battery, semiconductor, and drivetrain supply chain health",
            AgentRole::CrossLayer => "cross-checking analysis agent conclusions for consistency",
            AgentRole::Hallucination => "possible unsupported claims or hallucinations",
            AgentRole::ReportQuality => "overall report structure, clarity, and completeness",
        }
    }

    /// 角色的系统提示词
    pub fn system_prompt(&self) -> &'static str {
        match self {
            AgentRole::Finance => {
                "You are the Finance Analyst. Review capital markets, funding flows, stock movements, and profitability indicators for EV-related companies."
            }
            AgentRole::Market => {
                "You are the Market Analyst for EV intelligence. Analyze global and regional EV demand, pricing trends, and consumer sentiment. Respond with concise, evidence-based notes."
            }
            AgentRole::Oem => {
                "You are the OEM Analyst. Track automakers' production plans, technology investments, and strategic partnerships in the EV sector."
            }
            AgentRole::Policy => {
                "You are the Policy Analyst. Evaluate government policies, incentives, and trade regulations affecting the EV industry. Focus on actionable insights."
            }
            AgentRole::Supply => {
                "You are the EV Supply Chain Analyst. Analyse raw-material sourcing, tiered supplier health, logistics routes, and inventory coverage. Summarise bottlenecks and mitigation options."
            }
            AgentRole::CrossLayer => {
                "You are the Cross-Layer Validator. Ensure consistency and alignment among market, policy, OEM, supply chain, and finance insights."
            }
            AgentRole::Hallucination => {
                "You are the Hallucination Auditor. Identify unsupported claims and require verifiable sources for every factual statement."
            }
            AgentRole::ReportQuality => {
                "You are the Report Quality Reviewer. Assess overall structure, clarity, completeness, and factual accuracy of the generated EV market report."
            }
        }
    }

    /// OEM分析要求附带新闻链接
    pub fn requires_citations(&self) -> bool {
        matches!(self, AgentRole::Oem)
    }

    /// 基于LLM客户端构建该角色的智能体配置
    pub fn spec(&self, client: &LLMClient) -> AgentSpec {
        let agent = LlmAgent::new(client.clone(), self.system_prompt());
        AgentSpec::new(Arc::new(agent))
            .with_focus(self.focus())
            .with_citations(self.requires_citations())
    }
}

impl Display for AgentRole {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.id())
    }
}

impl std::str::FromStr for AgentRole {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        AgentRole::ANALYSIS
            .into_iter()
            .chain(AgentRole::VALIDATION)
            .find(|role| role.id() == s)
            .ok_or_else(|| format!("Unknown agent: {}", s))
    }
}

/// 按插入顺序保存的 智能体标识 → 配置 映射
///
/// 重复插入同一标识会在原位置替换，与有序字典的行为一致。
#[derive(Debug, Clone, Default)]
pub struct AgentRoster {
    entries: Vec<(String, AgentSpec)>,
}

impl AgentRoster {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, id: impl Into<String>, spec: AgentSpec) {
        let id = id.into();
        match self.entries.iter_mut().find(|(existing, _)| *existing == id) {
            Some(entry) => entry.1 = spec,
            None => self.entries.push((id, spec)),
        }
    }

    pub fn with(mut self, id: impl Into<String>, spec: AgentSpec) -> Self {
        self.insert(id, spec);
        self
    }

    pub fn get(&self, id: &str) -> Option<&AgentSpec> {
        self.entries
            .iter()
            .find(|(existing, _)| existing == id)
            .map(|(_, spec)| spec)
    }

    pub fn ids(&self) -> Vec<&str> {
        self.entries.iter().map(|(id, _)| id.as_str()).collect()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &AgentSpec)> {
        self.entries.iter().map(|(id, spec)| (id.as_str(), spec))
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

/// 构建默认的分析层与校验层名单
pub fn default_rosters(client: &LLMClient) -> (AgentRoster, AgentRoster) {
    let roster_for = |roles: &[AgentRole]| {
        roles.iter().fold(AgentRoster::new(), |roster, role| {
            roster.with(role.id(), role.spec(client))
        })
    };
    (
        roster_for(&AgentRole::ANALYSIS),
        roster_for(&AgentRole::VALIDATION),
    )
}

/// 由LLM驱动的智能体，每次调用对应一次（可带工具的）模型对话
#[derive(Clone)]
pub struct LlmAgent {
    client: LLMClient,
    system_prompt: String,
}

impl LlmAgent {
    pub fn new(client: LLMClient, system_prompt: impl Into<String>) -> Self {
        Self {
            client,
            system_prompt: system_prompt.into(),
        }
    }

    /// 系统消息追加到角色提示词之后，用户消息合并为一次提问
    fn split_messages(&self, messages: &[AgentMessage]) -> (String, String) {
        let mut system_prompt = self.system_prompt.clone();
        let mut user_parts = Vec::new();
        for message in messages {
            match message.role {
                MessageRole::System => {
                    system_prompt.push_str("\n\n");
                    system_prompt.push_str(&message.content);
                }
                MessageRole::User | MessageRole::Assistant => user_parts.push(message.content.as_str()),
            }
        }
        (system_prompt, user_parts.join("\n\n"))
    }
}

#[async_trait]
impl AgentInvoker for LlmAgent {
    async fn invoke(&self, messages: &[AgentMessage]) -> Result<AgentResponse, AgentError> {
        let (system_prompt, user_prompt) = self.split_messages(messages);
        if user_prompt.trim().is_empty() {
            return Err(AgentError::Unavailable("no user message to send".to_string()));
        }

        let timeout_seconds = self.client.config().timeout_seconds;
        let call = self.client.prompt(&system_prompt, &user_prompt);
        match tokio::time::timeout(Duration::from_secs(timeout_seconds), call).await {
            Ok(Ok(text)) => Ok(AgentResponse::Text(text)),
            Ok(Err(err)) => Err(AgentError::Llm(format!("{:#}", err))),
            Err(_) => Err(AgentError::Timeout(timeout_seconds)),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    struct Silent;

    #[async_trait]
    impl AgentInvoker for Silent {
        async fn invoke(&self, _messages: &[AgentMessage]) -> Result<AgentResponse, AgentError> {
            Ok(AgentResponse::Empty)
        }
    }

    fn spec(focus: &str) -> AgentSpec {
        AgentSpec::new(Arc::new(Silent)).with_focus(focus)
    }

    #[test]
    fn test_role_ids_and_kinds() {
        let ids: Vec<&str> = AgentRole::ANALYSIS.iter().map(AgentRole::id).collect();
        assert_eq!(
            ids,
            ["finance_agent", "market_agent", "oem_agent", "policy_agent", "supply_agent"]
        );
        assert!(
            AgentRole::VALIDATION
                .iter()
                .all(|role| role.kind() == AgentKind::Validation)
        );
        assert_eq!(AgentRole::Market.kind(), AgentKind::Analysis);
    }

    #[test]
    fn test_only_oem_requires_citations() {
        let citing: Vec<AgentRole> = AgentRole::ANALYSIS
            .into_iter()
            .chain(AgentRole::VALIDATION)
            .filter(AgentRole::requires_citations)
            .collect();
        assert_eq!(citing, vec![AgentRole::Oem]);
    }

    #[test]
    fn test_role_from_str() {
        assert_eq!("hallu_agent".parse::<AgentRole>().unwrap(), AgentRole::Hallucination);
        assert_eq!(AgentRole::Supply.to_string(), "supply_agent");
        assert!("ghost_agent".parse::<AgentRole>().is_err());
    }

    #[test]
    fn test_roster_keeps_insertion_order_and_replaces_in_place() {
        let mut roster = AgentRoster::new()
            .with("b", spec("first b"))
            .with("a", spec("a"));
        roster.insert("b", spec("second b"));

        assert_eq!(roster.ids(), ["b", "a"]);
        assert_eq!(roster.len(), 2);
        assert_eq!(
            roster.get("b").and_then(|s| s.focus.as_deref()),
            Some("second b")
        );
        assert!(roster.get("c").is_none());
        assert!(AgentRoster::new().is_empty());
    }
}
