//! 智能体可调用的预置工具

use std::time::Duration;

pub mod claim_audit;
pub mod clock;
pub mod web_search;

use claim_audit::AgentToolClaimAudit;
use clock::AgentToolClock;
use web_search::AgentToolWebSearch;

/// 挂载到每个带工具Agent上的工具集合
#[derive(Debug, Clone)]
pub struct PresetTools {
    pub web_search: AgentToolWebSearch,
    pub clock: AgentToolClock,
    pub claim_audit: AgentToolClaimAudit,
}

impl PresetTools {
    pub fn new(timeout: Duration) -> reqwest::Result<Self> {
        Ok(Self {
            web_search: AgentToolWebSearch::new(timeout)?,
            clock: AgentToolClock::new(),
            claim_audit: AgentToolClaimAudit::new(),
        })
    }
}
