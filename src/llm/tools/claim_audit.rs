//! 无依据论断审查工具

use rig::tool::Tool;
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::debug;

/// 提示论断缺乏依据的措辞及其问题说明
const HEDGE_MARKERS: [(&str, &str); 5] = [
    ("likely", "qualifier without supporting evidence"),
    ("probably", "uncertain assertion"),
    ("might be", "speculative claim"),
    ("allegedly", "unverified claim"),
    ("rumored", "unconfirmed information"),
];

/// 论断审查工具
#[derive(Debug, Clone, Default)]
pub struct AgentToolClaimAudit;

#[derive(Debug, Deserialize)]
pub struct ClaimAuditArgs {
    pub text: String,
}

/// 被标记的措辞
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct FlaggedClaim {
    pub marker: String,
    pub issue: String,
}

#[derive(Debug, Serialize)]
pub struct ClaimAuditResult {
    pub flagged: Vec<FlaggedClaim>,
    /// 文本中出现的链接数量
    pub cited_urls: usize,
}

#[derive(Debug, Error)]
#[error("claim audit failed: {0}")]
pub struct ClaimAuditError(String);

impl AgentToolClaimAudit {
    pub fn new() -> Self {
        Self
    }
}

/// 不区分大小写地扫描文本中的存疑措辞
pub fn audit_claims(text: &str) -> ClaimAuditResult {
    let lowered = text.to_lowercase();
    let flagged = HEDGE_MARKERS
        .iter()
        .filter(|(marker, _)| lowered.contains(marker))
        .map(|(marker, issue)| FlaggedClaim {
            marker: marker.to_string(),
            issue: issue.to_string(),
        })
        .collect();
    let cited_urls = lowered.matches("http://").count() + lowered.matches("https://").count();

    ClaimAuditResult {
        flagged,
        cited_urls,
    }
}

impl Tool for AgentToolClaimAudit {
    const NAME: &'static str = "claim_audit";

    type Error = ClaimAuditError;
    type Args = ClaimAuditArgs;
    type Output = ClaimAuditResult;

    async fn definition(&self, _prompt: String) -> rig::completion::ToolDefinition {
        rig::completion::ToolDefinition {
            name: Self::NAME.to_string(),
            description: "Scan analysis text for hedged or unsupported claims (likely, probably, might be, allegedly, rumored) and count cited URLs.".to_string(),
            parameters: serde_json::json!({
                "type": "object",
                "properties": {
                    "text": {
                        "type": "string",
                        "description": "The analysis text to audit."
                    }
                },
                "required": ["text"]
            }),
        }
    }

    async fn call(&self, args: Self::Args) -> Result<Self::Output, Self::Error> {
        debug!(tool = Self::NAME, chars = args.text.len(), "tool called");
        if args.text.trim().is_empty() {
            return Err(ClaimAuditError("text is empty".to_string()));
        }
        Ok(audit_claims(&args.text))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_flags_hedged_wording_case_insensitive() {
        let result = audit_claims("Sales will Probably rise. A merger is RUMORED for Q3.");
        let markers: Vec<&str> = result.flagged.iter().map(|f| f.marker.as_str()).collect();
        assert_eq!(markers, ["probably", "rumored"]);
        assert_eq!(result.flagged[1].issue, "unconfirmed information");
    }

    #[test]
    fn test_counts_cited_urls() {
        let result = audit_claims("See https://a.example/x and http://b.example.");
        assert!(result.flagged.is_empty());
        assert_eq!(result.cited_urls, 2);
    }

    #[tokio::test]
    async fn test_call_rejects_blank_text() {
        let tool = AgentToolClaimAudit::new();
        let err = tool
            .call(ClaimAuditArgs {
                text: "  ".to_string(),
            })
            .await
            .unwrap_err();
        assert!(err.to_string().contains("empty"));
    }
}
