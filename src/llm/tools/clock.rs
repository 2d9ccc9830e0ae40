//! 时间查询工具，为“近期新闻”类提问提供当前日期与季度

use chrono::{DateTime, Datelike, Utc};
use rig::tool::Tool;
use serde::{Deserialize, Serialize};
use std::fmt::Write;
use thiserror::Error;
use tracing::debug;

/// 时间工具
#[derive(Debug, Clone, Default)]
pub struct AgentToolClock;

/// 时间查询参数
#[derive(Debug, Deserialize)]
pub struct ClockArgs {
    #[serde(rename = "format")]
    pub format: Option<String>,
}

/// 时间查询结果
#[derive(Debug, Serialize, PartialEq, Eq)]
pub struct ClockReading {
    pub utc_time: String,
    pub timestamp: i64,
    pub year: i32,
    /// 形如 `2025-Q3`
    pub quarter: String,
}

#[derive(Debug, Error)]
#[error("clock tool error: {0}")]
pub struct ClockError(String);

impl AgentToolClock {
    pub fn new() -> Self {
        Self
    }
}

/// 按给定格式读取某一时刻，格式串不合法时返回错误
pub fn read_clock(now: DateTime<Utc>, format: &str) -> Result<ClockReading, ClockError> {
    let mut utc_time = String::new();
    write!(utc_time, "{}", now.format(format))
        .map_err(|_| ClockError(format!("invalid format '{}'", format)))?;

    let quarter = (now.month() - 1) / 3 + 1;
    Ok(ClockReading {
        utc_time,
        timestamp: now.timestamp(),
        year: now.year(),
        quarter: format!("{}-Q{}", now.year(), quarter),
    })
}

impl Tool for AgentToolClock {
    const NAME: &'static str = "clock";

    type Error = ClockError;
    type Args = ClockArgs;
    type Output = ClockReading;

    async fn definition(&self, _prompt: String) -> rig::completion::ToolDefinition {
        rig::completion::ToolDefinition {
            name: Self::NAME.to_string(),
            description: "Get the current UTC date, time, year and calendar quarter. Use it to decide what counts as recent news.".to_string(),
            parameters: serde_json::json!({
                "type": "object",
                "properties": {
                    "format": {
                        "type": "string",
                        "description": "chrono format string, defaults to '%Y-%m-%d %H:%M:%S'."
                    }
                },
                "required": []
            }),
        }
    }

    async fn call(&self, args: Self::Args) -> Result<Self::Output, Self::Error> {
        debug!(tool = Self::NAME, ?args, "tool called");
        let format = args.format.as_deref().unwrap_or("%Y-%m-%d %H:%M:%S");
        if format.trim().is_empty() {
            return Err(ClockError("format is empty".to_string()));
        }
        read_clock(Utc::now(), format)
    }
}
