//! 新闻检索工具，基于 DuckDuckGo Instant Answer 接口

use rig::tool::Tool;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::time::Duration;
use thiserror::Error;
use tracing::debug;

const SEARCH_ENDPOINT: &str = "https://api.duckduckgo.com/";
const DEFAULT_MAX_RESULTS: usize = 5;

/// 检索工具
#[derive(Debug, Clone)]
pub struct AgentToolWebSearch {
    http: reqwest::Client,
    endpoint: String,
}

#[derive(Debug, Deserialize)]
pub struct WebSearchArgs {
    pub query: String,
    pub max_results: Option<usize>,
}

/// 单条检索结果
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SearchHit {
    pub title: String,
    pub url: String,
}

#[derive(Debug, Serialize)]
pub struct WebSearchResult {
    pub query: String,
    pub hits: Vec<SearchHit>,
}

#[derive(Debug, Error)]
pub enum WebSearchError {
    #[error("search query is empty")]
    EmptyQuery,

    #[error("search request failed: {0}")]
    Http(#[from] reqwest::Error),
}

impl AgentToolWebSearch {
    pub fn new(timeout: Duration) -> reqwest::Result<Self> {
        let http = reqwest::Client::builder().timeout(timeout).build()?;
        Ok(Self {
            http,
            endpoint: SEARCH_ENDPOINT.to_string(),
        })
    }

    async fn search(&self, args: &WebSearchArgs) -> Result<WebSearchResult, WebSearchError> {
        let query = args.query.trim();
        if query.is_empty() {
            return Err(WebSearchError::EmptyQuery);
        }

        let body: Value = self
            .http
            .get(&self.endpoint)
            .query(&[
                ("q", query),
                ("format", "json"),
                ("no_html", "1"),
                ("skip_disambig", "1"),
            ])
            .send()
            .await?
            .error_for_status()?
            .json()
            .await?;

        let max_results = args.max_results.unwrap_or(DEFAULT_MAX_RESULTS);
        Ok(WebSearchResult {
            query: query.to_string(),
            hits: parse_hits(&body, max_results),
        })
    }
}

/// 从响应中提取标题与链接，包括嵌套的相关主题
pub fn parse_hits(body: &Value, max_results: usize) -> Vec<SearchHit> {
    let mut hits = Vec::new();

    if let (Some(url), Some(title)) = (
        body.get("AbstractURL").and_then(Value::as_str),
        body.get("Heading").and_then(Value::as_str),
    ) && !url.is_empty()
    {
        hits.push(SearchHit {
            title: title.to_string(),
            url: url.to_string(),
        });
    }

    for key in ["Results", "RelatedTopics"] {
        if let Some(Value::Array(topics)) = body.get(key) {
            collect_topics(topics, &mut hits);
        }
    }

    let mut seen = std::collections::HashSet::new();
    hits.retain(|hit| seen.insert(hit.url.clone()));
    hits.truncate(max_results);
    hits
}

fn collect_topics(topics: &[Value], hits: &mut Vec<SearchHit>) {
    for topic in topics {
        if let Some(Value::Array(nested)) = topic.get("Topics") {
            collect_topics(nested, hits);
            continue;
        }
        let url = topic.get("FirstURL").and_then(Value::as_str).unwrap_or_default();
        let text = topic.get("Text").and_then(Value::as_str).unwrap_or_default();
        if !url.is_empty() {
            hits.push(SearchHit {
                title: text.to_string(),
                url: url.to_string(),
            });
        }
    }
}

impl Tool for AgentToolWebSearch {
    const NAME: &'static str = "web_search";

    type Error = WebSearchError;
    type Args = WebSearchArgs;
    type Output = WebSearchResult;

    async fn definition(&self, _prompt: String) -> rig::completion::ToolDefinition {
        rig::completion::ToolDefinition {
            name: Self::NAME.to_string(),
            description: "Search the web for recent EV industry news and return titles with source URLs.".to_string(),
            parameters: serde_json::json!({
                "type": "object",
                "properties": {
                    "query": {
                        "type": "string",
                        "description": "Search keywords."
                    },
                    "max_results": {
                        "type": "integer",
                        "description": "Maximum number of results (default 5)."
                    }
                },
                "required": ["query"]
            }),
        }
    }

    async fn call(&self, args: Self::Args) -> Result<Self::Output, Self::Error> {
        debug!(tool = Self::NAME, query = %args.query, "tool called");
        self.search(&args).await
    }
}
