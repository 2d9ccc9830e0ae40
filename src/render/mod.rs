//! 报告渲染服务客户端
//!
//! 服务端负责把纯文本报告排版为HTML/PDF，这里只负责组装与校验请求元数据。

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::path::Path;
use std::time::Duration;
use thiserror::Error;
use tracing::{debug, info, warn};

use crate::config::RenderConfig;

pub mod sections;

use sections::parse_sections;

const MAX_TITLE_CHARS: usize = 200;
const MAX_SUBTITLE_CHARS: usize = 250;
const MAX_PARTY_CHARS: usize = 200;
const MAX_SUMMARY_CHARS: usize = 1000;
const REPORT_SECTIONS: u8 = 8;

/// 渲染相关错误
#[derive(Debug, Error)]
pub enum RenderError {
    /// 报告或图表元数据不合法，属于用户可修正的错误
    #[error("invalid report metadata: {0}")]
    InvalidMetadata(String),

    #[error("rendering service request failed: {0}")]
    Http(#[from] reqwest::Error),

    #[error("rendering service returned {status}: {body}")]
    Status { status: u16, body: String },

    #[error("failed to read chart metadata: {0}")]
    Io(#[from] std::io::Error),
}

/// 图表类型
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ChartKind {
    #[default]
    Bar,
    Line,
    Pie,
}

/// 单个图表的元数据
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ChartSpec {
    pub title: String,
    #[serde(default)]
    pub kind: ChartKind,
    pub labels: Vec<String>,
    pub values: Vec<f64>,
    /// 图表挂载的报告章节编号
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub section: Option<u8>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub unit: Option<String>,
}

impl ChartSpec {
    fn validate(&self, position: usize) -> Result<(), RenderError> {
        let invalid = |reason: String| -> Result<(), RenderError> {
            Err(RenderError::InvalidMetadata(format!("chart #{}: {}", position + 1, reason)))
        };

        if self.title.trim().is_empty() {
            return invalid("title must not be empty".to_string());
        }
        if self.labels.is_empty() {
            return invalid(format!("'{}' has no labels", self.title));
        }
        if self.labels.len() != self.values.len() {
            return invalid(format!(
                "'{}' has {} labels but {} values",
                self.title,
                self.labels.len(),
                self.values.len()
            ));
        }
        if let Some(value) = self.values.iter().find(|value| !value.is_finite()) {
            return invalid(format!("'{}' contains non-finite value {}", self.title, value));
        }
        if let Some(section) = self.section
            && !(1..=REPORT_SECTIONS).contains(&section)
        {
            return invalid(format!(
                "'{}' targets section {} (expected 1..={})",
                self.title, section, REPORT_SECTIONS
            ));
        }
        Ok(())
    }
}

/// 提交给渲染服务的请求体
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RenderRequest {
    pub report: String,
    pub title: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub subtitle: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub summary: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub prepared_for: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub prepared_by: Option<String>,
    pub generated_at: DateTime<Utc>,
    pub charts: Vec<ChartSpec>,
}

impl RenderRequest {
    /// 由报告文本与渲染配置组装请求，未配置摘要时从执行摘要章节提取
    pub fn from_report(
        report: &str,
        config: &RenderConfig,
        generated_at: DateTime<Utc>,
        charts: Vec<ChartSpec>,
    ) -> Self {
        let summary = config
            .summary
            .clone()
            .or_else(|| derive_summary(report));
        Self {
            report: report.to_string(),
            title: config.title.clone(),
            subtitle: config.subtitle.clone(),
            summary,
            prepared_for: config.prepared_for.clone(),
            prepared_by: config.prepared_by.clone(),
            generated_at,
            charts,
        }
    }

    /// 校验元数据，任何一项不合法都返回 `InvalidMetadata`
    pub fn validate(&self) -> Result<(), RenderError> {
        if self.report.trim().is_empty() {
            return Err(RenderError::InvalidMetadata("report text is empty".to_string()));
        }
        if self.title.trim().is_empty() {
            return Err(RenderError::InvalidMetadata("title must not be empty".to_string()));
        }
        check_length("title", Some(self.title.as_str()), MAX_TITLE_CHARS)?;
        check_length("subtitle", self.subtitle.as_deref(), MAX_SUBTITLE_CHARS)?;
        check_length("prepared_for", self.prepared_for.as_deref(), MAX_PARTY_CHARS)?;
        check_length("prepared_by", self.prepared_by.as_deref(), MAX_PARTY_CHARS)?;
        check_length("summary", self.summary.as_deref(), MAX_SUMMARY_CHARS)?;

        for (position, chart) in self.charts.iter().enumerate() {
            chart.validate(position)?;
        }
        Ok(())
    }
}

fn check_length(field: &str, value: Option<&str>, max: usize) -> Result<(), RenderError> {
    match value {
        Some(value) if value.chars().count() > max => Err(RenderError::InvalidMetadata(format!(
            "{} is {} characters long (max {})",
            field,
            value.chars().count(),
            max
        ))),
        _ => Ok(()),
    }
}

/// 取执行摘要章节的列表项作为摘要
fn derive_summary(report: &str) -> Option<String> {
    let sections = parse_sections(report);
    let summary = sections
        .iter()
        .find(|section| section.index == 1)?
        .list_items()
        .collect::<Vec<_>>()
        .join(" ");
    if summary.is_empty() {
        return None;
    }
    Some(summary.chars().take(MAX_SUMMARY_CHARS).collect())
}

/// 从JSON文件读取图表元数据
pub fn load_charts(path: &Path) -> Result<Vec<ChartSpec>, RenderError> {
    let content = std::fs::read_to_string(path)?;
    serde_json::from_str(&content).map_err(|e| {
        RenderError::InvalidMetadata(format!("malformed chart file {}: {}", path.display(), e))
    })
}

/// 渲染产物类型
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ArtifactKind {
    Html,
    Pdf,
}

impl std::fmt::Display for ArtifactKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ArtifactKind::Html => write!(f, "HTML"),
            ArtifactKind::Pdf => write!(f, "PDF"),
        }
    }
}

/// 单个产物的渲染失败
#[derive(Debug, Clone, PartialEq)]
pub struct ArtifactFailure {
    pub kind: ArtifactKind,
    pub reason: String,
}

/// 渲染结果，某个产物失败不影响其他已成功的产物
#[derive(Debug, Clone, Default, PartialEq)]
pub struct RenderedArtifacts {
    pub html: Option<String>,
    pub pdf: Option<Vec<u8>>,
    pub failures: Vec<ArtifactFailure>,
}

impl RenderedArtifacts {
    pub fn is_empty(&self) -> bool {
        self.html.is_none() && self.pdf.is_none()
    }

    fn record_failure(&mut self, kind: ArtifactKind, err: &RenderError) {
        warn!(artifact = %kind, error = %err, "rendering failed");
        self.failures.push(ArtifactFailure {
            kind,
            reason: err.to_string(),
        });
    }
}

/// 渲染服务的HTTP客户端
#[derive(Debug, Clone)]
pub struct RenderClient {
    http: reqwest::Client,
    base_url: String,
}

impl RenderClient {
    pub fn new(config: &RenderConfig) -> Result<Self, RenderError> {
        let http = reqwest::Client::builder()
            .timeout(Duration::from_secs(config.timeout_seconds))
            .build()?;
        Ok(Self {
            http,
            base_url: config.base_url.trim_end_matches('/').to_string(),
        })
    }

    fn url(&self, path: &str) -> String {
        format!("{}{}", self.base_url, path)
    }

    /// 检查服务是否可用
    pub async fn health(&self) -> Result<(), RenderError> {
        let response = self.http.get(self.url("/health")).send().await?;
        check_status(response).await.map(|_| ())
    }

    pub async fn render_html(&self, request: &RenderRequest) -> Result<String, RenderError> {
        request.validate()?;
        let response = self
            .http
            .post(self.url("/render"))
            .json(request)
            .send()
            .await?;
        Ok(check_status(response).await?.text().await?)
    }

    pub async fn render_pdf(&self, request: &RenderRequest) -> Result<Vec<u8>, RenderError> {
        request.validate()?;
        let response = self.http.post(self.url("/pdf")).json(request).send().await?;
        Ok(check_status(response).await?.bytes().await?.to_vec())
    }
}

async fn check_status(response: reqwest::Response) -> Result<reqwest::Response, RenderError> {
    let status = response.status();
    if status.is_success() {
        return Ok(response);
    }
    let body = response.text().await.unwrap_or_default();
    Err(RenderError::Status {
        status: status.as_u16(),
        body,
    })
}

/// 读取图表并组装、校验请求
fn build_request(
    config: &RenderConfig,
    report: &str,
    generated_at: DateTime<Utc>,
) -> Result<RenderRequest, RenderError> {
    let charts = match &config.charts_path {
        Some(path) => load_charts(path)?,
        None => Vec::new(),
    };
    let request = RenderRequest::from_report(report, config, generated_at, charts);
    request.validate()?;
    Ok(request)
}

/// 在运行流水线之前校验渲染元数据，未启用渲染时不做任何检查
pub fn preflight(config: &RenderConfig) -> Result<(), RenderError> {
    if !config.enabled {
        return Ok(());
    }
    build_request(config, "1. EXECUTIVE SUMMARY", Utc::now()).map(|_| ())
}

/// 按配置渲染报告
///
/// 未启用时直接返回空结果；元数据校验先于任何网络请求。
/// 服务不可达时返回错误；单个产物失败则记录在 `failures` 中，已成功的产物照常返回。
pub async fn render_report(
    config: &RenderConfig,
    report: &str,
    generated_at: DateTime<Utc>,
) -> Result<RenderedArtifacts, RenderError> {
    if !config.enabled {
        debug!("rendering disabled");
        return Ok(RenderedArtifacts::default());
    }

    let request = build_request(config, report, generated_at)?;

    let client = RenderClient::new(config)?;
    client.health().await?;

    let mut artifacts = RenderedArtifacts::default();
    if config.html {
        match client.render_html(&request).await {
            Ok(html) => {
                info!(base_url = %config.base_url, "HTML report rendered");
                artifacts.html = Some(html);
            }
            Err(err) => artifacts.record_failure(ArtifactKind::Html, &err),
        }
    }
    if config.pdf {
        match client.render_pdf(&request).await {
            Ok(pdf) => {
                info!(base_url = %config.base_url, "PDF report rendered");
                artifacts.pdf = Some(pdf);
            }
            Err(err) => artifacts.record_failure(ArtifactKind::Pdf, &err),
        }
    }
    Ok(artifacts)
}
