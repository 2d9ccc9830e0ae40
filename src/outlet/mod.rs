//! 报告落盘

use anyhow::{Context, Result};
use chrono::{DateTime, Utc};
use std::fs;
use std::path::{Path, PathBuf};
use tracing::info;

use crate::render::RenderedArtifacts;
use crate::supervisor::state::SupervisorState;

/// 文本报告的标题行
pub const REPORT_HEADING: &str = "EV Market Intelligence Report";

const FILE_PREFIX: &str = "ev_market";

pub trait Outlet {
    async fn save(
        &self,
        state: &SupervisorState,
        artifacts: &RenderedArtifacts,
    ) -> Result<SavedReport>;
}

/// 已保存文件的路径
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SavedReport {
    pub report: PathBuf,
    pub history: PathBuf,
    pub html: Option<PathBuf>,
    pub pdf: Option<PathBuf>,
}

impl SavedReport {
    pub fn paths(&self) -> impl Iterator<Item = &Path> {
        [Some(&self.report), Some(&self.history), self.html.as_ref(), self.pdf.as_ref()]
            .into_iter()
            .flatten()
            .map(PathBuf::as_path)
    }
}

/// 写入本地目录，只新建文件，从不删除已有内容
pub struct DiskOutlet {
    output_dir: PathBuf,
}

impl DiskOutlet {
    pub fn new(output_dir: impl Into<PathBuf>) -> Self {
        Self {
            output_dir: output_dir.into(),
        }
    }

    fn file_path(&self, kind: &str, stamp: &str, extension: &str) -> PathBuf {
        self.output_dir
            .join(format!("{FILE_PREFIX}_{kind}_{stamp}.{extension}"))
    }
}

/// 带标题与生成时间的文本报告
pub fn format_text_report(report: &str, generated_at: DateTime<Utc>) -> String {
    format!(
        "{}\nGenerated: {}\n{}\n\n{}",
        REPORT_HEADING,
        generated_at.format("%Y-%m-%d %H:%M:%S"),
        "=".repeat(80),
        report
    )
}

impl Outlet for DiskOutlet {
    async fn save(
        &self,
        state: &SupervisorState,
        artifacts: &RenderedArtifacts,
    ) -> Result<SavedReport> {
        fs::create_dir_all(&self.output_dir).context(format!(
            "Failed to create output directory: {}",
            self.output_dir.display()
        ))?;

        let generated_at = Utc::now();
        let stamp = format!(
            "{}_{}",
            generated_at.format("%Y%m%d_%H%M%S"),
            &state.run_id().simple().to_string()[..8]
        );

        let report = self.file_path("report", &stamp, "txt");
        let text = format_text_report(state.final_report().unwrap_or_default(), generated_at);
        fs::write(&report, text).context("Failed to write report text")?;
        println!("💾 已保存报告: {}", report.display());

        let history = self.file_path("history", &stamp, "json");
        let json = serde_json::to_string_pretty(state).context("Failed to serialize state")?;
        fs::write(&history, json).context("Failed to write history")?;
        println!("💾 已保存执行记录: {}", history.display());

        let html = match &artifacts.html {
            Some(content) => {
                let path = self.file_path("report", &stamp, "html");
                fs::write(&path, content).context("Failed to write HTML report")?;
                println!("💾 已保存HTML: {}", path.display());
                Some(path)
            }
            None => None,
        };

        let pdf = match &artifacts.pdf {
            Some(bytes) => {
                let path = self.file_path("report", &stamp, "pdf");
                fs::write(&path, bytes).context("Failed to write PDF report")?;
                println!("💾 已保存PDF: {}", path.display());
                Some(path)
            }
            None => None,
        };

        info!(output_dir = %self.output_dir.display(), "report saved");
        Ok(SavedReport {
            report,
            history,
            html,
            pdf,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;
    use tempfile::TempDir;

    #[test]
    fn test_text_report_header() {
        let at = Utc.with_ymd_and_hms(2025, 10, 23, 9, 5, 0).unwrap();
        let text = format_text_report("1. EXECUTIVE SUMMARY", at);
        let lines: Vec<&str> = text.lines().collect();

        assert_eq!(lines[0], "EV Market Intelligence Report");
        assert_eq!(lines[1], "Generated: 2025-10-23 09:05:00");
        assert_eq!(lines[2], "=".repeat(80));
        assert_eq!(lines[3], "");
        assert_eq!(lines[4], "1. EXECUTIVE SUMMARY");
    }

    #[tokio::test]
    async fn test_disk_outlet_writes_all_artifacts_and_keeps_existing_files() {
        let temp_dir = TempDir::new().unwrap();
        let output = temp_dir.path().join("reports");
        fs::create_dir_all(&output).unwrap();
        let existing = output.join("keep.txt");
        fs::write(&existing, "keep").unwrap();

        let mut state = SupervisorState::new("task");
        state.set_final_report("1. EXECUTIVE SUMMARY".to_string());
        let artifacts = RenderedArtifacts {
            html: Some("<html></html>".to_string()),
            pdf: Some(b"%PDF-1.7".to_vec()),
            ..RenderedArtifacts::default()
        };

        let saved = DiskOutlet::new(&output).save(&state, &artifacts).await.unwrap();

        assert!(existing.exists());
        assert_eq!(saved.paths().count(), 4);
        assert!(fs::read_to_string(&saved.report).unwrap().ends_with("1. EXECUTIVE SUMMARY"));
        assert_eq!(fs::read(saved.pdf.as_ref().unwrap()).unwrap(), b"%PDF-1.7");

        let history: serde_json::Value =
            serde_json::from_str(&fs::read_to_string(&saved.history).unwrap()).unwrap();
        assert_eq!(history["task_input"], "task");
        assert_eq!(history["final_report"], "1. EXECUTIVE SUMMARY");

        let name = saved.report.file_name().unwrap().to_string_lossy().to_string();
        assert!(name.starts_with("ev_market_report_"));
        assert!(name.ends_with(".txt"));
    }

    #[tokio::test]
    async fn test_disk_outlet_without_rendered_artifacts() {
        let temp_dir = TempDir::new().unwrap();
        let state = SupervisorState::new("task");

        let saved = DiskOutlet::new(temp_dir.path())
            .save(&state, &RenderedArtifacts::default())
            .await
            .unwrap();

        assert!(saved.html.is_none());
        assert!(saved.pdf.is_none());
        assert!(saved.report.exists());
        assert!(saved.history.exists());
    }
}
