//! 确定性监督流水线

use anyhow::Result;
use chrono::Utc;
use tracing::warn;

use crate::config::Config;
use crate::llm::client::LLMClient;
use crate::outlet::{DiskOutlet, Outlet, SavedReport};
use crate::render::{self, RenderError, RenderedArtifacts};

pub mod agents;
pub mod error;
pub mod invoke;
pub mod invoker;
pub mod report;
pub mod response;
pub mod state;
pub mod workflow;

use agents::default_rosters;
use invoke::ProgressHandler;
use state::SupervisorState;
use workflow::{SupervisorWorkflow, WorkflowOptions};

/// 一次运行的结果
#[derive(Debug)]
pub struct RunOutcome {
    pub state: SupervisorState,
    pub saved: SavedReport,
}

/// 启动完整流水线：连接模型、构建默认智能体、执行并保存
pub async fn launch(config: &Config, task: &str) -> Result<RunOutcome> {
    // 在调用任何模型之前校验渲染元数据
    render::preflight(&config.render)?;

    let llm_client = LLMClient::new(config.llm.clone())?;
    llm_client.check_connection().await?;

    let (analysis, validation) = default_rosters(&llm_client);
    let workflow =
        SupervisorWorkflow::new(analysis, validation).with_options(WorkflowOptions::from(config));

    execute(&workflow, config, task).await
}

/// 执行已组装好的流水线，渲染并保存结果
pub async fn execute(
    workflow: &SupervisorWorkflow,
    config: &Config,
    task: &str,
) -> Result<RunOutcome> {
    println!("🚀 开始执行任务: {}", task);
    let progress = ProgressHandler::sync(|record| {
        println!("✅ [{}] {} 完成 ({})", record.step, record.agent, record.stage);
    });
    let state = workflow.run(task, Some(&progress)).await?;

    let report = state.final_report().unwrap_or_default();
    let artifacts = match render::render_report(&config.render, report, Utc::now()).await {
        Ok(artifacts) => {
            for failure in &artifacts.failures {
                eprintln!("⚠️ {}渲染失败，跳过该文件: {}", failure.kind, failure.reason);
            }
            artifacts
        }
        Err(err @ RenderError::InvalidMetadata(_)) => return Err(err.into()),
        Err(err) => {
            warn!(error = %err, "rendering service unavailable, keeping text report only");
            eprintln!("⚠️ 渲染服务调用失败，仅保存文本报告: {}", err);
            RenderedArtifacts::default()
        }
    };

    println!("\n🖊️ 报告存储中...");
    let saved = DiskOutlet::new(&config.output_path)
        .save(&state, &artifacts)
        .await?;

    Ok(RunOutcome { state, saved })
}
