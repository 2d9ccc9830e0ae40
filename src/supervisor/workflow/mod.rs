//! 确定性编排器：analysis → validation → final → done

use std::time::Instant;
use tracing::{info, warn};

use crate::config::Config;
use crate::supervisor::agents::AgentRoster;
use crate::supervisor::error::SupervisorError;
use crate::supervisor::invoke::{ProgressHandler, PromptOptions, invoke_agent};
use crate::supervisor::report::ReportCompiler;
use crate::supervisor::state::{Stage, SupervisorState};

/// 编排参数
#[derive(Debug, Clone, PartialEq)]
pub struct WorkflowOptions {
    pub max_steps: usize,
    pub max_retries: usize,
    pub prompt: PromptOptions,
    /// 报告中每段笔记保留的最大句数
    pub report_sentence_limit: usize,
}

impl Default for WorkflowOptions {
    fn default() -> Self {
        Self::from(&Config::default())
    }
}

impl From<&Config> for WorkflowOptions {
    fn from(config: &Config) -> Self {
        Self {
            max_steps: config.supervisor.max_steps,
            max_retries: config.supervisor.max_retries,
            prompt: PromptOptions {
                sentence_limit: config.supervisor.response_sentence_limit,
                language: config.target_language,
            },
            report_sentence_limit: config.supervisor.report_sentence_limit,
        }
    }
}

/// 按固定顺序依次调用每个智能体，不根据任何智能体的输出做分支
pub struct SupervisorWorkflow {
    analysis: AgentRoster,
    validation: AgentRoster,
    options: WorkflowOptions,
}

impl SupervisorWorkflow {
    pub fn new(analysis: AgentRoster, validation: AgentRoster) -> Self {
        Self {
            analysis,
            validation,
            options: WorkflowOptions::default(),
        }
    }

    pub fn with_options(mut self, options: WorkflowOptions) -> Self {
        self.options = options;
        self
    }

    pub fn options(&self) -> &WorkflowOptions {
        &self.options
    }

    pub fn analysis(&self) -> &AgentRoster {
        &self.analysis
    }

    pub fn validation(&self) -> &AgentRoster {
        &self.validation
    }

    /// 按当前上限创建一份新状态
    pub fn new_state(&self, task: impl Into<String>) -> SupervisorState {
        SupervisorState::with_limits(task, self.options.max_steps, self.options.max_retries)
    }

    /// 执行一次完整任务并返回最终状态
    pub async fn run(
        &self,
        task: &str,
        progress: Option<&ProgressHandler>,
    ) -> Result<SupervisorState, SupervisorError> {
        let mut state = self.new_state(task);
        self.drive(&mut state, progress).await?;
        Ok(state)
    }

    /// 在给定状态上推进整条流水线
    ///
    /// 任一智能体失败即中止，已写入状态的内容保留，便于调用方检查计数。
    pub async fn drive(
        &self,
        state: &mut SupervisorState,
        progress: Option<&ProgressHandler>,
    ) -> Result<(), SupervisorError> {
        let started = Instant::now();
        info!(
            run_id = %state.run_id(),
            analysis = self.analysis.len(),
            validation = self.validation.len(),
            "supervisor pipeline started"
        );

        for (stage, roster) in [
            (Stage::Analysis, &self.analysis),
            (Stage::Validation, &self.validation),
        ] {
            if roster.is_empty() {
                continue;
            }
            advance(state, stage)?;
            let stage_started = Instant::now();
            for (agent_id, spec) in roster.iter() {
                invoke_agent(agent_id, spec, state, &self.options.prompt, progress).await?;
            }
            info!(
                stage = %stage,
                elapsed_ms = stage_started.elapsed().as_millis() as u64,
                "stage finished"
            );
        }

        advance(state, Stage::Final)?;
        let compiler =
            ReportCompiler::new(self.options.report_sentence_limit, self.options.prompt.language);
        let report = compiler.compile(state, &self.validation.ids());
        if !state.set_final_report(report) {
            warn!(run_id = %state.run_id(), "final report already present, keeping the first one");
        }

        advance(state, Stage::Done)?;
        info!(
            total_steps = state.total_steps(),
            retry_count = state.retry_count(),
            elapsed_ms = started.elapsed().as_millis() as u64,
            "supervisor pipeline completed"
        );
        Ok(())
    }
}

fn advance(state: &mut SupervisorState, stage: Stage) -> Result<(), SupervisorError> {
    state.advance_to(stage)?;
    info!(stage = %stage, "supervisor stage advanced");
    Ok(())
}
