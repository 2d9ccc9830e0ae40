//! LLM客户端 - 为所有智能体提供统一的模型调用接口

use anyhow::Result;
use std::future::Future;
use std::time::Duration;
use tracing::{debug, warn};

use crate::config::LLMConfig;
use crate::llm::tools::PresetTools;

mod providers;

use providers::{ProviderAgent, ProviderClient};

/// LLM客户端
///
/// 传输层的重试只发生在这里，监督流程本身从不重试。
#[derive(Clone)]
pub struct LLMClient {
    config: LLMConfig,
    client: ProviderClient,
    tools: PresetTools,
}

impl LLMClient {
    /// 创建新的LLM客户端
    pub fn new(config: LLMConfig) -> Result<Self> {
        let client = ProviderClient::new(&config)?;
        let tools = PresetTools::new(Duration::from_secs(config.timeout_seconds))?;
        Ok(Self {
            config,
            client,
            tools,
        })
    }

    pub fn config(&self) -> &LLMConfig {
        &self.config
    }

    /// 检查模型连接是否正常
    pub async fn check_connection(&self) -> Result<()> {
        println!("🔄 正在检查模型连接...");
        match self
            .prompt_without_tools("You are a helpful assistant.", "Hello")
            .await
        {
            Ok(_) => {
                println!("✅ 模型连接正常");
                Ok(())
            }
            Err(e) => {
                eprintln!("❌ 模型连接失败: {}", e);
                Err(e)
            }
        }
    }

    /// 通用重试逻辑
    async fn retry_with_backoff<T, F, Fut>(&self, operation: F) -> Result<T>
    where
        F: Fn() -> Fut,
        Fut: Future<Output = Result<T, anyhow::Error>>,
    {
        let max_retries = self.config.retry_attempts.max(1);
        let retry_delay_ms = self.config.retry_delay_ms;
        let mut retries = 0;

        loop {
            match operation().await {
                Ok(result) => return Ok(result),
                Err(err) => {
                    retries += 1;
                    warn!(
                        attempt = retries,
                        max_attempts = max_retries,
                        error = %err,
                        "LLM call failed"
                    );
                    if retries >= max_retries {
                        return Err(err);
                    }
                    tokio::time::sleep(Duration::from_millis(retry_delay_ms)).await;
                }
            }
        }
    }

    fn build_agent(&self, system_prompt: &str, with_tools: bool) -> ProviderAgent {
        let tools = with_tools.then_some(&self.tools);
        self.client.create_agent(system_prompt, &self.config, tools)
    }

    /// 智能对话方法，启用预置工具时允许多轮工具调用
    pub async fn prompt(&self, system_prompt: &str, user_prompt: &str) -> Result<String> {
        if self.config.disable_preset_tools {
            return self.prompt_without_tools(system_prompt, user_prompt).await;
        }

        let agent = self.build_agent(system_prompt, true);
        let max_turns = self.config.max_tool_turns;
        debug!(max_turns, "prompting with preset tools");

        self.retry_with_backoff(|| async {
            agent
                .multi_turn(user_prompt, max_turns)
                .await
                .map_err(anyhow::Error::from)
        })
        .await
    }

    /// 单轮对话方法（不使用工具）
    pub async fn prompt_without_tools(
        &self,
        system_prompt: &str,
        user_prompt: &str,
    ) -> Result<String> {
        let agent = self.build_agent(system_prompt, false);

        self.retry_with_backoff(|| async { agent.prompt(user_prompt).await })
            .await
    }
}
