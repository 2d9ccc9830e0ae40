//! LLM Provider支持模块

use anyhow::Result;
use rig::{
    agent::{Agent, AgentBuilder},
    client::CompletionClient,
    completion::{CompletionModel, Prompt, PromptError},
};

use crate::{
    config::{LLMConfig, LLMProvider},
    llm::tools::PresetTools,
};

/// 统一的Provider客户端枚举
#[derive(Clone)]
pub enum ProviderClient {
    OpenAI(rig::providers::openai::Client),
    DeepSeek(rig::providers::deepseek::Client),
    OpenRouter(rig::providers::openrouter::Client),
    Anthropic(rig::providers::anthropic::Client),
    Ollama(rig::providers::ollama::Client),
}

impl ProviderClient {
    /// 根据配置创建相应的provider客户端
    pub fn new(config: &LLMConfig) -> Result<Self> {
        match config.provider {
            LLMProvider::OpenAI => {
                let client = rig::providers::openai::Client::builder(&config.api_key)
                    .base_url(&config.api_base_url)
                    .build();
                Ok(ProviderClient::OpenAI(client))
            }
            LLMProvider::DeepSeek => {
                let client = rig::providers::deepseek::Client::builder(&config.api_key)
                    .base_url(&config.api_base_url)
                    .build();
                Ok(ProviderClient::DeepSeek(client))
            }
            LLMProvider::OpenRouter => {
                let client = rig::providers::openrouter::Client::builder(&config.api_key).build();
                Ok(ProviderClient::OpenRouter(client))
            }
            LLMProvider::Anthropic => {
                let client =
                    rig::providers::anthropic::ClientBuilder::new(&config.api_key).build()?;
                Ok(ProviderClient::Anthropic(client))
            }
            LLMProvider::Ollama => {
                let client = rig::providers::ollama::Client::builder().build();
                Ok(ProviderClient::Ollama(client))
            }
        }
    }

    /// 创建Agent，传入工具集时挂载全部预置工具
    pub fn create_agent(
        &self,
        system_prompt: &str,
        config: &LLMConfig,
        tools: Option<&PresetTools>,
    ) -> ProviderAgent {
        let model = config.model.as_str();
        match self {
            ProviderClient::OpenAI(client) => {
                let builder = client
                    .completion_model(model)
                    .completions_api()
                    .into_agent_builder();
                ProviderAgent::OpenAI(assemble(builder, system_prompt, config, tools))
            }
            ProviderClient::DeepSeek(client) => ProviderAgent::DeepSeek(assemble(
                client.agent(model),
                system_prompt,
                config,
                tools,
            )),
            ProviderClient::OpenRouter(client) => ProviderAgent::OpenRouter(assemble(
                client.agent(model),
                system_prompt,
                config,
                tools,
            )),
            ProviderClient::Anthropic(client) => ProviderAgent::Anthropic(assemble(
                client.agent(model),
                system_prompt,
                config,
                tools,
            )),
            ProviderClient::Ollama(client) => ProviderAgent::Ollama(assemble(
                client.agent(model),
                system_prompt,
                config,
                tools,
            )),
        }
    }
}

/// 为任意provider的builder设置提示词与采样参数，并按需挂载工具
fn assemble<M: CompletionModel>(
    builder: AgentBuilder<M>,
    system_prompt: &str,
    config: &LLMConfig,
    tools: Option<&PresetTools>,
) -> Agent<M> {
    let builder = builder
        .preamble(system_prompt)
        .max_tokens(config.max_tokens.into())
        .temperature(config.temperature);
    match tools {
        Some(tools) => builder
            .tool(tools.web_search.clone())
            .tool(tools.clock.clone())
            .tool(tools.claim_audit.clone())
            .build(),
        None => builder.build(),
    }
}

/// 统一的Agent枚举
pub enum ProviderAgent {
    OpenAI(Agent<rig::providers::openai::CompletionModel>),
    DeepSeek(Agent<rig::providers::deepseek::CompletionModel>),
    OpenRouter(Agent<rig::providers::openrouter::CompletionModel>),
    Anthropic(Agent<rig::providers::anthropic::completion::CompletionModel>),
    Ollama(Agent<rig::providers::ollama::CompletionModel<reqwest::Client>>),
}

impl ProviderAgent {
    /// 执行prompt
    pub async fn prompt(&self, prompt: &str) -> Result<String> {
        match self {
            ProviderAgent::OpenAI(agent) => agent.prompt(prompt).await.map_err(|e| e.into()),
            ProviderAgent::DeepSeek(agent) => agent.prompt(prompt).await.map_err(|e| e.into()),
            ProviderAgent::OpenRouter(agent) => agent.prompt(prompt).await.map_err(|e| e.into()),
            ProviderAgent::Anthropic(agent) => agent.prompt(prompt).await.map_err(|e| e.into()),
            ProviderAgent::Ollama(agent) => agent.prompt(prompt).await.map_err(|e| e.into()),
        }
    }

    /// 执行多轮对话，允许模型在回答前调用工具
    pub async fn multi_turn(
        &self,
        prompt: &str,
        max_turns: usize,
    ) -> Result<String, PromptError> {
        match self {
            ProviderAgent::OpenAI(agent) => agent.prompt(prompt).multi_turn(max_turns).await,
            ProviderAgent::DeepSeek(agent) => agent.prompt(prompt).multi_turn(max_turns).await,
            ProviderAgent::OpenRouter(agent) => agent.prompt(prompt).multi_turn(max_turns).await,
            ProviderAgent::Anthropic(agent) => agent.prompt(prompt).multi_turn(max_turns).await,
            ProviderAgent::Ollama(agent) => agent.prompt(prompt).multi_turn(max_turns).await,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;

    #[tokio::test]
    async fn test_create_agent_with_and_without_tools() {
        let config = LLMConfig {
            provider: LLMProvider::Ollama,
            ..LLMConfig::default()
        };
        let client = ProviderClient::new(&config).unwrap();
        let tools = PresetTools::new(Duration::from_secs(5)).unwrap();

        assert!(matches!(
            client.create_agent("You are the Market Analyst.", &config, None),
            ProviderAgent::Ollama(_)
        ));
        assert!(matches!(
            client.create_agent("You are the Market Analyst.", &config, Some(&tools)),
            ProviderAgent::Ollama(_)
        ));
    }
}
