use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::fs::File;
use std::io::Read;
use std::path::{Path, PathBuf};

use crate::i18n::TargetLanguage;

/// 默认配置文件名
pub const DEFAULT_CONFIG_FILE: &str = "ev-supervisor.toml";

/// 读取LLM API KEY的环境变量
pub const API_KEY_ENV: &str = "EV_SUPERVISOR_API_KEY";

/// LLM Provider类型
#[derive(Debug, Deserialize, Serialize, Clone, PartialEq, Default)]
pub enum LLMProvider {
    #[serde(rename = "openai")]
    #[default]
    OpenAI,
    #[serde(rename = "deepseek")]
    DeepSeek,
    #[serde(rename = "anthropic")]
    Anthropic,
    #[serde(rename = "openrouter")]
    OpenRouter,
    #[serde(rename = "ollama")]
    Ollama,
}

impl std::fmt::Display for LLMProvider {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            LLMProvider::OpenAI => write!(f, "openai"),
            LLMProvider::DeepSeek => write!(f, "deepseek"),
            LLMProvider::Anthropic => write!(f, "anthropic"),
            LLMProvider::OpenRouter => write!(f, "openrouter"),
            LLMProvider::Ollama => write!(f, "ollama"),
        }
    }
}

impl std::str::FromStr for LLMProvider {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "openai" => Ok(LLMProvider::OpenAI),
            "deepseek" => Ok(LLMProvider::DeepSeek),
            "anthropic" => Ok(LLMProvider::Anthropic),
            "openrouter" => Ok(LLMProvider::OpenRouter),
            "ollama" => Ok(LLMProvider::Ollama),
            _ => Err(format!("Unknown provider: {}", s)),
        }
    }
}

/// 应用程序配置
#[derive(Debug, Deserialize, Serialize, Clone)]
#[serde(default)]
pub struct Config {
    /// 报告输出目录
    pub output_path: PathBuf,

    /// 智能体回答使用的语言
    pub target_language: TargetLanguage,

    /// LLM模型配置
    pub llm: LLMConfig,

    /// 监督流程配置
    pub supervisor: SupervisorConfig,

    /// 渲染服务配置
    pub render: RenderConfig,

    /// 是否启用详细日志
    pub verbose: bool,
}

/// LLM模型配置
#[derive(Debug, Deserialize, Serialize, Clone)]
#[serde(default)]
pub struct LLMConfig {
    /// LLM Provider类型
    pub provider: LLMProvider,

    /// LLM API KEY
    pub api_key: String,

    /// LLM API基地址
    pub api_base_url: String,

    /// 所有智能体共用的模型
    pub model: String,

    /// 最大tokens
    pub max_tokens: u32,

    /// 温度
    pub temperature: f64,

    /// 重试次数（仅作用于单次模型调用的传输层）
    pub retry_attempts: u32,

    /// 重试间隔（毫秒）
    pub retry_delay_ms: u64,

    /// 超时时间（秒）
    pub timeout_seconds: u64,

    /// 禁用智能体的预置工具（web_search、clock、claim_audit）
    pub disable_preset_tools: bool,

    /// 工具调用的最大轮数
    pub max_tool_turns: usize,
}

/// 监督流程配置
#[derive(Debug, Deserialize, Serialize, Clone, PartialEq)]
#[serde(default)]
pub struct SupervisorConfig {
    /// 总步数上限，超出即视为致命错误
    pub max_steps: usize,

    /// 失败计数上限，超出即视为致命错误
    pub max_retries: usize,

    /// 要求智能体回答的最大句数
    pub response_sentence_limit: usize,

    /// 报告中每段笔记保留的最大句数
    pub report_sentence_limit: usize,
}

/// 渲染服务配置
#[derive(Debug, Deserialize, Serialize, Clone)]
#[serde(default)]
pub struct RenderConfig {
    /// 是否调用渲染服务
    pub enabled: bool,

    /// 渲染服务基地址
    pub base_url: String,

    /// 超时时间（秒）
    pub timeout_seconds: u64,

    /// 是否生成HTML
    pub html: bool,

    /// 是否生成PDF
    pub pdf: bool,

    pub title: String,

    pub subtitle: Option<String>,

    /// 摘要，为空时从执行摘要章节中提取
    pub summary: Option<String>,

    pub prepared_for: Option<String>,

    pub prepared_by: Option<String>,

    /// 图表元数据JSON文件
    pub charts_path: Option<PathBuf>,
}

impl Config {
    /// 从文件加载配置
    pub fn from_file(path: &Path) -> Result<Self> {
        let mut file =
            File::open(path).context(format!("Failed to open config file: {:?}", path))?;
        let mut content = String::new();
        file.read_to_string(&mut content)
            .context("Failed to read config file")?;

        let config: Config = toml::from_str(&content).context("Failed to parse config file")?;
        Ok(config)
    }
}

impl Default for Config {
    fn default() -> Self {
        Self {
            output_path: PathBuf::from("./reports"),
            target_language: TargetLanguage::default(),
            llm: LLMConfig::default(),
            supervisor: SupervisorConfig::default(),
            render: RenderConfig::default(),
            verbose: false,
        }
    }
}

impl Default for LLMConfig {
    fn default() -> Self {
        Self {
            provider: LLMProvider::default(),
            api_key: std::env::var(API_KEY_ENV).unwrap_or_default(),
            api_base_url: String::from("https://api.openai.com/v1"),
            model: String::from("gpt-4o-mini"),
            max_tokens: 4096,
            temperature: 0.2,
            retry_attempts: 3,
            retry_delay_ms: 2000,
            timeout_seconds: 120,
            disable_preset_tools: false,
            max_tool_turns: 3,
        }
    }
}

impl Default for SupervisorConfig {
    fn default() -> Self {
        Self {
            max_steps: 25,
            max_retries: 2,
            response_sentence_limit: 6,
            report_sentence_limit: 4,
        }
    }
}

impl Default for RenderConfig {
    fn default() -> Self {
        Self {
            enabled: false,
            base_url: String::from("http://localhost:8080"),
            timeout_seconds: 60,
            html: true,
            pdf: true,
            title: String::from("EV Market Supervisor Report"),
            subtitle: None,
            summary: None,
            prepared_for: None,
            prepared_by: None,
            charts_path: None,
        }
    }
}

// Include tests
#[cfg(test)]
mod tests;
