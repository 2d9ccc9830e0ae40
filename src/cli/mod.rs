use crate::config::{Config, DEFAULT_CONFIG_FILE, LLMProvider};
use crate::i18n::TargetLanguage;
use anyhow::{Context, Result};
use clap::Parser;
use std::path::PathBuf;

/// 未指定任务时使用的默认任务
pub const DEFAULT_TASK: &str = "Analyze EV industry market and finance trends in 2025.";

/// EV Market Supervisor - 确定性的多智能体电动车市场情报流水线
#[derive(Parser, Debug)]
#[command(name = "ev-supervisor")]
#[command(
    about = "Deterministic supervisor that runs EV market analysis and validation agents in a fixed order and compiles an eight-section report."
)]
#[command(version)]
pub struct Args {
    /// 任务描述
    #[arg(default_value = DEFAULT_TASK)]
    pub task: String,

    /// 配置文件路径
    #[arg(short, long)]
    pub config: Option<PathBuf>,

    /// 报告输出目录
    #[arg(short, long)]
    pub output_path: Option<PathBuf>,

    /// LLM Provider (openai, deepseek, anthropic, openrouter, ollama)
    #[arg(long)]
    pub llm_provider: Option<String>,

    /// LLM API KEY
    #[arg(long)]
    pub llm_api_key: Option<String>,

    /// LLM API基地址
    #[arg(long)]
    pub llm_api_base_url: Option<String>,

    /// 所有智能体共用的模型
    #[arg(short, long)]
    pub model: Option<String>,

    /// 最大tokens数
    #[arg(long)]
    pub max_tokens: Option<u32>,

    /// 温度参数
    #[arg(long)]
    pub temperature: Option<f64>,

    /// 智能体回答语言 (ko, en, zh, ja, de, fr, ru)
    #[arg(long)]
    pub target_language: Option<String>,

    /// 总步数上限
    #[arg(long)]
    pub max_steps: Option<usize>,

    /// 失败计数上限
    #[arg(long)]
    pub max_retries: Option<usize>,

    /// 要求智能体回答的最大句数
    #[arg(long)]
    pub sentence_limit: Option<usize>,

    /// 禁用智能体的预置工具
    #[arg(long)]
    pub disable_preset_tools: bool,

    /// 调用渲染服务生成HTML/PDF
    #[arg(long)]
    pub render: bool,

    /// 渲染服务基地址
    #[arg(long)]
    pub render_url: Option<String>,

    /// 不生成PDF
    #[arg(long)]
    pub no_pdf: bool,

    /// 不生成HTML
    #[arg(long)]
    pub no_html: bool,

    /// 报告标题
    #[arg(long)]
    pub title: Option<String>,

    /// 报告副标题
    #[arg(long)]
    pub subtitle: Option<String>,

    /// 报告读者
    #[arg(long)]
    pub prepared_for: Option<String>,

    /// 报告作者
    #[arg(long)]
    pub prepared_by: Option<String>,

    /// 图表元数据JSON文件
    #[arg(long)]
    pub charts: Option<PathBuf>,

    /// 是否启用详细日志
    #[arg(short, long)]
    pub verbose: bool,
}

impl Args {
    /// 加载配置文件并用CLI参数覆盖
    pub fn into_config(self) -> Result<Config> {
        let mut config = match &self.config {
            Some(config_path) => Config::from_file(config_path)
                .context(format!("无法读取配置文件 {:?}", config_path))?,
            None => {
                let default_config_path = std::env::current_dir()
                    .unwrap_or_else(|_| PathBuf::from("."))
                    .join(DEFAULT_CONFIG_FILE);
                if default_config_path.exists() {
                    Config::from_file(&default_config_path).context(format!(
                        "无法读取默认配置文件 {:?}",
                        default_config_path
                    ))?
                } else {
                    Config::default()
                }
            }
        };

        if let Some(output_path) = self.output_path {
            config.output_path = output_path;
        }

        // 覆盖LLM配置
        if let Some(provider_str) = self.llm_provider {
            if let Ok(provider) = provider_str.parse::<LLMProvider>() {
                config.llm.provider = provider;
            } else {
                eprintln!(
                    "⚠️ 警告: 未知的provider: {}，使用 {}",
                    provider_str, config.llm.provider
                );
            }
        }
        if let Some(llm_api_base_url) = self.llm_api_base_url {
            config.llm.api_base_url = llm_api_base_url;
        }
        if let Some(llm_api_key) = self.llm_api_key {
            config.llm.api_key = llm_api_key;
        }
        if let Some(model) = self.model {
            config.llm.model = model;
        }
        if let Some(max_tokens) = self.max_tokens {
            config.llm.max_tokens = max_tokens;
        }
        if let Some(temperature) = self.temperature {
            config.llm.temperature = temperature;
        }
        if self.disable_preset_tools {
            config.llm.disable_preset_tools = true;
        }

        // 目标语言配置
        if let Some(target_language_str) = self.target_language {
            if let Ok(target_language) = target_language_str.parse::<TargetLanguage>() {
                config.target_language = target_language;
            } else {
                eprintln!(
                    "⚠️ 警告: 未知的目标语言: {}，使用 {}",
                    target_language_str,
                    config.target_language.display_name()
                );
            }
        }

        // 监督流程配置
        if let Some(max_steps) = self.max_steps {
            config.supervisor.max_steps = max_steps;
        }
        if let Some(max_retries) = self.max_retries {
            config.supervisor.max_retries = max_retries;
        }
        if let Some(sentence_limit) = self.sentence_limit {
            config.supervisor.response_sentence_limit = sentence_limit;
        }

        // 渲染配置
        if self.render {
            config.render.enabled = true;
        }
        if let Some(render_url) = self.render_url {
            config.render.base_url = render_url;
        }
        if self.no_pdf {
            config.render.pdf = false;
        }
        if self.no_html {
            config.render.html = false;
        }
        if let Some(title) = self.title {
            config.render.title = title;
        }
        if self.subtitle.is_some() {
            config.render.subtitle = self.subtitle;
        }
        if self.prepared_for.is_some() {
            config.render.prepared_for = self.prepared_for;
        }
        if self.prepared_by.is_some() {
            config.render.prepared_by = self.prepared_by;
        }
        if self.charts.is_some() {
            config.render.charts_path = self.charts;
        }

        if self.verbose {
            config.verbose = true;
        }

        Ok(config)
    }
}
