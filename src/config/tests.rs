#[cfg(test)]
mod tests {
    use crate::config::{Config, LLMConfig, LLMProvider, RenderConfig, SupervisorConfig};
    use crate::i18n::TargetLanguage;
    use std::fs;
    use std::path::PathBuf;
    use tempfile::TempDir;

    #[test]
    fn test_config_default() {
        let config = Config::default();

        assert_eq!(config.output_path, PathBuf::from("./reports"));
        assert_eq!(config.target_language, TargetLanguage::Korean);
        assert!(!config.verbose);
    }

    #[test]
    fn test_llm_provider_default() {
        let provider = LLMProvider::default();
        assert_eq!(provider, LLMProvider::OpenAI);
    }

    #[test]
    fn test_llm_provider_from_str() {
        assert_eq!(
            "openai".parse::<LLMProvider>().unwrap(),
            LLMProvider::OpenAI
        );
        assert_eq!(
            "DeepSeek".parse::<LLMProvider>().unwrap(),
            LLMProvider::DeepSeek
        );
        assert_eq!(
            "anthropic".parse::<LLMProvider>().unwrap(),
            LLMProvider::Anthropic
        );
        assert_eq!(
            "openrouter".parse::<LLMProvider>().unwrap(),
            LLMProvider::OpenRouter
        );
        assert_eq!(
            "ollama".parse::<LLMProvider>().unwrap(),
            LLMProvider::Ollama
        );

        assert!("invalid".parse::<LLMProvider>().is_err());
    }

    #[test]
    fn test_llm_provider_display() {
        assert_eq!(LLMProvider::OpenAI.to_string(), "openai");
        assert_eq!(LLMProvider::DeepSeek.to_string(), "deepseek");
        assert_eq!(LLMProvider::Anthropic.to_string(), "anthropic");
        assert_eq!(LLMProvider::OpenRouter.to_string(), "openrouter");
        assert_eq!(LLMProvider::Ollama.to_string(), "ollama");
    }

    #[test]
    fn test_llm_config_default() {
        let config = LLMConfig::default();

        assert_eq!(config.provider, LLMProvider::OpenAI);
        // api_key may be empty if env var is not set
        assert!(!config.api_base_url.is_empty());
        assert_eq!(config.model, "gpt-4o-mini");
        assert_eq!(config.temperature, 0.2);
        assert_eq!(config.retry_attempts, 3);
        assert!(!config.disable_preset_tools);
        assert_eq!(config.max_tool_turns, 3);
    }

    #[test]
    fn test_supervisor_config_default() {
        let config = SupervisorConfig::default();

        assert_eq!(config.max_steps, 25);
        assert_eq!(config.max_retries, 2);
        assert_eq!(config.response_sentence_limit, 6);
        assert_eq!(config.report_sentence_limit, 4);
    }

    #[test]
    fn test_render_config_default() {
        let config = RenderConfig::default();

        assert!(!config.enabled);
        assert_eq!(config.base_url, "http://localhost:8080");
        assert!(config.html);
        assert!(config.pdf);
        assert!(config.charts_path.is_none());
    }

    #[test]
    fn test_from_file_partial_sections_fall_back_to_defaults() {
        let temp_dir = TempDir::new().unwrap();
        let path = temp_dir.path().join("ev-supervisor.toml");
        fs::write(
            &path,
            r#"
target_language = "en"

[llm]
provider = "anthropic"
model = "claude-test"

[supervisor]
max_steps = 5
"#,
        )
        .unwrap();

        let config = Config::from_file(&path).unwrap();

        assert_eq!(config.target_language, TargetLanguage::English);
        assert_eq!(config.llm.provider, LLMProvider::Anthropic);
        assert_eq!(config.llm.model, "claude-test");
        assert_eq!(config.llm.max_tool_turns, 3);
        assert_eq!(config.supervisor.max_steps, 5);
        assert_eq!(config.supervisor.max_retries, 2);
        assert_eq!(config.output_path, PathBuf::from("./reports"));
    }

    #[test]
    fn test_from_file_missing_file_is_an_error() {
        let temp_dir = TempDir::new().unwrap();
        let result = Config::from_file(&temp_dir.path().join("missing.toml"));
        assert!(result.is_err());
    }

    #[test]
    fn test_from_file_invalid_toml_is_an_error() {
        let temp_dir = TempDir::new().unwrap();
        let path = temp_dir.path().join("broken.toml");
        fs::write(&path, "[llm\nmodel = ").unwrap();

        assert!(Config::from_file(&path).is_err());
    }
}
