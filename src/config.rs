use anyhow::{bail, Context, Result};
use serde::Deserialize;
use std::path::Path;

#[derive(Debug, Deserialize, Clone)]
pub struct Config {
    pub telegram: TelegramConfig,
    pub llm: LlmConfig,
    #[serde(default)]
    pub bot: BotConfig,
}

#[derive(Debug, Deserialize, Clone)]
pub struct TelegramConfig {
    pub bot_token: String,
}

#[derive(Debug, Deserialize, Clone)]
pub struct LlmConfig {
    pub api_key: String,
    #[serde(default = "default_base_url")]
    pub base_url: String,
    #[serde(default = "default_model")]
    pub model: String,
    #[serde(default = "default_vision_model")]
    pub vision_model: String,
    #[serde(default = "default_max_tokens")]
    pub max_tokens: u32,
}

/// Chat-behavior knobs. In group chats the bot only answers messages that
/// contain the trigger keyword; summarization additionally requires the
/// summarize keyword.
#[derive(Debug, Deserialize, Clone)]
pub struct BotConfig {
    #[serde(default = "default_trigger_keyword")]
    pub trigger_keyword: String,
    #[serde(default = "default_summarize_keyword")]
    pub summarize_keyword: String,
}

impl Default for BotConfig {
    fn default() -> Self {
        Self {
            trigger_keyword: default_trigger_keyword(),
            summarize_keyword: default_summarize_keyword(),
        }
    }
}

fn default_base_url() -> String {
    "https://api.openai.com/v1".to_string()
}

fn default_model() -> String {
    "gpt-4o-mini".to_string()
}

fn default_vision_model() -> String {
    "gpt-4o".to_string()
}

fn default_max_tokens() -> u32 {
    4096
}

fn default_trigger_keyword() -> String {
    "diko".to_string()
}

fn default_summarize_keyword() -> String {
    "rangkum".to_string()
}

impl Config {
    pub fn load(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file: {}", path.display()))?;

        let config: Config = toml::from_str(&content)
            .with_context(|| format!("Failed to parse config file: {}", path.display()))?;

        if config.telegram.bot_token.is_empty() {
            bail!("telegram.bot_token must be set in the config file");
        }
        if config.llm.api_key.is_empty() {
            bail!("llm.api_key must be set in the config file");
        }

        Ok(config)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_minimal_config_gets_defaults() {
        let config: Config = toml::from_str(
            r#"
            [telegram]
            bot_token = "123:abc"

            [llm]
            api_key = "sk-test"
            "#,
        )
        .unwrap();

        assert_eq!(config.llm.base_url, "https://api.openai.com/v1");
        assert_eq!(config.llm.model, "gpt-4o-mini");
        assert_eq!(config.llm.vision_model, "gpt-4o");
        assert_eq!(config.llm.max_tokens, 4096);
        assert_eq!(config.bot.trigger_keyword, "diko");
        assert_eq!(config.bot.summarize_keyword, "rangkum");
    }

    #[test]
    fn test_explicit_values_override_defaults() {
        let config: Config = toml::from_str(
            r#"
            [telegram]
            bot_token = "123:abc"

            [llm]
            api_key = "sk-test"
            model = "gpt-4.1"
            vision_model = "gpt-4.1"
            max_tokens = 1024

            [bot]
            trigger_keyword = "bot"
            summarize_keyword = "summarize"
            "#,
        )
        .unwrap();

        assert_eq!(config.llm.model, "gpt-4.1");
        assert_eq!(config.llm.max_tokens, 1024);
        assert_eq!(config.bot.trigger_keyword, "bot");
        assert_eq!(config.bot.summarize_keyword, "summarize");
    }

    #[test]
    fn test_missing_api_key_is_an_error() {
        let result: Result<Config, _> = toml::from_str::<Config>(
            r#"
            [telegram]
            bot_token = "123:abc"

            [llm]
            "#,
        );
        assert!(result.is_err());
    }

    #[test]
    fn test_missing_telegram_section_is_an_error() {
        let result: Result<Config, _> = toml::from_str::<Config>(
            r#"
            [llm]
            api_key = "sk-test"
            "#,
        );
        assert!(result.is_err());
    }
}
