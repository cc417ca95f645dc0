//! Settings Models
//!
//! Application configuration stored in config.json. Secrets are normally
//! supplied through the environment and overlaid with
//! [`AppConfig::apply_env_overrides`]; they are never written back to disk.

use std::path::PathBuf;

use serde::{Deserialize, Serialize};

/// Environment variable holding the OpenAI API key.
pub const ENV_OPENAI_API_KEY: &str = "OPENAI_API_KEY";
/// Environment variable holding the Etherscan API key.
pub const ENV_ETHERSCAN_API_KEY: &str = "ETHERSCAN_API_KEY";
/// Environment variable holding the Telegram bot token.
pub const ENV_TELEGRAM_TOKEN: &str = "TELEGRAM_TOKEN";

/// Application configuration stored in config.json
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct AppConfig {
    #[serde(default)]
    pub llm: LlmSettings,
    #[serde(default)]
    pub embedding: EmbeddingSettings,
    #[serde(default)]
    pub engine: EngineSettings,
    #[serde(default)]
    pub selector: SelectorSettings,
    #[serde(default)]
    pub orchestrator: OrchestratorSettings,
    #[serde(default)]
    pub telegram: TelegramSettings,
    /// Check catalog file; the engine's own listing is used when unset
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub catalog_path: Option<PathBuf>,
    /// Enable debug mode
    #[serde(default)]
    pub debug_mode: bool,
}

/// Language-model settings shared by the decision, refine and summary steps
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LlmSettings {
    pub model: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub base_url: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub api_key: Option<String>,
    /// Temperature for the summary step; tool selection always runs at 0
    pub temperature: f32,
    pub max_tokens: u32,
    pub timeout_secs: u64,
}

impl Default for LlmSettings {
    fn default() -> Self {
        Self {
            model: "gpt-3.5-turbo-0125".to_string(),
            base_url: None,
            api_key: None,
            temperature: 0.7,
            max_tokens: 1024,
            timeout_secs: 60,
        }
    }
}

/// Embedding provider: "tfidf" (local) or "openai"
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EmbeddingSettings {
    pub provider: String,
    pub model: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub base_url: Option<String>,
    pub batch_size: usize,
}

impl Default for EmbeddingSettings {
    fn default() -> Self {
        Self {
            provider: "tfidf".to_string(),
            model: "text-embedding-3-small".to_string(),
            base_url: None,
            batch_size: 64,
        }
    }
}

/// Slither and Etherscan settings
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EngineSettings {
    /// Path or name of the slither executable
    pub slither_path: String,
    pub etherscan_base_url: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub etherscan_api_key: Option<String>,
    /// Upper bound for one slither invocation
    pub timeout_secs: u64,
}

impl Default for EngineSettings {
    fn default() -> Self {
        Self {
            slither_path: "slither".to_string(),
            etherscan_base_url: "https://api.etherscan.io/api".to_string(),
            etherscan_api_key: None,
            timeout_secs: 300,
        }
    }
}

/// Check selection settings
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SelectorSettings {
    /// Number of nearest catalog entries retrieved per query
    pub top_k: usize,
    /// Ask the language model to narrow down the retrieved checks
    pub llm_refine: bool,
}

impl Default for SelectorSettings {
    fn default() -> Self {
        Self {
            top_k: 5,
            llm_refine: false,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OrchestratorSettings {
    /// Wall-clock limit for one orchestration run; zero means unbounded
    pub run_timeout_secs: u64,
}

impl Default for OrchestratorSettings {
    fn default() -> Self {
        Self {
            run_timeout_secs: 600,
        }
    }
}

/// Telegram bot settings
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TelegramSettings {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub bot_token: Option<String>,
    /// Chats allowed to use the bot; empty allows everyone
    #[serde(default)]
    pub allowed_chat_ids: Vec<i64>,
    pub max_message_length: usize,
}

impl Default for TelegramSettings {
    fn default() -> Self {
        Self {
            bot_token: None,
            allowed_chat_ids: Vec::new(),
            max_message_length: 4096,
        }
    }
}

impl AppConfig {
    /// Overlay secrets from the environment.
    pub fn apply_env_overrides(&mut self) {
        self.apply_overrides_from(|key| std::env::var(key).ok());
    }

    /// Overlay secrets from an arbitrary lookup. Empty values are ignored.
    pub fn apply_overrides_from(&mut self, lookup: impl Fn(&str) -> Option<String>) {
        let get = |key: &str| lookup(key).filter(|v| !v.trim().is_empty());
        if let Some(key) = get(ENV_OPENAI_API_KEY) {
            self.llm.api_key = Some(key);
        }
        if let Some(key) = get(ENV_ETHERSCAN_API_KEY) {
            self.engine.etherscan_api_key = Some(key);
        }
        if let Some(token) = get(ENV_TELEGRAM_TOKEN) {
            self.telegram.bot_token = Some(token);
        }
    }

    /// Validate the configuration values
    pub fn validate(&self) -> Result<(), String> {
        if self.llm.model.trim().is_empty() {
            return Err("llm.model must not be empty".to_string());
        }

        if !(0.0..=2.0).contains(&self.llm.temperature) {
            return Err(format!(
                "Invalid llm.temperature: {}. Must be between 0 and 2",
                self.llm.temperature
            ));
        }

        if !["tfidf", "openai"].contains(&self.embedding.provider.as_str()) {
            return Err(format!(
                "Invalid embedding.provider: {}. Must be 'tfidf' or 'openai'",
                self.embedding.provider
            ));
        }

        if self.embedding.batch_size == 0 {
            return Err("embedding.batch_size must be at least 1".to_string());
        }

        if self.selector.top_k == 0 || self.selector.top_k > 50 {
            return Err("selector.top_k must be between 1 and 50".to_string());
        }

        if self.telegram.max_message_length == 0 || self.telegram.max_message_length > 4096 {
            return Err("telegram.max_message_length must be between 1 and 4096".to_string());
        }

        Ok(())
    }

    /// A copy with every secret removed, suitable for writing to disk.
    pub fn without_secrets(&self) -> Self {
        let mut config = self.clone();
        config.llm.api_key = None;
        config.engine.etherscan_api_key = None;
        config.telegram.bot_token = None;
        config
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    #[test]
    fn test_default_config() {
        let config = AppConfig::default();
        assert_eq!(config.llm.model, "gpt-3.5-turbo-0125");
        assert_eq!(config.embedding.provider, "tfidf");
        assert_eq!(config.selector.top_k, 5);
        assert!(!config.selector.llm_refine);
        assert_eq!(config.telegram.max_message_length, 4096);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_partial_json_uses_defaults() {
        let config: AppConfig =
            serde_json::from_str(r#"{"selector": {"top_k": 8, "llm_refine": true}}"#).unwrap();
        assert_eq!(config.selector.top_k, 8);
        assert!(config.selector.llm_refine);
        assert_eq!(config.engine.slither_path, "slither");
    }

    #[test]
    fn test_validate_rejects_bad_values() {
        let mut config = AppConfig::default();
        config.embedding.provider = "chroma".to_string();
        assert!(config.validate().unwrap_err().contains("embedding.provider"));

        let mut config = AppConfig::default();
        config.selector.top_k = 0;
        assert!(config.validate().is_err());

        let mut config = AppConfig::default();
        config.telegram.max_message_length = 5000;
        assert!(config.validate().is_err());

        let mut config = AppConfig::default();
        config.llm.temperature = 3.0;
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_zero_run_timeout_is_valid() {
        let config: AppConfig = serde_json::from_str(r#"{"orchestrator": {"run_timeout_secs": 0}}"#).unwrap();
        assert_eq!(config.orchestrator.run_timeout_secs, 0);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_overrides_from_lookup() {
        let env: HashMap<&str, &str> = [
            (ENV_OPENAI_API_KEY, "sk-test"),
            (ENV_ETHERSCAN_API_KEY, "  "),
            (ENV_TELEGRAM_TOKEN, "123:abc"),
        ]
        .into_iter()
        .collect();
        let mut config = AppConfig::default();
        config.engine.etherscan_api_key = Some("from-file".to_string());
        config.apply_overrides_from(|key| env.get(key).map(|v| v.to_string()));

        assert_eq!(config.llm.api_key.as_deref(), Some("sk-test"));
        assert_eq!(config.engine.etherscan_api_key.as_deref(), Some("from-file"));
        assert_eq!(config.telegram.bot_token.as_deref(), Some("123:abc"));
    }

    #[test]
    fn test_without_secrets() {
        let mut config = AppConfig::default();
        config.llm.api_key = Some("sk".to_string());
        config.telegram.bot_token = Some("t".to_string());
        let json = serde_json::to_string(&config.without_secrets()).unwrap();
        assert!(!json.contains("api_key"));
        assert!(!json.contains("bot_token"));
    }
}
