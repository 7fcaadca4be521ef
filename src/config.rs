use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::PathBuf;

/// Environment variable that overrides the stored API key
pub const API_KEY_ENV: &str = "GEMINI_API_KEY";

#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct Config {
    #[serde(default)]
    pub api: ApiConfig,

    #[serde(default)]
    pub chat: ChatConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct ApiConfig {
    /// Stored API credential (env var takes precedence)
    pub key: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct ChatConfig {
    /// Preferred model label ("FLASH" or "PRO")
    pub model: Option<String>,

    /// Generate for a desanitized (unlocked) DCS environment
    #[serde(default)]
    pub desanitized: bool,
}

impl Config {
    /// Load configuration from file, creating default if it doesn't exist
    pub fn load() -> Result<Self> {
        let config_path = Self::config_path()?;

        if !config_path.exists() {
            let config = Config::default();
            config.save()?;
            return Ok(config);
        }

        let contents =
            fs::read_to_string(&config_path).context("Failed to read config file")?;

        let config: Config = toml::from_str(&contents).context("Failed to parse config file")?;

        Ok(config)
    }

    /// Save configuration to file
    pub fn save(&self) -> Result<()> {
        let config_path = Self::config_path()?;

        if let Some(parent) = config_path.parent() {
            fs::create_dir_all(parent).context("Failed to create config directory")?;
        }

        let toml_string = toml::to_string_pretty(self).context("Failed to serialize config")?;

        fs::write(&config_path, toml_string).context("Failed to write config file")?;

        Ok(())
    }

    /// Get the configuration file path
    pub fn config_path() -> Result<PathBuf> {
        let home = dirs::home_dir().context("Could not determine home directory")?;

        Ok(home.join(".mission-architect").join("config.toml"))
    }

    /// Directory holding cached repository trees
    pub fn cache_dir() -> Result<PathBuf> {
        let home = dirs::home_dir().context("Could not determine home directory")?;

        Ok(home.join(".mission-architect").join("cache"))
    }

    /// Effective API key: environment variable first, then stored value
    pub fn api_key(&self) -> Option<String> {
        std::env::var(API_KEY_ENV)
            .ok()
            .filter(|key| !key.trim().is_empty())
            .or_else(|| self.api.key.clone())
    }

    /// Store the API key
    pub fn set_api_key(&mut self, key: String) {
        self.api.key = Some(key);
    }

    /// Set the preferred model label
    pub fn set_model(&mut self, label: String) {
        self.chat.model = Some(label);
    }

    /// Get the preferred model label
    pub fn model(&self) -> Option<&str> {
        self.chat.model.as_deref()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_config_default() {
        let config = Config::default();
        assert!(config.api.key.is_none());
        assert!(config.chat.model.is_none());
        assert!(!config.chat.desanitized);
    }

    #[test]
    fn test_set_model() {
        let mut config = Config::default();
        config.set_model("PRO".to_string());
        assert_eq!(config.model(), Some("PRO"));
    }

    #[test]
    fn test_config_serialization() {
        let mut config = Config::default();
        config.set_api_key("test-key".to_string());
        config.set_model("FLASH".to_string());

        let toml_string = toml::to_string(&config).unwrap();
        assert!(toml_string.contains("test-key"));

        let deserialized: Config = toml::from_str(&toml_string).unwrap();
        assert_eq!(deserialized.api.key.as_deref(), Some("test-key"));
        assert_eq!(deserialized.model(), Some("FLASH"));
    }

    #[test]
    fn test_missing_sections_default() {
        let config: Config = toml::from_str("").unwrap();
        assert!(config.api.key.is_none());
        assert!(!config.chat.desanitized);
    }
}
