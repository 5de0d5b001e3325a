//! Configuration loading from skiff.json.
//!
//! A small JSON file in the per-user config directory holds the
//! default provider and model plus optional API keys. It is created
//! with defaults on first run so the user has a file to edit; keys
//! absent from the file fall back to the provider's conventional
//! environment variable.

use crate::error::{Error, Result};
use runtime::Provider;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

const DEFAULT_PROVIDER: Provider = Provider::Gemini;
const DEFAULT_MODEL: &str = "gemini-2.0-flash";

/// Top-level configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Provider to chat with ("gemini", "openai", or "anthropic").
    pub provider: Provider,

    /// Model id, resolved against the catalog before use.
    pub model: String,

    pub gemini_api_key: Option<String>,
    pub openai_api_key: Option<String>,
    pub anthropic_api_key: Option<String>,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            provider: DEFAULT_PROVIDER,
            model: DEFAULT_MODEL.to_string(),
            gemini_api_key: None,
            openai_api_key: None,
            anthropic_api_key: None,
        }
    }
}

impl Config {
    /// Load the per-user config, writing a default file on first run.
    pub fn load() -> Result<Self> {
        let path = Self::path()?;
        if !path.exists() {
            let config = Self::default();
            config.save_to(&path)?;
            return Ok(config);
        }

        let content = std::fs::read_to_string(&path)?;
        Self::parse(&content)
    }

    /// Parse configuration from a JSON string.
    pub fn parse(json: &str) -> Result<Self> {
        serde_json::from_str(json).map_err(|e| Error::Config(e.to_string()))
    }

    /// Write the config back to its per-user path.
    pub fn save(&self) -> Result<()> {
        self.save_to(&Self::path()?)
    }

    fn save_to(&self, path: &Path) -> Result<()> {
        if let Some(dir) = path.parent() {
            std::fs::create_dir_all(dir)?;
        }
        let json =
            serde_json::to_string_pretty(self).map_err(|e| Error::Config(e.to_string()))?;
        std::fs::write(path, json)?;
        Ok(())
    }

    /// `$XDG_CONFIG_HOME/skiff/skiff.json` (or the platform equivalent).
    pub fn path() -> Result<PathBuf> {
        config_dir()
            .map(|dir| dir.join("skiff").join("skiff.json"))
            .ok_or_else(|| Error::Config("cannot determine config directory".into()))
    }

    /// API key for the configured provider: config value first, then
    /// the provider's environment variable.
    pub fn api_key(&self) -> Result<String> {
        let (configured, env_var) = match self.provider {
            Provider::Gemini => (&self.gemini_api_key, "GEMINI_API_KEY"),
            Provider::OpenAi => (&self.openai_api_key, "OPENAI_API_KEY"),
            Provider::Anthropic => (&self.anthropic_api_key, "ANTHROPIC_API_KEY"),
        };

        if let Some(key) = configured {
            if !key.is_empty() {
                return Ok(key.clone());
            }
        }
        std::env::var(env_var).map_err(|_| Error::MissingApiKey {
            provider: self.provider.to_string(),
            env_var,
        })
    }
}

fn config_dir() -> Option<PathBuf> {
    #[cfg(target_os = "macos")]
    {
        std::env::var_os("HOME").map(|h| PathBuf::from(h).join("Library/Application Support"))
    }
    #[cfg(target_os = "linux")]
    {
        std::env::var_os("XDG_CONFIG_HOME")
            .map(PathBuf::from)
            .or_else(|| std::env::var_os("HOME").map(|h| PathBuf::from(h).join(".config")))
    }
    #[cfg(target_os = "windows")]
    {
        std::env::var_os("APPDATA").map(PathBuf::from)
    }
    #[cfg(not(any(target_os = "macos", target_os = "linux", target_os = "windows")))]
    {
        None
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_fill_missing_fields() {
        let config = Config::parse("{}").unwrap();
        assert_eq!(config.provider, Provider::Gemini);
        assert_eq!(config.model, DEFAULT_MODEL);
        assert!(config.gemini_api_key.is_none());
    }

    #[test]
    fn parse_reads_provider_and_keys() {
        let config = Config::parse(
            r#"{"provider": "anthropic", "model": "claude-4-sonnet", "anthropic_api_key": "sk-ant-test"}"#,
        )
        .unwrap();
        assert_eq!(config.provider, Provider::Anthropic);
        assert_eq!(config.model, "claude-4-sonnet");
        assert_eq!(config.api_key().unwrap(), "sk-ant-test");
    }

    #[test]
    fn save_round_trips() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("skiff.json");

        let mut config = Config::default();
        config.provider = Provider::OpenAi;
        config.model = "gpt-4o".into();
        config.openai_api_key = Some("sk-test".into());
        config.save_to(&path).unwrap();

        let loaded = Config::parse(&std::fs::read_to_string(&path).unwrap()).unwrap();
        assert_eq!(loaded.provider, Provider::OpenAi);
        assert_eq!(loaded.model, "gpt-4o");
        assert_eq!(loaded.openai_api_key.as_deref(), Some("sk-test"));
    }

    #[test]
    fn empty_configured_key_falls_through() {
        let mut config = Config::default();
        config.provider = Provider::Anthropic;
        config.anthropic_api_key = Some(String::new());
        // With no env var set either, this must report the missing key.
        if std::env::var("ANTHROPIC_API_KEY").is_err() {
            assert!(matches!(
                config.api_key(),
                Err(Error::MissingApiKey { env_var: "ANTHROPIC_API_KEY", .. })
            ));
        }
    }
}
