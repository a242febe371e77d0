use serde::Deserialize;
use std::fs;
use std::path::Path;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read config file: {0}")]
    FileRead(#[from] std::io::Error),

    #[error("failed to parse config file: {0}")]
    Parse(#[from] toml::de::Error),

    #[error("GITHUB_TOKEN is not set (export it or add it to .prd.toml)")]
    MissingGitHubToken,

    #[error("ANTHROPIC_API_KEY is not set (export it or add it to .prd.toml)")]
    MissingAnthropicKey,
}

/// Model used when neither the config file nor PRD_MODEL names one.
pub const DEFAULT_MODEL: &str = "claude-opus-5";

/// Top-level configuration loaded from .prd.toml. All fields are
/// optional — the tool works with no config file when the credentials
/// come from the environment.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub github: GitHubConfig,

    #[serde(default)]
    pub anthropic: AnthropicConfig,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct GitHubConfig {
    /// GitHub API token. If None, falls back to the GITHUB_TOKEN env var.
    pub token: Option<String>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct AnthropicConfig {
    /// Anthropic API key. If None, falls back to the ANTHROPIC_API_KEY env var.
    pub api_key: Option<String>,
    /// Model id override. If None, falls back to PRD_MODEL, then the default.
    pub model: Option<String>,
}

impl Config {
    /// Load configuration from .prd.toml in the current directory.
    /// Returns the default config if the file doesn't exist.
    pub fn load() -> Result<Config, ConfigError> {
        let path = Path::new(".prd.toml");
        if path.exists() {
            Self::load_from(path)
        } else {
            Ok(Config::default())
        }
    }

    /// Load from a specific path (useful for testing).
    pub fn load_from(path: &Path) -> Result<Config, ConfigError> {
        let contents = fs::read_to_string(path)?;
        let config = toml::from_str(&contents)?;
        Ok(config)
    }

    /// Resolve the GitHub token: config file value takes precedence,
    /// falls back to GITHUB_TOKEN. Absence is a fatal pre-flight error.
    pub fn github_token(&self) -> Result<String, ConfigError> {
        self.github
            .token
            .clone()
            .or_else(|| std::env::var("GITHUB_TOKEN").ok())
            .ok_or(ConfigError::MissingGitHubToken)
    }

    /// Resolve the Anthropic API key, same precedence as the GitHub token.
    pub fn anthropic_api_key(&self) -> Result<String, ConfigError> {
        self.anthropic
            .api_key
            .clone()
            .or_else(|| std::env::var("ANTHROPIC_API_KEY").ok())
            .ok_or(ConfigError::MissingAnthropicKey)
    }

    /// Resolve the model id; always succeeds.
    pub fn model(&self) -> String {
        self.anthropic
            .model
            .clone()
            .or_else(|| std::env::var("PRD_MODEL").ok())
            .unwrap_or_else(|| DEFAULT_MODEL.to_string())
    }
}
