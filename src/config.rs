//! Configuration file handling.
//!
//! This module handles loading and merging configuration from
//! `.nregs-analyst.toml` files.

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// Name of the configuration file looked up in the working directory.
pub const CONFIG_FILE: &str = ".nregs-analyst.toml";

/// Root configuration structure.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Config {
    /// General settings.
    #[serde(default)]
    pub general: GeneralConfig,

    /// Dashboard API settings.
    #[serde(default)]
    pub source: SourceConfig,

    /// Narrative model settings.
    #[serde(default)]
    pub model: ModelConfig,
}

/// General application settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GeneralConfig {
    /// Directory that receives reports and model artifacts.
    #[serde(default = "default_output_dir")]
    pub output_dir: PathBuf,

    /// Directory that receives the per-report log files.
    #[serde(default = "default_log_dir")]
    pub log_dir: PathBuf,

    /// Enable verbose logging by default.
    #[serde(default)]
    pub verbose: bool,
}

impl Default for GeneralConfig {
    fn default() -> Self {
        Self {
            output_dir: default_output_dir(),
            log_dir: default_log_dir(),
            verbose: false,
        }
    }
}

fn default_output_dir() -> PathBuf {
    PathBuf::from("output")
}

fn default_log_dir() -> PathBuf {
    PathBuf::from(".")
}

/// Dashboard API settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SourceConfig {
    /// Base URL; each report type appends its own endpoint.
    #[serde(default = "default_base_url")]
    pub base_url: String,

    /// Request timeout in seconds. Unset means the HTTP client default.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub timeout_seconds: Option<u64>,
}

impl Default for SourceConfig {
    fn default() -> Self {
        Self {
            base_url: default_base_url(),
            timeout_seconds: None,
        }
    }
}

fn default_base_url() -> String {
    "https://dashboard.nregsmp.org/api/employment_workers".to_string()
}

/// Narrative model settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ModelConfig {
    /// Model name.
    #[serde(default = "default_model")]
    pub name: String,

    /// Messages API endpoint.
    #[serde(default = "default_api_url")]
    pub api_url: String,

    /// Maximum tokens in the response, thinking included.
    #[serde(default = "default_max_tokens")]
    pub max_tokens: u32,

    /// Tokens the model may spend on extended thinking.
    #[serde(default = "default_thinking_budget")]
    pub thinking_budget: u32,

    /// Environment variable holding the API key.
    #[serde(default = "default_api_key_env")]
    pub api_key_env: String,

    /// Request timeout in seconds. Unset means the HTTP client default.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub timeout_seconds: Option<u64>,
}

impl Default for ModelConfig {
    fn default() -> Self {
        Self {
            name: default_model(),
            api_url: default_api_url(),
            max_tokens: default_max_tokens(),
            thinking_budget: default_thinking_budget(),
            api_key_env: default_api_key_env(),
            timeout_seconds: None,
        }
    }
}

fn default_model() -> String {
    "claude-3-7-sonnet-20250219".to_string()
}

fn default_api_url() -> String {
    "https://api.anthropic.com/v1/messages".to_string()
}

fn default_max_tokens() -> u32 {
    20000
}

fn default_thinking_budget() -> u32 {
    16000
}

fn default_api_key_env() -> String {
    "ANTHROPIC_API_KEY".to_string()
}

impl Config {
    /// Load configuration from a file path.
    pub fn load(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file: {}", path.display()))?;

        let config: Config = toml::from_str(&content)
            .with_context(|| format!("Failed to parse config file: {}", path.display()))?;

        Ok(config)
    }

    /// Try to load configuration from the default location.
    ///
    /// Returns `Ok(None)` if the file doesn't exist, `Err` if it exists but can't be parsed.
    pub fn load_default() -> Result<Option<Self>> {
        let default_path = Path::new(CONFIG_FILE);

        if default_path.exists() {
            Ok(Some(Self::load(default_path)?))
        } else {
            Ok(None)
        }
    }

    /// Merge this configuration with CLI arguments.
    ///
    /// CLI arguments take precedence over config file settings, but only
    /// when they were actually given.
    pub fn merge_with_args(&mut self, args: &crate::cli::Args) {
        if let Some(ref dir) = args.output_dir {
            self.general.output_dir = dir.clone();
        }
        if let Some(ref url) = args.source_url {
            self.source.base_url = url.clone();
        }
        if let Some(ref model) = args.model {
            self.model.name = model.clone();
        }
        if args.verbose {
            self.general.verbose = true;
        }
    }

    /// Generate a default configuration file content.
    pub fn default_toml() -> String {
        let config = Config::default();
        toml::to_string_pretty(&config).unwrap_or_else(|_| String::new())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::Parser;

    #[test]
    fn test_default_config() {
        let config = Config::default();
        assert_eq!(config.model.name, "claude-3-7-sonnet-20250219");
        assert_eq!(config.model.max_tokens, 20000);
        assert_eq!(config.model.thinking_budget, 16000);
        assert_eq!(config.general.output_dir, PathBuf::from("output"));
        assert_eq!(config.general.log_dir, PathBuf::from("."));
        assert!(config.source.base_url.ends_with("/employment_workers"));
    }

    #[test]
    fn test_parse_config() {
        let toml_content = r#"
[general]
output_dir = "reports"
verbose = true

[source]
base_url = "http://localhost:8000/api"
timeout_seconds = 30

[model]
thinking_budget = 8000
"#;

        let config: Config = toml::from_str(toml_content).unwrap();
        assert_eq!(config.general.output_dir, PathBuf::from("reports"));
        assert_eq!(config.general.log_dir, PathBuf::from("."));
        assert!(config.general.verbose);
        assert_eq!(config.source.base_url, "http://localhost:8000/api");
        assert_eq!(config.source.timeout_seconds, Some(30));
        assert_eq!(config.model.thinking_budget, 8000);
        assert_eq!(config.model.max_tokens, 20000);
        assert_eq!(config.model.api_key_env, "ANTHROPIC_API_KEY");
    }

    #[test]
    fn test_load_from_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join(CONFIG_FILE);
        std::fs::write(&path, "[model]\nname = \"custom-model\"\n").unwrap();

        let config = Config::load(&path).unwrap();
        assert_eq!(config.model.name, "custom-model");

        std::fs::write(&path, "[model\n").unwrap();
        assert!(Config::load(&path).is_err());
    }

    #[test]
    fn test_merge_with_args_only_overrides_given_flags() {
        let mut config = Config::default();
        config.source.base_url = "http://from-file".to_string();

        let args = crate::cli::Args::try_parse_from([
            "nregs-analyst",
            "--model",
            "other-model",
            "--output-dir",
            "elsewhere",
            "zero-muster",
            "--district",
            "Dhar",
        ])
        .unwrap();
        config.merge_with_args(&args);

        assert_eq!(config.model.name, "other-model");
        assert_eq!(config.general.output_dir, PathBuf::from("elsewhere"));
        assert_eq!(config.source.base_url, "http://from-file");
    }

    #[test]
    fn test_default_toml_generation() {
        let toml_str = Config::default_toml();
        assert!(!toml_str.is_empty());
        assert!(toml_str.contains("[general]"));
        assert!(toml_str.contains("[source]"));
        assert!(toml_str.contains("[model]"));
    }
}
