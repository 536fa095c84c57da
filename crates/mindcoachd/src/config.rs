//! Configuration management for mindcoachd.
//!
//! Loads settings from `$MINDCOACH_CONFIG`, then /etc/mindcoach/config.toml,
//! then falls back to defaults. A handful of environment variables override
//! the file so deployments can inject secrets without writing them to disk.

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::env;
use std::fs;
use std::path::{Path, PathBuf};
use tracing::{info, warn};

/// Config file path
pub const CONFIG_PATH: &str = "/etc/mindcoach/config.toml";

/// Environment variable naming an explicit config file
pub const CONFIG_ENV: &str = "MINDCOACH_CONFIG";

/// HTTP server configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServerConfig {
    #[serde(default = "default_bind_addr")]
    pub bind_addr: String,

    /// Frontend origins allowed by CORS
    #[serde(default = "default_cors_origins")]
    pub cors_origins: Vec<String>,

    /// Largest accepted request body (paintings are base64 images)
    #[serde(default = "default_max_body_bytes")]
    pub max_body_bytes: usize,

    /// Key anonymous rate limits on X-Forwarded-For; only behind a trusted proxy
    #[serde(default)]
    pub trust_forwarded_for: bool,
}

fn default_bind_addr() -> String {
    "127.0.0.1:8000".to_string()
}

fn default_cors_origins() -> Vec<String> {
    vec![
        "http://localhost:8080".to_string(),
        "http://localhost:8081".to_string(),
        "http://localhost:8082".to_string(),
        "http://localhost:3000".to_string(),
    ]
}

fn default_max_body_bytes() -> usize {
    8 * 1024 * 1024
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            bind_addr: default_bind_addr(),
            cors_origins: default_cors_origins(),
            max_body_bytes: default_max_body_bytes(),
            trust_forwarded_for: false,
        }
    }
}

/// Database configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DatabaseConfig {
    #[serde(default = "default_db_path")]
    pub path: PathBuf,
}

fn default_db_path() -> PathBuf {
    dirs::data_local_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join("mindcoach")
        .join("mindcoach.db")
}

impl Default for DatabaseConfig {
    fn default() -> Self {
        Self {
            path: default_db_path(),
        }
    }
}

/// LLM provider configuration (OpenAI-compatible endpoint)
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LlmConfig {
    /// No key means every AI call takes the fallback path
    #[serde(default)]
    pub api_key: Option<String>,

    #[serde(default = "default_base_url")]
    pub base_url: String,

    #[serde(default = "default_model")]
    pub model: String,

    /// Upstream call timeout in seconds
    #[serde(default = "default_timeout")]
    pub timeout_secs: u64,

    #[serde(default = "default_temperature")]
    pub temperature: f32,
}

fn default_base_url() -> String {
    "https://dashscope.aliyuncs.com/compatible-mode/v1".to_string()
}

fn default_model() -> String {
    "qwen-plus".to_string()
}

fn default_timeout() -> u64 {
    30
}

fn default_temperature() -> f32 {
    0.7
}

impl Default for LlmConfig {
    fn default() -> Self {
        Self {
            api_key: None,
            base_url: default_base_url(),
            model: default_model(),
            timeout_secs: default_timeout(),
            temperature: default_temperature(),
        }
    }
}

impl LlmConfig {
    pub fn is_configured(&self) -> bool {
        self.api_key
            .as_deref()
            .map(|k| !k.trim().is_empty())
            .unwrap_or(false)
    }
}

/// Session configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AuthConfig {
    #[serde(default = "default_token_ttl")]
    pub token_ttl_minutes: i64,
}

fn default_token_ttl() -> i64 {
    30
}

impl Default for AuthConfig {
    fn default() -> Self {
        Self {
            token_ttl_minutes: default_token_ttl(),
        }
    }
}

/// Main configuration
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub server: ServerConfig,

    #[serde(default)]
    pub database: DatabaseConfig,

    #[serde(default)]
    pub llm: LlmConfig,

    #[serde(default)]
    pub auth: AuthConfig,
}

impl Config {
    /// Load config from the environment-named file, the system file, or defaults.
    ///
    /// An explicitly named file that is missing or malformed is an error; the
    /// system file is optional.
    pub fn load() -> Result<Self> {
        let mut config = match env::var(CONFIG_ENV) {
            Ok(path) => Self::load_from_path(Path::new(&path))?,
            Err(_) if Path::new(CONFIG_PATH).exists() => {
                Self::load_from_path(Path::new(CONFIG_PATH))?
            }
            Err(_) => {
                warn!("Config not found, using defaults");
                Config::default()
            }
        };
        config.apply_env_overrides(|key| env::var(key).ok());
        Ok(config)
    }

    /// Load config from specific path
    pub fn load_from_path(path: &Path) -> Result<Self> {
        let content = fs::read_to_string(path)
            .with_context(|| format!("Failed to read config: {}", path.display()))?;
        let config: Config = toml::from_str(&content)
            .with_context(|| format!("Invalid config: {}", path.display()))?;
        info!("Loaded config from {}", path.display());
        Ok(config)
    }

    /// Apply environment overrides through `lookup`.
    pub fn apply_env_overrides<F>(&mut self, lookup: F)
    where
        F: Fn(&str) -> Option<String>,
    {
        if let Some(key) = lookup("OPENAI_API_KEY").filter(|k| !k.is_empty()) {
            self.llm.api_key = Some(key);
        }
        if let Some(base) = lookup("OPENAI_API_BASE").filter(|b| !b.is_empty()) {
            self.llm.base_url = base;
        }
        if let Some(bind) = lookup("MINDCOACH_BIND").filter(|b| !b.is_empty()) {
            self.server.bind_addr = bind;
        }
        if let Some(db) = lookup("MINDCOACH_DB").filter(|d| !d.is_empty()) {
            self.database.path = PathBuf::from(db);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    #[test]
    fn test_default_config() {
        let config = Config::default();
        assert_eq!(config.server.bind_addr, "127.0.0.1:8000");
        assert_eq!(config.llm.model, "qwen-plus");
        assert_eq!(config.llm.timeout_secs, 30);
        assert_eq!(config.auth.token_ttl_minutes, 30);
        assert!(!config.llm.is_configured());
    }

    #[test]
    fn test_partial_config() {
        let toml_str = r#"
[llm]
model = "qwen-max"
timeout_secs = 10
"#;
        let config: Config = toml::from_str(toml_str).unwrap();
        assert_eq!(config.llm.model, "qwen-max");
        assert_eq!(config.llm.timeout_secs, 10);
        assert_eq!(config.llm.base_url, default_base_url());
        assert_eq!(config.server.cors_origins.len(), 4);
        assert!(!config.server.trust_forwarded_for);
    }

    #[test]
    fn test_env_overrides() {
        let env: HashMap<&str, &str> = [
            ("OPENAI_API_KEY", "sk-test"),
            ("MINDCOACH_BIND", "0.0.0.0:9000"),
            ("OPENAI_API_BASE", ""),
        ]
        .into_iter()
        .collect();

        let mut config = Config::default();
        config.apply_env_overrides(|k| env.get(k).map(|v| v.to_string()));

        assert!(config.llm.is_configured());
        assert_eq!(config.server.bind_addr, "0.0.0.0:9000");
        assert_eq!(config.llm.base_url, default_base_url());
    }

    #[test]
    fn test_blank_api_key_is_not_configured() {
        let mut config = Config::default();
        config.llm.api_key = Some("   ".to_string());
        assert!(!config.llm.is_configured());
    }

    #[test]
    fn test_load_from_path() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.toml");
        fs::write(&path, "[auth]\ntoken_ttl_minutes = 5\n").unwrap();

        let config = Config::load_from_path(&path).unwrap();
        assert_eq!(config.auth.token_ttl_minutes, 5);

        fs::write(&path, "[auth\n").unwrap();
        assert!(Config::load_from_path(&path).is_err());
    }
}
