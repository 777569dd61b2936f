use crate::core::LLMError;
use serde::Deserialize;
use std::fs;
use std::path::Path;
use std::time::Duration;

const DEFAULT_CONFIG: &str = include_str!("../../config.toml");
const CONFIG_FILE: &str = "config.toml";
const BASE_URL_ENV: &str = "ASSISTANT_BASE_URL";

#[derive(Debug, Deserialize, Clone)]
pub struct Config {
    /// Root of the assistant server, e.g. `http://localhost:8000`
    pub base_url: String,
    /// Path of the streaming chat endpoint
    pub stream_path: String,
    /// Path of the non-streaming chat endpoint
    pub message_path: String,
    #[serde(default)]
    pub research_mode: bool,
    /// Tools to offer the assistant; every tool when unset
    #[serde(default)]
    pub enabled_tools: Option<Vec<String>>,
    #[serde(default = "default_connect_timeout")]
    pub connect_timeout_secs: u64,
    #[serde(default = "default_true")]
    pub show_thinking: bool,
    #[serde(default = "default_true")]
    pub show_tools: bool,
}

const fn default_connect_timeout() -> u64 {
    30
}

const fn default_true() -> bool {
    true
}

impl Default for Config {
    fn default() -> Self {
        toml::from_str(DEFAULT_CONFIG).expect("Invalid default config")
    }
}

impl Config {
    /// Loads `config.toml` from the working directory, or the built-in
    /// defaults when there is none, then applies environment overrides.
    pub fn load() -> Result<Self, LLMError> {
        let config_path = Path::new(CONFIG_FILE);
        let mut config = if config_path.exists() {
            Self::from_path(config_path)?
        } else {
            Self::default()
        };
        if let Ok(base_url) = dotenv::var(BASE_URL_ENV) {
            config.base_url = base_url;
        }
        Ok(config)
    }

    pub fn from_path(path: &Path) -> Result<Self, LLMError> {
        let contents = fs::read_to_string(path)
            .map_err(|e| LLMError::ConfigError(format!("Failed to read config file: {e}")))?;

        toml::from_str(&contents)
            .map_err(|e| LLMError::ConfigError(format!("Failed to parse config file: {e}")))
    }

    pub fn stream_url(&self) -> String {
        join_url(&self.base_url, &self.stream_path)
    }

    pub fn message_url(&self) -> String {
        join_url(&self.base_url, &self.message_path)
    }

    pub const fn connect_timeout(&self) -> Duration {
        Duration::from_secs(self.connect_timeout_secs)
    }
}

fn join_url(base: &str, path: &str) -> String {
    format!(
        "{base}/{path}",
        base = base.trim_end_matches('/'),
        path = path.trim_start_matches('/')
    )
}
