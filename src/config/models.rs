use serde::{Deserialize, Serialize};

use super::constants::{GEMINI_API_KEY_ENV, GEMINI_ENDPOINT, OPENAI_API_KEY_ENV, OPENAI_ENDPOINT};
use super::defaults::*;

#[derive(Deserialize, Serialize, Debug, Clone, Default)]
pub struct Configuration {
    #[serde(default)]
    pub server: ServerConfig,

    #[serde(default)]
    pub log: LogConfig,

    #[serde(default)]
    pub provider: ProviderConfig,

    #[serde(default)]
    pub storage: StorageConfig,
}

#[derive(Deserialize, Serialize, Debug, Clone)]
pub struct ServerConfig {
    #[serde(default = "listen_addr")]
    pub listen: String,

    #[serde(default = "cors_origins")]
    pub cors_origins: Vec<String>,
}

#[derive(Deserialize, Serialize, Debug, Clone)]
pub struct LogConfig {
    #[serde(default = "log_level")]
    pub level: Option<String>,

    #[serde(default)]
    pub filters: Option<Vec<LogFilter>>,

    /// Log to stderr when unset
    #[serde(default)]
    pub file: Option<LogFile>,
}

#[derive(Deserialize, Serialize, Debug, Clone)]
pub struct LogFilter {
    #[serde(default)]
    pub module: Option<String>,

    #[serde(default)]
    pub level: Option<String>,
}

#[derive(Deserialize, Serialize, Debug, Clone)]
pub struct LogFile {
    pub path: String,

    #[serde(default)]
    pub append: bool,
}

#[derive(Deserialize, Serialize, Debug, Clone)]
pub struct ProviderConfig {
    /// A model whose lowercase name contains one of these routes to Gemini
    #[serde(default = "gemini_models")]
    pub gemini_models: Vec<String>,

    #[serde(default)]
    pub timeout_secs: Option<u16>,

    #[serde(default)]
    pub openai: ProviderConnection,

    #[serde(default)]
    pub gemini: ProviderConnection,
}

#[derive(Deserialize, Serialize, Debug, Clone, Default)]
pub struct ProviderConnection {
    #[serde(default)]
    pub endpoint: Option<String>,

    #[serde(default)]
    pub api_key: Option<String>,
}

#[derive(Deserialize, Serialize, Debug, Clone)]
pub enum StorageConfig {
    #[serde(rename = "sqlite")]
    Sqlite(SqliteStorage),
}

#[derive(Deserialize, Serialize, Debug, Clone, Default)]
pub struct SqliteStorage {
    pub path: Option<String>,
}

impl Configuration {
    /// Fills in API keys missing (or empty) in the file with values from `lookup`,
    /// normally `std::env::var`.
    pub fn with_env<F>(mut self, lookup: F) -> Self
    where
        F: Fn(&str) -> Option<String>,
    {
        if self.provider.openai.api_key().is_none() {
            self.provider.openai.api_key = lookup(OPENAI_API_KEY_ENV).filter(|v| !v.is_empty());
        }
        if self.provider.gemini.api_key().is_none() {
            self.provider.gemini.api_key = lookup(GEMINI_API_KEY_ENV).filter(|v| !v.is_empty());
        }
        self
    }
}

impl ProviderConfig {
    pub fn openai_endpoint(&self) -> &str {
        self.openai.endpoint.as_deref().unwrap_or(OPENAI_ENDPOINT)
    }

    pub fn gemini_endpoint(&self) -> &str {
        self.gemini.endpoint.as_deref().unwrap_or(GEMINI_ENDPOINT)
    }

    pub fn timeout(&self) -> Option<std::time::Duration> {
        self.timeout_secs
            .map(|secs| std::time::Duration::from_secs(secs as u64))
    }
}

impl ProviderConnection {
    /// The configured key, with an empty one counting as unset.
    pub fn api_key(&self) -> Option<&str> {
        self.api_key.as_deref().filter(|key| !key.is_empty())
    }
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            listen: listen_addr(),
            cors_origins: cors_origins(),
        }
    }
}

impl Default for LogConfig {
    fn default() -> Self {
        Self {
            level: log_level(),
            filters: None,
            file: None,
        }
    }
}

impl Default for ProviderConfig {
    fn default() -> Self {
        Self {
            gemini_models: gemini_models(),
            timeout_secs: None,
            openai: ProviderConnection::default(),
            gemini: ProviderConnection::default(),
        }
    }
}

impl Default for StorageConfig {
    fn default() -> Self {
        Self::Sqlite(SqliteStorage::default())
    }
}

impl SqliteStorage {
    pub fn path(&self) -> Option<&str> {
        self.path.as_deref()
    }
}
