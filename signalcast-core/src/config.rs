//! Run configuration.
//!
//! Loaded from a TOML file where every section and field is optional:
//!
//! ```toml
//! [pipeline]
//! symbols = ["BTC/USDT", "ETH/USDT"]
//! timeframe = "4h"
//! limit = 100
//! schema = "directional"     # or "scored"
//! long_threshold = 75        # scored schema only
//!
//! [provider]
//! kind = "binance"           # or "csv" with `csv_path`
//!
//! [oracle]
//! kind = "gemini"            # or "replay" with `replay_path`
//! model = "gemini-2.5-flash"
//! max_retries = 1
//!
//! [notify]
//! kind = "pushplus"          # or "log"
//! ```
//!
//! Secrets never live in the file; they come from the environment via
//! [`Secrets::from_env`] and are passed alongside the config.

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::Duration;
use thiserror::Error;

use crate::data::binance;
use crate::decision::DecisionSchema;
use crate::notify::pushplus;
use crate::oracle::{gemini, RetryPolicy};

pub const GEMINI_API_KEY_VAR: &str = "GEMINI_API_KEY";
pub const PUSHPLUS_TOKEN_VAR: &str = "PUSHPLUS_TOKEN";

pub const DEFAULT_FOOTER: &str =
    "Generated by an AI model for reference only. Not investment advice.";

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read config {path}: {message}")]
    Read { path: PathBuf, message: String },

    #[error("failed to parse config: {0}")]
    Parse(String),

    #[error("invalid config: {0}")]
    Invalid(String),

    #[error("missing secret: set {0}")]
    MissingSecret(&'static str),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SchemaKind {
    #[default]
    Directional,
    Scored,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ProviderKind {
    #[default]
    Binance,
    Csv,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum OracleKind {
    #[default]
    Gemini,
    Replay,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum NotifyKind {
    #[default]
    Pushplus,
    Log,
}

/// `[pipeline]`
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RunSettings {
    pub symbols: Vec<String>,
    pub timeframe: String,
    /// Number of bars requested per symbol.
    pub limit: usize,
    pub schema: SchemaKind,
    /// Scored schema: minimum confidence that maps to LONG.
    pub long_threshold: u8,
    /// Appended to the notification body; `None` or blank omits it.
    pub footer: Option<String>,
}

impl Default for RunSettings {
    fn default() -> Self {
        Self {
            symbols: vec!["BTC/USDT".to_string()],
            timeframe: "4h".to_string(),
            limit: 100,
            schema: SchemaKind::Directional,
            long_threshold: 75,
            footer: Some(DEFAULT_FOOTER.to_string()),
        }
    }
}

/// `[provider]`
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ProviderSettings {
    pub kind: ProviderKind,
    pub base_url: String,
    pub timeout_secs: u64,
    pub csv_path: Option<PathBuf>,
}

impl Default for ProviderSettings {
    fn default() -> Self {
        Self {
            kind: ProviderKind::Binance,
            base_url: binance::DEFAULT_BASE_URL.to_string(),
            timeout_secs: 15,
            csv_path: None,
        }
    }
}

/// `[oracle]`
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct OracleSettings {
    pub kind: OracleKind,
    pub model: String,
    pub base_url: String,
    pub timeout_secs: u64,
    pub max_retries: u32,
    pub retry_delay_ms: u64,
    pub replay_path: Option<PathBuf>,
}

impl Default for OracleSettings {
    fn default() -> Self {
        Self {
            kind: OracleKind::Gemini,
            model: gemini::DEFAULT_MODEL.to_string(),
            base_url: gemini::DEFAULT_BASE_URL.to_string(),
            timeout_secs: 60,
            max_retries: 1,
            retry_delay_ms: 2_000,
            replay_path: None,
        }
    }
}

/// `[notify]`
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct NotifySettings {
    pub kind: NotifyKind,
    pub endpoint: String,
    pub timeout_secs: u64,
}

impl Default for NotifySettings {
    fn default() -> Self {
        Self {
            kind: NotifyKind::Pushplus,
            endpoint: pushplus::DEFAULT_ENDPOINT.to_string(),
            timeout_secs: 15,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct PipelineConfig {
    pub pipeline: RunSettings,
    pub provider: ProviderSettings,
    pub oracle: OracleSettings,
    pub notify: NotifySettings,
}

impl PipelineConfig {
    /// Load from a TOML file. A missing file yields the defaults.
    pub fn from_file(path: &Path) -> Result<Self, ConfigError> {
        if !path.exists() {
            return Ok(Self::default());
        }
        let content = std::fs::read_to_string(path).map_err(|e| ConfigError::Read {
            path: path.to_path_buf(),
            message: e.to_string(),
        })?;
        Self::from_toml(&content)
    }

    /// Parse and validate a TOML string.
    pub fn from_toml(content: &str) -> Result<Self, ConfigError> {
        let config: Self = toml::from_str(content).map_err(|e| ConfigError::Parse(e.to_string()))?;
        config.validate()?;
        Ok(config)
    }

    pub fn to_toml(&self) -> Result<String, ConfigError> {
        toml::to_string_pretty(self).map_err(|e| ConfigError::Parse(e.to_string()))
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        let p = &self.pipeline;
        if p.symbols.is_empty() {
            return Err(ConfigError::Invalid("pipeline.symbols is empty".into()));
        }
        if let Some(s) = p.symbols.iter().find(|s| s.trim().is_empty()) {
            return Err(ConfigError::Invalid(format!("blank symbol {s:?}")));
        }
        if p.limit == 0 {
            return Err(ConfigError::Invalid("pipeline.limit must be positive".into()));
        }
        if p.timeframe.trim().is_empty() {
            return Err(ConfigError::Invalid("pipeline.timeframe is empty".into()));
        }
        if !(1..=100).contains(&p.long_threshold) {
            return Err(ConfigError::Invalid(format!(
                "pipeline.long_threshold {} must be within 1..=100",
                p.long_threshold
            )));
        }
        if self.oracle.max_retries > 1 {
            return Err(ConfigError::Invalid(format!(
                "oracle.max_retries {} exceeds the single permitted retry",
                self.oracle.max_retries
            )));
        }
        if self.provider.kind == ProviderKind::Csv && self.provider.csv_path.is_none() {
            return Err(ConfigError::Invalid(
                "provider.kind = \"csv\" requires provider.csv_path".into(),
            ));
        }
        if self.oracle.kind == OracleKind::Replay && self.oracle.replay_path.is_none() {
            return Err(ConfigError::Invalid(
                "oracle.kind = \"replay\" requires oracle.replay_path".into(),
            ));
        }
        for (name, secs) in [
            ("provider.timeout_secs", self.provider.timeout_secs),
            ("oracle.timeout_secs", self.oracle.timeout_secs),
            ("notify.timeout_secs", self.notify.timeout_secs),
        ] {
            if secs == 0 {
                return Err(ConfigError::Invalid(format!("{name} must be positive")));
            }
        }
        Ok(())
    }

    pub fn schema(&self) -> DecisionSchema {
        match self.pipeline.schema {
            SchemaKind::Directional => DecisionSchema::Directional,
            SchemaKind::Scored => DecisionSchema::Scored {
                long_threshold: self.pipeline.long_threshold,
            },
        }
    }

    pub fn retry_policy(&self) -> RetryPolicy {
        RetryPolicy {
            max_retries: self.oracle.max_retries,
            delay: Duration::from_millis(self.oracle.retry_delay_ms),
        }
    }

    pub fn footer(&self) -> Option<&str> {
        self.pipeline.footer.as_deref()
    }
}

/// Credentials read once at startup.
#[derive(Clone, Default)]
pub struct Secrets {
    pub gemini_api_key: Option<String>,
    pub pushplus_token: Option<String>,
}

impl Secrets {
    pub fn from_env() -> Self {
        let read = |var: &str| {
            std::env::var(var)
                .ok()
                .map(|v| v.trim().to_string())
                .filter(|v| !v.is_empty())
        };
        Self {
            gemini_api_key: read(GEMINI_API_KEY_VAR),
            pushplus_token: read(PUSHPLUS_TOKEN_VAR),
        }
    }

    pub fn require_gemini_key(&self) -> Result<&str, ConfigError> {
        self.gemini_api_key
            .as_deref()
            .ok_or(ConfigError::MissingSecret(GEMINI_API_KEY_VAR))
    }
}

// Keep secrets out of logs.
impl std::fmt::Debug for Secrets {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let mask = |s: &Option<String>| s.as_ref().map(|_| "***");
        f.debug_struct("Secrets")
            .field("gemini_api_key", &mask(&self.gemini_api_key))
            .field("pushplus_token", &mask(&self.pushplus_token))
            .finish()
    }
}
