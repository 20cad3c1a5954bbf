//! Logger configuration loaded from TOML with environment overrides.
//!
//! ```toml
//! threshold = "DIAG"
//!
//! [[rules]]
//! name = "EMAIL"
//!
//! [[rules]]
//! name = "SSN"
//! pattern = '\b\d{3}-\d{2}-\d{4}\b'
//! ```
//!
//! A rule without `pattern` refers to one of the built-in rules (`EMAIL`,
//! `PHONE`, `GPS`). Leaving `rules` out entirely selects all built-in rules.

use std::path::Path;

use serde::Deserialize;

use crate::error::ConfigError;
use crate::{AuditLevel, RedactionRule};

/// Environment variable that overrides the configured threshold.
pub const THRESHOLD_ENV: &str = "CONSENT_LOG_THRESHOLD";

/// Construction options for a [`Logger`](crate::Logger).
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct LoggerConfig {
    /// Most verbose level that is emitted.
    #[serde(default)]
    pub threshold: AuditLevel,

    /// Redaction rules in evaluation order; `None` means the built-in set.
    #[serde(default)]
    pub rules: Option<Vec<RuleConfig>>,
}

/// One configured redaction rule.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct RuleConfig {
    /// Rule name; also determines the placeholder.
    pub name: String,

    /// Regular expression; omit to use the built-in rule of the same name.
    #[serde(default)]
    pub pattern: Option<String>,
}

impl RuleConfig {
    fn compile(&self) -> Result<RedactionRule, ConfigError> {
        match (&self.pattern, self.name.as_str()) {
            (Some(pattern), _) => RedactionRule::new(self.name.clone(), pattern),
            (None, "EMAIL") => RedactionRule::email(),
            (None, "PHONE") => RedactionRule::phone(),
            (None, "GPS") => RedactionRule::gps(),
            (None, _) => Err(ConfigError::InvalidRuleName(self.name.clone())),
        }
    }
}

impl LoggerConfig {
    /// Parses configuration from TOML text.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::Parse`] if the text does not match the schema.
    pub fn from_toml(content: &str) -> Result<Self, ConfigError> {
        Ok(toml::from_str(content)?)
    }

    /// Compiles the configured rules, or the built-in set if none are listed.
    pub fn compile_rules(&self) -> Result<Vec<RedactionRule>, ConfigError> {
        match &self.rules {
            Some(rules) => rules.iter().map(RuleConfig::compile).collect(),
            None => RedactionRule::defaults(),
        }
    }

    /// Applies `CONSENT_LOG_THRESHOLD` if it is set.
    pub fn apply_env_overrides(&mut self) -> Result<(), ConfigError> {
        if let Ok(value) = std::env::var(THRESHOLD_ENV) {
            self.threshold = value.parse()?;
            tracing::debug!(threshold = %self.threshold, "threshold overridden from environment");
        }
        Ok(())
    }
}

/// Loads configuration from a TOML file and applies environment overrides.
///
/// The returned rules are compiled once here so that pattern errors surface
/// at load time rather than when the logger is built.
///
/// # Errors
///
/// Returns an error if the file cannot be read, does not parse, names an
/// unknown level, or contains an invalid rule.
///
/// # Examples
///
/// ```no_run
/// use consent_log::load_config;
///
/// let config = load_config("consent-log.toml").expect("valid configuration");
/// ```
pub fn load_config(path: impl AsRef<Path>) -> Result<LoggerConfig, ConfigError> {
    let path = path.as_ref();
    let content = std::fs::read_to_string(path).map_err(|source| ConfigError::Io {
        path: path.to_path_buf(),
        source,
    })?;

    let mut config = LoggerConfig::from_toml(&content)?;
    config.apply_env_overrides()?;
    config.compile_rules()?;

    tracing::debug!(
        path = %path.display(),
        threshold = %config.threshold,
        "loaded logger configuration"
    );
    Ok(config)
}
