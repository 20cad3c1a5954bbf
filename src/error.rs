use std::path::PathBuf;

use thiserror::Error;

/// Errors raised while building a logger or loading its configuration.
///
/// These are the only errors the crate propagates. Once a
/// [`Logger`](crate::Logger) exists, log calls never fail.
#[derive(Debug, Error)]
pub enum ConfigError {
    /// A rule name is empty or not of the form `[A-Z][A-Z0-9_]*`.
    #[error("invalid redaction rule name '{0}'")]
    InvalidRuleName(String),

    /// A rule pattern failed to compile.
    #[error("invalid pattern for redaction rule '{name}': {source}")]
    InvalidPattern {
        /// Rule whose pattern was rejected
        name: String,
        /// Underlying regex error
        #[source]
        source: regex::Error,
    },

    /// Two rules share a name, so their placeholders would be indistinguishable.
    #[error("duplicate redaction rule '{0}'")]
    DuplicateRule(String),

    /// A rule's pattern matches a placeholder, which would break idempotence.
    #[error("pattern of rule '{rule}' matches placeholder '{placeholder}'")]
    PlaceholderCollision {
        /// Rule whose pattern matched
        rule: String,
        /// Placeholder text that was matched
        placeholder: String,
    },

    /// An audit level string could not be parsed.
    #[error(transparent)]
    Level(#[from] crate::level::ParseLevelError),

    /// A consent value in a table definition is not recognised.
    #[error("unknown consent value '{value}' for subject '{subject}'")]
    InvalidConsentValue {
        /// Subject the value belongs to
        subject: String,
        /// Offending value
        value: String,
    },

    /// A configuration file could not be read.
    #[error("failed to read configuration file {path}: {source}")]
    Io {
        /// File that was being read
        path: PathBuf,
        /// Underlying I/O error
        #[source]
        source: std::io::Error,
    },

    /// Configuration text is not valid TOML for the expected schema.
    #[error("failed to parse configuration: {0}")]
    Parse(#[from] toml::de::Error),
}

/// Consent failure returned by [`ConsentGate::require_consent`](crate::ConsentGate::require_consent).
///
/// Both variants mean "do not log". The logger turns either one into a
/// `CONSENT_FAILURE` notice instead of returning it.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ConsentError {
    /// The subject has refused consent, or its record is in an error state.
    #[error("{reason}")]
    Denied {
        /// Subject identifier
        subject: String,
        /// Notice text
        reason: String,
    },

    /// No usable consent record could be obtained for the subject.
    #[error("{reason}")]
    Unknown {
        /// Subject identifier
        subject: String,
        /// Notice text
        reason: String,
    },
}

impl ConsentError {
    /// Returns the subject the failure refers to.
    pub fn subject(&self) -> &str {
        match self {
            ConsentError::Denied { subject, .. } | ConsentError::Unknown { subject, .. } => subject,
        }
    }

    /// Returns the notice text.
    pub fn reason(&self) -> &str {
        match self {
            ConsentError::Denied { reason, .. } | ConsentError::Unknown { reason, .. } => reason,
        }
    }
}
