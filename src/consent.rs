use std::collections::HashMap;
use std::fmt;
use std::path::Path;

use serde::Deserialize;
use thiserror::Error;

use crate::error::{ConfigError, ConsentError};

/// Value stored by a consent authority for one subject.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ConsentRecord {
    /// The subject allows their data to be logged.
    Granted,
    /// The subject refused.
    Denied,
    /// The authority holds an explicit error-state marker for the subject.
    Error,
}

impl ConsentRecord {
    fn parse(subject: &str, value: &str) -> Result<Self, ConfigError> {
        match value.trim().to_ascii_lowercase().as_str() {
            "granted" | "true" => Ok(ConsentRecord::Granted),
            "denied" | "false" => Ok(ConsentRecord::Denied),
            "error" => Ok(ConsentRecord::Error),
            _ => Err(ConfigError::InvalidConsentValue {
                subject: subject.to_string(),
                value: value.to_string(),
            }),
        }
    }
}

/// Outcome of a consent check, produced fresh on every call.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ConsentStatus {
    /// Logging may proceed.
    Granted,
    /// Logging must not proceed; the subject refused or is in an error state.
    Denied(String),
    /// Logging must not proceed; no usable answer was available.
    Unknown(String),
}

impl ConsentStatus {
    /// Returns `true` only for [`ConsentStatus::Granted`].
    pub fn is_granted(&self) -> bool {
        matches!(self, ConsentStatus::Granted)
    }

    /// Returns the notice text for a failed check, or `None` when granted.
    pub fn failure_reason(&self) -> Option<&str> {
        match self {
            ConsentStatus::Granted => None,
            ConsentStatus::Denied(reason) | ConsentStatus::Unknown(reason) => Some(reason),
        }
    }
}

/// Error reported by a consent authority that could not answer.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("consent authority unavailable: {0}")]
pub struct LookupError(String);

impl LookupError {
    /// Creates a lookup error with a description of the outage.
    pub fn new(message: impl Into<String>) -> Self {
        Self(message.into())
    }
}

/// Source of truth for consent records.
///
/// `Ok(None)` means the authority has no record for the subject;
/// `Err(_)` means it could not be asked. Both end up as
/// [`ConsentStatus::Unknown`].
///
/// Implementations are shared across threads by the logger and must be safe
/// for concurrent queries.
pub trait ConsentLookup: Send + Sync {
    /// Looks up the stored consent value for `subject_id`.
    fn lookup(&self, subject_id: &str) -> Result<Option<ConsentRecord>, LookupError>;
}

impl<L: ConsentLookup + ?Sized> ConsentLookup for &L {
    fn lookup(&self, subject_id: &str) -> Result<Option<ConsentRecord>, LookupError> {
        (**self).lookup(subject_id)
    }
}

impl<L: ConsentLookup + ?Sized> ConsentLookup for std::sync::Arc<L> {
    fn lookup(&self, subject_id: &str) -> Result<Option<ConsentRecord>, LookupError> {
        (**self).lookup(subject_id)
    }
}

/// In-memory consent authority backed by a fixed map.
///
/// # Examples
///
/// ```
/// use consent_log::{ConsentLookup, ConsentRecord, StaticConsentTable};
///
/// let table = StaticConsentTable::new()
///     .grant("alice")
///     .deny("bob")
///     .mark_error("carol");
///
/// assert_eq!(table.lookup("alice").unwrap(), Some(ConsentRecord::Granted));
/// assert_eq!(table.lookup("dave").unwrap(), None);
/// ```
#[derive(Debug, Clone, Default)]
pub struct StaticConsentTable {
    records: HashMap<String, ConsentRecord>,
}

#[derive(Debug, Deserialize)]
struct ConsentTableFile {
    #[serde(default)]
    consent: HashMap<String, ConsentValue>,
}

/// A table entry as written: `alice = true` or `alice = "granted"`.
#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum ConsentValue {
    Flag(bool),
    Text(String),
}

impl StaticConsentTable {
    /// Creates an empty table; every subject is unknown.
    pub fn new() -> Self {
        Self::default()
    }

    /// Records a grant for `subject_id`.
    pub fn grant(self, subject_id: impl Into<String>) -> Self {
        self.with(subject_id, ConsentRecord::Granted)
    }

    /// Records a refusal for `subject_id`.
    pub fn deny(self, subject_id: impl Into<String>) -> Self {
        self.with(subject_id, ConsentRecord::Denied)
    }

    /// Records an error-state marker for `subject_id`.
    pub fn mark_error(self, subject_id: impl Into<String>) -> Self {
        self.with(subject_id, ConsentRecord::Error)
    }

    /// Records an arbitrary value for `subject_id`, replacing any previous one.
    pub fn with(mut self, subject_id: impl Into<String>, record: ConsentRecord) -> Self {
        self.records.insert(subject_id.into(), record);
        self
    }

    /// Number of subjects with a record.
    pub fn len(&self) -> usize {
        self.records.len()
    }

    /// Returns `true` if no subject has a record.
    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    /// Parses a table from TOML.
    ///
    /// ```toml
    /// [consent]
    /// alice = "granted"
    /// bob = "denied"
    /// carol = "error"
    /// dave = true
    /// ```
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::Parse`] for malformed TOML and
    /// [`ConfigError::InvalidConsentValue`] for unrecognised values.
    pub fn from_toml(content: &str) -> Result<Self, ConfigError> {
        let file: ConsentTableFile = toml::from_str(content)?;
        file.consent
            .into_iter()
            .try_fold(Self::new(), |table, (subject, value)| {
                let record = match value {
                    ConsentValue::Flag(true) => ConsentRecord::Granted,
                    ConsentValue::Flag(false) => ConsentRecord::Denied,
                    ConsentValue::Text(text) => ConsentRecord::parse(&subject, &text)?,
                };
                Ok(table.with(subject, record))
            })
    }

    /// Reads and parses a TOML table from `path`.
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        let content = std::fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        Self::from_toml(&content)
    }
}

impl FromIterator<(String, ConsentRecord)> for StaticConsentTable {
    fn from_iter<I: IntoIterator<Item = (String, ConsentRecord)>>(iter: I) -> Self {
        Self {
            records: iter.into_iter().collect(),
        }
    }
}

impl ConsentLookup for StaticConsentTable {
    fn lookup(&self, subject_id: &str) -> Result<Option<ConsentRecord>, LookupError> {
        Ok(self.records.get(subject_id).copied())
    }
}

/// Classifies consent-authority answers into a fail-closed [`ConsentStatus`].
///
/// | Authority answer        | Status    |
/// |-------------------------|-----------|
/// | `Granted`               | `Granted` |
/// | `Denied` or `Error`     | `Denied`  |
/// | absent or unavailable   | `Unknown` |
///
/// # Examples
///
/// ```
/// use consent_log::{ConsentGate, ConsentStatus, StaticConsentTable};
///
/// let gate = ConsentGate::new(StaticConsentTable::new().grant("alice"));
///
/// assert_eq!(gate.check_consent("alice"), ConsentStatus::Granted);
/// assert!(matches!(gate.check_consent("zed"), ConsentStatus::Unknown(_)));
/// ```
pub struct ConsentGate<L> {
    lookup: L,
}

impl<L> ConsentGate<L> {
    /// Wraps a consent authority.
    pub fn new(lookup: L) -> Self {
        Self { lookup }
    }

    /// Returns the wrapped authority.
    pub fn lookup(&self) -> &L {
        &self.lookup
    }
}

impl<L: ConsentLookup> ConsentGate<L> {
    /// Queries the authority and classifies the answer.
    pub fn check_consent(&self, subject_id: &str) -> ConsentStatus {
        classify(subject_id, self.lookup.lookup(subject_id))
    }

    /// Like [`check_consent`](Self::check_consent) but as a fallible call.
    ///
    /// # Errors
    ///
    /// Returns [`ConsentError::Denied`] or [`ConsentError::Unknown`] whenever
    /// the status is not granted.
    pub fn require_consent(&self, subject_id: &str) -> Result<(), ConsentError> {
        into_result(subject_id, self.check_consent(subject_id))
    }
}

impl<L> fmt::Debug for ConsentGate<L> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ConsentGate").finish_non_exhaustive()
    }
}

fn unknown_reason(subject_id: &str) -> String {
    format!("Consent status for user '{subject_id}' is unknown.")
}

fn denied_reason(subject_id: &str) -> String {
    format!("Consent denied or in error state for user '{subject_id}'.")
}

/// Maps one authority answer to a status. Shared by the blocking and async paths.
pub(crate) fn classify(
    subject_id: &str,
    answer: Result<Option<ConsentRecord>, LookupError>,
) -> ConsentStatus {
    match answer {
        Ok(Some(ConsentRecord::Granted)) => ConsentStatus::Granted,
        Ok(Some(ConsentRecord::Denied)) => ConsentStatus::Denied(denied_reason(subject_id)),
        Ok(Some(ConsentRecord::Error)) => {
            // Error-state records share the denial text; kept distinct here for operators.
            tracing::debug!(subject_id, "consent record in error state, treating as denied");
            ConsentStatus::Denied(denied_reason(subject_id))
        }
        Ok(None) => ConsentStatus::Unknown(unknown_reason(subject_id)),
        Err(error) => {
            tracing::debug!(subject_id, %error, "consent lookup failed, treating as unknown");
            ConsentStatus::Unknown(unknown_reason(subject_id))
        }
    }
}

fn into_result(subject_id: &str, status: ConsentStatus) -> Result<(), ConsentError> {
    match status {
        ConsentStatus::Granted => Ok(()),
        ConsentStatus::Denied(reason) => Err(ConsentError::Denied {
            subject: subject_id.to_string(),
            reason,
        }),
        ConsentStatus::Unknown(reason) => Err(ConsentError::Unknown {
            subject: subject_id.to_string(),
            reason,
        }),
    }
}
