use std::borrow::Cow;
use std::fmt;

use chrono::{DateTime, SecondsFormat, Utc};

use crate::{AuditLevel, Verified};

/// What a record carries after the pipeline has decided its fate.
///
/// There is no variant for raw message text: a record only ever holds
/// redacted text or a consent-failure reason.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Payload {
    /// Message text after redaction.
    Message(Verified<String>),
    /// Consent-failure reason; the original message is not part of it.
    ConsentFailure(String),
}

/// One log line in structured form, alive for the duration of a single call.
///
/// Renders as:
///
/// ```text
/// [<timestamp>] [LEVEL: <NAME>] [USER: <subject>] <payload>
/// ```
///
/// where `<payload>` is the redacted message or
/// `CONSENT_FAILURE: <reason>`. Control characters in the subject id are
/// written as escapes (`\n`, `\u{1b}`), so a subject id cannot start a new
/// line of its own.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LogRecord {
    timestamp: DateTime<Utc>,
    level: AuditLevel,
    subject_id: String,
    payload: Payload,
}

impl LogRecord {
    /// Builds a record for a message that passed every check.
    pub(crate) fn emitted(
        timestamp: DateTime<Utc>,
        level: AuditLevel,
        subject_id: impl Into<String>,
        message: Verified<String>,
    ) -> Self {
        Self {
            timestamp,
            level,
            subject_id: subject_id.into(),
            payload: Payload::Message(message),
        }
    }

    /// Builds a consent-failure record. These always report `MINIMAL`.
    pub(crate) fn consent_failure(
        timestamp: DateTime<Utc>,
        subject_id: impl Into<String>,
        reason: impl Into<String>,
    ) -> Self {
        Self {
            timestamp,
            level: AuditLevel::Minimal,
            subject_id: subject_id.into(),
            payload: Payload::ConsentFailure(reason.into()),
        }
    }

    /// Time the log call was made.
    pub fn timestamp(&self) -> DateTime<Utc> {
        self.timestamp
    }

    /// Level printed on the line.
    pub fn level(&self) -> AuditLevel {
        self.level
    }

    /// Subject the record is about.
    pub fn subject_id(&self) -> &str {
        &self.subject_id
    }

    /// Record payload.
    pub fn payload(&self) -> &Payload {
        &self.payload
    }

    /// Renders the output line handed to sinks.
    pub(crate) fn to_line(&self) -> Verified<String> {
        Verified::new_unchecked(self.to_string())
    }
}

impl fmt::Display for LogRecord {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "[{}] [LEVEL: {}] [USER: {}] ",
            self.timestamp.to_rfc3339_opts(SecondsFormat::Micros, false),
            self.level.name(),
            escape_controls(&self.subject_id),
        )?;
        match &self.payload {
            Payload::Message(message) => f.write_str(message.as_str()),
            // The reason quotes the subject id.
            Payload::ConsentFailure(reason) => {
                write!(f, "CONSENT_FAILURE: {}", escape_controls(reason))
            }
        }
    }
}

fn escape_controls(text: &str) -> Cow<'_, str> {
    if !text.chars().any(char::is_control) {
        return Cow::Borrowed(text);
    }
    let mut escaped = String::with_capacity(text.len() + 8);
    for c in text.chars() {
        if c.is_control() {
            escaped.extend(c.escape_default());
        } else {
            escaped.push(c);
        }
    }
    Cow::Owned(escaped)
}
