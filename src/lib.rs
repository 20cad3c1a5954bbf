//! Consent-gated, PII-redacting logging.
//!
//! This crate sits between application code and a log sink and enforces two
//! policies before any message reaches output:
//! - **Consent**: the subject a message is about must have granted consent;
//!   denied or unknown consent yields a `CONSENT_FAILURE` notice instead of
//!   the message (fail closed)
//! - **Redaction**: recognisable sensitive substrings (emails, phone numbers,
//!   GPS coordinates) are replaced with `[REDACTED_<TYPE>]` placeholders
//!
//! A level threshold runs before both, so suppressed calls never reach the
//! consent authority.
//!
//! # Core Types
//!
//! - [`Logger`]: the pipeline and sole entry point
//! - [`AuditLevel`] / [`AuditFilter`]: the three-tier level scheme
//! - [`ConsentLookup`] / [`ConsentGate`]: pluggable consent authority and its classifier
//! - [`Redactor`] / [`RedactionRule`]: ordered, immutable pattern set
//! - [`LineSink`]: destination for finished lines; accepts only [`Verified`] text
//! - [`Tainted`]: wrapper for raw message text that only the crate can read
//!
//! # Examples
//!
//! ```
//! use consent_log::{AuditLevel, Logger, StaticConsentTable, VecSink};
//!
//! let consent = StaticConsentTable::new()
//!     .grant("user_has_consent")
//!     .deny("user_no_consent");
//!
//! let logger = Logger::builder(consent, VecSink::new()).build().unwrap();
//!
//! logger.log("User contact: test@example.com", "user_has_consent");
//! logger.log("This user's secret is password123", "user_no_consent");
//!
//! let lines = logger.sink().lines();
//! assert!(lines[0].ends_with("User contact: [REDACTED_EMAIL]"));
//! assert!(lines[1].contains("CONSENT_FAILURE"));
//! assert!(!lines[1].contains("password123"));
//! ```

#![forbid(unsafe_code)]
#![warn(missing_docs)]
#![cfg_attr(docsrs, feature(doc_cfg))]

mod config;
mod consent;
mod error;
mod level;
mod logger;
#[cfg(feature = "async")]
mod nonblocking;
mod record;
mod redactor;
mod sanitizer;
mod sink;
mod tainted;
mod verified;

pub use config::{load_config, LoggerConfig, RuleConfig, THRESHOLD_ENV};
pub use consent::{
    ConsentGate, ConsentLookup, ConsentRecord, ConsentStatus, LookupError, StaticConsentTable,
};
pub use error::{ConfigError, ConsentError};
pub use level::{AuditFilter, AuditLevel, ParseLevelError};
pub use logger::{Logger, LoggerBuilder};
#[cfg(feature = "async")]
#[cfg_attr(docsrs, doc(cfg(feature = "async")))]
pub use nonblocking::{AsyncConsentLookup, AsyncLineSink};
pub use record::{LogRecord, Payload};
pub use redactor::{RedactionRule, Redactor};
pub use sanitizer::Sanitizer;
pub use sink::{LineSink, SinkError, SinkErrorKind, StdoutSink, VecSink, WriterSink};
pub use tainted::Tainted;
pub use verified::Verified;
