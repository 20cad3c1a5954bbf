use std::fmt;
use std::sync::Arc;

use chrono::{DateTime, Utc};

use crate::config::LoggerConfig;
use crate::consent::{ConsentGate, ConsentLookup, ConsentStatus};
use crate::error::ConfigError;
use crate::record::LogRecord;
use crate::{AuditFilter, AuditLevel, LineSink, RedactionRule, Redactor, Sanitizer, Tainted};

type Clock = Arc<dyn Fn() -> DateTime<Utc> + Send + Sync>;

/// Consent-gated, redacting logger.
///
/// Every call runs the same fixed sequence:
///
/// 1. Level check against the threshold. Suppressed calls stop here, before
///    the consent authority is asked anything.
/// 2. Consent check for the subject. Denied or unknown consent produces a
///    single `CONSENT_FAILURE` line at `MINIMAL` and the message is dropped
///    unread.
/// 3. Redaction of the message.
/// 4. One line to the sink.
///
/// Log calls return `()` and never fail; callers cannot tell from the return
/// value whether a line was written. The threshold and rule set are fixed at
/// construction, so a `Logger` can be shared (e.g. in an `Arc`) across threads.
///
/// # Examples
///
/// ```
/// use consent_log::{AuditLevel, Logger, StaticConsentTable, VecSink};
///
/// let consent = StaticConsentTable::new().grant("alice").deny("bob");
/// let logger = Logger::builder(consent, VecSink::new())
///     .threshold(AuditLevel::Minimal)
///     .build()
///     .unwrap();
///
/// logger.log("contact me at a@b.com", "alice");
/// logger.log("secret: xyz", "bob");
/// logger.log_at("noisy detail", "alice", AuditLevel::Diag);
///
/// let lines = logger.sink().lines();
/// assert_eq!(lines.len(), 2);
/// assert!(lines[0].ends_with("[LEVEL: MINIMAL] [USER: alice] contact me at [REDACTED_EMAIL]"));
/// assert!(lines[1].contains("CONSENT_FAILURE"));
/// assert!(!lines[1].contains("xyz"));
/// ```
pub struct Logger<L, S> {
    filter: AuditFilter,
    gate: ConsentGate<L>,
    redactor: Redactor,
    sink: S,
    clock: Clock,
}

impl<L, S> Logger<L, S> {
    /// Starts building a logger around a consent authority and a sink.
    pub fn builder(lookup: L, sink: S) -> LoggerBuilder<L, S> {
        LoggerBuilder::new(lookup, sink)
    }

    /// Builds a logger from loaded configuration.
    ///
    /// # Errors
    ///
    /// Returns an error if the configured rules do not compile or collide.
    pub fn from_config(config: &LoggerConfig, lookup: L, sink: S) -> Result<Self, ConfigError> {
        Self::builder(lookup, sink)
            .threshold(config.threshold)
            .rules(config.compile_rules()?)
            .build()
    }

    /// Most verbose level this logger emits.
    pub fn threshold(&self) -> AuditLevel {
        self.filter.threshold()
    }

    /// The redactor applied to granted messages.
    pub fn redactor(&self) -> &Redactor {
        &self.redactor
    }

    /// The consent gate consulted for each admitted call.
    pub fn gate(&self) -> &ConsentGate<L> {
        &self.gate
    }

    /// The sink receiving finished lines.
    pub fn sink(&self) -> &S {
        &self.sink
    }

    /// Step 1: level check. Suppressed calls stop before any consent lookup.
    pub(crate) fn admits(&self, level: AuditLevel, subject_id: &str) -> bool {
        let admitted = self.filter.admits(level);
        if !admitted {
            tracing::trace!(
                subject_id,
                requested = %level,
                threshold = %self.filter.threshold(),
                "suppressed by level"
            );
        }
        admitted
    }

    /// Steps 2 and 3: turn a consent status and raw message into a record.
    ///
    /// On failure the raw message is dropped without being read.
    pub(crate) fn decide(
        &self,
        message: Tainted<String>,
        subject_id: &str,
        level: AuditLevel,
        status: ConsentStatus,
    ) -> LogRecord {
        let timestamp = (self.clock)();
        match status {
            ConsentStatus::Granted => {
                let redacted = self.redactor.sanitize(message);
                tracing::trace!(subject_id, requested = %level, "emitting record");
                LogRecord::emitted(timestamp, level, subject_id, redacted)
            }
            ConsentStatus::Denied(reason) | ConsentStatus::Unknown(reason) => {
                drop(message);
                tracing::trace!(subject_id, "suppressed by consent");
                LogRecord::consent_failure(timestamp, subject_id, reason)
            }
        }
    }

    pub(crate) fn report_sink_failure(record: &LogRecord, error: &crate::SinkError) {
        tracing::warn!(
            subject_id = record.subject_id(),
            kind = %error.kind(),
            "failed to write log line"
        );
    }
}

impl<L: ConsentLookup, S: LineSink> Logger<L, S> {
    /// Logs `message` for `subject_id` at [`AuditLevel::Minimal`].
    pub fn log(&self, message: impl Into<Tainted<String>>, subject_id: &str) {
        self.log_at(message, subject_id, AuditLevel::Minimal);
    }

    /// Logs `message` for `subject_id` at `level`.
    pub fn log_at(&self, message: impl Into<Tainted<String>>, subject_id: &str, level: AuditLevel) {
        let message = message.into();
        if !self.admits(level, subject_id) {
            return;
        }

        let status = self.gate.check_consent(subject_id);
        let record = self.decide(message, subject_id, level, status);

        if let Err(error) = self.sink.write(&record.to_line()) {
            Self::report_sink_failure(&record, &error);
        }
    }
}

impl<L, S> fmt::Debug for Logger<L, S> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Logger")
            .field("threshold", &self.filter.threshold())
            .field("redactor", &self.redactor)
            .finish_non_exhaustive()
    }
}

/// Builder for [`Logger`].
///
/// Defaults: threshold [`AuditLevel::Minimal`], the built-in EMAIL, PHONE and
/// GPS rules, and the system clock.
pub struct LoggerBuilder<L, S> {
    lookup: L,
    sink: S,
    threshold: AuditLevel,
    rules: Option<Vec<RedactionRule>>,
    clock: Option<Clock>,
}

impl<L, S> LoggerBuilder<L, S> {
    fn new(lookup: L, sink: S) -> Self {
        Self {
            lookup,
            sink,
            threshold: AuditLevel::default(),
            rules: None,
            clock: None,
        }
    }

    /// Sets the most verbose level that is emitted.
    pub fn threshold(mut self, threshold: AuditLevel) -> Self {
        self.threshold = threshold;
        self
    }

    /// Replaces the rule set. Rules run in the given order.
    pub fn rules(mut self, rules: Vec<RedactionRule>) -> Self {
        self.rules = Some(rules);
        self
    }

    /// Replaces the timestamp source.
    pub fn clock(mut self, clock: impl Fn() -> DateTime<Utc> + Send + Sync + 'static) -> Self {
        let clock: Clock = Arc::new(clock);
        self.clock = Some(clock);
        self
    }

    /// Validates the rule set and builds the logger.
    ///
    /// # Errors
    ///
    /// Returns an error if rule names repeat or a pattern matches a placeholder.
    pub fn build(self) -> Result<Logger<L, S>, ConfigError> {
        let redactor = match self.rules {
            Some(rules) => Redactor::new(rules)?,
            None => Redactor::with_default_rules()?,
        };

        let clock: Clock = match self.clock {
            Some(clock) => clock,
            None => Arc::new(Utc::now),
        };

        Ok(Logger {
            filter: AuditFilter::new(self.threshold),
            gate: ConsentGate::new(self.lookup),
            redactor,
            sink: self.sink,
            clock,
        })
    }
}
