//! Suspending collaborators for async callers.
//!
//! A remote consent service and a network sink are the two places where a
//! log call waits on I/O. The traits here let both be awaited while
//! [`Logger::log_async`] keeps the same order of steps as the blocking path:
//! level check, consent lookup, redaction, one sink write.

use async_trait::async_trait;

use crate::consent::{classify, ConsentGate, ConsentLookup, ConsentRecord, ConsentStatus, LookupError};
use crate::{AuditLevel, LineSink, Logger, SinkError, StaticConsentTable, Tainted, VecSink, Verified};

/// Consent authority that is queried asynchronously.
#[async_trait]
pub trait AsyncConsentLookup: Send + Sync {
    /// Looks up the stored consent value for `subject_id`.
    async fn lookup(&self, subject_id: &str) -> Result<Option<ConsentRecord>, LookupError>;
}

/// Sink whose writes may suspend.
#[async_trait]
pub trait AsyncLineSink: Send + Sync {
    /// Appends one complete line.
    async fn write(&self, line: &Verified<String>) -> Result<(), SinkError>;
}

#[async_trait]
impl AsyncConsentLookup for StaticConsentTable {
    async fn lookup(&self, subject_id: &str) -> Result<Option<ConsentRecord>, LookupError> {
        ConsentLookup::lookup(self, subject_id)
    }
}

#[async_trait]
impl AsyncLineSink for VecSink {
    async fn write(&self, line: &Verified<String>) -> Result<(), SinkError> {
        LineSink::write(self, line)
    }
}

impl<L: AsyncConsentLookup> ConsentGate<L> {
    /// Async counterpart of [`ConsentGate::check_consent`].
    pub async fn check_consent_async(&self, subject_id: &str) -> ConsentStatus {
        let answer = AsyncConsentLookup::lookup(self.lookup(), subject_id).await;
        classify(subject_id, answer)
    }
}

impl<L: AsyncConsentLookup, S: AsyncLineSink> Logger<L, S> {
    /// Logs `message` for `subject_id` at [`AuditLevel::Minimal`].
    pub async fn log_async(&self, message: impl Into<Tainted<String>>, subject_id: &str) {
        self.log_at_async(message, subject_id, AuditLevel::Minimal).await;
    }

    /// Logs `message` for `subject_id` at `level`, awaiting the consent
    /// lookup and the sink write.
    pub async fn log_at_async(
        &self,
        message: impl Into<Tainted<String>>,
        subject_id: &str,
        level: AuditLevel,
    ) {
        let message = message.into();
        if !self.admits(level, subject_id) {
            return;
        }

        let status = self.gate().check_consent_async(subject_id).await;
        let record = self.decide(message, subject_id, level, status);

        if let Err(error) = AsyncLineSink::write(self.sink(), &record.to_line()).await {
            Self::report_sink_failure(&record, &error);
        }
    }
}
