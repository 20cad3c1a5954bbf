//! End-to-end tests for the logging pipeline.
//!
//! These drive [`Logger`] through its public surface only: a consent table,
//! a sink, and log calls.

use std::io::{self, Write};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::thread;

use chrono::{DateTime, TimeZone, Utc};
use consent_log::{
    AuditLevel, ConsentLookup, ConsentRecord, LineSink, LookupError, Logger, Redactor, Sanitizer,
    SinkError, SinkErrorKind, StaticConsentTable, Tainted, VecSink, Verified, WriterSink,
};

fn fixed_clock() -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2024, 3, 1, 12, 0, 0).unwrap()
}

fn consent_table() -> StaticConsentTable {
    StaticConsentTable::new()
        .grant("user_has_consent")
        .deny("user_no_consent")
        .mark_error("user_error_state")
}

fn logger_at(threshold: AuditLevel) -> Logger<StaticConsentTable, VecSink> {
    Logger::builder(consent_table(), VecSink::new())
        .threshold(threshold)
        .clock(fixed_clock)
        .build()
        .unwrap()
}

#[test]
fn granted_email_is_redacted() {
    let logger = logger_at(AuditLevel::Minimal);
    logger.log("User contact: test@example.com", "user_has_consent");

    assert_eq!(
        logger.sink().lines(),
        vec![
            "[2024-03-01T12:00:00.000000+00:00] [LEVEL: MINIMAL] [USER: user_has_consent] \
             User contact: [REDACTED_EMAIL]"
        ]
    );
}

#[test]
fn denied_subject_message_never_reaches_sink() {
    let logger = logger_at(AuditLevel::Minimal);
    logger.log("This user's secret is password123", "user_no_consent");

    let lines = logger.sink().lines();
    assert_eq!(lines.len(), 1);
    assert!(lines[0].ends_with(
        "[LEVEL: MINIMAL] [USER: user_no_consent] \
         CONSENT_FAILURE: Consent denied or in error state for user 'user_no_consent'."
    ));
    assert!(!lines[0].contains("password123"));
}

#[test]
fn unknown_subject_fails_closed() {
    let logger = logger_at(AuditLevel::Minimal);
    logger.log("Some data for an unknown user.", "user_not_in_db");

    let lines = logger.sink().lines();
    assert_eq!(lines.len(), 1);
    assert!(lines[0]
        .ends_with("CONSENT_FAILURE: Consent status for user 'user_not_in_db' is unknown."));
    assert!(!lines[0].contains("Some data"));
}

#[test]
fn error_state_subject_fails_closed() {
    let logger = logger_at(AuditLevel::Minimal);
    logger.log("Data for a user whose consent is in error", "user_error_state");

    let lines = logger.sink().lines();
    assert!(lines[0].ends_with(
        "CONSENT_FAILURE: Consent denied or in error state for user 'user_error_state'."
    ));
}

#[test]
fn diag_call_below_minimal_threshold_is_dropped() {
    let logger = logger_at(AuditLevel::Minimal);
    logger.log_at("Diagnostic log message.", "user_has_consent", AuditLevel::Diag);
    assert!(logger.sink().is_empty());
}

#[test]
fn diag_threshold_emits_diag_lines() {
    let logger = logger_at(AuditLevel::Diag);
    logger.log_at("Diagnostic log message.", "user_has_consent", AuditLevel::Diag);

    let lines = logger.sink().lines();
    assert_eq!(lines.len(), 1);
    assert!(lines[0].contains("[LEVEL: DIAG]"));
    assert!(lines[0].ends_with("Diagnostic log message."));
}

#[test]
fn none_threshold_only_admits_none_calls() {
    let logger = logger_at(AuditLevel::None);
    logger.log("minimal", "user_has_consent");
    logger.log_at("diag", "user_has_consent", AuditLevel::Diag);
    logger.log_at("critical", "user_has_consent", AuditLevel::None);

    let lines = logger.sink().lines();
    assert_eq!(lines.len(), 1);
    assert!(lines[0].ends_with("[LEVEL: NONE] [USER: user_has_consent] critical"));
}

#[test]
fn every_builtin_pattern_is_redacted_in_one_message() {
    let logger = logger_at(AuditLevel::Minimal);
    logger.log(
        "Email a.b@corp.io, call (555) 123-4567, meet at 40.7128, -74.0060",
        "user_has_consent",
    );

    let lines = logger.sink().lines();
    assert!(lines[0].ends_with(
        "Email [REDACTED_EMAIL], call [REDACTED_PHONE], meet at [REDACTED_GPS]"
    ));
}

#[test]
fn phone_variants_are_redacted() {
    let logger = logger_at(AuditLevel::Minimal);
    for number in ["555-123-4567", "555.123.4567", "555 123 4567", "5551234567"] {
        logger.log(format!("call {number} now"), "user_has_consent");
    }

    for line in logger.sink().lines() {
        assert!(line.ends_with("call [REDACTED_PHONE] now"), "{line}");
    }
}

#[test]
fn shared_logger_across_threads() {
    let logger = Arc::new(logger_at(AuditLevel::Minimal));

    let handles: Vec<_> = (0..8)
        .map(|i| {
            let logger = Arc::clone(&logger);
            thread::spawn(move || {
                let subject = if i % 2 == 0 { "user_has_consent" } else { "user_no_consent" };
                logger.log(format!("worker {i} mail w{i}@example.com"), subject);
            })
        })
        .collect();
    for handle in handles {
        handle.join().unwrap();
    }

    let lines = logger.sink().lines();
    assert_eq!(lines.len(), 8);
    assert_eq!(lines.iter().filter(|l| l.contains("CONSENT_FAILURE")).count(), 4);
    assert!(lines.iter().all(|l| !l.contains("@example.com")));
}

#[test]
fn writer_sink_appends_lines_to_file() {
    let file = tempfile::NamedTempFile::new().unwrap();
    let logger = Logger::builder(consent_table(), WriterSink::new(file.reopen().unwrap()))
        .clock(fixed_clock)
        .build()
        .unwrap();

    logger.log("first 555-123-4567", "user_has_consent");
    logger.log("second", "user_no_consent");
    drop(logger);

    let contents = std::fs::read_to_string(file.path()).unwrap();
    let lines: Vec<_> = contents.lines().collect();
    assert_eq!(lines.len(), 2);
    assert!(lines[0].ends_with("first [REDACTED_PHONE]"));
    assert!(lines[1].contains("CONSENT_FAILURE"));
}

struct BrokenPipe;

impl Write for BrokenPipe {
    fn write(&mut self, _buf: &[u8]) -> io::Result<usize> {
        Err(io::Error::new(io::ErrorKind::BrokenPipe, "closed"))
    }

    fn flush(&mut self) -> io::Result<()> {
        Ok(())
    }
}

#[derive(Clone, Default)]
struct CapturedOutput(Arc<Mutex<Vec<u8>>>);

impl CapturedOutput {
    fn contents(&self) -> String {
        String::from_utf8(self.0.lock().unwrap().clone()).unwrap()
    }
}

impl Write for CapturedOutput {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        self.0.lock().unwrap().extend_from_slice(buf);
        Ok(buf.len())
    }

    fn flush(&mut self) -> io::Result<()> {
        Ok(())
    }
}

#[derive(Default)]
struct FailingSink {
    attempts: AtomicUsize,
}

impl LineSink for FailingSink {
    fn write(&self, _line: &Verified<String>) -> Result<(), SinkError> {
        self.attempts.fetch_add(1, Ordering::SeqCst);
        Err(SinkError::with_message(SinkErrorKind::Io, "disk full"))
    }
}

#[test]
fn sink_failure_is_reported_without_line_text() {
    let output = CapturedOutput::default();
    let subscriber = tracing_subscriber::fmt()
        .with_max_level(tracing::Level::WARN)
        .with_ansi(false)
        .with_writer({
            let output = output.clone();
            move || output.clone()
        })
        .finish();

    let logger = Logger::builder(consent_table(), FailingSink::default())
        .build()
        .unwrap();

    tracing::subscriber::with_default(subscriber, || {
        // Returns normally even though every write fails.
        logger.log("reach QZX771 at 555-123-4567", "user_has_consent");
        logger.log("hidden QZX772", "user_no_consent");
    });

    assert_eq!(logger.sink().attempts.load(Ordering::SeqCst), 2);

    let captured = output.contents();
    assert_eq!(captured.matches("failed to write log line").count(), 2);
    assert!(captured.contains("user_has_consent"));
    assert!(captured.contains("user_no_consent"));
    assert!(captured.contains("I/O error"));
    assert!(!captured.contains("QZX77"));
    assert!(!captured.contains("REDACTED"));
    assert!(!captured.contains("CONSENT_FAILURE"));
}

#[test]
fn writer_failure_does_not_reach_caller() {
    let logger = Logger::builder(consent_table(), WriterSink::new(BrokenPipe))
        .build()
        .unwrap();

    logger.log("hello", "user_has_consent");
    logger.log("hello", "user_no_consent");
}

#[test]
fn subject_id_with_newline_stays_on_one_line() {
    let logger = logger_at(AuditLevel::Minimal);
    logger.log(
        "anything",
        "x\n[2024-03-01T12:00:00.000000+00:00] [LEVEL: MINIMAL] [USER: y] forged",
    );

    let lines = logger.sink().lines();
    assert_eq!(lines.len(), 1);
    assert!(!lines[0].contains('\n'));
    assert!(lines[0].contains("[USER: x\\n[2024-03-01"));
    assert!(lines[0].contains("CONSENT_FAILURE: Consent status for user 'x\\n["));
}

#[derive(Default)]
struct RecordingSink {
    lines: Mutex<Vec<String>>,
    attempts: AtomicUsize,
}

impl LineSink for RecordingSink {
    fn write(&self, line: &Verified<String>) -> Result<(), SinkError> {
        self.attempts.fetch_add(1, Ordering::SeqCst);
        self.lines.lock()?.push(line.as_str().to_owned());
        Ok(())
    }
}

#[test]
fn custom_sink_receives_exactly_one_line_per_admitted_call() {
    let logger = Logger::builder(consent_table(), RecordingSink::default())
        .build()
        .unwrap();

    logger.log("a", "user_has_consent");
    logger.log("b", "user_no_consent");
    logger.log("c", "nobody");
    logger.log_at("d", "user_has_consent", AuditLevel::Diag);

    assert_eq!(logger.sink().attempts.load(Ordering::SeqCst), 3);
}

struct Unreachable;

impl ConsentLookup for Unreachable {
    fn lookup(&self, _subject_id: &str) -> Result<Option<ConsentRecord>, LookupError> {
        Err(LookupError::new("connection refused"))
    }
}

#[test]
fn lookup_failure_is_reported_as_unknown() {
    let logger = Logger::builder(Unreachable, VecSink::new()).build().unwrap();
    logger.log("payload", "u-7");

    let lines = logger.sink().lines();
    assert!(lines[0].ends_with("CONSENT_FAILURE: Consent status for user 'u-7' is unknown."));
    assert!(!lines[0].contains("connection refused"));
}

#[test]
fn sink_error_kind_is_io_for_writer_failures() {
    let sink = WriterSink::new(BrokenPipe);
    let redactor = Redactor::with_default_rules().unwrap();
    let line = redactor.sanitize(Tainted::new("x".to_string()));
    let err = sink.write(&line).unwrap_err();
    assert_eq!(err.kind(), SinkErrorKind::Io);
}
