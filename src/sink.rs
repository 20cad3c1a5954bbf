use std::fmt;
use std::io::{self, Write};
use std::sync::{Mutex, PoisonError};

use crate::Verified;

/// Error returned when a sink could not store a line.
///
/// # Examples
///
/// ```
/// use consent_log::{SinkError, SinkErrorKind};
///
/// let error = SinkError::with_message(SinkErrorKind::Io, "disk full");
/// assert_eq!(error.kind(), SinkErrorKind::Io);
/// assert_eq!(error.message(), Some("disk full"));
/// ```
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SinkError {
    kind: SinkErrorKind,
    message: Option<String>,
}

impl SinkError {
    /// Creates a new sink error with the specified kind.
    pub fn new(kind: SinkErrorKind) -> Self {
        Self {
            kind,
            message: None,
        }
    }

    /// Creates a new sink error with a custom message.
    pub fn with_message(kind: SinkErrorKind, message: impl Into<String>) -> Self {
        Self {
            kind,
            message: Some(message.into()),
        }
    }

    /// Returns the error kind.
    pub fn kind(&self) -> SinkErrorKind {
        self.kind
    }

    /// Returns the error message, if any.
    pub fn message(&self) -> Option<&str> {
        self.message.as_deref()
    }
}

impl fmt::Display for SinkError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if let Some(msg) = &self.message {
            write!(f, "sink error ({}): {}", self.kind, msg)
        } else {
            write!(f, "sink error ({})", self.kind)
        }
    }
}

impl std::error::Error for SinkError {}

impl From<io::Error> for SinkError {
    fn from(error: io::Error) -> Self {
        Self::with_message(SinkErrorKind::Io, error.to_string())
    }
}

impl<T> From<PoisonError<T>> for SinkError {
    fn from(_: PoisonError<T>) -> Self {
        Self::new(SinkErrorKind::Poisoned)
    }
}

/// Kind of sink error.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SinkErrorKind {
    /// I/O error occurred while writing.
    Io,
    /// A previous writer panicked while holding the sink's lock.
    Poisoned,
}

impl fmt::Display for SinkErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Io => write!(f, "I/O error"),
            Self::Poisoned => write!(f, "sink lock poisoned"),
        }
    }
}

/// Destination for finished log lines.
///
/// One call stores one complete line. Implementations are shared across
/// threads and must not interleave concurrent lines.
///
/// `write` accepts only `&Verified<String>`, so raw message text cannot be
/// handed to a sink:
///
/// ```compile_fail
/// use consent_log::{LineSink, VecSink};
///
/// let sink = VecSink::new();
/// sink.write(&"raw text".to_string()); // Type mismatch!
/// ```
// Do NOT widen `write` to accept `&str` or `&String`; that reopens the path
// for unredacted text to reach output.
pub trait LineSink: Send + Sync {
    /// Appends one line.
    ///
    /// # Errors
    ///
    /// Returns `SinkError` if the line could not be stored.
    fn write(&self, line: &Verified<String>) -> Result<(), SinkError>;
}

impl<S: LineSink + ?Sized> LineSink for &S {
    fn write(&self, line: &Verified<String>) -> Result<(), SinkError> {
        (**self).write(line)
    }
}

impl<S: LineSink + ?Sized> LineSink for std::sync::Arc<S> {
    fn write(&self, line: &Verified<String>) -> Result<(), SinkError> {
        (**self).write(line)
    }
}

/// Writes lines to standard output.
///
/// Each line is written and flushed while holding the stdout lock, so
/// concurrent writers never produce interleaved partial lines.
#[derive(Debug, Clone, Copy, Default)]
pub struct StdoutSink;

impl StdoutSink {
    /// Creates a stdout sink.
    pub fn new() -> Self {
        Self
    }
}

impl LineSink for StdoutSink {
    fn write(&self, line: &Verified<String>) -> Result<(), SinkError> {
        let mut out = io::stdout().lock();
        writeln!(out, "{}", line.as_str())?;
        out.flush()?;
        Ok(())
    }
}

/// Writes lines to any `io::Write` behind a mutex (files, buffers, sockets).
///
/// # Examples
///
/// ```
/// use consent_log::WriterSink;
///
/// let sink = WriterSink::new(Vec::new());
/// let buffer = sink.into_inner().unwrap();
/// assert!(buffer.is_empty());
/// ```
#[derive(Debug)]
pub struct WriterSink<W> {
    writer: Mutex<W>,
}

impl<W: Write> WriterSink<W> {
    /// Wraps a writer.
    pub fn new(writer: W) -> Self {
        Self {
            writer: Mutex::new(writer),
        }
    }

    /// Returns the wrapped writer.
    ///
    /// # Errors
    ///
    /// Returns [`SinkErrorKind::Poisoned`] if a writer panicked mid-line.
    pub fn into_inner(self) -> Result<W, SinkError> {
        Ok(self.writer.into_inner()?)
    }
}

impl<W: Write + Send> LineSink for WriterSink<W> {
    fn write(&self, line: &Verified<String>) -> Result<(), SinkError> {
        let mut writer = self.writer.lock()?;
        writeln!(writer, "{}", line.as_str())?;
        writer.flush()?;
        Ok(())
    }
}

/// Collects lines in memory. Useful for tests and inspection.
///
/// # Examples
///
/// ```
/// use consent_log::{Logger, StaticConsentTable, VecSink};
///
/// let logger = Logger::builder(StaticConsentTable::new().grant("u1"), VecSink::new())
///     .build()
///     .unwrap();
///
/// logger.log("hello", "u1");
///
/// let lines = logger.sink().lines();
/// assert_eq!(lines.len(), 1);
/// assert!(lines[0].ends_with("[USER: u1] hello"));
/// ```
#[derive(Debug, Default)]
pub struct VecSink {
    lines: Mutex<Vec<String>>,
}

impl VecSink {
    /// Creates an empty sink.
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of lines written so far.
    pub fn len(&self) -> usize {
        self.with_lines(|lines| lines.len())
    }

    /// Returns `true` if nothing has been written.
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Gives borrowed access to the lines without cloning them.
    pub fn with_lines<F, R>(&self, f: F) -> R
    where
        F: FnOnce(&[String]) -> R,
    {
        let lines = self.lines.lock().unwrap_or_else(PoisonError::into_inner);
        f(&lines)
    }

    /// Returns a snapshot of the lines written so far.
    pub fn lines(&self) -> Vec<String> {
        self.with_lines(|lines| lines.to_vec())
    }

    /// Consumes the sink and returns its lines.
    pub fn into_lines(self) -> Vec<String> {
        self.lines
            .into_inner()
            .unwrap_or_else(PoisonError::into_inner)
    }
}

impl LineSink for VecSink {
    fn write(&self, line: &Verified<String>) -> Result<(), SinkError> {
        self.lines.lock()?.push(line.as_str().to_string());
        Ok(())
    }
}
