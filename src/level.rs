use std::fmt;
use std::str::FromStr;

use serde::Deserialize;
use thiserror::Error;

/// Verbosity tier attached to every log call and to every logger.
///
/// Levels are totally ordered by [`rank`](Self::rank): a higher rank is more
/// verbose. A logger configured with a threshold emits every call whose
/// requested level ranks at or below that threshold.
///
/// # Examples
///
/// ```
/// use consent_log::AuditLevel;
///
/// assert!(AuditLevel::None < AuditLevel::Minimal);
/// assert!(AuditLevel::Minimal < AuditLevel::Diag);
/// assert_eq!(AuditLevel::default(), AuditLevel::Minimal);
/// assert_eq!(AuditLevel::Diag.name(), "DIAG");
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default, Deserialize)]
#[serde(try_from = "String")]
pub enum AuditLevel {
    /// Nothing beyond the bare minimum.
    None = 0,
    /// Default tier for ordinary records.
    #[default]
    Minimal = 1,
    /// Diagnostic detail.
    Diag = 2,
}

impl AuditLevel {
    /// Every level, lowest rank first.
    pub const ALL: [AuditLevel; 3] = [AuditLevel::None, AuditLevel::Minimal, AuditLevel::Diag];

    /// Integer rank of the level.
    pub fn rank(self) -> u8 {
        self as u8
    }

    /// Upper-case name used in output lines (`NONE`, `MINIMAL`, `DIAG`).
    pub fn name(self) -> &'static str {
        match self {
            AuditLevel::None => "NONE",
            AuditLevel::Minimal => "MINIMAL",
            AuditLevel::Diag => "DIAG",
        }
    }
}

impl fmt::Display for AuditLevel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Error returned when a string does not name an [`AuditLevel`].
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("unknown audit level '{0}' (expected NONE, MINIMAL or DIAG)")]
pub struct ParseLevelError(String);

impl FromStr for AuditLevel {
    type Err = ParseLevelError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_uppercase().as_str() {
            "NONE" => Ok(AuditLevel::None),
            "MINIMAL" => Ok(AuditLevel::Minimal),
            "DIAG" => Ok(AuditLevel::Diag),
            _ => Err(ParseLevelError(s.to_string())),
        }
    }
}

impl TryFrom<String> for AuditLevel {
    type Error = ParseLevelError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

/// Level comparison performed before any other work on a log call.
///
/// The filter is a pure function of two levels. It runs first in the pipeline
/// so that suppressed calls never reach the consent authority.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AuditFilter {
    threshold: AuditLevel,
}

impl AuditFilter {
    /// Creates a filter for the given configured threshold.
    pub fn new(threshold: AuditLevel) -> Self {
        Self { threshold }
    }

    /// Returns the configured threshold.
    pub fn threshold(&self) -> AuditLevel {
        self.threshold
    }

    /// Returns `true` iff `requested` ranks at or below `threshold`.
    ///
    /// # Examples
    ///
    /// ```
    /// use consent_log::{AuditFilter, AuditLevel};
    ///
    /// assert!(AuditFilter::should_emit(AuditLevel::Minimal, AuditLevel::Minimal));
    /// assert!(!AuditFilter::should_emit(AuditLevel::Diag, AuditLevel::Minimal));
    /// ```
    pub fn should_emit(requested: AuditLevel, threshold: AuditLevel) -> bool {
        requested.rank() <= threshold.rank()
    }

    /// Applies [`should_emit`](Self::should_emit) against this filter's threshold.
    pub fn admits(&self, requested: AuditLevel) -> bool {
        Self::should_emit(requested, self.threshold)
    }
}

impl Default for AuditFilter {
    fn default() -> Self {
        Self::new(AuditLevel::default())
    }
}
