//! Pattern-based redaction of sensitive substrings.

use std::collections::HashSet;
use std::fmt;
use std::ops::Range;
use std::sync::Arc;

use regex::{NoExpand, Regex};

use crate::error::ConfigError;
use crate::{Sanitizer, Tainted, Verified};

const EMAIL_PATTERN: &str = r"\b[A-Za-z0-9._%+-]+@[A-Za-z0-9.-]+\.[A-Za-z]{2,}\b";

// Replaces the whole text when a rule set cannot settle it.
const FALLBACK_PLACEHOLDER: &str = "[REDACTED]";

const PHONE_PATTERN: &str = r"\(?\b\d{3}\)?[-.\s]?\d{3}[-.\s]?\d{4}\b";

// Latitude in [-90, 90], comma, longitude in [-180, 180]; decimals optional.
const GPS_PATTERN: &str = r"\b[-+]?([1-8]?\d(\.\d+)?|90(\.0+)?),\s*[-+]?(180(\.0+)?|((1[0-7]\d)|([1-9]?\d))(\.\d+)?)\b";

/// A named pattern and the placeholder that replaces its matches.
///
/// The placeholder is always `[REDACTED_<NAME>]`.
///
/// # Examples
///
/// ```
/// use consent_log::RedactionRule;
///
/// let rule = RedactionRule::new("SSN", r"\b\d{3}-\d{2}-\d{4}\b").unwrap();
/// assert_eq!(rule.placeholder(), "[REDACTED_SSN]");
/// ```
#[derive(Clone)]
pub struct RedactionRule {
    name: String,
    regex: Regex,
    placeholder: String,
}

impl RedactionRule {
    /// Compiles a rule.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::InvalidRuleName`] if `name` is not of the form
    /// `[A-Z][A-Z0-9_]*`, or [`ConfigError::InvalidPattern`] if the pattern
    /// does not compile.
    pub fn new(name: impl Into<String>, pattern: &str) -> Result<Self, ConfigError> {
        let name = name.into();
        if !is_valid_name(&name) {
            return Err(ConfigError::InvalidRuleName(name));
        }

        let regex = Regex::new(pattern).map_err(|source| ConfigError::InvalidPattern {
            name: name.clone(),
            source,
        })?;

        let placeholder = format!("[REDACTED_{name}]");
        Ok(Self {
            name,
            regex,
            placeholder,
        })
    }

    /// Email addresses.
    pub fn email() -> Result<Self, ConfigError> {
        Self::new("EMAIL", EMAIL_PATTERN)
    }

    /// North-American style ten-digit phone numbers.
    pub fn phone() -> Result<Self, ConfigError> {
        Self::new("PHONE", PHONE_PATTERN)
    }

    /// Latitude/longitude pairs.
    pub fn gps() -> Result<Self, ConfigError> {
        Self::new("GPS", GPS_PATTERN)
    }

    /// The built-in rules, in evaluation order: EMAIL, PHONE, GPS.
    pub fn defaults() -> Result<Vec<Self>, ConfigError> {
        Ok(vec![Self::email()?, Self::phone()?, Self::gps()?])
    }

    /// Rule name, e.g. `EMAIL`.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Source of the compiled pattern.
    pub fn pattern(&self) -> &str {
        self.regex.as_str()
    }

    /// Replacement text for matches of this rule.
    pub fn placeholder(&self) -> &str {
        &self.placeholder
    }

    /// Returns `true` if the pattern occurs anywhere in `text`.
    pub fn is_match(&self, text: &str) -> bool {
        self.regex.is_match(text)
    }

    fn apply(&self, text: &str) -> String {
        self.regex
            .replace_all(text, NoExpand(&self.placeholder))
            .into_owned()
    }
}

impl fmt::Debug for RedactionRule {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RedactionRule")
            .field("name", &self.name)
            .field("pattern", &self.regex.as_str())
            .finish()
    }
}

/// Placeholders set in the text that can surround them after redaction.
struct Surrounding<'a> {
    text: String,
    placeholders: Vec<(&'a str, Range<usize>)>,
}

impl<'a> Surrounding<'a> {
    /// Every placeholder alone, then with each printable ASCII character on
    /// either side, then next to every other placeholder.
    fn all(placeholders: &[&'a str]) -> Vec<Self> {
        let mut out: Vec<Self> = placeholders
            .iter()
            .map(|&p| Self::joined("", &[p], ""))
            .collect();
        for &p in placeholders {
            for c in ' '..='~' {
                let c = c.to_string();
                out.push(Self::joined(&c, &[p], ""));
                out.push(Self::joined("", &[p], &c));
            }
        }
        for &p in placeholders {
            for &q in placeholders {
                out.push(Self::joined("", &[p, q], ""));
            }
        }
        out
    }

    fn joined(before: &str, placeholders: &[&'a str], after: &str) -> Self {
        let mut text = before.to_string();
        let mut spans = Vec::new();
        for &placeholder in placeholders {
            let start = text.len();
            text.push_str(placeholder);
            spans.push((placeholder, start..text.len()));
        }
        text.push_str(after);
        Self {
            text,
            placeholders: spans,
        }
    }

    /// The placeholder a replacement by `rule` would cut into, if any.
    fn collision(&self, rule: &RedactionRule) -> Option<&'a str> {
        rule.regex.find_iter(&self.text).find_map(|m| {
            self.placeholders
                .iter()
                .find(|(_, span)| overlaps(m.range(), span))
                .map(|(placeholder, _)| *placeholder)
        })
    }
}

fn overlaps(found: Range<usize>, span: &Range<usize>) -> bool {
    if found.is_empty() {
        span.start <= found.start && found.start <= span.end
    } else {
        found.start < span.end && span.start < found.end
    }
}

fn is_valid_name(name: &str) -> bool {
    let mut chars = name.chars();
    matches!(chars.next(), Some(c) if c.is_ascii_uppercase())
        && chars.all(|c| c.is_ascii_uppercase() || c.is_ascii_digit() || c == '_')
}

/// Applies an ordered, immutable set of [`RedactionRule`]s to text.
///
/// Rules run in declared order, each one scanning the output of the previous
/// one and replacing every non-overlapping match with its placeholder.
/// Construction rejects rule sets in which any pattern matches a placeholder,
/// alone or with a character or another placeholder next to it, and the
/// output of [`redact`](Self::redact) never contains a match of any rule.
/// Redacting already-redacted text therefore changes nothing.
///
/// Cloning a `Redactor` shares the compiled rules.
///
/// # Examples
///
/// ```
/// use consent_log::Redactor;
///
/// let redactor = Redactor::with_default_rules().unwrap();
///
/// let once = redactor.redact("reach me at jo@example.org or 555-123-4567");
/// assert_eq!(once, "reach me at [REDACTED_EMAIL] or [REDACTED_PHONE]");
/// assert_eq!(redactor.redact(&once), once);
/// ```
#[derive(Debug, Clone)]
pub struct Redactor {
    rules: Arc<[RedactionRule]>,
}

impl Redactor {
    /// Builds a redactor from rules in evaluation order.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::DuplicateRule`] if two rules share a name and
    /// [`ConfigError::PlaceholderCollision`] if a pattern matches a placeholder
    /// or reaches into one from the text around it.
    pub fn new(rules: Vec<RedactionRule>) -> Result<Self, ConfigError> {
        {
            let mut seen = HashSet::new();
            if let Some(dup) = rules.iter().find(|rule| !seen.insert(rule.name())) {
                return Err(ConfigError::DuplicateRule(dup.name().to_string()));
            }
        }

        let placeholders: Vec<&str> = rules
            .iter()
            .map(RedactionRule::placeholder)
            .chain(std::iter::once(FALLBACK_PLACEHOLDER))
            .collect();
        let surroundings = Surrounding::all(&placeholders);

        for rule in &rules {
            if let Some(placeholder) = surroundings.iter().find_map(|s| s.collision(rule)) {
                return Err(ConfigError::PlaceholderCollision {
                    rule: rule.name().to_string(),
                    placeholder: placeholder.to_string(),
                });
            }
        }

        Ok(Self {
            rules: rules.into(),
        })
    }

    /// Builds a redactor with the built-in EMAIL, PHONE and GPS rules.
    pub fn with_default_rules() -> Result<Self, ConfigError> {
        Self::new(RedactionRule::defaults()?)
    }

    /// The rules, in evaluation order.
    pub fn rules(&self) -> &[RedactionRule] {
        &self.rules
    }

    /// Replaces every match of every rule with that rule's placeholder.
    ///
    /// The result never contains a match of any rule. For rule sets where a
    /// later placeholder completes an earlier pattern (e.g. through a word
    /// boundary), the ordered pass is repeated until the text settles. If it
    /// has not settled after one pass per rule plus one, the whole text is
    /// replaced with `[REDACTED]`.
    pub fn redact(&self, text: &str) -> String {
        let mut current = self.pass(text);
        for _ in 0..self.rules.len() {
            if !self.matches_any(&current) {
                return current;
            }
            current = self.pass(&current);
        }

        if self.matches_any(&current) {
            tracing::warn!(rules = self.rules.len(), "redaction did not settle, dropping text");
            return FALLBACK_PLACEHOLDER.to_string();
        }
        current
    }

    fn pass(&self, text: &str) -> String {
        self.rules
            .iter()
            .fold(text.to_string(), |current, rule| rule.apply(&current))
    }

    fn matches_any(&self, text: &str) -> bool {
        self.rules.iter().any(|rule| rule.is_match(text))
    }

    /// Counts matches per rule without producing redacted text.
    ///
    /// Counts follow one ordered pass of [`redact`](Self::redact): each rule
    /// is counted against the output of the rules before it.
    /// Only rule names and counts are reported, never matched text.
    ///
    /// ```
    /// use consent_log::Redactor;
    ///
    /// let redactor = Redactor::with_default_rules().unwrap();
    /// let counts = redactor.scan("a@b.com, c@d.org");
    /// assert_eq!(counts, vec![("EMAIL", 2)]);
    /// ```
    pub fn scan(&self, text: &str) -> Vec<(&str, usize)> {
        let mut current = text.to_string();
        let mut counts = Vec::new();
        for rule in self.rules.iter() {
            let matches = rule.regex.find_iter(&current).count();
            if matches > 0 {
                counts.push((rule.name(), matches));
                current = rule.apply(&current);
            }
        }
        counts
    }
}

impl Sanitizer<String> for Redactor {
    fn sanitize(&self, input: Tainted<String>) -> Verified<String> {
        let raw = input.into_inner();
        if tracing::enabled!(tracing::Level::TRACE) {
            for (rule, matches) in self.scan(&raw) {
                tracing::trace!(rule, matches, "redacting matches");
            }
        }
        let redacted = self.redact(&raw);
        drop(raw);
        Verified::new_unchecked(redacted)
    }
}
