use std::fmt;

/// A raw log message that has not been redacted yet.
///
/// `Tainted<T>` marks caller-supplied message text on its way into the
/// pipeline. The wrapped value has no public accessor: the only way out is a
/// crate-internal [`Sanitizer`](crate::Sanitizer), which turns it into a
/// [`Verified<T>`](crate::Verified) that sinks accept.
///
/// # Security Properties
///
/// - Does NOT implement `Deref`, `AsRef`, `Display` or any conversion into `T`
/// - `Debug` never shows the inner value, so a stray `{:?}` cannot leak it
/// - Dropping a `Tainted` is the only other thing callers can do with it
///
/// # Examples
///
/// ```
/// use consent_log::Tainted;
///
/// let raw = Tainted::new("call me at 555-123-4567".to_string());
///
/// let debug = format!("{:?}", raw);
/// assert!(!debug.contains("555"));
///
/// // No way to read the text back out:
/// // let s: &String = raw.as_ref(); // Won't compile!
/// ```
// Do NOT add Clone: a copy of the raw message is one more place it can escape from.
pub struct Tainted<T> {
    // Must remain private; external code goes through Sanitizer.
    inner: T,
}

impl<T> Tainted<T> {
    /// Wraps a raw, unredacted value.
    pub fn new(value: T) -> Self {
        Self { inner: value }
    }

    /// Extracts the inner value for sanitization.
    ///
    /// Crate-internal: only sanitizer implementations that wrap
    /// their output in `Verified<T>` may call this.
    pub(crate) fn into_inner(self) -> T {
        self.inner
    }
}

impl<T> fmt::Debug for Tainted<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("Tainted(..)")
    }
}

impl From<&str> for Tainted<String> {
    fn from(value: &str) -> Self {
        Self::new(value.to_string())
    }
}

impl From<String> for Tainted<String> {
    fn from(value: String) -> Self {
        Self::new(value)
    }
}
