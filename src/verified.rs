/// Text that has passed through the crate's redaction or notice path.
///
/// `Verified<T>` is the only type a [`LineSink`](crate::LineSink) accepts.
/// It cannot be constructed outside this crate, so anything a sink sees was
/// produced either by a [`Sanitizer`](crate::Sanitizer) or by the pipeline's
/// own line formatter working on already-sanitized parts.
///
/// # Construction Invariants
///
/// There are no public constructors and no `From<T>` implementations.
/// Construction goes through `new_unchecked`, which is `pub(crate)`.
///
/// ```compile_fail
/// use consent_log::Verified;
///
/// // This will not compile - no public constructor:
/// let verified = Verified::new("data".to_string());
/// ```
///
/// # Access
///
/// - [`AsRef::as_ref`]: borrow the value
/// - [`as_str`](Verified::as_str): borrow verified text as `&str`
/// - [`into_inner`](Self::into_inner): consume and extract it
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Verified<T> {
    inner: T,
}

impl<T> Verified<T> {
    /// Wraps a value without checking it.
    ///
    /// Callers inside the crate must only pass values that are already
    /// redacted or that were composed exclusively from non-message parts.
    pub(crate) fn new_unchecked(value: T) -> Self {
        Self { inner: value }
    }

    /// Consumes the wrapper and returns the inner value.
    pub fn into_inner(self) -> T {
        self.inner
    }
}

impl<T> AsRef<T> for Verified<T> {
    fn as_ref(&self) -> &T {
        &self.inner
    }
}

impl Verified<String> {
    /// Borrows the verified text.
    pub fn as_str(&self) -> &str {
        &self.inner
    }
}
