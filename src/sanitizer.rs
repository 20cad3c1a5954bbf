use crate::{Tainted, Verified};

/// Turns raw values into values that sinks may receive.
///
/// # Invariants
///
/// Implementations MUST:
/// - Remove or replace every part of the input their policy considers sensitive
/// - Only call `Verified::new_unchecked` on the processed value
/// - Not fail: a sanitizer that cannot process a value must still return a safe one
///
/// Because `Tainted::into_inner` is crate-internal, only this crate can
/// provide implementations that actually read the raw value.
///
/// # Examples
///
/// ```
/// use consent_log::{Redactor, Sanitizer, Tainted};
///
/// let redactor = Redactor::with_default_rules().unwrap();
/// let verified = redactor.sanitize(Tainted::new("mail a@b.com".to_string()));
///
/// assert_eq!(verified.as_str(), "mail [REDACTED_EMAIL]");
/// ```
pub trait Sanitizer<T> {
    /// Processes a raw value into a verified one.
    fn sanitize(&self, input: Tainted<T>) -> Verified<T>;
}

#[cfg(test)]
mod tests {
    use super::*;

    struct Uppercase;

    impl Sanitizer<String> for Uppercase {
        fn sanitize(&self, input: Tainted<String>) -> Verified<String> {
            Verified::new_unchecked(input.into_inner().to_uppercase())
        }
    }

    #[test]
    fn sanitizer_output_is_verified() {
        let verified = Uppercase.sanitize(Tainted::new("abc".to_string()));
        assert_eq!(verified.into_inner(), "ABC");
    }
}
