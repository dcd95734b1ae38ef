//! Redaction marker for secret values.
//!
//! Placeholder values (bot tokens, API keys) substituted into the effective
//! configuration must never end up in logs or error text.

use std::fmt;

const REDACTED: &str = "***REDACTED***";

/// A value that formats as `***REDACTED***`
///
/// # Example
///
/// ```
/// use conflow_core_types::Sensitive;
///
/// let token = Sensitive::new("123456:bot-token");
/// assert_eq!(format!("{:?}", token), "***REDACTED***");
/// assert_eq!(token.expose(), &"123456:bot-token");
/// ```
#[derive(Clone, Default)]
pub struct Sensitive<T>(T);

impl<T> Sensitive<T> {
    pub fn new(value: T) -> Self {
        Self(value)
    }

    /// Borrow the secret. Callers must not log the result.
    pub fn expose(&self) -> &T {
        &self.0
    }
}

impl<T> fmt::Debug for Sensitive<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(REDACTED)
    }
}

impl<T> fmt::Display for Sensitive<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(REDACTED)
    }
}
