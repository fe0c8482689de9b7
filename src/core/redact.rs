use std::fmt;

// ---------------------------------------------------------------------------
// Sensitive field redaction
// ---------------------------------------------------------------------------

/// A wrapper that redacts its contents when displayed or debug-printed.
///
/// Usage:
/// ```ignore
/// let token = Redacted::new(session_token);
/// tracing::info!(token = %token, "session issued"); // logs: token=[REDACTED]
/// ```
#[derive(Clone)]
pub struct Redacted<T>(T);

impl<T> Redacted<T> {
    pub fn new(value: T) -> Self {
        Self(value)
    }
}

impl<T> fmt::Display for Redacted<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "[REDACTED]")
    }
}

impl<T> fmt::Debug for Redacted<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "[REDACTED]")
    }
}

/// Redact a session token for logging: show only the prefix + first chars.
pub fn redact_token(token: &str) -> String {
    if token.len() <= 4 {
        return "****".to_string();
    }
    let visible = &token[..token.len().min(6)];
    format!("{}***", visible)
}
