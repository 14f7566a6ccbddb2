//! Authorization scopes and token providers
//!
//! Token acquisition itself lives outside this crate; a `TokenProvider`
//! only hands back the `Authorization` header value for a scope.

use std::collections::HashMap;

/// Default scope presented when submitting events
pub const EVENT_STREAM_WRITE: &str = "nakadi.event_stream.write";

/// Scope for reading from event streams
pub const EVENT_STREAM_READ: &str = "nakadi.event_stream.read";

/// Pick the caller's scope if one was given, else the fallback
pub fn resolve_scope(requested: Option<&str>, fallback: &str) -> String {
    requested.unwrap_or(fallback).to_string()
}

/// A string wrapper that redacts its value in Debug and Display output.
#[derive(Clone, Default, PartialEq, Eq)]
pub struct SecretString(String);

impl SecretString {
    pub fn new(s: impl Into<String>) -> Self {
        Self(s.into())
    }

    /// Access the secret value (only for HTTP headers)
    pub fn expose(&self) -> &str {
        &self.0
    }
}

impl std::fmt::Debug for SecretString {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "[REDACTED]")
    }
}

impl std::fmt::Display for SecretString {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "[REDACTED]")
    }
}

impl From<String> for SecretString {
    fn from(s: String) -> Self {
        Self(s)
    }
}

impl From<&str> for SecretString {
    fn from(s: &str) -> Self {
        Self(s.to_string())
    }
}

/// Supplies the `Authorization` header value for a scope
pub trait TokenProvider: Send + Sync {
    /// Header value (e.g. `Bearer abc`), or `None` to send no header
    fn authorization(&self, scope: &str) -> Option<SecretString>;
}

/// Presents the same bearer token for every scope
#[derive(Debug, Clone)]
pub struct StaticTokenProvider {
    token: SecretString,
}

impl StaticTokenProvider {
    pub fn new(token: impl Into<SecretString>) -> Self {
        Self {
            token: token.into(),
        }
    }
}

impl TokenProvider for StaticTokenProvider {
    fn authorization(&self, _scope: &str) -> Option<SecretString> {
        Some(SecretString::new(format!("Bearer {}", self.token.expose())))
    }
}

/// Presents a bearer token chosen by scope
#[derive(Debug, Clone, Default)]
pub struct ScopedTokenProvider {
    tokens: HashMap<String, SecretString>,
    fallback: Option<SecretString>,
}

impl ScopedTokenProvider {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a token for one scope
    pub fn with_scope(mut self, scope: impl Into<String>, token: impl Into<SecretString>) -> Self {
        self.tokens.insert(scope.into(), token.into());
        self
    }

    /// Token used when no scope-specific token is registered
    pub fn with_fallback(mut self, token: impl Into<SecretString>) -> Self {
        self.fallback = Some(token.into());
        self
    }
}

impl TokenProvider for ScopedTokenProvider {
    fn authorization(&self, scope: &str) -> Option<SecretString> {
        self.tokens
            .get(scope)
            .or(self.fallback.as_ref())
            .map(|token| SecretString::new(format!("Bearer {}", token.expose())))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_resolve_scope() {
        assert_eq!(resolve_scope(None, EVENT_STREAM_WRITE), EVENT_STREAM_WRITE);
        assert_eq!(resolve_scope(Some("custom.write"), EVENT_STREAM_WRITE), "custom.write");
    }

    #[test]
    fn test_secret_redacted() {
        let secret = SecretString::new("s3cr3t");
        assert_eq!(format!("{:?}", secret), "[REDACTED]");
        assert_eq!(format!("{}", secret), "[REDACTED]");
        assert_eq!(secret.expose(), "s3cr3t");
    }

    #[test]
    fn test_static_provider_ignores_scope() {
        let provider = StaticTokenProvider::new("abc");
        let a = provider.authorization(EVENT_STREAM_WRITE).unwrap();
        let b = provider.authorization("other").unwrap();
        assert_eq!(a.expose(), "Bearer abc");
        assert_eq!(a, b);
    }

    #[test]
    fn test_scoped_provider() {
        let provider = ScopedTokenProvider::new()
            .with_scope(EVENT_STREAM_WRITE, "writer")
            .with_scope("admin", "root");

        assert_eq!(
            provider.authorization(EVENT_STREAM_WRITE).unwrap().expose(),
            "Bearer writer"
        );
        assert_eq!(provider.authorization("admin").unwrap().expose(), "Bearer root");
        assert!(provider.authorization(EVENT_STREAM_READ).is_none());

        let provider = provider.with_fallback("anyone");
        assert_eq!(
            provider.authorization(EVENT_STREAM_READ).unwrap().expose(),
            "Bearer anyone"
        );
    }
}
