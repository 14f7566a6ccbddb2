//! Error types for a3s-nakadi

use thiserror::Error;

/// Errors that can occur while publishing events
#[derive(Debug, Error)]
pub enum PublishError {
    /// Caller misuse detected before any network call
    #[error("Invalid argument: {0}")]
    InvalidArgument(String),

    /// Local precondition failure (e.g. an empty batch)
    #[error("{title}{}", detail_suffix(.detail))]
    LocalProblem { title: String, detail: String },

    /// Connection-level failure talking to the broker
    #[error("Transport error sending to '{url}': {reason}")]
    Transport { url: String, reason: String },

    /// Request did not complete in time
    #[error("Request to '{url}' timed out")]
    Timeout { url: String },

    /// Base address or event-type name could not form a valid URI
    #[error("Invalid URI: {0}")]
    Uri(String),

    /// Serialization/deserialization failure
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    /// Configuration error
    #[error("Configuration error: {0}")]
    Config(String),
}

impl PublishError {
    /// Build a local problem with a title and optional detail
    pub fn local_problem(title: impl Into<String>, detail: impl Into<String>) -> Self {
        Self::LocalProblem {
            title: title.into(),
            detail: detail.into(),
        }
    }

    /// Whether a retry policy may attempt the operation again
    pub fn is_transient(&self) -> bool {
        matches!(self, Self::Transport { .. } | Self::Timeout { .. })
    }
}

fn detail_suffix(detail: &str) -> String {
    if detail.is_empty() {
        String::new()
    } else {
        format!(": {}", detail)
    }
}

/// Result type alias for publish operations
pub type Result<T> = std::result::Result<T, PublishError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_local_problem_display() {
        let err = PublishError::local_problem("event send called with zero events", "");
        assert_eq!(err.to_string(), "event send called with zero events");

        let err = PublishError::local_problem("bad batch", "mixed event types");
        assert_eq!(err.to_string(), "bad batch: mixed event types");
    }

    #[test]
    fn test_transient_classification() {
        assert!(PublishError::Timeout { url: "http://x".into() }.is_transient());
        assert!(PublishError::Transport {
            url: "http://x".into(),
            reason: "connection refused".into(),
        }
        .is_transient());
        assert!(!PublishError::InvalidArgument("name".into()).is_transient());
        assert!(!PublishError::Config("bad".into()).is_transient());
    }
}
