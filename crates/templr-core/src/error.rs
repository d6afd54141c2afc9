//! Error types for the Templr client layer.

use std::time::Duration;
use thiserror::Error;

use crate::session::AuthError;

/// Which deadline expired when an operation reports [`TemplrError::Timeout`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TimeoutKind {
    /// The transfer never reported progress within the start window.
    ///
    /// This usually means the storage bucket rejects cross-origin requests or
    /// the client is misconfigured, rather than a slow network.
    NeverStarted,
    /// The overall operation deadline expired.
    Deadline,
}

impl std::fmt::Display for TimeoutKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            TimeoutKind::NeverStarted => write!(f, "transfer never started"),
            TimeoutKind::Deadline => write!(f, "deadline exceeded"),
        }
    }
}

/// A shared error type for the whole Templr client layer.
///
/// Every failure reaches the immediate caller as one of these variants. The
/// upload variants (`Unauthorized`, `Canceled`, `RetryExhausted`, `Unknown`)
/// mirror the classification reported by the blob store.
#[derive(Error, Debug, Clone)]
pub enum TemplrError {
    /// Identity provider rejected the request (credentials, duplicate account, network).
    #[error(transparent)]
    Auth(#[from] AuthError),

    /// The operation requires a signed-in session and none is present.
    #[error("Sign in required: {0}")]
    SignInRequired(String),

    /// Input rejected before any network call (e.g. zero-byte file).
    #[error("Invalid input: {0}")]
    InvalidInput(String),

    /// Malformed listing data rejected at the mutator boundary.
    #[error("Validation error: {0}")]
    Validation(String),

    /// An operation did not finish (or start) in time.
    #[error("Timed out ({kind}) after {}s: {message}", .after.as_secs())]
    Timeout {
        kind: TimeoutKind,
        after: Duration,
        message: String,
    },

    /// The storage provider refused the principal.
    #[error("Permission denied: {0}")]
    Unauthorized(String),

    /// The transfer was explicitly canceled.
    #[error("Upload was canceled")]
    Canceled,

    /// The transport gave up after its own retry budget.
    #[error("Upload failed, retry limit exceeded: {0}")]
    RetryExhausted(String),

    /// Any other provider failure, with the original code kept for diagnostics.
    #[error("Upload failed ({code}): {message}")]
    Unknown { code: String, message: String },

    /// Entity not found error with type information
    #[error("Entity not found: {entity_type} '{id}'")]
    NotFound {
        entity_type: &'static str,
        id: String,
    },

    /// The active session may not perform the action under the configured policy.
    #[error("Forbidden: {0}")]
    Forbidden(String),

    /// A moderation transition not allowed by the listing state machine.
    #[error("Invalid transition for listing '{id}': {from} -> {to}")]
    InvalidTransition {
        id: String,
        from: String,
        to: String,
    },

    /// Data access error (document store layer)
    #[error("Data access error: {0}")]
    DataAccess(String),

    /// IO error (local persistence)
    #[error("IO error: {message}")]
    Io { message: String },

    /// Serialization/deserialization error
    #[error("Serialization error: {format} - {message}")]
    Serialization { format: String, message: String },

    /// Configuration error
    #[error("Configuration error: {0}")]
    Config(String),
}

impl TemplrError {
    // ============================================================================
    // Constructor helpers
    // ============================================================================

    /// Creates a NotFound error
    pub fn not_found(entity_type: &'static str, id: impl Into<String>) -> Self {
        Self::NotFound {
            entity_type,
            id: id.into(),
        }
    }

    pub fn invalid_input(message: impl Into<String>) -> Self {
        Self::InvalidInput(message.into())
    }

    pub fn validation(message: impl Into<String>) -> Self {
        Self::Validation(message.into())
    }

    pub fn timeout(kind: TimeoutKind, after: Duration, message: impl Into<String>) -> Self {
        Self::Timeout {
            kind,
            after,
            message: message.into(),
        }
    }

    pub fn unknown(code: impl Into<String>, message: impl Into<String>) -> Self {
        Self::Unknown {
            code: code.into(),
            message: message.into(),
        }
    }

    /// Creates a DataAccess error
    pub fn data_access(message: impl Into<String>) -> Self {
        Self::DataAccess(message.into())
    }

    /// Creates an IO error
    pub fn io(message: impl Into<String>) -> Self {
        Self::Io {
            message: message.into(),
        }
    }

    /// Creates a Config error
    pub fn config(message: impl Into<String>) -> Self {
        Self::Config(message.into())
    }

    // ============================================================================
    // Type checking methods
    // ============================================================================

    pub fn is_auth(&self) -> bool {
        matches!(self, Self::Auth(_))
    }

    pub fn is_invalid_input(&self) -> bool {
        matches!(self, Self::InvalidInput(_))
    }

    pub fn is_validation(&self) -> bool {
        matches!(self, Self::Validation(_))
    }

    pub fn is_timeout(&self) -> bool {
        matches!(self, Self::Timeout { .. })
    }

    /// Returns the timeout kind if this is a timeout.
    pub fn timeout_kind(&self) -> Option<TimeoutKind> {
        match self {
            Self::Timeout { kind, .. } => Some(*kind),
            _ => None,
        }
    }

    /// Check if this is a NotFound error
    pub fn is_not_found(&self) -> bool {
        matches!(self, Self::NotFound { .. })
    }

    /// True for failures that end an upload attempt but that the user may
    /// retry by hand (timeouts and every provider-reported upload failure).
    pub fn is_upload_failure(&self) -> bool {
        matches!(
            self,
            Self::Timeout { .. }
                | Self::Unauthorized(_)
                | Self::Canceled
                | Self::RetryExhausted(_)
                | Self::Unknown { .. }
        )
    }
}

// ============================================================================
// From implementations for automatic conversion
// ============================================================================

impl From<std::io::Error> for TemplrError {
    fn from(err: std::io::Error) -> Self {
        Self::Io {
            message: format!("{} (kind: {:?})", err, err.kind()),
        }
    }
}

impl From<serde_json::Error> for TemplrError {
    fn from(err: serde_json::Error) -> Self {
        Self::Serialization {
            format: "JSON".to_string(),
            message: err.to_string(),
        }
    }
}

impl From<toml::de::Error> for TemplrError {
    fn from(err: toml::de::Error) -> Self {
        Self::Serialization {
            format: "TOML".to_string(),
            message: err.to_string(),
        }
    }
}

impl From<toml::ser::Error> for TemplrError {
    fn from(err: toml::ser::Error) -> Self {
        Self::Serialization {
            format: "TOML".to_string(),
            message: err.to_string(),
        }
    }
}

/// A type alias for `Result<T, TemplrError>`.
pub type Result<T> = std::result::Result<T, TemplrError>;

#[cfg(test)]
mod tests {
    use super::*;
    use crate::session::AuthErrorKind;

    #[test]
    fn test_auth_error_is_transparent() {
        let err: TemplrError =
            AuthError::new(AuthErrorKind::InvalidCredentials, "wrong password").into();
        assert!(err.is_auth());
        assert_eq!(err.to_string(), "Invalid credentials: wrong password");
    }

    #[test]
    fn test_timeout_kind_accessor() {
        let err = TemplrError::timeout(
            TimeoutKind::NeverStarted,
            Duration::from_secs(20),
            "no progress",
        );
        assert_eq!(err.timeout_kind(), Some(TimeoutKind::NeverStarted));
        assert!(err.is_upload_failure());
        assert!(err.to_string().contains("20s"));
    }

    #[test]
    fn test_upload_failure_excludes_input_errors() {
        assert!(!TemplrError::invalid_input("empty").is_upload_failure());
        assert!(TemplrError::Canceled.is_upload_failure());
    }
}
