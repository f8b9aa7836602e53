//! Error types for EchecEtMatch.

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// A shared error type for the whole workspace.
///
/// Store failures, malformed documents, validation failures and
/// configuration problems are all reported through this type.
#[derive(Error, Debug, Clone, Serialize, Deserialize)]
pub enum EchecError {
    /// Entity not found error with type information
    #[error("Entity not found: {entity_type} '{id}'")]
    NotFound {
        entity_type: &'static str,
        id: String,
    },

    /// The store rejected a query or lookup (permission, connectivity).
    #[error("Data access error: {0}")]
    DataAccess(String),

    /// A conversation document whose participants cannot be resolved
    /// against the signed-in user.
    #[error("Malformed conversation '{conversation_id}': {reason}")]
    MalformedRecord {
        conversation_id: String,
        reason: String,
    },

    /// Input rejected before reaching the store
    #[error("Validation error: {0}")]
    Validation(String),

    /// IO error (file system operations)
    #[error("IO error: {message}")]
    Io { message: String },

    /// Serialization/deserialization error
    #[error("Serialization error: {format} - {message}")]
    Serialization {
        format: String, // "TOML", "JSON"
        message: String,
    },

    /// Configuration error
    #[error("Configuration error: {0}")]
    Config(String),

    /// Internal error (should not happen in normal operation)
    #[error("Internal error: {0}")]
    Internal(String),
}

impl EchecError {
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

    /// Creates a DataAccess error
    pub fn data_access(message: impl Into<String>) -> Self {
        Self::DataAccess(message.into())
    }

    /// Creates a MalformedRecord error
    pub fn malformed(conversation_id: impl Into<String>, reason: impl Into<String>) -> Self {
        Self::MalformedRecord {
            conversation_id: conversation_id.into(),
            reason: reason.into(),
        }
    }

    /// Creates a Validation error
    pub fn validation(message: impl Into<String>) -> Self {
        Self::Validation(message.into())
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

    /// Creates an Internal error
    pub fn internal(message: impl Into<String>) -> Self {
        Self::Internal(message.into())
    }

    // ============================================================================
    // Type checking methods
    // ============================================================================

    /// Check if this is a NotFound error
    pub fn is_not_found(&self) -> bool {
        matches!(self, Self::NotFound { .. })
    }

    /// Check if this is a store rejection
    pub fn is_data_access(&self) -> bool {
        matches!(self, Self::DataAccess(_))
    }

    /// Check if this is a malformed conversation record
    pub fn is_malformed(&self) -> bool {
        matches!(self, Self::MalformedRecord { .. })
    }

    /// Check if this is a validation error
    pub fn is_validation(&self) -> bool {
        matches!(self, Self::Validation(_))
    }

    /// Whether retrying the same operation later can succeed.
    ///
    /// Store rejections and IO failures are transient from the caller's point
    /// of view; everything else needs different input.
    pub fn is_retryable(&self) -> bool {
        matches!(self, Self::DataAccess(_) | Self::Io { .. })
    }
}

// ============================================================================
// From implementations for automatic conversion
// ============================================================================

impl From<std::io::Error> for EchecError {
    fn from(err: std::io::Error) -> Self {
        Self::Io {
            message: format!("{} (kind: {:?})", err, err.kind()),
        }
    }
}

impl From<serde_json::Error> for EchecError {
    fn from(err: serde_json::Error) -> Self {
        Self::Serialization {
            format: "JSON".to_string(),
            message: err.to_string(),
        }
    }
}

impl From<toml::de::Error> for EchecError {
    fn from(err: toml::de::Error) -> Self {
        Self::Serialization {
            format: "TOML".to_string(),
            message: err.to_string(),
        }
    }
}

impl From<toml::ser::Error> for EchecError {
    fn from(err: toml::ser::Error) -> Self {
        Self::Serialization {
            format: "TOML".to_string(),
            message: err.to_string(),
        }
    }
}

/// A type alias for `Result<T, EchecError>`.
pub type Result<T> = std::result::Result<T, EchecError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_not_found_message() {
        let err = EchecError::not_found("UserDocument", "u-1");
        assert!(err.is_not_found());
        assert_eq!(err.to_string(), "Entity not found: UserDocument 'u-1'");
    }

    #[test]
    fn test_retryable_classification() {
        assert!(EchecError::data_access("permission denied").is_retryable());
        assert!(EchecError::io("disk gone").is_retryable());
        assert!(!EchecError::validation("too many games").is_retryable());
        assert!(!EchecError::malformed("c1", "no counterpart").is_retryable());
    }

    #[test]
    fn test_from_json_error() {
        let json_err = serde_json::from_str::<serde_json::Value>("{not json").unwrap_err();
        let err: EchecError = json_err.into();
        match err {
            EchecError::Serialization { format, .. } => assert_eq!(format, "JSON"),
            other => panic!("unexpected error: {other:?}"),
        }
    }
}
