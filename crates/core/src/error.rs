//! Error types for s3desk-core
//!
//! Two families matter to callers: validation failures, which are detected
//! before any provider call is made, and storage failures reported by the
//! provider. Configuration and IO errors only occur at startup.

use thiserror::Error;

/// Result type alias for s3desk-core operations
pub type Result<T> = std::result::Result<T, Error>;

/// Coarse classification of a provider failure
///
/// Purely informational: no operation retries or branches on it.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StorageErrorKind {
    /// Bucket or key does not exist
    NotFound,
    /// Credentials rejected or permission missing
    AccessDenied,
    /// Bucket already exists, bucket not empty, etc.
    Conflict,
    /// Request never reached the provider or timed out
    Network,
    /// Anything else
    Other,
}

impl StorageErrorKind {
    /// Short label used in log fields
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::NotFound => "not_found",
            Self::AccessDenied => "access_denied",
            Self::Conflict => "conflict",
            Self::Network => "network",
            Self::Other => "other",
        }
    }
}

impl std::fmt::Display for StorageErrorKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Error types for s3desk-core operations
#[derive(Error, Debug)]
pub enum Error {
    /// Rejected input; no provider call was made
    #[error("{0}")]
    Validation(String),

    /// Failure reported by the storage provider
    #[error("{message}")]
    Storage {
        /// Name of the provider operation, e.g. "delete_objects"
        operation: &'static str,
        /// Classification of the failure
        kind: StorageErrorKind,
        /// Provider message
        message: String,
    },

    /// Configuration file error
    #[error("Configuration error: {0}")]
    Config(String),

    /// IO error
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// TOML parsing error
    #[error("TOML parse error: {0}")]
    TomlParse(#[from] toml::de::Error),
}

impl Error {
    /// Build a storage error
    pub fn storage(
        operation: &'static str,
        kind: StorageErrorKind,
        message: impl Into<String>,
    ) -> Self {
        Error::Storage {
            operation,
            kind,
            message: message.into(),
        }
    }

    /// Build a validation error
    pub fn validation(message: impl Into<String>) -> Self {
        Error::Validation(message.into())
    }

    /// Provider classification, if this is a storage error
    pub const fn storage_kind(&self) -> Option<StorageErrorKind> {
        match self {
            Error::Storage { kind, .. } => Some(*kind),
            _ => None,
        }
    }

    /// Whether the provider reported a missing bucket or key
    pub fn is_not_found(&self) -> bool {
        self.storage_kind() == Some(StorageErrorKind::NotFound)
    }

    /// Whether the input was rejected before reaching the provider
    pub const fn is_validation(&self) -> bool {
        matches!(self, Error::Validation(_))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_storage_error_display() {
        let err = Error::storage("copy_object", StorageErrorKind::NotFound, "NoSuchKey");
        assert_eq!(err.to_string(), "NoSuchKey");
        assert!(err.is_not_found());
        assert!(!err.is_validation());
    }

    #[test]
    fn test_validation_error_display() {
        let err = Error::validation("Folder name required");
        assert_eq!(err.to_string(), "Folder name required");
        assert!(err.is_validation());
        assert_eq!(err.storage_kind(), None);
    }

    #[test]
    fn test_storage_kind_labels() {
        assert_eq!(StorageErrorKind::AccessDenied.to_string(), "access_denied");
        assert_eq!(StorageErrorKind::Conflict.as_str(), "conflict");
        assert_eq!(StorageErrorKind::Network.as_str(), "network");
    }
}
