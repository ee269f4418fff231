//! Error types for autosave operations.

use thiserror::Error;

/// Errors reported by a [`SaveExecutor`](crate::SaveExecutor) when pushing a
/// snapshot to the server fails.
///
/// The two variants drive different retry behavior in the controller:
/// transient failures are worth retrying with the same payload, rejections
/// are not until the user edits the form or re-authenticates. Either way the
/// snapshot stays backed up locally, so no work is lost.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum SaveError {
    /// Network failure, timeout, or server-side 5xx.
    ///
    /// Recoverable; the next edit or manual flush retries the same payload.
    #[error("transient save failure: {message}")]
    Transient {
        /// Description of the failure
        message: String,
    },

    /// Validation, permission, or authentication rejection.
    ///
    /// Retrying the identical payload would fail again; the error is surfaced
    /// to the UI and the local backup is kept intact.
    #[error("save rejected by the server: {message}")]
    Rejected {
        /// Description of the rejection
        message: String,
    },
}

impl SaveError {
    /// Create a transient save error with a message.
    pub fn transient(message: impl Into<String>) -> Self {
        Self::Transient {
            message: message.into(),
        }
    }

    /// Create a rejected save error with a message.
    pub fn rejected(message: impl Into<String>) -> Self {
        Self::Rejected {
            message: message.into(),
        }
    }

    /// Whether retrying the same payload is likely to succeed.
    pub fn is_transient(&self) -> bool {
        matches!(self, Self::Transient { .. })
    }

    /// The human-readable message carried by this error.
    pub fn message(&self) -> &str {
        match self {
            Self::Transient { message } | Self::Rejected { message } => message,
        }
    }
}

/// Errors that can occur when reading or writing the draft backup store.
///
/// These never reach the hosting UI: the typed backup layer logs them and
/// degrades that cycle to network-only autosave. Losing the local safety net
/// is preferable to blocking data entry.
#[derive(Error, Debug)]
pub enum StorageError {
    /// The storage backend is not available (e.g. no browser storage).
    #[error("backup storage unavailable: {0}")]
    Unavailable(String),

    /// I/O error from a file-backed store.
    #[error("backup I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// JSON serialization or deserialization error.
    #[error("backup serialization error: {0}")]
    Serde(#[from] serde_json::Error),

    /// The backend refused the write (quota exceeded, permission denied).
    #[error("backup write refused: {0}")]
    WriteRefused(String),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_transient_is_retryable() {
        assert!(SaveError::transient("connection reset").is_transient());
        assert!(!SaveError::rejected("field 'title' is required").is_transient());
    }

    #[test]
    fn test_message_accessor() {
        let err = SaveError::rejected("session expired");
        assert_eq!(err.message(), "session expired");
        assert_eq!(err.to_string(), "save rejected by the server: session expired");
    }
}
