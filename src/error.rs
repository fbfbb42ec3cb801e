//! Error types for Redraft
//!
//! Centralized error handling using thiserror.

use thiserror::Error;

use crate::llm::GenerationError;

/// All error types that can occur in Redraft
#[derive(Debug, Error)]
pub enum RedraftError {
    /// Session not found in the store
    #[error("Session not found: {0}")]
    SessionNotFound(String),

    /// Invalid configuration or state for the requested operation
    #[error("Invalid state: {0}")]
    InvalidState(String),

    /// The generation call failed or produced unusable output
    #[error("Generation error: {0}")]
    Generation(#[from] GenerationError),

    /// Human feedback channel failed (closed stdin, broken pipe)
    #[error("External input error: {0}")]
    ExternalInput(String),

    /// Session store error
    #[error("Storage error: {0}")]
    Storage(String),

    /// Metric probe error
    #[error("Probe error: {0}")]
    Probe(String),

    /// IO error
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// JSON serialization/deserialization error
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// SQLite error from the persistent session store
    #[error("SQLite error: {0}")]
    Sqlite(#[from] rusqlite::Error),
}

/// Result type alias for Redraft operations
pub type Result<T> = std::result::Result<T, RedraftError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_session_not_found_error() {
        let err = RedraftError::SessionNotFound("draft-001".to_string());
        assert_eq!(err.to_string(), "Session not found: draft-001");
    }

    #[test]
    fn test_invalid_state_error() {
        let err = RedraftError::InvalidState("max_iterations must be > 0".to_string());
        assert_eq!(err.to_string(), "Invalid state: max_iterations must be > 0");
    }

    #[test]
    fn test_external_input_error() {
        let err = RedraftError::ExternalInput("stdin closed".to_string());
        assert_eq!(err.to_string(), "External input error: stdin closed");
    }

    #[test]
    fn test_storage_error() {
        let err = RedraftError::Storage("sessions table missing".to_string());
        assert_eq!(err.to_string(), "Storage error: sessions table missing");
    }

    #[test]
    fn test_generation_error_conversion() {
        let gen_err = GenerationError::EmptyOutput;
        let err: RedraftError = gen_err.into();
        assert!(matches!(err, RedraftError::Generation(_)));
        assert!(err.to_string().contains("empty output"));
    }

    #[test]
    fn test_io_error_conversion() {
        let io_err = std::io::Error::new(std::io::ErrorKind::NotFound, "file not found");
        let err: RedraftError = io_err.into();
        assert!(matches!(err, RedraftError::Io(_)));
        assert!(err.to_string().contains("file not found"));
    }

    #[test]
    fn test_json_error_conversion() {
        let json_err = serde_json::from_str::<serde_json::Value>("invalid").unwrap_err();
        let err: RedraftError = json_err.into();
        assert!(matches!(err, RedraftError::Json(_)));
    }

    #[test]
    fn test_result_type_alias() {
        fn returns_ok() -> Result<i32> {
            Ok(42)
        }

        fn returns_err() -> Result<i32> {
            Err(RedraftError::InvalidState("test".to_string()))
        }

        assert!(returns_ok().is_ok());
        assert!(returns_err().is_err());
    }
}
