//! Error types for the Patient Risk Agent
//!
//! [`AssessmentError`] is the top-level error of a CLI run. Client-layer
//! failures arrive as [`ClientError`] and are wrapped here.

use thiserror::Error;

use crate::client::ClientError;
use crate::telemetry::TelemetryError;

/// Main error type for assessment runs
#[derive(Error, Debug)]
pub enum AssessmentError {
    /// Every page failed or came back empty
    #[error("No patient records were fetched; nothing to assess")]
    NoRecords,

    /// The submission endpoint rejected the result or never answered
    #[error("Submission failed: {0}")]
    Submit(#[source] ClientError),

    /// Invalid configuration or arguments
    #[error("Configuration error: {0}")]
    Config(String),

    /// File access or I/O error
    #[error("File error: {0}")]
    File(String),

    /// Input file could not be parsed
    #[error("Parse error: {0}")]
    Parse(String),

    /// Output could not be serialized
    #[error("Serialization error: {0}")]
    Serialization(String),

    #[error("Telemetry error: {0}")]
    Telemetry(#[from] TelemetryError),

    #[error("Internal error: {0}")]
    Internal(String),
}

impl AssessmentError {
    pub fn config(msg: impl Into<String>) -> Self {
        AssessmentError::Config(msg.into())
    }

    pub fn file(msg: impl Into<String>) -> Self {
        AssessmentError::File(msg.into())
    }

    pub fn parse(msg: impl Into<String>) -> Self {
        AssessmentError::Parse(msg.into())
    }

    /// Check if this is a user-facing error (vs internal)
    pub fn is_user_error(&self) -> bool {
        matches!(
            self,
            AssessmentError::Config(_) | AssessmentError::File(_) | AssessmentError::Parse(_)
        )
    }
}

impl From<ClientError> for AssessmentError {
    fn from(err: ClientError) -> Self {
        match err {
            ClientError::Configuration(msg) => AssessmentError::Config(msg),
            other => AssessmentError::Submit(other),
        }
    }
}

impl From<std::io::Error> for AssessmentError {
    fn from(err: std::io::Error) -> Self {
        AssessmentError::File(err.to_string())
    }
}

impl From<serde_json::Error> for AssessmentError {
    fn from(err: serde_json::Error) -> Self {
        AssessmentError::Parse(format!("JSON error: {}", err))
    }
}

impl From<serde_yaml::Error> for AssessmentError {
    fn from(err: serde_yaml::Error) -> Self {
        AssessmentError::Parse(format!("YAML error: {}", err))
    }
}

pub type Result<T> = std::result::Result<T, AssessmentError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_display() {
        assert_eq!(
            AssessmentError::NoRecords.to_string(),
            "No patient records were fetched; nothing to assess"
        );
        let err = AssessmentError::Submit(ClientError::RateLimitExceeded {
            attempts: 9,
            message: "slow down".to_string(),
        });
        assert!(err.to_string().starts_with("Submission failed: Rate limit retries exhausted"));
    }

    #[test]
    fn test_is_user_error() {
        assert!(AssessmentError::config("x").is_user_error());
        assert!(AssessmentError::file("x").is_user_error());
        assert!(AssessmentError::parse("x").is_user_error());
        assert!(!AssessmentError::NoRecords.is_user_error());
        assert!(!AssessmentError::Internal("x".to_string()).is_user_error());
    }

    #[test]
    fn test_client_error_conversion() {
        let err: AssessmentError = ClientError::Configuration("empty key".to_string()).into();
        assert!(matches!(err, AssessmentError::Config(_)));

        let err: AssessmentError = ClientError::TransientRequestError {
            attempts: 3,
            message: "reset".to_string(),
        }
        .into();
        assert!(matches!(err, AssessmentError::Submit(_)));
    }

    #[test]
    fn test_io_and_parse_conversion() {
        let io = std::io::Error::new(std::io::ErrorKind::NotFound, "missing.json");
        assert!(matches!(AssessmentError::from(io), AssessmentError::File(_)));

        let json = serde_json::from_str::<serde_json::Value>("{").unwrap_err();
        assert!(matches!(AssessmentError::from(json), AssessmentError::Parse(_)));
    }
}
