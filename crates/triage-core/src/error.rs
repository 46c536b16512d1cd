use thiserror::Error;

/// Top-level error type for the triage system.
///
/// Subsystem crates define their own error types and implement
/// `From<SubsystemError> for TriageError` so that the `?` operator works
/// across crate boundaries.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum TriageError {
    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Session error: {0}")]
    Session(String),

    #[error("Dialog error: {0}")]
    Dialog(String),

    #[error("API error: {0}")]
    Api(String),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Serialization error: {0}")]
    Serialization(String),
}

impl From<toml::de::Error> for TriageError {
    fn from(err: toml::de::Error) -> Self {
        TriageError::Config(err.to_string())
    }
}

impl From<toml::ser::Error> for TriageError {
    fn from(err: toml::ser::Error) -> Self {
        TriageError::Config(err.to_string())
    }
}

impl From<serde_json::Error> for TriageError {
    fn from(err: serde_json::Error) -> Self {
        TriageError::Serialization(err.to_string())
    }
}

/// A specialized `Result` type for triage operations.
pub type Result<T> = std::result::Result<T, TriageError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_display() {
        let err = TriageError::Config("missing field".to_string());
        assert_eq!(err.to_string(), "Configuration error: missing field");

        let err = TriageError::Session("expired".to_string());
        assert_eq!(err.to_string(), "Session error: expired");
    }

    #[test]
    fn test_io_error_conversion() {
        let io_err = std::io::Error::new(std::io::ErrorKind::NotFound, "file not found");
        let err: TriageError = io_err.into();
        assert!(matches!(err, TriageError::Io(_)));
        assert!(err.to_string().contains("file not found"));
    }

    #[test]
    fn test_toml_error_conversion() {
        let parse_err = toml::from_str::<toml::Value>("= broken").unwrap_err();
        let err: TriageError = parse_err.into();
        assert!(matches!(err, TriageError::Config(_)));
    }

    #[test]
    fn test_json_error_conversion() {
        let parse_err = serde_json::from_str::<serde_json::Value>("{not json").unwrap_err();
        let err: TriageError = parse_err.into();
        assert!(matches!(err, TriageError::Serialization(_)));
        assert!(err.to_string().starts_with("Serialization error:"));
    }
}
