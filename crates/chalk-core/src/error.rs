use thiserror::Error;

/// Top-level error type for the Chalk assistant.
///
/// Subsystem crates define their own error types and implement
/// `From<SubsystemError> for ChalkError` so that `?` works across crate
/// boundaries in the binary.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum ChalkError {
    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Document error: {0}")]
    Document(String),

    #[error("Completion error: {0}")]
    Completion(String),

    #[error("Chat error: {0}")]
    Chat(String),

    #[error("API error: {0}")]
    Api(String),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Serialization error: {0}")]
    Serialization(String),
}

impl From<toml::de::Error> for ChalkError {
    fn from(err: toml::de::Error) -> Self {
        ChalkError::Config(err.to_string())
    }
}

impl From<toml::ser::Error> for ChalkError {
    fn from(err: toml::ser::Error) -> Self {
        ChalkError::Config(err.to_string())
    }
}

impl From<serde_json::Error> for ChalkError {
    fn from(err: serde_json::Error) -> Self {
        ChalkError::Serialization(err.to_string())
    }
}

/// A specialized `Result` type for Chalk operations.
pub type Result<T> = std::result::Result<T, ChalkError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_display() {
        let err = ChalkError::Config("missing OPENAI_API_KEY".to_string());
        assert_eq!(err.to_string(), "Configuration error: missing OPENAI_API_KEY");
    }

    #[test]
    fn test_error_display_all_variants() {
        let cases: Vec<(ChalkError, &str)> = vec![
            (
                ChalkError::Document("bad pdf".to_string()),
                "Document error: bad pdf",
            ),
            (
                ChalkError::Completion("timeout".to_string()),
                "Completion error: timeout",
            ),
            (
                ChalkError::Chat("turn pending".to_string()),
                "Chat error: turn pending",
            ),
            (
                ChalkError::Api("bind failed".to_string()),
                "API error: bind failed",
            ),
            (
                ChalkError::Serialization("invalid json".to_string()),
                "Serialization error: invalid json",
            ),
        ];

        for (error, expected) in cases {
            assert_eq!(error.to_string(), expected);
        }
    }

    #[test]
    fn test_io_error_conversion() {
        let io_err = std::io::Error::new(std::io::ErrorKind::NotFound, "file not found");
        let err: ChalkError = io_err.into();
        assert!(matches!(err, ChalkError::Io(_)));
        assert!(err.to_string().starts_with("I/O error:"));
        assert!(err.to_string().contains("file not found"));
    }

    #[test]
    fn test_error_from_toml_de() {
        let err: std::result::Result<toml::Value, _> = toml::from_str("invalid = [[[");
        let chalk_err: ChalkError = err.unwrap_err().into();
        assert!(matches!(chalk_err, ChalkError::Config(_)));
    }

    #[test]
    fn test_error_from_serde_json() {
        let err: std::result::Result<serde_json::Value, _> = serde_json::from_str("{ nope }");
        let chalk_err: ChalkError = err.unwrap_err().into();
        assert!(matches!(chalk_err, ChalkError::Serialization(_)));
    }

    #[test]
    fn test_result_type_with_question_mark() {
        fn inner() -> Result<String> {
            let io_result: std::result::Result<i32, std::io::Error> = Ok(42);
            let value = io_result?;
            Ok(value.to_string())
        }

        assert_eq!(inner().unwrap(), "42");
    }
}
