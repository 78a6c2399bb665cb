//! Error types shared across the workspace

use thiserror::Error;

/// Result type alias for shared operations
pub type Result<T> = std::result::Result<T, EtlError>;

/// Errors raised by the shared plumbing (environment and configuration)
#[derive(Error, Debug)]
pub enum EtlError {
    #[error("missing required environment variables: {}", .0.join(", "))]
    MissingEnv(Vec<String>),

    #[error("invalid value for {key}: {value:?}")]
    InvalidEnv { key: String, value: String },

    #[error("Configuration error: {0}")]
    Config(String),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_missing_env_lists_every_key() {
        let err = EtlError::MissingEnv(vec!["DB_HOST".to_string(), "DB_NAME".to_string()]);
        assert_eq!(
            err.to_string(),
            "missing required environment variables: DB_HOST, DB_NAME"
        );
    }

    #[test]
    fn test_invalid_env_quotes_value() {
        let err = EtlError::InvalidEnv {
            key: "PORT".to_string(),
            value: "eighty".to_string(),
        };
        assert_eq!(err.to_string(), "invalid value for PORT: \"eighty\"");
    }
}
