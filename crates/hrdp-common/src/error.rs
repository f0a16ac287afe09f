//! Error types shared across HRDP components

use thiserror::Error;

/// Result type alias for HRDP infrastructure operations
pub type Result<T> = std::result::Result<T, HrdpError>;

/// Infrastructure-level error type
///
/// Domain errors (ingestion, normalization, storage) live next to the
/// code that raises them; this type covers the shared plumbing.
#[derive(Error, Debug)]
pub enum HrdpError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Parse error: {0}")]
    Parse(String),
}

impl HrdpError {
    /// Create a configuration error
    pub fn config(message: impl Into<String>) -> Self {
        Self::Config(message.into())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_config_error_display() {
        let err = HrdpError::config("DATABASE_URL not set");
        assert_eq!(err.to_string(), "Configuration error: DATABASE_URL not set");
    }
}
