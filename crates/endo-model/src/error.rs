//! Error types for the report model.

use thiserror::Error;

/// Errors raised while reading or writing persisted report documents.
#[derive(Debug, Error)]
pub enum ModelError {
    /// Text was not valid JSON, or did not match the report shape.
    #[error("invalid report JSON: {0}")]
    Json(#[from] serde_json::Error),

    /// JSON was well-formed but not a report document.
    #[error("invalid report document: {reason}")]
    InvalidDocument { reason: String },
}

/// Result type for model operations.
pub type Result<T> = std::result::Result<T, ModelError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_display() {
        let err = ModelError::InvalidDocument {
            reason: "top-level value is not an object".to_string(),
        };
        assert_eq!(
            err.to_string(),
            "invalid report document: top-level value is not an object"
        );
    }
}
