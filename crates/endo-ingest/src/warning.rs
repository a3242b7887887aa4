//! Recoverable problems found while loading a menu configuration.

use serde::Serialize;
use thiserror::Error;

/// A recoverable configuration problem.
///
/// Warnings never stop a load; the caller gets a best-effort result and the
/// list of warnings alongside it.
#[derive(Debug, Clone, PartialEq, Eq, Error, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum ConfigWarning {
    /// The text could not be read as a table, or held no data rows.
    #[error("malformed input: {reason}")]
    MalformedInput { reason: String },

    /// A structurally required column is absent from the header row.
    #[error("missing required column '{column}'")]
    MissingRequiredColumn { column: String },

    /// None of the procedure's location columns are present.
    #[error("no location columns for {procedure}; expected one of: {}", .expected.join(", "))]
    MissingLocationColumns {
        procedure: String,
        expected: Vec<String>,
    },

    /// A `Range(a, b)` cell that does not match the shorthand.
    #[error("malformed range '{raw}' for {disease}")]
    MalformedRange { disease: String, raw: String },
}

impl ConfigWarning {
    /// Logs the warning through `tracing`.
    pub fn log(&self) {
        tracing::warn!(warning = %self, "menu configuration warning");
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_warning_display() {
        let w = ConfigWarning::MissingLocationColumns {
            procedure: "colonoscopy".to_string(),
            expected: vec!["Caecum".to_string(), "Rectum".to_string()],
        };
        assert_eq!(
            w.to_string(),
            "no location columns for colonoscopy; expected one of: Caecum, Rectum"
        );
    }
}
