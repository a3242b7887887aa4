//! Parsed configuration records.

use std::collections::BTreeMap;

use endo_model::ConfigSource;

use super::header::ConfigHeaders;
use crate::warning::ConfigWarning;

/// One data row of the menu CSV, keyed by column name.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ConfigRecord {
    /// 1-based line number of the record's first line.
    pub line: u64,
    /// Trimmed cell values. A later duplicate column name overwrites an
    /// earlier one.
    pub fields: BTreeMap<String, String>,
}

impl ConfigRecord {
    /// Field value, empty if the column is absent.
    pub fn get(&self, column: &str) -> &str {
        self.fields.get(column).map_or("", String::as_str)
    }

    /// Field value, `None` if absent or empty.
    pub fn get_optional(&self, column: &str) -> Option<&str> {
        self.fields
            .get(column)
            .map(String::as_str)
            .filter(|v| !v.is_empty())
    }
}

/// Result of parsing a menu CSV.
#[derive(Debug, Clone, Default)]
pub struct ParsedConfig {
    pub headers: ConfigHeaders,
    /// Data rows in file order, blank rows dropped.
    pub records: Vec<ConfigRecord>,
    pub warnings: Vec<ConfigWarning>,
    /// Fingerprint of the source text.
    pub source: Option<ConfigSource>,
}

impl ParsedConfig {
    /// Returns true if no data rows were read.
    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }
}
