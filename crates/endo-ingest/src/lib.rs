//! Menu configuration ingestion.
//!
//! Turns the tabular menu configuration (a CSV file, raw bytes, or text) into
//! header-keyed records ready for schema compilation.
//!
//! # Example
//!
//! ```ignore
//! use std::path::Path;
//! use endo_ingest::read_config_file;
//!
//! let parsed = read_config_file(Path::new("menus/endoscopy.csv"))?;
//! for warning in &parsed.warnings {
//!     eprintln!("{warning}");
//! }
//! println!("{} rows", parsed.records.len());
//! ```

mod csv;
mod error;
mod warning;

// === Error Types ===
pub use error::{IngestError, Result};
pub use warning::ConfigWarning;

// === CSV Reading ===
pub use self::csv::{
    ConfigHeaders, ConfigRecord, MAX_CONFIG_FILE_SIZE, ParsedConfig, check_file_size,
    check_file_size_with_limit, columns, normalize_header, parse_config_bytes, parse_config_text,
    read_config_file,
};
