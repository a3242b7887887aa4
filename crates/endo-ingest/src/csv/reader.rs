//! Menu CSV reading.
//!
//! Parsing follows standard quoted-CSV rules: fields are comma separated, a
//! quoted field may contain commas and line breaks, and a doubled quote inside
//! a quoted field is a literal quote. CR, LF and CRLF all end a row. The first
//! row is the header; every later row becomes a [`ConfigRecord`] keyed by the
//! header names, with trimmed values. Rows whose cells are all blank are
//! dropped.

use std::collections::BTreeMap;
use std::path::Path;

use ::csv::ReaderBuilder;
use endo_model::ConfigSource;
use sha2::Digest;

use crate::error::{IngestError, Result};
use crate::warning::ConfigWarning;

use super::header::ConfigHeaders;
use super::record::{ConfigRecord, ParsedConfig};

/// Maximum menu CSV size accepted from disk (16 MiB).
pub const MAX_CONFIG_FILE_SIZE: u64 = 16 * 1024 * 1024;

/// Check file size before loading.
pub fn check_file_size(path: &Path) -> Result<()> {
    check_file_size_with_limit(path, MAX_CONFIG_FILE_SIZE)
}

/// Check file size against a custom limit.
pub fn check_file_size_with_limit(path: &Path, max_size: u64) -> Result<()> {
    let metadata = std::fs::metadata(path).map_err(|e| IngestError::io(path, e))?;
    if metadata.len() > max_size {
        return Err(IngestError::FileTooLarge {
            path: path.to_path_buf(),
            size: metadata.len(),
            max_size,
        });
    }
    Ok(())
}

/// Reads and parses a menu CSV file.
///
/// File-system problems are errors; problems with the content are returned
/// as warnings on the [`ParsedConfig`].
pub fn read_config_file(path: &Path) -> Result<ParsedConfig> {
    check_file_size(path)?;
    let bytes = std::fs::read(path).map_err(|e| IngestError::io(path, e))?;
    let name = path
        .file_name()
        .map(|n| n.to_string_lossy().into_owned());
    let parsed = parse_config_bytes(&bytes, name.as_deref());
    tracing::info!(
        path = %path.display(),
        records = parsed.records.len(),
        warnings = parsed.warnings.len(),
        "loaded menu CSV"
    );
    Ok(parsed)
}

/// Parses raw bytes.
///
/// A UTF-8 byte-order mark is skipped. UTF-16 input and invalid UTF-8 yield
/// an empty result with a [`ConfigWarning::MalformedInput`].
pub fn parse_config_bytes(bytes: &[u8], name: Option<&str>) -> ParsedConfig {
    let source = fingerprint(bytes, name);

    let encoding = match bytes {
        [0xFF, 0xFE, ..] => Some("UTF-16 LE"),
        [0xFE, 0xFF, ..] => Some("UTF-16 BE"),
        _ => None,
    };
    if let Some(encoding) = encoding {
        return malformed(source, format!("{encoding} encoding is not supported"));
    }

    match std::str::from_utf8(bytes) {
        Ok(text) => parse_with_source(text, source),
        Err(err) => malformed(source, format!("input is not valid UTF-8: {err}")),
    }
}

/// Parses configuration text.
pub fn parse_config_text(text: &str) -> ParsedConfig {
    parse_with_source(text, fingerprint(text.as_bytes(), None))
}

fn parse_with_source(text: &str, source: ConfigSource) -> ParsedConfig {
    let mut parsed = ParsedConfig {
        source: Some(source),
        ..ParsedConfig::default()
    };

    let text = text.strip_prefix('\u{feff}').unwrap_or(text);
    if text.trim().is_empty() {
        push_warning(
            &mut parsed,
            ConfigWarning::MalformedInput {
                reason: "configuration text is empty".to_string(),
            },
        );
        return parsed;
    }

    let mut reader = ReaderBuilder::new()
        .has_headers(false)
        .flexible(true)
        .from_reader(text.as_bytes());
    let mut rows = reader.records();

    let header = match rows.next() {
        Some(Ok(header)) => header,
        Some(Err(err)) => {
            push_warning(
                &mut parsed,
                ConfigWarning::MalformedInput {
                    reason: format!("unreadable header row: {err}"),
                },
            );
            return parsed;
        }
        None => {
            push_warning(
                &mut parsed,
                ConfigWarning::MalformedInput {
                    reason: "no header row".to_string(),
                },
            );
            return parsed;
        }
    };

    parsed.headers = ConfigHeaders::from_raw(header.iter());
    for column in parsed.headers.missing_required() {
        push_warning(
            &mut parsed,
            ConfigWarning::MissingRequiredColumn {
                column: column.to_string(),
            },
        );
    }

    for result in rows {
        let record = match result {
            Ok(record) => record,
            Err(err) => {
                push_warning(
                    &mut parsed,
                    ConfigWarning::MalformedInput {
                        reason: format!("stopped reading: {err}"),
                    },
                );
                break;
            }
        };
        if record.iter().all(|cell| cell.trim().is_empty()) {
            continue;
        }

        let fields: BTreeMap<String, String> = parsed
            .headers
            .columns
            .iter()
            .enumerate()
            .map(|(idx, name)| {
                let value = record.get(idx).unwrap_or("").trim().to_string();
                (name.clone(), value)
            })
            .collect();
        let line = record.position().map_or(0, |pos| pos.line());
        parsed.records.push(ConfigRecord { line, fields });
    }

    if parsed.records.is_empty() {
        push_warning(
            &mut parsed,
            ConfigWarning::MalformedInput {
                reason: "configuration has no data rows".to_string(),
            },
        );
    }

    tracing::debug!(
        columns = parsed.headers.len(),
        records = parsed.records.len(),
        "parsed menu CSV"
    );
    parsed
}

fn push_warning(parsed: &mut ParsedConfig, warning: ConfigWarning) {
    warning.log();
    parsed.warnings.push(warning);
}

fn malformed(source: ConfigSource, reason: String) -> ParsedConfig {
    let mut parsed = ParsedConfig {
        source: Some(source),
        ..ParsedConfig::default()
    };
    push_warning(&mut parsed, ConfigWarning::MalformedInput { reason });
    parsed
}

fn fingerprint(bytes: &[u8], name: Option<&str>) -> ConfigSource {
    ConfigSource {
        name: name.map(str::to_string),
        sha256: hex::encode(sha2::Sha256::digest(bytes)),
    }
}
