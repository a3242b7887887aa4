//! CSV reading for the menu configuration.

mod header;
mod reader;
mod record;

pub use header::{ConfigHeaders, columns, normalize_header};
pub use reader::{
    MAX_CONFIG_FILE_SIZE, check_file_size, check_file_size_with_limit, parse_config_bytes,
    parse_config_text, read_config_file,
};
pub use record::{ConfigRecord, ParsedConfig};
