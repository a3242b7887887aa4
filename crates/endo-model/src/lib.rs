//! Domain model for endoscopy reporting.
//!
//! This crate holds the pure types shared by the rest of the workspace:
//!
//! - **Procedure catalog**: procedure types, their ordered main locations, and
//!   sub-location layouts (flat lists and region/option matrices)
//! - **Attribute patterns**: the tokenizer for cells such as
//!   `int_box mm from alphanum_box`
//! - **Conditional language**: the AST and parser for `Conditional_on` rules
//! - **Finding schema**: the compiled, immutable menu
//! - **Report state**: the mutable selections mirrored against the schema
//! - **Report documents**: the persisted JSON file format
//!
//! Nothing here performs I/O beyond (de)serialization.

pub mod condition;
pub mod document;
mod error;
pub mod frames;
pub mod location;
pub mod pattern;
pub mod report;
pub mod schema;

// === Error Types ===
pub use error::{ModelError, Result};

// === Procedure Catalog ===
pub use location::{MatrixRow, ProcedureType, SublocationLayout};

// === Patterns and Conditions ===
pub use condition::{Condition, Predicate};
pub use pattern::{AttributePattern, BoxKind, PatternToken};

// === Schema ===
pub use schema::{
    Attribute, ConfigSource, Disease, FindingSchema, Row, ScopeDef, SectionDef, SubsectionDef,
};

// === Report State ===
pub use document::{ProspectiveMeta, ReportDocument, RetroMeta, SessionMeta};
pub use frames::{FPS, FrameSpan, parse_frame};
pub use report::{
    ActivePointer, AttrSet, DiseaseEntry, InputEntry, InputGroup, LocationEntry, Report,
    SectionEntry, SubsectionEntry,
};
