//! Schema compiler for the endoscopy menu.
//!
//! Folds parsed menu records into a [`FindingSchema`](endo_model::FindingSchema)
//! for one procedure type, and derives the views other components read from
//! it: parsed hint content and the dictation schema export.
//!
//! # Example
//!
//! ```ignore
//! use endo_model::ProcedureType;
//! use endo_schema::compile_text;
//!
//! let compilation = compile_text(&menu_csv, ProcedureType::Endoscopy);
//! for disease in compilation.schema.diseases_at("Stomach") {
//!     println!("{}", disease.name);
//! }
//! ```

pub mod cells;
mod compiler;
pub mod export;
pub mod hint;

// === Compilation ===
pub use compiler::{Compilation, DEFAULT_SECTION, compile, compile_text};

// === Derived Views ===
pub use export::{DictationSchema, export_schema};
pub use hint::{HintContent, HintImage, parse_hint};
