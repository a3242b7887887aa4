//! Report editing for the endoscopy reporting engine.
//!
//! A [`Session`] pairs a compiled [`FindingSchema`](endo_model::FindingSchema)
//! with the report being edited and exposes the operations a front end
//! drives: adding and removing diseases, toggling attributes and
//! sub-locations, filling input boxes, loading documents and applying live
//! updates. Visibility of schema rows is recomputed from the session on
//! demand through the conditional evaluator.
//!
//! # Example
//!
//! ```ignore
//! use endo_model::ProcedureType;
//! use endo_report::Session;
//!
//! let schema = endo_schema::compile_text(&menu_csv, ProcedureType::Endoscopy).schema;
//! let mut session = Session::new(schema);
//! session.add_or_open_disease("Stomach", "Ulcer");
//! session.toggle_attr("Base", None, "Clean");
//! for section in session.visible_sections() {
//!     println!("{}", section.def.name);
//! }
//! println!("{}", session.summary());
//! ```

pub mod conditional;
pub mod defaults;
mod session;
pub mod sublocation;
mod summary;
mod visibility;

// === Session ===
pub use session::{LiveUpdate, LiveUpdateOutcome, Session};

// === Evaluation ===
pub use conditional::EvalContext;
pub use defaults::apply_defaults;
pub use visibility::{VisibleSection, VisibleSubsection, is_row_visible, visible_sections};

// === Rendering ===
pub use summary::render_summary;
