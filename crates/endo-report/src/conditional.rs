//! Conditional evaluator.
//!
//! Evaluates a parsed [`Condition`] against the live report. Predicates that
//! read report state look only at the active disease entry and are false
//! when there is none. OR stops at the first true clause, AND at the first
//! false one. Unrecognized predicates are false.

use endo_model::{ActivePointer, Condition, DiseaseEntry, Predicate, Report};

/// Read-only view of the state a condition is evaluated against.
#[derive(Debug, Clone, Copy)]
pub struct EvalContext<'a> {
    pub report: &'a Report,
    pub active: Option<&'a ActivePointer>,
    /// The location currently selected in the location strip.
    pub main_location: &'a str,
}

impl<'a> EvalContext<'a> {
    pub fn new(
        report: &'a Report,
        active: Option<&'a ActivePointer>,
        main_location: &'a str,
    ) -> Self {
        Self {
            report,
            active,
            main_location,
        }
    }

    /// Evaluates `condition` for a row owned by `section`.
    ///
    /// The section is the context for `Subsection(..)` predicates.
    pub fn evaluate(&self, condition: &Condition, section: Option<&str>) -> bool {
        match condition {
            Condition::Always => true,
            Condition::Or(items) => items.iter().any(|c| self.evaluate(c, section)),
            Condition::And(items) => items.iter().all(|c| self.evaluate(c, section)),
            Condition::Pred(predicate) => self.evaluate_predicate(predicate, section),
        }
    }

    /// Parses and evaluates a raw expression.
    pub fn evaluate_text(&self, expr: &str, section: Option<&str>) -> bool {
        self.evaluate(&Condition::parse(expr), section)
    }

    /// Evaluates one atomic predicate.
    pub fn evaluate_predicate(&self, predicate: &Predicate, section: Option<&str>) -> bool {
        match predicate {
            Predicate::LocationEq { value } => self.main_location == value.as_str(),
            Predicate::SectionAttr { section, value } => self
                .active_entry()
                .and_then(|entry| entry.sections.get(section))
                .is_some_and(|sec| sec.has_attr_anywhere(value)),
            Predicate::SubsectionAttr { subsection, value } => {
                let Some(entry) = self.active_entry() else {
                    return false;
                };
                let in_context = section
                    .and_then(|name| entry.sections.get(name))
                    .and_then(|sec| sec.attrs(Some(subsection.as_str())))
                    .is_some_and(|attrs| attrs.contains(value));
                in_context
                    || entry
                        .sections
                        .values()
                        .filter_map(|sec| sec.attrs(Some(subsection.as_str())))
                        .any(|attrs| attrs.contains(value))
            }
            Predicate::Unrecognized { text } => {
                tracing::warn!(predicate = %text, "unrecognized condition, hiding row");
                false
            }
        }
    }

    fn active_entry(&self) -> Option<&'a DiseaseEntry> {
        let active = self.active?;
        self.report.disease(&active.loc, &active.disease)
    }
}
