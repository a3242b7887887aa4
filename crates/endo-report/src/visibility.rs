//! Which parts of a disease's schema are currently shown.
//!
//! A row is visible when it is checked for the main location and its
//! conditional holds, with the owning section as evaluation context. A
//! subsection is visible when it has a visible row, and a section when it
//! has a visible section-level row or a visible subsection. Visibility
//! depends on report state, so callers re-query after every mutation.

use endo_model::{Disease, Row, SectionDef, SubsectionDef};

use crate::conditional::EvalContext;
use crate::session::Session;

/// A subsection with its visible rows.
#[derive(Debug, Clone)]
pub struct VisibleSubsection<'a> {
    pub def: &'a SubsectionDef,
    pub rows: Vec<&'a Row>,
}

/// A section with its visible rows and subsections.
#[derive(Debug, Clone)]
pub struct VisibleSection<'a> {
    pub def: &'a SectionDef,
    pub rows: Vec<&'a Row>,
    pub subsections: Vec<VisibleSubsection<'a>>,
}

impl VisibleSection<'_> {
    /// Total number of visible rows, subsections included.
    pub fn row_count(&self) -> usize {
        self.rows.len() + self.subsections.iter().map(|s| s.rows.len()).sum::<usize>()
    }
}

/// Returns true if `row` is shown in `section` under `ctx`.
pub fn is_row_visible(row: &Row, section: &str, ctx: &EvalContext<'_>) -> bool {
    if !row.applies_to(ctx.main_location) {
        return false;
    }
    row.conditional
        .as_ref()
        .is_none_or(|condition| ctx.evaluate(condition, Some(section)))
}

/// Visible sections of `disease`, in schema order.
pub fn visible_sections<'a>(disease: &'a Disease, ctx: &EvalContext<'_>) -> Vec<VisibleSection<'a>> {
    disease
        .sections
        .iter()
        .filter_map(|def| {
            let rows = visible_rows(&def.rows, &def.name, ctx);
            let subsections: Vec<_> = def
                .subsections
                .iter()
                .filter_map(|sub| {
                    let rows = visible_rows(&sub.rows, &def.name, ctx);
                    (!rows.is_empty()).then_some(VisibleSubsection { def: sub, rows })
                })
                .collect();
            if rows.is_empty() && subsections.is_empty() {
                return None;
            }
            Some(VisibleSection {
                def,
                rows,
                subsections,
            })
        })
        .collect()
}

fn visible_rows<'a>(rows: &'a [Row], section: &str, ctx: &EvalContext<'_>) -> Vec<&'a Row> {
    rows.iter()
        .filter(|row| is_row_visible(row, section, ctx))
        .collect()
}

impl Session {
    /// Visible sections of the active disease; empty without one.
    pub fn visible_sections(&self) -> Vec<VisibleSection<'_>> {
        let ctx = self.eval_context();
        match self.active_disease() {
            Some((disease, _)) => visible_sections(disease, &ctx),
            None => Vec::new(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use endo_model::ProcedureType;
    use endo_schema::compile_text;

    const MENU: &str = "\
Diagnosis,Section,Subsection,Stomach,Duodenum,Conditional_on,Attribute1,Attribute2
Ulcer,Base,,x,x,,Clean,Black
Ulcer,Bleeding,,x,x,Section(Base = Black),Active,Stigmata
Ulcer,Shape,,,x,,Round,Linear
Ulcer,Forrest,Class,x,x,Subsection(Colour = Red),Ia,Ib
Ulcer,Forrest,Colour,x,,Location(Main = Stomach),Red,White
Ulcer,Notes,,x,,Mystery(x),Odd,
";

    fn session() -> Session {
        let mut s = Session::new(compile_text(MENU, ProcedureType::Endoscopy).schema);
        s.add_or_open_disease("Stomach", "Ulcer");
        s
    }

    fn names(sections: &[VisibleSection<'_>]) -> Vec<String> {
        sections.iter().map(|s| s.def.name.clone()).collect()
    }

    #[test]
    fn test_location_filter_and_unconditional_rows() {
        let s = session();
        let visible = s.visible_sections();
        assert_eq!(names(&visible), vec!["Base", "Forrest"]);
        let forrest = &visible[1];
        assert!(forrest.rows.is_empty());
        assert_eq!(forrest.subsections.len(), 1);
        assert_eq!(forrest.subsections[0].def.name, "Colour");
    }

    #[test]
    fn test_conditionals_follow_selections() {
        let mut s = session();
        s.toggle_attr("Base", None, "Black");
        s.toggle_attr("Forrest", Some("Colour"), "Red");
        let visible = s.visible_sections();
        assert_eq!(names(&visible), vec!["Base", "Bleeding", "Forrest"]);
        assert_eq!(visible[2].subsections.len(), 2);
        assert_eq!(visible[2].row_count(), 2);

        s.toggle_attr("Base", None, "Black");
        assert_eq!(names(&s.visible_sections()), vec!["Base", "Forrest"]);
    }

    #[test]
    fn test_other_location() {
        let mut s = session();
        s.select_main_location("Duodenum");
        let visible = s.visible_sections();
        assert_eq!(names(&visible), vec!["Base", "Shape"]);
    }

    #[test]
    fn test_no_active_disease() {
        let mut s = session();
        s.remove_disease("Stomach", "Ulcer");
        assert!(s.visible_sections().is_empty());
    }
}
