//! Plain-text report summary.
//!
//! Mirrors the report pane: locations in procedure order, each disease with
//! its sub-locations, frame range, filled sections and comments. Sections,
//! subsections and input groups without content are left out.

use std::collections::BTreeMap;

use endo_model::{DiseaseEntry, FindingSchema, InputEntry, Report, SectionEntry};

use crate::session::Session;

const INDENT: &str = "  ";

/// Renders `report` as indented plain text.
///
/// `schema` decides the order of locations and sections; entries the schema
/// does not know follow in the order they were added.
pub fn render_summary(report: &Report, schema: &FindingSchema, overall_remarks: &str) -> String {
    let mut lines = Vec::new();

    let locations = ordered(
        report.locations.keys().map(String::as_str),
        schema.procedure.locations().iter().copied(),
    );
    for loc in locations {
        let Some(location) = report.locations.get(loc) else {
            continue;
        };
        if location.diseases.is_empty() {
            continue;
        }
        lines.push(loc.to_string());
        for (name, entry) in &location.diseases {
            lines.push(format!("{INDENT}{name}"));
            let section_order = schema
                .disease(name)
                .map(|d| d.sections.iter().map(|s| s.name.as_str()).collect::<Vec<_>>())
                .unwrap_or_default();
            render_disease(entry, &section_order, &mut lines);
        }
    }

    let remarks = overall_remarks.trim();
    if !remarks.is_empty() {
        if !lines.is_empty() {
            lines.push(String::new());
        }
        lines.push(format!("Overall remarks: {remarks}"));
    }
    lines.join("\n")
}

fn render_disease(entry: &DiseaseEntry, section_order: &[&str], lines: &mut Vec<String>) {
    let pad = INDENT.repeat(2);
    let subs = if entry.sublocations.is_empty() {
        "none".to_string()
    } else {
        entry.sublocations.join(", ")
    };
    lines.push(format!("{pad}Sub-locations: {subs}"));

    if let Some(span) = entry.frame_span() {
        let mut text = format!(
            "{pad}Frames: {} - {} ({} frames, {:.2} sec)",
            span.start,
            span.end,
            span.frame_count(),
            span.duration_secs()
        );
        if let Some(seg) = entry.segmentation_frame {
            text.push_str(&format!(" | Seg: {seg}"));
        }
        lines.push(text);
    }

    let names = ordered(
        entry.sections.keys().map(String::as_str),
        section_order.iter().copied(),
    );
    for name in names {
        if let Some(section) = entry.sections.get(name) {
            render_section(name, section, lines);
        }
    }

    let comments = entry.comments.trim();
    if !comments.is_empty() {
        lines.push(format!("{pad}Comments: {comments}"));
    }
}

fn render_section(name: &str, section: &SectionEntry, lines: &mut Vec<String>) {
    if !section.has_content() {
        return;
    }
    let pad = INDENT.repeat(2);
    lines.push(format!("{pad}{name}"));
    push_items(section.attrs.iter(), &section.inputs, 3, lines);

    for (sub_name, sub) in &section.subsections {
        if !sub.has_content() {
            continue;
        }
        lines.push(format!("{}{sub_name}", INDENT.repeat(3)));
        push_items(sub.attrs.iter(), &sub.inputs, 4, lines);
    }
}

fn push_items<'a>(
    attrs: impl Iterator<Item = &'a str>,
    inputs: &[InputEntry],
    depth: usize,
    lines: &mut Vec<String>,
) {
    let pad = INDENT.repeat(depth);
    for attr in attrs {
        lines.push(format!("{pad}- {attr}"));
    }
    for input in inputs {
        let text = input.display_text();
        if !text.is_empty() {
            lines.push(format!("{pad}- {text}"));
        }
    }
}

/// `keys` ordered by their position in `preferred`, unknown keys last in
/// their own order.
fn ordered<'a>(
    keys: impl Iterator<Item = &'a str>,
    preferred: impl Iterator<Item = &'a str>,
) -> Vec<&'a str> {
    let rank: BTreeMap<&str, usize> = preferred.enumerate().map(|(i, k)| (k, i)).collect();
    let mut keys: Vec<&str> = keys.collect();
    keys.sort_by_key(|k| rank.get(k).copied().unwrap_or(usize::MAX));
    keys
}

impl Session {
    /// Plain-text summary of the session's report.
    pub fn summary(&self) -> String {
        render_summary(self.report(), self.schema(), self.overall_remarks())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use endo_model::ProcedureType;
    use endo_schema::compile_text;

    const MENU: &str = "\
Diagnosis,Section,Subsection,Esophagus,Stomach,Multi_Attribute,Attribute1,Attribute2
Ulcer,Size,,,x,,int_box mm from alphanum_box,
Ulcer,Base,,,x,,Clean,Black
Ulcer,Features,Edge,,x,x,Raised,Rolled
Ulcer,Features,Depth,,x,,Deep,Shallow
Varices,Grade,,x,,,Small,Large
";

    fn session() -> Session {
        Session::new(compile_text(MENU, ProcedureType::Endoscopy).schema)
    }

    #[test]
    fn test_summary_snapshot() {
        let mut s = session();
        s.add_or_open_disease("Stomach", "Ulcer");
        s.toggle_matrix_option("Antrum", "Posterior Wall");
        s.toggle_attr("Base", None, "Black");
        s.toggle_attr("Features", Some("Edge"), "Raised");
        s.toggle_attr("Features", Some("Edge"), "Rolled");
        s.set_input_value("Size", None, "int_box mm from alphanum_box", 0, "12");
        s.set_input_value("Size", None, "int_box mm from alphanum_box", 1, "pylorus");
        s.set_frames(Some(100), Some(149), Some(120));
        s.set_comments("Biopsy taken");
        s.add_or_open_disease("Esophagus", "Varices");
        s.toggle_attr("Grade", None, "Small");
        s.set_overall_remarks("Otherwise normal");

        insta::assert_snapshot!(s.summary(), @r"
Esophagus
  Varices
    Sub-locations: none
    Grade
      - Small
Stomach
  Ulcer
    Sub-locations: Antrum - Posterior Wall, Antrum
    Frames: 100 - 149 (50 frames, 2.00 sec) | Seg: 120
    Size
      - 12 mm from pylorus
    Base
      - Black
    Features
      Edge
        - Raised
        - Rolled
    Comments: Biopsy taken

Overall remarks: Otherwise normal
");
    }

    #[test]
    fn test_empty_scopes_are_omitted() {
        let mut s = session();
        s.add_or_open_disease("Stomach", "Ulcer");
        s.toggle_attr("Base", None, "Black");
        s.toggle_attr("Base", None, "Black");
        s.toggle_attr("Features", Some("Depth"), "Deep");
        s.toggle_attr("Features", Some("Depth"), "Deep");
        let text = s.summary();
        assert!(!text.contains("Base"));
        assert!(!text.contains("Features"));
        assert!(!text.contains("Depth"));
        assert!(text.contains("Ulcer"));
    }

    #[test]
    fn test_extreme_frames_render() {
        let mut s = session();
        let doc = endo_model::ReportDocument::from_json_str(
            r#"{"report":{"Stomach":{"diseases":{"Ulcer":{
                "startFrame":-9223372036854775808,"endFrame":9223372036854775807}}}}}"#,
        )
        .unwrap();
        s.load_document(doc);
        let text = s.summary();
        assert!(text.contains("(9223372036854775807 frames,"));

        assert!(s.set_frames(Some(i64::MAX), Some(i64::MIN), None));
        assert!(s.summary().contains("(-9223372036854775808 frames,"));
    }

    #[test]
    fn test_empty_report_renders_nothing() {
        assert_eq!(session().summary(), "");
    }
}
