//! Schema compiler.
//!
//! Records are folded in file order. Each record names a disease, marks the
//! locations it applies to, and lands in a section (and optionally a
//! subsection) of that disease. Section and subsection properties merge
//! across records: `multi` is true if any record declared it, the hint is the
//! first non-empty one, and default attributes accumulate without duplicates.
//! Diseases left without an applicable location for the procedure are pruned.

use std::collections::HashMap;

use endo_ingest::{ConfigRecord, ConfigWarning, ParsedConfig, columns, parse_config_text};
use endo_model::{
    Condition, Disease, FindingSchema, ProcedureType, Row, SectionDef, SubsectionDef,
};

use crate::cells::{CellKind, classify_attribute, is_checked, is_multi_flag};

/// Section name used for records with an empty `Section` cell.
pub const DEFAULT_SECTION: &str = "General";

/// A compiled schema and the warnings collected on the way.
#[derive(Debug, Clone)]
pub struct Compilation {
    pub schema: FindingSchema,
    /// Parse warnings followed by compile warnings.
    pub warnings: Vec<ConfigWarning>,
}

/// Parses and compiles menu text in one step.
pub fn compile_text(text: &str, procedure: ProcedureType) -> Compilation {
    compile(&parse_config_text(text), procedure)
}

/// Compiles parsed menu records for `procedure`.
pub fn compile(parsed: &ParsedConfig, procedure: ProcedureType) -> Compilation {
    let mut warnings = parsed.warnings.clone();

    let present: Vec<&str> = procedure
        .locations()
        .iter()
        .copied()
        .filter(|loc| parsed.headers.contains(loc))
        .collect();
    if present.is_empty() && !parsed.records.is_empty() {
        let warning = ConfigWarning::MissingLocationColumns {
            procedure: procedure.to_string(),
            expected: procedure.locations().iter().map(|l| l.to_string()).collect(),
        };
        warning.log();
        warnings.push(warning);
    }

    let attribute_columns = parsed.headers.attribute_columns();
    let mut builder = SchemaBuilder::default();

    for record in &parsed.records {
        let name = record.get(columns::DIAGNOSIS);
        if name.is_empty() {
            tracing::debug!(line = record.line, "skipping record without a diagnosis");
            continue;
        }
        let row = build_row(record, name, &present, &attribute_columns, &mut warnings);
        builder.add(row, record);
    }

    let mut schema = builder.finish(procedure);
    schema.source = parsed.source.clone();

    tracing::info!(
        procedure = %procedure,
        diseases = schema.len(),
        warnings = warnings.len(),
        "compiled finding schema"
    );
    Compilation { schema, warnings }
}

fn build_row(
    record: &ConfigRecord,
    disease: &str,
    locations: &[&str],
    attribute_columns: &[&str],
    warnings: &mut Vec<ConfigWarning>,
) -> Row {
    let section = record
        .get_optional(columns::SECTION)
        .unwrap_or(DEFAULT_SECTION);

    let mut attributes = Vec::new();
    for column in attribute_columns {
        let Some(cell) = record.get_optional(column) else {
            continue;
        };
        match classify_attribute(cell) {
            CellKind::Attribute(attr) => attributes.push(attr),
            CellKind::MalformedRange(attr) => {
                let warning = ConfigWarning::MalformedRange {
                    disease: disease.to_string(),
                    raw: cell.to_string(),
                };
                warning.log();
                warnings.push(warning);
                attributes.push(attr);
            }
        }
    }

    let conditional = record.get_optional(columns::CONDITIONAL_ON).map(|text| {
        let condition = Condition::parse(text);
        for unknown in condition.unrecognized() {
            tracing::debug!(
                line = record.line,
                predicate = unknown,
                "conditional contains an unrecognized predicate"
            );
        }
        condition
    });

    Row {
        disease: disease.to_string(),
        section: section.to_string(),
        subsection: record.get_optional(columns::SUBSECTION).map(str::to_string),
        locations: locations
            .iter()
            .filter(|loc| is_checked(record.get(loc)))
            .map(|loc| loc.to_string())
            .collect(),
        attributes,
        conditional,
        multi: is_multi_flag(record.get(columns::MULTI_ATTRIBUTE)),
        source: record.fields.clone(),
    }
}

#[derive(Default)]
struct SchemaBuilder {
    diseases: Vec<Disease>,
    index: HashMap<String, usize>,
}

impl SchemaBuilder {
    fn add(&mut self, row: Row, record: &ConfigRecord) {
        let idx = match self.index.get(&row.disease) {
            Some(&idx) => idx,
            None => {
                self.diseases.push(Disease::new(row.disease.clone()));
                self.index.insert(row.disease.clone(), self.diseases.len() - 1);
                self.diseases.len() - 1
            }
        };
        let disease = &mut self.diseases[idx];

        // The first non-empty value wins, even when an earlier record of the
        // same disease leaves the column blank.
        if disease.default_sublocation.is_none() {
            disease.default_sublocation = record
                .get_optional(columns::DEFAULT_SUB_LOCATION)
                .map(str::to_string);
        }
        for loc in &row.locations {
            if !disease.applies_to(loc) {
                disease.locations.push(loc.clone());
            }
        }

        let section_hint = record.get_optional(columns::SECTION_HINT);
        let default_attr = record.get_optional(columns::DEFAULT_ATTR);

        let section = match disease.sections.iter().position(|s| s.name == row.section) {
            Some(pos) => &mut disease.sections[pos],
            None => {
                disease.sections.push(SectionDef::new(row.section.clone()));
                let last = disease.sections.len() - 1;
                &mut disease.sections[last]
            }
        };
        merge_hint(&mut section.hint, section_hint);

        match row.subsection.clone() {
            None => {
                section.multi |= row.multi;
                merge_default(&mut section.default_attrs, default_attr);
                section.rows.push(row);
            }
            Some(name) => {
                let subsection_hint = record.get_optional(columns::SUBSECTION_HINT);
                let sub = match section.subsections.iter().position(|s| s.name == name) {
                    Some(pos) => &mut section.subsections[pos],
                    None => {
                        section.subsections.push(SubsectionDef::new(name));
                        let last = section.subsections.len() - 1;
                        &mut section.subsections[last]
                    }
                };
                merge_hint(&mut sub.hint, subsection_hint);
                sub.multi |= row.multi;
                merge_default(&mut sub.default_attrs, default_attr);
                sub.rows.push(row);
            }
        }
    }

    fn finish(self, procedure: ProcedureType) -> FindingSchema {
        let mut diseases = self.diseases;
        diseases.retain(|d| {
            let keep = !d.locations.is_empty();
            if !keep {
                tracing::debug!(
                    disease = %d.name,
                    procedure = %procedure,
                    "pruning disease with no applicable location"
                );
            }
            keep
        });
        for disease in &mut diseases {
            disease
                .locations
                .sort_by_key(|loc| procedure.location_index(loc).unwrap_or(usize::MAX));
        }
        FindingSchema {
            procedure,
            diseases,
            source: None,
        }
    }
}

fn merge_hint(slot: &mut Option<String>, hint: Option<&str>) {
    if slot.is_none() {
        *slot = hint.map(str::to_string);
    }
}

fn merge_default(defaults: &mut Vec<String>, value: Option<&str>) {
    if let Some(value) = value {
        if !defaults.iter().any(|d| d == value) {
            defaults.push(value.to_string());
        }
    }
}
