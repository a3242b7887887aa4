//! Command implementations.
//!
//! Commands build their output as strings or tables and leave printing to
//! the binary, so they can be exercised without a terminal.

use std::fs;
use std::path::Path;

use anyhow::{Context, Result, bail};
use comfy_table::modifiers::UTF8_ROUND_CORNERS;
use comfy_table::presets::UTF8_FULL_CONDENSED;
use comfy_table::{Attribute as CellAttribute, Cell, Color, ContentArrangement, Table};
use tracing::{debug, info, info_span};

use endo_ingest::{ConfigWarning, read_config_file};
use endo_model::{
    ActivePointer, Attribute, FindingSchema, ProcedureType, ReportDocument, Row,
    SublocationLayout,
};
use endo_report::Session;
use endo_schema::{Compilation, compile, export_schema};

use crate::logging::redact_value;

// ============================================================================
// Loading
// ============================================================================

/// Reads and compiles the menu CSV at `path`.
pub fn load_menu(path: &Path, procedure: ProcedureType) -> Result<Compilation> {
    let span = info_span!("menu", path = %path.display(), %procedure);
    let _guard = span.enter();
    let parsed =
        read_config_file(path).with_context(|| format!("read menu {}", path.display()))?;
    let compilation = compile(&parsed, procedure);
    info!(
        records = parsed.records.len(),
        diseases = compilation.schema.len(),
        warnings = compilation.warnings.len(),
        "compiled menu"
    );
    Ok(compilation)
}

/// Reads a saved report document.
pub fn load_report(path: &Path) -> Result<ReportDocument> {
    let text =
        fs::read_to_string(path).with_context(|| format!("read report {}", path.display()))?;
    let document = ReportDocument::from_json_str(&text)
        .with_context(|| format!("parse report {}", path.display()))?;
    info!(
        path = %path.display(),
        uhid = document.uhid().map(redact_value).unwrap_or("-"),
        diseases = document.report.disease_count(),
        "loaded report"
    );
    Ok(document)
}

// ============================================================================
// Commands
// ============================================================================

/// Location catalog of `procedure` with each location's sub-location layout.
pub fn locations_table(procedure: ProcedureType) -> Table {
    let mut table = Table::new();
    table.set_header(vec![
        header_cell("Location"),
        header_cell("Layout"),
        header_cell("Sub-locations"),
    ]);
    apply_table_style(&mut table);
    for location in procedure.locations() {
        let (layout, options) = match SublocationLayout::for_location(location) {
            SublocationLayout::None => ("none", "-".to_string()),
            SublocationLayout::List(options) => ("list", options.join(", ")),
            SublocationLayout::Matrix(rows) => {
                let regions: Vec<&str> = rows
                    .iter()
                    .filter(|row| !row.is_heading)
                    .map(|row| row.region)
                    .collect();
                ("matrix", regions.join(", "))
            }
        };
        table.add_row(vec![Cell::new(location), Cell::new(layout), Cell::new(options)]);
    }
    table
}

/// Outcome of `check`: the compiled menu and everything worth reporting.
#[derive(Debug)]
pub struct CheckOutcome {
    pub diseases: usize,
    pub warnings: Vec<ConfigWarning>,
}

impl CheckOutcome {
    pub fn from_compilation(compilation: &Compilation) -> Self {
        Self {
            diseases: compilation.schema.len(),
            warnings: compilation.warnings.clone(),
        }
    }

    /// Process exit code: non-zero when the menu produced warnings.
    pub fn exit_code(&self) -> i32 {
        i32::from(!self.warnings.is_empty())
    }

    pub fn render(&self) -> String {
        let mut lines = vec![format!(
            "{} diseases, {} warnings",
            self.diseases,
            self.warnings.len()
        )];
        lines.extend(self.warnings.iter().map(|w| format!("warning: {w}")));
        lines.join("\n")
    }
}

/// One row per disease with its locations, sections and default sub-location.
pub fn schema_table(schema: &FindingSchema) -> Table {
    let mut table = Table::new();
    table.set_header(vec![
        header_cell("Disease"),
        header_cell("Locations"),
        header_cell("Sections"),
        header_cell("Default sub-location"),
    ]);
    apply_table_style(&mut table);
    for disease in &schema.diseases {
        let sections: Vec<&str> = disease.sections.iter().map(|s| s.name.as_str()).collect();
        table.add_row(vec![
            Cell::new(&disease.name),
            Cell::new(disease.locations.join(", ")),
            Cell::new(sections.join(", ")),
            Cell::new(disease.default_sublocation.as_deref().unwrap_or("-")),
        ]);
    }
    table
}

/// Dictation schema export as pretty JSON.
pub fn schema_json(schema: &FindingSchema) -> Result<String> {
    export_schema(schema)
        .to_json_string()
        .context("serialize dictation schema")
}

/// Plain-text summary of `document` against `schema`.
pub fn render_report(schema: FindingSchema, document: ReportDocument) -> String {
    let mut session = Session::new(schema);
    session.load_document(document);
    session.summary()
}

/// Visible rows of one disease in a loaded report.
pub struct VisibleRows {
    pub active: ActivePointer,
    pub table: Table,
}

/// Lists the rows currently shown for the report's active disease, or for
/// `target` when given.
pub fn visible_rows(
    schema: FindingSchema,
    document: ReportDocument,
    target: Option<(&str, &str)>,
) -> Result<VisibleRows> {
    let mut session = Session::new(schema);
    session.load_document(document);
    if let Some((location, disease)) = target {
        if !session.open_disease(location, disease) {
            bail!("report has no {disease} at {location}");
        }
    }
    let Some(active) = session.active().cloned() else {
        bail!("report has no diseases");
    };
    debug!(loc = %active.loc, disease = %active.disease, "listing visible rows");

    let mut table = Table::new();
    table.set_header(vec![
        header_cell("Section"),
        header_cell("Subsection"),
        header_cell("Attributes"),
        header_cell("Condition"),
    ]);
    apply_table_style(&mut table);
    for section in session.visible_sections() {
        for row in &section.rows {
            table.add_row(row_cells(&section.def.name, "", row));
        }
        for sub in &section.subsections {
            for row in &sub.rows {
                table.add_row(row_cells(&section.def.name, &sub.def.name, row));
            }
        }
    }
    Ok(VisibleRows { active, table })
}

fn row_cells(section: &str, subsection: &str, row: &Row) -> Vec<Cell> {
    let attributes: Vec<&str> = row.attributes.iter().map(Attribute::raw).collect();
    vec![
        Cell::new(section),
        Cell::new(subsection),
        Cell::new(attributes.join(", ")),
        match row.conditional_text() {
            Some(text) => Cell::new(text),
            None => Cell::new("-").fg(Color::DarkGrey),
        },
    ]
}

// ============================================================================
// Table Styling
// ============================================================================

pub fn apply_table_style(table: &mut Table) {
    table
        .load_preset(UTF8_FULL_CONDENSED)
        .apply_modifier(UTF8_ROUND_CORNERS)
        .set_content_arrangement(ContentArrangement::Dynamic)
        .set_width(120);
}

fn header_cell(label: &str) -> Cell {
    Cell::new(label)
        .fg(Color::Cyan)
        .add_attribute(CellAttribute::Bold)
}
