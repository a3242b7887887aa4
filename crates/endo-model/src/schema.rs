//! Compiled finding schema.
//!
//! The schema is built once per menu load (and per procedure switch) and is
//! immutable afterwards. Diseases, sections, subsections and rows keep the
//! order in which they first appear in the menu CSV.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::condition::Condition;
use crate::location::ProcedureType;
use crate::pattern::AttributePattern;

/// Identifies the menu configuration a schema was compiled from.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ConfigSource {
    /// File name or other label of the source, if known.
    pub name: Option<String>,
    /// Lowercase hex SHA-256 of the source text.
    pub sha256: String,
}

/// One selectable cell of a menu row.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum Attribute {
    /// Fixed label, toggled on or off.
    Pill { label: String },
    /// `Range(a, b)` shorthand expanded to numeric pill labels.
    Range { raw: String, labels: Vec<String> },
    /// Text interleaved with typed input boxes.
    Input { pattern: AttributePattern },
}

impl Attribute {
    /// Original cell text.
    pub fn raw(&self) -> &str {
        match self {
            Attribute::Pill { label } => label,
            Attribute::Range { raw, .. } => raw,
            Attribute::Input { pattern } => &pattern.raw,
        }
    }

    /// Toggleable labels contributed by this cell.
    pub fn pill_labels(&self) -> &[String] {
        match self {
            Attribute::Pill { label } => std::slice::from_ref(label),
            Attribute::Range { labels, .. } => labels,
            Attribute::Input { .. } => &[],
        }
    }

    /// Input pattern, if this cell is an input row.
    pub fn pattern(&self) -> Option<&AttributePattern> {
        match self {
            Attribute::Input { pattern } => Some(pattern),
            _ => None,
        }
    }
}

/// A menu CSV record routed into a section or subsection.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Row {
    pub disease: String,
    pub section: String,
    pub subsection: Option<String>,
    /// Locations (of the active procedure) this row is checked for.
    pub locations: Vec<String>,
    pub attributes: Vec<Attribute>,
    /// Visibility rule; `None` when the cell was empty.
    pub conditional: Option<Condition>,
    /// Whether the row itself declared multi-select.
    pub multi: bool,
    /// The original record, keyed by header name.
    pub source: BTreeMap<String, String>,
}

impl Row {
    /// Returns true if this row is checked for `location`.
    pub fn applies_to(&self, location: &str) -> bool {
        self.locations.iter().any(|l| l == location)
    }

    /// Conditional in normalized form, e.g. `Section(Base = Black)`.
    pub fn conditional_text(&self) -> Option<String> {
        self.conditional.as_ref().map(ToString::to_string)
    }

    /// Finds the input pattern with the given source text.
    pub fn pattern(&self, raw_key: &str) -> Option<&AttributePattern> {
        self.attributes
            .iter()
            .filter_map(Attribute::pattern)
            .find(|p| p.raw == raw_key)
    }
}

/// Borrowed view over either a section or a subsection definition.
#[derive(Debug, Clone, Copy)]
pub struct ScopeDef<'a> {
    pub name: &'a str,
    pub rows: &'a [Row],
    pub multi: bool,
    pub hint: Option<&'a str>,
    pub default_attrs: &'a [String],
}

impl<'a> ScopeDef<'a> {
    /// Finds an input pattern declared by any row of this scope.
    pub fn pattern(&self, raw_key: &str) -> Option<&'a AttributePattern> {
        self.rows.iter().find_map(|row| row.pattern(raw_key))
    }

    /// Every input pattern declared in this scope, in row order.
    pub fn patterns(&self) -> impl Iterator<Item = &'a AttributePattern> + 'a {
        self.rows
            .iter()
            .flat_map(|row| row.attributes.iter().filter_map(Attribute::pattern))
    }
}

/// Subsection of a section.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SubsectionDef {
    pub name: String,
    pub rows: Vec<Row>,
    /// True if any contributing row declared multi-select.
    pub multi: bool,
    /// First non-empty hint seen for this subsection.
    pub hint: Option<String>,
    /// Default attribute labels, deduplicated, first-seen order.
    pub default_attrs: Vec<String>,
}

impl SubsectionDef {
    /// Creates an empty subsection.
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            rows: Vec::new(),
            multi: false,
            hint: None,
            default_attrs: Vec::new(),
        }
    }

    /// Borrowed scope view.
    pub fn as_scope(&self) -> ScopeDef<'_> {
        ScopeDef {
            name: &self.name,
            rows: &self.rows,
            multi: self.multi,
            hint: self.hint.as_deref(),
            default_attrs: &self.default_attrs,
        }
    }
}

/// Section of a disease.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SectionDef {
    pub name: String,
    /// Rows without a subsection.
    pub rows: Vec<Row>,
    pub subsections: Vec<SubsectionDef>,
    /// True if any section-level row declared multi-select.
    pub multi: bool,
    /// First non-empty hint seen for this section.
    pub hint: Option<String>,
    /// Default attribute labels, deduplicated, first-seen order.
    pub default_attrs: Vec<String>,
}

impl SectionDef {
    /// Creates an empty section.
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            rows: Vec::new(),
            subsections: Vec::new(),
            multi: false,
            hint: None,
            default_attrs: Vec::new(),
        }
    }

    /// Finds a subsection by name.
    pub fn subsection(&self, name: &str) -> Option<&SubsectionDef> {
        self.subsections.iter().find(|s| s.name == name)
    }

    /// Borrowed scope view of the section level.
    pub fn as_scope(&self) -> ScopeDef<'_> {
        ScopeDef {
            name: &self.name,
            rows: &self.rows,
            multi: self.multi,
            hint: self.hint.as_deref(),
            default_attrs: &self.default_attrs,
        }
    }

    /// Section scope when `subsection` is `None`, otherwise that subsection.
    pub fn scope(&self, subsection: Option<&str>) -> Option<ScopeDef<'_>> {
        match subsection {
            None => Some(self.as_scope()),
            Some(name) => self.subsection(name).map(SubsectionDef::as_scope),
        }
    }
}

/// A selectable finding compiled from the rows sharing a diagnosis name.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Disease {
    pub name: String,
    /// Applicable locations, in procedure order.
    pub locations: Vec<String>,
    pub default_sublocation: Option<String>,
    pub sections: Vec<SectionDef>,
}

impl Disease {
    /// Creates an empty disease.
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            locations: Vec::new(),
            default_sublocation: None,
            sections: Vec::new(),
        }
    }

    /// Returns true if the disease may be reported at `location`.
    pub fn applies_to(&self, location: &str) -> bool {
        self.locations.iter().any(|l| l == location)
    }

    /// Finds a section by name.
    pub fn section(&self, name: &str) -> Option<&SectionDef> {
        self.sections.iter().find(|s| s.name == name)
    }

    /// Resolves a (section, optional subsection) scope.
    pub fn scope(&self, section: &str, subsection: Option<&str>) -> Option<ScopeDef<'_>> {
        self.section(section)?.scope(subsection)
    }
}

/// The compiled menu for one procedure type.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FindingSchema {
    pub procedure: ProcedureType,
    /// Diseases in first-seen order.
    pub diseases: Vec<Disease>,
    pub source: Option<ConfigSource>,
}

impl FindingSchema {
    /// Creates an empty schema for `procedure`.
    pub fn empty(procedure: ProcedureType) -> Self {
        Self {
            procedure,
            diseases: Vec::new(),
            source: None,
        }
    }

    /// Finds a disease by name.
    pub fn disease(&self, name: &str) -> Option<&Disease> {
        self.diseases.iter().find(|d| d.name == name)
    }

    /// Returns true if `name` is a compiled disease.
    pub fn contains(&self, name: &str) -> bool {
        self.disease(name).is_some()
    }

    /// Diseases offered at `location`, in schema order.
    pub fn diseases_at<'a>(&'a self, location: &'a str) -> impl Iterator<Item = &'a Disease> + 'a {
        self.diseases.iter().filter(move |d| d.applies_to(location))
    }

    /// Number of diseases.
    pub fn len(&self) -> usize {
        self.diseases.len()
    }

    /// Returns true if no disease survived compilation.
    pub fn is_empty(&self) -> bool {
        self.diseases.is_empty()
    }
}
