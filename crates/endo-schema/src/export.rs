//! Canonical schema summary for the dictation backend.
//!
//! The export is a compact JSON view of the compiled schema: procedure
//! locations, their sub-location layouts, and per disease the locations,
//! default sub-location and section structure with raw attribute strings.
//! Object keys keep schema order.

use serde::ser::{Serialize, SerializeMap, Serializer};

use endo_ingest::columns;
use endo_model::{Attribute, FindingSchema, ProcedureType, Row, SublocationLayout};

/// Map serialized as a JSON object in insertion order.
#[derive(Debug, Clone, PartialEq)]
pub struct OrderedMap<V>(pub Vec<(String, V)>);

impl<V> Default for OrderedMap<V> {
    fn default() -> Self {
        Self(Vec::new())
    }
}

impl<V> OrderedMap<V> {
    pub fn get(&self, key: &str) -> Option<&V> {
        self.0.iter().find(|(k, _)| k == key).map(|(_, v)| v)
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl<V: Serialize> Serialize for OrderedMap<V> {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(Some(self.0.len()))?;
        for (key, value) in &self.0 {
            map.serialize_entry(key, value)?;
        }
        map.end()
    }
}

/// Key under which a matrix's heading options are exported.
pub const STANDALONE_KEY: &str = "_standalone";

/// Exported sub-location layout.
#[derive(Debug, Clone, PartialEq, serde::Serialize)]
#[serde(untagged)]
pub enum SublocationExport {
    List(Vec<String>),
    Matrix(OrderedMap<Vec<String>>),
}

#[derive(Debug, Clone, PartialEq, serde::Serialize)]
pub struct SubsectionExport {
    pub multi: bool,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub attributes: Vec<String>,
    /// Last non-empty conditional expression seen for the subsection.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub conditional: Option<String>,
}

#[derive(Debug, Clone, PartialEq, serde::Serialize)]
pub struct SectionExport {
    pub multi: bool,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub attributes: Vec<String>,
    #[serde(skip_serializing_if = "OrderedMap::is_empty")]
    pub subsections: OrderedMap<SubsectionExport>,
}

#[derive(Debug, Clone, PartialEq, serde::Serialize)]
pub struct DiseaseExport {
    pub locations: Vec<String>,
    /// Empty when no default is declared.
    pub default_sublocation: String,
    pub sections: OrderedMap<SectionExport>,
}

/// The dictation schema document.
#[derive(Debug, Clone, PartialEq, serde::Serialize)]
pub struct DictationSchema {
    pub locations: Vec<String>,
    pub sublocations: OrderedMap<SublocationExport>,
    pub diseases: OrderedMap<DiseaseExport>,
}

impl DictationSchema {
    /// Pretty-printed JSON.
    pub fn to_json_string(&self) -> serde_json::Result<String> {
        serde_json::to_string_pretty(self)
    }
}

/// Builds the dictation export of `schema`.
pub fn export_schema(schema: &FindingSchema) -> DictationSchema {
    let diseases = schema
        .diseases
        .iter()
        .map(|disease| {
            let sections = disease
                .sections
                .iter()
                .map(|section| {
                    let subsections = section
                        .subsections
                        .iter()
                        .map(|sub| {
                            let export = SubsectionExport {
                                multi: sub.multi,
                                attributes: raw_attributes(&sub.rows),
                                conditional: sub
                                    .rows
                                    .iter()
                                    .rev()
                                    .find_map(|row| {
                                        row.source
                                            .get(columns::CONDITIONAL_ON)
                                            .filter(|c| !c.is_empty())
                                    })
                                    .cloned(),
                            };
                            (sub.name.clone(), export)
                        })
                        .collect();
                    let export = SectionExport {
                        multi: section.multi,
                        attributes: raw_attributes(&section.rows),
                        subsections: OrderedMap(subsections),
                    };
                    (section.name.clone(), export)
                })
                .collect();
            let export = DiseaseExport {
                locations: disease.locations.clone(),
                default_sublocation: disease.default_sublocation.clone().unwrap_or_default(),
                sections: OrderedMap(sections),
            };
            (disease.name.clone(), export)
        })
        .collect();

    DictationSchema {
        locations: location_names(schema.procedure),
        sublocations: export_sublocations(schema.procedure),
        diseases: OrderedMap(diseases),
    }
}

fn location_names(procedure: ProcedureType) -> Vec<String> {
    procedure.locations().iter().map(|l| l.to_string()).collect()
}

fn export_sublocations(procedure: ProcedureType) -> OrderedMap<SublocationExport> {
    let entries = procedure
        .locations()
        .iter()
        .filter_map(|loc| {
            let export = match SublocationLayout::for_location(loc) {
                SublocationLayout::None => return None,
                SublocationLayout::List(options) => {
                    SublocationExport::List(options.iter().map(|o| o.to_string()).collect())
                }
                SublocationLayout::Matrix(rows) => SublocationExport::Matrix(OrderedMap(
                    rows.iter()
                        .map(|row| {
                            let key = if row.is_heading {
                                STANDALONE_KEY
                            } else {
                                row.region
                            };
                            let options = row.options.iter().map(|o| o.to_string()).collect();
                            (key.to_string(), options)
                        })
                        .collect(),
                )),
            };
            Some((loc.to_string(), export))
        })
        .collect();
    OrderedMap(entries)
}

/// Raw attribute strings of `rows`, deduplicated in first-seen order.
fn raw_attributes(rows: &[Row]) -> Vec<String> {
    let mut out: Vec<String> = Vec::new();
    for raw in rows.iter().flat_map(|r| r.attributes.iter().map(Attribute::raw)) {
        if !out.iter().any(|seen| seen == raw) {
            out.push(raw.to_string());
        }
    }
    out
}
