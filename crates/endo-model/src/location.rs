//! Procedure types and the anatomical location catalog.
//!
//! Each procedure type has a fixed, ordered list of main locations. The
//! menu CSV carries one "checked" column per location name, so these names
//! double as column headers.
//!
//! Some locations offer finer sub-locations, either as a flat list of pills
//! or as a region/option matrix. Matrix selections are stored as composite
//! `"Region - Option"` keys, except for heading rows whose options are
//! stored bare.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Separator between region and option in composite sub-location keys.
pub const COMPOSITE_SEPARATOR: &str = " - ";

const ENDOSCOPY_LOCATIONS: &[&str] = &["Esophagus", "GE Junction", "Stomach", "Duodenum"];

const COLONOSCOPY_LOCATIONS: &[&str] = &[
    "Terminal Ileum",
    "IC Valve",
    "Caecum",
    "Ascending Colon",
    "Transverse Colon",
    "Descending Colon",
    "Sigmoid",
    "Rectum",
    "Anal Canal",
];

/// Kind of procedure being reported on.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ProcedureType {
    /// Upper GI endoscopy (EGD).
    #[default]
    Endoscopy,
    /// Lower GI colonoscopy.
    Colonoscopy,
}

impl ProcedureType {
    /// All procedure types in display order.
    pub const ALL: [ProcedureType; 2] = [ProcedureType::Endoscopy, ProcedureType::Colonoscopy];

    /// Returns the canonical lowercase name.
    pub fn as_str(&self) -> &'static str {
        match self {
            ProcedureType::Endoscopy => "endoscopy",
            ProcedureType::Colonoscopy => "colonoscopy",
        }
    }

    /// Ordered main locations for this procedure.
    pub fn locations(&self) -> &'static [&'static str] {
        match self {
            ProcedureType::Endoscopy => ENDOSCOPY_LOCATIONS,
            ProcedureType::Colonoscopy => COLONOSCOPY_LOCATIONS,
        }
    }

    /// First location of the procedure, used as the initial main location.
    pub fn first_location(&self) -> &'static str {
        self.locations()[0]
    }

    /// Returns true if `location` is one of this procedure's main locations.
    pub fn has_location(&self, location: &str) -> bool {
        self.locations().contains(&location)
    }

    /// Position of `location` in the procedure order, if present.
    pub fn location_index(&self, location: &str) -> Option<usize> {
        self.locations().iter().position(|l| *l == location)
    }
}

impl fmt::Display for ProcedureType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl FromStr for ProcedureType {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "endoscopy" | "egd" | "upper" => Ok(ProcedureType::Endoscopy),
            "colonoscopy" | "colono" | "lower" => Ok(ProcedureType::Colonoscopy),
            other => Err(format!("unknown procedure type: {other}")),
        }
    }
}

/// One row of a sub-location matrix.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct MatrixRow {
    /// Region name shown in the first column.
    pub region: &'static str,
    /// Heading rows are not selectable and store their options bare.
    pub is_heading: bool,
    /// Options offered for this region.
    pub options: &'static [&'static str],
}

impl MatrixRow {
    /// Storage key for `option` in this row.
    pub fn storage_key(&self, option: &str) -> String {
        if self.is_heading {
            option.to_string()
        } else {
            composite_key(self.region, option)
        }
    }
}

const STOMACH_MATRIX: &[MatrixRow] = &[
    MatrixRow {
        region: "Antrum",
        is_heading: false,
        options: &[
            "Lesser Curvature",
            "Greater Curvature",
            "Posterior Wall",
            "Anterior Wall",
            "Entire",
        ],
    },
    MatrixRow {
        region: "Incisura",
        is_heading: false,
        options: &["Lesser Curvature", "Posterior Wall", "Anterior Wall", "Entire"],
    },
    MatrixRow {
        region: "Lower Body",
        is_heading: false,
        options: &[
            "Lesser Curvature",
            "Greater Curvature",
            "Posterior Wall",
            "Anterior Wall",
            "Entire",
        ],
    },
    MatrixRow {
        region: "Middle Upper Body",
        is_heading: false,
        options: &[
            "Lesser Curvature",
            "Greater Curvature",
            "Posterior Wall",
            "Anterior Wall",
            "Entire",
        ],
    },
    MatrixRow {
        region: "Fundus",
        is_heading: false,
        options: &[
            "Lesser Curvature",
            "Greater Curvature",
            "Posterior Wall",
            "Anterior Wall",
            "Entire",
        ],
    },
    MatrixRow {
        region: "Other",
        is_heading: true,
        options: &[
            "Whole Stomach",
            "Whole Body",
            "Cardia",
            "Prepyloric region",
            "Pylorus",
            "Anastomosis",
        ],
    },
];

const DUODENUM_MATRIX: &[MatrixRow] = &[
    MatrixRow {
        region: "D1 Bulb",
        is_heading: false,
        options: &[
            "Anterior wall",
            "Posterior wall",
            "Superior wall",
            "Inferior wall",
            "Entire",
        ],
    },
    MatrixRow {
        region: "D2",
        is_heading: false,
        options: &[
            "Ampullary region",
            "Medial wall",
            "Lateral wall",
            "Inferior wall",
            "Superior wall",
            "Entire",
        ],
    },
    MatrixRow {
        region: "Other",
        is_heading: true,
        options: &[
            "D1-D2 junction",
            "D3",
            "D4",
            "Anastomosis",
            "Major papilla",
            "Minor papilla",
        ],
    },
];

/// How sub-locations are offered for a main location.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(tag = "layout", content = "entries", rename_all = "lowercase")]
pub enum SublocationLayout {
    /// No sub-locations.
    None,
    /// Flat list of independently toggled options.
    List(&'static [&'static str]),
    /// Region/option matrix with auto-maintained region markers.
    Matrix(&'static [MatrixRow]),
}

impl SublocationLayout {
    /// Returns the layout for `location` (unknown locations have none).
    pub fn for_location(location: &str) -> Self {
        match location {
            "Esophagus" => SublocationLayout::List(&[
                "Cricopharynx",
                "Upper",
                "Middle",
                "Lower",
                "Whole esophagus",
                "Anastomosis",
            ]),
            "GE Junction" => {
                SublocationLayout::List(&["Z-line", "Hiatal hernia", "Diaphragmatic pinch"])
            }
            "Stomach" => SublocationLayout::Matrix(STOMACH_MATRIX),
            "Duodenum" => SublocationLayout::Matrix(DUODENUM_MATRIX),
            "Rectum" => SublocationLayout::List(&[
                "Anterior wall",
                "Posterior wall",
                "Right Lateral wall",
                "Left Lateral wall",
            ]),
            _ => SublocationLayout::None,
        }
    }

    /// Matrix rows, if this is a matrix layout.
    pub fn matrix(&self) -> Option<&'static [MatrixRow]> {
        match self {
            SublocationLayout::Matrix(rows) => Some(rows),
            _ => None,
        }
    }

    /// Finds the matrix row for `region`.
    pub fn matrix_row(&self, region: &str) -> Option<&'static MatrixRow> {
        self.matrix()?.iter().find(|row| row.region == region)
    }
}

/// Builds a composite `"Region - Option"` key.
pub fn composite_key(region: &str, option: &str) -> String {
    format!("{region}{COMPOSITE_SEPARATOR}{option}")
}

/// Splits a composite key at the first separator.
///
/// Returns `None` for plain keys and for keys with an empty region.
pub fn split_composite(key: &str) -> Option<(&str, &str)> {
    let idx = key.find(COMPOSITE_SEPARATOR)?;
    if idx == 0 {
        return None;
    }
    Some((&key[..idx], &key[idx + COMPOSITE_SEPARATOR.len()..]))
}

/// Returns true if `key` is a composite option belonging to `region`.
pub fn belongs_to_region(key: &str, region: &str) -> bool {
    key.strip_prefix(region)
        .is_some_and(|rest| rest.starts_with(COMPOSITE_SEPARATOR))
}
