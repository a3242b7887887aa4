//! Header row normalization and well-known column names.

/// Well-known column names of the menu CSV.
pub mod columns {
    pub const DIAGNOSIS: &str = "Diagnosis";
    pub const SECTION: &str = "Section";
    pub const SUBSECTION: &str = "Subsection";
    pub const DEFAULT_SUB_LOCATION: &str = "Default_Sub_Location";
    pub const CONDITIONAL_ON: &str = "Conditional_on";
    pub const MULTI_ATTRIBUTE: &str = "Multi_Attribute";
    pub const DEFAULT_ATTR: &str = "Default_Attr";
    pub const SECTION_HINT: &str = "Section_Hint";
    pub const SUBSECTION_HINT: &str = "Subsection_Hint";

    /// Prefix shared by the attribute-pattern columns (`Attribute1`, ...).
    pub const ATTRIBUTE_PREFIX: &str = "Attribute";

    /// Columns whose absence is reported.
    pub const REQUIRED: [&str; 2] = [DIAGNOSIS, SECTION];
}

/// Normalized header row.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ConfigHeaders {
    /// Column names, trimmed, blanks replaced with `col<index>`.
    pub columns: Vec<String>,
}

impl ConfigHeaders {
    /// Builds headers from raw header cells.
    pub fn from_raw<'a>(cells: impl IntoIterator<Item = &'a str>) -> Self {
        let columns = cells
            .into_iter()
            .enumerate()
            .map(|(idx, cell)| normalize_header(cell, idx))
            .collect();
        Self { columns }
    }

    /// Returns the number of columns.
    pub fn len(&self) -> usize {
        self.columns.len()
    }

    /// Returns true if there are no columns.
    pub fn is_empty(&self) -> bool {
        self.columns.is_empty()
    }

    /// Returns true if a column with this exact name exists.
    pub fn contains(&self, name: &str) -> bool {
        self.columns.iter().any(|c| c == name)
    }

    /// Required columns that are absent.
    pub fn missing_required(&self) -> Vec<&'static str> {
        columns::REQUIRED
            .into_iter()
            .filter(|name| !self.contains(name))
            .collect()
    }

    /// Attribute-pattern columns in attribute order.
    ///
    /// Columns named with the `Attribute` prefix (case-insensitive) are
    /// ordered by their numeric suffix; columns without a numeric suffix
    /// follow in header order.
    pub fn attribute_columns(&self) -> Vec<&str> {
        let mut found: Vec<(Option<u64>, usize, &str)> = self
            .columns
            .iter()
            .enumerate()
            .filter_map(|(idx, name)| {
                let suffix = strip_prefix_ignore_case(name, columns::ATTRIBUTE_PREFIX)?;
                Some((suffix.trim().parse::<u64>().ok(), idx, name.as_str()))
            })
            .collect();
        found.sort_by_key(|(n, idx, _)| (n.is_none(), n.unwrap_or(0), *idx));
        found.into_iter().map(|(_, _, name)| name).collect()
    }
}

/// Normalizes one header cell: trims whitespace and a leading BOM, and
/// names blank cells after their position.
pub fn normalize_header(value: &str, idx: usize) -> String {
    let trimmed = value.trim_start_matches('\u{feff}').trim();
    if trimmed.is_empty() {
        format!("col{idx}")
    } else {
        trimmed.to_string()
    }
}

fn strip_prefix_ignore_case<'a>(text: &'a str, prefix: &str) -> Option<&'a str> {
    let head = text.get(..prefix.len())?;
    head.eq_ignore_ascii_case(prefix)
        .then(|| &text[prefix.len()..])
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_normalize_header() {
        assert_eq!(normalize_header("  Diagnosis  ", 0), "Diagnosis");
        assert_eq!(normalize_header("\u{feff}Diagnosis", 0), "Diagnosis");
        assert_eq!(normalize_header("   ", 3), "col3");
    }

    #[test]
    fn test_missing_required() {
        let headers = ConfigHeaders::from_raw(["Diagnosis", "Stomach"]);
        assert_eq!(headers.missing_required(), vec!["Section"]);
    }

    #[test]
    fn test_attribute_columns_sorted_by_suffix() {
        let headers = ConfigHeaders::from_raw([
            "Diagnosis",
            "Attribute10",
            "attribute2",
            "Multi_Attribute",
            "Attribute1",
            "Attribute_extra",
        ]);
        assert_eq!(
            headers.attribute_columns(),
            vec!["Attribute1", "attribute2", "Attribute10", "Attribute_extra"]
        );
    }
}
