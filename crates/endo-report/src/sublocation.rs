//! Sub-location selection rules.
//!
//! Plain lists toggle keys independently. Matrix layouts store a region
//! marker alongside `"Region - Option"` keys and keep the two consistent:
//!
//! - selecting an option adds its region marker
//! - removing the last option of a region removes the marker
//! - removing a region marker removes every option of that region
//!
//! Heading-row options are stored bare and do not touch any region marker.

use endo_model::MatrixRow;
use endo_model::location::{belongs_to_region, split_composite};

/// Toggles `key` in a plain list. Returns true if it is now selected.
pub fn toggle_plain(sublocations: &mut Vec<String>, key: &str) -> bool {
    if let Some(pos) = sublocations.iter().position(|s| s == key) {
        sublocations.remove(pos);
        false
    } else {
        sublocations.push(key.to_string());
        true
    }
}

/// Toggles a region marker. Returns true if the region is now selected.
pub fn toggle_region(sublocations: &mut Vec<String>, region: &str) -> bool {
    if sublocations.iter().any(|s| s == region) {
        sublocations.retain(|s| s != region && !belongs_to_region(s, region));
        false
    } else {
        sublocations.push(region.to_string());
        true
    }
}

/// Toggles one option of a matrix row. Returns true if it is now selected.
pub fn toggle_matrix_option(sublocations: &mut Vec<String>, row: &MatrixRow, option: &str) -> bool {
    let key = row.storage_key(option);
    if let Some(pos) = sublocations.iter().position(|s| *s == key) {
        sublocations.remove(pos);
        if !row.is_heading && !sublocations.iter().any(|s| belongs_to_region(s, row.region)) {
            sublocations.retain(|s| s != row.region);
        }
        false
    } else {
        sublocations.push(key);
        if !row.is_heading && !sublocations.iter().any(|s| s == row.region) {
            sublocations.push(row.region.to_string());
        }
        true
    }
}

/// Appends the region marker of every composite key whose region is
/// missing. Returns the number of markers added.
pub fn add_implied_regions(sublocations: &mut Vec<String>) -> usize {
    let mut missing: Vec<String> = Vec::new();
    for key in sublocations.iter() {
        if let Some((region, _)) = split_composite(key) {
            if !sublocations.iter().any(|s| s == region) && !missing.iter().any(|m| m == region)
            {
                missing.push(region.to_string());
            }
        }
    }
    let added = missing.len();
    sublocations.extend(missing);
    added
}

#[cfg(test)]
mod tests {
    use super::*;
    use endo_model::SublocationLayout;

    fn antrum() -> &'static MatrixRow {
        SublocationLayout::for_location("Stomach")
            .matrix_row("Antrum")
            .unwrap()
    }

    fn heading() -> &'static MatrixRow {
        SublocationLayout::for_location("Stomach")
            .matrix()
            .unwrap()
            .iter()
            .find(|row| row.is_heading)
            .unwrap()
    }

    #[test]
    fn test_plain_toggle() {
        let mut subs = Vec::new();
        assert!(toggle_plain(&mut subs, "Lower"));
        assert!(toggle_plain(&mut subs, "Upper"));
        assert!(!toggle_plain(&mut subs, "Lower"));
        assert_eq!(subs, vec!["Upper"]);
    }

    #[test]
    fn test_option_adds_and_removes_region() {
        let row = antrum();
        let first = row.options[0];
        let second = row.options[1];
        let mut subs = Vec::new();

        assert!(toggle_matrix_option(&mut subs, row, first));
        assert_eq!(subs, vec![row.storage_key(first), "Antrum".to_string()]);

        toggle_matrix_option(&mut subs, row, second);
        assert!(!toggle_matrix_option(&mut subs, row, first));
        assert!(subs.iter().any(|s| s == "Antrum"));

        assert!(!toggle_matrix_option(&mut subs, row, second));
        assert!(subs.is_empty());
    }

    #[test]
    fn test_region_removal_clears_options() {
        let row = antrum();
        let mut subs = vec!["Cardia".to_string()];
        toggle_matrix_option(&mut subs, row, row.options[0]);
        toggle_matrix_option(&mut subs, row, row.options[1]);

        assert!(!toggle_region(&mut subs, "Antrum"));
        assert_eq!(subs, vec!["Cardia"]);
        assert!(toggle_region(&mut subs, "Antrum"));
        assert_eq!(subs, vec!["Cardia", "Antrum"]);
    }

    #[test]
    fn test_heading_options_are_bare() {
        let row = heading();
        let option = row.options[0];
        let mut subs = Vec::new();
        assert!(toggle_matrix_option(&mut subs, row, option));
        assert_eq!(subs, vec![option.to_string()]);
        assert!(!toggle_matrix_option(&mut subs, row, option));
        assert!(subs.is_empty());
    }

    #[test]
    fn test_implied_regions() {
        let mut subs = vec![
            "Antrum - Posterior Wall".to_string(),
            "Antrum - Lesser Curvature".to_string(),
            "Body".to_string(),
            " - odd".to_string(),
        ];
        assert_eq!(add_implied_regions(&mut subs), 1);
        assert_eq!(subs.last().map(String::as_str), Some("Antrum"));
        assert_eq!(add_implied_regions(&mut subs), 0);
    }
}
