//! Interpretation of individual menu cells.

use endo_model::pattern::contains_box_marker;
use endo_model::{Attribute, AttributePattern};

/// Returns true if a location cell marks the row as applicable.
///
/// Any non-empty value containing an `x` (either case) counts.
pub fn is_checked(cell: &str) -> bool {
    cell.to_ascii_lowercase().contains('x')
}

/// Returns true if a `Multi_Attribute` cell declares multi-select.
pub fn is_multi_flag(cell: &str) -> bool {
    let lowered = cell.to_ascii_lowercase();
    lowered.contains('x') || lowered.contains("yes") || lowered.contains("multi")
}

/// Upper bound on labels a single range may expand to.
pub const MAX_RANGE_LABELS: i64 = 1000;

/// Returns true if the cell uses the `Range(` shorthand.
pub fn is_range(cell: &str) -> bool {
    cell.get(..6)
        .is_some_and(|head| head.eq_ignore_ascii_case("range("))
}

/// Expands `Range(a, b)` into `a, a+1, ..., b-1`.
///
/// Matching is case-insensitive and tolerates spaces around the bounds.
/// Returns `None` when the cell is not a well-formed range or spans more
/// than [`MAX_RANGE_LABELS`] values. An empty or inverted range expands to
/// no labels.
pub fn expand_range(cell: &str) -> Option<Vec<String>> {
    let cell = cell.trim();
    if !is_range(cell) {
        return None;
    }
    let body = cell[6..].strip_suffix(')')?;
    let (start, end) = body.split_once(',')?;
    let start = parse_bound(start)?;
    let end = parse_bound(end)?;
    if end.saturating_sub(start) > MAX_RANGE_LABELS {
        return None;
    }
    Some((start..end).map(|n| n.to_string()).collect())
}

fn parse_bound(text: &str) -> Option<i64> {
    let text = text.trim();
    let digits = text.strip_prefix('-').unwrap_or(text);
    if digits.is_empty() || !digits.bytes().all(|b| b.is_ascii_digit()) {
        return None;
    }
    text.parse().ok()
}

/// Outcome of classifying an attribute cell.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CellKind {
    Attribute(Attribute),
    /// A `Range(` cell that could not be expanded.
    MalformedRange(Attribute),
}

/// Classifies a non-empty attribute cell.
///
/// Precedence: range shorthand, then input pattern (any box keyword), then
/// plain pill.
pub fn classify_attribute(cell: &str) -> CellKind {
    if is_range(cell) {
        return match expand_range(cell) {
            Some(labels) => CellKind::Attribute(Attribute::Range {
                raw: cell.to_string(),
                labels,
            }),
            None => CellKind::MalformedRange(Attribute::Range {
                raw: cell.to_string(),
                labels: Vec::new(),
            }),
        };
    }
    if contains_box_marker(cell) {
        return CellKind::Attribute(Attribute::Input {
            pattern: AttributePattern::parse(cell),
        });
    }
    CellKind::Attribute(Attribute::Pill {
        label: cell.to_string(),
    })
}
