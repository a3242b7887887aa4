//! Visibility condition language.
//!
//! Rows in the menu CSV may carry a `Conditional_on` expression that decides
//! whether the row is shown, based on the current report state. The language
//! is flat: OR-separated clauses of AND-separated predicates, no parentheses.
//!
//! ```text
//! expr      := or_clause
//! or_clause := and_clause ( WS "OR" WS and_clause )*
//! and_clause:= predicate ( WS "AND" WS predicate )*
//! predicate := "Location(" "Main" "=" value ")"
//!            | "Section(" name "=" value ")"
//!            | "Subsection(" name "=" value ")"
//! ```
//!
//! Keywords are case-insensitive; names and values are trimmed but otherwise
//! compared exactly. An empty expression is always true. A predicate that
//! does not match any form is kept as [`Predicate::Unrecognized`] so the
//! evaluator can fail closed on it.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Atomic predicate of the condition language.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum Predicate {
    /// `Location(Main = <value>)`
    LocationEq { value: String },
    /// `Section(<name> = <value>)`
    SectionAttr { section: String, value: String },
    /// `Subsection(<name> = <value>)`
    SubsectionAttr { subsection: String, value: String },
    /// Anything else; always evaluates to false.
    Unrecognized { text: String },
}

/// Parsed condition expression.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(tag = "op", content = "args", rename_all = "snake_case")]
pub enum Condition {
    /// Empty expression, no restriction.
    Always,
    /// True if any child is true.
    Or(Vec<Condition>),
    /// True if every child is true.
    And(Vec<Condition>),
    /// A single predicate.
    Pred(Predicate),
}

impl Condition {
    /// Parses an expression. Never fails; unknown forms become
    /// [`Predicate::Unrecognized`].
    pub fn parse(expr: &str) -> Self {
        let expr = expr.trim();
        if expr.is_empty() {
            return Condition::Always;
        }
        let or_parts = split_keyword(expr, "OR");
        if or_parts.len() > 1 {
            return Condition::Or(or_parts.into_iter().map(parse_and).collect());
        }
        parse_and(expr)
    }

    /// Returns true for the empty expression.
    pub fn is_always(&self) -> bool {
        matches!(self, Condition::Always)
    }

    /// Collects every unrecognized predicate text in the expression.
    pub fn unrecognized(&self) -> Vec<&str> {
        let mut out = Vec::new();
        self.collect_unrecognized(&mut out);
        out
    }

    fn collect_unrecognized<'a>(&'a self, out: &mut Vec<&'a str>) {
        match self {
            Condition::Always => {}
            Condition::Or(items) | Condition::And(items) => {
                for item in items {
                    item.collect_unrecognized(out);
                }
            }
            Condition::Pred(Predicate::Unrecognized { text }) => out.push(text),
            Condition::Pred(_) => {}
        }
    }
}

impl fmt::Display for Predicate {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Predicate::LocationEq { value } => write!(f, "Location(Main = {value})"),
            Predicate::SectionAttr { section, value } => write!(f, "Section({section} = {value})"),
            Predicate::SubsectionAttr { subsection, value } => {
                write!(f, "Subsection({subsection} = {value})")
            }
            Predicate::Unrecognized { text } => write!(f, "{text}"),
        }
    }
}

impl fmt::Display for Condition {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Condition::Always => Ok(()),
            Condition::Or(items) => write_joined(f, items, " OR "),
            Condition::And(items) => write_joined(f, items, " AND "),
            Condition::Pred(pred) => write!(f, "{pred}"),
        }
    }
}

fn write_joined(f: &mut fmt::Formatter<'_>, items: &[Condition], sep: &str) -> fmt::Result {
    for (idx, item) in items.iter().enumerate() {
        if idx > 0 {
            f.write_str(sep)?;
        }
        write!(f, "{item}")?;
    }
    Ok(())
}

fn parse_and(clause: &str) -> Condition {
    let clause = clause.trim();
    if clause.is_empty() {
        return Condition::Always;
    }
    let parts = split_keyword(clause, "AND");
    if parts.len() > 1 {
        return Condition::And(parts.into_iter().map(parse_single).collect());
    }
    parse_single(clause)
}

fn parse_single(text: &str) -> Condition {
    let text = text.trim();
    if text.is_empty() {
        return Condition::Always;
    }
    Condition::Pred(parse_predicate(text))
}

/// Parses one atomic predicate.
pub fn parse_predicate(text: &str) -> Predicate {
    let text = text.trim();
    let unrecognized = || Predicate::Unrecognized {
        text: text.to_string(),
    };

    if let Some(inner) = call_body(text, "Location") {
        return match split_assignment(inner) {
            Some((name, value)) if name.eq_ignore_ascii_case("Main") => Predicate::LocationEq {
                value: value.to_string(),
            },
            _ => unrecognized(),
        };
    }
    if let Some(inner) = call_body(text, "Subsection") {
        return match split_assignment(inner) {
            Some((name, value)) => Predicate::SubsectionAttr {
                subsection: name.to_string(),
                value: value.to_string(),
            },
            None => unrecognized(),
        };
    }
    if let Some(inner) = call_body(text, "Section") {
        return match split_assignment(inner) {
            Some((name, value)) => Predicate::SectionAttr {
                section: name.to_string(),
                value: value.to_string(),
            },
            None => unrecognized(),
        };
    }
    unrecognized()
}

/// Returns the text between `<keyword>(` and the final `)`.
fn call_body<'a>(text: &'a str, keyword: &str) -> Option<&'a str> {
    let head = text.get(..keyword.len())?;
    if !head.eq_ignore_ascii_case(keyword) {
        return None;
    }
    text[keyword.len()..].strip_prefix('(')?.strip_suffix(')')
}

/// Splits `name = value` at the first `=`; both sides must be non-empty.
fn split_assignment(inner: &str) -> Option<(&str, &str)> {
    let (name, value) = inner.split_once('=')?;
    let (name, value) = (name.trim(), value.trim());
    if name.is_empty() || value.is_empty() {
        return None;
    }
    Some((name, value))
}

/// Splits `text` on `<ws>KEYWORD<ws>` (case-insensitive).
///
/// Each separator consumes exactly one whitespace character on either side of
/// the keyword; the returned parts are trimmed.
fn split_keyword<'a>(text: &'a str, keyword: &str) -> Vec<&'a str> {
    let mut parts = Vec::new();
    let mut start = 0;
    let mut search = 0;

    while let Some(found) = find_separator(text, keyword, search) {
        let (sep_start, sep_end) = found;
        parts.push(text[start..sep_start].trim());
        start = sep_end;
        search = sep_end;
    }
    parts.push(text[start..].trim());
    parts
}

/// Finds the next `<ws>KEYWORD<ws>` at or after byte `from`.
fn find_separator(text: &str, keyword: &str, from: usize) -> Option<(usize, usize)> {
    let mut chars = text[from..].char_indices().map(|(i, c)| (i + from, c));
    while let Some((idx, ch)) = chars.next() {
        if !ch.is_whitespace() {
            continue;
        }
        let kw_start = idx + ch.len_utf8();
        let Some(candidate) = text.get(kw_start..kw_start + keyword.len()) else {
            continue;
        };
        if !candidate.eq_ignore_ascii_case(keyword) {
            continue;
        }
        let after = kw_start + keyword.len();
        if let Some(next) = text[after..].chars().next() {
            if next.is_whitespace() {
                return Some((idx, after + next.len_utf8()));
            }
        }
    }
    None
}

#[cfg(test)]
mod tests {
    use super::*;

    fn section(name: &str, value: &str) -> Condition {
        Condition::Pred(Predicate::SectionAttr {
            section: name.to_string(),
            value: value.to_string(),
        })
    }

    #[test]
    fn empty_is_always() {
        assert_eq!(Condition::parse(""), Condition::Always);
        assert_eq!(Condition::parse("   \t"), Condition::Always);
    }

    #[test]
    fn parses_location_predicate() {
        assert_eq!(
            Condition::parse("location( main = Stomach )"),
            Condition::Pred(Predicate::LocationEq {
                value: "Stomach".to_string()
            })
        );
    }

    #[test]
    fn parses_section_and_subsection() {
        assert_eq!(
            Condition::parse("Section(Biopsy taken = Yes)"),
            section("Biopsy taken", "Yes")
        );
        assert_eq!(
            Condition::parse("SUBSECTION(Size=Large)"),
            Condition::Pred(Predicate::SubsectionAttr {
                subsection: "Size".to_string(),
                value: "Large".to_string()
            })
        );
    }

    #[test]
    fn value_may_contain_equals_and_parens() {
        assert_eq!(
            Condition::parse("Section(Grade = LA (B) = severe)"),
            section("Grade", "LA (B) = severe")
        );
    }

    #[test]
    fn or_binds_looser_than_and() {
        let parsed = Condition::parse("Section(A = 1) and Section(B = 2) Or Section(C = 3)");
        assert_eq!(
            parsed,
            Condition::Or(vec![
                Condition::And(vec![section("A", "1"), section("B", "2")]),
                section("C", "3"),
            ])
        );
    }

    #[test]
    fn keyword_inside_word_does_not_split() {
        assert_eq!(
            Condition::parse("Section(Colour = Orange)"),
            section("Colour", "Orange")
        );
        assert_eq!(
            Condition::parse("Section(Shape = Round AND flat)"),
            Condition::And(vec![
                Condition::Pred(Predicate::Unrecognized {
                    text: "Section(Shape = Round".to_string()
                }),
                Condition::Pred(Predicate::Unrecognized {
                    text: "flat)".to_string()
                }),
            ])
        );
    }

    #[test]
    fn unknown_forms_are_unrecognized() {
        let parsed = Condition::parse("Location(Side = Left) OR Foo(bar)");
        assert_eq!(
            parsed.unrecognized(),
            vec!["Location(Side = Left)", "Foo(bar)"]
        );
        assert!(matches!(
            parse_predicate("Section(= Yes)"),
            Predicate::Unrecognized { .. }
        ));
        assert!(matches!(
            parse_predicate("Section (A = B)"),
            Predicate::Unrecognized { .. }
        ));
    }

    #[test]
    fn empty_clause_between_keywords_is_always() {
        assert_eq!(
            Condition::parse("Section(A = 1) OR  OR Section(B = 2)"),
            Condition::Or(vec![
                section("A", "1"),
                Condition::Always,
                section("B", "2")
            ])
        );
    }

    #[test]
    fn display_round_trips_structure() {
        let parsed = Condition::parse("Section(A = 1) AND Location(Main = Stomach)");
        assert_eq!(
            parsed.to_string(),
            "Section(A = 1) AND Location(Main = Stomach)"
        );
        assert_eq!(Condition::parse(&parsed.to_string()), parsed);
    }
}
