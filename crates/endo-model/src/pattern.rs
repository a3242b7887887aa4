//! Attribute pattern tokenizer.
//!
//! An attribute cell such as `int_box mm from alphanum_box` describes a row of
//! literal text interleaved with typed input boxes. The tokenizer turns the
//! cell into an ordered token list. Stored input values are positional
//! against this list, so the same pattern string must always produce the same
//! tokens.
//!
//! # Scanning rules
//!
//! 1. The pattern is split on whitespace into words.
//! 2. Each word is scanned left to right. At every position the box keywords
//!    (`int_box`, `float_box`, `alphanum_box`) are tried case-insensitively;
//!    the leftmost match wins. No keyword is a prefix of another, so at most
//!    one keyword can match at a given position.
//! 3. Characters between keyword matches are kept verbatim as a single text
//!    token. A word without keywords is one text token; a word that is
//!    exactly one keyword is one box token; a compound word such as
//!    `int_box:int_box` becomes box, text(`:`), box.

use serde::{Deserialize, Serialize};

const INT_KEYWORD: &str = "int_box";
const FLOAT_KEYWORD: &str = "float_box";
const ALPHANUM_KEYWORD: &str = "alphanum_box";

/// Type of an input box.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum BoxKind {
    /// Whole number input.
    Int,
    /// Decimal number input.
    Float,
    /// Free-text input.
    Alphanum,
}

impl BoxKind {
    const ALL: [BoxKind; 3] = [BoxKind::Int, BoxKind::Float, BoxKind::Alphanum];

    /// Keyword used in the menu CSV for this box.
    pub fn keyword(&self) -> &'static str {
        match self {
            BoxKind::Int => INT_KEYWORD,
            BoxKind::Float => FLOAT_KEYWORD,
            BoxKind::Alphanum => ALPHANUM_KEYWORD,
        }
    }

    /// Returns true if `value` is acceptable for this box.
    ///
    /// Empty values are always acceptable (they clear the box).
    pub fn accepts(&self, value: &str) -> bool {
        let value = value.trim();
        if value.is_empty() {
            return true;
        }
        match self {
            BoxKind::Int => value.parse::<i64>().is_ok(),
            BoxKind::Float => value.parse::<f64>().is_ok_and(f64::is_finite),
            BoxKind::Alphanum => true,
        }
    }
}

/// One token of a parsed attribute pattern.
///
/// Serialized with a `type` tag to match the persisted report format:
/// `{"type":"text","value":"mm"}`, `{"type":"int_box"}`.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum PatternToken {
    /// Literal text, kept verbatim.
    Text { value: String },
    /// Integer input box.
    IntBox,
    /// Decimal input box.
    FloatBox,
    /// Free-text input box.
    AlphanumBox,
}

impl PatternToken {
    /// Creates a text token.
    pub fn text(value: impl Into<String>) -> Self {
        PatternToken::Text {
            value: value.into(),
        }
    }

    /// Creates a box token of the given kind.
    pub fn input(kind: BoxKind) -> Self {
        match kind {
            BoxKind::Int => PatternToken::IntBox,
            BoxKind::Float => PatternToken::FloatBox,
            BoxKind::Alphanum => PatternToken::AlphanumBox,
        }
    }

    /// Box kind, if this token is an input box.
    pub fn box_kind(&self) -> Option<BoxKind> {
        match self {
            PatternToken::Text { .. } => None,
            PatternToken::IntBox => Some(BoxKind::Int),
            PatternToken::FloatBox => Some(BoxKind::Float),
            PatternToken::AlphanumBox => Some(BoxKind::Alphanum),
        }
    }

    /// Returns true for input box tokens.
    pub fn is_box(&self) -> bool {
        self.box_kind().is_some()
    }
}

/// Returns the keyword matching at the start of `lowered`, if any.
fn keyword_at(lowered: &str) -> Option<BoxKind> {
    BoxKind::ALL
        .into_iter()
        .find(|kind| lowered.starts_with(kind.keyword()))
}

/// Scans one whitespace-free word into tokens.
///
/// Every keyword becomes a box, including one wrapped in punctuation:
/// `(int_box)` yields `(`, a box and `)`.
fn scan_word(word: &str, out: &mut Vec<PatternToken>) {
    // ASCII lowercasing keeps byte offsets aligned with `word`.
    let lowered = word.to_ascii_lowercase();
    let mut pos = 0;
    let mut literal_start = 0;

    while pos < word.len() {
        if let Some(kind) = keyword_at(&lowered[pos..]) {
            if literal_start < pos {
                out.push(PatternToken::text(&word[literal_start..pos]));
            }
            out.push(PatternToken::input(kind));
            pos += kind.keyword().len();
            literal_start = pos;
            continue;
        }
        pos += word[pos..].chars().next().map_or(1, char::len_utf8);
    }

    if literal_start < word.len() {
        out.push(PatternToken::text(&word[literal_start..]));
    }
}

/// Tokenizes an attribute pattern string.
pub fn tokenize(pattern: &str) -> Vec<PatternToken> {
    let mut tokens = Vec::new();
    for word in pattern.split_whitespace() {
        scan_word(word, &mut tokens);
    }
    tokens
}

/// Number of box keywords `text` tokenizes into.
pub fn keyword_count(text: &str) -> usize {
    tokenize(text).iter().filter(|t| t.is_box()).count()
}

/// Returns true if `text` contains any box keyword (case-insensitive).
pub fn contains_box_marker(text: &str) -> bool {
    let lowered = text.to_ascii_lowercase();
    BoxKind::ALL
        .iter()
        .any(|kind| lowered.contains(kind.keyword()))
}

/// Renders tokens with positional values into a display label.
///
/// Text tokens contribute their literal value, box tokens the value at the
/// same position. Parts are joined with single spaces and whitespace runs
/// are collapsed. Returns an empty string when no box has a value.
pub fn render_label(tokens: &[PatternToken], values: &[String]) -> String {
    if !has_box_value(tokens, values) {
        return String::new();
    }
    let joined = tokens
        .iter()
        .enumerate()
        .map(|(idx, token)| match token {
            PatternToken::Text { value } => value.as_str(),
            _ => values.get(idx).map_or("", String::as_str),
        })
        .collect::<Vec<_>>()
        .join(" ");
    joined.split_whitespace().collect::<Vec<_>>().join(" ")
}

/// Returns true if any box position carries a non-blank value.
pub fn has_box_value(tokens: &[PatternToken], values: &[String]) -> bool {
    tokens.iter().enumerate().any(|(idx, token)| {
        token.is_box() && values.get(idx).is_some_and(|v| !v.trim().is_empty())
    })
}

/// A parsed attribute pattern together with its source string.
///
/// The source string is the identity used to re-associate stored input
/// groups with a recompiled schema.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct AttributePattern {
    /// Original cell text.
    pub raw: String,
    /// Parsed tokens.
    pub tokens: Vec<PatternToken>,
}

impl AttributePattern {
    /// Parses `raw` into a pattern.
    pub fn parse(raw: impl Into<String>) -> Self {
        let raw = raw.into();
        let tokens = tokenize(&raw);
        Self { raw, tokens }
    }

    /// Number of input boxes.
    pub fn box_count(&self) -> usize {
        self.tokens.iter().filter(|t| t.is_box()).count()
    }

    /// Token position of the `ordinal`-th input box.
    pub fn box_position(&self, ordinal: usize) -> Option<usize> {
        box_position(&self.tokens, ordinal)
    }
}

/// Token position of the `ordinal`-th box in `tokens`.
pub fn box_position(tokens: &[PatternToken], ordinal: usize) -> Option<usize> {
    tokens
        .iter()
        .enumerate()
        .filter(|(_, t)| t.is_box())
        .nth(ordinal)
        .map(|(idx, _)| idx)
}
