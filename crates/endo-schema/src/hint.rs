//! Hint text with embedded image references.
//!
//! Section and subsection hints may mention picture files such as
//! `forrest_grades_640x360.png`. Parsing separates the file names from the
//! prose and reads an optional display size from a `_<W>x<H>` suffix.

use std::sync::LazyLock;

use regex::Regex;
use serde::Serialize;

static IMAGE_RE: LazyLock<Option<Regex>> = LazyLock::new(|| {
    Regex::new(r"(?i)([A-Za-z0-9_.\-/]+?\.(?:png|jpe?g|webp))").ok()
});

static SIZE_RE: LazyLock<Option<Regex>> =
    LazyLock::new(|| Regex::new(r"(?i)_(\d+)x(\d+)\.(?:png|jpe?g|webp)$").ok());

static TRAILING_SPACE_RE: LazyLock<Option<Regex>> =
    LazyLock::new(|| Regex::new(r"[ \t]+\n").ok());

static BLANK_LINES_RE: LazyLock<Option<Regex>> = LazyLock::new(|| Regex::new(r"\n{3,}").ok());

/// An image referenced from hint text.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct HintImage {
    /// File name as written in the hint, relative to the pictures folder.
    pub file: String,
    pub width: Option<u32>,
    pub height: Option<u32>,
}

/// Hint text split into prose and images.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct HintContent {
    /// Prose with image names removed, trailing blanks before line breaks
    /// stripped, runs of blank lines collapsed, and outer whitespace trimmed.
    pub text: String,
    pub images: Vec<HintImage>,
}

impl HintContent {
    /// Returns true if there is neither text nor an image.
    pub fn is_empty(&self) -> bool {
        self.text.is_empty() && self.images.is_empty()
    }
}

/// Parses raw hint text.
pub fn parse_hint(raw: &str) -> HintContent {
    let Some(image_re) = IMAGE_RE.as_ref() else {
        return HintContent {
            text: raw.trim().to_string(),
            images: Vec::new(),
        };
    };

    let images = image_re
        .captures_iter(raw)
        .filter_map(|caps| caps.get(1))
        .map(|m| image_from_name(m.as_str()))
        .collect();

    let mut text = image_re.replace_all(raw, "").into_owned();
    if let Some(re) = TRAILING_SPACE_RE.as_ref() {
        text = re.replace_all(&text, "\n").into_owned();
    }
    if let Some(re) = BLANK_LINES_RE.as_ref() {
        text = re.replace_all(&text, "\n\n").into_owned();
    }

    HintContent {
        text: text.trim().to_string(),
        images,
    }
}

fn image_from_name(file: &str) -> HintImage {
    let size = SIZE_RE
        .as_ref()
        .and_then(|re| re.captures(file))
        .and_then(|caps| {
            let width = caps.get(1)?.as_str().parse().ok()?;
            let height = caps.get(2)?.as_str().parse().ok()?;
            Some((width, height))
        });
    HintImage {
        file: file.to_string(),
        width: size.map(|(w, _)| w),
        height: size.map(|(_, h)| h),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_plain_hint() {
        let hint = parse_hint("  Measure the largest diameter  ");
        assert_eq!(hint.text, "Measure the largest diameter");
        assert!(hint.images.is_empty());
    }

    #[test]
    fn test_images_are_extracted() {
        let hint = parse_hint("See chart forrest_640x360.PNG \nand la_grades.jpg");
        assert_eq!(hint.text, "See chart\nand");
        assert_eq!(
            hint.images,
            vec![
                HintImage {
                    file: "forrest_640x360.PNG".to_string(),
                    width: Some(640),
                    height: Some(360),
                },
                HintImage {
                    file: "la_grades.jpg".to_string(),
                    width: None,
                    height: None,
                },
            ]
        );
    }

    #[test]
    fn test_blank_lines_collapse() {
        let hint = parse_hint("Line one\n\n\n\nLine two");
        assert_eq!(hint.text, "Line one\n\nLine two");
    }

    #[test]
    fn test_image_only_hint() {
        let hint = parse_hint("pictures/paris.webp");
        assert!(hint.text.is_empty());
        assert_eq!(hint.images[0].file, "pictures/paris.webp");
        assert!(!hint.is_empty());
    }
}
