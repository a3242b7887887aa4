//! Video frame range arithmetic.

/// Frame rate of procedure recordings.
pub const FPS: u32 = 25;

/// Inclusive frame range of a finding within a recording.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FrameSpan {
    pub start: i64,
    pub end: i64,
}

impl FrameSpan {
    /// Creates a span from start and end frames.
    pub fn new(start: i64, end: i64) -> Self {
        Self { start, end }
    }

    /// Number of frames, inclusive of both ends. Non-positive when the range
    /// is inverted; saturates at the `i64` bounds.
    pub fn frame_count(&self) -> i64 {
        let count = i128::from(self.end) - i128::from(self.start) + 1;
        i64::try_from(count).unwrap_or(if count > 0 { i64::MAX } else { i64::MIN })
    }

    /// Duration in seconds at [`FPS`].
    pub fn duration_secs(&self) -> f64 {
        self.frame_count() as f64 / f64::from(FPS)
    }

    /// Returns true when the end precedes the start.
    pub fn is_inverted(&self) -> bool {
        self.end < self.start
    }
}

/// Parses a frame number typed into a text field.
///
/// Leading whitespace and an optional sign are accepted, and parsing stops
/// at the first non-digit, so `"120abc"` reads as 120. Returns `None` when no
/// digit is present or the value does not fit in `i64`.
pub fn parse_frame(text: &str) -> Option<i64> {
    let text = text.trim_start();
    let (negative, rest) = match text.as_bytes().first() {
        Some(b'-') => (true, &text[1..]),
        Some(b'+') => (false, &text[1..]),
        _ => (false, text),
    };
    let digits = rest.bytes().take_while(u8::is_ascii_digit).count();
    if digits == 0 {
        return None;
    }
    let value: i64 = rest[..digits].parse().ok()?;
    Some(if negative { -value } else { value })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_frame_count_inclusive() {
        let span = FrameSpan::new(100, 149);
        assert_eq!(span.frame_count(), 50);
        assert!((span.duration_secs() - 2.0).abs() < f64::EPSILON);
        assert!(!span.is_inverted());
    }

    #[test]
    fn test_inverted_span() {
        let span = FrameSpan::new(200, 100);
        assert_eq!(span.frame_count(), -99);
        assert!(span.is_inverted());
    }

    #[test]
    fn test_extreme_spans_saturate() {
        let widest = FrameSpan::new(i64::MIN, i64::MAX);
        assert_eq!(widest.frame_count(), i64::MAX);
        assert!(!widest.is_inverted());
        assert!(widest.duration_secs() > 0.0);

        let reversed = FrameSpan::new(i64::MAX, i64::MIN);
        assert_eq!(reversed.frame_count(), i64::MIN);
        assert!(reversed.is_inverted());

        let single = FrameSpan::new(i64::MAX, i64::MAX);
        assert_eq!(single.frame_count(), 1);
    }

    #[test]
    fn test_parse_frame() {
        assert_eq!(parse_frame("120"), Some(120));
        assert_eq!(parse_frame("  42"), Some(42));
        assert_eq!(parse_frame("120abc"), Some(120));
        assert_eq!(parse_frame("-7"), Some(-7));
        assert_eq!(parse_frame("+7"), Some(7));
        assert_eq!(parse_frame("abc"), None);
        assert_eq!(parse_frame(""), None);
        assert_eq!(parse_frame("-"), None);
        assert_eq!(parse_frame("99999999999999999999"), None);
    }
}
