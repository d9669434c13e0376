//! Window ("franja") labels.
//!
//! Labels look like `08:00-09:30`, sometimes with unicode dashes or extra
//! words around the times (`Franja 08:00 – 09:30`). Anything that does not
//! parse to a start and an end is "no window" and never an error.

use crate::types::Hour;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct TimeWindow {
    pub start: Hour,
    pub end: Hour,
}

impl TimeWindow {
    pub fn is_late(&self, late_start: Hour) -> bool {
        self.start >= late_start
    }
}

/// Replace the dash variants seen in exports (en dash, em dash, and the
/// replacement character left by bad encodings) with an ASCII hyphen.
pub fn normalize_label(label: &str) -> String {
    label
        .trim()
        .chars()
        .map(|c| match c {
            '\u{2013}' | '\u{2014}' | '\u{2212}' | '\u{fffd}' => '-',
            other => other,
        })
        .collect()
}

fn parse_clock(part: &str) -> Option<Hour> {
    let token = part.split_whitespace().find(|seg| seg.contains(':'))?;
    let mut pieces = token.split(':');
    let h: u32 = pieces.next()?.trim().parse().ok()?;
    let m: u32 = pieces.next()?.trim().parse().ok()?;
    if h > 24 || m > 59 {
        return None;
    }
    Some(h as f64 + m as f64 / 60.0)
}

/// Parse a window label into decimal start/end hours.
pub fn parse_window(label: &str) -> Option<TimeWindow> {
    let clean = normalize_label(label);
    let mut parts = clean.split('-');
    let start = parse_clock(parts.next()?)?;
    let end = parse_clock(parts.next()?)?;
    Some(TimeWindow { start, end })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_plain_label() {
        let w = parse_window("08:00-09:30").unwrap();
        assert_eq!(w.start, 8.0);
        assert_eq!(w.end, 9.5);
    }

    #[test]
    fn parses_unicode_dashes_and_words() {
        let w = parse_window("Franja 14:30 \u{2013} 16:00").unwrap();
        assert_eq!(w.start, 14.5);
        assert_eq!(w.end, 16.0);
        assert!(parse_window("10:00\u{2014}11:30").is_some());
        assert!(parse_window("10:00\u{fffd}11:30").is_some());
    }

    #[test]
    fn unparseable_labels_are_no_window() {
        assert!(parse_window("14:00").is_none());
        assert!(parse_window("Sin Franja").is_none());
        assert!(parse_window("").is_none());
        assert!(parse_window("ab:cd-ef:gh").is_none());
        assert!(parse_window("8-9").is_none());
    }
}
