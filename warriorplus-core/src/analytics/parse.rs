//! Sentinel-returning field readers.
//!
//! Malformed fields never fail an export. Each reader here returns the
//! documented default instead, so the substitution is visible at call sites.

use crate::types::{CrisisJournalEntry, RawDuration};

/// Side-effect text meaning "no side effects".
pub const NO_SIDE_EFFECTS: &str = "none";

/// Label used when a crisis entry has no severity at all.
pub const UNKNOWN_SEVERITY: &str = "Unknown";

/// Label used for a patient with no crisis entries.
pub const NO_CRISIS: &str = "None";

/// Map a severity label onto Mild=1, Moderate=2, Severe=3; anything else is 0.
///
/// Labels match exactly, the same way the severity histogram keys them, so
/// `"severe"` is an unknown label with score 0.
pub fn severity_score(label: &str) -> u8 {
    match label {
        "Mild" => 1,
        "Moderate" => 2,
        "Severe" => 3,
        _ => 0,
    }
}

/// The severity label of an entry as written, or [`UNKNOWN_SEVERITY`].
pub fn severity_label(entry: &CrisisJournalEntry) -> &str {
    match entry.severity.as_deref() {
        Some(label) if !label.trim().is_empty() => label,
        _ => UNKNOWN_SEVERITY,
    }
}

/// Duration of a crisis in the unit the app records, or 0.
///
/// Text is read like a leading number (`"45 min"` is 45); anything without
/// a leading number is 0.
pub fn parse_duration_or_zero(duration: Option<&RawDuration>) -> f64 {
    let value = match duration {
        Some(RawDuration::Number(n)) => Some(*n),
        Some(RawDuration::Text(text)) => leading_number(text),
        Some(RawDuration::Other(_)) | None => None,
    };
    value.filter(|n| n.is_finite()).unwrap_or(0.0)
}

fn leading_number(text: &str) -> Option<f64> {
    let text = text.trim();
    if let Ok(n) = text.parse::<f64>() {
        return Some(n);
    }
    let end = text
        .char_indices()
        .take_while(|(i, c)| c.is_ascii_digit() || *c == '.' || (*i == 0 && (*c == '-' || *c == '+')))
        .map(|(i, c)| i + c.len_utf8())
        .last()?;
    text[..end].parse::<f64>().ok()
}

/// Side-effect text if the patient reported any.
pub fn side_effect_text(value: Option<&str>) -> Option<&str> {
    let text = value?.trim();
    if text.is_empty() || text.eq_ignore_ascii_case(NO_SIDE_EFFECTS) {
        None
    } else {
        Some(text)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_severity_score() {
        assert_eq!(severity_score("Mild"), 1);
        assert_eq!(severity_score("Moderate"), 2);
        assert_eq!(severity_score("Severe"), 3);
        assert_eq!(severity_score("severe"), 0);
        assert_eq!(severity_score("Severe "), 0);
        assert_eq!(severity_score("Excruciating"), 0);
        assert_eq!(severity_score(""), 0);
    }

    #[test]
    fn test_parse_duration_or_zero() {
        assert_eq!(parse_duration_or_zero(None), 0.0);
        assert_eq!(parse_duration_or_zero(Some(&RawDuration::Number(4.5))), 4.5);
        assert_eq!(
            parse_duration_or_zero(Some(&RawDuration::Text("10".to_string()))),
            10.0
        );
        assert_eq!(
            parse_duration_or_zero(Some(&RawDuration::Text("45 min".to_string()))),
            45.0
        );
        assert_eq!(
            parse_duration_or_zero(Some(&RawDuration::Text("bad-data".to_string()))),
            0.0
        );
        assert_eq!(
            parse_duration_or_zero(Some(&RawDuration::Other(serde_json::Value::Bool(true)))),
            0.0
        );
    }

    #[test]
    fn test_side_effect_text() {
        assert_eq!(side_effect_text(None), None);
        assert_eq!(side_effect_text(Some("none")), None);
        assert_eq!(side_effect_text(Some("None")), None);
        assert_eq!(side_effect_text(Some("  ")), None);
        assert_eq!(side_effect_text(Some(" headache ")), Some("headache"));
    }

    #[test]
    fn test_severity_label_defaults() {
        let mut entry = CrisisJournalEntry {
            id: None,
            severity: None,
            duration: None,
            description: None,
            date: None,
            user_id: "u1".to_string(),
        };
        assert_eq!(severity_label(&entry), UNKNOWN_SEVERITY);
        entry.severity = Some("Moderate".to_string());
        assert_eq!(severity_label(&entry), "Moderate");
    }
}
