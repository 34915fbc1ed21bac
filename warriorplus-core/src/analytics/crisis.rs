//! Crisis (pain journal) analytics.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use super::parse::{parse_duration_or_zero, severity_label, severity_score};
use crate::config::Thresholds;
use crate::types::{CrisisJournalEntry, UserMedicationRecord};

/// Per-user crisis tally: entry count and summed severity score.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct CrisisTally {
    pub count: usize,
    pub severity_sum: u64,
}

impl CrisisTally {
    /// Mean severity score, 0 when there are no entries.
    pub fn mean_severity(&self) -> f64 {
        if self.count == 0 {
            0.0
        } else {
            self.severity_sum as f64 / self.count as f64
        }
    }
}

/// Count crisis entries and severity per owning user.
pub fn crises_by_user(crises: &[CrisisJournalEntry]) -> BTreeMap<String, CrisisTally> {
    let mut tallies: BTreeMap<String, CrisisTally> = BTreeMap::new();
    for entry in crises {
        let tally = tallies.entry(entry.user_id.clone()).or_default();
        tally.count += 1;
        tally.severity_sum += u64::from(severity_score(severity_label(entry)));
    }
    tallies
}

/// A medication log entry next to its owner's crisis history.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CrisisCorrelation {
    pub medication: String,
    pub user_id: String,
    pub effectiveness: Option<f64>,
    pub crisis_count: usize,
    pub average_crisis_severity: f64,
}

/// Pair every medication log entry with the same user's crisis count and
/// mean severity. Users without crises get zeros.
pub fn crisis_correlation(
    user_medications: &[UserMedicationRecord],
    crises: &[CrisisJournalEntry],
) -> Vec<CrisisCorrelation> {
    let tallies = crises_by_user(crises);
    user_medications
        .iter()
        .map(|record| {
            let tally = tallies.get(&record.user_id).copied().unwrap_or_default();
            CrisisCorrelation {
                medication: record.name.clone(),
                user_id: record.user_id.clone(),
                effectiveness: record.effectiveness,
                crisis_count: tally.count,
                average_crisis_severity: tally.mean_severity(),
            }
        })
        .collect()
}

/// Platform-wide crisis summary.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CrisisPatterns {
    pub total_crises: usize,
    /// Entry count per literal severity label
    pub severity_distribution: BTreeMap<String, usize>,
    /// Mean duration; unparseable durations count as 0
    pub average_duration: f64,
    pub descriptions: Vec<String>,
}

pub fn crisis_patterns(crises: &[CrisisJournalEntry]) -> CrisisPatterns {
    let mut severity_distribution: BTreeMap<String, usize> = BTreeMap::new();
    let mut duration_sum = 0.0;
    let mut descriptions = Vec::new();

    for entry in crises {
        *severity_distribution
            .entry(severity_label(entry).to_string())
            .or_insert(0) += 1;
        duration_sum += parse_duration_or_zero(entry.duration.as_ref());
        if let Some(text) = entry.description.as_deref().map(str::trim) {
            if !text.is_empty() {
                descriptions.push(text.to_string());
            }
        }
    }

    let average_duration = if crises.is_empty() {
        0.0
    } else {
        duration_sum / crises.len() as f64
    };

    CrisisPatterns {
        total_crises: crises.len(),
        severity_distribution,
        average_duration,
        descriptions,
    }
}

/// Number of distinct users with more crises than the high-risk threshold.
pub fn high_risk_patient_count(crises: &[CrisisJournalEntry], thresholds: &Thresholds) -> usize {
    crises_by_user(crises)
        .values()
        .filter(|tally| tally.count > thresholds.high_risk_crisis_count)
        .count()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::RawDuration;

    fn crisis(user: &str, severity: &str, duration: Option<RawDuration>) -> CrisisJournalEntry {
        CrisisJournalEntry {
            id: None,
            severity: Some(severity.to_string()),
            duration,
            description: None,
            date: None,
            user_id: user.to_string(),
        }
    }

    fn med(name: &str, user: &str) -> UserMedicationRecord {
        UserMedicationRecord {
            id: None,
            name: name.to_string(),
            dosage: String::new(),
            frequency: String::new(),
            effectiveness: Some(3.0),
            side_effects: None,
            user_id: user.to_string(),
            created_at: None,
        }
    }

    #[test]
    fn test_crisis_patterns_with_bad_duration() {
        let crises = vec![
            crisis("u1", "Mild", Some(RawDuration::Text("10".to_string()))),
            crisis("u1", "Severe", Some(RawDuration::Text("bad-data".to_string()))),
        ];

        let patterns = crisis_patterns(&crises);

        assert_eq!(patterns.total_crises, 2);
        assert_eq!(patterns.severity_distribution.len(), 2);
        assert_eq!(patterns.severity_distribution["Mild"], 1);
        assert_eq!(patterns.severity_distribution["Severe"], 1);
        assert_eq!(patterns.average_duration, 5.0);
    }

    #[test]
    fn test_crisis_patterns_empty() {
        let patterns = crisis_patterns(&[]);
        assert_eq!(patterns.total_crises, 0);
        assert_eq!(patterns.average_duration, 0.0);
        assert!(patterns.severity_distribution.is_empty());
    }

    #[test]
    fn test_unknown_labels_are_counted_literally() {
        let mut missing = crisis("u2", "", None);
        missing.severity = None;
        missing.description = Some("  woke up with chest pain ".to_string());
        let crises = vec![crisis("u1", "Critical", None), missing];

        let patterns = crisis_patterns(&crises);
        assert_eq!(patterns.severity_distribution["Critical"], 1);
        assert_eq!(patterns.severity_distribution["Unknown"], 1);
        assert_eq!(patterns.descriptions, vec!["woke up with chest pain".to_string()]);
    }

    #[test]
    fn test_off_case_label_scored_like_its_histogram_bucket() {
        let crises = vec![crisis("u1", "Mild", None), crisis("u1", "severe", None)];

        let patterns = crisis_patterns(&crises);
        assert_eq!(patterns.severity_distribution["Mild"], 1);
        assert_eq!(patterns.severity_distribution["severe"], 1);

        // "severe" is an unknown label: (1 + 0) / 2
        let rows = crisis_correlation(&[med("A", "u1")], &crises);
        assert_eq!(rows[0].average_crisis_severity, 0.5);

        let outcomes = crate::analytics::patient_outcomes(&[], &crises);
        assert_eq!(outcomes[0].most_severe_crisis, "Mild");
    }

    #[test]
    fn test_crisis_correlation() {
        let crises = vec![
            crisis("u1", "Mild", None),
            crisis("u1", "Severe", None),
            crisis("u2", "Moderate", None),
        ];
        let meds = vec![med("A", "u1"), med("B", "u3")];

        let rows = crisis_correlation(&meds, &crises);

        assert_eq!(rows.len(), 2);
        assert_eq!(rows[0].crisis_count, 2);
        assert_eq!(rows[0].average_crisis_severity, 2.0);
        assert_eq!(rows[1].user_id, "u3");
        assert_eq!(rows[1].crisis_count, 0);
        assert_eq!(rows[1].average_crisis_severity, 0.0);
    }

    #[test]
    fn test_high_risk_patient_count_is_strict() {
        let t = Thresholds::default();
        let mut crises: Vec<_> = (0..5).map(|_| crisis("u1", "Mild", None)).collect();
        crises.extend((0..6).map(|_| crisis("u2", "Severe", None)));

        assert_eq!(high_risk_patient_count(&crises, &t), 1);
    }
}
