//! Per-patient outcome rollup for the hospital view.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use super::parse::{severity_label, severity_score, NO_CRISIS};
use crate::types::{CrisisJournalEntry, UserMedicationRecord};

/// Outcome summary for one patient.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PatientOutcome {
    pub user_id: String,
    pub medication_count: usize,
    pub crisis_count: usize,
    /// Mean of the patient's effectiveness scores, 0 when none
    pub average_effectiveness: f64,
    /// Highest-scoring severity label, or "None" without crises
    pub most_severe_crisis: String,
}

#[derive(Default)]
struct OutcomeAccumulator<'a> {
    medications: usize,
    scored: usize,
    effectiveness_sum: f64,
    crises: usize,
    worst: Option<(u8, &'a str)>,
}

impl<'a> OutcomeAccumulator<'a> {
    fn add_crisis(&mut self, label: &'a str) {
        self.crises += 1;
        let score = severity_score(label);
        // first label wins ties
        match self.worst {
            Some((best, _)) if best >= score => {}
            _ => self.worst = Some((score, label)),
        }
    }

    fn finish(self, user_id: String) -> PatientOutcome {
        PatientOutcome {
            user_id,
            medication_count: self.medications,
            crisis_count: self.crises,
            average_effectiveness: if self.scored == 0 {
                0.0
            } else {
                self.effectiveness_sum / self.scored as f64
            },
            most_severe_crisis: self
                .worst
                .map(|(_, label)| label.to_string())
                .unwrap_or_else(|| NO_CRISIS.to_string()),
        }
    }
}

/// Group medications and crises by user id, ordered by user id.
///
/// Every user appearing in either collection gets exactly one row.
pub fn patient_outcomes(
    user_medications: &[UserMedicationRecord],
    crises: &[CrisisJournalEntry],
) -> Vec<PatientOutcome> {
    let mut groups: BTreeMap<&str, OutcomeAccumulator<'_>> = BTreeMap::new();

    for record in user_medications {
        let acc = groups.entry(record.user_id.as_str()).or_default();
        acc.medications += 1;
        if let Some(score) = record.effectiveness {
            acc.scored += 1;
            acc.effectiveness_sum += score;
        }
    }

    for entry in crises {
        groups
            .entry(entry.user_id.as_str())
            .or_default()
            .add_crisis(severity_label(entry));
    }

    groups
        .into_iter()
        .map(|(user_id, acc)| acc.finish(user_id.to_string()))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn med(user: &str, score: Option<f64>) -> UserMedicationRecord {
        UserMedicationRecord {
            id: None,
            name: "Hydroxyurea".to_string(),
            dosage: String::new(),
            frequency: String::new(),
            effectiveness: score,
            side_effects: None,
            user_id: user.to_string(),
            created_at: None,
        }
    }

    fn crisis(user: &str, severity: &str) -> CrisisJournalEntry {
        CrisisJournalEntry {
            id: None,
            severity: Some(severity.to_string()),
            duration: None,
            description: None,
            date: None,
            user_id: user.to_string(),
        }
    }

    #[test]
    fn test_patient_outcomes() {
        let meds = vec![med("u1", Some(4.0)), med("u1", Some(2.0)), med("u2", None)];
        let crises = vec![
            crisis("u1", "Mild"),
            crisis("u1", "Severe"),
            crisis("u1", "Moderate"),
            crisis("u3", "Moderate"),
        ];

        let outcomes = patient_outcomes(&meds, &crises);
        assert_eq!(outcomes.len(), 3);

        let u1 = &outcomes[0];
        assert_eq!(u1.user_id, "u1");
        assert_eq!(u1.medication_count, 2);
        assert_eq!(u1.crisis_count, 3);
        assert_eq!(u1.average_effectiveness, 3.0);
        assert_eq!(u1.most_severe_crisis, "Severe");

        let u2 = &outcomes[1];
        assert_eq!(u2.average_effectiveness, 0.0);
        assert_eq!(u2.most_severe_crisis, "None");

        let u3 = &outcomes[2];
        assert_eq!(u3.medication_count, 0);
        assert_eq!(u3.most_severe_crisis, "Moderate");
    }

    #[test]
    fn test_unknown_labels_only() {
        let crises = vec![crisis("u1", "Bad"), crisis("u1", "Worse")];
        let outcomes = patient_outcomes(&[], &crises);
        assert_eq!(outcomes[0].most_severe_crisis, "Bad");
    }
}
