//! Medication usage summary, as shown on the dashboard's medication panel.

use serde::{Deserialize, Serialize};

use crate::types::GlobalMedicationRecord;

/// How many medications the top list holds.
pub const TOP_MEDICATIONS: usize = 5;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MedicationUsage {
    pub name: String,
    pub patient_count: u64,
    pub avg_efficacy: f64,
    pub side_effect_percentage: f64,
}

impl From<&GlobalMedicationRecord> for MedicationUsage {
    fn from(med: &GlobalMedicationRecord) -> Self {
        Self {
            name: med.name.clone(),
            patient_count: med.patient_count,
            avg_efficacy: med.avg_efficacy,
            side_effect_percentage: med.side_effect_percentage,
        }
    }
}

/// Most prescribed medication and its share of all patients.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MostPrescribed {
    pub name: String,
    pub patient_count: u64,
    /// Percentage of total patients; absent when the total is 0
    pub share_of_total: Option<f64>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UsageSummary {
    pub total_patients: u64,
    pub medications_tracked: usize,
    pub most_prescribed: Option<MostPrescribed>,
    pub most_effective: Option<MedicationUsage>,
    pub top_by_patients: Vec<MedicationUsage>,
}

/// Summarize global medication usage. Ties keep input order.
pub fn usage_summary(global_medications: &[GlobalMedicationRecord]) -> UsageSummary {
    // counts decode saturated at u64::MAX, so the total must not overflow
    let total_patients = global_medications
        .iter()
        .fold(0u64, |acc, m| acc.saturating_add(m.patient_count));

    let mut by_patients: Vec<&GlobalMedicationRecord> = global_medications.iter().collect();
    by_patients.sort_by(|a, b| b.patient_count.cmp(&a.patient_count));

    let most_prescribed = by_patients.first().map(|med| MostPrescribed {
        name: med.name.clone(),
        patient_count: med.patient_count,
        share_of_total: if total_patients > 0 {
            Some(med.patient_count as f64 / total_patients as f64 * 100.0)
        } else {
            None
        },
    });

    let most_effective = global_medications
        .iter()
        .fold(None::<&GlobalMedicationRecord>, |best, med| match best {
            Some(b) if b.avg_efficacy >= med.avg_efficacy => Some(b),
            _ => Some(med),
        })
        .map(MedicationUsage::from);

    UsageSummary {
        total_patients,
        medications_tracked: global_medications.len(),
        most_prescribed,
        most_effective,
        top_by_patients: by_patients
            .into_iter()
            .take(TOP_MEDICATIONS)
            .map(MedicationUsage::from)
            .collect(),
    }
}
