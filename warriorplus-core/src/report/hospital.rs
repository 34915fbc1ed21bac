//! Hospital analytics view: patient care metrics and treatment protocols.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use super::ReportMetadata;
use crate::analytics::{
    analyze_medications, crisis_patterns, high_risk_patient_count, patient_outcomes,
    MedicationAnalysis, PatientOutcome, RiskProfile,
};
use crate::config::Thresholds;
use crate::types::RecordSet;

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PatientCareMetrics {
    pub total_crisis_events: usize,
    pub severity_breakdown: BTreeMap<String, usize>,
    pub average_crisis_duration: f64,
    pub high_risk_patients: usize,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MedicationManagementEntry {
    pub name: String,
    pub patient_count: u64,
    pub average_efficacy: f64,
    pub side_effect_percentage: f64,
    pub user_reports: usize,
    pub risk_profile: RiskProfile,
}

impl From<&MedicationAnalysis> for MedicationManagementEntry {
    fn from(analysis: &MedicationAnalysis) -> Self {
        Self {
            name: analysis.drug_name.clone(),
            patient_count: analysis.global_patient_count,
            average_efficacy: analysis.global_avg_efficacy,
            side_effect_percentage: analysis.global_side_effect_percentage,
            user_reports: analysis.total_user_reports,
            risk_profile: analysis.risk_profile,
        }
    }
}

/// Medication names sorted into protocol lists.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TreatmentProtocols {
    /// Efficacy at or above the highly-effective threshold
    pub effective_treatments: Vec<String>,
    /// Risk profile "High Risk"
    pub high_risk_medications: Vec<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct HospitalReport {
    pub metadata: ReportMetadata,
    pub patient_care_metrics: PatientCareMetrics,
    pub medication_management: Vec<MedicationManagementEntry>,
    pub patient_outcomes: Vec<PatientOutcome>,
    pub treatment_protocols: TreatmentProtocols,
}

impl HospitalReport {
    pub fn build(records: &RecordSet, metadata: ReportMetadata, thresholds: &Thresholds) -> Self {
        let patterns = crisis_patterns(&records.crisis_entries);
        let analyses = analyze_medications(
            &records.global_medications,
            &records.user_medications,
            thresholds,
        );

        let treatment_protocols = TreatmentProtocols {
            effective_treatments: analyses
                .iter()
                .filter(|a| a.global_avg_efficacy >= thresholds.highly_effective_efficacy)
                .map(|a| a.drug_name.clone())
                .collect(),
            high_risk_medications: analyses
                .iter()
                .filter(|a| a.risk_profile == RiskProfile::High)
                .map(|a| a.drug_name.clone())
                .collect(),
        };

        Self {
            metadata,
            patient_care_metrics: PatientCareMetrics {
                total_crisis_events: patterns.total_crises,
                severity_breakdown: patterns.severity_distribution,
                average_crisis_duration: patterns.average_duration,
                high_risk_patients: high_risk_patient_count(&records.crisis_entries, thresholds),
            },
            medication_management: analyses.iter().map(MedicationManagementEntry::from).collect(),
            patient_outcomes: patient_outcomes(&records.user_medications, &records.crisis_entries),
            treatment_protocols,
        }
    }
}
