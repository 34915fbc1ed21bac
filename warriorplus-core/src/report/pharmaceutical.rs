//! Pharmaceutical research view: drug efficacy, real-world evidence and
//! safety signals.

use serde::{Deserialize, Serialize};

use super::ReportMetadata;
use crate::analytics::{
    analyze_medications, crisis_correlation, crisis_patterns, safety_signals,
    treatment_recommendations, usage_summary, CrisisCorrelation, CrisisPatterns,
    MedicationAnalysis, SafetySignal, TreatmentRecommendations, UsageSummary,
};
use crate::config::Thresholds;
use crate::types::RecordSet;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PharmaceuticalReport {
    pub metadata: ReportMetadata,
    pub medication_efficacy_analysis: Vec<MedicationAnalysis>,
    pub real_world_evidence: Vec<CrisisCorrelation>,
    pub crisis_patterns: CrisisPatterns,
    pub safety_signals: Vec<SafetySignal>,
    pub treatment_recommendations: TreatmentRecommendations,
    pub usage_summary: UsageSummary,
}

impl PharmaceuticalReport {
    pub fn build(records: &RecordSet, metadata: ReportMetadata, thresholds: &Thresholds) -> Self {
        let analyses = analyze_medications(
            &records.global_medications,
            &records.user_medications,
            thresholds,
        );

        Self {
            metadata,
            real_world_evidence: crisis_correlation(
                &records.user_medications,
                &records.crisis_entries,
            ),
            crisis_patterns: crisis_patterns(&records.crisis_entries),
            safety_signals: safety_signals(&analyses, thresholds),
            treatment_recommendations: treatment_recommendations(&analyses, thresholds),
            usage_summary: usage_summary(&records.global_medications),
            medication_efficacy_analysis: analyses,
        }
    }
}
