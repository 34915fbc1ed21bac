//! Per-drug efficacy and risk analysis.
//!
//! Joins the platform-wide medication aggregates with what patients report
//! in their own medication logs.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use super::parse::side_effect_text;
use crate::config::Thresholds;
use crate::types::{GlobalMedicationRecord, UserMedicationRecord};

/// Side-effect risk bucket for a medication.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum RiskProfile {
    #[serde(rename = "High Risk")]
    High,
    #[serde(rename = "Moderate Risk")]
    Moderate,
    #[serde(rename = "Low Risk")]
    Low,
}

impl RiskProfile {
    /// Classify a side-effect percentage. Both bounds are strict.
    pub fn classify(side_effect_pct: f64, thresholds: &Thresholds) -> Self {
        if side_effect_pct > thresholds.high_risk_side_effect_pct {
            RiskProfile::High
        } else if side_effect_pct > thresholds.moderate_risk_side_effect_pct {
            RiskProfile::Moderate
        } else {
            RiskProfile::Low
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            RiskProfile::High => "High Risk",
            RiskProfile::Moderate => "Moderate Risk",
            RiskProfile::Low => "Low Risk",
        }
    }
}

/// Prescribing guidance derived from global efficacy.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum RecommendationLevel {
    #[serde(rename = "Recommended")]
    Recommended,
    #[serde(rename = "Monitor Closely")]
    MonitorClosely,
}

impl RecommendationLevel {
    pub fn classify(avg_efficacy: f64, thresholds: &Thresholds) -> Self {
        if avg_efficacy >= thresholds.recommended_efficacy {
            RecommendationLevel::Recommended
        } else {
            RecommendationLevel::MonitorClosely
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            RecommendationLevel::Recommended => "Recommended",
            RecommendationLevel::MonitorClosely => "Monitor Closely",
        }
    }
}

/// What patients themselves say about one drug.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct DrugEffectiveness {
    /// Number of medication log entries for the drug
    pub report_count: usize,
    /// Mean of the scores that were present; `None` when there were none
    pub mean_effectiveness: Option<f64>,
}

#[derive(Default)]
struct EffectivenessAccumulator {
    reports: usize,
    scored: usize,
    sum: f64,
}

impl EffectivenessAccumulator {
    fn finish(self) -> DrugEffectiveness {
        DrugEffectiveness {
            report_count: self.reports,
            mean_effectiveness: if self.scored == 0 {
                None
            } else {
                Some(self.sum / self.scored as f64)
            },
        }
    }
}

/// Group medication logs by drug name and average their effectiveness.
pub fn real_world_effectiveness(
    user_medications: &[UserMedicationRecord],
) -> BTreeMap<String, DrugEffectiveness> {
    let mut groups: BTreeMap<String, EffectivenessAccumulator> = BTreeMap::new();
    for record in user_medications {
        let acc = groups.entry(record.name.clone()).or_default();
        acc.reports += 1;
        if let Some(score) = record.effectiveness {
            acc.scored += 1;
            acc.sum += score;
        }
    }
    groups
        .into_iter()
        .map(|(name, acc)| (name, acc.finish()))
        .collect()
}

/// Group reported side effects by drug name, skipping "none".
pub fn side_effects_by_drug(
    user_medications: &[UserMedicationRecord],
) -> BTreeMap<String, Vec<String>> {
    let mut groups: BTreeMap<String, Vec<String>> = BTreeMap::new();
    for record in user_medications {
        if let Some(text) = side_effect_text(record.side_effects.as_deref()) {
            groups
                .entry(record.name.clone())
                .or_default()
                .push(text.to_string());
        }
    }
    groups
}

/// One row of the medication efficacy table.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MedicationAnalysis {
    pub drug_name: String,
    pub global_avg_efficacy: f64,
    pub global_patient_count: u64,
    pub global_side_effect_percentage: f64,
    /// Mean patient-reported score; `null` when nobody scored the drug
    pub user_reported_effectiveness: Option<f64>,
    pub total_user_reports: usize,
    pub user_reported_side_effects: Vec<String>,
    pub risk_profile: RiskProfile,
    pub recommendation_level: RecommendationLevel,
}

/// Join every global medication with its patient reports.
///
/// Drugs that only appear in patient logs have no global row and are left
/// out here; they remain visible in raw exports.
pub fn analyze_medications(
    global_medications: &[GlobalMedicationRecord],
    user_medications: &[UserMedicationRecord],
    thresholds: &Thresholds,
) -> Vec<MedicationAnalysis> {
    let effectiveness = real_world_effectiveness(user_medications);
    let side_effects = side_effects_by_drug(user_medications);

    let off_scale = global_medications
        .iter()
        .filter(|med| med.avg_efficacy > thresholds.efficacy_scale_max)
        .count();
    if off_scale > 0 {
        tracing::warn!(
            count = off_scale,
            scale_max = thresholds.efficacy_scale_max,
            "Global efficacy values exceed the rating scale; efficacy thresholds may not apply"
        );
    }

    global_medications
        .iter()
        .map(|med| {
            let reported = effectiveness.get(&med.name).cloned().unwrap_or_default();
            let reported_side_effects = side_effects.get(&med.name).cloned().unwrap_or_default();
            MedicationAnalysis {
                drug_name: med.name.clone(),
                global_avg_efficacy: med.avg_efficacy,
                global_patient_count: med.patient_count,
                global_side_effect_percentage: med.side_effect_percentage,
                user_reported_effectiveness: reported.mean_effectiveness,
                total_user_reports: reported.report_count,
                user_reported_side_effects: reported_side_effects,
                risk_profile: RiskProfile::classify(med.side_effect_percentage, thresholds),
                recommendation_level: RecommendationLevel::classify(med.avg_efficacy, thresholds),
            }
        })
        .collect()
}

/// A medication worth a pharmacovigilance look.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SafetySignal {
    pub drug_name: String,
    pub side_effect_percentage: f64,
    pub reported_side_effects: Vec<String>,
    pub risk_profile: RiskProfile,
}

/// Flag drugs above the safety-signal percentage or with any reported side effect.
pub fn safety_signals(analyses: &[MedicationAnalysis], thresholds: &Thresholds) -> Vec<SafetySignal> {
    analyses
        .iter()
        .filter(|a| {
            a.global_side_effect_percentage > thresholds.safety_signal_side_effect_pct
                || !a.user_reported_side_effects.is_empty()
        })
        .map(|a| SafetySignal {
            drug_name: a.drug_name.clone(),
            side_effect_percentage: a.global_side_effect_percentage,
            reported_side_effects: a.user_reported_side_effects.clone(),
            risk_profile: a.risk_profile,
        })
        .collect()
}

/// Independent (overlapping) buckets of medication analyses.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TreatmentRecommendations {
    pub highly_effective: Vec<MedicationAnalysis>,
    pub requires_monitoring: Vec<MedicationAnalysis>,
    pub under_performing: Vec<MedicationAnalysis>,
}

pub fn treatment_recommendations(
    analyses: &[MedicationAnalysis],
    thresholds: &Thresholds,
) -> TreatmentRecommendations {
    let pick = |keep: &dyn Fn(&MedicationAnalysis) -> bool| -> Vec<MedicationAnalysis> {
        analyses.iter().filter(|a| keep(a)).cloned().collect()
    };

    TreatmentRecommendations {
        highly_effective: pick(&|a| a.global_avg_efficacy >= thresholds.highly_effective_efficacy),
        requires_monitoring: pick(&|a| a.risk_profile != RiskProfile::Low),
        under_performing: pick(&|a| a.global_avg_efficacy < thresholds.under_performing_efficacy),
    }
}
