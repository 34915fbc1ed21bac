//! Analytics module for warriorplus
//!
//! Pure aggregation over an already-fetched, already-windowed record set:
//! - Per-drug efficacy, side effects and risk classification
//! - Crisis correlation and crisis pattern summaries
//! - Patient outcome rollups
//! - Medication usage summary
//!
//! Nothing here performs I/O or fails. Malformed fields fall back to the
//! defaults in [`parse`].

pub mod crisis;
pub mod medication;
pub mod parse;
pub mod patient;
pub mod usage;

pub use crisis::{
    crisis_correlation, crisis_patterns, crises_by_user, high_risk_patient_count,
    CrisisCorrelation, CrisisPatterns, CrisisTally,
};
pub use medication::{
    analyze_medications, real_world_effectiveness, safety_signals, side_effects_by_drug,
    treatment_recommendations, DrugEffectiveness, MedicationAnalysis, RecommendationLevel,
    RiskProfile, SafetySignal, TreatmentRecommendations,
};
pub use parse::{parse_duration_or_zero, severity_score, side_effect_text};
pub use patient::{patient_outcomes, PatientOutcome};
pub use usage::{usage_summary, MedicationUsage, MostPrescribed, UsageSummary};
