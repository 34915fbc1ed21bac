//! Report assembly.
//!
//! Packs aggregator output into one of four named shapes:
//! - `pharmaceutical`: efficacy analysis, real-world evidence, safety signals
//! - `hospital`: patient care metrics, outcomes and treatment protocols
//! - `comprehensive`: both of the above plus the raw collections
//! - `raw`: the windowed collections, uninterpreted
//!
//! An unrecognized report selector falls back to `raw`.

mod hospital;
mod pharmaceutical;

pub use hospital::{
    HospitalReport, MedicationManagementEntry, PatientCareMetrics, TreatmentProtocols,
};
pub use pharmaceutical::PharmaceuticalReport;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::anonymize::Anonymization;
use crate::config::Thresholds;
use crate::types::{
    AdminAggregateStats, CrisisJournalEntry, GlobalMedicationRecord, RecordSet,
    UserMedicationRecord, UserRecord,
};
use crate::window::TimeWindow;

/// Report shape selector.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ReportType {
    Pharmaceutical,
    Hospital,
    Comprehensive,
    Raw,
}

impl ReportType {
    pub fn as_str(&self) -> &'static str {
        match self {
            ReportType::Pharmaceutical => "pharmaceutical",
            ReportType::Hospital => "hospital",
            ReportType::Comprehensive => "comprehensive",
            ReportType::Raw => "raw",
        }
    }

    /// Parse a selector, falling back to [`ReportType::Raw`] for anything unknown.
    pub fn from_selector(selector: &str) -> Self {
        match selector.trim().to_ascii_lowercase().as_str() {
            "pharmaceutical" | "pharma" => ReportType::Pharmaceutical,
            "hospital" => ReportType::Hospital,
            "comprehensive" => ReportType::Comprehensive,
            "raw" => ReportType::Raw,
            other => {
                tracing::warn!(selector = other, "Unknown report type, using raw");
                ReportType::Raw
            }
        }
    }
}

impl std::fmt::Display for ReportType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Number of records of each collection that went into a report.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RecordCounts {
    pub users: usize,
    pub global_medications: usize,
    pub user_medications: usize,
    pub crisis_entries: usize,
}

impl From<&RecordSet> for RecordCounts {
    fn from(records: &RecordSet) -> Self {
        Self {
            users: records.users.len(),
            global_medications: records.global_medications.len(),
            user_medications: records.user_medications.len(),
            crisis_entries: records.crisis_entries.len(),
        }
    }
}

/// Generation metadata carried by every report.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ReportMetadata {
    pub generated_at: DateTime<Utc>,
    pub report_type: ReportType,
    pub time_window: TimeWindow,
    pub anonymization: Anonymization,
    pub record_counts: RecordCounts,
    pub admin_stats: AdminAggregateStats,
}

/// Windowed source collections.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RawData {
    pub users: Vec<UserRecord>,
    pub global_medications: Vec<GlobalMedicationRecord>,
    pub user_medications: Vec<UserMedicationRecord>,
    pub crisis_entries: Vec<CrisisJournalEntry>,
    /// User count before the window was applied
    pub total_users: usize,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RawReport {
    pub metadata: ReportMetadata,
    pub users: Vec<UserRecord>,
    pub global_medications: Vec<GlobalMedicationRecord>,
    pub user_medications: Vec<UserMedicationRecord>,
    pub crisis_entries: Vec<CrisisJournalEntry>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ComprehensiveReport {
    pub metadata: ReportMetadata,
    pub pharmaceutical: PharmaceuticalReport,
    pub hospital: HospitalReport,
    pub raw_data: RawData,
}

/// An assembled report of any shape.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum Report {
    Pharmaceutical(PharmaceuticalReport),
    Hospital(HospitalReport),
    Comprehensive(Box<ComprehensiveReport>),
    Raw(RawReport),
}

impl Report {
    pub fn report_type(&self) -> ReportType {
        self.metadata().report_type
    }

    pub fn metadata(&self) -> &ReportMetadata {
        match self {
            Report::Pharmaceutical(r) => &r.metadata,
            Report::Hospital(r) => &r.metadata,
            Report::Comprehensive(r) => &r.metadata,
            Report::Raw(r) => &r.metadata,
        }
    }

    /// The efficacy table, for reports that carry one at the top level.
    pub fn medication_table(&self) -> Option<&[crate::analytics::MedicationAnalysis]> {
        match self {
            Report::Pharmaceutical(r) => Some(&r.medication_efficacy_analysis),
            _ => None,
        }
    }
}

/// Request-time parameters for assembling a report.
#[derive(Debug, Clone)]
pub struct ReportRequest {
    pub report_type: ReportType,
    pub window: TimeWindow,
    /// Level already applied to the records
    pub anonymization: Anonymization,
    pub generated_at: DateTime<Utc>,
    /// User count before windowing
    pub total_users: usize,
}

/// Build a report from windowed records.
pub fn assemble(records: RecordSet, request: &ReportRequest, thresholds: &Thresholds) -> Report {
    let metadata = ReportMetadata {
        generated_at: request.generated_at,
        report_type: request.report_type,
        time_window: request.window,
        anonymization: request.anonymization,
        record_counts: RecordCounts::from(&records),
        admin_stats: records.admin_stats.clone(),
    };

    tracing::info!(
        report_type = %request.report_type,
        window = %request.window,
        global_medications = metadata.record_counts.global_medications,
        user_medications = metadata.record_counts.user_medications,
        crisis_entries = metadata.record_counts.crisis_entries,
        "Assembling report"
    );

    match request.report_type {
        ReportType::Pharmaceutical => {
            Report::Pharmaceutical(PharmaceuticalReport::build(&records, metadata, thresholds))
        }
        ReportType::Hospital => {
            Report::Hospital(HospitalReport::build(&records, metadata, thresholds))
        }
        ReportType::Comprehensive => {
            let pharmaceutical = PharmaceuticalReport::build(&records, metadata.clone(), thresholds);
            let hospital = HospitalReport::build(&records, metadata.clone(), thresholds);
            Report::Comprehensive(Box::new(ComprehensiveReport {
                metadata,
                pharmaceutical,
                hospital,
                raw_data: RawData {
                    users: records.users,
                    global_medications: records.global_medications,
                    user_medications: records.user_medications,
                    crisis_entries: records.crisis_entries,
                    total_users: request.total_users,
                },
            }))
        }
        ReportType::Raw => Report::Raw(RawReport {
            metadata,
            users: records.users,
            global_medications: records.global_medications,
            user_medications: records.user_medications,
            crisis_entries: records.crisis_entries,
        }),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::{CrisisJournalEntry, RawDuration};
    use chrono::TimeZone;

    fn request(report_type: ReportType) -> ReportRequest {
        ReportRequest {
            report_type,
            window: TimeWindow::All,
            anonymization: Anonymization::None,
            generated_at: Utc.with_ymd_and_hms(2025, 6, 1, 12, 0, 0).unwrap(),
            total_users: 3,
        }
    }

    fn global(name: &str, patients: u64, efficacy: f64, side_pct: f64) -> GlobalMedicationRecord {
        GlobalMedicationRecord {
            id: None,
            name: name.to_string(),
            patient_count: patients,
            avg_efficacy: efficacy,
            side_effect_percentage: side_pct,
            side_effect_count: 0,
            total_efficacy: 0.0,
            created_at: None,
            last_updated_at: None,
        }
    }

    fn sample_records() -> RecordSet {
        RecordSet {
            global_medications: vec![global("A", 10, 4.0, 30.0), global("B", 5, 1.5, 5.0)],
            crisis_entries: vec![CrisisJournalEntry {
                id: None,
                severity: Some("Severe".to_string()),
                duration: Some(RawDuration::Number(6.0)),
                description: Some("ER visit".to_string()),
                date: None,
                user_id: "u1".to_string(),
            }],
            admin_stats: AdminAggregateStats {
                total_members: 3,
                medications_recorded: 2,
                crisis_events: 1,
            },
            ..Default::default()
        }
    }

    #[test]
    fn test_report_type_selector_falls_back_to_raw() {
        assert_eq!(ReportType::from_selector("hospital"), ReportType::Hospital);
        assert_eq!(
            ReportType::from_selector("Pharmaceutical"),
            ReportType::Pharmaceutical
        );
        assert_eq!(ReportType::from_selector("quarterly"), ReportType::Raw);
        assert_eq!(ReportType::from_selector(""), ReportType::Raw);
    }

    #[test]
    fn test_pharmaceutical_scenario() {
        let report = assemble(
            sample_records(),
            &request(ReportType::Pharmaceutical),
            &Thresholds::default(),
        );
        let json = serde_json::to_value(&report).unwrap();

        let analysis = json["medicationEfficacyAnalysis"].as_array().unwrap();
        assert_eq!(analysis.len(), 2);
        assert!(analysis[0]["userReportedEffectiveness"].is_null());
        assert!(analysis[1]["userReportedEffectiveness"].is_null());
        assert_eq!(analysis[0]["riskProfile"], "High Risk");
        assert_eq!(analysis[0]["recommendationLevel"], "Recommended");
        assert_eq!(analysis[1]["riskProfile"], "Low Risk");
        assert_eq!(analysis[1]["recommendationLevel"], "Monitor Closely");

        let buckets = &json["treatmentRecommendations"];
        assert_eq!(buckets["highlyEffective"][0]["drugName"], "A");
        assert_eq!(buckets["underPerforming"][0]["drugName"], "B");

        assert_eq!(json["metadata"]["reportType"], "pharmaceutical");
        assert_eq!(json["metadata"]["timeWindow"], "all");
        assert_eq!(json["metadata"]["anonymization"], "none");
        assert_eq!(json["metadata"]["recordCounts"]["globalMedications"], 2);
        assert_eq!(json["metadata"]["adminStats"]["totalMembers"], 3);
    }

    #[test]
    fn test_hospital_report() {
        let report = assemble(
            sample_records(),
            &request(ReportType::Hospital),
            &Thresholds::default(),
        );
        let Report::Hospital(hospital) = report else {
            panic!("expected hospital report");
        };

        assert_eq!(hospital.patient_care_metrics.total_crisis_events, 1);
        assert_eq!(hospital.patient_care_metrics.average_crisis_duration, 6.0);
        assert_eq!(hospital.patient_care_metrics.high_risk_patients, 0);
        assert_eq!(hospital.medication_management.len(), 2);
        assert_eq!(hospital.treatment_protocols.effective_treatments, vec!["A"]);
        assert_eq!(hospital.treatment_protocols.high_risk_medications, vec!["A"]);
        assert_eq!(hospital.patient_outcomes.len(), 1);
        assert_eq!(hospital.patient_outcomes[0].most_severe_crisis, "Severe");
    }

    #[test]
    fn test_comprehensive_nests_both_views() {
        let report = assemble(
            sample_records(),
            &request(ReportType::Comprehensive),
            &Thresholds::default(),
        );
        let json = serde_json::to_value(&report).unwrap();

        assert!(json["pharmaceutical"]["medicationEfficacyAnalysis"].is_array());
        assert!(json["hospital"]["patientCareMetrics"].is_object());
        assert_eq!(json["rawData"]["totalUsers"], 3);
        assert_eq!(json["rawData"]["crisisEntries"].as_array().unwrap().len(), 1);
    }

    #[test]
    fn test_raw_report_is_uninterpreted() {
        let records = sample_records();
        let report = assemble(records.clone(), &request(ReportType::Raw), &Thresholds::default());
        let Report::Raw(raw) = report else {
            panic!("expected raw report");
        };
        assert_eq!(raw.global_medications, records.global_medications);
        assert_eq!(raw.crisis_entries, records.crisis_entries);
    }

    #[test]
    fn test_report_json_round_trip() {
        let report = assemble(
            sample_records(),
            &request(ReportType::Comprehensive),
            &Thresholds::default(),
        );
        let Report::Comprehensive(comprehensive) = report else {
            panic!("expected comprehensive report");
        };

        let json = serde_json::to_string_pretty(&comprehensive).unwrap();
        let parsed: ComprehensiveReport = serde_json::from_str(&json).unwrap();
        assert_eq!(parsed, *comprehensive);
    }
}
