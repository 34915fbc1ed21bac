//! Export pipeline and serializers
//!
//! [`export`] runs the whole pipeline: fetch every collection, apply the
//! time window, strip identifiers, assemble the requested report, and render
//! it as JSON or CSV.
//! Nothing is written to disk here; callers decide where the artifact goes.

use std::str::FromStr;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::analytics::MedicationAnalysis;
use crate::anonymize::{anonymize, Anonymization};
use crate::config::Thresholds;
use crate::error::{Error, Result};
use crate::fetch::{fetch_all, RecordSource};
use crate::report::{assemble, Report, ReportRequest, ReportType};
use crate::types::RecordSet;
use crate::window::{filter_record_set, TimeWindow};

/// Body of a CSV export for reports with no medication table
pub const CSV_PLACEHOLDER: &str = "No tabular data available for this report type";

const CSV_HEADERS: [&str; 8] = [
    "Drug Name",
    "Global Avg Efficacy",
    "Global Patient Count",
    "Global Side Effect %",
    "User Reported Effectiveness",
    "Total User Reports",
    "Risk Profile",
    "Recommendation Level",
];

/// Output format of an export.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ExportFormat {
    Json,
    Csv,
}

impl ExportFormat {
    pub fn as_str(&self) -> &'static str {
        match self {
            ExportFormat::Json => "json",
            ExportFormat::Csv => "csv",
        }
    }

    pub fn extension(&self) -> &'static str {
        self.as_str()
    }

    pub fn content_type(&self) -> &'static str {
        match self {
            ExportFormat::Json => "application/json",
            ExportFormat::Csv => "text/csv",
        }
    }
}

impl FromStr for ExportFormat {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_ascii_lowercase().as_str() {
            "json" => Ok(ExportFormat::Json),
            "csv" => Ok(ExportFormat::Csv),
            _ => Err(Error::UnsupportedFormat(s.to_string())),
        }
    }
}

impl std::fmt::Display for ExportFormat {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A rendered report, ready to be saved.
#[derive(Debug, Clone, PartialEq)]
pub struct ExportArtifact {
    pub filename: String,
    pub content: String,
    pub content_type: &'static str,
}

/// What to export.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ExportRequest {
    pub report_type: ReportType,
    pub window: TimeWindow,
    pub format: ExportFormat,
    pub anonymization: Anonymization,
}

/// Render a report in the given format.
pub fn serialize(report: &Report, format: ExportFormat) -> Result<String> {
    match format {
        ExportFormat::Json => Ok(serde_json::to_string_pretty(report)?),
        ExportFormat::Csv => match report.medication_table() {
            Some(rows) => medication_csv(rows),
            None => Ok(CSV_PLACEHOLDER.to_string()),
        },
    }
}

fn medication_csv(rows: &[MedicationAnalysis]) -> Result<String> {
    let mut writer = csv::Writer::from_writer(Vec::new());
    writer.write_record(CSV_HEADERS)?;

    for row in rows {
        let effectiveness = row
            .user_reported_effectiveness
            .map(|value| value.to_string())
            .unwrap_or_else(|| "N/A".to_string());

        writer.write_record([
            row.drug_name.clone(),
            row.global_avg_efficacy.to_string(),
            row.global_patient_count.to_string(),
            row.global_side_effect_percentage.to_string(),
            effectiveness,
            row.total_user_reports.to_string(),
            row.risk_profile.as_str().to_string(),
            row.recommendation_level.as_str().to_string(),
        ])?;
    }

    let bytes = writer.into_inner().map_err(|e| Error::Io(e.into_error()))?;
    String::from_utf8(bytes).map_err(|e| {
        Error::Io(std::io::Error::new(std::io::ErrorKind::InvalidData, e))
    })
}

/// Download filename, e.g. `hospital-report-30d-2025-06-01T12-00-00Z.json`.
pub fn filename(
    report_type: ReportType,
    window: TimeWindow,
    generated_at: DateTime<Utc>,
    format: ExportFormat,
) -> String {
    format!(
        "{}-report-{}-{}.{}",
        report_type.as_str(),
        window.label(),
        generated_at.format("%Y-%m-%dT%H-%M-%SZ"),
        format.extension()
    )
}

/// Fetch, filter, aggregate, assemble and serialize one report.
///
/// Any fetch failure aborts the export; no partial artifact is produced.
pub async fn export<S>(
    source: &S,
    request: &ExportRequest,
    thresholds: &Thresholds,
    now: DateTime<Utc>,
) -> Result<ExportArtifact>
where
    S: RecordSource + ?Sized,
{
    let records = fetch_all(source).await?;
    export_records(records, request, thresholds, now)
}

/// Run the synchronous half of the pipeline on an already-fetched record set.
pub fn export_records(
    records: RecordSet,
    request: &ExportRequest,
    thresholds: &Thresholds,
    now: DateTime<Utc>,
) -> Result<ExportArtifact> {
    let total_users = records.users.len();
    let windowed = filter_record_set(records, request.window, now);
    let anonymized = anonymize(windowed, request.anonymization);

    let report = assemble(
        anonymized,
        &ReportRequest {
            report_type: request.report_type,
            window: request.window,
            anonymization: request.anonymization,
            generated_at: now,
            total_users,
        },
        thresholds,
    );

    let content = serialize(&report, request.format)?;
    let artifact = ExportArtifact {
        filename: filename(report.report_type(), request.window, now, request.format),
        content,
        content_type: request.format.content_type(),
    };

    tracing::info!(
        filename = %artifact.filename,
        bytes = artifact.content.len(),
        "Export complete"
    );
    Ok(artifact)
}
