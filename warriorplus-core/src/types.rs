//! Core domain types for warriorplus
//!
//! These mirror the documents the mobile app writes to the document store.
//! Field names follow the store's camelCase convention. Every record is
//! read-only once fetched and only lives for one export.
//!
//! ## Terminology
//!
//! | Term | Definition |
//! |------|------------|
//! | **Global medication** | Platform-wide aggregate for one drug, maintained by the app |
//! | **User medication** | One patient's log entry for a drug, with their own effectiveness score |
//! | **Crisis entry** | A pain-journal record of a sickle-cell crisis |
//! | **Admin stats** | Singleton counters shown on the admin dashboard |
//!
//! Numeric fields are decoded leniently: the app has written numbers both as
//! numbers and as text over time, and a bad value must never abort an export.

use chrono::{DateTime, NaiveDate, NaiveDateTime, Utc};
use serde::{Deserialize, Deserializer, Serialize};
use serde_json::Value;

// ============================================
// Timestamps
// ============================================

/// A timestamp as stored in a document.
///
/// Parsing is deferred to [`RecordTimestamp::to_datetime`] so that records
/// with odd timestamps still deserialize and are simply dropped by the
/// window filter.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum RecordTimestamp {
    /// Firestore `Timestamp` as exported by the JS SDK
    Firestore {
        #[serde(alias = "_seconds")]
        seconds: i64,
        #[serde(default, alias = "_nanoseconds")]
        nanoseconds: u32,
    },
    /// Epoch milliseconds
    Millis(f64),
    /// RFC 3339 or `YYYY-MM-DD` text
    Text(String),
    /// Anything else; never parses
    Other(Value),
}

impl RecordTimestamp {
    /// Resolve to a UTC instant, or `None` if the value cannot be understood.
    pub fn to_datetime(&self) -> Option<DateTime<Utc>> {
        match self {
            RecordTimestamp::Firestore {
                seconds,
                nanoseconds,
            } => DateTime::from_timestamp(*seconds, *nanoseconds),
            RecordTimestamp::Millis(ms) if ms.is_finite() => {
                DateTime::from_timestamp_millis(*ms as i64)
            }
            RecordTimestamp::Millis(_) => None,
            RecordTimestamp::Text(text) => parse_timestamp_text(text),
            RecordTimestamp::Other(_) => None,
        }
    }
}

impl From<DateTime<Utc>> for RecordTimestamp {
    fn from(ts: DateTime<Utc>) -> Self {
        RecordTimestamp::Text(ts.to_rfc3339())
    }
}

fn parse_timestamp_text(text: &str) -> Option<DateTime<Utc>> {
    let text = text.trim();
    if let Ok(ts) = DateTime::parse_from_rfc3339(text) {
        return Some(ts.with_timezone(&Utc));
    }
    for format in ["%Y-%m-%dT%H:%M:%S%.f", "%Y-%m-%d %H:%M:%S%.f"] {
        if let Ok(naive) = NaiveDateTime::parse_from_str(text, format) {
            return Some(naive.and_utc());
        }
    }
    NaiveDate::parse_from_str(text, "%Y-%m-%d")
        .ok()
        .and_then(|date| date.and_hms_opt(0, 0, 0))
        .map(|naive| naive.and_utc())
}

// ============================================
// Lenient numeric decoding
// ============================================

fn number_from_value(value: Value) -> Option<f64> {
    match value {
        Value::Number(n) => n.as_f64(),
        Value::String(s) => s.trim().parse::<f64>().ok(),
        _ => None,
    }
    .filter(|n| n.is_finite())
}

fn lenient_f64<'de, D>(deserializer: D) -> Result<Option<f64>, D::Error>
where
    D: Deserializer<'de>,
{
    let value = Option::<Value>::deserialize(deserializer)?;
    Ok(value.and_then(number_from_value))
}

fn lenient_f64_or_zero<'de, D>(deserializer: D) -> Result<f64, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(lenient_f64(deserializer)?.unwrap_or(0.0))
}

fn lenient_count<'de, D>(deserializer: D) -> Result<u64, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(lenient_f64(deserializer)?
        .filter(|n| *n > 0.0)
        .map(|n| n as u64)
        .unwrap_or(0))
}

// ============================================
// Durations
// ============================================

/// A crisis duration as stored: the app has written both numbers and text.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum RawDuration {
    Number(f64),
    Text(String),
    Other(Value),
}

// ============================================
// Records
// ============================================

/// A patient account. Only the id matters to the aggregator; everything
/// else is carried through to raw exports untouched.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UserRecord {
    pub id: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub first_name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub last_name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub email: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub role: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub created_at: Option<RecordTimestamp>,
    /// Demographic and profile fields not interpreted here
    #[serde(flatten)]
    pub extra: serde_json::Map<String, Value>,
}

/// Platform-wide aggregate for one medication.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GlobalMedicationRecord {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,
    pub name: String,
    #[serde(default, deserialize_with = "lenient_count")]
    pub patient_count: u64,
    /// Average efficacy on the store's rating scale
    #[serde(default, deserialize_with = "lenient_f64_or_zero")]
    pub avg_efficacy: f64,
    /// Share of patients reporting side effects, 0-100
    #[serde(default, deserialize_with = "lenient_f64_or_zero")]
    pub side_effect_percentage: f64,
    #[serde(default, deserialize_with = "lenient_count")]
    pub side_effect_count: u64,
    #[serde(default, deserialize_with = "lenient_f64_or_zero")]
    pub total_efficacy: f64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub created_at: Option<RecordTimestamp>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub last_updated_at: Option<RecordTimestamp>,
}

/// One patient's log entry for a medication.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UserMedicationRecord {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,
    #[serde(alias = "medicationName")]
    pub name: String,
    #[serde(default)]
    pub dosage: String,
    #[serde(default)]
    pub frequency: String,
    /// Patient-reported effectiveness score
    #[serde(
        default,
        deserialize_with = "lenient_f64",
        skip_serializing_if = "Option::is_none"
    )]
    pub effectiveness: Option<f64>,
    /// Free text; `"none"` means no side effects
    #[serde(default, alias = "sideEffect", skip_serializing_if = "Option::is_none")]
    pub side_effects: Option<String>,
    #[serde(default)]
    pub user_id: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub created_at: Option<RecordTimestamp>,
}

/// A pain-journal entry describing one crisis.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CrisisJournalEntry {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,
    /// `Mild`, `Moderate` or `Severe`; other labels are tolerated
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub severity: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub duration: Option<RawDuration>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(default, alias = "eventDate", skip_serializing_if = "Option::is_none")]
    pub date: Option<RecordTimestamp>,
    #[serde(default)]
    pub user_id: String,
}

/// Dashboard counters maintained by the platform.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AdminAggregateStats {
    #[serde(default, deserialize_with = "lenient_count")]
    pub total_members: u64,
    #[serde(default, deserialize_with = "lenient_count")]
    pub medications_recorded: u64,
    #[serde(default, deserialize_with = "lenient_count")]
    pub crisis_events: u64,
}

/// Everything one export works on.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RecordSet {
    #[serde(default)]
    pub users: Vec<UserRecord>,
    #[serde(default)]
    pub global_medications: Vec<GlobalMedicationRecord>,
    #[serde(default)]
    pub user_medications: Vec<UserMedicationRecord>,
    #[serde(default)]
    pub crisis_entries: Vec<CrisisJournalEntry>,
    #[serde(default)]
    pub admin_stats: AdminAggregateStats,
}
