//! Retention windows for exports.
//!
//! A window is always evaluated against an explicit `now`, so a record set
//! can be filtered reproducibly. Records whose timestamp is missing or
//! cannot be parsed fall outside every window except [`TimeWindow::All`].
//!
//! Relative windows cover `[now - span, now]`. A custom window covers whole
//! UTC days from `start` to `end`, both inclusive, and ignores `now`.

use chrono::{DateTime, Duration, NaiveDate, Utc};
use serde::{Deserialize, Serialize};

use crate::error::Error;
use crate::types::{
    CrisisJournalEntry, GlobalMedicationRecord, RecordSet, UserMedicationRecord, UserRecord,
};

const DATE_FORMAT: &str = "%Y-%m-%d";

/// Time window selector for an export.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum TimeWindow {
    #[serde(rename = "all")]
    All,
    #[serde(rename = "7d")]
    Last7Days,
    #[serde(rename = "30d")]
    Last30Days,
    #[serde(rename = "90d")]
    Last90Days,
    #[serde(rename = "1y")]
    LastYear,
    /// Explicit date range, written `YYYY-MM-DD..YYYY-MM-DD`
    #[serde(rename = "custom")]
    Custom { start: NaiveDate, end: NaiveDate },
}

impl TimeWindow {
    /// Build a custom window, rejecting ranges that end before they start.
    pub fn custom(start: NaiveDate, end: NaiveDate) -> Result<Self, Error> {
        if end < start {
            return Err(Error::InvalidWindow(format!(
                "{}..{} ends before it starts",
                start.format(DATE_FORMAT),
                end.format(DATE_FORMAT)
            )));
        }
        Ok(TimeWindow::Custom { start, end })
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            TimeWindow::All => "all",
            TimeWindow::Last7Days => "7d",
            TimeWindow::Last30Days => "30d",
            TimeWindow::Last90Days => "90d",
            TimeWindow::LastYear => "1y",
            TimeWindow::Custom { .. } => "custom",
        }
    }

    /// Filename-safe label: the selector, or `custom-YYYYMMDD-YYYYMMDD`.
    pub fn label(&self) -> String {
        match self {
            TimeWindow::Custom { start, end } => {
                format!("custom-{}-{}", start.format("%Y%m%d"), end.format("%Y%m%d"))
            }
            other => other.as_str().to_string(),
        }
    }

    /// Length of a relative window; `None` for all-time and custom ranges.
    pub fn span(&self) -> Option<Duration> {
        match self {
            TimeWindow::All | TimeWindow::Custom { .. } => None,
            TimeWindow::Last7Days => Some(Duration::days(7)),
            TimeWindow::Last30Days => Some(Duration::days(30)),
            TimeWindow::Last90Days => Some(Duration::days(90)),
            TimeWindow::LastYear => Some(Duration::days(365)),
        }
    }

    /// Earliest instant inside the window.
    pub fn start(&self, now: DateTime<Utc>) -> Option<DateTime<Utc>> {
        match self {
            TimeWindow::Custom { start, .. } => {
                start.and_hms_opt(0, 0, 0).map(|naive| naive.and_utc())
            }
            _ => self.span().map(|span| now - span),
        }
    }

    /// Whether `ts` lies inside the window.
    pub fn contains(&self, ts: Option<DateTime<Utc>>, now: DateTime<Utc>) -> bool {
        if *self == TimeWindow::All {
            return true;
        }
        let Some(ts) = ts else {
            return false;
        };
        match self {
            TimeWindow::Custom { start, end } => {
                let day = ts.date_naive();
                day >= *start && day <= *end
            }
            _ => match self.start(now) {
                Some(start) => ts >= start && ts <= now,
                None => true,
            },
        }
    }

    /// Get display name for this window.
    pub fn display_name(&self) -> &'static str {
        match self {
            TimeWindow::All => "All time",
            TimeWindow::Last7Days => "Last 7 days",
            TimeWindow::Last30Days => "Last 30 days",
            TimeWindow::Last90Days => "Last 90 days",
            TimeWindow::LastYear => "Last year",
            TimeWindow::Custom { .. } => "Custom range",
        }
    }
}

impl std::fmt::Display for TimeWindow {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            TimeWindow::Custom { start, end } => write!(
                f,
                "{}..{}",
                start.format(DATE_FORMAT),
                end.format(DATE_FORMAT)
            ),
            other => f.write_str(other.as_str()),
        }
    }
}

impl std::str::FromStr for TimeWindow {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let s = s.trim();
        if let Some((start, end)) = s.split_once("..") {
            let parse = |text: &str| {
                NaiveDate::parse_from_str(text.trim(), DATE_FORMAT)
                    .map_err(|_| Error::InvalidWindow(s.to_string()))
            };
            return TimeWindow::custom(parse(start)?, parse(end)?);
        }
        match s {
            "all" | "allTime" => Ok(TimeWindow::All),
            "7d" | "last7days" => Ok(TimeWindow::Last7Days),
            "30d" | "last30days" => Ok(TimeWindow::Last30Days),
            "90d" | "last90days" => Ok(TimeWindow::Last90Days),
            "1y" | "lastYear" => Ok(TimeWindow::LastYear),
            other => Err(Error::InvalidWindow(other.to_string())),
        }
    }
}

/// A record that can be placed on the timeline.
pub trait Timestamped {
    /// The instant used for window filtering, if it can be determined.
    fn timestamp(&self) -> Option<DateTime<Utc>>;
}

impl Timestamped for UserRecord {
    fn timestamp(&self) -> Option<DateTime<Utc>> {
        self.created_at.as_ref().and_then(|ts| ts.to_datetime())
    }
}

impl Timestamped for GlobalMedicationRecord {
    fn timestamp(&self) -> Option<DateTime<Utc>> {
        self.last_updated_at
            .as_ref()
            .and_then(|ts| ts.to_datetime())
            .or_else(|| self.created_at.as_ref().and_then(|ts| ts.to_datetime()))
    }
}

impl Timestamped for UserMedicationRecord {
    fn timestamp(&self) -> Option<DateTime<Utc>> {
        self.created_at.as_ref().and_then(|ts| ts.to_datetime())
    }
}

impl Timestamped for CrisisJournalEntry {
    fn timestamp(&self) -> Option<DateTime<Utc>> {
        self.date.as_ref().and_then(|ts| ts.to_datetime())
    }
}

/// Keep the records that fall inside `window`.
pub fn filter_window<T>(records: Vec<T>, window: TimeWindow, now: DateTime<Utc>) -> Vec<T>
where
    T: Timestamped,
{
    if window == TimeWindow::All {
        return records;
    }
    records
        .into_iter()
        .filter(|record| window.contains(record.timestamp(), now))
        .collect()
}

/// Apply a window to every time-stamped collection of a record set.
///
/// Admin counters are a snapshot and pass through unchanged.
pub fn filter_record_set(records: RecordSet, window: TimeWindow, now: DateTime<Utc>) -> RecordSet {
    let before = (
        records.users.len(),
        records.global_medications.len(),
        records.user_medications.len(),
        records.crisis_entries.len(),
    );

    let filtered = RecordSet {
        users: filter_window(records.users, window, now),
        global_medications: filter_window(records.global_medications, window, now),
        user_medications: filter_window(records.user_medications, window, now),
        crisis_entries: filter_window(records.crisis_entries, window, now),
        admin_stats: records.admin_stats,
    };

    tracing::debug!(
        window = %window,
        users = %format!("{}/{}", filtered.users.len(), before.0),
        global_medications = %format!("{}/{}", filtered.global_medications.len(), before.1),
        user_medications = %format!("{}/{}", filtered.user_medications.len(), before.2),
        crisis_entries = %format!("{}/{}", filtered.crisis_entries.len(), before.3),
        "Applied time window"
    );

    filtered
}
