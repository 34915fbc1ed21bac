//! JSON snapshot source.
//!
//! A snapshot is one JSON object holding every collection:
//!
//! ```json
//! {
//!   "users": [{"id": "u1", "createdAt": "2025-01-10T08:00:00Z"}],
//!   "globalMedications": [{"name": "Hydroxyurea", "patientCount": 87}],
//!   "userMedications": [{"name": "Hydroxyurea", "userId": "u1", "effectiveness": 4}],
//!   "crisisEntries": [{"severity": "Mild", "duration": "3", "userId": "u1"}],
//!   "adminStats": {"totalMembers": 1}
//! }
//! ```

use std::path::Path;

use async_trait::async_trait;

use super::RecordSource;
use crate::error::{Error, Result};
use crate::types::{
    AdminAggregateStats, CrisisJournalEntry, GlobalMedicationRecord, RecordSet,
    UserMedicationRecord, UserRecord,
};

/// Serves records from an in-memory snapshot.
pub struct SnapshotSource {
    records: RecordSet,
}

impl SnapshotSource {
    /// Load a snapshot file.
    pub fn open(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path).map_err(|e| {
            Error::Io(std::io::Error::new(
                e.kind(),
                format!("failed to read snapshot {:?}: {}", path, e),
            ))
        })?;
        let records: RecordSet = serde_json::from_str(&content)?;

        tracing::info!(
            path = %path.display(),
            users = records.users.len(),
            global_medications = records.global_medications.len(),
            "Loaded snapshot"
        );

        Ok(Self { records })
    }

    pub fn from_records(records: RecordSet) -> Self {
        Self { records }
    }
}

#[async_trait]
impl RecordSource for SnapshotSource {
    async fn fetch_users(&self) -> Result<Vec<UserRecord>> {
        Ok(self.records.users.clone())
    }

    async fn fetch_global_medications(&self) -> Result<Vec<GlobalMedicationRecord>> {
        Ok(self.records.global_medications.clone())
    }

    async fn fetch_user_medications(&self) -> Result<Vec<UserMedicationRecord>> {
        Ok(self.records.user_medications.clone())
    }

    async fn fetch_crisis_entries(&self) -> Result<Vec<CrisisJournalEntry>> {
        Ok(self.records.crisis_entries.clone())
    }

    async fn fetch_admin_stats(&self) -> Result<AdminAggregateStats> {
        Ok(self.records.admin_stats.clone())
    }
}
