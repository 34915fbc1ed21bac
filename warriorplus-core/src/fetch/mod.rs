//! Record sources
//!
//! A [`RecordSource`] is the only boundary between the exporter and the
//! document store. Two implementations ship with the crate:
//! - [`FirestoreClient`]: reads the live Firestore database over REST
//! - [`SnapshotSource`]: reads a JSON snapshot file, for offline exports
//!
//! [`fetch_all`] issues every fetch concurrently and joins them; the first
//! failure aborts the whole fetch.

mod firestore;
mod snapshot;

pub use firestore::FirestoreClient;
pub use snapshot::SnapshotSource;

use async_trait::async_trait;

use crate::error::Result;
use crate::types::{
    AdminAggregateStats, CrisisJournalEntry, GlobalMedicationRecord, RecordSet,
    UserMedicationRecord, UserRecord,
};

/// Read access to the platform's collections.
///
/// Per-user collections come back flattened, each record tagged with its
/// owning user id.
#[async_trait]
pub trait RecordSource: Send + Sync {
    async fn fetch_users(&self) -> Result<Vec<UserRecord>>;
    async fn fetch_global_medications(&self) -> Result<Vec<GlobalMedicationRecord>>;
    async fn fetch_user_medications(&self) -> Result<Vec<UserMedicationRecord>>;
    async fn fetch_crisis_entries(&self) -> Result<Vec<CrisisJournalEntry>>;
    async fn fetch_admin_stats(&self) -> Result<AdminAggregateStats>;
}

/// Fetch every collection concurrently.
pub async fn fetch_all<S>(source: &S) -> Result<RecordSet>
where
    S: RecordSource + ?Sized,
{
    let (users, global_medications, user_medications, crisis_entries, admin_stats) = tokio::try_join!(
        source.fetch_users(),
        source.fetch_global_medications(),
        source.fetch_user_medications(),
        source.fetch_crisis_entries(),
        source.fetch_admin_stats(),
    )?;

    tracing::info!(
        users = users.len(),
        global_medications = global_medications.len(),
        user_medications = user_medications.len(),
        crisis_entries = crisis_entries.len(),
        "Fetched record set"
    );

    Ok(RecordSet {
        users,
        global_medications,
        user_medications,
        crisis_entries,
        admin_stats,
    })
}
