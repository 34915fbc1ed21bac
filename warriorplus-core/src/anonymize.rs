//! De-identification of windowed records before a report is assembled.
//!
//! - `none`: records pass through unchanged
//! - `partial`: user ids become pseudonyms such as `patient-0001` and names
//!   and emails are dropped. One user keeps one pseudonym across users,
//!   medication logs and crisis entries, so per-patient journeys survive.
//! - `full`: everything `partial` does, plus uninterpreted profile fields
//!   and free-text crisis descriptions are dropped.
//!
//! Pseudonyms are assigned in order of first appearance, walking users,
//! then medication logs, then crisis entries. They are stable within one
//! export, not across exports.

use std::collections::HashMap;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::Error;
use crate::types::RecordSet;

/// How much identifying data an export keeps.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Anonymization {
    None,
    Partial,
    #[default]
    Full,
}

impl Anonymization {
    pub fn as_str(&self) -> &'static str {
        match self {
            Anonymization::None => "none",
            Anonymization::Partial => "partial",
            Anonymization::Full => "full",
        }
    }
}

impl FromStr for Anonymization {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "none" => Ok(Anonymization::None),
            "partial" => Ok(Anonymization::Partial),
            "full" => Ok(Anonymization::Full),
            _ => Err(Error::InvalidAnonymization(s.to_string())),
        }
    }
}

impl std::fmt::Display for Anonymization {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Maps real user ids onto sequential pseudonyms.
#[derive(Debug, Default)]
struct Pseudonyms {
    assigned: HashMap<String, String>,
}

impl Pseudonyms {
    fn replace(&mut self, user_id: &mut String) {
        // unattributed records stay unattributed
        if user_id.is_empty() {
            return;
        }
        let next = self.assigned.len() + 1;
        let pseudonym = self
            .assigned
            .entry(std::mem::take(user_id))
            .or_insert_with(|| format!("patient-{next:04}"));
        user_id.clone_from(pseudonym);
    }
}

/// Strip identifying data from a record set according to `level`.
pub fn anonymize(mut records: RecordSet, level: Anonymization) -> RecordSet {
    if level == Anonymization::None {
        return records;
    }

    let mut pseudonyms = Pseudonyms::default();

    for user in &mut records.users {
        pseudonyms.replace(&mut user.id);
        user.first_name = None;
        user.last_name = None;
        user.email = None;
        if level == Anonymization::Full {
            user.extra.clear();
        }
    }
    for log in &mut records.user_medications {
        pseudonyms.replace(&mut log.user_id);
    }
    for entry in &mut records.crisis_entries {
        pseudonyms.replace(&mut entry.user_id);
        if level == Anonymization::Full {
            entry.description = None;
        }
    }

    tracing::debug!(
        level = %level,
        patients = pseudonyms.assigned.len(),
        "Anonymized records"
    );
    records
}
