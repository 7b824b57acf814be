//! The ledger record.

use std::fmt;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::{Money, UserId, SUMMARY_TAG};

/// A single ledger entry.
///
/// Entries are append-only: once written they are never updated or removed.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Transaction {
    /// When the transaction happened, stored as nanoseconds since the epoch.
    #[serde(with = "chrono::serde::ts_nanoseconds")]
    pub timestamp: DateTime<Utc>,

    /// Signed amount in cents.
    pub amount: Money,

    /// The category this entry is filed under.
    pub tag: String,

    /// Who submitted it; [`UserId::SYSTEM`] for summaries.
    pub user_id: UserId,

    /// Set only on month-end summary entries.
    #[serde(default)]
    pub is_summary: bool,

    /// Optional free-text note.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub note: Option<String>,
}

impl Transaction {
    /// Create a user-submitted transaction.
    #[must_use]
    pub fn new(
        timestamp: DateTime<Utc>,
        amount: Money,
        tag: impl Into<String>,
        user_id: UserId,
    ) -> Self {
        Self {
            timestamp,
            amount,
            tag: tag.into(),
            user_id,
            is_summary: false,
            note: None,
        }
    }

    /// Create a month-end summary entry carrying `balance`.
    #[must_use]
    pub fn summary(timestamp: DateTime<Utc>, balance: Money) -> Self {
        Self {
            timestamp,
            amount: balance,
            tag: SUMMARY_TAG.to_string(),
            user_id: UserId::SYSTEM,
            is_summary: true,
            note: Some("summary txn".to_string()),
        }
    }

    /// Attach a note.
    #[must_use]
    pub fn with_note(mut self, note: impl Into<String>) -> Self {
        self.note = Some(note.into());
        self
    }
}

impl fmt::Display for Transaction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let preposition = if self.amount.is_outflow() { "on" } else { "from" };
        write!(
            f,
            "user {} {} {} {preposition} {}",
            self.user_id,
            self.amount.action(),
            self.amount.abs(),
            self.tag
        )
    }
}
