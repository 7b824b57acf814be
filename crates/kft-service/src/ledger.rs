//! The ledger service.
//!
//! Composes the key codec, the side indices and the store into the operations the
//! command layer calls: adding transactions and aggregating them per month.
//!
//! Ledger writes take no lock. Every key is unique by (month, tag, timestamp), so
//! concurrent adds never touch the same key, and the substrate writes single keys
//! atomically. Only the side indices serialize their writers.

use std::sync::Arc;

use chrono::{DateTime, Utc};

use kft_core::{validate_tag, Money, Month, Transaction, UserId, ValidationError, SUMMARY_TAG};
use kft_store::keys::{self, KeyScope};
use kft_store::schema::table;
use kft_store::{KvStore, PeriodState, Scan, StoreError, TagIndex, UserIndex};

use crate::balance::TagBalance;
use crate::error::{LedgerError, Result};

/// Append-only ledger with monthly aggregation.
pub struct Ledger {
    store: Arc<dyn KvStore>,
    tags: TagIndex,
    users: UserIndex,
    periods: PeriodState,
}

impl Ledger {
    /// Open the ledger over `store`, loading the side indices.
    ///
    /// # Errors
    ///
    /// Returns `LedgerError::Store` if an index blob cannot be read or decoded.
    pub fn open(store: Arc<dyn KvStore>) -> Result<Self> {
        let tags = TagIndex::load(Arc::clone(&store))?;
        let users = UserIndex::load(Arc::clone(&store))?;
        let periods = PeriodState::load(Arc::clone(&store))?;

        tracing::info!(
            tags = tags.len(),
            users = users.count(),
            last_summarized = ?periods.last_summarized(),
            "Ledger opened"
        );

        Ok(Self {
            store,
            tags,
            users,
            periods,
        })
    }

    /// The tag index.
    #[must_use]
    pub fn tags(&self) -> &TagIndex {
        &self.tags
    }

    /// The user index, for translating usernames into [`UserId`]s.
    #[must_use]
    pub fn users(&self) -> &UserIndex {
        &self.users
    }

    /// The last month closed by a summary entry.
    #[must_use]
    pub fn last_summarized(&self) -> Option<Month> {
        self.periods.last_summarized()
    }

    /// Register the authorized users in order, then the admin.
    ///
    /// # Errors
    ///
    /// Returns the first registration failure.
    pub fn register_users<S: AsRef<str>>(
        &self,
        usernames: &[S],
        admin: Option<&str>,
    ) -> Result<()> {
        for username in usernames {
            self.users.register(username.as_ref())?;
        }
        if let Some(admin) = admin {
            self.users.set_admin(admin)?;
        }
        Ok(())
    }

    /// Record a user-submitted transaction.
    ///
    /// # Errors
    ///
    /// - `ValidationError::ReservedTag` if `tag` is `"summary"`, and
    ///   `ValidationError::ReservedUser` for user id 0; nothing is written.
    /// - `ValidationError::InvalidTag` if the tag cannot be encoded; nothing is
    ///   written.
    /// - `LedgerError::Store` if the write fails.
    /// - `LedgerError::TagRegistration` if the entry was written but the tag index
    ///   could not be saved. The entry is durable in that case.
    pub fn add_transaction(
        &self,
        amount: Money,
        tag: &str,
        timestamp: DateTime<Utc>,
        user_id: UserId,
    ) -> Result<()> {
        self.add(Transaction::new(timestamp, amount, tag, user_id))
    }

    /// Record a user-submitted transaction with a free-text note.
    ///
    /// # Errors
    ///
    /// Same as [`Ledger::add_transaction`].
    pub fn add_transaction_with_note(
        &self,
        amount: Money,
        tag: &str,
        timestamp: DateTime<Utc>,
        user_id: UserId,
        note: &str,
    ) -> Result<()> {
        self.add(Transaction::new(timestamp, amount, tag, user_id).with_note(note))
    }

    fn add(&self, transaction: Transaction) -> Result<()> {
        if transaction.tag == SUMMARY_TAG {
            return Err(ValidationError::ReservedTag(transaction.tag).into());
        }
        if transaction.user_id.is_system() {
            return Err(ValidationError::ReservedUser.into());
        }
        validate_tag(&transaction.tag)?;

        self.append(&transaction)?;
        self.tags
            .register(&transaction.tag)
            .map_err(|source| {
                tracing::warn!(
                    tag = %transaction.tag,
                    error = %source,
                    "Transaction stored but tag index not saved"
                );
                LedgerError::TagRegistration { source }
            })?;

        tracing::debug!(
            user = %transaction.user_id,
            amount = %transaction.amount,
            tag = %transaction.tag,
            "Transaction recorded"
        );
        Ok(())
    }

    /// Write one entry under its ledger key.
    fn append(&self, transaction: &Transaction) -> Result<()> {
        let key = keys::encode(
            table::LEDGER,
            Month::of(transaction.timestamp),
            &transaction.tag,
            transaction.timestamp,
        )?;
        let value = serde_json::to_vec(transaction).map_err(StoreError::from)?;
        self.store.set(&key, &value)?;
        Ok(())
    }

    /// Visit every entry of `month`, optionally limited to one tag, in key order.
    ///
    /// Entries are decoded and handed over one at a time; return [`Scan::Stop`] to
    /// end early.
    ///
    /// # Errors
    ///
    /// Returns `LedgerError::Store` if the scan fails or an entry cannot be decoded.
    pub fn scan_month(
        &self,
        month: Month,
        tag: Option<&str>,
        mut visit: impl FnMut(Transaction) -> Scan,
    ) -> Result<()> {
        let scope = tag.map_or(KeyScope::Month(month), |tag| KeyScope::Tag(month, tag));
        let prefix = keys::prefix_for(table::LEDGER, scope)?;
        self.store.iterate_prefix(&prefix, &mut |_, value| {
            let transaction: Transaction = serde_json::from_slice(value)?;
            Ok(visit(transaction))
        })?;
        Ok(())
    }

    /// Net balance of `month` across every tag, summary entries included.
    ///
    /// A month without entries has a zero balance.
    ///
    /// # Errors
    ///
    /// Returns `LedgerError::Store` if the scan fails or an entry cannot be decoded,
    /// and `LedgerError::BalanceOverflow` if the sum does not fit in cents.
    pub fn get_balance(&self, month: Month) -> Result<Money> {
        let mut balance = Some(Money::ZERO);
        self.scan_month(month, None, |transaction| {
            balance = balance.and_then(|sum| sum.checked_add(transaction.amount));
            if balance.is_some() {
                Scan::Continue
            } else {
                Scan::Stop
            }
        })?;
        balance.ok_or_else(|| LedgerError::BalanceOverflow {
            scope: month.to_string(),
        })
    }

    /// Balance of one tag in `month`, broken down by user.
    ///
    /// # Errors
    ///
    /// Returns `ValidationError::InvalidTag` for a tag that cannot be encoded,
    /// `LedgerError::Store` if the scan fails, and `LedgerError::BalanceOverflow` if
    /// a sum does not fit in cents.
    pub fn get_tag_balance(&self, month: Month, tag: &str) -> Result<TagBalance> {
        let mut balance = TagBalance::new(tag);
        let mut overflowed = false;
        self.scan_month(month, Some(tag), |transaction| {
            if balance.add(transaction.user_id, transaction.amount) {
                Scan::Continue
            } else {
                overflowed = true;
                Scan::Stop
            }
        })?;
        if overflowed {
            return Err(LedgerError::BalanceOverflow {
                scope: format!("{month} {tag}"),
            });
        }
        Ok(balance)
    }

    /// Every known tag, sorted.
    #[must_use]
    pub fn list_tags(&self) -> Vec<String> {
        self.tags.snapshot()
    }

    /// Entries of `month`, optionally limited to one tag, excluding summaries.
    ///
    /// # Errors
    ///
    /// Same as [`Ledger::scan_month`].
    pub fn list_transactions(
        &self,
        month: Month,
        tag: Option<&str>,
    ) -> Result<Vec<Transaction>> {
        let mut transactions = Vec::new();
        self.scan_month(month, tag, |transaction| {
            if !transaction.is_summary {
                transactions.push(transaction);
            }
            Scan::Continue
        })?;
        Ok(transactions)
    }

    /// Number of entries stored for `month`, counted from keys alone.
    ///
    /// # Errors
    ///
    /// Returns `LedgerError::Store` if the scan fails.
    pub fn count_transactions(&self, month: Month) -> Result<usize> {
        let prefix = keys::prefix_for(table::LEDGER, KeyScope::Month(month))?;
        let mut count = 0;
        self.store.iterate_prefix(&prefix, &mut |_, _| {
            count += 1;
            Ok(Scan::Continue)
        })?;
        Ok(count)
    }

    /// Close `month` with a summary entry carrying its net balance.
    ///
    /// The entry is written by the system user under the reserved `"summary"` tag and
    /// timestamped at the first nanosecond of the following month, where it carries
    /// the balance forward. Returns `None` if `month` was already closed.
    ///
    /// # Errors
    ///
    /// Returns `LedgerError::Store` if the balance cannot be computed or either write
    /// fails. A failed summary write leaves the month open.
    pub fn summarize_month(&self, month: Month) -> Result<Option<Transaction>> {
        let mut written = None;
        let closed = self.periods.close_with(month, || {
            let balance = self.get_balance(month)?;
            let summary = Transaction::summary(month.next().start(), balance);
            self.append(&summary)?;
            written = Some(summary);
            Ok::<_, LedgerError>(())
        })?;

        if let Some(summary) = written.as_ref().filter(|_| closed) {
            tracing::info!(%month, balance = %summary.amount, "Month closed");
        } else {
            tracing::info!(%month, "Month already closed, skipping summary");
        }
        Ok(written)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;
    use kft_store::MemoryStore;

    fn ledger() -> Ledger {
        Ledger::open(Arc::new(MemoryStore::new())).unwrap()
    }

    fn jan(day: u32, secs: u32) -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2024, 1, day, 12, 0, secs).unwrap()
    }

    fn month() -> Month {
        Month::new(2024, 1).unwrap()
    }

    #[test]
    fn empty_month_balance_is_zero() {
        let ledger = ledger();
        assert_eq!(ledger.get_balance(month()).unwrap(), Money::ZERO);
        assert_eq!(ledger.count_transactions(month()).unwrap(), 0);
    }

    #[test]
    fn add_registers_the_tag() {
        let ledger = ledger();
        ledger
            .add_transaction(Money::from_cents(-500), "food", jan(1, 0), UserId::new(1))
            .unwrap();
        assert_eq!(ledger.list_tags(), vec!["food"]);
    }

    #[test]
    fn reserved_tag_is_rejected_without_writing() {
        let store = Arc::new(MemoryStore::new());
        let ledger = Ledger::open(store.clone()).unwrap();
        let result = ledger.add_transaction(
            Money::from_cents(100),
            SUMMARY_TAG,
            jan(1, 0),
            UserId::new(1),
        );
        assert!(matches!(
            result,
            Err(LedgerError::Validation(ValidationError::ReservedTag(_)))
        ));
        assert!(store.is_empty());
    }

    #[test]
    fn system_user_is_rejected() {
        let ledger = ledger();
        let result =
            ledger.add_transaction(Money::from_cents(100), "food", jan(1, 0), UserId::SYSTEM);
        assert!(matches!(
            result,
            Err(LedgerError::Validation(ValidationError::ReservedUser))
        ));
    }

    #[test]
    fn notes_are_kept() {
        let ledger = ledger();
        ledger
            .add_transaction_with_note(
                Money::from_cents(-1000),
                "cat-food",
                jan(3, 0),
                UserId::new(2),
                "Catfood and nip",
            )
            .unwrap();
        let listed = ledger.list_transactions(month(), None).unwrap();
        assert_eq!(listed.len(), 1);
        assert_eq!(listed[0].note.as_deref(), Some("Catfood and nip"));
    }

    #[test]
    fn scan_stops_early() {
        let ledger = ledger();
        for secs in 0..5 {
            ledger
                .add_transaction(Money::from_cents(-1), "food", jan(2, secs), UserId::new(1))
                .unwrap();
        }
        let mut seen = 0;
        ledger
            .scan_month(month(), None, |_| {
                seen += 1;
                if seen == 2 {
                    Scan::Stop
                } else {
                    Scan::Continue
                }
            })
            .unwrap();
        assert_eq!(seen, 2);
    }

    #[test]
    fn summary_closes_a_month_once() {
        let ledger = ledger();
        ledger
            .add_transaction(Money::from_cents(-2500), "food", jan(5, 0), UserId::new(1))
            .unwrap();

        let summary = ledger.summarize_month(month()).unwrap().unwrap();
        assert!(summary.is_summary);
        assert_eq!(summary.amount, Money::from_cents(-2500));
        assert_eq!(summary.timestamp, month().next().start());
        assert_eq!(ledger.last_summarized(), Some(month()));

        assert!(ledger.summarize_month(month()).unwrap().is_none());
        assert_eq!(ledger.count_transactions(month().next()).unwrap(), 1);
        assert_eq!(
            ledger.get_balance(month().next()).unwrap(),
            Money::from_cents(-2500)
        );
        assert!(!ledger.tags().is_known(SUMMARY_TAG));
    }
}
