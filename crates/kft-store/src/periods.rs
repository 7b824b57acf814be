//! Month-end bookkeeping.
//!
//! Remembers the last month a summary entry was written for, so a restarted
//! scheduler does not close the same month twice.

use std::sync::Arc;

use parking_lot::Mutex;
use serde::{Deserialize, Serialize};

use kft_core::Month;

use crate::cache::CacheCell;
use crate::error::Result;
use crate::schema::cache;
use crate::KvStore;

#[derive(Debug, Default, Serialize, Deserialize)]
struct PeriodRecord {
    last_summarized: Option<Month>,
}

/// Persisted "last summarized month".
pub struct PeriodState {
    cell: CacheCell<PeriodRecord>,
    state: Mutex<PeriodRecord>,
}

impl PeriodState {
    /// Load the state from `store`; nothing is summarized on first run.
    ///
    /// # Errors
    ///
    /// Returns `StoreError::Serialization` if the stored blob is corrupt and
    /// `StoreError::Database` if the substrate fails.
    pub fn load(store: Arc<dyn KvStore>) -> Result<Self> {
        let cell = CacheCell::new(store, cache::PERIODS);
        let state = cell.load()?;
        Ok(Self {
            cell,
            state: Mutex::new(state),
        })
    }

    /// The most recent month that was closed.
    #[must_use]
    pub fn last_summarized(&self) -> Option<Month> {
        self.state.lock().last_summarized
    }

    /// Whether `month` has already been closed.
    #[must_use]
    pub fn is_closed(&self, month: Month) -> bool {
        self.last_summarized().is_some_and(|last| month <= last)
    }

    /// Close `month` by running `write`, then record it.
    ///
    /// Returns `Ok(false)` without calling `write` if `month` is already closed. The
    /// lock is held for the whole call, so one month is closed at most once per
    /// process.
    ///
    /// # Errors
    ///
    /// Returns the error from `write`, in which case nothing is recorded, or the
    /// error from saving the state.
    pub fn close_with<E>(
        &self,
        month: Month,
        write: impl FnOnce() -> std::result::Result<(), E>,
    ) -> std::result::Result<bool, E>
    where
        E: From<crate::StoreError>,
    {
        let mut state = self.state.lock();
        if state.last_summarized.is_some_and(|last| month <= last) {
            return Ok(false);
        }
        write()?;
        state.last_summarized = Some(month);
        self.cell.save(&state)?;
        Ok(true)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{MemoryStore, StoreError};

    fn month(m: u32) -> Month {
        Month::new(2024, m).unwrap()
    }

    #[test]
    fn closes_each_month_once() {
        let store: Arc<dyn KvStore> = Arc::new(MemoryStore::new());
        let periods = PeriodState::load(store).unwrap();
        let mut writes = 0;

        let closed = periods
            .close_with(month(1), || {
                writes += 1;
                Ok::<_, StoreError>(())
            })
            .unwrap();
        assert!(closed);

        let closed = periods
            .close_with(month(1), || {
                writes += 1;
                Ok::<_, StoreError>(())
            })
            .unwrap();
        assert!(!closed);
        assert_eq!(writes, 1);
        assert!(periods.is_closed(month(1)));
        assert!(!periods.is_closed(month(2)));
    }

    #[test]
    fn failed_write_is_not_recorded() {
        let store: Arc<dyn KvStore> = Arc::new(MemoryStore::new());
        let periods = PeriodState::load(store).unwrap();
        let result =
            periods.close_with(month(3), || Err(StoreError::Database("disk full".into())));
        assert!(result.is_err());
        assert_eq!(periods.last_summarized(), None);
    }

    #[test]
    fn survives_reload() {
        let store: Arc<dyn KvStore> = Arc::new(MemoryStore::new());
        let periods = PeriodState::load(Arc::clone(&store)).unwrap();
        periods
            .close_with(month(5), || Ok::<_, StoreError>(()))
            .unwrap();
        drop(periods);

        let periods = PeriodState::load(store).unwrap();
        assert_eq!(periods.last_summarized(), Some(month(5)));
        assert!(periods.is_closed(month(4)));
    }
}
