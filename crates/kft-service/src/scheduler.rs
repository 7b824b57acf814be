//! Month-end scheduler.
//!
//! A background task that waits for the last nanosecond of the month, closes the
//! month with a summary entry, and re-arms for the next month. The wait is a timer
//! raced against the cancellation token, so the task never spins and shuts down as
//! soon as it is cancelled.

use std::fmt;
use std::sync::Arc;
use std::time::Duration;

use chrono::{DateTime, Utc};
use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tokio::time::sleep;
use tokio_util::sync::CancellationToken;

use kft_core::Month;

use crate::config::DEFAULT_RESYNC_SECS;
use crate::error::{LedgerError, Result};
use crate::ledger::Ledger;

/// Where the scheduler loop is.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SchedulerState {
    /// Sleeping until `trigger`.
    Waiting {
        /// Instant at which the month closes.
        trigger: DateTime<Utc>,
    },
    /// Writing the summary for `month`.
    Summarizing {
        /// The month being closed.
        month: Month,
    },
    /// Cancelled; the loop exits.
    ShuttingDown,
}

impl fmt::Display for SchedulerState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Waiting { trigger } => write!(f, "waiting until {}", trigger.to_rfc3339()),
            Self::Summarizing { month } => write!(f, "summarizing {month}"),
            Self::ShuttingDown => f.write_str("shutting down"),
        }
    }
}

/// Closes each month with a summary entry.
pub struct PeriodScheduler {
    ledger: Arc<Ledger>,
    trigger: DateTime<Utc>,
    resync_interval: Duration,
    heartbeat: Option<mpsc::Sender<Month>>,
}

impl PeriodScheduler {
    /// A scheduler armed for the end of the current month.
    ///
    /// If the ledger's last closed month is older than the previous month, the
    /// scheduler arms for the month after it instead, so months missed while the
    /// process was down are closed first.
    #[must_use]
    pub fn new(ledger: Arc<Ledger>) -> Self {
        let current = Month::current().end();
        let trigger = ledger
            .last_summarized()
            .map_or(current, |last| last.next().end().min(current));
        Self {
            ledger,
            trigger,
            resync_interval: Duration::from_secs(DEFAULT_RESYNC_SECS),
            heartbeat: None,
        }
    }

    /// Arm the first trigger at `trigger` instead; the month containing it is the
    /// one that gets closed.
    #[must_use]
    pub fn with_trigger(mut self, trigger: DateTime<Utc>) -> Self {
        self.trigger = trigger;
        self
    }

    /// Cap a single sleep at `interval`, after which the wall clock is read again.
    #[must_use]
    pub fn with_resync_interval(mut self, interval: Duration) -> Self {
        self.resync_interval = interval;
        self
    }

    /// Send the closed month on `heartbeat` after each completed cycle.
    ///
    /// Sends never block: a full or closed channel drops the signal.
    #[must_use]
    pub fn with_heartbeat(mut self, heartbeat: mpsc::Sender<Month>) -> Self {
        self.heartbeat = Some(heartbeat);
        self
    }

    /// The first trigger instant.
    #[must_use]
    pub const fn trigger(&self) -> DateTime<Utc> {
        self.trigger
    }

    /// Run the loop on a new task.
    #[must_use]
    pub fn spawn(self, cancel: CancellationToken) -> JoinHandle<Result<()>> {
        tokio::spawn(self.run(cancel))
    }

    /// Run until `cancel` fires or a summary fails.
    ///
    /// # Errors
    ///
    /// Returns the error of a failed summary. The task ends there; the month stays
    /// open and the enclosing process should treat the failure as fatal.
    pub async fn run(self, cancel: CancellationToken) -> Result<()> {
        let mut state = SchedulerState::Waiting {
            trigger: self.trigger,
        };
        tracing::info!(%state, "Period scheduler started");

        loop {
            if cancel.is_cancelled() {
                state = SchedulerState::ShuttingDown;
            }

            state = match state {
                SchedulerState::Waiting { trigger } => self.wait(trigger, &cancel).await,
                SchedulerState::Summarizing { month } => {
                    self.summarize(month).await?;
                    if let Some(heartbeat) = &self.heartbeat {
                        let _ = heartbeat.try_send(month);
                    }
                    let next = SchedulerState::Waiting {
                        trigger: month.next().end(),
                    };
                    tracing::debug!(state = %next, "Period scheduler re-armed");
                    next
                }
                SchedulerState::ShuttingDown => {
                    tracing::info!("Period scheduler shut down");
                    return Ok(());
                }
            };
        }
    }

    /// Sleep towards `trigger`, waking early on cancellation or after the resync
    /// interval.
    async fn wait(&self, trigger: DateTime<Utc>, cancel: &CancellationToken) -> SchedulerState {
        let now = Utc::now();
        if now >= trigger {
            return SchedulerState::Summarizing {
                month: Month::of(trigger),
            };
        }

        let remaining = (trigger - now).to_std().unwrap_or(Duration::ZERO);
        let nap = remaining.min(self.resync_interval);

        tokio::select! {
            biased;
            () = cancel.cancelled() => SchedulerState::ShuttingDown,
            () = sleep(nap) => SchedulerState::Waiting { trigger },
        }
    }

    async fn summarize(&self, month: Month) -> Result<()> {
        let ledger = Arc::clone(&self.ledger);
        let outcome = tokio::task::spawn_blocking(move || ledger.summarize_month(month))
            .await
            .map_err(|e| LedgerError::Scheduler(e.to_string()))?;

        if let Err(err) = outcome {
            tracing::error!(%month, error = %err, "Month summary failed, stopping scheduler");
            return Err(err);
        }
        Ok(())
    }
}
