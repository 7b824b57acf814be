//! KFT ledger service.
//!
//! This crate provides the in-process engine a chat command layer drives:
//!
//! - [`Ledger`]: add transactions and aggregate them per month and tag
//! - [`PeriodScheduler`]: close out each calendar month with a summary entry
//! - [`ServiceConfig`]: settings read from the environment by the binary
//!
//! Parsing chat commands and formatting replies stay with the caller, which maps
//! usernames to [`kft_core::UserId`]s through [`Ledger::users`] before calling in.

#![forbid(unsafe_code)]
#![warn(missing_docs)]
#![warn(clippy::all)]
#![warn(clippy::pedantic)]

pub mod balance;
pub mod config;
pub mod error;
pub mod ledger;
pub mod scheduler;
pub mod shutdown;

pub use balance::TagBalance;
pub use config::ServiceConfig;
pub use error::{LedgerError, Result};
pub use ledger::Ledger;
pub use scheduler::{PeriodScheduler, SchedulerState};
pub use shutdown::shutdown_signal;
