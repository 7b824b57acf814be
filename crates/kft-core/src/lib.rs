//! Core types for the kft shared ledger.
//!
//! This crate provides the foundational types used by the storage engine and the
//! ledger service:
//!
//! - **Money**: `Money`, a signed integer number of cents
//! - **Periods**: `Month`, the `YYYYMM` bucket every entry is partitioned by
//! - **Identifiers**: `UserId`, tag and username validation
//! - **Transactions**: `Transaction`, the immutable ledger record
//!
//! # Money
//!
//! Amounts are stored as `i64` cents. The sign is meaningful: negative amounts are
//! outflows ("spent"), positive amounts are inflows ("received").

#![forbid(unsafe_code)]
#![warn(missing_docs)]
#![warn(clippy::all)]
#![warn(clippy::pedantic)]

pub mod error;
pub mod ids;
pub mod money;
pub mod period;
pub mod transaction;

pub use error::{Result, ValidationError};
pub use ids::{
    validate_tag, validate_username, UserId, MAX_TAG_LENGTH, MAX_USERNAME_LENGTH, SUMMARY_TAG,
};
pub use money::Money;
pub use period::Month;
pub use transaction::Transaction;
