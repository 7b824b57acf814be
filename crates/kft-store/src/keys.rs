//! Ledger key codec.
//!
//! A ledger key is a fixed 47 byte layout:
//!
//! ```text
//! table[1] || month[6] ("YYYYMM") || tag[32] (space padded) || timestamp[8]
//! ```
//!
//! The timestamp is the entry's nanoseconds since the epoch, big-endian, with the
//! sign bit flipped so that byte order equals numeric order for pre-1970 instants
//! too. Byte-wise comparison of two keys therefore orders them by table, then
//! month, then tag, then timestamp.

use chrono::{DateTime, TimeZone, Utc};

use kft_core::{validate_tag, Month, ValidationError, MAX_TAG_LENGTH};

use crate::error::{Result, StoreError};
use crate::schema::table;

const MONTH_LEN: usize = 6;
const TIMESTAMP_LEN: usize = 8;
const MONTH_OFFSET: usize = 1;
const TAG_OFFSET: usize = MONTH_OFFSET + MONTH_LEN;
const TIMESTAMP_OFFSET: usize = TAG_OFFSET + MAX_TAG_LENGTH;
const SIGN_BIT: u64 = 1 << 63;

/// Length of every ledger key.
pub const LEDGER_KEY_LEN: usize = TIMESTAMP_OFFSET + TIMESTAMP_LEN;

/// The decoded fields of a ledger key.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LedgerKey {
    /// Table id byte.
    pub table: u8,
    /// Month bucket.
    pub month: Month,
    /// Tag, with padding removed.
    pub tag: String,
    /// Entry timestamp.
    pub timestamp: DateTime<Utc>,
}

impl LedgerKey {
    /// Encode these fields.
    ///
    /// # Errors
    ///
    /// See [`encode`].
    pub fn to_bytes(&self) -> Result<Vec<u8>> {
        encode(self.table, self.month, &self.tag, self.timestamp)
    }
}

/// How much of a key a prefix pins down.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum KeyScope<'a> {
    /// Every key in the table.
    Table,
    /// Every tag in one month.
    Month(Month),
    /// One tag in one month.
    Tag(Month, &'a str),
}

/// Encode a ledger key.
///
/// # Errors
///
/// Returns `ValidationError::InvalidTag` if the tag is empty, over 32 bytes or
/// contains whitespace, and `ValidationError::TimestampOutOfRange` if the timestamp
/// does not fit in `i64` nanoseconds.
pub fn encode(table: u8, month: Month, tag: &str, timestamp: DateTime<Utc>) -> Result<Vec<u8>> {
    let mut key = prefix_for(table, KeyScope::Tag(month, tag))?;
    key.extend_from_slice(&timestamp_bytes(timestamp)?);
    Ok(key)
}

/// Decode a ledger key.
///
/// # Errors
///
/// Returns `StoreError::MalformedKey` if the key is not exactly
/// [`LEDGER_KEY_LEN`] bytes, and `StoreError::Serialization` if the month or tag
/// field cannot be decoded.
pub fn decode(key: &[u8]) -> Result<LedgerKey> {
    if key.len() != LEDGER_KEY_LEN {
        return Err(StoreError::MalformedKey {
            expected: LEDGER_KEY_LEN,
            actual: key.len(),
        });
    }

    let month = Month::from_bucket(&key[MONTH_OFFSET..TAG_OFFSET])
        .map_err(|e| StoreError::Serialization(e.to_string()))?;

    let tag = std::str::from_utf8(&key[TAG_OFFSET..TIMESTAMP_OFFSET])
        .map_err(|e| StoreError::Serialization(format!("tag is not utf-8: {e}")))?
        .trim_end_matches(' ')
        .to_string();

    let mut raw = [0u8; TIMESTAMP_LEN];
    raw.copy_from_slice(&key[TIMESTAMP_OFFSET..]);
    let nanos = i64::from_be_bytes((u64::from_be_bytes(raw) ^ SIGN_BIT).to_be_bytes());

    Ok(LedgerKey {
        table: key[0],
        month,
        tag,
        timestamp: Utc.timestamp_nanos(nanos),
    })
}

/// Build the shortest prefix matching every key in `scope`.
///
/// # Errors
///
/// Returns `ValidationError::InvalidTag` if a tag scope names an invalid tag.
pub fn prefix_for(table: u8, scope: KeyScope<'_>) -> Result<Vec<u8>> {
    let mut prefix = Vec::with_capacity(LEDGER_KEY_LEN);
    prefix.push(table);
    match scope {
        KeyScope::Table => {}
        KeyScope::Month(month) => prefix.extend_from_slice(&month.bucket()),
        KeyScope::Tag(month, tag) => {
            prefix.extend_from_slice(&month.bucket());
            prefix.extend_from_slice(&pad_tag(tag)?);
        }
    }
    Ok(prefix)
}

/// Key of a named blob in the cache table.
#[must_use]
pub fn cache_key(name: &str) -> Vec<u8> {
    let mut key = Vec::with_capacity(1 + name.len());
    key.push(table::CACHE);
    key.extend_from_slice(name.as_bytes());
    key
}

fn pad_tag(tag: &str) -> Result<[u8; MAX_TAG_LENGTH]> {
    validate_tag(tag)?;
    let mut field = [b' '; MAX_TAG_LENGTH];
    field[..tag.len()].copy_from_slice(tag.as_bytes());
    Ok(field)
}

fn timestamp_bytes(timestamp: DateTime<Utc>) -> Result<[u8; TIMESTAMP_LEN]> {
    let nanos = timestamp
        .timestamp_nanos_opt()
        .ok_or_else(|| ValidationError::TimestampOutOfRange(timestamp.to_rfc3339()))?;
    Ok((u64::from_be_bytes(nanos.to_be_bytes()) ^ SIGN_BIT).to_be_bytes())
}
