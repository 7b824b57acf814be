//! Calendar month buckets.
//!
//! Every ledger entry is partitioned by the UTC month of its timestamp. The month is
//! written into keys as six ASCII digits (`YYYYMM`), which sort the same way the
//! months do.

use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, Datelike, Duration, NaiveDate, TimeZone, Utc};
use serde::{Deserialize, Serialize};

use crate::error::{Result, ValidationError};

const MONTH_ABBRS: [&str; 12] = [
    "jan", "feb", "mar", "apr", "may", "jun", "jul", "aug", "sep", "oct", "nov", "dec",
];

/// A calendar month in UTC.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct Month {
    year: i32,
    month: u32,
}

impl Month {
    /// Create a month.
    ///
    /// # Errors
    ///
    /// Returns `ValidationError::InvalidMonth` unless `1 <= month <= 12` and the year
    /// fits in four digits.
    pub fn new(year: i32, month: u32) -> Result<Self> {
        if !(1..=12).contains(&month) || !(0..=9999).contains(&year) {
            return Err(ValidationError::InvalidMonth(format!("{year}-{month}")));
        }
        Ok(Self { year, month })
    }

    /// The month containing `at`.
    #[must_use]
    pub fn of(at: DateTime<Utc>) -> Self {
        Self {
            year: at.year(),
            month: at.month(),
        }
    }

    /// The current month.
    #[must_use]
    pub fn current() -> Self {
        Self::of(Utc::now())
    }

    /// Resolve a three letter month abbreviation (`"jan"`..`"dec"`) within `year`.
    #[must_use]
    pub fn from_abbr(year: i32, abbr: &str) -> Option<Self> {
        let abbr = abbr.to_ascii_lowercase();
        let index = MONTH_ABBRS.iter().position(|m| *m == abbr)?;
        let month = u32::try_from(index).ok()? + 1;
        Self::new(year, month).ok()
    }

    /// The year.
    #[must_use]
    pub const fn year(self) -> i32 {
        self.year
    }

    /// The month number, 1 through 12.
    #[must_use]
    pub const fn month(self) -> u32 {
        self.month
    }

    /// The six byte `YYYYMM` bucket used in ledger keys.
    #[must_use]
    pub fn bucket(self) -> [u8; 6] {
        let year = self.year.clamp(0, 9999).unsigned_abs();
        let digit = |n: u32| b'0' + u8::try_from(n % 10).unwrap_or(0);
        [
            digit(year / 1000),
            digit(year / 100),
            digit(year / 10),
            digit(year),
            digit(self.month / 10),
            digit(self.month),
        ]
    }

    /// Parse a `YYYYMM` bucket.
    ///
    /// # Errors
    ///
    /// Returns `ValidationError::InvalidMonth` if the bytes are not six digits naming a
    /// valid month.
    pub fn from_bucket(bucket: &[u8]) -> Result<Self> {
        let invalid =
            || ValidationError::InvalidMonth(String::from_utf8_lossy(bucket).into_owned());
        if bucket.len() != 6 || !bucket.iter().all(u8::is_ascii_digit) {
            return Err(invalid());
        }
        let digits = |range: std::ops::Range<usize>| {
            bucket[range]
                .iter()
                .fold(0u32, |acc, d| acc * 10 + u32::from(d - b'0'))
        };
        let year = i32::try_from(digits(0..4)).map_err(|_| invalid())?;
        Self::new(year, digits(4..6)).map_err(|_| invalid())
    }

    /// The month after this one.
    #[must_use]
    pub const fn next(self) -> Self {
        if self.month == 12 {
            Self {
                year: self.year + 1,
                month: 1,
            }
        } else {
            Self {
                year: self.year,
                month: self.month + 1,
            }
        }
    }

    /// The month before this one.
    #[must_use]
    pub const fn prev(self) -> Self {
        if self.month == 1 {
            Self {
                year: self.year - 1,
                month: 12,
            }
        } else {
            Self {
                year: self.year,
                month: self.month - 1,
            }
        }
    }

    /// The first nanosecond of the month.
    #[must_use]
    pub fn start(self) -> DateTime<Utc> {
        NaiveDate::from_ymd_opt(self.year, self.month, 1)
            .and_then(|d| d.and_hms_opt(0, 0, 0))
            .map_or(DateTime::<Utc>::MIN_UTC, |naive| Utc.from_utc_datetime(&naive))
    }

    /// The last nanosecond of the month.
    #[must_use]
    pub fn end(self) -> DateTime<Utc> {
        self.next().start() - Duration::nanoseconds(1)
    }

    /// Whether `at` falls inside this month.
    #[must_use]
    pub fn contains(self, at: DateTime<Utc>) -> bool {
        Self::of(at) == self
    }
}

impl fmt::Display for Month {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:04}-{:02}", self.year, self.month)
    }
}

impl FromStr for Month {
    type Err = ValidationError;

    /// Accepts `YYYYMM` and `YYYY-MM`.
    fn from_str(s: &str) -> Result<Self> {
        let compact: String = s.trim().chars().filter(|c| *c != '-').collect();
        Self::from_bucket(compact.as_bytes())
            .map_err(|_| ValidationError::InvalidMonth(s.to_string()))
    }
}
