//! Key namespace definitions.
//!
//! The first byte of every key names the table it belongs to.

/// Table identifiers.
pub mod table {
    /// Fixed-key JSON blobs holding the side indices.
    pub const CACHE: u8 = 0;

    /// Ledger entries, keyed by `month || tag || timestamp`.
    pub const LEDGER: u8 = 1;
}

/// Names of the blobs in the cache table.
pub mod cache {
    /// The set of known tags.
    pub const TAGS: &str = "tags";

    /// The username/id directory.
    pub const USERS: &str = "users";

    /// The last month closed by a summary entry.
    pub const PERIODS: &str = "periods";
}
