//! Service configuration.

use std::time::Duration;

/// Default upper bound on a single scheduler sleep.
pub const DEFAULT_RESYNC_SECS: u64 = 3600;

/// Service configuration loaded from environment variables.
#[derive(Debug, Clone)]
pub struct ServiceConfig {
    /// Path to the `RocksDB` data directory (default: "/data/kft").
    pub data_dir: String,

    /// Authorized usernames, registered in this order at startup.
    pub users: Vec<String>,

    /// Admin username (default: the first authorized user).
    pub admin: Option<String>,

    /// Longest the scheduler sleeps before re-reading the wall clock, in seconds.
    pub resync_interval_secs: u64,
}

impl ServiceConfig {
    /// Load configuration from environment variables.
    #[must_use]
    pub fn from_env() -> Self {
        Self {
            data_dir: std::env::var("KFT_DBLOC").unwrap_or_else(|_| "/data/kft".into()),
            users: std::env::var("KFT_USERS")
                .map(|s| parse_users(&s))
                .unwrap_or_default(),
            admin: std::env::var("KFT_ADMIN").ok().filter(|s| !s.trim().is_empty()),
            resync_interval_secs: std::env::var("KFT_RESYNC_SECS")
                .ok()
                .and_then(|s| s.parse().ok())
                .filter(|secs| *secs > 0)
                .unwrap_or(DEFAULT_RESYNC_SECS),
        }
    }

    /// The admin username: `admin` if set, otherwise the first user.
    #[must_use]
    pub fn admin_username(&self) -> Option<&str> {
        self.admin
            .as_deref()
            .or_else(|| self.users.first().map(String::as_str))
    }

    /// The scheduler resync interval.
    #[must_use]
    pub const fn resync_interval(&self) -> Duration {
        Duration::from_secs(self.resync_interval_secs)
    }
}

impl Default for ServiceConfig {
    fn default() -> Self {
        Self {
            data_dir: "/data/kft".into(),
            users: Vec::new(),
            admin: None,
            resync_interval_secs: DEFAULT_RESYNC_SECS,
        }
    }
}

/// Split a comma separated user list, dropping blanks.
fn parse_users(raw: &str) -> Vec<String> {
    raw.split(',')
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(String::from)
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_user_list() {
        assert_eq!(parse_users("alice, bob,,carol "), vec!["alice", "bob", "carol"]);
        assert!(parse_users("").is_empty());
    }

    #[test]
    fn admin_defaults_to_first_user() {
        let config = ServiceConfig {
            users: vec!["alice".into(), "bob".into()],
            ..ServiceConfig::default()
        };
        assert_eq!(config.admin_username(), Some("alice"));

        let config = ServiceConfig {
            admin: Some("bob".into()),
            ..config
        };
        assert_eq!(config.admin_username(), Some("bob"));
        assert_eq!(ServiceConfig::default().admin_username(), None);
    }

    #[test]
    fn default_resync_interval() {
        assert_eq!(
            ServiceConfig::default().resync_interval(),
            Duration::from_secs(3600)
        );
    }
}
