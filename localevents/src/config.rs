//! Configuration management for the LocalEvents client.
//!
//! Loads configuration from environment variables with sensible defaults.
//! Unparseable or out-of-range numeric values fall back to the default.

use crate::client::MIN_FEEDBACK_LIMIT;
use std::env;
use std::path::PathBuf;
use std::time::Duration;

/// Default event store location
pub const DEFAULT_STORE_URL: &str = "http://127.0.0.1:8000";

/// Default session directory, relative to the working directory
pub const DEFAULT_SESSION_DIR: &str = ".localevents";

/// Client configuration
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Config {
    /// Base URL of the REST event store (`LOCALEVENTS_STORE_URL`)
    pub store_url: String,
    /// Where the session files live (`LOCALEVENTS_SESSION_DIR`)
    pub session_dir: PathBuf,
    /// Per-request timeout (`LOCALEVENTS_REQUEST_TIMEOUT_SECS`); none when unset
    pub request_timeout: Option<Duration>,
    /// Cap on actions reduced per dispatch (`LOCALEVENTS_FEEDBACK_LIMIT`),
    /// at least [`MIN_FEEDBACK_LIMIT`]
    pub feedback_limit: usize,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            store_url: DEFAULT_STORE_URL.to_string(),
            session_dir: PathBuf::from(DEFAULT_SESSION_DIR),
            request_timeout: None,
            feedback_limit: localevents_runtime::DEFAULT_FEEDBACK_LIMIT,
        }
    }
}

impl Config {
    /// Load configuration from the process environment
    #[must_use]
    pub fn from_env() -> Self {
        Self::from_lookup(|name| env::var(name).ok())
    }

    /// Load configuration through `lookup`, e.g. a map in tests
    #[must_use]
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Self {
        let defaults = Self::default();
        Self {
            store_url: lookup("LOCALEVENTS_STORE_URL").unwrap_or(defaults.store_url),
            session_dir: lookup("LOCALEVENTS_SESSION_DIR")
                .map_or(defaults.session_dir, PathBuf::from),
            request_timeout: lookup("LOCALEVENTS_REQUEST_TIMEOUT_SECS")
                .and_then(|s| s.parse::<u64>().ok())
                .filter(|secs| *secs > 0)
                .map(Duration::from_secs),
            feedback_limit: lookup("LOCALEVENTS_FEEDBACK_LIMIT")
                .and_then(|s| s.parse::<usize>().ok())
                .filter(|limit| *limit >= MIN_FEEDBACK_LIMIT)
                .unwrap_or(defaults.feedback_limit),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn lookup(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| ((*k).to_string(), (*v).to_string()))
            .collect();
        move |name: &str| map.get(name).cloned()
    }

    #[test]
    fn empty_environment_uses_defaults() {
        assert_eq!(Config::from_lookup(lookup(&[])), Config::default());
    }

    #[test]
    fn variables_override_defaults() {
        let config = Config::from_lookup(lookup(&[
            ("LOCALEVENTS_STORE_URL", "https://events.example.org"),
            ("LOCALEVENTS_SESSION_DIR", "/tmp/le"),
            ("LOCALEVENTS_REQUEST_TIMEOUT_SECS", "5"),
            ("LOCALEVENTS_FEEDBACK_LIMIT", "8"),
        ]));

        assert_eq!(config.store_url, "https://events.example.org");
        assert_eq!(config.session_dir, PathBuf::from("/tmp/le"));
        assert_eq!(config.request_timeout, Some(Duration::from_secs(5)));
        assert_eq!(config.feedback_limit, 8);
    }

    #[test]
    fn invalid_numbers_fall_back() {
        let config = Config::from_lookup(lookup(&[
            ("LOCALEVENTS_REQUEST_TIMEOUT_SECS", "soon"),
            ("LOCALEVENTS_FEEDBACK_LIMIT", "0"),
        ]));

        assert_eq!(config.request_timeout, None);
        assert_eq!(config.feedback_limit, 32);
    }

    #[test]
    fn feedback_limit_below_one_exchange_falls_back() {
        let too_small = Config::from_lookup(lookup(&[("LOCALEVENTS_FEEDBACK_LIMIT", "2")]));
        assert_eq!(too_small.feedback_limit, 32);

        let smallest = Config::from_lookup(lookup(&[("LOCALEVENTS_FEEDBACK_LIMIT", "3")]));
        assert_eq!(smallest.feedback_limit, MIN_FEEDBACK_LIMIT);
    }
}
