//! Runtime configuration
//!
//! All settings come from `NOTIFY_*` environment variables. The binary loads
//! a `.env` file first, so the same keys can live there.

use std::env;
use std::path::PathBuf;
use std::time::Duration;

use crate::error::{NotifyError, NotifyResult};
use crate::logging::DEFAULT_FILTER;

/// Auto-dismiss delay for visible notifications
pub const DEFAULT_DISMISS_SECS: u64 = 30;

/// Reconnect policy handed to the websocket transport
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReconnectPolicy {
    /// First retry delay
    pub base_delay: Duration,
    /// Upper bound for the exponential delay
    pub max_delay: Duration,
    /// Give up after this many consecutive failures (0 = never)
    pub max_attempts: u32,
}

impl ReconnectPolicy {
    /// Delay before retry number `attempt` (0-based): `base * 2^attempt`, capped
    pub fn delay_for(&self, attempt: u32) -> Duration {
        let factor = 2u32.saturating_pow(attempt.min(16));
        self.base_delay.saturating_mul(factor).min(self.max_delay)
    }

    /// Whether another retry is allowed after `failures` consecutive failures
    pub fn allows(&self, failures: u32) -> bool {
        self.max_attempts == 0 || failures < self.max_attempts
    }
}

impl Default for ReconnectPolicy {
    fn default() -> Self {
        Self {
            base_delay: Duration::from_millis(500),
            max_delay: Duration::from_millis(10_000),
            max_attempts: 0,
        }
    }
}

/// Client configuration
#[derive(Debug, Clone)]
pub struct Config {
    /// Base URL of the socket server (`http(s)://` or `ws(s)://`)
    pub socket_url: String,
    /// Directory holding the `token` and `profile` blobs
    pub storage_dir: PathBuf,
    /// How long a notification stays up without user action
    pub dismiss_after: Duration,
    pub reconnect: ReconnectPolicy,
    /// Route the console starts on
    pub initial_route: String,
    /// Fallback tracing filter
    pub log_filter: String,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            socket_url: "http://localhost:5000".to_string(),
            storage_dir: PathBuf::from(".storage"),
            dismiss_after: Duration::from_secs(DEFAULT_DISMISS_SECS),
            reconnect: ReconnectPolicy::default(),
            initial_route: "/dashboard".to_string(),
            log_filter: DEFAULT_FILTER.to_string(),
        }
    }
}

impl Config {
    /// Load configuration from the process environment
    pub fn from_env() -> NotifyResult<Self> {
        Self::from_lookup(|key| env::var(key).ok())
    }

    /// Load configuration from an arbitrary key lookup
    pub fn from_lookup<F>(lookup: F) -> NotifyResult<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let mut config = Self::default();

        if let Some(url) = lookup("NOTIFY_SOCKET_URL") {
            config.socket_url = url;
        }
        if let Some(dir) = lookup("NOTIFY_STORAGE_DIR") {
            config.storage_dir = PathBuf::from(dir);
        }
        if let Some(secs) = lookup("NOTIFY_DISMISS_SECS") {
            config.dismiss_after = Duration::from_secs(parse_number("NOTIFY_DISMISS_SECS", &secs)?);
        }
        if let Some(ms) = lookup("NOTIFY_RECONNECT_BASE_MS") {
            config.reconnect.base_delay =
                Duration::from_millis(parse_number("NOTIFY_RECONNECT_BASE_MS", &ms)?);
        }
        if let Some(ms) = lookup("NOTIFY_RECONNECT_MAX_MS") {
            config.reconnect.max_delay =
                Duration::from_millis(parse_number("NOTIFY_RECONNECT_MAX_MS", &ms)?);
        }
        if let Some(n) = lookup("NOTIFY_RECONNECT_ATTEMPTS") {
            let attempts = parse_number("NOTIFY_RECONNECT_ATTEMPTS", &n)?;
            config.reconnect.max_attempts = u32::try_from(attempts).map_err(|_| {
                NotifyError::Config(format!("NOTIFY_RECONNECT_ATTEMPTS out of range: {}", n))
            })?;
        }
        if let Some(route) = lookup("NOTIFY_INITIAL_ROUTE") {
            config.initial_route = route;
        }
        if let Some(filter) = lookup("NOTIFY_LOG") {
            config.log_filter = filter;
        }

        if config.reconnect.max_delay < config.reconnect.base_delay {
            return Err(NotifyError::Config(
                "NOTIFY_RECONNECT_MAX_MS must not be below NOTIFY_RECONNECT_BASE_MS".to_string(),
            ));
        }

        Ok(config)
    }
}

fn parse_number(key: &str, value: &str) -> NotifyResult<u64> {
    value
        .trim()
        .parse::<u64>()
        .map_err(|_| NotifyError::Config(format!("{} must be a non-negative integer, got {:?}", key, value)))
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn lookup_from(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |key| map.get(key).cloned()
    }

    #[test]
    fn test_defaults() {
        let config = Config::from_lookup(|_| None).unwrap();
        assert_eq!(config.dismiss_after, Duration::from_secs(30));
        assert_eq!(config.socket_url, "http://localhost:5000");
        assert_eq!(config.reconnect.max_attempts, 0);
    }

    #[test]
    fn test_overrides() {
        let config = Config::from_lookup(lookup_from(&[
            ("NOTIFY_SOCKET_URL", "https://chat.example.com"),
            ("NOTIFY_DISMISS_SECS", "5"),
            ("NOTIFY_RECONNECT_BASE_MS", "100"),
            ("NOTIFY_RECONNECT_ATTEMPTS", "3"),
            ("NOTIFY_INITIAL_ROUTE", "/customers"),
        ]))
        .unwrap();

        assert_eq!(config.socket_url, "https://chat.example.com");
        assert_eq!(config.dismiss_after, Duration::from_secs(5));
        assert_eq!(config.reconnect.base_delay, Duration::from_millis(100));
        assert_eq!(config.reconnect.max_attempts, 3);
        assert_eq!(config.initial_route, "/customers");
    }

    #[test]
    fn test_invalid_number_rejected() {
        let result = Config::from_lookup(lookup_from(&[("NOTIFY_DISMISS_SECS", "soon")]));
        assert!(matches!(result, Err(NotifyError::Config(_))));
    }

    #[test]
    fn test_max_below_base_rejected() {
        let result = Config::from_lookup(lookup_from(&[
            ("NOTIFY_RECONNECT_BASE_MS", "2000"),
            ("NOTIFY_RECONNECT_MAX_MS", "1000"),
        ]));
        assert!(result.is_err());
    }

    #[test]
    fn test_backoff_doubles_and_caps() {
        let policy = ReconnectPolicy {
            base_delay: Duration::from_millis(500),
            max_delay: Duration::from_millis(3000),
            max_attempts: 0,
        };
        assert_eq!(policy.delay_for(0), Duration::from_millis(500));
        assert_eq!(policy.delay_for(1), Duration::from_millis(1000));
        assert_eq!(policy.delay_for(2), Duration::from_millis(2000));
        assert_eq!(policy.delay_for(3), Duration::from_millis(3000));
        assert_eq!(policy.delay_for(40), Duration::from_millis(3000));
    }

    #[test]
    fn test_attempt_limit() {
        let policy = ReconnectPolicy {
            max_attempts: 2,
            ..ReconnectPolicy::default()
        };
        assert!(policy.allows(1));
        assert!(!policy.allows(2));
        assert!(ReconnectPolicy::default().allows(1000));
    }
}
