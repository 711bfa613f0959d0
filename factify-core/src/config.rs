use serde::{Deserialize, Serialize};
use std::time::Duration;

pub const DEFAULT_API_URL: &str = "http://localhost:8080/api";
pub const DEFAULT_POLL_INTERVAL_MS: u64 = 2_000;
pub const DEFAULT_MAX_POLL_ATTEMPTS: u32 = 30;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ClientConfig {
    #[serde(default = "default_base_url")]
    pub base_url: String,
    #[serde(default = "default_poll_interval_ms")]
    pub poll_interval_ms: u64,
    #[serde(default = "default_max_attempts")]
    pub max_attempts: u32,
    #[serde(default = "default_connect_timeout_secs")]
    pub connect_timeout_secs: u64,
    #[serde(default = "default_request_timeout_secs")]
    pub request_timeout_secs: u64,
    #[serde(default = "default_true")]
    pub history_enabled: bool,
    #[serde(default = "default_history_max_entries")]
    pub history_max_entries: usize,
}

fn default_base_url() -> String {
    DEFAULT_API_URL.to_string()
}
fn default_poll_interval_ms() -> u64 {
    DEFAULT_POLL_INTERVAL_MS
}
fn default_max_attempts() -> u32 {
    DEFAULT_MAX_POLL_ATTEMPTS
}
fn default_connect_timeout_secs() -> u64 {
    10
}
fn default_request_timeout_secs() -> u64 {
    30
}
fn default_true() -> bool {
    true
}
fn default_history_max_entries() -> usize {
    200
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            base_url: default_base_url(),
            poll_interval_ms: default_poll_interval_ms(),
            max_attempts: default_max_attempts(),
            connect_timeout_secs: default_connect_timeout_secs(),
            request_timeout_secs: default_request_timeout_secs(),
            history_enabled: default_true(),
            history_max_entries: default_history_max_entries(),
        }
    }
}

impl ClientConfig {
    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = base_url.into();
        self
    }

    pub fn poll_policy(&self) -> PollPolicy {
        PollPolicy {
            interval: Duration::from_millis(self.poll_interval_ms),
            max_attempts: self.max_attempts.max(1),
        }
    }

    pub fn connect_timeout(&self) -> Duration {
        Duration::from_secs(self.connect_timeout_secs)
    }

    pub fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.request_timeout_secs)
    }
}

/// Fixed-interval, bounded polling. No backoff.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PollPolicy {
    pub interval: Duration,
    pub max_attempts: u32,
}

impl Default for PollPolicy {
    fn default() -> Self {
        Self {
            interval: Duration::from_millis(DEFAULT_POLL_INTERVAL_MS),
            max_attempts: DEFAULT_MAX_POLL_ATTEMPTS,
        }
    }
}

impl PollPolicy {
    /// Worst-case wall clock spent polling one job.
    pub fn ceiling(&self) -> Duration {
        self.interval * self.max_attempts
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn missing_fields_fall_back_to_defaults() {
        let cfg: ClientConfig =
            serde_json::from_str(r#"{"base_url":"https://factify.example/api"}"#).unwrap();
        assert_eq!(cfg.base_url, "https://factify.example/api");
        assert_eq!(cfg.poll_interval_ms, 2_000);
        assert_eq!(cfg.max_attempts, 30);
        assert!(cfg.history_enabled);
    }

    #[test]
    fn default_policy_ceiling_is_one_minute() {
        assert_eq!(PollPolicy::default().ceiling(), Duration::from_secs(60));
    }

    #[test]
    fn zero_attempts_is_clamped() {
        let cfg = ClientConfig {
            max_attempts: 0,
            ..Default::default()
        };
        assert_eq!(cfg.poll_policy().max_attempts, 1);
    }
}
