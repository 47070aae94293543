use std::time::Duration;

/// Default number of activities requested per poll.
pub const DEFAULT_ACTIVITY_LIMIT: u32 = 50;

/// Configuration shared by the activity and session pollers.
#[derive(Debug, Clone)]
pub struct PollerConfig {
    /// Base URL of the relay, e.g. `http://localhost:3000`.
    pub base_url: String,
    /// Maximum activities per request.
    pub activity_limit: u32,
    /// Activity polling interval in milliseconds.
    pub activity_interval_ms: u64,
    /// Session polling interval in seconds.
    pub session_interval_secs: u64,
    /// Per-request timeout in seconds.
    pub request_timeout_secs: u64,
}

impl PollerConfig {
    pub fn activity_interval(&self) -> Duration {
        Duration::from_millis(self.activity_interval_ms)
    }

    pub fn session_interval(&self) -> Duration {
        Duration::from_secs(self.session_interval_secs)
    }

    pub fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.request_timeout_secs)
    }
}

impl Default for PollerConfig {
    fn default() -> Self {
        Self {
            base_url: "http://localhost:3000".to_string(),
            activity_limit: DEFAULT_ACTIVITY_LIMIT,
            activity_interval_ms: 2000,
            session_interval_secs: 10,
            request_timeout_secs: 10,
        }
    }
}
