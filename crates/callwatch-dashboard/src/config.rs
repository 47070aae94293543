use std::path::{Path, PathBuf};

use serde::Deserialize;

use callwatch_poller::PollerConfig;

pub const CONFIG_FILE: &str = "callwatch.toml";

#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("relay_url `{0}` must start with http:// or https://")]
    RelayUrl(String),
    #[error("{0} must be > 0")]
    Zero(&'static str),
}

/// Dashboard configuration, loaded from `callwatch.toml`.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct DashboardConfig {
    pub relay_url: String,
    pub activity_limit: u32,
    pub activity_interval_ms: u64,
    pub session_interval_secs: u64,
    pub request_timeout_secs: u64,
    /// Log destination. Without one, logs are discarded so they never
    /// draw over the terminal UI.
    pub log_file: Option<PathBuf>,
}

impl Default for DashboardConfig {
    fn default() -> Self {
        let poller = PollerConfig::default();
        Self {
            relay_url: poller.base_url,
            activity_limit: poller.activity_limit,
            activity_interval_ms: poller.activity_interval_ms,
            session_interval_secs: poller.session_interval_secs,
            request_timeout_secs: poller.request_timeout_secs,
            log_file: None,
        }
    }
}

impl DashboardConfig {
    pub fn validate(&self) -> Result<(), ConfigError> {
        if !(self.relay_url.starts_with("http://") || self.relay_url.starts_with("https://")) {
            return Err(ConfigError::RelayUrl(self.relay_url.clone()));
        }
        let counts = [
            ("activity_limit", u64::from(self.activity_limit)),
            ("activity_interval_ms", self.activity_interval_ms),
            ("session_interval_secs", self.session_interval_secs),
            ("request_timeout_secs", self.request_timeout_secs),
        ];
        if let Some((name, _)) = counts.iter().find(|(_, value)| *value == 0) {
            return Err(ConfigError::Zero(*name));
        }
        Ok(())
    }

    /// Load config from `callwatch.toml` if it exists, then apply env var overrides.
    pub fn load() -> Self {
        let mut config = Self::from_file(Path::new(CONFIG_FILE));
        config.apply_overrides(|key| std::env::var(key).ok());
        config
    }

    fn from_file(path: &Path) -> Self {
        // Runs before logging is set up; read or parse failures yield defaults
        std::fs::read_to_string(path)
            .ok()
            .and_then(|content| toml::from_str::<DashboardConfig>(&content).ok())
            .unwrap_or_default()
    }

    pub fn apply_overrides(&mut self, lookup: impl Fn(&str) -> Option<String>) {
        let var = |name: &str| lookup(name).filter(|v| !v.is_empty());
        if let Some(url) = var("CALLWATCH_RELAY_URL") {
            self.relay_url = url;
        }
        if let Some(val) = var("CALLWATCH_ACTIVITY_INTERVAL_MS")
            && let Ok(ms) = val.parse::<u64>()
        {
            self.activity_interval_ms = ms;
        }
        if let Some(path) = var("CALLWATCH_LOG_FILE") {
            self.log_file = Some(PathBuf::from(path));
        }
    }

    pub fn poller_config(&self) -> PollerConfig {
        PollerConfig {
            base_url: self.relay_url.clone(),
            activity_limit: self.activity_limit,
            activity_interval_ms: self.activity_interval_ms,
            session_interval_secs: self.session_interval_secs,
            request_timeout_secs: self.request_timeout_secs,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_match_poller() {
        let cfg = DashboardConfig::default();
        assert_eq!(cfg.relay_url, "http://localhost:3000");
        assert_eq!(cfg.activity_limit, 50);
        assert_eq!(cfg.activity_interval_ms, 2000);
        assert_eq!(cfg.session_interval_secs, 10);
        assert!(cfg.log_file.is_none());
        assert!(cfg.validate().is_ok());
    }

    #[test]
    fn parse_partial_toml() {
        let cfg: DashboardConfig = toml::from_str(
            r#"
relay_url = "http://relay.internal:3000"
activity_interval_ms = 500
log_file = "/tmp/callwatch.log"
"#,
        )
        .unwrap();
        assert_eq!(cfg.relay_url, "http://relay.internal:3000");
        assert_eq!(cfg.activity_interval_ms, 500);
        assert_eq!(cfg.session_interval_secs, 10);
        assert_eq!(cfg.log_file, Some(PathBuf::from("/tmp/callwatch.log")));
    }

    #[test]
    fn env_overrides() {
        let mut cfg = DashboardConfig::default();
        cfg.apply_overrides(|key: &str| match key {
            "CALLWATCH_RELAY_URL" => Some("https://relay:8443".to_string()),
            "CALLWATCH_ACTIVITY_INTERVAL_MS" => Some("not-a-number".to_string()),
            _ => None,
        });
        assert_eq!(cfg.relay_url, "https://relay:8443");
        assert_eq!(cfg.activity_interval_ms, 2000);
    }

    #[test]
    fn rejects_zero_interval_and_bad_url() {
        let zero = DashboardConfig {
            activity_interval_ms: 0,
            ..DashboardConfig::default()
        };
        assert!(matches!(
            zero.validate(),
            Err(ConfigError::Zero("activity_interval_ms"))
        ));

        let bad = DashboardConfig {
            relay_url: "localhost:3000".into(),
            ..DashboardConfig::default()
        };
        assert!(matches!(bad.validate(), Err(ConfigError::RelayUrl(_))));
    }

    #[test]
    fn poller_config_carries_settings() {
        let cfg = DashboardConfig {
            activity_limit: 20,
            ..DashboardConfig::default()
        };
        let poller = cfg.poller_config();
        assert_eq!(poller.activity_limit, 20);
        assert_eq!(poller.base_url, cfg.relay_url);
    }
}
