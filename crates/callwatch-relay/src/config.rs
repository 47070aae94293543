use std::net::SocketAddr;
use std::path::Path;

use serde::Deserialize;

/// Default config file, looked up in the working directory.
pub const CONFIG_FILE: &str = "callwatch-relay.toml";

#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("listen_addr `{0}` is not a valid socket address")]
    ListenAddr(String),
    #[error("backend_url `{0}` is not an http(s) URL")]
    BackendUrl(String),
    #[error("{0} must be > 0")]
    Zero(&'static str),
}

/// Relay configuration, loaded from `callwatch-relay.toml`.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct RelayConfig {
    pub listen_addr: String,
    /// Base URL of the call automation backend.
    pub backend_url: String,
    /// Sent as `x-api-key`. Required for the sessions endpoint.
    pub backend_api_key: Option<String>,
    /// `limit` used when a request does not specify one.
    pub default_limit: u32,
    pub request_timeout_secs: u64,
}

impl Default for RelayConfig {
    fn default() -> Self {
        Self {
            listen_addr: "0.0.0.0:3000".to_string(),
            backend_url: "http://localhost:3001".to_string(),
            backend_api_key: None,
            default_limit: 50,
            request_timeout_secs: 10,
        }
    }
}

impl RelayConfig {
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.listen_addr.parse::<SocketAddr>().is_err() {
            return Err(ConfigError::ListenAddr(self.listen_addr.clone()));
        }
        match reqwest::Url::parse(&self.backend_url) {
            Ok(url) if matches!(url.scheme(), "http" | "https") => {},
            _ => return Err(ConfigError::BackendUrl(self.backend_url.clone())),
        }
        if self.default_limit == 0 {
            return Err(ConfigError::Zero("default_limit"));
        }
        if self.request_timeout_secs == 0 {
            return Err(ConfigError::Zero("request_timeout_secs"));
        }
        if self.backend_api_key.is_none() {
            tracing::warn!("backend_api_key is not configured; session requests will fail");
        }
        Ok(())
    }

    /// Load config from `callwatch-relay.toml` if it exists, then apply env var overrides.
    pub fn load() -> Self {
        let mut config = Self::from_file(Path::new(CONFIG_FILE));
        config.apply_overrides(|key| std::env::var(key).ok());
        config
    }

    fn from_file(path: &Path) -> Self {
        match std::fs::read_to_string(path) {
            Ok(content) => match toml::from_str::<RelayConfig>(&content) {
                Ok(cfg) => {
                    tracing::info!(path = %path.display(), "Loaded configuration");
                    cfg
                },
                Err(e) => {
                    tracing::warn!("Failed to parse {}: {e}, using defaults", path.display());
                    RelayConfig::default()
                },
            },
            Err(_) => {
                tracing::info!("No {} found, using defaults", path.display());
                RelayConfig::default()
            },
        }
    }

    /// Apply overrides from `lookup`. Prefixed names win over the bare ones.
    pub fn apply_overrides(&mut self, lookup: impl Fn(&str) -> Option<String>) {
        let var = |names: &[&str]| {
            names
                .iter()
                .find_map(|name| lookup(*name).filter(|v| !v.is_empty()))
        };
        if let Some(addr) = var(&["CALLWATCH_LISTEN_ADDR"]) {
            self.listen_addr = addr;
        }
        if let Some(url) = var(&["CALLWATCH_BACKEND_URL", "BACKEND_URL"]) {
            self.backend_url = url;
        }
        if let Some(key) = var(&["CALLWATCH_BACKEND_API_KEY", "BACKEND_API_KEY"]) {
            self.backend_api_key = Some(key);
        }
        if let Some(val) = var(&["CALLWATCH_DEFAULT_LIMIT"])
            && let Ok(n) = val.parse::<u32>()
        {
            self.default_limit = n;
        }
    }

    /// Backend URL without a trailing slash.
    pub fn backend_base(&self) -> &str {
        self.backend_url.trim_end_matches('/')
    }
}
