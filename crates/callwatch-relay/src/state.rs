use std::sync::Arc;
use std::time::Duration;

use reqwest::header::{CACHE_CONTROL, HeaderMap, HeaderValue};
use serde_json::Value;

use crate::config::RelayConfig;
use crate::error::UpstreamError;

/// Header carrying the backend credential.
pub const API_KEY_HEADER: &str = "x-api-key";

#[derive(Clone)]
pub struct AppState {
    pub backend: Backend,
    pub config: Arc<RelayConfig>,
}

impl AppState {
    pub fn new(config: RelayConfig) -> Result<Self, reqwest::Error> {
        let backend = Backend::new(&config)?;
        Ok(Self {
            backend,
            config: Arc::new(config),
        })
    }
}

/// Uncached HTTP access to the call automation backend.
#[derive(Clone)]
pub struct Backend {
    http: reqwest::Client,
    base_url: String,
    api_key: Option<String>,
}

impl Backend {
    fn new(config: &RelayConfig) -> Result<Self, reqwest::Error> {
        let mut headers = HeaderMap::new();
        headers.insert(CACHE_CONTROL, HeaderValue::from_static("no-cache"));
        let http = reqwest::Client::builder()
            .default_headers(headers)
            .timeout(Duration::from_secs(config.request_timeout_secs))
            .build()?;
        Ok(Self {
            http,
            base_url: config.backend_base().to_string(),
            api_key: config.backend_api_key.clone().filter(|k| !k.is_empty()),
        })
    }

    pub fn has_credential(&self) -> bool {
        self.api_key.is_some()
    }

    /// GET `{backend}{path}` and return the JSON body unchanged.
    ///
    /// The credential header is attached whenever one is configured; with
    /// `require_key` a missing credential fails before any request is made.
    pub async fn get_json(
        &self,
        path: &str,
        query: &[(&str, String)],
        require_key: bool,
    ) -> Result<Value, UpstreamError> {
        if require_key && self.api_key.is_none() {
            return Err(UpstreamError::MissingCredential);
        }
        let mut req = self.http.get(format!("{}{path}", self.base_url)).query(query);
        if let Some(key) = &self.api_key {
            req = req.header(API_KEY_HEADER, key);
        }
        let resp = req.send().await?;
        let status = resp.status();
        if !status.is_success() {
            return Err(UpstreamError::Status(status));
        }
        let body = resp.bytes().await?;
        serde_json::from_slice(&body).map_err(|e| UpstreamError::Decode(e.to_string()))
    }
}
