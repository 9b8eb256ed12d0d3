//! Heartbeat client: turns lifecycle states into GET requests.

use std::fmt;
use std::sync::Arc;

use reqwest::Url;
use tracing::debug;

use crate::config::MonitorConfig;
use crate::error::{PulseError, Result};

use super::state::{encode_query, LifecycleState, PingRequest};
use super::transport::{HttpTransport, Transport};

/// Reports one job's lifecycle to the monitoring service.
///
/// Holds only immutable configuration, so a single client can be cloned
/// into concurrent tasks freely.
#[derive(Clone)]
pub struct HeartbeatClient {
    job_key: String,
    base_url: String,
    transport: Arc<dyn Transport>,
}

impl HeartbeatClient {
    /// Client for `job_key` against the default service, using HTTP.
    pub fn new(job_key: impl Into<String>) -> Result<Self> {
        Self::from_config(job_key, &MonitorConfig::default())
    }

    /// Client for `job_key` using the base URL, timeout and user agent from
    /// `config`.
    pub fn from_config(job_key: impl Into<String>, config: &MonitorConfig) -> Result<Self> {
        let transport = HttpTransport::new(config)?;
        Self::with_transport(job_key, &config.base_url, Arc::new(transport))
    }

    /// Client sending through an arbitrary transport.
    pub fn with_transport(
        job_key: impl Into<String>,
        base_url: &str,
        transport: Arc<dyn Transport>,
    ) -> Result<Self> {
        let job_key = job_key.into();
        // URL parsing collapses dot segments, which would drop the key.
        if matches!(job_key.as_str(), "" | "." | "..") {
            return Err(PulseError::InvalidUrl(format!(
                "job key '{}' cannot be used as a path segment",
                job_key
            )));
        }

        let base_url = base_url.trim().trim_end_matches('/').to_string();
        Url::parse(&base_url)
            .map_err(|e| PulseError::InvalidUrl(format!("base URL '{}': {}", base_url, e)))?;

        Ok(Self {
            job_key,
            base_url,
            transport,
        })
    }

    pub fn job_key(&self) -> &str {
        &self.job_key
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    /// Send a ping for a textual state (`run`, `complete` or `failed`).
    ///
    /// Unknown states fail with [`PulseError::InvalidState`] before anything
    /// touches the network. `message` only matters for `failed`.
    pub async fn ping(&self, state: &str, message: Option<&str>) -> Result<String> {
        let state: LifecycleState = state.parse()?;
        self.ping_state(state, message).await
    }

    /// Send a ping for an already-parsed state.
    pub async fn ping_state(&self, state: LifecycleState, message: Option<&str>) -> Result<String> {
        debug!(job_key = %self.job_key, state = %state, "Ping");
        let request = PingRequest::new(state, message);
        self.send_request(&request.path(&self.job_key), &request.query())
            .await
    }

    pub async fn run(&self) -> Result<String> {
        self.ping_state(LifecycleState::Run, None).await
    }

    pub async fn complete(&self) -> Result<String> {
        self.ping_state(LifecycleState::Complete, None).await
    }

    /// Report failure. An empty message is sent as `failed=true`.
    pub async fn failed(&self, message: &str) -> Result<String> {
        self.ping_state(LifecycleState::Failed, Some(message)).await
    }

    /// GET `path` under the base URL with `query` appended in order.
    pub async fn send_request(&self, path: &str, query: &[(String, String)]) -> Result<String> {
        let url = self.endpoint_url(path, query)?;
        self.transport.get(&url).await
    }

    fn endpoint_url(&self, path: &str, query: &[(String, String)]) -> Result<Url> {
        let mut raw = format!("{}{}", self.base_url, path);
        let query = encode_query(query);
        if !query.is_empty() {
            raw.push('?');
            raw.push_str(&query);
        }
        Url::parse(&raw).map_err(|e| PulseError::InvalidUrl(format!("'{}': {}", raw, e)))
    }
}

impl fmt::Debug for HeartbeatClient {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("HeartbeatClient")
            .field("job_key", &self.job_key)
            .field("base_url", &self.base_url)
            .finish_non_exhaustive()
    }
}
