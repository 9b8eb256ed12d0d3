//! HTTP transport for lifecycle pings.
//!
//! [`Transport`] is the only seam between the client and the network: it
//! issues one GET and yields the body. [`HttpTransport`] is the reqwest-backed
//! implementation; tests substitute their own.

use std::fmt;
use std::time::Duration;

use async_trait::async_trait;
use futures::StreamExt;
use reqwest::{Client, Url};
use tracing::{debug, error, info, warn};

use crate::config::MonitorConfig;
use crate::error::Result;

/// Sends a GET request and returns the full response body.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait Transport: Send + Sync {
    /// Issue a single GET to `url`.
    ///
    /// Any HTTP status is a successful exchange; only failures to obtain or
    /// drain a response are errors.
    async fn get(&self, url: &Url) -> Result<String>;
}

/// Reqwest-backed [`Transport`].
#[derive(Clone)]
pub struct HttpTransport {
    client: Client,
}

impl HttpTransport {
    /// Build a transport honouring the timeout and user agent in `config`.
    pub fn new(config: &MonitorConfig) -> Result<Self> {
        let mut builder = Client::builder().user_agent(config.user_agent.clone());
        if let Some(secs) = config.timeout_secs {
            builder = builder.timeout(Duration::from_secs(secs));
        }
        Ok(Self {
            client: builder.build()?,
        })
    }

    /// Wrap an existing reqwest client.
    pub fn with_client(client: Client) -> Self {
        Self { client }
    }
}

impl fmt::Debug for HttpTransport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("HttpTransport").finish_non_exhaustive()
    }
}

#[async_trait]
impl Transport for HttpTransport {
    async fn get(&self, url: &Url) -> Result<String> {
        info!("Sending request to: {}", url);

        let response = self.client.get(url.clone()).send().await.map_err(|e| {
            error!("Request to {} failed: {}", url, e);
            e
        })?;

        let status = response.status();
        if status.is_success() {
            info!(status = status.as_u16(), "Ping accepted");
        } else {
            warn!(status = status.as_u16(), "Ping returned non-success status");
        }

        // Chunks are appended in arrival order; a mid-stream reset surfaces
        // as a transport error.
        let mut body = Vec::new();
        let mut stream = response.bytes_stream();
        while let Some(chunk) = stream.next().await {
            let chunk = chunk.map_err(|e| {
                error!("Reading response from {} failed: {}", url, e);
                e
            })?;
            body.extend_from_slice(&chunk);
        }

        let body = String::from_utf8_lossy(&body).into_owned();
        debug!("Response body: {}", body);
        Ok(body)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::PulseError;
    use wiremock::matchers::{header, method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    #[tokio::test]
    async fn test_returns_body_text() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/api/run/job"))
            .respond_with(ResponseTemplate::new(200).set_body_string("OK"))
            .expect(1)
            .mount(&server)
            .await;

        let transport = HttpTransport::new(&MonitorConfig::default()).unwrap();
        let url = Url::parse(&format!("{}/api/run/job", server.uri())).unwrap();
        assert_eq!(transport.get(&url).await.unwrap(), "OK");
    }

    #[tokio::test]
    async fn test_with_client_uses_given_client() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(header("user-agent", "custom-client"))
            .respond_with(ResponseTemplate::new(200).set_body_string("custom"))
            .expect(1)
            .mount(&server)
            .await;

        let client = Client::builder().user_agent("custom-client").build().unwrap();
        let transport = HttpTransport::with_client(client);
        let url = Url::parse(&server.uri()).unwrap();
        assert_eq!(transport.get(&url).await.unwrap(), "custom");
    }

    #[tokio::test]
    async fn test_non_success_status_still_returns_body() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .respond_with(ResponseTemplate::new(404).set_body_string("unknown job"))
            .mount(&server)
            .await;

        let transport = HttpTransport::new(&MonitorConfig::default()).unwrap();
        let url = Url::parse(&format!("{}/api/run/missing", server.uri())).unwrap();
        assert_eq!(transport.get(&url).await.unwrap(), "unknown job");
    }

    #[tokio::test]
    async fn test_sends_configured_user_agent() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(header("user-agent", "pulse-test/1"))
            .respond_with(ResponseTemplate::new(200).set_body_string("ua ok"))
            .expect(1)
            .mount(&server)
            .await;

        let config = MonitorConfig {
            user_agent: "pulse-test/1".to_string(),
            ..MonitorConfig::default()
        };
        let transport = HttpTransport::new(&config).unwrap();
        let url = Url::parse(&server.uri()).unwrap();
        assert_eq!(transport.get(&url).await.unwrap(), "ua ok");
    }

    #[tokio::test]
    async fn test_connection_refused_is_transport_error() {
        let listener = std::net::TcpListener::bind("127.0.0.1:0").unwrap();
        let addr = listener.local_addr().unwrap();
        drop(listener);

        let transport = HttpTransport::new(&MonitorConfig::default()).unwrap();
        let url = Url::parse(&format!("http://{}/api/run/job", addr)).unwrap();
        let err = transport.get(&url).await.unwrap_err();
        assert!(matches!(err, PulseError::Transport(_)));
    }

    #[tokio::test]
    async fn test_timeout_is_transport_error() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .respond_with(
                ResponseTemplate::new(200)
                    .set_body_string("late")
                    .set_delay(Duration::from_secs(3)),
            )
            .mount(&server)
            .await;

        let config = MonitorConfig {
            timeout_secs: Some(1),
            ..MonitorConfig::default()
        };
        let transport = HttpTransport::new(&config).unwrap();
        let url = Url::parse(&server.uri()).unwrap();
        let err = transport.get(&url).await.unwrap_err();
        assert!(matches!(err, PulseError::Transport(ref e) if e.is_timeout()));
    }
}
