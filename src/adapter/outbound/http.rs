//! HTTP transport for deployment hosts.
//!
//! Hosts expose a status endpoint at `{address}/api/status`; a 2xx answer
//! counts as reachable, and the round-trip time is reported as latency.

use std::time::{Duration, Instant};

use async_trait::async_trait;
use reqwest::Client as HttpClient;
use tracing::{debug, warn};

use crate::domain::host::HostSpec;
use crate::error::Result;
use crate::port::outbound::host::HostTransport;

const STATUS_PATH: &str = "/api/status";

/// [`HostTransport`] over plain HTTP.
pub struct HttpHostTransport {
    http: HttpClient,
}

impl HttpHostTransport {
    /// Build a transport whose requests time out after `timeout`.
    #[must_use]
    pub fn new(timeout: Duration) -> Self {
        let http = HttpClient::builder()
            .timeout(timeout)
            .connect_timeout(timeout)
            .build()
            .unwrap_or_else(|err| {
                warn!(error = %err, "Failed to build HTTP client, using defaults");
                HttpClient::new()
            });
        Self { http }
    }

    async fn status(&self, host: &HostSpec) -> Result<Duration> {
        let url = status_url(&host.address);
        let started = Instant::now();
        self.http.get(&url).send().await?.error_for_status()?;
        let latency = started.elapsed();
        debug!(host_id = %host.id, url = %url, latency_ms = latency.as_millis() as u64, "Status ok");
        Ok(latency)
    }
}

fn status_url(address: &str) -> String {
    format!("{}{STATUS_PATH}", address.trim_end_matches('/'))
}

#[async_trait]
impl HostTransport for HttpHostTransport {
    async fn connect(&self, host: &HostSpec) -> Result<Duration> {
        self.status(host).await
    }

    async fn ping(&self, host: &HostSpec) -> Result<Duration> {
        self.status(host).await
    }

    async fn disconnect(&self, host: &HostSpec) -> Result<()> {
        // Sessions are stateless; nothing to tear down remotely.
        debug!(host_id = %host.id, "Released HTTP host");
        Ok(())
    }

    fn name(&self) -> &'static str {
        "http"
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::Error;

    #[test]
    fn test_status_url_strips_trailing_slash() {
        assert_eq!(status_url("http://vps-1:8080/"), "http://vps-1:8080/api/status");
        assert_eq!(status_url("http://vps-1:8080"), "http://vps-1:8080/api/status");
    }

    #[tokio::test]
    async fn test_unreachable_host_is_an_http_error() {
        let transport = HttpHostTransport::new(Duration::from_millis(200));
        let host = HostSpec::new("nowhere", "http://127.0.0.1:1", 1);

        let err = transport.ping(&host).await.unwrap_err();

        assert!(matches!(err, Error::Http(_)));
        assert_eq!(transport.name(), "http");
    }
}
