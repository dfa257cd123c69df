//! HTTP liveness probe backed by `reqwest`.

use crate::registry::ports::{HealthProbe, ProbeOutcome};
use async_trait::async_trait;
use reqwest::Client;
use std::time::{Duration, Instant};
use tracing::debug;

/// Probes `GET {health_check_url}`; any 2xx response is healthy.
#[derive(Debug, Clone, Default)]
pub struct HttpHealthProbe {
    client: Client,
}

impl HttpHealthProbe {
    /// Creates a probe with a default `reqwest` client.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates a probe sharing an existing client's connection pool.
    #[must_use]
    pub const fn with_client(client: Client) -> Self {
        Self { client }
    }
}

#[async_trait]
impl HealthProbe for HttpHealthProbe {
    async fn probe(&self, url: &str, timeout: Duration) -> ProbeOutcome {
        debug!(%url, "health probe");
        let started = Instant::now();

        let response = match self.client.get(url).timeout(timeout).send().await {
            Ok(response) => response,
            Err(err) => {
                debug!(%url, error = %err, "health probe failed");
                return ProbeOutcome::unhealthy(started.elapsed(), err.to_string());
            }
        };

        let status = response.status();
        if !status.is_success() {
            debug!(%url, %status, "health probe returned non-success status");
            return ProbeOutcome::unhealthy(started.elapsed(), format!("HTTP {status}"));
        }

        let details = response.json::<serde_json::Value>().await.ok();
        ProbeOutcome::Healthy {
            elapsed: started.elapsed(),
            details,
        }
    }
}
