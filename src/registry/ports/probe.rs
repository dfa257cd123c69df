//! Liveness probe port.

use async_trait::async_trait;
use std::time::Duration;

/// Result of probing an agent's liveness endpoint.
///
/// Probe failures are expected steady-state noise, so they are modelled as a
/// value rather than an error.
#[derive(Debug, Clone, PartialEq)]
pub enum ProbeOutcome {
    /// A 2xx response arrived within the timeout.
    Healthy {
        /// Round-trip time.
        elapsed: Duration,
        /// Decoded response body, when it was JSON.
        details: Option<serde_json::Value>,
    },
    /// Non-2xx response, timeout, or connection failure.
    Unhealthy {
        /// Time spent before giving up.
        elapsed: Duration,
        /// Human-readable cause.
        reason: String,
    },
}

impl ProbeOutcome {
    /// Creates an unhealthy outcome.
    #[must_use]
    pub fn unhealthy(elapsed: Duration, reason: impl Into<String>) -> Self {
        Self::Unhealthy {
            elapsed,
            reason: reason.into(),
        }
    }

    /// Returns whether the probe succeeded.
    #[must_use]
    pub const fn is_healthy(&self) -> bool {
        matches!(self, Self::Healthy { .. })
    }

    /// Returns the time the probe took.
    #[must_use]
    pub const fn elapsed(&self) -> Duration {
        match self {
            Self::Healthy { elapsed, .. } | Self::Unhealthy { elapsed, .. } => *elapsed,
        }
    }
}

/// Issues a bounded-time liveness request against a URL.
#[async_trait]
pub trait HealthProbe: Send + Sync {
    /// Probes `url`, giving up after `timeout`.
    async fn probe(&self, url: &str, timeout: Duration) -> ProbeOutcome;
}
