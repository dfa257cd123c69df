//! Liveness verdicts and manual health reports.

use super::AgentName;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::time::Duration;

/// Cached liveness result for one agent.
///
/// Owned by the health monitor; expired verdicts are recomputed on the next
/// query.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HealthVerdict {
    agent_name: AgentName,
    healthy: bool,
    observed_at: DateTime<Utc>,
    ttl: Duration,
}

impl HealthVerdict {
    /// Creates a verdict observed at `observed_at`.
    #[must_use]
    pub const fn new(
        agent_name: AgentName,
        healthy: bool,
        observed_at: DateTime<Utc>,
        ttl: Duration,
    ) -> Self {
        Self {
            agent_name,
            healthy,
            observed_at,
            ttl,
        }
    }

    /// Returns whether the verdict is older than its TTL at `now`.
    ///
    /// A verdict observed in the future relative to `now` is treated as fresh.
    #[must_use]
    pub fn is_expired(&self, now: DateTime<Utc>) -> bool {
        now.signed_duration_since(self.observed_at)
            .to_std()
            .is_ok_and(|age| age >= self.ttl)
    }

    /// Returns the agent the verdict applies to.
    #[must_use]
    pub const fn agent_name(&self) -> &AgentName {
        &self.agent_name
    }

    /// Returns whether the probe succeeded.
    #[must_use]
    pub const fn healthy(&self) -> bool {
        self.healthy
    }

    /// Returns when the probe completed.
    #[must_use]
    pub const fn observed_at(&self) -> DateTime<Utc> {
        self.observed_at
    }

    /// Returns how long the verdict is trusted.
    #[must_use]
    pub const fn ttl(&self) -> Duration {
        self.ttl
    }
}

/// Outcome classification of a manual health check.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum HealthState {
    /// The probe returned a 2xx response in time.
    Healthy,
    /// The probe failed, timed out, or returned a non-2xx response.
    Unhealthy,
    /// No liveness endpoint is known for the agent.
    Unknown,
}

impl HealthState {
    /// Returns the canonical string representation.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Healthy => "healthy",
            Self::Unhealthy => "unhealthy",
            Self::Unknown => "unknown",
        }
    }
}

impl fmt::Display for HealthState {
    fn fmt(&self, formatter: &mut fmt::Formatter<'_>) -> fmt::Result {
        formatter.write_str(self.as_str())
    }
}

/// Result of an explicit, uncached health check.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HealthReport {
    agent_name: AgentName,
    state: HealthState,
    checked_at: DateTime<Utc>,
    response_time_ms: Option<u64>,
    details: Option<serde_json::Value>,
    error: Option<String>,
}

impl HealthReport {
    /// Creates a report with no timing or details.
    #[must_use]
    pub const fn new(agent_name: AgentName, state: HealthState, checked_at: DateTime<Utc>) -> Self {
        Self {
            agent_name,
            state,
            checked_at,
            response_time_ms: None,
            details: None,
            error: None,
        }
    }

    /// Records the probe round-trip time.
    #[must_use]
    pub fn with_response_time(mut self, elapsed: Duration) -> Self {
        self.response_time_ms = Some(u64::try_from(elapsed.as_millis()).unwrap_or(u64::MAX));
        self
    }

    /// Attaches the body returned by the agent's health endpoint.
    #[must_use]
    pub fn with_details(mut self, details: serde_json::Value) -> Self {
        self.details = Some(details);
        self
    }

    /// Attaches a failure description.
    #[must_use]
    pub fn with_error(mut self, error: impl Into<String>) -> Self {
        let normalized = error.into().trim().to_owned();
        if !normalized.is_empty() {
            self.error = Some(normalized);
        }
        self
    }

    /// Returns the checked agent.
    #[must_use]
    pub const fn agent_name(&self) -> &AgentName {
        &self.agent_name
    }

    /// Returns the outcome classification.
    #[must_use]
    pub const fn state(&self) -> HealthState {
        self.state
    }

    /// Returns whether the outcome is [`HealthState::Healthy`].
    #[must_use]
    pub fn is_healthy(&self) -> bool {
        self.state == HealthState::Healthy
    }

    /// Returns when the check completed.
    #[must_use]
    pub const fn checked_at(&self) -> DateTime<Utc> {
        self.checked_at
    }

    /// Returns the probe round-trip time in milliseconds, if a probe ran.
    #[must_use]
    pub const fn response_time_ms(&self) -> Option<u64> {
        self.response_time_ms
    }

    /// Returns the health endpoint body, if one was decoded.
    #[must_use]
    pub const fn details(&self) -> Option<&serde_json::Value> {
        self.details.as_ref()
    }

    /// Returns the failure description, if any.
    #[must_use]
    pub fn error(&self) -> Option<&str> {
        self.error.as_deref()
    }
}
