//! Scripted liveness probe for tests and in-process meshes.

use crate::registry::ports::{HealthProbe, ProbeOutcome};
use async_trait::async_trait;
use std::collections::{HashMap, HashSet};
use std::sync::{Arc, RwLock};
use std::time::Duration;

/// Liveness probe that answers from an in-memory table of URLs.
///
/// URLs marked healthy answer with an empty JSON object; every other URL is
/// reported unreachable. Each probe is counted so tests can assert on cache
/// behaviour.
#[derive(Debug, Clone, Default)]
pub struct InMemoryHealthProbe {
    state: Arc<RwLock<ProbeState>>,
}

#[derive(Debug, Default)]
struct ProbeState {
    healthy: HashSet<String>,
    calls: HashMap<String, usize>,
}

impl InMemoryHealthProbe {
    /// Creates a probe that reports every URL unreachable.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Marks `url` healthy or unreachable.
    pub fn set_healthy(&self, url: impl Into<String>, healthy: bool) {
        let key = url.into();
        let mut state = self
            .state
            .write()
            .unwrap_or_else(std::sync::PoisonError::into_inner);
        if healthy {
            state.healthy.insert(key);
        } else {
            state.healthy.remove(&key);
        }
    }

    /// Returns how many times `url` has been probed.
    #[must_use]
    pub fn probe_count(&self, url: &str) -> usize {
        let state = self
            .state
            .read()
            .unwrap_or_else(std::sync::PoisonError::into_inner);
        state.calls.get(url).copied().unwrap_or(0)
    }
}

#[async_trait]
impl HealthProbe for InMemoryHealthProbe {
    async fn probe(&self, url: &str, _timeout: Duration) -> ProbeOutcome {
        let mut state = self
            .state
            .write()
            .unwrap_or_else(std::sync::PoisonError::into_inner);
        *state.calls.entry(url.to_owned()).or_default() += 1;

        if state.healthy.contains(url) {
            ProbeOutcome::Healthy {
                elapsed: Duration::ZERO,
                details: Some(serde_json::json!({})),
            }
        } else {
            ProbeOutcome::unhealthy(Duration::ZERO, format!("connection refused: {url}"))
        }
    }
}
