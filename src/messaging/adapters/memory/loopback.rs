//! In-process point-to-point transport.

use crate::messaging::ports::{
    PeerEndpoint, PeerRequest, PeerResponse, PeerTransport, TransportError,
};
use async_trait::async_trait;
use std::collections::HashMap;
use std::sync::{Arc, PoisonError, RwLock};
use std::time::Duration;

/// Routes requests to [`PeerEndpoint`]s bound to endpoint URLs.
///
/// Unbound endpoints behave like a refused connection, which lets tests
/// exercise delivery failures without a network.
#[derive(Clone, Default)]
pub struct LoopbackTransport {
    endpoints: Arc<RwLock<HashMap<String, Arc<dyn PeerEndpoint>>>>,
}

impl LoopbackTransport {
    /// Creates a transport with no bound endpoints.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Binds `receiver` to `endpoint`, replacing any previous binding.
    pub fn bind(&self, endpoint: impl Into<String>, receiver: Arc<dyn PeerEndpoint>) {
        let key = endpoint.into().trim_end_matches('/').to_owned();
        self.endpoints
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .insert(key, receiver);
    }

    /// Removes the binding for `endpoint`.
    pub fn unbind(&self, endpoint: &str) {
        self.endpoints
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .remove(endpoint.trim_end_matches('/'));
    }

    fn resolve(&self, endpoint: &str) -> Option<Arc<dyn PeerEndpoint>> {
        self.endpoints
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .get(endpoint.trim_end_matches('/'))
            .cloned()
    }
}

impl std::fmt::Debug for LoopbackTransport {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let bound: Vec<String> = self
            .endpoints
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .keys()
            .cloned()
            .collect();
        f.debug_struct("LoopbackTransport")
            .field("endpoints", &bound)
            .finish()
    }
}

#[async_trait]
impl PeerTransport for LoopbackTransport {
    async fn deliver(
        &self,
        endpoint: &str,
        request: &PeerRequest,
        timeout: Duration,
    ) -> Result<PeerResponse, TransportError> {
        let receiver = self
            .resolve(endpoint)
            .ok_or_else(|| TransportError::Connection(format!("no peer bound at {endpoint}")))?;
        tokio::time::timeout(timeout, receiver.receive(request.clone()))
            .await
            .map_err(|_| TransportError::Timeout(timeout))?
    }
}
