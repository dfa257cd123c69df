//! HTTP point-to-point transport backed by `reqwest`.

use crate::messaging::ports::{PeerRequest, PeerResponse, PeerTransport, TransportError};
use async_trait::async_trait;
use reqwest::Client;
use std::time::Duration;
use tracing::debug;

/// Path of the peer message endpoint, relative to an agent's base URL.
const RECEIVE_PATH: &str = "/messages/receive";

/// Longest error body kept in [`TransportError::Status`].
const MAX_ERROR_BODY_CHARS: usize = 512;

/// Sends `POST {endpoint}/messages/receive` with a JSON [`PeerRequest`].
#[derive(Debug, Clone, Default)]
pub struct HttpPeerTransport {
    client: Client,
}

impl HttpPeerTransport {
    /// Creates a transport with a default `reqwest` client.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates a transport sharing an existing client's connection pool.
    #[must_use]
    pub const fn with_client(client: Client) -> Self {
        Self { client }
    }
}

#[async_trait]
impl PeerTransport for HttpPeerTransport {
    async fn deliver(
        &self,
        endpoint: &str,
        request: &PeerRequest,
        timeout: Duration,
    ) -> Result<PeerResponse, TransportError> {
        let url = format!("{}{RECEIVE_PATH}", endpoint.trim_end_matches('/'));
        debug!(%url, message_type = %request.message_type, "sending peer request");

        let response = self
            .client
            .post(&url)
            .timeout(timeout)
            .json(request)
            .send()
            .await
            .map_err(|err| classify(&err, timeout))?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(TransportError::Status {
                code: status.as_u16(),
                body: body.chars().take(MAX_ERROR_BODY_CHARS).collect(),
            });
        }

        response
            .json::<PeerResponse>()
            .await
            .map_err(|err| match classify(&err, timeout) {
                TransportError::Connection(_) => TransportError::Decode(err.to_string()),
                other => other,
            })
    }
}

fn classify(err: &reqwest::Error, timeout: Duration) -> TransportError {
    if err.is_timeout() {
        TransportError::Timeout(timeout)
    } else if err.is_decode() {
        TransportError::Decode(err.to_string())
    } else {
        TransportError::Connection(err.to_string())
    }
}
