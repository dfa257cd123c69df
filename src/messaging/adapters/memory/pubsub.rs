//! In-process pub/sub transport over `tokio::sync::broadcast`.

use crate::messaging::ports::{ChannelReceiver, PubSubError, PubSubResult, PubSubTransport};
use async_trait::async_trait;
use std::collections::HashMap;
use std::sync::{Arc, RwLock};
use tokio::sync::broadcast;
use tracing::warn;

/// Default per-channel buffer before slow subscribers start lagging.
pub const DEFAULT_CHANNEL_CAPACITY: usize = 256;

/// Fan-out transport with one broadcast queue per channel name.
///
/// Subscribers that fall more than the channel capacity behind skip the
/// overflowed messages, matching the at-most-once contract of broadcast.
#[derive(Debug, Clone)]
pub struct InMemoryPubSub {
    state: Arc<RwLock<PubSubState>>,
    capacity: usize,
}

#[derive(Debug, Default)]
struct PubSubState {
    channels: HashMap<String, broadcast::Sender<Vec<u8>>>,
    closed: bool,
}

impl Default for InMemoryPubSub {
    fn default() -> Self {
        Self::with_capacity(DEFAULT_CHANNEL_CAPACITY)
    }
}

impl InMemoryPubSub {
    /// Creates a transport with the default channel capacity.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates a transport buffering up to `capacity` messages per channel.
    #[must_use]
    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            state: Arc::new(RwLock::new(PubSubState::default())),
            capacity: capacity.max(1),
        }
    }

    /// Closes every channel; open subscriptions drain and then end.
    ///
    /// # Errors
    ///
    /// Returns [`PubSubError::Transport`] when lock acquisition fails.
    pub fn close(&self) -> PubSubResult<()> {
        let mut state = self
            .state
            .write()
            .map_err(|err| PubSubError::transport(std::io::Error::other(err.to_string())))?;
        state.closed = true;
        state.channels.clear();
        Ok(())
    }
}

#[async_trait]
impl PubSubTransport for InMemoryPubSub {
    async fn publish(&self, channel: &str, body: Vec<u8>) -> PubSubResult<usize> {
        let state = self
            .state
            .read()
            .map_err(|err| PubSubError::transport(std::io::Error::other(err.to_string())))?;
        if state.closed {
            return Err(PubSubError::Closed);
        }
        let delivered = state
            .channels
            .get(channel)
            .map_or(0, |sender| sender.send(body).unwrap_or(0));
        Ok(delivered)
    }

    async fn subscribe(&self, channel: &str) -> PubSubResult<Box<dyn ChannelReceiver>> {
        let mut state = self
            .state
            .write()
            .map_err(|err| PubSubError::transport(std::io::Error::other(err.to_string())))?;
        if state.closed {
            return Err(PubSubError::Closed);
        }
        let capacity = self.capacity;
        let receiver = state
            .channels
            .entry(channel.to_owned())
            .or_insert_with(|| broadcast::channel(capacity).0)
            .subscribe();
        Ok(Box::new(BroadcastReceiver {
            channel: channel.to_owned(),
            receiver,
        }))
    }
}

struct BroadcastReceiver {
    channel: String,
    receiver: broadcast::Receiver<Vec<u8>>,
}

#[async_trait]
impl ChannelReceiver for BroadcastReceiver {
    async fn recv(&mut self) -> Option<Vec<u8>> {
        loop {
            match self.receiver.recv().await {
                Ok(body) => return Some(body),
                Err(broadcast::error::RecvError::Lagged(skipped)) => {
                    warn!(channel = %self.channel, skipped, "subscriber lagged; messages dropped");
                }
                Err(broadcast::error::RecvError::Closed) => return None,
            }
        }
    }
}
