//! Best-effort publish/subscribe over named channels.

use super::inbox::HandlerError;
use crate::messaging::{
    domain::{AgentCategory, BroadcastMessage, Channel, SYSTEM_ALERT_MESSAGE_TYPE, SystemAlert},
    ports::{PubSubError, PubSubTransport},
};
use crate::registry::domain::AgentName;
use async_trait::async_trait;
use mockable::Clock;
use serde_json::Value;
use std::collections::HashMap;
use std::sync::{Arc, Mutex, PoisonError};
use thiserror::Error;
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;
use tracing::{debug, error, info, warn};
use uuid::Uuid;

/// Receives messages from a channel subscription.
#[async_trait]
pub trait BroadcastHandler: Send + Sync {
    /// Handles one message. Errors are logged and do not end the
    /// subscription.
    async fn handle(&self, message: BroadcastMessage) -> Result<(), HandlerError>;
}

/// Errors returned by [`BroadcastService`].
#[derive(Debug, Clone, Error)]
pub enum BroadcastError {
    /// The message could not be serialised.
    #[error("failed to encode broadcast message: {0}")]
    Encode(Arc<serde_json::Error>),
    /// The transport rejected the operation.
    #[error(transparent)]
    Transport(#[from] PubSubError),
    /// [`BroadcastService::shutdown`] already ran; no new subscriptions
    /// are accepted.
    #[error("broadcast service for {0} has been shut down")]
    ShutDown(AgentName),
}

struct Subscription {
    token: CancellationToken,
    listener: JoinHandle<()>,
}

/// Publishes and consumes broadcast messages for one agent.
///
/// Publishing stamps the timestamp and this service's publisher id. Each
/// subscription runs its own listen loop; every handler invocation runs in
/// its own task so an error or panic in one message never stops the loop.
pub struct BroadcastService<P, C>
where
    P: PubSubTransport,
    C: Clock + Send + Sync,
{
    transport: Arc<P>,
    clock: Arc<C>,
    agent_name: AgentName,
    publisher_id: Uuid,
    shutdown: CancellationToken,
    subscriptions: Arc<Mutex<HashMap<Channel, Subscription>>>,
}

impl<P, C> BroadcastService<P, C>
where
    P: PubSubTransport,
    C: Clock + Send + Sync,
{
    /// Creates a service publishing as `agent_name`.
    #[must_use]
    pub fn new(transport: Arc<P>, clock: Arc<C>, agent_name: AgentName) -> Self {
        Self {
            transport,
            clock,
            agent_name,
            publisher_id: Uuid::new_v4(),
            shutdown: CancellationToken::new(),
            subscriptions: Arc::new(Mutex::new(HashMap::new())),
        }
    }

    /// Returns the identity stamped on published messages.
    #[must_use]
    pub const fn publisher_id(&self) -> Uuid {
        self.publisher_id
    }

    /// Publishes on `channel`, returning the number of connected
    /// subscribers. Zero subscribers is not an error.
    ///
    /// # Errors
    ///
    /// Returns [`BroadcastError`] when encoding or the transport fails.
    pub async fn publish(
        &self,
        channel: Channel,
        message_type: impl Into<String>,
        payload: Value,
    ) -> Result<usize, BroadcastError> {
        let message = BroadcastMessage {
            channel,
            from_agent: self.agent_name.clone(),
            message_type: message_type.into(),
            payload,
            timestamp: self.clock.utc(),
            publisher_id: self.publisher_id,
        };
        let body =
            serde_json::to_vec(&message).map_err(|err| BroadcastError::Encode(Arc::new(err)))?;
        let receivers = self.transport.publish(channel.name(), body).await?;
        debug!(
            %channel,
            message_type = %message.message_type,
            receivers,
            "broadcast published"
        );
        Ok(receivers)
    }

    /// Publishes on the channel of an agent category.
    ///
    /// # Errors
    ///
    /// Returns [`BroadcastError`] when encoding or the transport fails.
    pub async fn broadcast_to_category(
        &self,
        category: AgentCategory,
        message_type: impl Into<String>,
        payload: Value,
    ) -> Result<usize, BroadcastError> {
        self.publish(Channel::Category(category), message_type, payload)
            .await
    }

    /// Publishes a mesh-wide alert on [`Channel::System`].
    ///
    /// # Errors
    ///
    /// Returns [`BroadcastError`] when encoding or the transport fails.
    pub async fn send_system_alert(&self, alert: SystemAlert) -> Result<usize, BroadcastError> {
        let level = alert.alert_level;
        let payload =
            serde_json::to_value(&alert).map_err(|err| BroadcastError::Encode(Arc::new(err)))?;
        let receivers = self
            .publish(
                Channel::System,
                SYSTEM_ALERT_MESSAGE_TYPE,
                payload,
            )
            .await?;
        info!(%level, message = %alert.message, "system alert sent");
        Ok(receivers)
    }

    /// Invokes `handler` for every later message on `channel` until
    /// [`Self::unsubscribe`] or [`Self::shutdown`]. An existing subscription
    /// on the channel is replaced.
    ///
    /// # Errors
    ///
    /// Returns [`BroadcastError::ShutDown`] after [`Self::shutdown`], or
    /// [`BroadcastError::Transport`] when the subscription cannot be opened.
    pub async fn subscribe(
        &self,
        channel: Channel,
        handler: Arc<dyn BroadcastHandler>,
    ) -> Result<(), BroadcastError> {
        if self.shutdown.is_cancelled() {
            return Err(BroadcastError::ShutDown(self.agent_name.clone()));
        }
        let mut receiver = self.transport.subscribe(channel.name()).await?;
        let token = self.shutdown.child_token();
        let loop_token = token.clone();

        let listener = tokio::spawn(async move {
            info!(%channel, "subscribed");
            loop {
                let body = tokio::select! {
                    () = loop_token.cancelled() => break,
                    next = receiver.recv() => match next {
                        Some(body) => body,
                        None => break,
                    },
                };
                dispatch(channel, &body, &handler).await;
            }
            info!(%channel, "listen loop stopped");
        });

        let subscription = Subscription { token, listener };
        let previous = {
            let mut subscriptions = self
                .subscriptions
                .lock()
                .unwrap_or_else(PoisonError::into_inner);
            if self.shutdown.is_cancelled() {
                Err(subscription)
            } else {
                Ok(subscriptions.insert(channel, subscription))
            }
        };
        match previous {
            Ok(Some(replaced)) => stop(channel, replaced).await,
            Ok(None) => {}
            Err(orphaned) => {
                stop(channel, orphaned).await;
                return Err(BroadcastError::ShutDown(self.agent_name.clone()));
            }
        }
        Ok(())
    }

    /// Ends the subscription on `channel`, returning whether one existed.
    pub async fn unsubscribe(&self, channel: Channel) -> bool {
        let removed = self
            .subscriptions
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .remove(&channel);
        let Some(subscription) = removed else {
            return false;
        };
        stop(channel, subscription).await;
        true
    }

    /// Returns the channels with an active subscription.
    #[must_use]
    pub fn subscribed_channels(&self) -> Vec<Channel> {
        self.subscriptions
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .keys()
            .copied()
            .collect()
    }

    /// Ends every subscription and waits for the listen loops to exit.
    /// Later calls to [`Self::subscribe`] are rejected.
    pub async fn shutdown(&self) {
        let drained: Vec<(Channel, Subscription)> = {
            let mut subscriptions = self
                .subscriptions
                .lock()
                .unwrap_or_else(PoisonError::into_inner);
            self.shutdown.cancel();
            subscriptions.drain().collect()
        };
        for (channel, subscription) in drained {
            stop(channel, subscription).await;
        }
    }
}

async fn dispatch(channel: Channel, body: &[u8], handler: &Arc<dyn BroadcastHandler>) {
    let message: BroadcastMessage = match serde_json::from_slice(body) {
        Ok(message) => message,
        Err(err) => {
            warn!(%channel, error = %err, "discarding undecodable broadcast");
            return;
        }
    };
    let message_type = message.message_type.clone();
    let invocation = Arc::clone(handler);
    match tokio::spawn(async move { invocation.handle(message).await }).await {
        Ok(Ok(())) => {}
        Ok(Err(err)) => {
            warn!(%channel, %message_type, error = %err, "broadcast handler failed");
        }
        Err(join_err) => {
            error!(%channel, %message_type, error = %join_err, "broadcast handler panicked");
        }
    }
}

async fn stop(channel: Channel, subscription: Subscription) {
    subscription.token.cancel();
    if let Err(err) = subscription.listener.await {
        error!(%channel, error = %err, "listen loop ended abnormally");
    }
}
