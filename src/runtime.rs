//! Lifecycle of the local agent within the mesh.
//!
//! [`AgentRuntime`] performs the startup sequence (registration, heartbeat
//! loop, system and orchestration subscriptions) and undoes it on shutdown,
//! leaving the agent's record `offline`.

use crate::messaging::{
    domain::Channel,
    ports::PubSubTransport,
    services::{BroadcastError, BroadcastHandler, BroadcastService},
};
use crate::registry::{
    domain::{AgentMetadata, AgentName, AgentRecord},
    ports::AgentRegistryRepository,
    services::{ServiceRegistry, ServiceRegistryError, spawn_heartbeat},
};
use mockable::Clock;
use std::sync::{Arc, Mutex, PoisonError};
use std::time::Duration;
use thiserror::Error;
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;
use tracing::{error, info};

/// Default interval between heartbeats of the local agent.
pub const DEFAULT_HEARTBEAT_INTERVAL: Duration = Duration::from_secs(30);

/// Channels every agent listens on.
pub const LIFECYCLE_CHANNELS: [Channel; 2] = [Channel::System, Channel::Orchestration];

/// Errors returned by [`AgentRuntime`].
#[derive(Debug, Clone, Error)]
pub enum RuntimeError {
    /// [`AgentRuntime::start`] was called while running.
    #[error("agent {0} is already started")]
    AlreadyStarted(AgentName),

    /// [`AgentRuntime::start`] was called after shutdown.
    #[error("agent {0} has been shut down")]
    ShutDown(AgentName),

    /// Registration or deregistration failed.
    #[error(transparent)]
    Registry(#[from] ServiceRegistryError),

    /// A channel subscription could not be opened.
    #[error(transparent)]
    Broadcast(#[from] BroadcastError),
}

/// Progress of [`AgentRuntime::start`], guarded by one lock so concurrent
/// starts cannot both proceed.
enum HeartbeatSlot {
    Idle,
    Starting,
    Running(JoinHandle<()>),
}

/// Runs the local agent's registry and broadcast lifecycle.
pub struct AgentRuntime<R, P, C>
where
    R: AgentRegistryRepository + 'static,
    P: PubSubTransport + 'static,
    C: Clock + Send + Sync + 'static,
{
    registry: ServiceRegistry<R, C>,
    broadcast: Arc<BroadcastService<P, C>>,
    name: AgentName,
    metadata: AgentMetadata,
    heartbeat_interval: Duration,
    token: CancellationToken,
    heartbeat: Mutex<HeartbeatSlot>,
}

impl<R, P, C> AgentRuntime<R, P, C>
where
    R: AgentRegistryRepository + 'static,
    P: PubSubTransport + 'static,
    C: Clock + Send + Sync + 'static,
{
    /// Creates a runtime that announces `name` with `metadata`.
    #[must_use]
    pub fn new(
        registry: ServiceRegistry<R, C>,
        broadcast: Arc<BroadcastService<P, C>>,
        name: AgentName,
        metadata: AgentMetadata,
    ) -> Self {
        Self {
            registry,
            broadcast,
            name,
            metadata,
            heartbeat_interval: DEFAULT_HEARTBEAT_INTERVAL,
            token: CancellationToken::new(),
            heartbeat: Mutex::new(HeartbeatSlot::Idle),
        }
    }

    /// Overrides the heartbeat interval.
    #[must_use]
    pub const fn with_heartbeat_interval(mut self, interval: Duration) -> Self {
        self.heartbeat_interval = interval;
        self
    }

    /// Returns the local agent's name.
    #[must_use]
    pub const fn name(&self) -> &AgentName {
        &self.name
    }

    /// Returns the broadcast service used for subscriptions.
    #[must_use]
    pub fn broadcast(&self) -> &BroadcastService<P, C> {
        &self.broadcast
    }

    /// Returns whether the heartbeat loop is running.
    #[must_use]
    pub fn is_running(&self) -> bool {
        matches!(
            *self.heartbeat.lock().unwrap_or_else(PoisonError::into_inner),
            HeartbeatSlot::Running(_)
        )
    }

    /// Registers the agent, starts heartbeating and subscribes `handler` to
    /// the lifecycle channels.
    ///
    /// # Errors
    ///
    /// Returns [`RuntimeError::AlreadyStarted`] or [`RuntimeError::ShutDown`]
    /// when called out of order, and registry or broadcast failures
    /// otherwise. A failed subscription leaves the agent registered and
    /// heartbeating; call [`Self::shutdown`] to undo it.
    pub async fn start(
        &self,
        handler: Arc<dyn BroadcastHandler>,
    ) -> Result<AgentRecord, RuntimeError> {
        self.reserve()?;

        let record = match self
            .registry
            .register(self.name.as_str(), self.metadata.clone())
            .await
        {
            Ok(record) => record,
            Err(err) => {
                self.release();
                return Err(err.into());
            }
        };

        let handle = spawn_heartbeat(
            self.registry.clone(),
            self.name.clone(),
            self.heartbeat_interval,
            self.token.child_token(),
        );
        {
            let mut slot = self.heartbeat.lock().unwrap_or_else(PoisonError::into_inner);
            if !matches!(*slot, HeartbeatSlot::Starting) {
                handle.abort();
                return Err(RuntimeError::ShutDown(self.name.clone()));
            }
            *slot = HeartbeatSlot::Running(handle);
        }

        for channel in LIFECYCLE_CHANNELS {
            self.broadcast
                .subscribe(channel, Arc::clone(&handler))
                .await?;
        }

        info!(agent = %self.name, agent_type = %record.agent_type(), "agent started");
        Ok(record)
    }

    /// Stops the heartbeat, ends every subscription and marks the agent
    /// `offline`.
    ///
    /// # Errors
    ///
    /// Returns [`RuntimeError::Registry`] when the final status update
    /// fails; the background loops are stopped regardless.
    pub async fn shutdown(&self) -> Result<AgentRecord, RuntimeError> {
        let slot = {
            let mut guard = self.heartbeat.lock().unwrap_or_else(PoisonError::into_inner);
            self.token.cancel();
            std::mem::replace(&mut *guard, HeartbeatSlot::Idle)
        };
        if let HeartbeatSlot::Running(running) = slot {
            let joined = running.await;
            if let Err(err) = joined {
                error!(agent = %self.name, error = %err, "heartbeat loop ended abnormally");
            }
        }
        self.broadcast.shutdown().await;

        let record = self.registry.deregister(self.name.as_str()).await?;
        info!(agent = %self.name, "agent shut down");
        Ok(record)
    }

    /// Claims the start slot, rejecting a second or post-shutdown start.
    fn reserve(&self) -> Result<(), RuntimeError> {
        let mut slot = self.heartbeat.lock().unwrap_or_else(PoisonError::into_inner);
        if self.token.is_cancelled() {
            return Err(RuntimeError::ShutDown(self.name.clone()));
        }
        if !matches!(*slot, HeartbeatSlot::Idle) {
            return Err(RuntimeError::AlreadyStarted(self.name.clone()));
        }
        *slot = HeartbeatSlot::Starting;
        Ok(())
    }

    fn release(&self) {
        let mut slot = self.heartbeat.lock().unwrap_or_else(PoisonError::into_inner);
        if matches!(*slot, HeartbeatSlot::Starting) {
            *slot = HeartbeatSlot::Idle;
        }
    }
}
