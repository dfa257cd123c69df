//! Background heartbeat emission.

use super::registry::ServiceRegistry;
use crate::registry::{domain::AgentName, ports::AgentRegistryRepository};
use mockable::Clock;
use std::time::Duration;
use tokio::task::JoinHandle;
use tokio::time::{Instant, MissedTickBehavior};
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

/// Spawns a task that refreshes `name`'s heartbeat every `interval`.
///
/// The first beat fires one interval after spawning. Failed beats are logged
/// and retried on the next tick. The task exits when `token` is cancelled.
pub fn spawn_heartbeat<R, C>(
    registry: ServiceRegistry<R, C>,
    name: AgentName,
    interval: Duration,
    token: CancellationToken,
) -> JoinHandle<()>
where
    R: AgentRegistryRepository + 'static,
    C: Clock + Send + Sync + 'static,
{
    tokio::spawn(async move {
        let mut ticker = tokio::time::interval_at(Instant::now() + interval, interval);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
        info!(agent = %name, ?interval, "heartbeat loop started");

        loop {
            tokio::select! {
                () = token.cancelled() => break,
                _ = ticker.tick() => {
                    match registry.heartbeat(name.as_str()).await {
                        Ok(_) => debug!(agent = %name, "heartbeat sent"),
                        Err(err) => warn!(agent = %name, error = %err, "heartbeat failed"),
                    }
                }
            }
        }

        info!(agent = %name, "heartbeat loop stopped");
    })
}
