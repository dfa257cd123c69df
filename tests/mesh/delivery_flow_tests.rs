//! Direct delivery and agent lifecycle across the in-memory mesh.

use std::sync::Arc;
use std::time::Duration;

use agentmesh::messaging::{
    adapters::memory::InMemoryPubSub,
    domain::{AlertLevel, BroadcastMessage, Channel, DeliveryStatus, MessagePriority, SystemAlert},
    services::{BroadcastHandler, BroadcastService, HandlerError, SendError, SendRequest},
};
use agentmesh::registry::domain::{AgentMetadata, AgentName, AgentStatus};
use agentmesh::runtime::AgentRuntime;
use async_trait::async_trait;
use rstest::rstest;
use serde_json::json;
use tokio::sync::mpsc;

use super::helpers::{Mesh, mesh};

#[rstest]
#[tokio::test(flavor = "multi_thread")]
async fn peer_to_peer_message_is_logged_as_delivered(#[future] mesh: Mesh) {
    let mesh = mesh.await;
    mesh.start_agent("doctor-agent", 8001).await;
    let nurse = mesh.start_agent("nurse-agent", 8002).await;

    let receipt = mesh
        .delivery_from("doctor-agent")
        .send(
            SendRequest::new("nurse-agent", "vitals_request", json!({"bed": 12}))
                .with_correlation_id("vitals-12")
                .with_priority(MessagePriority::Urgent),
        )
        .await
        .expect("message delivered");

    assert_eq!(receipt.message.status(), DeliveryStatus::Delivered);
    assert_eq!(receipt.message.priority(), MessagePriority::Urgent);
    let inbound = nurse.received();
    assert_eq!(inbound.len(), 1);
    assert_eq!(
        inbound.first().map(|request| request.correlation_id.as_str()),
        Some("vitals-12")
    );
}

#[rstest]
#[tokio::test(flavor = "multi_thread")]
async fn silent_agent_becomes_unavailable(#[future] mesh: Mesh) {
    let mesh = mesh.await;
    mesh.start_agent("doctor-agent", 8001).await;
    let nurse = mesh.start_agent("nurse-agent", 8002).await;

    mesh.clock.advance(Duration::from_secs(61));
    mesh.registry
        .heartbeat("doctor-agent")
        .await
        .expect("doctor heartbeats");
    let result = mesh
        .delivery_from("doctor-agent")
        .send(SendRequest::new("nurse-agent", "vitals_request", json!({})))
        .await;

    assert!(matches!(result, Err(SendError::AgentUnavailable { .. })));
    assert!(nurse.received().is_empty());

    mesh.registry
        .heartbeat("nurse-agent")
        .await
        .expect("nurse heartbeats");
    mesh.delivery_from("doctor-agent")
        .send(SendRequest::new("nurse-agent", "vitals_request", json!({})))
        .await
        .expect("nurse reachable again");
    assert_eq!(nurse.received().len(), 1);
}

struct Forward {
    sink: mpsc::UnboundedSender<BroadcastMessage>,
}

#[async_trait]
impl BroadcastHandler for Forward {
    async fn handle(&self, message: BroadcastMessage) -> Result<(), HandlerError> {
        self.sink.send(message)?;
        Ok(())
    }
}

#[rstest]
#[tokio::test(flavor = "multi_thread")]
async fn runtime_joins_and_leaves_the_mesh(#[future] mesh: Mesh) {
    let mesh = mesh.await;
    let pubsub = Arc::new(InMemoryPubSub::new());
    let name = AgentName::new("patient-agent").expect("valid agent name");
    let runtime = AgentRuntime::new(
        mesh.registry.clone(),
        Arc::new(BroadcastService::new(
            Arc::clone(&pubsub),
            Arc::new(mesh.clock.clone()),
            name.clone(),
        )),
        name,
        AgentMetadata::new().with_type("healthcare").with_port(8003),
    );
    let (sink, mut alerts) = mpsc::unbounded_channel();

    runtime
        .start(Arc::new(Forward { sink }))
        .await
        .expect("runtime starts");
    let coordinator = BroadcastService::new(
        Arc::clone(&pubsub),
        Arc::new(mesh.clock.clone()),
        AgentName::new("coordinator").expect("valid agent name"),
    );
    coordinator
        .send_system_alert(SystemAlert::new(AlertLevel::Critical, "EHR offline"))
        .await
        .expect("alert published");
    let alert = tokio::time::timeout(Duration::from_secs(1), alerts.recv())
        .await
        .expect("alert arrives in time")
        .expect("channel open");
    assert_eq!(alert.channel, Channel::System);
    assert_eq!(
        SystemAlert::from_broadcast(&alert).map(|decoded| decoded.alert_level),
        Some(AlertLevel::Critical)
    );

    runtime.shutdown().await.expect("runtime stops");

    let record = mesh.registry.get("patient-agent").await.expect("record kept");
    assert_eq!(record.status(), AgentStatus::Offline);
    let metrics = mesh.coordinator.metrics().await.expect("metrics readable");
    assert_eq!(metrics.agents.count(AgentStatus::Offline), 1);
}
