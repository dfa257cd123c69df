//! Registry and health views exposed through the coordinator.

use std::time::Duration;

use agentmesh::registry::{
    domain::{AgentMetadata, AgentStatus, HealthState},
    services::ServiceRegistryError,
};
use rstest::rstest;
use serde_json::json;

use super::helpers::{Mesh, mesh};

#[rstest]
#[tokio::test(flavor = "multi_thread")]
async fn directory_reports_each_agents_health(#[future] mesh: Mesh) {
    let mesh = mesh.await;
    mesh.start_agent("doctor-agent", 8001).await;
    mesh.start_agent("nurse-agent", 8002).await;
    mesh.probe
        .set_healthy("http://localhost:8002/health", false);

    let directory = mesh.coordinator.directory().await.expect("directory readable");

    let verdicts: Vec<(&str, bool)> = directory
        .iter()
        .map(|entry| (entry.record.name().as_str(), entry.healthy))
        .collect();
    assert_eq!(
        verdicts,
        vec![
            ("coordinator", true),
            ("doctor-agent", true),
            ("nurse-agent", false)
        ]
    );
}

#[rstest]
#[tokio::test(flavor = "multi_thread")]
async fn metrics_count_stale_and_offline_agents(#[future] mesh: Mesh) {
    let mesh = mesh.await;
    mesh.start_agent("doctor-agent", 8001).await;
    mesh.start_agent("nurse-agent", 8002).await;
    mesh.registry
        .deregister("nurse-agent")
        .await
        .expect("nurse deregisters");

    mesh.clock.advance(Duration::from_secs(90));
    mesh.registry
        .heartbeat("coordinator")
        .await
        .expect("coordinator heartbeats");
    let metrics = mesh.coordinator.metrics().await.expect("metrics readable");

    assert_eq!(metrics.agents.total, 3);
    assert_eq!(metrics.agents.count(AgentStatus::Online), 2);
    assert_eq!(metrics.agents.count(AgentStatus::Offline), 1);
    assert_eq!(metrics.agents.stale_online, 1);
}

#[rstest]
#[tokio::test(flavor = "multi_thread")]
async fn reregistration_merges_metadata(#[future] mesh: Mesh) {
    let mesh = mesh.await;
    mesh.registry
        .register(
            "business-agent",
            AgentMetadata::new()
                .with_type("business")
                .with_port(8004)
                .with_attribute("region", json!("riyadh")),
        )
        .await
        .expect("first registration");
    mesh.registry
        .deregister("business-agent")
        .await
        .expect("agent shuts down");

    let record = mesh
        .registry
        .register("business-agent", AgentMetadata::new().with_version("2.1.0"))
        .await
        .expect("re-registration");

    assert_eq!(record.status(), AgentStatus::Online);
    assert_eq!(record.version(), "2.1.0");
    assert_eq!(record.port(), Some(8004));
    assert_eq!(record.agent_type(), "business");
    assert_eq!(record.attributes().get("region"), Some(&json!("riyadh")));
}

#[rstest]
#[tokio::test(flavor = "multi_thread")]
async fn manual_check_reports_probe_outcome(#[future] mesh: Mesh) {
    let mesh = mesh.await;
    mesh.start_agent("doctor-agent", 8001).await;
    mesh.registry
        .register("content-agent", AgentMetadata::new().with_type("content"))
        .await
        .expect("registration without address");

    let doctor = mesh.monitor.check("doctor-agent").await.expect("doctor known");
    let content = mesh.monitor.check("content-agent").await.expect("content known");
    let missing = mesh.monitor.check("ghost-agent").await;

    assert_eq!(doctor.state(), HealthState::Healthy);
    assert_eq!(content.state(), HealthState::Unknown);
    assert!(matches!(missing, Err(ServiceRegistryError::NotFound(_))));
}
