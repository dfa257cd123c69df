//! End-to-end workflow routing, hand-off and callbacks over the in-memory mesh.

use agentmesh::messaging::{domain::DeliveryStatus, services::SendRequest};
use agentmesh::workflow::domain::{CallerIdentity, StepStatus, WorkflowStatus};
use rstest::rstest;
use serde_json::{Value, json};

use super::helpers::{COORDINATOR, Mesh, mesh};

fn patient() -> CallerIdentity {
    CallerIdentity::new("user-42", "patient")
}

#[rstest]
#[tokio::test(flavor = "multi_thread")]
async fn clinical_request_is_handed_to_doctor(#[future] mesh: Mesh) {
    let mesh = mesh.await;
    let doctor = mesh.start_agent("doctor-agent", 8001).await;

    let instance = mesh
        .coordinator
        .route_and_execute(
            "I need a prescription from my doctor",
            json!({"priority": "high", "ward": "3B"}),
            patient(),
        )
        .await
        .expect("workflow starts");

    assert_eq!(instance.status(), WorkflowStatus::Executing);
    assert_eq!(instance.plan().primary_agent().as_str(), "doctor-agent");
    let received = doctor.received();
    assert_eq!(received.len(), 1);
    let request = received.first().expect("one request");
    assert_eq!(request.from_agent.as_str(), COORDINATOR);
    assert_eq!(request.message_type, "workflow_request");
    assert_eq!(request.correlation_id.as_str(), instance.id().to_string());
    assert_eq!(
        request.payload.get("workflow_id").and_then(Value::as_str),
        Some(instance.id().to_string().as_str())
    );
    assert_eq!(
        request.payload.get("user_id").and_then(Value::as_str),
        Some("user-42")
    );
    assert_eq!(
        request.payload.pointer("/context/ward"),
        Some(&json!("3B"))
    );
}

#[rstest]
#[tokio::test(flavor = "multi_thread")]
async fn agent_completion_closes_the_workflow(#[future] mesh: Mesh) {
    let mesh = mesh.await;
    mesh.start_agent("doctor-agent", 8001).await;
    let instance = mesh
        .coordinator
        .route_and_execute("doctor consultation", Value::Null, patient())
        .await
        .expect("workflow starts");
    let id = instance.id();
    let doctor_outbox = mesh.delivery_from("doctor-agent");

    let callback = SendRequest::new(
        COORDINATOR,
        "workflow_complete",
        json!({"workflow_id": id.to_string()}),
    )
    .with_correlation_id(format!("complete-{id}"));
    let receipt = doctor_outbox
        .send(callback.clone())
        .await
        .expect("callback delivered");
    assert_eq!(receipt.response.response, json!({"status": "acknowledged"}));
    doctor_outbox
        .send(callback)
        .await
        .expect("duplicate callback replayed");

    let finished = mesh
        .coordinator
        .engine()
        .get_status(id)
        .await
        .expect("workflow known");
    assert_eq!(finished.status(), WorkflowStatus::Completed);
    assert!(finished.completed_at().is_some());
    assert!(
        finished
            .steps()
            .iter()
            .all(|step| step.status() == StepStatus::Done)
    );
    let metrics = mesh.coordinator.metrics().await.expect("metrics readable");
    assert_eq!(metrics.active_workflows, 0);
}

#[rstest]
#[tokio::test(flavor = "multi_thread")]
async fn late_error_after_completion_is_ignored(#[future] mesh: Mesh) {
    let mesh = mesh.await;
    mesh.start_agent("payment-agent", 8005).await;
    let id = mesh
        .coordinator
        .route_and_execute("please send the invoice", Value::Null, patient())
        .await
        .expect("workflow starts")
        .id();
    let outbox = mesh.delivery_from("payment-agent");

    outbox
        .send(SendRequest::new(
            COORDINATOR,
            "workflow_complete",
            json!({"workflow_id": id.to_string()}),
        ))
        .await
        .expect("completion delivered");
    outbox
        .send(SendRequest::new(
            COORDINATOR,
            "workflow_error",
            json!({"workflow_id": id.to_string(), "error": "card declined"}),
        ))
        .await
        .expect("late error still acknowledged");

    let instance = mesh
        .coordinator
        .engine()
        .get_status(id)
        .await
        .expect("workflow known");
    assert_eq!(instance.status(), WorkflowStatus::Completed);
    assert!(instance.error().is_none());
}

#[rstest]
#[tokio::test(flavor = "multi_thread")]
async fn unhealthy_primary_fails_the_workflow(#[future] mesh: Mesh) {
    let mesh = mesh.await;
    let nurse = mesh.start_agent("nurse-agent", 8002).await;
    mesh.probe
        .set_healthy("http://localhost:8002/health", false);

    let instance = mesh
        .coordinator
        .route_and_execute("nurse shift checklist", Value::Null, patient())
        .await
        .expect("store accepts the workflow");

    assert_eq!(instance.status(), WorkflowStatus::Error);
    assert!(instance.error().is_some());
    assert!(nurse.received().is_empty());
    let history = mesh
        .coordinator_delivery_history(&instance.id().to_string())
        .await;
    assert_eq!(history, vec![DeliveryStatus::Failed]);
}

#[rstest]
#[tokio::test(flavor = "multi_thread")]
async fn unregistered_primary_fails_the_workflow(#[future] mesh: Mesh) {
    let mesh = mesh.await;

    let instance = mesh
        .coordinator
        .route_and_execute("market analysis for a startup", Value::Null, patient())
        .await
        .expect("store accepts the workflow");

    assert_eq!(instance.plan().primary_agent().as_str(), "business-agent");
    assert_eq!(instance.status(), WorkflowStatus::Error);
    assert!(
        instance
            .error()
            .is_some_and(|error| error.contains("not registered"))
    );
}

#[rstest]
#[tokio::test(flavor = "multi_thread")]
async fn unmatched_request_falls_back_to_chat(#[future] mesh: Mesh) {
    let mesh = mesh.await;
    let chat = mesh.start_agent("chat-agent", 8006).await;

    let instance = mesh
        .coordinator
        .route_and_execute("what's the weather like", Value::Null, patient())
        .await
        .expect("workflow starts");

    assert!(instance.plan().is_fallback());
    assert_eq!(instance.plan().primary_agent().as_str(), "chat-agent");
    assert_eq!(instance.plan().estimated_minutes(), 5);
    assert_eq!(chat.received().len(), 1);
}

#[rstest]
#[tokio::test(flavor = "multi_thread")]
async fn agents_can_register_through_messages(#[future] mesh: Mesh) {
    let mesh = mesh.await;

    mesh.delivery_from("insight-agent")
        .send(SendRequest::new(
            COORDINATOR,
            "agent_registration",
            json!({"type": "business", "port": 8010, "capabilities": ["forecasting"]}),
        ))
        .await
        .expect("registration delivered");
    mesh.probe
        .set_healthy("http://localhost:8010/health", true);

    let directory = mesh.coordinator.directory().await.expect("directory readable");
    let insight = directory
        .iter()
        .find(|entry| entry.record.name().as_str() == "insight-agent")
        .expect("insight agent listed");
    assert!(insight.healthy);
    assert!(insight.record.has_capability("forecasting"));
}
