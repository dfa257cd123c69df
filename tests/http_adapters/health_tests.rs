//! Liveness checks issued by `HttpHealthProbe`.

use super::stub_peer::{CannedReply, StubPeer, closed_port_url};
use agentmesh::registry::{
    adapters::HttpHealthProbe,
    ports::{HealthProbe, ProbeOutcome},
};
use rstest::rstest;
use serde_json::json;
use std::time::Duration;

const TIMEOUT: Duration = Duration::from_millis(200);

#[rstest]
#[tokio::test(flavor = "multi_thread")]
async fn success_response_is_healthy_with_details() {
    let mut peer = StubPeer::serve(CannedReply::json(200, &json!({"status": "ok", "load": 0.2}))).await;

    let outcome = HttpHealthProbe::new().probe(&peer.url("/health"), TIMEOUT).await;

    let ProbeOutcome::Healthy { details, .. } = outcome else {
        panic!("expected healthy outcome, got {outcome:?}");
    };
    assert_eq!(details, Some(json!({"status": "ok", "load": 0.2})));
    let request = peer.next_request().await;
    assert_eq!((request.method.as_str(), request.path.as_str()), ("GET", "/health"));
}

#[rstest]
#[tokio::test(flavor = "multi_thread")]
async fn non_json_success_body_is_still_healthy() {
    let peer = StubPeer::serve(CannedReply::text(204, "")).await;

    let outcome = HttpHealthProbe::new().probe(&peer.url("/health"), TIMEOUT).await;

    assert!(matches!(outcome, ProbeOutcome::Healthy { details: None, .. }));
}

#[rstest]
#[case(500)]
#[case(503)]
#[case(404)]
#[tokio::test(flavor = "multi_thread")]
async fn error_status_is_unhealthy(#[case] status: u16) {
    let peer = StubPeer::serve(CannedReply::text(status, "down for maintenance")).await;

    let outcome = HttpHealthProbe::new().probe(&peer.url("/health"), TIMEOUT).await;

    let ProbeOutcome::Unhealthy { reason, .. } = outcome else {
        panic!("expected unhealthy outcome, got {outcome:?}");
    };
    assert!(reason.contains(&status.to_string()), "reason was {reason}");
}

#[rstest]
#[tokio::test(flavor = "multi_thread")]
async fn slow_reply_is_unhealthy_once_the_timeout_passes() {
    let peer = StubPeer::serve(
        CannedReply::json(200, &json!({"status": "ok"})).delayed(Duration::from_secs(2)),
    )
    .await;

    let outcome = HttpHealthProbe::new().probe(&peer.url("/health"), TIMEOUT).await;

    let ProbeOutcome::Unhealthy { elapsed, .. } = outcome else {
        panic!("expected unhealthy outcome, got {outcome:?}");
    };
    assert!(elapsed < Duration::from_secs(2), "gave up after {elapsed:?}");
}

#[rstest]
#[tokio::test(flavor = "multi_thread")]
async fn unreachable_agent_is_unhealthy() {
    let url = format!("{}/health", closed_port_url().await);

    let outcome = HttpHealthProbe::new().probe(&url, TIMEOUT).await;

    assert!(!outcome.is_healthy());
}

#[rstest]
#[tokio::test(flavor = "multi_thread")]
async fn schemeless_url_is_unhealthy_without_a_request() {
    let mut peer = StubPeer::serve(CannedReply::json(200, &json!({"status": "ok"}))).await;
    let schemeless = peer.url("/health").replacen("http://", "", 1);

    let outcome = HttpHealthProbe::new().probe(&schemeless, TIMEOUT).await;

    assert!(!outcome.is_healthy());
    assert!(peer.saw_nothing());
}
