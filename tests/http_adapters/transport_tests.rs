//! `POST /messages/receive` issued by `HttpPeerTransport`.

use super::stub_peer::{CannedReply, StubPeer, closed_port_url};
use agentmesh::messaging::{
    adapters::HttpPeerTransport,
    domain::CorrelationId,
    ports::{PeerRequest, PeerResponse, PeerTransport, TransportError},
};
use agentmesh::registry::domain::AgentName;
use rstest::{fixture, rstest};
use serde_json::json;
use std::time::Duration;

const TIMEOUT: Duration = Duration::from_millis(200);

#[fixture]
fn request() -> PeerRequest {
    PeerRequest {
        from_agent: AgentName::new("coordinator").expect("valid agent name"),
        message_type: "workflow_request".to_owned(),
        payload: json!({"patient_id": 42, "symptoms": ["fever"]}),
        correlation_id: CorrelationId::new("intake-42").expect("valid correlation id"),
    }
}

#[rstest]
#[tokio::test(flavor = "multi_thread")]
async fn request_is_posted_and_reply_decoded(request: PeerRequest) {
    let mut peer = StubPeer::serve(CannedReply::json(
        200,
        &json!({"status": "received", "response": {"diagnosis": "influenza"}}),
    ))
    .await;
    let endpoint = format!("{}/", peer.base_url());

    let reply = HttpPeerTransport::new()
        .deliver(&endpoint, &request, TIMEOUT)
        .await
        .expect("delivery succeeds");

    assert_eq!(reply, PeerResponse::received(json!({"diagnosis": "influenza"})));
    let recorded = peer.next_request().await;
    assert_eq!(
        (recorded.method.as_str(), recorded.path.as_str()),
        ("POST", "/messages/receive")
    );
    let sent: PeerRequest = serde_json::from_str(&recorded.body).expect("JSON request body");
    assert_eq!(sent, request);
}

#[rstest]
#[tokio::test(flavor = "multi_thread")]
async fn reply_without_response_body_defaults_to_null(request: PeerRequest) {
    let peer = StubPeer::serve(CannedReply::json(200, &json!({"status": "received"}))).await;

    let reply = HttpPeerTransport::new()
        .deliver(peer.base_url(), &request, TIMEOUT)
        .await
        .expect("delivery succeeds");

    assert_eq!(reply.status, "received");
    assert!(reply.response.is_null());
}

#[rstest]
#[tokio::test(flavor = "multi_thread")]
async fn error_status_carries_code_and_body(request: PeerRequest) {
    let peer = StubPeer::serve(CannedReply::text(503, "agent overloaded")).await;

    let result = HttpPeerTransport::new()
        .deliver(peer.base_url(), &request, TIMEOUT)
        .await;

    assert_eq!(
        result,
        Err(TransportError::Status {
            code: 503,
            body: "agent overloaded".to_owned(),
        })
    );
}

#[rstest]
#[tokio::test(flavor = "multi_thread")]
async fn undecodable_reply_is_a_decode_error(request: PeerRequest) {
    let peer = StubPeer::serve(CannedReply::text(200, "not json")).await;

    let result = HttpPeerTransport::new()
        .deliver(peer.base_url(), &request, TIMEOUT)
        .await;

    assert!(matches!(result, Err(TransportError::Decode(_))), "got {result:?}");
}

#[rstest]
#[tokio::test(flavor = "multi_thread")]
async fn slow_peer_times_out(request: PeerRequest) {
    let peer = StubPeer::serve(
        CannedReply::json(200, &json!({"status": "received"})).delayed(Duration::from_secs(2)),
    )
    .await;

    let result = HttpPeerTransport::new()
        .deliver(peer.base_url(), &request, TIMEOUT)
        .await;

    assert_eq!(result, Err(TransportError::Timeout(TIMEOUT)));
}

#[rstest]
#[tokio::test(flavor = "multi_thread")]
async fn unreachable_peer_is_a_connection_error(request: PeerRequest) {
    let endpoint = closed_port_url().await;

    let result = HttpPeerTransport::new()
        .deliver(&endpoint, &request, TIMEOUT)
        .await;

    assert!(matches!(result, Err(TransportError::Connection(_))), "got {result:?}");
}
