//! Loopback HTTP/1.1 server that records requests and answers each one with
//! the same canned reply.

use std::time::Duration;
use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::{TcpListener, TcpStream};
use tokio::sync::mpsc;

/// One request as the stub saw it.
#[derive(Debug, Clone)]
pub struct RecordedRequest {
    pub method: String,
    pub path: String,
    pub body: String,
}

/// Response sent for every request.
#[derive(Debug, Clone)]
pub struct CannedReply {
    status: u16,
    content_type: &'static str,
    body: String,
    delay: Duration,
}

impl CannedReply {
    /// Replies with `status` and a JSON body.
    #[must_use]
    pub fn json(status: u16, body: &serde_json::Value) -> Self {
        Self {
            status,
            content_type: "application/json",
            body: body.to_string(),
            delay: Duration::ZERO,
        }
    }

    /// Replies with `status` and a plain-text body.
    #[must_use]
    pub fn text(status: u16, body: &str) -> Self {
        Self {
            status,
            content_type: "text/plain",
            body: body.to_owned(),
            delay: Duration::ZERO,
        }
    }

    /// Holds the reply back for `delay` after the request arrives.
    #[must_use]
    pub const fn delayed(mut self, delay: Duration) -> Self {
        self.delay = delay;
        self
    }
}

/// A running stub bound to an ephemeral loopback port.
pub struct StubPeer {
    base_url: String,
    requests: mpsc::UnboundedReceiver<RecordedRequest>,
}

impl StubPeer {
    /// Starts serving `reply` until the test's runtime shuts down.
    pub async fn serve(reply: CannedReply) -> Self {
        let listener = TcpListener::bind(("127.0.0.1", 0))
            .await
            .expect("loopback listener");
        let address = listener.local_addr().expect("bound address");
        let (sink, requests) = mpsc::unbounded_channel();
        tokio::spawn(async move {
            while let Ok((stream, _)) = listener.accept().await {
                tokio::spawn(respond(stream, reply.clone(), sink.clone()));
            }
        });
        Self {
            base_url: format!("http://{address}"),
            requests,
        }
    }

    /// Returns `http://127.0.0.1:<port>`.
    #[must_use]
    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    /// Returns the URL of `path` on this stub.
    #[must_use]
    pub fn url(&self, path: &str) -> String {
        format!("{}{path}", self.base_url)
    }

    /// Waits for the next recorded request.
    pub async fn next_request(&mut self) -> RecordedRequest {
        tokio::time::timeout(Duration::from_secs(1), self.requests.recv())
            .await
            .expect("request arrives in time")
            .expect("stub still running")
    }

    /// Returns whether no request has been recorded yet.
    pub fn saw_nothing(&mut self) -> bool {
        self.requests.try_recv().is_err()
    }
}

/// Returns a loopback address nothing is listening on.
pub async fn closed_port_url() -> String {
    let listener = TcpListener::bind(("127.0.0.1", 0))
        .await
        .expect("loopback listener");
    let address = listener.local_addr().expect("bound address");
    drop(listener);
    format!("http://{address}")
}

async fn respond(
    mut stream: TcpStream,
    reply: CannedReply,
    sink: mpsc::UnboundedSender<RecordedRequest>,
) {
    let Some(request) = read_request(&mut stream).await else {
        return;
    };
    drop(sink.send(request));
    tokio::time::sleep(reply.delay).await;
    let response = format!(
        "HTTP/1.1 {} {}\r\ncontent-type: {}\r\ncontent-length: {}\r\nconnection: close\r\n\r\n{}",
        reply.status,
        if reply.status < 300 { "OK" } else { "Error" },
        reply.content_type,
        reply.body.len(),
        reply.body,
    );
    drop(stream.write_all(response.as_bytes()).await);
}

async fn read_request(stream: &mut TcpStream) -> Option<RecordedRequest> {
    let mut buffer = Vec::new();
    let mut chunk = [0_u8; 1024];
    loop {
        let read = stream.read(&mut chunk).await.ok()?;
        if read == 0 {
            return None;
        }
        buffer.extend_from_slice(chunk.get(..read)?);
        let text = String::from_utf8_lossy(&buffer);
        let Some((head, body)) = text.split_once("\r\n\r\n") else {
            continue;
        };
        if body.len() < content_length(head) {
            continue;
        }
        let mut request_line = head.lines().next()?.split_whitespace();
        return Some(RecordedRequest {
            method: request_line.next()?.to_owned(),
            path: request_line.next()?.to_owned(),
            body: body.to_owned(),
        });
    }
}

fn content_length(head: &str) -> usize {
    head.lines()
        .filter_map(|line| line.split_once(':'))
        .find(|(name, _)| name.trim().eq_ignore_ascii_case("content-length"))
        .and_then(|(_, value)| value.trim().parse().ok())
        .unwrap_or(0)
}
