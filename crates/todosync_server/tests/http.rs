//! HTTP transport tests over a real listener.

use std::net::SocketAddr;
use std::sync::Arc;
use todosync_protocol::{decode_response, encode_request, ActionToSync, SyncRequest};
use todosync_server::http::{serve, USAGE_HINT};
use todosync_server::{Reconciler, ServerConfig};
use todosync_store::MemoryStore;
use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::{TcpListener, TcpStream};
use tokio::sync::oneshot;

struct RawResponse {
    status: u16,
    headers: Vec<(String, String)>,
    body: Vec<u8>,
}

impl RawResponse {
    fn header(&self, name: &str) -> Option<&str> {
        self.headers
            .iter()
            .find(|(k, _)| k.eq_ignore_ascii_case(name))
            .map(|(_, v)| v.as_str())
    }

    fn text(&self) -> String {
        String::from_utf8_lossy(&self.body).into_owned()
    }
}

struct TestServer {
    addr: SocketAddr,
    shutdown: Option<oneshot::Sender<()>>,
    task: tokio::task::JoinHandle<()>,
}

impl TestServer {
    async fn start() -> Self {
        Self::start_with(ServerConfig::default()).await
    }

    async fn start_with(config: ServerConfig) -> Self {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        let reconciler = Arc::new(Reconciler::new(Arc::new(MemoryStore::new()), config));
        let (tx, rx) = oneshot::channel::<()>();
        let task = tokio::spawn(async move {
            serve(listener, reconciler, async {
                let _ = rx.await;
            })
            .await
            .unwrap();
        });
        Self {
            addr,
            shutdown: Some(tx),
            task,
        }
    }

    async fn send(&self, method: &str, extra_headers: &[(&str, &str)], body: &[u8]) -> RawResponse {
        let mut stream = TcpStream::connect(self.addr).await.unwrap();
        let mut request = format!(
            "{method} / HTTP/1.1\r\nHost: {}\r\nConnection: close\r\nContent-Length: {}\r\n",
            self.addr,
            body.len()
        );
        for (name, value) in extra_headers {
            request.push_str(&format!("{name}: {value}\r\n"));
        }
        request.push_str("\r\n");

        stream.write_all(request.as_bytes()).await.unwrap();
        stream.write_all(body).await.unwrap();

        let mut raw = Vec::new();
        stream.read_to_end(&mut raw).await.unwrap();
        parse_response(&raw)
    }

    async fn stop(mut self) {
        if let Some(tx) = self.shutdown.take() {
            let _ = tx.send(());
        }
        self.task.await.unwrap();
    }
}

fn parse_response(raw: &[u8]) -> RawResponse {
    let split = raw
        .windows(4)
        .position(|w| w == b"\r\n\r\n")
        .expect("response has no header terminator");
    let head = String::from_utf8_lossy(&raw[..split]).into_owned();
    let mut lines = head.split("\r\n");
    let status = lines
        .next()
        .and_then(|line| line.split_whitespace().nth(1))
        .and_then(|code| code.parse().ok())
        .expect("malformed status line");
    let headers = lines
        .filter_map(|line| line.split_once(':'))
        .map(|(k, v)| (k.trim().to_string(), v.trim().to_string()))
        .collect::<Vec<_>>();

    let mut body = raw[split + 4..].to_vec();
    if headers
        .iter()
        .any(|(k, v)| k.eq_ignore_ascii_case("transfer-encoding") && v.contains("chunked"))
    {
        body = dechunk(&body);
    }

    RawResponse {
        status,
        headers,
        body,
    }
}

fn dechunk(mut data: &[u8]) -> Vec<u8> {
    let mut out = Vec::new();
    loop {
        let line_end = data.windows(2).position(|w| w == b"\r\n").unwrap();
        let size_text = String::from_utf8_lossy(&data[..line_end]).into_owned();
        let size = usize::from_str_radix(size_text.trim(), 16).unwrap();
        data = &data[line_end + 2..];
        if size == 0 {
            return out;
        }
        out.extend_from_slice(&data[..size]);
        data = &data[size + 2..];
    }
}

#[tokio::test]
async fn post_runs_a_sync_batch() {
    let server = TestServer::start().await;
    let request = SyncRequest::new("A", vec![ActionToSync::add(1, -1, "title", true)]);

    let response = server
        .send("POST", &[("Content-Type", "application/json")], &encode_request(&request).unwrap())
        .await;

    assert_eq!(response.status, 200);
    assert_eq!(response.header("content-type"), Some("application/json"));
    assert_eq!(response.header("access-control-allow-origin"), Some("*"));
    let decoded = decode_response(&response.body).unwrap();
    assert_eq!(decoded.device_id, 1);
    assert_eq!(decoded.output_of(1), Some(1));
    assert_eq!(decoded.todos.len(), 1);

    server.stop().await;
}

#[tokio::test]
async fn retransmitted_post_gets_identical_body() {
    let server = TestServer::start().await;
    let body = encode_request(&SyncRequest::new("A", vec![
        ActionToSync::add(1, -1, "title", false),
        ActionToSync::update(2, -1, None, Some(true)),
    ]))
    .unwrap();

    let first = server.send("POST", &[], &body).await;
    let second = server.send("POST", &[], &body).await;
    assert_eq!(first.status, 200);
    assert_eq!(first.body, second.body);

    server.stop().await;
}

#[tokio::test]
async fn get_returns_usage_hint() {
    let server = TestServer::start().await;
    let response = server.send("GET", &[], b"").await;

    assert_eq!(response.status, 200);
    assert_eq!(response.text(), USAGE_HINT);
    assert_eq!(response.header("access-control-allow-origin"), Some("*"));

    server.stop().await;
}

#[tokio::test]
async fn options_answers_preflight() {
    let server = TestServer::start().await;
    let response = server
        .send("OPTIONS", &[
            ("Origin", "http://localhost:8080"),
            ("Access-Control-Request-Method", "POST"),
            ("Access-Control-Request-Headers", "content-type"),
        ], b"")
        .await;

    assert_eq!(response.status, 200);
    assert_eq!(response.header("access-control-allow-origin"), Some("*"));
    let allowed = response
        .header("access-control-allow-headers")
        .unwrap()
        .to_ascii_lowercase();
    assert!(allowed.contains("content-type"), "{allowed}");

    server.stop().await;
}

#[tokio::test]
async fn other_methods_are_not_allowed() {
    let server = TestServer::start().await;
    let response = server.send("PUT", &[], b"{}").await;
    assert_eq!(response.status, 405);

    server.stop().await;
}

#[tokio::test]
async fn malformed_json_is_bad_request() {
    let server = TestServer::start().await;
    let response = server.send("POST", &[], b"{\"deviceUid\": ").await;

    assert_eq!(response.status, 400);
    assert!(response.text().starts_with("Error parsing JSON"), "{}", response.text());

    server.stop().await;
}

#[tokio::test]
async fn reconcile_error_is_bad_request() {
    let server = TestServer::start().await;
    let body = encode_request(&SyncRequest::new("", vec![])).unwrap();
    let response = server.send("POST", &[], &body).await;

    assert_eq!(response.status, 400);
    assert!(response.text().contains("blank device uid"), "{}", response.text());

    server.stop().await;
}

#[tokio::test]
async fn oversized_body_is_refused_before_decoding() {
    let server = TestServer::start_with(ServerConfig::default().with_max_body_bytes(1024)).await;
    let actions = (1..=40)
        .map(|id| ActionToSync::add(id, -id, "a title long enough to add up", false))
        .collect();
    let body = encode_request(&SyncRequest::new("A", actions)).unwrap();
    assert!(body.len() > 1024);

    let response = server.send("POST", &[], &body).await;
    assert_eq!(response.status, 413);
    assert_eq!(response.header("access-control-allow-origin"), Some("*"));

    let small = encode_request(&SyncRequest::new("A", vec![])).unwrap();
    assert_eq!(server.send("POST", &[], &small).await.status, 200);

    server.stop().await;
}
