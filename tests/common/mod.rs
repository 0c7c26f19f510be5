//! Shared utilities for integration tests.
#![allow(dead_code)]

use std::collections::HashMap;
use std::net::SocketAddr;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use async_trait::async_trait;
use serde_json::{json, Value};
use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::{TcpListener, TcpStream};

use shared_breaker::resilience::BreakerState;
use shared_breaker::store::{StateStore, StoreError};

pub const MOCK_TOKEN: &str = "test-token";

/// A minimal Redis REST gateway: GET and SET over JSON command arrays.
#[derive(Clone)]
pub struct MockRedis {
    pub addr: SocketAddr,
    data: Arc<Mutex<HashMap<String, String>>>,
    failing: Arc<AtomicBool>,
    requests: Arc<AtomicUsize>,
}

impl MockRedis {
    pub fn url(&self) -> String {
        format!("http://{}", self.addr)
    }

    /// Make every request answer 503 until switched back.
    pub fn set_failing(&self, failing: bool) {
        self.failing.store(failing, Ordering::SeqCst);
    }

    pub fn request_count(&self) -> usize {
        self.requests.load(Ordering::SeqCst)
    }

    pub fn raw(&self, key: &str) -> Option<String> {
        self.data.lock().unwrap().get(key).cloned()
    }

    pub fn insert_raw(&self, key: &str, value: &str) {
        self.data.lock().unwrap().insert(key.to_string(), value.to_string());
    }
}

/// Start a mock REST gateway on an ephemeral port.
pub async fn start_mock_redis() -> MockRedis {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let mock = MockRedis {
        addr: listener.local_addr().unwrap(),
        data: Arc::new(Mutex::new(HashMap::new())),
        failing: Arc::new(AtomicBool::new(false)),
        requests: Arc::new(AtomicUsize::new(0)),
    };

    let server = mock.clone();
    tokio::spawn(async move {
        loop {
            match listener.accept().await {
                Ok((socket, _)) => {
                    let server = server.clone();
                    tokio::spawn(async move {
                        handle_connection(socket, server).await;
                    });
                }
                Err(_) => break,
            }
        }
    });

    mock
}

async fn handle_connection(mut socket: TcpStream, mock: MockRedis) {
    let Some((head, body)) = read_request(&mut socket).await else {
        return;
    };
    mock.requests.fetch_add(1, Ordering::SeqCst);

    let (status, reply) = if mock.failing.load(Ordering::SeqCst) {
        (503, json!({"error": "service unavailable"}))
    } else if !head
        .lines()
        .any(|l| l.eq_ignore_ascii_case(&format!("authorization: Bearer {}", MOCK_TOKEN)))
    {
        (401, json!({"error": "Unauthorized"}))
    } else {
        run_command(&mock, &body)
    };

    let status_text = match status {
        200 => "200 OK",
        400 => "400 Bad Request",
        401 => "401 Unauthorized",
        _ => "503 Service Unavailable",
    };
    let payload = reply.to_string();
    let response = format!(
        "HTTP/1.1 {}\r\nContent-Type: application/json\r\nContent-Length: {}\r\nConnection: close\r\n\r\n{}",
        status_text,
        payload.len(),
        payload
    );
    let _ = socket.write_all(response.as_bytes()).await;
    let _ = socket.shutdown().await;
}

fn run_command(mock: &MockRedis, body: &[u8]) -> (u16, Value) {
    let Ok(args) = serde_json::from_slice::<Vec<Value>>(body) else {
        return (400, json!({"error": "ERR failed to parse command"}));
    };
    let word = |i: usize| args.get(i).and_then(Value::as_str).map(str::to_string);

    match word(0).map(|c| c.to_ascii_uppercase()).as_deref() {
        Some("GET") => {
            let key = word(1).unwrap_or_default();
            let value = mock.data.lock().unwrap().get(&key).cloned();
            (200, json!({ "result": value }))
        }
        Some("SET") => match (word(1), word(2)) {
            (Some(key), Some(value)) => {
                mock.data.lock().unwrap().insert(key, value);
                (200, json!({"result": "OK"}))
            }
            _ => (400, json!({"error": "ERR wrong number of arguments for 'set' command"})),
        },
        _ => (400, json!({"error": "ERR unknown command"})),
    }
}

async fn read_request(socket: &mut TcpStream) -> Option<(String, Vec<u8>)> {
    let mut buf = Vec::new();
    let mut chunk = [0u8; 4096];

    let header_end = loop {
        let n = socket.read(&mut chunk).await.ok()?;
        if n == 0 {
            return None;
        }
        buf.extend_from_slice(&chunk[..n]);
        if let Some(pos) = buf.windows(4).position(|w| w == b"\r\n\r\n") {
            break pos;
        }
    };

    let head = String::from_utf8_lossy(&buf[..header_end]).to_string();
    let content_length = head
        .lines()
        .filter_map(|l| l.split_once(':'))
        .find(|(k, _)| k.trim().eq_ignore_ascii_case("content-length"))
        .and_then(|(_, v)| v.trim().parse::<usize>().ok())
        .unwrap_or(0);

    let body_start = header_end + 4;
    while buf.len() < body_start + content_length {
        let n = socket.read(&mut chunk).await.ok()?;
        if n == 0 {
            return None;
        }
        buf.extend_from_slice(&chunk[..n]);
    }

    Some((head, buf[body_start..body_start + content_length].to_vec()))
}

/// A store that is always down.
#[derive(Debug, Default)]
pub struct FailingStore {
    pub calls: AtomicUsize,
}

#[async_trait]
impl StateStore for FailingStore {
    async fn get(&self, _key: &str) -> Result<Option<BreakerState>, StoreError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        Err(StoreError::Remote("connection refused".into()))
    }

    async fn set(&self, _key: &str, _state: &BreakerState) -> Result<(), StoreError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        Err(StoreError::Remote("connection refused".into()))
    }

    fn kind(&self) -> &'static str {
        "failing"
    }
}

/// An address nothing listens on.
pub async fn closed_port_url() -> String {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    drop(listener);
    format!("http://{}", addr)
}
