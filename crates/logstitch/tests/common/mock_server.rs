//! Scripted mock HTTP server for exercising retry behavior.
//!
//! Serves one scripted step per incoming connection, in order. Every
//! response carries `connection: close` so each client attempt opens a
//! fresh connection and the hit count equals the attempt count.

use std::collections::VecDeque;
use std::net::SocketAddr;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::{TcpListener, TcpStream};

/// What the server does with one incoming request.
pub enum ScriptedResponse {
    /// Respond with the given status and JSON body.
    Status(u16, &'static str),
    /// Read the request, then close the connection without responding,
    /// producing a transport-level error on the client side.
    Drop,
}

pub struct MockServer {
    addr: SocketAddr,
    hits: Arc<AtomicUsize>,
}

impl MockServer {
    /// Starts the server on a random port with the given script.
    /// Requests beyond the script get a `200 {}` response.
    pub async fn start(script: Vec<ScriptedResponse>) -> Self {
        let listener = TcpListener::bind("127.0.0.1:0")
            .await
            .expect("bind mock server");
        let addr = listener.local_addr().expect("local addr");
        let hits = Arc::new(AtomicUsize::new(0));
        let hit_counter = Arc::clone(&hits);
        let script = Mutex::new(VecDeque::from(script));

        tokio::spawn(async move {
            loop {
                let Ok((mut stream, _)) = listener.accept().await else {
                    break;
                };
                hit_counter.fetch_add(1, Ordering::SeqCst);
                let step = script.lock().expect("lock poisoned").pop_front();
                if read_request(&mut stream).await.is_err() {
                    continue;
                }
                match step {
                    Some(ScriptedResponse::Drop) => drop(stream),
                    Some(ScriptedResponse::Status(status, body)) => {
                        respond(&mut stream, status, body).await;
                    }
                    None => respond(&mut stream, 200, "{}").await,
                }
            }
        });

        MockServer { addr, hits }
    }

    pub fn url(&self) -> String {
        format!("http://{}", self.addr)
    }

    /// Number of connections accepted so far (one per client attempt).
    pub fn hits(&self) -> usize {
        self.hits.load(Ordering::SeqCst)
    }
}

async fn respond(stream: &mut TcpStream, status: u16, body: &str) {
    let reason = match status {
        200 => "OK",
        500 => "Internal Server Error",
        503 => "Service Unavailable",
        _ => "Unknown",
    };
    let response = format!(
        "HTTP/1.1 {status} {reason}\r\ncontent-type: application/json\r\ncontent-length: {}\r\nconnection: close\r\n\r\n{body}",
        body.len()
    );
    let _ = stream.write_all(response.as_bytes()).await;
    let _ = stream.shutdown().await;
}

/// Reads a full HTTP/1.1 request (headers plus content-length body).
async fn read_request(stream: &mut TcpStream) -> std::io::Result<()> {
    let mut data = Vec::new();
    let mut buf = [0u8; 4096];
    loop {
        let n = stream.read(&mut buf).await?;
        if n == 0 {
            return Ok(());
        }
        data.extend_from_slice(&buf[..n]);
        if let Some(end) = find(&data, b"\r\n\r\n") {
            let headers = String::from_utf8_lossy(&data[..end]).to_ascii_lowercase();
            let content_length = headers
                .lines()
                .find_map(|line| line.strip_prefix("content-length:"))
                .and_then(|value| value.trim().parse::<usize>().ok())
                .unwrap_or(0);
            if data.len() >= end + 4 + content_length {
                return Ok(());
            }
        }
    }
}

fn find(haystack: &[u8], needle: &[u8]) -> Option<usize> {
    haystack.windows(needle.len()).position(|window| window == needle)
}
