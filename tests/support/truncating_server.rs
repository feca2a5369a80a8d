//! Raw TCP server that promises a body it never finishes sending.
//!
//! wiremock always sends complete bodies, so mid-stream failures are
//! simulated here: every connection gets a 200 with a `Content-Length`
//! larger than the bytes actually written, then the socket is closed.

use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};

use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::TcpListener;

pub struct TruncatingServer {
    pub base_url: String,
    connections: Arc<AtomicUsize>,
}

impl TruncatingServer {
    /// Number of requests answered so far.
    pub fn connections(&self) -> usize {
        self.connections.load(Ordering::SeqCst)
    }
}

/// Starts the server; `None` when localhost cannot be bound.
pub async fn start(sent: &'static [u8], declared_len: usize) -> Option<TruncatingServer> {
    let listener = TcpListener::bind("127.0.0.1:0").await.ok()?;
    let addr = listener.local_addr().ok()?;
    let connections = Arc::new(AtomicUsize::new(0));
    let counter = Arc::clone(&connections);

    tokio::spawn(async move {
        while let Ok((mut socket, _)) = listener.accept().await {
            counter.fetch_add(1, Ordering::SeqCst);
            tokio::spawn(async move {
                let mut request = Vec::new();
                let mut buf = [0u8; 1024];
                while !request.windows(4).any(|w| w == b"\r\n\r\n") {
                    match socket.read(&mut buf).await {
                        Ok(0) | Err(_) => return,
                        Ok(n) => request.extend_from_slice(&buf[..n]),
                    }
                }
                let head = format!(
                    "HTTP/1.1 200 OK\r\nContent-Length: {declared_len}\r\nConnection: close\r\n\r\n"
                );
                let _ = socket.write_all(head.as_bytes()).await;
                let _ = socket.write_all(sent).await;
                let _ = socket.flush().await;
                let _ = socket.shutdown().await;
            });
        }
    });

    Some(TruncatingServer {
        base_url: format!("http://{addr}"),
        connections,
    })
}
