//! Shared utilities for integration testing.

use std::net::SocketAddr;
use std::sync::atomic::{AtomicU32, Ordering};
use std::sync::Arc;
use std::time::Duration;

use tokio::io::{AsyncBufReadExt, AsyncWriteExt, BufReader};
use tokio::net::TcpListener;
use tokio::sync::mpsc;

use edge_redirect::config::EdgeConfig;
use edge_redirect::{HttpServer, Shutdown};

/// Mock origin that answers every request with its request line and Host
/// header, e.g. `"GET /index.html HTTP/1.1\nhost: 127.0.0.1:4000"`.
///
/// Returns the bound address and a counter of requests received.
pub async fn start_echo_origin() -> (SocketAddr, Arc<AtomicU32>) {
    start_slow_origin(Duration::ZERO).await
}

/// Echo origin that waits `delay` after reading a request before answering.
///
/// The counter is bumped as soon as the request headers arrive.
pub async fn start_slow_origin(delay: Duration) -> (SocketAddr, Arc<AtomicU32>) {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    let hits = Arc::new(AtomicU32::new(0));
    let counter = hits.clone();

    tokio::spawn(async move {
        loop {
            match listener.accept().await {
                Ok((socket, _)) => {
                    let counter = counter.clone();
                    tokio::spawn(async move {
                        let (read, mut write) = socket.into_split();
                        let mut lines = BufReader::new(read).lines();

                        let request_line = lines.next_line().await.ok().flatten().unwrap_or_default();
                        let mut host = String::new();
                        while let Ok(Some(line)) = lines.next_line().await {
                            if line.is_empty() {
                                break;
                            }
                            if let Some((name, value)) = line.split_once(':') {
                                if name.eq_ignore_ascii_case("host") {
                                    host = value.trim().to_string();
                                }
                            }
                        }
                        counter.fetch_add(1, Ordering::SeqCst);
                        tokio::time::sleep(delay).await;

                        let body = format!("{}\nhost: {}", request_line, host);
                        let response = format!(
                            "HTTP/1.1 200 OK\r\nContent-Length: {}\r\nConnection: close\r\n\r\n{}",
                            body.len(),
                            body
                        );
                        let _ = write.write_all(response.as_bytes()).await;
                        let _ = write.shutdown().await;
                        tokio::time::sleep(Duration::from_millis(10)).await;
                    });
                }
                Err(_) => break,
            }
        }
    });

    (addr, hits)
}

/// An address nothing is listening on.
pub async fn closed_addr() -> SocketAddr {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    listener.local_addr().unwrap()
}

/// A running edge service.
pub struct Edge {
    pub addr: SocketAddr,
    pub updates: mpsc::UnboundedSender<EdgeConfig>,
    shutdown: Shutdown,
}

impl Edge {
    pub fn url(&self, path: &str) -> String {
        format!("http://{}{}", self.addr, path)
    }
}

impl Drop for Edge {
    fn drop(&mut self) {
        self.shutdown.trigger();
    }
}

/// Start the edge service with `config` forwarding to `origin`.
pub async fn start_edge(config: EdgeConfig, origin: SocketAddr) -> Edge {
    let (updates, config_updates) = mpsc::unbounded_channel();
    let (addr, shutdown) = serve_edge(config, origin, config_updates).await;

    Edge {
        addr,
        updates,
        shutdown,
    }
}

/// Start the edge service taking its configuration updates from `config_updates`.
///
/// The service stops when the returned `Shutdown` is triggered.
pub async fn serve_edge(
    mut config: EdgeConfig,
    origin: SocketAddr,
    config_updates: mpsc::UnboundedReceiver<EdgeConfig>,
) -> (SocketAddr, Shutdown) {
    config.origin.url = format!("http://{}", origin);

    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();

    let shutdown = Shutdown::new();
    let server = HttpServer::new(config).unwrap();
    let server_shutdown = shutdown.subscribe();

    tokio::spawn(async move {
        let _ = server.run(listener, config_updates, server_shutdown).await;
    });

    (addr, shutdown)
}

/// HTTP client that does not follow redirects.
pub fn client() -> reqwest::Client {
    reqwest::Client::builder()
        .redirect(reqwest::redirect::Policy::none())
        .pool_max_idle_per_host(0)
        .no_proxy()
        .build()
        .unwrap()
}
