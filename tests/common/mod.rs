//! Shared backends and proxy bootstrap for integration tests.

#![allow(dead_code)]

use futures_util::{SinkExt, StreamExt};
use path_proxy::config::AuthMode;
use path_proxy::{HttpServer, ProxyConfig, Shutdown};
use std::net::SocketAddr;
use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::{TcpListener, TcpStream};

pub const PASSWORD: &str = "hunter2";

/// Config with password auth and the default mounts.
pub fn password_config() -> ProxyConfig {
    let mut config = ProxyConfig::default();
    config.auth.password = PASSWORD.to_string();
    config
}

/// Config that admits every caller.
pub fn open_config() -> ProxyConfig {
    let mut config = ProxyConfig::default();
    config.auth.mode = AuthMode::None;
    config
}

/// Start the proxy on an ephemeral loopback port.
pub async fn start_proxy(config: ProxyConfig) -> (SocketAddr, Shutdown) {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    let shutdown = Shutdown::new();
    let server_shutdown = shutdown.subscribe();

    tokio::spawn(async move {
        let _ = HttpServer::new(config).run(listener, server_shutdown).await;
    });

    (addr, shutdown)
}

/// HTTP client that never follows redirects.
pub fn client() -> reqwest::Client {
    reqwest::Client::builder()
        .redirect(reqwest::redirect::Policy::none())
        .pool_max_idle_per_host(0)
        .no_proxy()
        .build()
        .unwrap()
}

/// Backend whose response body is the request target it received.
pub async fn start_echo_backend() -> u16 {
    start_raw_backend(|target| {
        format!(
            "HTTP/1.1 200 OK\r\nContent-Length: {}\r\nConnection: close\r\n\r\n{}",
            target.len(),
            target
        )
    })
    .await
}

/// Backend that redirects every request to `/signin`.
pub async fn start_redirect_backend() -> u16 {
    start_raw_backend(|_| {
        "HTTP/1.1 302 Found\r\nLocation: /signin\r\nContent-Length: 0\r\nConnection: close\r\n\r\n".to_string()
    })
    .await
}

async fn start_raw_backend(respond: fn(&str) -> String) -> u16 {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let port = listener.local_addr().unwrap().port();

    tokio::spawn(async move {
        while let Ok((mut socket, _)) = listener.accept().await {
            tokio::spawn(async move {
                let Some(target) = read_request_target(&mut socket).await else {
                    return;
                };
                let _ = socket.write_all(respond(&target).as_bytes()).await;
                let _ = socket.shutdown().await;
            });
        }
    });

    port
}

async fn read_request_target(socket: &mut TcpStream) -> Option<String> {
    let mut buf = Vec::new();
    let mut chunk = [0u8; 1024];
    while !buf.windows(4).any(|w| w == b"\r\n\r\n") {
        let n = socket.read(&mut chunk).await.ok()?;
        if n == 0 {
            return None;
        }
        buf.extend_from_slice(&chunk[..n]);
    }
    let head = String::from_utf8_lossy(&buf);
    head.split_whitespace().nth(1).map(str::to_string)
}

/// WebSocket backend that echoes text and binary frames.
pub async fn start_ws_echo_backend() -> u16 {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let port = listener.local_addr().unwrap().port();

    tokio::spawn(async move {
        while let Ok((socket, _)) = listener.accept().await {
            tokio::spawn(async move {
                let Ok(mut ws) = tokio_tungstenite::accept_async(socket).await else {
                    return;
                };
                while let Some(Ok(msg)) = ws.next().await {
                    if (msg.is_text() || msg.is_binary()) && ws.send(msg).await.is_err() {
                        break;
                    }
                }
            });
        }
    });

    port
}

/// A port nothing listens on.
pub async fn closed_port() -> u16 {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    listener.local_addr().unwrap().port()
}
