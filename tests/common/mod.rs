//! Shared utilities for integration tests.

#![allow(dead_code)]

use std::net::SocketAddr;

use agenda_gateway::{AppConfig, HttpServer, Shutdown};
use axum::{
    body::{to_bytes, Body},
    http::{Request, Response},
};
use tokio::net::TcpListener;
use tokio::task::JoinHandle;

/// Defaults with small ceilings so oversize bodies stay cheap to build.
pub fn test_config() -> AppConfig {
    let mut config = AppConfig::default();
    config.gateway.max_body_bytes = 64 * 1024;
    config.gateway.public_upload_max_body_bytes = 16 * 1024;
    config
}

/// A server bound to an ephemeral local port.
pub struct TestServer {
    pub addr: SocketAddr,
    pub shutdown: Shutdown,
    pub handle: JoinHandle<Result<(), std::io::Error>>,
}

impl TestServer {
    pub fn url(&self, path: &str) -> String {
        format!("http://{}{}", self.addr, path)
    }

    /// Trigger shutdown and wait for the server task to finish.
    pub async fn stop(self) {
        self.shutdown.trigger();
        let _ = self.handle.await;
    }
}

/// Spawn the full server on `127.0.0.1:0`.
pub async fn spawn_server(config: AppConfig) -> TestServer {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    let server = HttpServer::new(config).unwrap();

    let shutdown = Shutdown::new();
    let rx = shutdown.subscribe();
    let handle = tokio::spawn(server.run(listener, rx));

    TestServer {
        addr,
        shutdown,
        handle,
    }
}

/// Build a request with an optional content type.
pub fn request(method: &str, uri: &str, content_type: Option<&str>, body: impl Into<Body>) -> Request<Body> {
    let mut builder = Request::builder().method(method).uri(uri);
    if let Some(content_type) = content_type {
        builder = builder.header("content-type", content_type);
    }
    builder.body(body.into()).unwrap()
}

/// Collect a response body.
pub async fn body_bytes(response: Response<Body>) -> Vec<u8> {
    to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap()
        .to_vec()
}

/// Collect a response body as JSON.
pub async fn body_json(response: Response<Body>) -> serde_json::Value {
    serde_json::from_slice(&body_bytes(response).await).unwrap()
}
