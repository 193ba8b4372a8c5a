//! Body capture and replay.
//!
//! # Responsibilities
//! - Drain the single-consumption request body to end-of-stream
//! - Retain the bytes for validation
//! - Hand the downstream handler a fresh body over the same bytes
//!
//! # Design Decisions
//! - Capture always reads to completion so the connection is never left
//!   half-drained, even when the body is over its ceiling
//! - Bytes past the ceiling are drained but not retained; such a body is
//!   rejected before any scanning, so keeping them buys nothing
//! - Replay is a single `Bytes` chunk, reference-counted, no copy

use axum::body::{Body, Bytes};
use futures_util::StreamExt;

use crate::config::GatewayConfig;
use crate::gateway::error::GateError;

/// Bytes read from one request body.
#[derive(Debug, Clone)]
pub struct CapturedBody {
    bytes: Bytes,
    received_len: usize,
    ceiling: usize,
}

impl CapturedBody {
    /// Wrap bytes that are already in memory.
    pub fn from_bytes(bytes: impl Into<Bytes>, ceiling: usize) -> Self {
        let bytes = bytes.into();
        let received_len = bytes.len();
        if received_len > ceiling {
            return Self {
                bytes: Bytes::new(),
                received_len,
                ceiling,
            };
        }
        Self {
            bytes,
            received_len,
            ceiling,
        }
    }

    /// Retained bytes. Empty when the body exceeded its ceiling.
    pub fn bytes(&self) -> &Bytes {
        &self.bytes
    }

    pub fn into_bytes(self) -> Bytes {
        self.bytes
    }

    /// Total bytes read from the transport.
    pub fn received_len(&self) -> usize {
        self.received_len
    }

    pub fn ceiling(&self) -> usize {
        self.ceiling
    }

    pub fn exceeds_ceiling(&self) -> bool {
        self.received_len > self.ceiling
    }

    pub fn is_empty(&self) -> bool {
        self.received_len == 0
    }
}

/// Read `body` to end-of-stream.
///
/// A transport error mid-read yields [`GateError::BodyReadError`]; nothing
/// read so far is kept.
pub async fn capture(body: Body, ceiling: usize) -> Result<CapturedBody, GateError> {
    let mut stream = body.into_data_stream();
    let mut first: Option<Bytes> = None;
    let mut buf: Vec<u8> = Vec::new();
    let mut received_len: usize = 0;

    while let Some(chunk) = stream.next().await {
        let chunk = chunk.map_err(|e| GateError::BodyReadError(e.to_string()))?;
        received_len = received_len.saturating_add(chunk.len());

        if received_len > ceiling {
            // Over the ceiling: keep draining, stop retaining.
            first = None;
            buf = Vec::new();
            continue;
        }

        // Single-chunk bodies are kept as-is; copy only once a second chunk arrives.
        match first.take() {
            None if buf.is_empty() => first = Some(chunk),
            None => buf.extend_from_slice(&chunk),
            Some(head) => {
                buf.reserve(head.len() + chunk.len());
                buf.extend_from_slice(&head);
                buf.extend_from_slice(&chunk);
            }
        }
    }

    let bytes = match first {
        Some(head) => head,
        None => Bytes::from(buf),
    };

    Ok(CapturedBody {
        bytes,
        received_len,
        ceiling,
    })
}

/// Body that yields `bytes` once, then end-of-stream.
pub fn make_replay_source(bytes: Bytes) -> Body {
    Body::from(bytes)
}

/// Per-request body ceiling selection.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BodyLimits {
    pub max_body_bytes: usize,
    pub public_upload_max_body_bytes: usize,
    pub public_upload_prefixes: Vec<String>,
}

impl BodyLimits {
    pub fn from_config(config: &GatewayConfig) -> Self {
        Self {
            max_body_bytes: config.max_body_bytes,
            public_upload_max_body_bytes: config.public_upload_max_body_bytes,
            public_upload_prefixes: config.public_upload_prefixes.clone(),
        }
    }

    /// Unauthenticated requests to a public upload prefix get the smaller ceiling.
    pub fn ceiling_for(&self, path: &str, authenticated: bool) -> usize {
        let public_upload = self
            .public_upload_prefixes
            .iter()
            .any(|prefix| path.starts_with(prefix.as_str()));
        if public_upload && !authenticated {
            self.public_upload_max_body_bytes
        } else {
            self.max_body_bytes
        }
    }
}

impl Default for BodyLimits {
    fn default() -> Self {
        Self::from_config(&GatewayConfig::default())
    }
}
