//! Per-request interception pipeline.
//!
//! # State Machine
//! ```text
//! RECEIVED ──excluded path──────────────────────────────▶ EXCLUDED  (forward)
//!    │
//!    ├──bad header──────────────────────────────────────▶ HEADER_REJECTED
//!    ├──bad query value─────────────────────────────────▶ QUERY_REJECTED
//!    │
//!    ├──POST/PUT/PATCH──▶ BODY_CAPTURED ──invalid body──▶ BODY_REJECTED
//!    │                         │
//!    │                         └──valid / empty─────────▶ ACCEPTED  (forward replay)
//!    └──other methods───────────────────────────────────▶ ACCEPTED  (forward)
//! ```
//!
//! # Design Decisions
//! - Header and query checks are synchronous; only body capture awaits
//! - Forwarding and rejecting are mutually exclusive per request
//! - Rejections are logged with stage and violation, never with payload

use std::collections::HashMap;
use std::future::Future;
use std::sync::Arc;

use axum::{
    body::Body,
    extract::State,
    http::{header, HeaderMap, Method, Request},
    middleware::Next,
    response::Response,
};
use url::form_urlencoded;

use crate::config::GatewayConfig;
use crate::gateway::capture::{capture, make_replay_source, BodyLimits};
use crate::gateway::content::{check_len, ContentLimits, ContentValidator, ValidationVerdict};
use crate::gateway::error::{GateError, Violation};
use crate::gateway::patterns::PatternRegistry;
use crate::gateway::responder::ErrorResponder;
use crate::observability::metrics;

/// Where a request ended up in the pipeline.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GateState {
    Excluded,
    HeaderRejected,
    QueryRejected,
    BodyCaptured,
    BodyRejected,
    Accepted,
}

impl GateState {
    pub fn as_str(&self) -> &'static str {
        match self {
            GateState::Excluded => "excluded",
            GateState::HeaderRejected => "header_rejected",
            GateState::QueryRejected => "query_rejected",
            GateState::BodyCaptured => "body_captured",
            GateState::BodyRejected => "body_rejected",
            GateState::Accepted => "accepted",
        }
    }
}

/// Terminal result of inspecting one request.
#[derive(Debug)]
pub enum Outcome {
    /// Request (with a replayed body, if one was captured) may go downstream.
    Forward {
        state: GateState,
        request: Request<Body>,
    },
    /// Request must be answered with a rejection.
    Reject { state: GateState, error: GateError },
}

impl Outcome {
    pub fn state(&self) -> GateState {
        match self {
            Outcome::Forward { state, .. } | Outcome::Reject { state, .. } => *state,
        }
    }
}

/// The gateway in front of every route handler.
#[derive(Debug, Clone)]
pub struct RequestGate {
    registry: Arc<PatternRegistry>,
    validator: ContentValidator,
    limits: BodyLimits,
    max_query_value_len: usize,
}

impl RequestGate {
    pub fn new(registry: Arc<PatternRegistry>, config: &GatewayConfig) -> Self {
        Self {
            validator: ContentValidator::new(registry.clone(), ContentLimits::from_config(config)),
            registry,
            limits: BodyLimits::from_config(config),
            max_query_value_len: config.max_query_value_len,
        }
    }

    /// Compile the patterns for `config` and build the gate.
    pub fn from_config(config: &GatewayConfig) -> Result<Self, regex::Error> {
        let registry = Arc::new(PatternRegistry::from_config(config)?);
        Ok(Self::new(registry, config))
    }

    pub fn registry(&self) -> &PatternRegistry {
        &self.registry
    }

    /// Inspect `request` and either forward it or answer with a 400.
    ///
    /// `forward` runs the rest of the application and is called at most once.
    pub async fn handle<F, Fut>(&self, request: Request<Body>, forward: F) -> Response
    where
        F: FnOnce(Request<Body>) -> Fut,
        Fut: Future<Output = Response>,
    {
        let method = request.method().clone();
        let path = request.uri().path().to_string();
        let request_id = request
            .headers()
            .get("x-request-id")
            .and_then(|v| v.to_str().ok())
            .unwrap_or("unknown")
            .to_string();

        match self.inspect(request).await {
            Outcome::Forward { state, request } => {
                tracing::debug!(
                    request_id = %request_id,
                    method = %method,
                    path = %path,
                    state = state.as_str(),
                    "Request forwarded"
                );
                metrics::record_gate_outcome(state.as_str());
                forward(request).await
            }
            Outcome::Reject { state, error } => {
                tracing::warn!(
                    request_id = %request_id,
                    method = %method,
                    path = %path,
                    category = error.category(),
                    reason = %error,
                    "Request rejected"
                );
                metrics::record_gate_outcome(state.as_str());
                metrics::record_rejection(error.category());
                ErrorResponder::respond(&error)
            }
        }
    }

    /// Run the pipeline without forwarding.
    pub async fn inspect(&self, request: Request<Body>) -> Outcome {
        if self.registry.is_excluded(request.uri().path()) {
            return Outcome::Forward {
                state: GateState::Excluded,
                request,
            };
        }

        if let Err(error) = self.check_headers(request.headers()) {
            return Outcome::Reject {
                state: GateState::HeaderRejected,
                error,
            };
        }

        if let Err(error) = self.check_query(request.uri().query()) {
            return Outcome::Reject {
                state: GateState::QueryRejected,
                error,
            };
        }

        if !carries_body(request.method()) {
            return Outcome::Forward {
                state: GateState::Accepted,
                request,
            };
        }

        let authenticated = request.headers().contains_key(header::AUTHORIZATION);
        let ceiling = self.limits.ceiling_for(request.uri().path(), authenticated);
        let content_type = request
            .headers()
            .get(header::CONTENT_TYPE)
            .map(|v| String::from_utf8_lossy(v.as_bytes()).into_owned());

        let (parts, body) = request.into_parts();
        let captured = match capture(body, ceiling).await {
            Ok(captured) => captured,
            Err(error) => {
                return Outcome::Reject {
                    state: GateState::BodyRejected,
                    error,
                }
            }
        };
        metrics::record_captured_body(captured.received_len());
        tracing::trace!(
            state = GateState::BodyCaptured.as_str(),
            size = captured.received_len(),
            ceiling,
            "Body captured"
        );

        if !captured.is_empty() {
            if let Err(error) = self.validator.validate(&captured, content_type.as_deref()) {
                return Outcome::Reject {
                    state: GateState::BodyRejected,
                    error,
                };
            }
        }

        Outcome::Forward {
            state: GateState::Accepted,
            request: Request::from_parts(parts, make_replay_source(captured.into_bytes())),
        }
    }

    /// Denylisted names and threat patterns in any value, repeats included.
    pub fn check_headers(&self, headers: &HeaderMap) -> ValidationVerdict {
        for (name, value) in headers {
            if self.registry.is_dangerous_header(name.as_str()) {
                return Err(GateError::HeaderRejected(Violation::DeniedHeader(
                    name.as_str().to_string(),
                )));
            }
            let value = String::from_utf8_lossy(value.as_bytes());
            if let Some(category) = self.registry.detect(&value) {
                return Err(GateError::HeaderRejected(Violation::Threat(category)));
            }
        }
        Ok(())
    }

    /// Decoded query values: bounded length, no threat patterns.
    pub fn check_query(&self, query: Option<&str>) -> ValidationVerdict {
        let Some(query) = query else {
            return Ok(());
        };
        for value in parse_query(query).values() {
            check_len(value, self.max_query_value_len).map_err(GateError::QueryRejected)?;
            if let Some(category) = self.registry.detect(value) {
                return Err(GateError::QueryRejected(Violation::Threat(category)));
            }
        }
        Ok(())
    }
}

/// Query string as a map; the last value wins for repeated keys.
pub fn parse_query(query: &str) -> HashMap<String, String> {
    form_urlencoded::parse(query.as_bytes())
        .into_owned()
        .collect()
}

fn carries_body(method: &Method) -> bool {
    matches!(*method, Method::POST | Method::PUT | Method::PATCH)
}

/// Axum middleware entry point, for use with `from_fn_with_state`.
pub async fn gateway_middleware(
    State(gate): State<Arc<RequestGate>>,
    request: Request<Body>,
    next: Next,
) -> Response {
    gate.handle(request, |request| next.run(request)).await
}
