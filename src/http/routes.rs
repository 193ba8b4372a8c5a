//! Application routes behind the gateway.
//!
//! The event, auth, upload and storage handlers live in their own services;
//! these stand-ins answer for them so the gateway can be run and exercised
//! on its own. The fallback echoes the request body it receives, which makes
//! body replay observable end to end.
//!
//! Public event-request submission is served here because it is excluded
//! from the gateway and relies on sanitizing its input instead.

use axum::{
    body::Bytes,
    http::{HeaderName, HeaderValue, Method, StatusCode},
    response::{IntoResponse, Response},
    routing::{get, post},
    Json, Router,
};
use chrono::Utc;
use serde::Serialize;

use crate::security::event_request::{
    sanitize_event_request, validate_event_request, EventRequestData,
};

pub const X_ECHO_METHOD: HeaderName = HeaderName::from_static("x-echo-method");

#[derive(Serialize)]
pub struct Welcome {
    pub message: &'static str,
}

#[derive(Serialize)]
pub struct Health {
    pub status: &'static str,
    pub version: &'static str,
}

/// Rejection body for event requests: `{"detail": {"message", "errors"}}`.
#[derive(Serialize)]
pub struct InvalidInput {
    pub detail: InvalidInputDetail,
}

#[derive(Serialize)]
pub struct InvalidInputDetail {
    pub message: &'static str,
    pub errors: Vec<&'static str>,
}

/// Router with the stand-in handlers.
pub fn app_routes() -> Router {
    Router::new()
        .route("/", get(root))
        .route("/health", get(health))
        .route("/event-requests/", post(create_event_request))
        .fallback(echo)
}

async fn root() -> Json<Welcome> {
    Json(Welcome {
        message: "Welcome to the Agenda de Recitales API",
    })
}

async fn health() -> Json<Health> {
    Json(Health {
        status: "ok",
        version: env!("CARGO_PKG_VERSION"),
    })
}

/// Returns the body exactly as received.
async fn echo(method: Method, body: Bytes) -> Response {
    let method = HeaderValue::from_str(method.as_str())
        .unwrap_or_else(|_| HeaderValue::from_static("UNKNOWN"));
    (StatusCode::OK, [(X_ECHO_METHOD, method)], body).into_response()
}

/// Sanitize, then validate. Answers with the cleaned request on success.
async fn create_event_request(Json(data): Json<EventRequestData>) -> Response {
    let sanitized = sanitize_event_request(&data);
    let errors = validate_event_request(&sanitized, Utc::now());
    if !errors.is_empty() {
        let body = InvalidInput {
            detail: InvalidInputDetail {
                message: "Datos de entrada inválidos",
                errors,
            },
        };
        return (StatusCode::BAD_REQUEST, Json(body)).into_response();
    }
    (StatusCode::OK, Json(sanitized)).into_response()
}
