//! Rejection responses synthesized at the gateway boundary.

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde::Serialize;

use crate::gateway::error::GateError;

/// JSON body of every rejection.
#[derive(Debug, Serialize)]
pub struct ErrorBody {
    pub detail: &'static str,
}

/// Builds the 400 response for a rejected request.
///
/// The response is complete (status, headers, body) and the downstream
/// handler is never invoked for the same request.
pub struct ErrorResponder;

impl ErrorResponder {
    pub fn respond(error: &GateError) -> Response {
        (
            StatusCode::BAD_REQUEST,
            Json(ErrorBody {
                detail: error.detail(),
            }),
        )
            .into_response()
    }
}

impl IntoResponse for GateError {
    fn into_response(self) -> Response {
        ErrorResponder::respond(&self)
    }
}
