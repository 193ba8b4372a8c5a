//! Rejection taxonomy for the gateway.

use std::fmt;

use thiserror::Error;

use crate::gateway::patterns::ThreatCategory;

/// Client-facing reason strings carried in the `detail` field.
pub const DETAIL_HEADERS: &str = "Headers inválidos";
pub const DETAIL_QUERY: &str = "Parámetros de consulta inválidos";
pub const DETAIL_BODY: &str = "Contenido de solicitud inválido";
pub const DETAIL_PROCESSING: &str = "Error procesando solicitud";

/// What a check found, without the offending text itself.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Violation {
    /// A threat pattern matched.
    Threat(ThreatCategory),
    /// Header name is on the denylist.
    DeniedHeader(String),
    /// Value longer than allowed (lengths in characters).
    TooLong { len: usize, max: usize },
    /// Object or form key was empty.
    EmptyKey,
    /// JSON nesting deeper than allowed.
    TooDeep { max: usize },
}

impl fmt::Display for Violation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Violation::Threat(category) => write!(f, "{} pattern matched", category),
            Violation::DeniedHeader(name) => write!(f, "header '{}' is denied", name),
            Violation::TooLong { len, max } => write!(f, "length {} exceeds {}", len, max),
            Violation::EmptyKey => write!(f, "empty key"),
            Violation::TooDeep { max } => write!(f, "nesting exceeds depth {}", max),
        }
    }
}

/// Reasons the gateway refuses to forward a request.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum GateError {
    #[error("header rejected: {0}")]
    HeaderRejected(Violation),

    #[error("query parameter rejected: {0}")]
    QueryRejected(Violation),

    /// Body could not be decoded as its declared content type.
    #[error("malformed body: {0}")]
    BodyMalformed(String),

    #[error("threat detected in body: {0}")]
    BodyThreatDetected(ThreatCategory),

    /// A body field broke a structural rule (key, length, depth).
    #[error("invalid body field: {0}")]
    BodyFieldInvalid(Violation),

    #[error("body of {size} bytes exceeds ceiling of {limit} bytes")]
    BodyTooLarge { size: usize, limit: usize },

    /// Transport failed mid-read; attributable to the client connection.
    #[error("failed to read request body: {0}")]
    BodyReadError(String),
}

impl GateError {
    /// Log and metric label for the stage that rejected.
    pub fn category(&self) -> &'static str {
        match self {
            GateError::HeaderRejected(_) => "header",
            GateError::QueryRejected(_) => "query",
            _ => "body",
        }
    }

    /// Human-readable reason returned to the client.
    pub fn detail(&self) -> &'static str {
        match self {
            GateError::HeaderRejected(_) => DETAIL_HEADERS,
            GateError::QueryRejected(_) => DETAIL_QUERY,
            GateError::BodyReadError(_) => DETAIL_PROCESSING,
            GateError::BodyMalformed(_)
            | GateError::BodyThreatDetected(_)
            | GateError::BodyFieldInvalid(_)
            | GateError::BodyTooLarge { .. } => DETAIL_BODY,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_details_match_categories() {
        let header = GateError::HeaderRejected(Violation::Threat(ThreatCategory::Xss));
        assert_eq!(header.category(), "header");
        assert_eq!(header.detail(), "Headers inválidos");

        let query = GateError::QueryRejected(Violation::TooLong { len: 1001, max: 1000 });
        assert_eq!(query.category(), "query");
        assert_eq!(query.detail(), "Parámetros de consulta inválidos");

        let large = GateError::BodyTooLarge { size: 11, limit: 10 };
        assert_eq!(large.category(), "body");
        assert_eq!(large.detail(), "Contenido de solicitud inválido");

        let read = GateError::BodyReadError("connection reset".into());
        assert_eq!(read.category(), "body");
        assert_eq!(read.detail(), "Error procesando solicitud");
    }

    #[test]
    fn test_display_omits_payload() {
        let err = GateError::BodyThreatDetected(ThreatCategory::SqlInjection);
        assert_eq!(err.to_string(), "threat detected in body: sql_injection");
    }
}
