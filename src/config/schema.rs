//! Configuration schema definitions.
//!
//! This module defines the complete configuration structure for the gateway.
//! All types derive Serde traits for deserialization from config files.

use serde::{Deserialize, Serialize};

use crate::gateway::patterns::ExclusionRule;

/// Root configuration for the gateway server.
#[derive(Debug, Clone, Deserialize, Serialize, Default)]
#[serde(default)]
pub struct AppConfig {
    /// Listener configuration (bind address).
    pub listener: ListenerConfig,

    /// Request validation gateway settings.
    pub gateway: GatewayConfig,

    /// CORS and response security headers.
    pub security: SecurityConfig,

    /// Timeout configuration.
    pub timeouts: TimeoutConfig,

    /// Observability settings.
    pub observability: ObservabilityConfig,
}

/// Listener configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct ListenerConfig {
    /// Bind address (e.g., "0.0.0.0:8000").
    pub bind_address: String,
}

impl Default for ListenerConfig {
    fn default() -> Self {
        Self {
            bind_address: "0.0.0.0:8000".to_string(),
        }
    }
}

/// Request validation gateway configuration.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
#[serde(default)]
pub struct GatewayConfig {
    /// Paths that bypass validation entirely.
    pub exclusions: Vec<ExclusionRule>,

    /// Header names that are rejected outright (case-insensitive).
    pub dangerous_headers: Vec<String>,

    /// Body ceiling in bytes for general routes.
    pub max_body_bytes: usize,

    /// Body ceiling in bytes for unauthenticated public upload routes.
    pub public_upload_max_body_bytes: usize,

    /// Path prefixes that count as public upload routes.
    pub public_upload_prefixes: Vec<String>,

    /// Maximum query parameter value length, in characters.
    pub max_query_value_len: usize,

    /// Maximum JSON string value length, in characters.
    pub max_json_string_len: usize,

    /// Maximum JSON object / form key length, in characters.
    pub max_json_key_len: usize,

    /// Maximum length of a form token without `=`, in characters.
    pub max_form_token_len: usize,

    /// Maximum JSON container nesting.
    pub max_json_depth: usize,
}

impl Default for GatewayConfig {
    fn default() -> Self {
        Self {
            exclusions: ExclusionRule::defaults(),
            dangerous_headers: Vec::new(),
            max_body_bytes: 10 * 1024 * 1024,              // 10 MiB
            public_upload_max_body_bytes: 5 * 1024 * 1024, // 5 MiB
            public_upload_prefixes: vec!["/upload/".to_string()],
            max_query_value_len: 1_000,
            max_json_string_len: 10_000,
            max_json_key_len: 100,
            max_form_token_len: 1_000,
            max_json_depth: 64,
        }
    }
}

/// CORS and response hardening.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct SecurityConfig {
    /// Add security headers to every response.
    pub enable_headers: bool,

    /// Origins allowed by CORS. Empty disables the CORS layer.
    pub allowed_origins: Vec<String>,
}

impl Default for SecurityConfig {
    fn default() -> Self {
        Self {
            enable_headers: true,
            allowed_origins: vec![
                "http://localhost:3000".to_string(),
                "http://localhost:5173".to_string(),
                "http://localhost:8000".to_string(),
            ],
        }
    }
}

/// Timeout configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct TimeoutConfig {
    /// Request timeout (total time for request/response) in seconds.
    pub request_secs: u64,
}

impl Default for TimeoutConfig {
    fn default() -> Self {
        Self { request_secs: 30 }
    }
}

/// Observability configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct ObservabilityConfig {
    /// Log level (trace, debug, info, warn, error).
    pub log_level: String,

    /// Log output format.
    pub log_format: LogFormat,

    /// Enable metrics endpoint.
    pub metrics_enabled: bool,

    /// Metrics endpoint bind address.
    pub metrics_address: String,
}

impl Default for ObservabilityConfig {
    fn default() -> Self {
        Self {
            log_level: "info".to_string(),
            log_format: LogFormat::Pretty,
            metrics_enabled: false,
            metrics_address: "0.0.0.0:9090".to_string(),
        }
    }
}

/// Log line format.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum LogFormat {
    Pretty,
    Json,
}
