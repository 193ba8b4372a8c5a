//! Configuration validation.
//!
//! # Responsibilities
//! - Semantic validation (serde handles syntactic)
//! - Validate value ranges (limits > 0, ceilings ordered)
//! - Validate exclusion paths and the bind address
//!
//! # Design Decisions
//! - Returns all validation errors, not just first
//! - Validation is pure function: AppConfig → Result<(), Vec<ValidationError>>
//! - Runs before config is accepted into the system

use std::net::SocketAddr;

use thiserror::Error;

use crate::config::schema::AppConfig;

/// A single semantic problem with a configuration.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ValidationError {
    #[error("{field} must be greater than zero")]
    Zero { field: &'static str },

    #[error("public upload ceiling ({public}) exceeds general ceiling ({general})")]
    CeilingOrder { public: usize, general: usize },

    #[error("exclusion path '{0}' must start with '/'")]
    ExclusionPath(String),

    #[error("invalid bind address '{0}'")]
    BindAddress(String),
}

/// Check `config` for semantic errors.
pub fn validate_config(config: &AppConfig) -> Result<(), Vec<ValidationError>> {
    let mut errors = Vec::new();
    let gateway = &config.gateway;

    let limits = [
        ("gateway.max_body_bytes", gateway.max_body_bytes),
        ("gateway.public_upload_max_body_bytes", gateway.public_upload_max_body_bytes),
        ("gateway.max_query_value_len", gateway.max_query_value_len),
        ("gateway.max_json_string_len", gateway.max_json_string_len),
        ("gateway.max_json_key_len", gateway.max_json_key_len),
        ("gateway.max_form_token_len", gateway.max_form_token_len),
        ("gateway.max_json_depth", gateway.max_json_depth),
    ];
    for (field, value) in limits {
        if value == 0 {
            errors.push(ValidationError::Zero { field });
        }
    }
    if config.timeouts.request_secs == 0 {
        errors.push(ValidationError::Zero {
            field: "timeouts.request_secs",
        });
    }

    if gateway.public_upload_max_body_bytes > gateway.max_body_bytes {
        errors.push(ValidationError::CeilingOrder {
            public: gateway.public_upload_max_body_bytes,
            general: gateway.max_body_bytes,
        });
    }

    for rule in &gateway.exclusions {
        if !rule.path().starts_with('/') {
            errors.push(ValidationError::ExclusionPath(rule.path().to_string()));
        }
    }

    if config.listener.bind_address.parse::<SocketAddr>().is_err() {
        errors.push(ValidationError::BindAddress(config.listener.bind_address.clone()));
    }

    if errors.is_empty() {
        Ok(())
    } else {
        Err(errors)
    }
}
