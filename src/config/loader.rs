//! Configuration loading from disk and environment.

use std::fs;
use std::path::Path;

use thiserror::Error;

use crate::config::schema::AppConfig;
use crate::config::validation::{validate_config, ValidationError};
use crate::gateway::patterns::ExclusionRule;

/// Error type for configuration loading.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Parse error: {0}")]
    Parse(#[from] toml::de::Error),

    #[error("Invalid value for {var}: '{value}'")]
    Env { var: &'static str, value: String },

    #[error("Validation failed: {}", join_errors(.0))]
    Validation(Vec<ValidationError>),
}

fn join_errors(errors: &[ValidationError]) -> String {
    errors
        .iter()
        .map(ToString::to_string)
        .collect::<Vec<_>>()
        .join(", ")
}

/// Load a TOML file, apply environment overrides, and validate.
pub fn load_config(path: &Path) -> Result<AppConfig, ConfigError> {
    let content = fs::read_to_string(path)?;
    let config: AppConfig = toml::from_str(&content)?;
    finish(config)
}

/// Defaults plus environment overrides, validated.
pub fn load_from_env() -> Result<AppConfig, ConfigError> {
    finish(AppConfig::default())
}

fn finish(mut config: AppConfig) -> Result<AppConfig, ConfigError> {
    apply_env_overrides(&mut config, |var| std::env::var(var).ok())?;
    validate_config(&config).map_err(ConfigError::Validation)?;
    Ok(config)
}

/// Apply `GATEWAY_*` overrides read through `lookup`.
///
/// List values are comma-separated. In `GATEWAY_EXCLUDED_PATHS` a trailing
/// `*` turns an entry into a prefix rule.
pub fn apply_env_overrides<F>(config: &mut AppConfig, lookup: F) -> Result<(), ConfigError>
where
    F: Fn(&str) -> Option<String>,
{
    if let Some(value) = lookup("GATEWAY_EXCLUDED_PATHS") {
        config.gateway.exclusions = split_list(&value).map(ExclusionRule::parse).collect();
    }
    if let Some(value) = lookup("GATEWAY_DANGEROUS_HEADERS") {
        config.gateway.dangerous_headers = split_list(&value).map(str::to_string).collect();
    }
    if let Some(value) = lookup("GATEWAY_MAX_BODY_BYTES") {
        config.gateway.max_body_bytes = parse_usize("GATEWAY_MAX_BODY_BYTES", &value)?;
    }
    if let Some(value) = lookup("GATEWAY_PUBLIC_UPLOAD_MAX_BODY_BYTES") {
        config.gateway.public_upload_max_body_bytes =
            parse_usize("GATEWAY_PUBLIC_UPLOAD_MAX_BODY_BYTES", &value)?;
    }
    if let Some(value) = lookup("GATEWAY_BIND_ADDRESS") {
        config.listener.bind_address = value.trim().to_string();
    }
    if let Some(value) = lookup("GATEWAY_ALLOWED_ORIGINS") {
        config.security.allowed_origins = split_list(&value).map(str::to_string).collect();
    }
    Ok(())
}

fn split_list(value: &str) -> impl Iterator<Item = &str> {
    value.split(',').map(str::trim).filter(|s| !s.is_empty())
}

fn parse_usize(var: &'static str, value: &str) -> Result<usize, ConfigError> {
    value.trim().parse().map_err(|_| ConfigError::Env {
        var,
        value: value.to_string(),
    })
}
