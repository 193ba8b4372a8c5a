//! Content-type aware body validation.
//!
//! # Dispatch
//! ```text
//! multipart/form-data                → size check only (binary payloads)
//! application/json                   → strict decode → recursive walk
//! application/x-www-form-urlencoded  → UTF-8 → pairs → keys + values
//! anything else / absent             → lossy UTF-8 → whole-text scan
//! ```
//!
//! # Design Decisions
//! - The ceiling is checked before anything is decoded or scanned
//! - Walk exits on the first failing key, value or element
//! - Nesting depth is bounded so hostile documents cannot exhaust the stack
//! - Strings are length-checked before they are scanned

use std::sync::Arc;

use serde_json::Value;
use url::form_urlencoded;

use crate::config::GatewayConfig;
use crate::gateway::capture::CapturedBody;
use crate::gateway::error::{GateError, Violation};
use crate::gateway::patterns::PatternRegistry;

/// Outcome of validating one stage of a request.
pub type ValidationVerdict = Result<(), GateError>;

/// Per-field limits applied while walking a body.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ContentLimits {
    pub max_json_string_len: usize,
    pub max_json_key_len: usize,
    pub max_form_token_len: usize,
    pub max_json_depth: usize,
}

impl ContentLimits {
    pub fn from_config(config: &GatewayConfig) -> Self {
        Self {
            max_json_string_len: config.max_json_string_len,
            max_json_key_len: config.max_json_key_len,
            max_form_token_len: config.max_form_token_len,
            max_json_depth: config.max_json_depth,
        }
    }
}

impl Default for ContentLimits {
    fn default() -> Self {
        Self::from_config(&GatewayConfig::default())
    }
}

/// Accept/reject decision for captured bodies.
#[derive(Debug, Clone)]
pub struct ContentValidator {
    registry: Arc<PatternRegistry>,
    limits: ContentLimits,
}

impl ContentValidator {
    pub fn new(registry: Arc<PatternRegistry>, limits: ContentLimits) -> Self {
        Self { registry, limits }
    }

    /// Validate `body` according to its declared content type.
    pub fn validate(&self, body: &CapturedBody, content_type: Option<&str>) -> ValidationVerdict {
        if body.exceeds_ceiling() {
            return Err(GateError::BodyTooLarge {
                size: body.received_len(),
                limit: body.ceiling(),
            });
        }

        let content_type = content_type.unwrap_or_default().to_ascii_lowercase();
        let bytes = body.bytes();

        if content_type.contains("multipart/form-data") {
            tracing::debug!(size = bytes.len(), "Multipart body within ceiling, not scanned");
            Ok(())
        } else if content_type.contains("application/json") {
            self.validate_json(bytes)
        } else if content_type.contains("application/x-www-form-urlencoded") {
            let text = std::str::from_utf8(bytes)
                .map_err(|e| GateError::BodyMalformed(format!("form body is not UTF-8: {}", e)))?;
            self.validate_form(text)
        } else {
            self.validate_text(&String::from_utf8_lossy(bytes))
        }
    }

    /// Strict JSON decode followed by the recursive walk.
    pub fn validate_json(&self, bytes: &[u8]) -> ValidationVerdict {
        let value: Value = serde_json::from_slice(bytes)
            .map_err(|e| GateError::BodyMalformed(format!("invalid JSON: {}", e)))?;
        self.validate_json_value(&value)
    }

    pub fn validate_json_value(&self, value: &Value) -> ValidationVerdict {
        self.walk(value, 0)
    }

    /// Pre-order walk. `depth` counts the containers enclosing `value`.
    fn walk(&self, value: &Value, depth: usize) -> ValidationVerdict {
        match value {
            Value::Object(map) => {
                self.enter_container(depth)?;
                for (key, child) in map {
                    self.validate_key(key)?;
                    self.walk(child, depth + 1)?;
                }
                Ok(())
            }
            Value::Array(items) => {
                self.enter_container(depth)?;
                items.iter().try_for_each(|item| self.walk(item, depth + 1))
            }
            Value::String(s) => self.validate_string(s),
            Value::Number(_) | Value::Bool(_) | Value::Null => Ok(()),
        }
    }

    fn enter_container(&self, depth: usize) -> ValidationVerdict {
        let max = self.limits.max_json_depth;
        if depth >= max {
            return Err(GateError::BodyFieldInvalid(Violation::TooDeep { max }));
        }
        Ok(())
    }

    /// Keys must be non-empty, bounded, and free of threat patterns.
    pub fn validate_key(&self, key: &str) -> ValidationVerdict {
        if key.is_empty() {
            return Err(GateError::BodyFieldInvalid(Violation::EmptyKey));
        }
        check_len(key, self.limits.max_json_key_len).map_err(GateError::BodyFieldInvalid)?;
        self.scan(key)
    }

    fn validate_string(&self, s: &str) -> ValidationVerdict {
        check_len(s, self.limits.max_json_string_len).map_err(GateError::BodyFieldInvalid)?;
        self.scan(s)
    }

    /// `key=value` pairs separated by `&`, percent-decoded before checking.
    pub fn validate_form(&self, text: &str) -> ValidationVerdict {
        for piece in text.split('&') {
            if piece.is_empty() {
                continue;
            }
            let (key, value) = match form_urlencoded::parse(piece.as_bytes()).next() {
                Some(pair) => pair,
                None => continue,
            };

            if piece.contains('=') {
                self.scan(&value)?;
                self.validate_key(&key)?;
            } else {
                // No '=': the whole piece is a standalone token.
                self.scan(&key)?;
                check_len(&key, self.limits.max_form_token_len)
                    .map_err(GateError::BodyFieldInvalid)?;
            }
        }
        Ok(())
    }

    /// Whole-text scan for bodies of unknown type.
    pub fn validate_text(&self, text: &str) -> ValidationVerdict {
        self.scan(text)
    }

    fn scan(&self, text: &str) -> ValidationVerdict {
        match self.registry.detect(text) {
            Some(category) => Err(GateError::BodyThreatDetected(category)),
            None => Ok(()),
        }
    }
}

/// Length in characters, not bytes.
pub(crate) fn check_len(text: &str, max: usize) -> Result<(), Violation> {
    // Byte length bounds char count from above.
    if text.len() <= max {
        return Ok(());
    }
    let len = text.chars().count();
    if len > max {
        return Err(Violation::TooLong { len, max });
    }
    Ok(())
}
