//! Public event-request submissions.
//!
//! `/event-requests/` is excluded from the gateway because visitors write
//! free-form text there. The handler cleans every field with the sanitize
//! helpers instead, then checks the cleaned values.
//!
//! # Flow
//! ```text
//! JSON body → EventRequestData → sanitize_event_request → validate_event_request
//!     → errors empty:  accept the sanitized data
//!     → otherwise:     400 with every error message
//! ```

use chrono::{DateTime, NaiveDate, NaiveDateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::security::sanitize::{
    is_valid_email, is_valid_url, is_within_length, sanitize_email, sanitize_text, sanitize_url,
};

/// Fields a visitor may submit. Absent fields are neither cleaned nor checked.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct EventRequestData {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub email: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub event_name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub artist: Option<String>,
    /// ISO 8601 date or date-time.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub date: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub time: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub venue: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub city: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub ticket_url: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub image_url: Option<String>,
}

/// Clean every present field. Date and time pass through untouched; an
/// empty image URL becomes absent.
pub fn sanitize_event_request(data: &EventRequestData) -> EventRequestData {
    let text = |value: &Option<String>, max: usize| {
        value.as_deref().map(|v| sanitize_text(v, Some(max)))
    };

    EventRequestData {
        name: text(&data.name, 100),
        email: data.email.as_deref().map(sanitize_email),
        event_name: text(&data.event_name, 200),
        artist: text(&data.artist, 100),
        date: data.date.clone(),
        time: data.time.clone(),
        venue: text(&data.venue, 200),
        city: text(&data.city, 100),
        ticket_url: data.ticket_url.as_deref().map(sanitize_url),
        message: text(&data.message, 1000),
        image_url: data
            .image_url
            .as_deref()
            .filter(|v| !v.is_empty())
            .map(sanitize_url),
    }
}

/// Every rule `data` breaks, in field order. Empty means valid.
///
/// `now` is the reference point for the future-date rule.
pub fn validate_event_request(data: &EventRequestData, now: DateTime<Utc>) -> Vec<&'static str> {
    let mut errors = Vec::new();

    check_text(
        &mut errors,
        data.name.as_deref(),
        100,
        "El nombre debe tener al menos 2 caracteres",
        "El nombre no puede exceder 100 caracteres",
    );

    if let Some(email) = data.email.as_deref() {
        if email.is_empty() {
            errors.push("El email es requerido");
        } else if !is_valid_email(email) {
            errors.push("El email no tiene un formato válido");
        }
    }

    check_text(
        &mut errors,
        data.event_name.as_deref(),
        200,
        "El nombre del evento debe tener al menos 2 caracteres",
        "El nombre del evento no puede exceder 200 caracteres",
    );
    check_text(
        &mut errors,
        data.artist.as_deref(),
        100,
        "El artista debe tener al menos 2 caracteres",
        "El artista no puede exceder 100 caracteres",
    );

    if let Some(date) = data.date.as_deref() {
        if date.is_empty() {
            errors.push("La fecha es requerida");
        } else {
            match parse_event_date(date) {
                Some(when) if when > now => {}
                Some(_) => errors.push("La fecha debe ser futura"),
                None => errors.push("La fecha no tiene un formato válido"),
            }
        }
    }

    check_text(
        &mut errors,
        data.venue.as_deref(),
        200,
        "El lugar debe tener al menos 2 caracteres",
        "El lugar no puede exceder 200 caracteres",
    );
    check_text(
        &mut errors,
        data.city.as_deref(),
        100,
        "La ciudad debe tener al menos 2 caracteres",
        "La ciudad no puede exceder 100 caracteres",
    );

    if let Some(url) = data.ticket_url.as_deref() {
        if url.is_empty() {
            errors.push("La URL de entradas es requerida");
        } else if !is_valid_url(url) {
            errors.push("La URL de entradas no es válida");
        }
    }

    if let Some(message) = data.message.as_deref() {
        if !is_within_length(message, 1000) {
            errors.push("El mensaje no puede exceder 1000 caracteres");
        }
    }

    if let Some(url) = data.image_url.as_deref().filter(|v| !v.is_empty()) {
        if !is_valid_url(url) {
            errors.push("La URL de imagen no es válida");
        }
    }

    tracing::debug!(errors = errors.len(), "Event request validated");
    errors
}

// Required text: at least 2 characters, at most `max`.
fn check_text(
    errors: &mut Vec<&'static str>,
    value: Option<&str>,
    max: usize,
    too_short: &'static str,
    too_long: &'static str,
) {
    let Some(value) = value else {
        return;
    };
    if value.chars().count() < 2 {
        errors.push(too_short);
    } else if !is_within_length(value, max) {
        errors.push(too_long);
    }
}

/// Parse an ISO 8601 date or date-time. Values without an offset are UTC;
/// a bare date means midnight.
pub fn parse_event_date(raw: &str) -> Option<DateTime<Utc>> {
    let raw = raw.trim();
    if let Ok(dt) = DateTime::parse_from_rfc3339(raw) {
        return Some(dt.with_timezone(&Utc));
    }
    for format in ["%Y-%m-%dT%H:%M:%S%.f", "%Y-%m-%d %H:%M:%S%.f", "%Y-%m-%dT%H:%M"] {
        if let Ok(naive) = NaiveDateTime::parse_from_str(raw, format) {
            return Some(naive.and_utc());
        }
    }
    NaiveDate::parse_from_str(raw, "%Y-%m-%d")
        .ok()
        .and_then(|date| date.and_hms_opt(0, 0, 0))
        .map(|naive| naive.and_utc())
}
