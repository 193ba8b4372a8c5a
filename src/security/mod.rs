//! Input hygiene helpers for application handlers.
//!
//! The gateway rejects; these functions clean. Handlers behind the gateway
//! call them on accepted input before storing or echoing it. Routes the
//! gateway excludes, such as public event-request submission, depend on
//! them entirely.

pub mod event_request;
pub mod sanitize;

pub use event_request::{
    parse_event_date, sanitize_event_request, validate_event_request, EventRequestData,
};
pub use sanitize::{
    escape_html, is_valid_email, is_valid_url, is_within_length, sanitize_email,
    sanitize_search_text, sanitize_text, sanitize_url,
};
