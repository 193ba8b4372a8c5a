//! Request interception and validation gateway.
//!
//! # Data Flow
//! ```text
//! inbound request
//!     → gate.rs (exclusion → headers → query → body)
//!         → capture.rs (drain body once, keep bytes)
//!         → content.rs (validate by content type)
//!     → forward(request with replayed body)      on accept
//!     → responder.rs (400 {"detail": ...})        on reject
//! ```
//!
//! # Design Decisions
//! - `PatternRegistry` is compiled once and shared via `Arc`; no locks
//! - Everything else is request-local and dropped with the request
//! - Regex heuristics only: a fast filter, not a guarantee

pub mod capture;
pub mod content;
pub mod error;
pub mod gate;
pub mod patterns;
pub mod responder;

pub use capture::{capture, make_replay_source, BodyLimits, CapturedBody};
pub use content::{ContentLimits, ContentValidator, ValidationVerdict};
pub use error::{GateError, Violation};
pub use gate::{gateway_middleware, GateState, Outcome, RequestGate};
pub use patterns::{ExclusionRule, PatternRegistry, ThreatCategory, ThreatPattern};
pub use responder::ErrorResponder;
