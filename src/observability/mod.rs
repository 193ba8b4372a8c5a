//! Observability subsystem.
//!
//! # Data Flow
//! ```text
//! Gateway and server produce:
//!     → logging.rs (structured log events)
//!     → metrics.rs (counters, histograms)
//!
//! Consumers:
//!     → Log aggregation (stdout, pretty or JSON)
//!     → Metrics endpoint (Prometheus scrape)
//! ```
//!
//! # Design Decisions
//! - Structured logging (JSON) for machine parsing
//! - Request ID flows into every rejection log line
//! - Metrics are cheap (atomic increments)
//! - Payloads are never logged, only their size and the violation kind

pub mod logging;
pub mod metrics;
