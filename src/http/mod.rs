//! HTTP front door.
//!
//! # Data Flow
//! ```text
//! TCP connection
//!     → server.rs (Axum setup, layer stack)
//!     → request.rs (request ID assigned and propagated)
//!     → response.rs (security headers, CORS)
//!     → gateway (validate or reject)
//!     → routes.rs (application handlers)
//!     → Send to client
//! ```

pub mod request;
pub mod response;
pub mod routes;
pub mod server;

pub use request::X_REQUEST_ID;
pub use server::HttpServer;
