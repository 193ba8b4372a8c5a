//! Request interception and validation gateway for the Agenda de Recitales API.

pub mod config;
pub mod gateway;
pub mod http;
pub mod lifecycle;
pub mod observability;
pub mod security;

pub use config::schema::AppConfig;
pub use gateway::RequestGate;
pub use http::HttpServer;
pub use lifecycle::Shutdown;
