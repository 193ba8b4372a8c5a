//! HTTP server setup and configuration.
//!
//! # Responsibilities
//! - Create Axum Router with all handlers
//! - Put the validation gateway in front of every route
//! - Wire up middleware (request ID, tracing, timeout, CORS, security headers)
//! - Bind server to listener and shut down gracefully
//!
//! # Layer Order (outermost first)
//! ```text
//! set request id → trace → propagate request id → timeout
//!     → CORS → security headers → gateway → routes
//! ```

use std::sync::Arc;
use std::time::Duration;

use axum::{extract::DefaultBodyLimit, http::StatusCode, middleware, Router};
use tokio::net::TcpListener;
use tokio::sync::broadcast;
use tower::ServiceBuilder;
use tower_http::{set_header::SetResponseHeaderLayer, timeout::TimeoutLayer, trace::TraceLayer};

use crate::config::AppConfig;
use crate::gateway::{gateway_middleware, RequestGate};
use crate::http::request::{propagate_request_id_layer, set_request_id_layer};
use crate::http::response::{cors_layer, security_headers};
use crate::http::routes::app_routes;

/// HTTP server fronted by the validation gateway.
pub struct HttpServer {
    router: Router,
    config: AppConfig,
    gate: Arc<RequestGate>,
}

impl HttpServer {
    /// Create a server with the built-in application routes.
    ///
    /// Fails only if the threat patterns cannot be compiled.
    pub fn new(config: AppConfig) -> Result<Self, regex::Error> {
        Self::with_routes(config, app_routes())
    }

    /// Put the gateway in front of an arbitrary application router.
    pub fn with_routes(config: AppConfig, app: Router) -> Result<Self, regex::Error> {
        let gate = Arc::new(RequestGate::from_config(&config.gateway)?);
        let router = Self::build_router(&config, gate.clone(), app);
        Ok(Self {
            router,
            config,
            gate,
        })
    }

    /// Build the Axum router with all middleware layers.
    fn build_router(config: &AppConfig, gate: Arc<RequestGate>, app: Router) -> Router {
        let mut router = app
            .layer(DefaultBodyLimit::max(config.gateway.max_body_bytes))
            .layer(middleware::from_fn_with_state(gate, gateway_middleware));

        if config.security.enable_headers {
            for (name, value) in security_headers() {
                router = router.layer(SetResponseHeaderLayer::if_not_present(name, value));
            }
        }

        if let Some(cors) = cors_layer(&config.security.allowed_origins) {
            router = router.layer(cors);
        }

        router.layer(
            ServiceBuilder::new()
                .layer(set_request_id_layer())
                .layer(TraceLayer::new_for_http())
                .layer(propagate_request_id_layer())
                .layer(TimeoutLayer::with_status_code(
                    StatusCode::REQUEST_TIMEOUT,
                    Duration::from_secs(config.timeouts.request_secs),
                )),
        )
    }

    /// Router with every layer applied, for in-process use.
    pub fn router(&self) -> Router {
        self.router.clone()
    }

    pub fn gate(&self) -> &RequestGate {
        &self.gate
    }

    /// Get a reference to the config.
    pub fn config(&self) -> &AppConfig {
        &self.config
    }

    /// Run the server until `shutdown` fires.
    pub async fn run(
        self,
        listener: TcpListener,
        mut shutdown: broadcast::Receiver<()>,
    ) -> Result<(), std::io::Error> {
        let addr = listener.local_addr()?;
        tracing::info!(
            address = %addr,
            exclusions = self.gate.registry().exclusions().len(),
            "HTTP server starting"
        );

        axum::serve(listener, self.router)
            .with_graceful_shutdown(async move {
                let _ = shutdown.recv().await;
                tracing::info!("Shutdown signal received");
            })
            .await?;

        tracing::info!("HTTP server stopped");
        Ok(())
    }
}
