//! Agenda gateway server.
//!
//! # Architecture Overview
//!
//! ```text
//!     Client Request
//!     ──────────────▶ request id → trace → timeout → CORS → security headers
//!                                                              │
//!                                                              ▼
//!                                                   ┌────────────────────┐
//!                                                   │   RequestGate      │
//!                                                   │ exclusion, headers │
//!                                                   │ query, body        │
//!                                                   └─────────┬──────────┘
//!                                          reject (400)       │ forward (body replayed)
//!     ◀───────────────────────────────────────────────────────┤
//!                                                             ▼
//!                                                      application routes
//! ```

use std::path::PathBuf;
use std::sync::Arc;

use clap::Parser;
use tokio::net::TcpListener;

use agenda_gateway::config::{load_config, load_from_env};
use agenda_gateway::lifecycle::signals::spawn_signal_listener;
use agenda_gateway::observability::{logging::init_logging, metrics::init_metrics};
use agenda_gateway::{HttpServer, Shutdown};

#[derive(Parser)]
#[command(name = "agenda-gateway")]
#[command(about = "Validating gateway in front of the Agenda de Recitales API", long_about = None)]
struct Cli {
    /// TOML configuration file. Defaults and GATEWAY_* variables apply without one.
    #[arg(short, long, env = "GATEWAY_CONFIG")]
    config: Option<PathBuf>,

    /// Override the listener bind address.
    #[arg(short, long)]
    bind: Option<String>,
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();

    let mut config = match &cli.config {
        Some(path) => load_config(path)?,
        None => load_from_env()?,
    };
    if let Some(bind) = cli.bind {
        config.listener.bind_address = bind;
    }

    init_logging(&config.observability)?;

    tracing::info!(
        bind_address = %config.listener.bind_address,
        exclusions = config.gateway.exclusions.len(),
        max_body_bytes = config.gateway.max_body_bytes,
        request_timeout_secs = config.timeouts.request_secs,
        "Configuration loaded"
    );

    if config.observability.metrics_enabled {
        match config.observability.metrics_address.parse() {
            Ok(addr) => init_metrics(addr),
            Err(_) => tracing::error!(
                metrics_address = %config.observability.metrics_address,
                "Failed to parse metrics address"
            ),
        }
    }

    let listener = TcpListener::bind(&config.listener.bind_address).await?;
    let server = HttpServer::new(config)?;

    let shutdown = Arc::new(Shutdown::new());
    let shutdown_rx = shutdown.subscribe();
    spawn_signal_listener(shutdown);

    server.run(listener, shutdown_rx).await?;

    tracing::info!("Shutdown complete");
    Ok(())
}
