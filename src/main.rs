//! IP allow-list gate.
//!
//! Sits in front of a protected HTTP service and forwards only requests whose
//! client address is admitted by the configured filter chain.
//!
//! # Architecture Overview
//!
//! ```text
//!     Client Request        ┌──────────────────────────────────────────────────┐
//!     ──────────────────────┼─▶ http server ─▶ security::client_ip            │
//!                           │                        │                         │
//!                           │                        ▼                         │
//!                           │                 filter chain (OR)                │
//!                           │          private │ defined │ geodb               │
//!                           │                        │                         │
//!                           │            deny ◀──────┴──────▶ allow            │
//!     403 forbidden ◀───────┼──────────────────┘          │                    │
//!                           │                             ▼                    │
//!     Upstream Response ◀───┼───────────────────── forward_handler ───────────┼──▶ Upstream
//!                           └──────────────────────────────────────────────────┘
//! ```

use std::path::PathBuf;
use std::sync::Arc;

use clap::Parser;
use tokio::net::TcpListener;

use geo_gate::config::load_config;
use geo_gate::lifecycle::{signals, startup, Shutdown};
use geo_gate::observability::{logging, metrics};

#[derive(Parser)]
#[command(name = "geo-gate")]
#[command(about = "IP allow-list gate in front of an HTTP service", long_about = None)]
struct Cli {
    /// Path to the TOML (or .json) configuration file.
    #[arg(short, long, default_value = "geo-gate.toml")]
    config: PathBuf,
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();

    let config = load_config(&cli.config)?;
    logging::init(&config.observability);

    tracing::info!(
        version = env!("CARGO_PKG_VERSION"),
        config = %cli.config.display(),
        "geo-gate starting"
    );

    if config.observability.metrics_enabled {
        match config.observability.metrics_address.parse() {
            Ok(addr) => metrics::init_metrics(addr),
            Err(_) => tracing::error!(
                metrics_address = %config.observability.metrics_address,
                "Failed to parse metrics address"
            ),
        }
    }

    let shutdown = Arc::new(Shutdown::new());
    let gate = startup::prepare(config, &shutdown)?;

    let listener = TcpListener::bind(&gate.config.listener.bind_address).await?;
    tracing::info!(address = %listener.local_addr()?, "Listening for connections");

    let server = gate.into_server()?;

    let trigger = Arc::clone(&shutdown);
    tokio::spawn(async move {
        signals::wait_for_signal().await;
        trigger.trigger();
    });

    server.run(listener, shutdown.subscribe()).await?;

    tracing::info!("Shutdown complete");
    Ok(())
}
