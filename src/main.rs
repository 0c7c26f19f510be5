//! Breaker admin service.
//!
//! Builds the circuit breaker registry over the configured state store,
//! pre-registers the declared dependencies and serves the admin API so
//! operators can inspect and reset shared breaker state.

use std::path::PathBuf;
use clap::Parser;
use tokio::net::TcpListener;

use shared_breaker::admin::{self, AdminState};
use shared_breaker::config::loader::{load_config, load_from_env};
use shared_breaker::lifecycle::{build_registry, signals::wait_for_shutdown_signal, Shutdown};
use shared_breaker::observability::{logging, metrics};

#[derive(Parser)]
#[command(name = "shared-breaker")]
#[command(about = "Shared circuit breaker state service", long_about = None)]
struct Args {
    /// Path to a TOML configuration file. Defaults plus environment if omitted.
    #[arg(short, long)]
    config: Option<PathBuf>,
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let args = Args::parse();

    let config = match &args.config {
        Some(path) => load_config(path)?,
        None => load_from_env()?,
    };

    logging::init_logging(&config.observability)?;

    tracing::info!(
        version = env!("CARGO_PKG_VERSION"),
        config = ?args.config,
        "shared-breaker starting"
    );

    if config.observability.metrics_enabled {
        if let Ok(addr) = config.observability.metrics_address.parse() {
            metrics::init_metrics(addr);
        } else {
            tracing::error!(
                metrics_address = %config.observability.metrics_address,
                "Failed to parse metrics address"
            );
        }
    }

    let registry = build_registry(&config);

    if !config.admin.enabled {
        tracing::info!("Admin API disabled");
        wait_for_shutdown_signal().await;
        tracing::info!("Shutdown complete");
        return Ok(());
    }

    if config.admin.api_key == "CHANGE_ME_IN_PRODUCTION" {
        tracing::warn!("Admin API is using the placeholder api_key");
    }

    let listener = TcpListener::bind(&config.admin.bind_address).await?;
    let shutdown = Shutdown::new();
    let state = AdminState::new(registry, &config.admin.api_key);
    let server = tokio::spawn(admin::serve(listener, state, shutdown.subscribe()));

    wait_for_shutdown_signal().await;
    shutdown.trigger();
    server.await??;

    tracing::info!("Shutdown complete");
    Ok(())
}
