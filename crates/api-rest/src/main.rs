//! Leaderboard API server

use anyhow::Result;
use clap::Parser;
use leaders_api_rest::{create_app, AppState};
use leaders_common::{init_tracing, AppConfig};
use tokio::signal;
use tracing::{error, info};

#[derive(Parser, Debug)]
#[command(name = "leaders-api")]
#[command(author, version, about, long_about = None)]
struct Args {
    /// Configuration file applied on top of config/default and config/{APP_ENV}
    #[arg(short, long, env = "LEADERS_CONFIG")]
    config: Option<String>,

    /// Address to bind to
    #[arg(long, env = "LEADERS_HOST")]
    host: Option<String>,

    /// Port to listen on
    #[arg(short, long, env = "LEADERS_PORT")]
    port: Option<u16>,

    /// Use the in-memory store regardless of configuration
    #[arg(long)]
    in_memory: bool,
}

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();

    let mut config = AppConfig::load_from(args.config.as_deref())?;
    if let Some(host) = args.host {
        config.server.host = host;
    }
    if let Some(port) = args.port {
        config.server.port = port;
    }
    if args.in_memory {
        config.store.provider = leaders_common::StoreProvider::InMemory;
    }

    init_tracing(
        &config.telemetry.service_name,
        config.telemetry.json_logging,
        &config.telemetry.log_level,
    )?;

    let address = config.server_address();
    info!(
        address = %address,
        provider = ?config.store.provider,
        ranges = ?config.leaderboard.ranges,
        "Starting leaderboard API"
    );

    let state = AppState::from_config(config).await?;
    let app = create_app(state);

    let listener = tokio::net::TcpListener::bind(&address).await?;
    info!(address = %address, "Listening");

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    info!("Server shut down gracefully");
    Ok(())
}

async fn shutdown_signal() {
    if let Err(e) = signal::ctrl_c().await {
        error!(error = %e, "Failed to listen for shutdown signal");
        return;
    }
    info!("Received shutdown signal");
}
