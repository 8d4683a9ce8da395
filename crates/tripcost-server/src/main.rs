//! Tripcost Server Binary
//!
//! Usage: `tripcost-server [CONFIG_PATH]`

use std::path::PathBuf;
use std::process::ExitCode;
use std::sync::Arc;

use tracing_subscriber::EnvFilter;

use tripcost_core::TripCostConfig;
use tripcost_server::{serve, AppState};

#[tokio::main]
async fn main() -> ExitCode {
    // Initialize logging
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info,tower_http=debug")),
        )
        .init();

    let explicit = std::env::args_os().nth(1).map(PathBuf::from);
    let (config, source) = match TripCostConfig::load_standard(explicit.as_deref()) {
        Ok(loaded) => loaded,
        Err(e) => {
            tracing::error!("Invalid configuration: {}", e);
            return ExitCode::FAILURE;
        }
    };
    match &source {
        Some(path) => tracing::info!("Using config {:?}", path),
        None => tracing::info!("No config file found, using defaults"),
    }

    // Artifacts are required; without them no request can be served.
    let state = match AppState::load(config) {
        Ok(state) => Arc::new(state),
        Err(e) => {
            tracing::error!("{}", e);
            return ExitCode::FAILURE;
        }
    };

    let addr = state.config.server.addr.clone();
    if let Err(e) = serve(&addr, state).await {
        tracing::error!("Server error: {}", e);
        return ExitCode::FAILURE;
    }
    ExitCode::SUCCESS
}
