//! Tripcost Server - trip cost prediction over HTTP
//!
//! Serves the trip form page and a JSON API on top of a shared, read-only
//! [`Predictor`].

pub mod http;
pub mod page;

use std::sync::Arc;

use axum::{
    routing::{get, post},
    Router,
};
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;

use tripcost_core::{ArtifactError, ArtifactSet, Predictor, TripCostConfig};

use crate::page::Page;

/// Reasons the server cannot start
#[derive(Debug, thiserror::Error)]
pub enum StartupError {
    #[error("Failed to load model artifacts: {0}")]
    Artifacts(#[from] ArtifactError),

    #[error("Invalid page template: {0}")]
    Template(#[from] minijinja::Error),
}

/// Shared application state
///
/// Built once at startup and never mutated, so handlers share it without locks.
#[derive(Debug)]
pub struct AppState {
    pub predictor: Predictor,
    pub config: TripCostConfig,
    pub page: Page,
}

impl AppState {
    pub fn new(predictor: Predictor, config: TripCostConfig) -> Result<Self, StartupError> {
        Ok(Self {
            predictor,
            config,
            page: Page::new()?,
        })
    }

    /// Load the artifacts named by `config` and build the predictor.
    pub fn load(config: TripCostConfig) -> Result<Self, StartupError> {
        let artifacts = ArtifactSet::load(&config.artifacts)?;
        tracing::debug!("Loaded artifacts: {:?}", artifacts);
        let predictor = Predictor::from_artifacts(artifacts)?;
        tracing::info!("Loaded models from {}", config.artifacts.dir);
        Self::new(predictor, config)
    }
}

/// Create the router
pub fn create_router(state: Arc<AppState>) -> Router {
    Router::new()
        // Form page
        .route("/", get(http::index))
        .route("/predict", post(http::submit_form))
        // JSON API
        .route("/api/predict", post(http::predict))
        .route("/api/options", get(http::get_options))
        // System endpoints
        .route("/status", get(http::get_status))
        // Middleware
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::permissive())
        .with_state(state)
}

/// Start the server
pub async fn serve(addr: &str, state: Arc<AppState>) -> Result<(), Box<dyn std::error::Error>> {
    let app = create_router(state);
    let listener = tokio::net::TcpListener::bind(addr).await?;
    tracing::info!("Tripcost server listening on {}", addr);
    axum::serve(listener, app).await?;
    Ok(())
}
