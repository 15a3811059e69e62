//! HTTP API server for commitment derivation and withdrawal proofs.

use std::sync::Arc;

use axum::Router;
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;
use tracing::info;
use tracing_subscriber::EnvFilter;

mod config;
mod error;
mod handlers;
mod routes;


use config::ServerConfig;
use unizwap_client::Groth16Prover;
use unizwap_circuits::TREE_DEPTH;
use unizwap_prover::{load_or_setup, setup_all_circuits_with_depth};

/// Application state shared across handlers
pub struct AppState {
    pub prover: Arc<Groth16Prover>,
    pub tree_depth: usize,
}

pub fn app(state: Arc<AppState>) -> Router {
    Router::new()
        .merge(routes::api_routes())
        .layer(
            CorsLayer::new()
                .allow_origin(Any)
                .allow_methods(Any)
                .allow_headers(Any),
        )
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .init();

    let config = ServerConfig::from_env()?;
    info!(keys_dir = %config.keys_dir.display(), "loading circuit keys");
    let keys_dir = config.keys_dir.clone();
    let depth = config.tree_depth;
    let keys = tokio::task::spawn_blocking(move || {
        if depth == TREE_DEPTH {
            load_or_setup(&keys_dir)
        } else {
            // persisted keys are for the default depth only
            setup_all_circuits_with_depth(depth)
        }
    })
    .await??;

    let state = Arc::new(AppState {
        prover: Arc::new(Groth16Prover::new(Arc::new(keys))),
        tree_depth: config.tree_depth,
    });

    let listener = tokio::net::TcpListener::bind(config.bind).await?;
    info!(addr = %config.bind, "listening");
    axum::serve(listener, app(state)).await?;
    Ok(())
}
