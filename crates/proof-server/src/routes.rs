//! API route definitions.

use std::sync::Arc;

use axum::{
    routing::{get, post},
    Router,
};

use crate::handlers;
use crate::AppState;

pub fn api_routes() -> Router<Arc<AppState>> {
    Router::new()
        .route("/health", get(handlers::health))
        .route("/api/prove/withdraw", post(handlers::prove_withdraw))
        .route("/api/commitment/create", post(handlers::create_commitment))
        .route("/api/secret/generate", post(handlers::generate_secret))
}
