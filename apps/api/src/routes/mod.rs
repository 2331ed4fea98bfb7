pub mod health;

use axum::{
    routing::{get, post},
    Router,
};

use crate::generation::handlers;
use crate::state::AppState;

pub fn build_router(state: AppState) -> Router {
    Router::new()
        .route("/health", get(health::health_handler))
        .route(
            "/api/generate",
            post(handlers::handle_generate).fallback(handlers::handle_method_not_allowed),
        )
        .with_state(state)
}
