pub mod health;

use axum::{
    routing::{get, post},
    Router,
};

use crate::matching::handlers;
use crate::state::AppState;

pub fn build_router(state: AppState) -> Router {
    Router::new()
        .route("/health", get(health::health_handler))
        .route("/upload/resume", post(handlers::handle_upload_resume))
        .route("/upload/job", post(handlers::handle_upload_job))
        .route("/match", post(handlers::handle_match))
        .with_state(state)
}
