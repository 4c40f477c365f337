pub mod health;

use axum::{
    extract::DefaultBodyLimit,
    routing::{get, post},
    Router,
};

use crate::cv::handlers as cv;
use crate::guidance::handlers as guidance;
use crate::import::handlers as import;
use crate::state::AppState;

pub fn build_router(state: AppState) -> Router {
    let upload_limit = state.config.max_upload_bytes;

    Router::new()
        .route("/health", get(health::health_handler))
        // CV
        .route("/api/v1/cv", get(cv::handle_get_cv).put(cv::handle_save_cv))
        .route("/api/v1/cv/score", get(cv::handle_get_score))
        .route("/api/v1/cv/review", post(cv::handle_review))
        // Import
        .route(
            "/api/v1/import",
            post(import::handle_import).layer(DefaultBodyLimit::max(upload_limit)),
        )
        // Guidance
        .route(
            "/api/v1/guidance/next-action",
            get(guidance::handle_next_action),
        )
        .route(
            "/api/v1/guidance/career-paths",
            get(guidance::handle_career_paths),
        )
        .with_state(state)
}
