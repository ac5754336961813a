use axum::{
    Router,
    routing::{get, post},
};
use std::sync::Arc;

use super::handlers;
use super::static_files::static_handler;
use super::state::AppState;

// UI Routes - query page and its assets
pub fn ui_routes() -> Router<Arc<AppState>> {
    Router::new()
        .route("/", get(handlers::ui::index_handler))
        .route("/database-query", get(handlers::ui::index_handler))
        .route("/static/{*path}", get(static_handler))
}

// API Routes
pub fn api_routes() -> Router<Arc<AppState>> {
    Router::new().nest(
        "/api",
        Router::new()
            .route("/database/query", post(handlers::api::database_query))
            .route("/database/schema", get(handlers::api::database_schema))
            .route("/status", get(handlers::api::system_status)),
    )
}
