//! Router configuration for the web server.

use axum::{
    routing::{delete, get, post, put},
    Router,
};
use tower_http::cors::CorsLayer;

use super::handlers;
use super::AppState;

/// Create the main router with all routes.
pub fn create_router(state: AppState) -> Router {
    Router::new()
        // Staging
        .route("/api/staging", post(handlers::import_staged))
        .route("/api/staging", get(handlers::list_staged))
        .route("/api/staging", delete(handlers::clear_staged))
        .route("/api/staging/promote", post(handlers::promote_staged))
        // Warehouse
        .route("/api/warehouse", get(handlers::list_warehouse))
        .route("/api/warehouse/:id", put(handlers::update_warehouse_item))
        .route("/api/warehouse/:id", delete(handlers::delete_warehouse_item))
        .route("/api/warehouse/delete", post(handlers::batch_delete_warehouse))
        // Detail extraction
        .route("/api/warehouse/:id/extract", post(handlers::extract_item))
        .route("/api/warehouse/extract", post(handlers::extract_batch))
        .route("/api/warehouse/:id/detail", get(handlers::read_detail))
        // Extraction rules
        .route("/api/rules", get(handlers::list_rules))
        .route("/api/rules", post(handlers::create_rule))
        .route("/api/rules/:id", get(handlers::get_rule))
        .route("/api/rules/:id", put(handlers::update_rule))
        .route("/api/rules/:id", delete(handlers::delete_rule))
        .route("/api/rules/:id/revisions", get(handlers::rule_revisions))
        .layer(CorsLayer::permissive())
        .with_state(state)
}
