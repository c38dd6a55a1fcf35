use axum::{
    middleware,
    routing::{get, post},
    Router,
};
use tower_http::trace::TraceLayer;

use super::handlers;
use super::AppState;
use crate::middleware::{assign_request_id, request_span};

/// Creates the main API router with all routes
pub fn create_router(state: AppState) -> Router {
    Router::new()
        .route("/health", get(handlers::health_check))
        // Model
        .route("/train", post(handlers::train))
        .route("/predict", post(handlers::predict))
        // User preferences
        .route(
            "/preferences",
            get(handlers::get_preferences).put(handlers::update_preferences),
        )
        .route("/meals/:meal/suitability", get(handlers::meal_suitability))
        // Reference data
        .route("/seasonal-ingredients", get(handlers::seasonal_ingredients))
        .layer(TraceLayer::new_for_http().make_span_with(request_span))
        .layer(middleware::from_fn(assign_request_id))
        .with_state(state)
}
