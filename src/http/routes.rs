use super::handlers;
use super::state::AppState;
use axum::{http::HeaderValue, routing::get, Router};
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;
use tracing::warn;

/// Create the HTTP router with all routes
pub fn create_router(state: AppState, cors_origin: &str) -> Router {
    Router::new()
        // Health and status
        .route("/", get(handlers::status))
        .route("/health", get(handlers::health_check))
        // Catalog queries
        .route("/tracks", get(handlers::list_tracks))
        .route("/stats/:filename", get(handlers::get_stats))
        // Streaming
        .route("/stream/:filename", get(handlers::stream_audio))
        .layer(cors_layer(cors_origin))
        // Add tracing middleware for request logging
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

fn cors_layer(origin: &str) -> CorsLayer {
    let layer = CorsLayer::new().allow_methods(Any).allow_headers(Any);
    if origin == "*" {
        return layer.allow_origin(Any);
    }
    match origin.parse::<HeaderValue>() {
        Ok(value) => layer.allow_origin(value),
        Err(_) => {
            warn!("Invalid CORS origin {:?}, allowing any origin", origin);
            layer.allow_origin(Any)
        }
    }
}
