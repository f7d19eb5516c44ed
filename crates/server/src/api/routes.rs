use axum::{middleware, routing::get, Router};
use std::sync::Arc;
use tower_http::cors::CorsLayer;

use super::{feeds, handlers, videos};
use crate::state::AppState;

pub fn create_router(state: Arc<AppState>) -> Router {
    // API routes
    let api_routes = Router::new()
        // Health and config
        .route("/health", get(handlers::health))
        .route("/config", get(handlers::get_config))
        // Uploader catalogue and single videos
        .route("/users/{subject_id}/videos", get(videos::list_user_videos))
        .route("/videos/{video_id}", get(videos::get_video))
        // Feeds
        .route("/feeds/search", get(feeds::search))
        .route("/feeds/popular", get(feeds::popular))
        .route("/feeds/category/{tid}", get(feeds::category))
        .with_state(state);

    Router::new()
        .nest("/api/v1", api_routes)
        .route("/metrics", get(handlers::metrics))
        .layer(middleware::from_fn(super::middleware::metrics_middleware))
        .layer(CorsLayer::permissive())
}
