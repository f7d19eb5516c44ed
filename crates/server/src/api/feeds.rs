//! Search, popular and category feed handlers.

use std::sync::Arc;

use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    Json,
};
use bilicast_core::{FeedError, MediaRecord, ResolveError};
use serde::Deserialize;
use tracing::warn;

use super::handlers::ErrorResponse;
use crate::state::AppState;

#[derive(Debug, Deserialize)]
pub struct SearchQuery {
    #[serde(default)]
    pub keyword: String,
    #[serde(default = "default_page")]
    pub page: u32,
}

#[derive(Debug, Deserialize)]
pub struct PageQuery {
    #[serde(default = "default_page")]
    pub page: u32,
}

fn default_page() -> u32 {
    1
}

type FeedResponse = Result<Json<Vec<MediaRecord>>, (StatusCode, Json<ErrorResponse>)>;

/// Map a feed error onto an HTTP status.
pub(super) fn feed_error_response(err: FeedError) -> (StatusCode, Json<ErrorResponse>) {
    let status = match &err {
        FeedError::InvalidVideoId(_) | FeedError::EmptyKeyword => StatusCode::BAD_REQUEST,
        FeedError::Resolve(ResolveError::NotFound(_)) => StatusCode::NOT_FOUND,
        FeedError::Resolve(ResolveError::Upstream { code, .. }) if *code == -404 || *code == 62002 => {
            StatusCode::NOT_FOUND
        }
        FeedError::Transport(_)
        | FeedError::Upstream { .. }
        | FeedError::Parse(_)
        | FeedError::Resolve(_) => StatusCode::BAD_GATEWAY,
    };

    if status == StatusCode::BAD_GATEWAY {
        warn!(error = %err, "Upstream request failed");
    }

    (
        status,
        Json(ErrorResponse {
            error: err.to_string(),
        }),
    )
}

/// GET /api/v1/feeds/search?keyword=&page=
pub async fn search(
    State(state): State<Arc<AppState>>,
    Query(query): Query<SearchQuery>,
) -> FeedResponse {
    state
        .feeds()
        .search(&query.keyword, query.page)
        .await
        .map(Json)
        .map_err(feed_error_response)
}

/// GET /api/v1/feeds/popular?page=
pub async fn popular(
    State(state): State<Arc<AppState>>,
    Query(query): Query<PageQuery>,
) -> FeedResponse {
    state
        .feeds()
        .popular(query.page)
        .await
        .map(Json)
        .map_err(feed_error_response)
}

/// GET /api/v1/feeds/category/{tid}?page=
pub async fn category(
    State(state): State<Arc<AppState>>,
    Path(tid): Path<u32>,
    Query(query): Query<PageQuery>,
) -> FeedResponse {
    state
        .feeds()
        .category(tid, query.page)
        .await
        .map(Json)
        .map_err(feed_error_response)
}
