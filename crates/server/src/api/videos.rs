//! Uploader catalogue and single-video handlers.

use std::sync::Arc;

use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    Json,
};
use bilicast_core::{MediaRecord, Quality, RelayMode};
use serde::Deserialize;

use super::feeds::feed_error_response;
use super::handlers::ErrorResponse;
use crate::state::AppState;

// ============================================================================
// Request types
// ============================================================================

/// Playback options shared by the video endpoints.
#[derive(Debug, Default, Deserialize)]
pub struct PlaybackQuery {
    /// Quality label such as `720P`; unknown labels fall back to the default.
    #[serde(default)]
    pub quality: Option<String>,
    /// `true`/`1` routes media through the configured relays.
    #[serde(default)]
    pub relay: Option<String>,
}

impl PlaybackQuery {
    fn decode(&self, default_quality: Quality) -> (Quality, RelayMode) {
        let quality = self
            .quality
            .as_deref()
            .map(Quality::from_label)
            .unwrap_or(default_quality);
        let relay = self
            .relay
            .as_deref()
            .map(RelayMode::from_flag)
            .unwrap_or_default();
        (quality, relay)
    }
}

// ============================================================================
// Handlers
// ============================================================================

/// GET /api/v1/users/{subject_id}/videos
///
/// Always answers with a renderable list; enumeration failures come back
/// as a single error record.
pub async fn list_user_videos(
    State(state): State<Arc<AppState>>,
    Path(subject_id): Path<String>,
    Query(query): Query<PlaybackQuery>,
) -> Result<Json<Vec<MediaRecord>>, (StatusCode, Json<ErrorResponse>)> {
    let subject_id = subject_id.trim();
    if subject_id.is_empty() || !subject_id.chars().all(|c| c.is_ascii_digit()) {
        return Err((
            StatusCode::BAD_REQUEST,
            Json(ErrorResponse {
                error: format!("Invalid user id: {}", subject_id),
            }),
        ));
    }

    let (quality, relay) = query.decode(state.pipeline().default_quality());
    let records = state
        .pipeline()
        .load_user_videos(subject_id, quality, relay)
        .await;
    Ok(Json(records))
}

/// GET /api/v1/videos/{video_id}
pub async fn get_video(
    State(state): State<Arc<AppState>>,
    Path(video_id): Path<String>,
    Query(query): Query<PlaybackQuery>,
) -> Result<Json<MediaRecord>, (StatusCode, Json<ErrorResponse>)> {
    let (quality, relay) = query.decode(state.pipeline().default_quality());
    state
        .pipeline()
        .load_detail(&video_id, quality, relay)
        .await
        .map(Json)
        .map_err(feed_error_response)
}
