//! Channel dashboard endpoints (/dashboard/*) - the owner's view of their
//! own channel, unpublished videos included.

use axum::{Router, extract::State, routing::get};
use chrono::{DateTime, Utc};
use serde::Serialize;
use std::sync::Arc;

use crate::AppState;
use crate::domain::dashboard;
use crate::routes::auth::AuthUser;
use crate::services::error::{ApiError, ApiResponse, LogErr};

pub fn routes() -> Router<Arc<AppState>> {
    Router::new()
        .route("/dashboard/stats", get(channel_stats))
        .route("/dashboard/videos", get(channel_videos))
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct ChannelStatsDto {
    total_videos: i64,
    total_views: i64,
    total_subscribers: i64,
    total_likes: i64,
}

/// GET /dashboard/stats - Totals for the authenticated user's channel
async fn channel_stats(
    State(state): State<Arc<AppState>>,
    AuthUser(channel_id): AuthUser,
) -> Result<ApiResponse<ChannelStatsDto>, ApiError> {
    let stats = dashboard::get_channel_stats(&state.db, channel_id)
        .await
        .log_500("Channel stats error")?;

    Ok(ApiResponse::ok(
        ChannelStatsDto {
            total_videos: stats.total_videos,
            total_views: stats.total_views,
            total_subscribers: stats.total_subscribers,
            total_likes: stats.total_likes,
        },
        "Channel stats fetched successfully",
    ))
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct ChannelVideoDto {
    id: i64,
    video_url: String,
    thumbnail_url: String,
    title: String,
    description: String,
    duration: f64,
    views: i64,
    is_published: bool,
    created_at: DateTime<Utc>,
    likes_count: i64,
}

/// GET /dashboard/videos - Every video the channel has uploaded
async fn channel_videos(
    State(state): State<Arc<AppState>>,
    AuthUser(channel_id): AuthUser,
) -> Result<ApiResponse<Vec<ChannelVideoDto>>, ApiError> {
    let rows = dashboard::list_channel_videos(&state.db, channel_id)
        .await
        .log_500("Channel videos error")?;

    let items = rows
        .into_iter()
        .map(|v| ChannelVideoDto {
            id: v.id,
            video_url: v.video_url,
            thumbnail_url: v.thumbnail_url,
            title: v.title,
            description: v.description,
            duration: v.duration,
            views: v.views,
            is_published: v.is_published,
            created_at: v.created_at,
            likes_count: v.likes_count,
        })
        .collect();

    Ok(ApiResponse::ok(items, "Channel videos fetched successfully"))
}
