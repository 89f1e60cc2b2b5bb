//! Response DTOs shared across route modules

use chrono::{DateTime, Utc};
use serde::Serialize;

/// Compact owner sub-document attached to videos, comments, and tweets
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct OwnerDto {
    pub id: i64,
    pub username: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub full_name: Option<String>,
    pub avatar_url: String,
}

/// Video summary used by the feed, liked-videos, history, and playlists
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct VideoSummaryDto {
    pub id: i64,
    pub video_url: String,
    pub thumbnail_url: String,
    pub title: String,
    pub description: String,
    pub duration: f64,
    pub views: i64,
    pub created_at: DateTime<Utc>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub owner: Option<OwnerDto>,
}
