//! Playlist endpoints (/playlists/*)

use axum::{
    Json, Router,
    extract::{Path, State},
    routing::{get, patch, post},
};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::sync::Arc;

use crate::AppState;
use crate::domain::{playlists, videos};
use crate::routes::auth::AuthUser;
use crate::routes::dto::{OwnerDto, VideoSummaryDto};
use crate::routes::parse_id;
use crate::services::error::{ApiError, ApiResponse, LogErr};

pub fn routes() -> Router<Arc<AppState>> {
    Router::new()
        .route("/playlists", post(create_playlist))
        .route(
            "/playlists/{playlistId}",
            get(get_playlist)
                .patch(update_playlist)
                .delete(delete_playlist),
        )
        .route(
            "/playlists/add/{videoId}/{playlistId}",
            patch(add_video_to_playlist),
        )
        .route(
            "/playlists/remove/{videoId}/{playlistId}",
            patch(remove_video_from_playlist),
        )
        .route("/playlists/user/{userId}", get(user_playlists))
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct PlaylistRecordResponse {
    id: i64,
    owner_id: i64,
    name: String,
    description: String,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

impl From<playlists::PlaylistRecord> for PlaylistRecordResponse {
    fn from(p: playlists::PlaylistRecord) -> Self {
        Self {
            id: p.id,
            owner_id: p.owner_id,
            name: p.name,
            description: p.description,
            created_at: p.created_at,
            updated_at: p.updated_at,
        }
    }
}

#[derive(Deserialize)]
struct PlaylistBody {
    name: Option<String>,
    description: Option<String>,
}

fn require_name_description(body: &PlaylistBody) -> Result<(&str, &str), ApiError> {
    let name = body
        .name
        .as_deref()
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .ok_or_else(|| ApiError::validation("name is required"))?;
    let description = body
        .description
        .as_deref()
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .ok_or_else(|| ApiError::validation("description is required"))?;
    Ok((name, description))
}

/// POST /playlists - Create a playlist
async fn create_playlist(
    State(state): State<Arc<AppState>>,
    AuthUser(actor): AuthUser,
    Json(body): Json<PlaylistBody>,
) -> Result<ApiResponse<PlaylistRecordResponse>, ApiError> {
    let (name, description) = require_name_description(&body)?;

    let playlist = playlists::insert(&state.db, actor, name, description)
        .await
        .log_500("Create playlist error")?;

    Ok(ApiResponse::created(
        playlist.into(),
        "Playlist created successfully",
    ))
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct PlaylistSummaryDto {
    id: i64,
    name: String,
    description: String,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
    total_videos: i64,
    total_views: i64,
}

/// GET /playlists/user/:userId - A user's playlists with aggregate totals
async fn user_playlists(
    State(state): State<Arc<AppState>>,
    AuthUser(_viewer): AuthUser,
    Path(user_id): Path<String>,
) -> Result<ApiResponse<Vec<PlaylistSummaryDto>>, ApiError> {
    let user_id = parse_id(&user_id, "userId")?;

    let rows = playlists::list_for_user(&state.db, user_id)
        .await
        .log_500("List playlists error")?;

    let items = rows
        .into_iter()
        .map(|p| PlaylistSummaryDto {
            id: p.id,
            name: p.name,
            description: p.description,
            created_at: p.created_at,
            updated_at: p.updated_at,
            total_videos: p.total_videos,
            total_views: p.total_views,
        })
        .collect();

    Ok(ApiResponse::ok(items, "User playlists fetched successfully"))
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct PlaylistDetailResponse {
    id: i64,
    name: String,
    description: String,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
    total_videos: i64,
    total_views: i64,
    owner: OwnerDto,
    videos: Vec<VideoSummaryDto>,
}

/// GET /playlists/:playlistId - Playlist detail: aggregates, owner, and the
/// contained video summaries in append order
async fn get_playlist(
    State(state): State<Arc<AppState>>,
    AuthUser(_viewer): AuthUser,
    Path(playlist_id): Path<String>,
) -> Result<ApiResponse<PlaylistDetailResponse>, ApiError> {
    let playlist_id = parse_id(&playlist_id, "playlistId")?;

    let header = playlists::get_detail(&state.db, playlist_id)
        .await
        .log_500("Get playlist detail error")?
        .ok_or(ApiError::NotFound("Playlist not found"))?;

    let videos = playlists::list_videos(&state.db, playlist_id)
        .await
        .log_500("List playlist videos error")?
        .into_iter()
        .map(|v| VideoSummaryDto {
            id: v.id,
            video_url: v.video_url,
            thumbnail_url: v.thumbnail_url,
            title: v.title,
            description: v.description,
            duration: v.duration,
            views: v.views,
            created_at: v.created_at,
            owner: None,
        })
        .collect();

    Ok(ApiResponse::ok(
        PlaylistDetailResponse {
            id: header.id,
            name: header.name,
            description: header.description,
            created_at: header.created_at,
            updated_at: header.updated_at,
            total_videos: header.total_videos,
            total_views: header.total_views,
            owner: OwnerDto {
                id: header.owner_id,
                username: header.owner_username,
                full_name: Some(header.owner_full_name),
                avatar_url: header.owner_avatar_url,
            },
            videos,
        },
        "Playlist fetched successfully",
    ))
}

/// Both the playlist and the video must belong to the actor, each checked
/// independently.
async fn check_playlist_and_video(
    state: &AppState,
    actor: i64,
    playlist_id: i64,
    video_id: i64,
) -> Result<(), ApiError> {
    let playlist = playlists::get_record(&state.db, playlist_id)
        .await
        .log_500("Get playlist error")?
        .ok_or(ApiError::NotFound("Playlist not found"))?;

    let video = videos::get_record(&state.db, video_id)
        .await
        .log_500("Get video error")?
        .ok_or(ApiError::NotFound("Video not found"))?;

    if playlist.owner_id != actor {
        return Err(ApiError::Forbidden(
            "You are not authorized to modify this playlist",
        ));
    }
    if video.owner_id != actor {
        return Err(ApiError::Forbidden(
            "You are not authorized to add this video to a playlist",
        ));
    }

    Ok(())
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct MembershipResponse {
    playlist_id: i64,
    video_id: i64,
    changed: bool,
}

/// PATCH /playlists/add/:videoId/:playlistId - Add a video (idempotent)
async fn add_video_to_playlist(
    State(state): State<Arc<AppState>>,
    AuthUser(actor): AuthUser,
    Path((video_id, playlist_id)): Path<(String, String)>,
) -> Result<ApiResponse<MembershipResponse>, ApiError> {
    let video_id = parse_id(&video_id, "videoId")?;
    let playlist_id = parse_id(&playlist_id, "playlistId")?;

    check_playlist_and_video(&state, actor, playlist_id, video_id).await?;

    let changed = playlists::add_video(&state.db, playlist_id, video_id)
        .await
        .log_500("Add video to playlist error")?;

    Ok(ApiResponse::ok(
        MembershipResponse {
            playlist_id,
            video_id,
            changed,
        },
        "Added video to the playlist successfully",
    ))
}

/// PATCH /playlists/remove/:videoId/:playlistId - Remove a video
async fn remove_video_from_playlist(
    State(state): State<Arc<AppState>>,
    AuthUser(actor): AuthUser,
    Path((video_id, playlist_id)): Path<(String, String)>,
) -> Result<ApiResponse<MembershipResponse>, ApiError> {
    let video_id = parse_id(&video_id, "videoId")?;
    let playlist_id = parse_id(&playlist_id, "playlistId")?;

    check_playlist_and_video(&state, actor, playlist_id, video_id).await?;

    let changed = playlists::remove_video(&state.db, playlist_id, video_id)
        .await
        .log_500("Remove video from playlist error")?;

    Ok(ApiResponse::ok(
        MembershipResponse {
            playlist_id,
            video_id,
            changed,
        },
        "Removed video from playlist successfully",
    ))
}

/// PATCH /playlists/:playlistId - Rename/redescribe. Owner only.
async fn update_playlist(
    State(state): State<Arc<AppState>>,
    AuthUser(actor): AuthUser,
    Path(playlist_id): Path<String>,
    Json(body): Json<PlaylistBody>,
) -> Result<ApiResponse<PlaylistRecordResponse>, ApiError> {
    let playlist_id = parse_id(&playlist_id, "playlistId")?;
    let (name, description) = require_name_description(&body)?;

    let playlist = playlists::get_record(&state.db, playlist_id)
        .await
        .log_500("Get playlist error")?
        .ok_or(ApiError::NotFound("Playlist not found"))?;

    if playlist.owner_id != actor {
        return Err(ApiError::Forbidden(
            "You are not authorized to edit this playlist",
        ));
    }

    let updated = playlists::update_details(&state.db, playlist_id, name, description)
        .await
        .log_500("Update playlist error")?
        .ok_or(ApiError::Internal)?;

    Ok(ApiResponse::ok(
        updated.into(),
        "Playlist updated successfully",
    ))
}

/// DELETE /playlists/:playlistId - Delete a playlist. Owner only.
async fn delete_playlist(
    State(state): State<Arc<AppState>>,
    AuthUser(actor): AuthUser,
    Path(playlist_id): Path<String>,
) -> Result<ApiResponse<serde_json::Value>, ApiError> {
    let playlist_id = parse_id(&playlist_id, "playlistId")?;

    let playlist = playlists::get_record(&state.db, playlist_id)
        .await
        .log_500("Get playlist error")?
        .ok_or(ApiError::NotFound("Playlist not found"))?;

    if playlist.owner_id != actor {
        return Err(ApiError::Forbidden(
            "You are not authorized to delete this playlist",
        ));
    }

    let deleted = playlists::delete_record(&state.db, playlist_id)
        .await
        .log_500("Delete playlist error")?;
    if !deleted {
        return Err(ApiError::Internal);
    }

    Ok(ApiResponse::ok(
        serde_json::json!({}),
        "Playlist deleted successfully",
    ))
}
