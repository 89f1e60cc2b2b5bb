//! Like endpoints (/likes/*)

use axum::{
    Router,
    extract::{Path, State},
    routing::{get, post},
};
use chrono::{DateTime, Utc};
use serde::Serialize;
use std::sync::Arc;

use crate::AppState;
use crate::domain::likes::{self, LikeTarget};
use crate::domain::{comments, tweets, videos};
use crate::routes::auth::AuthUser;
use crate::routes::dto::{OwnerDto, VideoSummaryDto};
use crate::routes::parse_id;
use crate::services::error::{ApiError, ApiResponse, LogErr};

pub fn routes() -> Router<Arc<AppState>> {
    Router::new()
        .route("/likes/toggle/v/{videoId}", post(toggle_video_like))
        .route("/likes/toggle/c/{commentId}", post(toggle_comment_like))
        .route("/likes/toggle/t/{tweetId}", post(toggle_tweet_like))
        .route("/likes/videos", get(liked_videos))
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct ToggleResponse {
    is_liked: bool,
}

/// POST /likes/toggle/v/:videoId - Toggle the viewer's like on a video
async fn toggle_video_like(
    State(state): State<Arc<AppState>>,
    AuthUser(actor): AuthUser,
    Path(video_id): Path<String>,
) -> Result<ApiResponse<ToggleResponse>, ApiError> {
    let video_id = parse_id(&video_id, "videoId")?;

    videos::get_record(&state.db, video_id)
        .await
        .log_500("Get video error")?
        .ok_or(ApiError::NotFound("Video not found"))?;

    let is_liked = likes::toggle(&state.db, actor, LikeTarget::Video(video_id))
        .await
        .log_500("Toggle video like error")?;

    Ok(ApiResponse::ok(ToggleResponse { is_liked }, "Like toggled"))
}

/// POST /likes/toggle/c/:commentId - Toggle the viewer's like on a comment
async fn toggle_comment_like(
    State(state): State<Arc<AppState>>,
    AuthUser(actor): AuthUser,
    Path(comment_id): Path<String>,
) -> Result<ApiResponse<ToggleResponse>, ApiError> {
    let comment_id = parse_id(&comment_id, "commentId")?;

    comments::get_record(&state.db, comment_id)
        .await
        .log_500("Get comment error")?
        .ok_or(ApiError::NotFound("Comment not found"))?;

    let is_liked = likes::toggle(&state.db, actor, LikeTarget::Comment(comment_id))
        .await
        .log_500("Toggle comment like error")?;

    Ok(ApiResponse::ok(ToggleResponse { is_liked }, "Like toggled"))
}

/// POST /likes/toggle/t/:tweetId - Toggle the viewer's like on a tweet
async fn toggle_tweet_like(
    State(state): State<Arc<AppState>>,
    AuthUser(actor): AuthUser,
    Path(tweet_id): Path<String>,
) -> Result<ApiResponse<ToggleResponse>, ApiError> {
    let tweet_id = parse_id(&tweet_id, "tweetId")?;

    tweets::get_record(&state.db, tweet_id)
        .await
        .log_500("Get tweet error")?
        .ok_or(ApiError::NotFound("Tweet not found"))?;

    let is_liked = likes::toggle(&state.db, actor, LikeTarget::Tweet(tweet_id))
        .await
        .log_500("Toggle tweet like error")?;

    Ok(ApiResponse::ok(ToggleResponse { is_liked }, "Like toggled"))
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct LikedVideoDto {
    liked_at: DateTime<Utc>,
    is_published: bool,
    #[serde(flatten)]
    video: VideoSummaryDto,
}

/// GET /likes/videos - All videos the viewer has liked, newest-like-first
async fn liked_videos(
    State(state): State<Arc<AppState>>,
    AuthUser(viewer): AuthUser,
) -> Result<ApiResponse<Vec<LikedVideoDto>>, ApiError> {
    let rows = likes::liked_videos(&state.db, viewer)
        .await
        .log_500("List liked videos error")?;

    let items = rows
        .into_iter()
        .map(|row| LikedVideoDto {
            liked_at: row.liked_at,
            is_published: row.is_published,
            video: VideoSummaryDto {
                id: row.video_id,
                video_url: row.video_url,
                thumbnail_url: row.thumbnail_url,
                title: row.title,
                description: row.description,
                duration: row.duration,
                views: row.views,
                created_at: row.video_created_at,
                owner: Some(OwnerDto {
                    id: row.owner_id,
                    username: row.owner_username,
                    full_name: Some(row.owner_full_name),
                    avatar_url: row.owner_avatar_url,
                }),
            },
        })
        .collect();

    Ok(ApiResponse::ok(items, "Liked videos fetched successfully"))
}
