//! Comment endpoints (/comments/*)

use axum::{
    Json, Router,
    extract::{Path, Query, State},
    routing::get,
};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::sync::Arc;

use crate::AppState;
use crate::domain::{comments, likes, videos};
use crate::models::{Page, PageParams, PageQuery};
use crate::routes::auth::AuthUser;
use crate::routes::dto::OwnerDto;
use crate::routes::parse_id;
use crate::services::error::{ApiError, ApiResponse, LogErr};

pub fn routes() -> Router<Arc<AppState>> {
    Router::new()
        .route("/comments/{videoId}", get(list_comments).post(add_comment))
        .route(
            "/comments/c/{commentId}",
            axum::routing::patch(update_comment).delete(delete_comment),
        )
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct CommentDto {
    id: i64,
    content: String,
    created_at: DateTime<Utc>,
    likes_count: i64,
    is_liked: bool,
    owner: OwnerDto,
}

impl From<comments::CommentThreadRow> for CommentDto {
    fn from(row: comments::CommentThreadRow) -> Self {
        Self {
            id: row.id,
            content: row.content,
            created_at: row.created_at,
            likes_count: row.likes_count,
            is_liked: row.is_liked,
            owner: OwnerDto {
                id: row.owner_id,
                username: row.owner_username,
                full_name: Some(row.owner_full_name),
                avatar_url: row.owner_avatar_url,
            },
        }
    }
}

/// GET /comments/:videoId - Paginated comment thread, newest-first
async fn list_comments(
    State(state): State<Arc<AppState>>,
    AuthUser(viewer): AuthUser,
    Path(video_id): Path<String>,
    Query(query): Query<PageQuery>,
) -> Result<ApiResponse<Page<CommentDto>>, ApiError> {
    let video_id = parse_id(&video_id, "videoId")?;
    let params = PageParams::from_query(&query);

    videos::get_record(&state.db, video_id)
        .await
        .log_500("Get video error")?
        .ok_or(ApiError::NotFound("Video not found"))?;

    let total = comments::count_for_video(&state.db, video_id)
        .await
        .log_500("Count comments error")?;

    let rows = comments::list_for_video(&state.db, video_id, viewer, params.limit, params.offset())
        .await
        .log_500("List comments error")?;

    let items = rows.into_iter().map(CommentDto::from).collect();
    Ok(ApiResponse::ok(
        Page::new(items, total, params),
        "Comments fetched successfully",
    ))
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct CommentRecordResponse {
    id: i64,
    owner_id: i64,
    video_id: i64,
    content: String,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

impl From<comments::CommentRecord> for CommentRecordResponse {
    fn from(c: comments::CommentRecord) -> Self {
        Self {
            id: c.id,
            owner_id: c.owner_id,
            video_id: c.video_id,
            content: c.content,
            created_at: c.created_at,
            updated_at: c.updated_at,
        }
    }
}

#[derive(Deserialize)]
struct CommentBody {
    content: Option<String>,
}

fn require_content(body: &CommentBody) -> Result<&str, ApiError> {
    body.content
        .as_deref()
        .map(str::trim)
        .filter(|c| !c.is_empty())
        .ok_or_else(|| ApiError::validation("Content is required"))
}

/// POST /comments/:videoId - Add a comment to a video
async fn add_comment(
    State(state): State<Arc<AppState>>,
    AuthUser(actor): AuthUser,
    Path(video_id): Path<String>,
    Json(body): Json<CommentBody>,
) -> Result<ApiResponse<CommentRecordResponse>, ApiError> {
    let video_id = parse_id(&video_id, "videoId")?;
    let content = require_content(&body)?.to_string();

    videos::get_record(&state.db, video_id)
        .await
        .log_500("Get video error")?
        .ok_or(ApiError::NotFound("Video not found"))?;

    let comment = comments::insert(&state.db, actor, video_id, &content)
        .await
        .log_500("Insert comment error")?;

    Ok(ApiResponse::created(
        comment.into(),
        "Comment added successfully",
    ))
}

/// PATCH /comments/c/:commentId - Edit a comment. Owner only.
async fn update_comment(
    State(state): State<Arc<AppState>>,
    AuthUser(actor): AuthUser,
    Path(comment_id): Path<String>,
    Json(body): Json<CommentBody>,
) -> Result<ApiResponse<CommentRecordResponse>, ApiError> {
    let comment_id = parse_id(&comment_id, "commentId")?;
    let content = require_content(&body)?.to_string();

    let comment = comments::get_record(&state.db, comment_id)
        .await
        .log_500("Get comment error")?
        .ok_or(ApiError::NotFound("Comment not found"))?;

    if comment.owner_id != actor {
        return Err(ApiError::Forbidden(
            "You are not authorized to update this comment",
        ));
    }

    let updated = comments::update_content(&state.db, comment_id, &content)
        .await
        .log_500("Update comment error")?
        .ok_or(ApiError::Internal)?;

    Ok(ApiResponse::ok(
        updated.into(),
        "Comment edited successfully",
    ))
}

/// DELETE /comments/c/:commentId - Delete a comment and the likes on it.
/// Owner only.
async fn delete_comment(
    State(state): State<Arc<AppState>>,
    AuthUser(actor): AuthUser,
    Path(comment_id): Path<String>,
) -> Result<ApiResponse<serde_json::Value>, ApiError> {
    let comment_id = parse_id(&comment_id, "commentId")?;

    let comment = comments::get_record(&state.db, comment_id)
        .await
        .log_500("Get comment error")?
        .ok_or(ApiError::NotFound("Comment not found"))?;

    if comment.owner_id != actor {
        return Err(ApiError::Forbidden(
            "You are not authorized to delete this comment",
        ));
    }

    let mut tx = state.db.begin().await.log_500("Begin tx error")?;

    likes::delete_for_comment(&mut *tx, comment_id)
        .await
        .log_500("Cascade comment likes error")?;
    let deleted = comments::delete_record(&mut *tx, comment_id)
        .await
        .log_500("Delete comment error")?;
    if !deleted {
        return Err(ApiError::Internal);
    }

    tx.commit().await.log_500("Commit comment delete error")?;

    Ok(ApiResponse::ok(
        serde_json::json!({ "commentId": comment_id }),
        "Comment deleted successfully",
    ))
}
