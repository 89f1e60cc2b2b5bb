//! Video endpoints (/videos/*)

use axum::{
    Router,
    extract::{Multipart, Path, Query, State},
    routing::{get, patch},
};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::sync::Arc;

use crate::AppState;
use crate::domain::{comments, likes, playlists, users, videos};
use crate::media;
use crate::models::{Page, PageParams, PageQuery};
use crate::routes::auth::AuthUser;
use crate::routes::dto::{OwnerDto, VideoSummaryDto};
use crate::routes::{MultipartForm, parse_id};
use crate::services::error::{ApiError, ApiResponse, LogErr};
use crate::storage::{MediaStore, get_extension};

pub fn routes() -> Router<Arc<AppState>> {
    Router::new()
        .route("/videos", get(list_videos).post(publish_video))
        .route(
            "/videos/{videoId}",
            get(get_video).patch(update_video).delete(delete_video),
        )
        .route("/videos/toggle/publish/{videoId}", patch(toggle_publish))
}

#[derive(Deserialize)]
struct FeedQuery {
    page: Option<i64>,
    limit: Option<i64>,
    query: Option<String>,
    #[serde(rename = "sortBy")]
    sort_by: Option<String>,
    #[serde(rename = "sortType")]
    sort_type: Option<String>,
    #[serde(rename = "userId")]
    user_id: Option<String>,
}

impl From<videos::VideoFeedRow> for VideoSummaryDto {
    fn from(row: videos::VideoFeedRow) -> Self {
        Self {
            id: row.id,
            video_url: row.video_url,
            thumbnail_url: row.thumbnail_url,
            title: row.title,
            description: row.description,
            duration: row.duration,
            views: row.views,
            created_at: row.created_at,
            owner: Some(OwnerDto {
                id: row.owner_id,
                username: row.owner_username,
                full_name: None,
                avatar_url: row.owner_avatar_url,
            }),
        }
    }
}

/// GET /videos - Public feed: published videos with optional text search,
/// owner filter, sorting, and pagination
async fn list_videos(
    State(state): State<Arc<AppState>>,
    AuthUser(_viewer): AuthUser,
    Query(query): Query<FeedQuery>,
) -> Result<ApiResponse<Page<VideoSummaryDto>>, ApiError> {
    let params = PageParams::from_query(&PageQuery {
        page: query.page,
        limit: query.limit,
    });

    let owner_filter = match &query.user_id {
        Some(raw) => Some(parse_id(raw, "userId")?),
        None => None,
    };
    let text_query = query.query.as_deref().filter(|q| !q.trim().is_empty());
    let sort = videos::SortField::from_str(query.sort_by.as_deref());
    let order = videos::SortOrder::from_str(query.sort_type.as_deref());

    let total = videos::count_feed(&state.db, text_query, owner_filter)
        .await
        .log_500("Count video feed error")?;

    let rows = videos::list_feed(
        &state.db,
        text_query,
        owner_filter,
        sort,
        order,
        params.limit,
        params.offset(),
    )
    .await
    .log_500("List video feed error")?;

    let items = rows.into_iter().map(VideoSummaryDto::from).collect();
    Ok(ApiResponse::ok(
        Page::new(items, total, params),
        "Videos fetched successfully",
    ))
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct VideoDetailResponse {
    id: i64,
    video_url: String,
    thumbnail_url: String,
    title: String,
    description: String,
    duration: f64,
    views: i64,
    created_at: DateTime<Utc>,
    likes_count: i64,
    is_liked: bool,
    owner: ChannelOwnerDto,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct ChannelOwnerDto {
    id: i64,
    username: String,
    avatar_url: String,
    subscribers_count: i64,
    is_subscribed: bool,
}

/// GET /videos/:videoId - Video detail annotated for the viewer.
/// Side effects: increments the view counter by one and records the video in
/// the viewer's watch history (set semantics).
async fn get_video(
    State(state): State<Arc<AppState>>,
    AuthUser(viewer): AuthUser,
    Path(video_id): Path<String>,
) -> Result<ApiResponse<VideoDetailResponse>, ApiError> {
    let video_id = parse_id(&video_id, "videoId")?;

    let row = videos::get_detail(&state.db, video_id, viewer)
        .await
        .log_500("Get video detail error")?
        .ok_or(ApiError::NotFound("Video not found"))?;

    // The detail was already composed from pre-increment state; the counter
    // bump applies to this fetch.
    videos::increment_views(&state.db, video_id)
        .await
        .log_500("Increment views error")?;

    users::upsert_watch_history(&state.db, viewer, video_id)
        .await
        .log_500("Watch history upsert error")?;

    Ok(ApiResponse::ok(
        VideoDetailResponse {
            id: row.id,
            video_url: row.video_url,
            thumbnail_url: row.thumbnail_url,
            title: row.title,
            description: row.description,
            duration: row.duration,
            views: row.views,
            created_at: row.created_at,
            likes_count: row.likes_count,
            is_liked: row.is_liked,
            owner: ChannelOwnerDto {
                id: row.owner_id,
                username: row.owner_username,
                avatar_url: row.owner_avatar_url,
                subscribers_count: row.subscribers_count,
                is_subscribed: row.is_subscribed,
            },
        },
        "Video details fetched successfully",
    ))
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct VideoRecordResponse {
    id: i64,
    owner_id: i64,
    video_url: String,
    thumbnail_url: String,
    title: String,
    description: String,
    duration: f64,
    views: i64,
    is_published: bool,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

impl From<videos::VideoRecord> for VideoRecordResponse {
    fn from(v: videos::VideoRecord) -> Self {
        Self {
            id: v.id,
            owner_id: v.owner_id,
            video_url: v.video_url,
            thumbnail_url: v.thumbnail_url,
            title: v.title,
            description: v.description,
            duration: v.duration,
            views: v.views,
            is_published: v.is_published,
            created_at: v.created_at,
            updated_at: v.updated_at,
        }
    }
}

async fn upload_field(
    storage: &MediaStore,
    kind: &str,
    owner: i64,
    field: &crate::routes::UploadedField,
) -> Result<crate::storage::StoredFile, ApiError> {
    let path = MediaStore::object_path(kind, owner, get_extension(&field.content_type));
    storage
        .upload(&path, field.data.clone())
        .await
        .log_500("Media upload error")
}

/// POST /videos - Publish a video (multipart: videoFile, thumbnail, title,
/// description). New videos start unpublished.
async fn publish_video(
    State(state): State<Arc<AppState>>,
    AuthUser(owner): AuthUser,
    multipart: Multipart,
) -> Result<ApiResponse<VideoRecordResponse>, ApiError> {
    let form = MultipartForm::collect(multipart).await?;

    let title = form.require_text("title")?.to_string();
    let description = form.require_text("description")?.to_string();
    let video_field = form.require_file("videoFile")?;
    let thumb_field = form.require_file("thumbnail")?;

    // The media object reports its own duration; probe before anything is
    // persisted so a bad upload costs nothing.
    let duration = media::probe_duration(
        &video_field.data,
        get_extension(&video_field.content_type),
    )
    .await
    .log_500("Duration probe error")?;

    let video_file = upload_field(&state.storage, "video", owner, video_field).await?;
    let thumbnail = upload_field(&state.storage, "thumbnail", owner, thumb_field).await?;

    let record = videos::insert(
        &state.db,
        owner,
        &video_file,
        &thumbnail,
        &title,
        &description,
        duration,
    )
    .await
    .log_500("Insert video error")?;

    println!(
        "[videos] user {} published video {} ({:.1}s)",
        owner, record.id, duration
    );

    Ok(ApiResponse::created(
        record.into(),
        "Video uploaded successfully",
    ))
}

/// PATCH /videos/:videoId - Update title/description and replace the
/// thumbnail (multipart). Owner only.
async fn update_video(
    State(state): State<Arc<AppState>>,
    AuthUser(actor): AuthUser,
    Path(video_id): Path<String>,
    multipart: Multipart,
) -> Result<ApiResponse<VideoRecordResponse>, ApiError> {
    let video_id = parse_id(&video_id, "videoId")?;
    let form = MultipartForm::collect(multipart).await?;

    let title = form.require_text("title")?.to_string();
    let description = form.require_text("description")?.to_string();
    let thumb_field = form.require_file("thumbnail")?;

    let video = videos::get_record(&state.db, video_id)
        .await
        .log_500("Get video error")?
        .ok_or(ApiError::NotFound("Video not found"))?;

    if video.owner_id != actor {
        return Err(ApiError::Forbidden(
            "You are not authorized to edit this video",
        ));
    }

    let old_thumbnail_path = video.thumbnail_path.clone();
    let thumbnail = upload_field(&state.storage, "thumbnail", actor, thumb_field).await?;

    let updated = videos::update_details(&state.db, video_id, &title, &description, &thumbnail)
        .await
        .log_500("Update video error")?
        .ok_or(ApiError::Internal)?;

    // The record now points at the new thumbnail; the old object is garbage
    state
        .storage
        .delete_best_effort(&old_thumbnail_path, "update_video")
        .await;

    Ok(ApiResponse::ok(updated.into(), "Video updated successfully"))
}

/// DELETE /videos/:videoId - Delete a video and cascade its likes, comments,
/// playlist memberships, and watch-history rows. Owner only.
///
/// The DB cascade commits as one transaction and decides the response; the
/// two object-storage deletes run afterwards, best-effort.
async fn delete_video(
    State(state): State<Arc<AppState>>,
    AuthUser(actor): AuthUser,
    Path(video_id): Path<String>,
) -> Result<ApiResponse<serde_json::Value>, ApiError> {
    let video_id = parse_id(&video_id, "videoId")?;

    let video = videos::get_record(&state.db, video_id)
        .await
        .log_500("Get video error")?
        .ok_or(ApiError::NotFound("Video not found"))?;

    if video.owner_id != actor {
        return Err(ApiError::Forbidden(
            "You can't delete this video as you are not the owner",
        ));
    }

    let mut tx = state.db.begin().await.log_500("Begin tx error")?;

    likes::delete_for_video(&mut *tx, video_id)
        .await
        .log_500("Cascade likes error")?;
    comments::delete_for_video(&mut *tx, video_id)
        .await
        .log_500("Cascade comments error")?;
    playlists::remove_video_everywhere(&mut *tx, video_id)
        .await
        .log_500("Cascade playlist memberships error")?;
    users::delete_watch_history_for_video(&mut *tx, video_id)
        .await
        .log_500("Cascade watch history error")?;
    let deleted = videos::delete_record(&mut *tx, video_id)
        .await
        .log_500("Delete video error")?;
    if !deleted {
        return Err(ApiError::Internal);
    }

    tx.commit().await.log_500("Commit video delete error")?;

    state
        .storage
        .delete_best_effort(&video.video_path, "delete_video")
        .await;
    state
        .storage
        .delete_best_effort(&video.thumbnail_path, "delete_video")
        .await;

    println!("[videos] user {} deleted video {}", actor, video_id);

    Ok(ApiResponse::ok(
        serde_json::json!({}),
        "Video deleted successfully",
    ))
}

/// PATCH /videos/toggle/publish/:videoId - Flip the published flag. Owner only.
async fn toggle_publish(
    State(state): State<Arc<AppState>>,
    AuthUser(actor): AuthUser,
    Path(video_id): Path<String>,
) -> Result<ApiResponse<VideoRecordResponse>, ApiError> {
    let video_id = parse_id(&video_id, "videoId")?;

    let video = videos::get_record(&state.db, video_id)
        .await
        .log_500("Get video error")?
        .ok_or(ApiError::NotFound("Video not found"))?;

    if video.owner_id != actor {
        return Err(ApiError::Forbidden(
            "You are not authorized to modify this video",
        ));
    }

    let updated = videos::set_published(&state.db, video_id, !video.is_published)
        .await
        .log_500("Toggle publish error")?
        .ok_or(ApiError::Internal)?;

    Ok(ApiResponse::ok(
        updated.into(),
        "Video publish status updated successfully",
    ))
}
