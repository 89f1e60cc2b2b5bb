//! Tweet endpoints (/tweets/*)

use axum::{
    Json, Router,
    extract::{Path, State},
    routing::{get, post},
};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::sync::Arc;

use crate::AppState;
use crate::domain::{likes, tweets};
use crate::routes::auth::AuthUser;
use crate::routes::dto::OwnerDto;
use crate::routes::parse_id;
use crate::services::error::{ApiError, ApiResponse, LogErr};

pub fn routes() -> Router<Arc<AppState>> {
    Router::new()
        .route("/tweets", post(create_tweet))
        .route("/tweets/user/{userId}", get(user_tweets))
        .route(
            "/tweets/{tweetId}",
            axum::routing::patch(update_tweet).delete(delete_tweet),
        )
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct TweetRecordResponse {
    id: i64,
    owner_id: i64,
    content: String,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

impl From<tweets::TweetRecord> for TweetRecordResponse {
    fn from(t: tweets::TweetRecord) -> Self {
        Self {
            id: t.id,
            owner_id: t.owner_id,
            content: t.content,
            created_at: t.created_at,
            updated_at: t.updated_at,
        }
    }
}

#[derive(Deserialize)]
struct TweetBody {
    content: Option<String>,
}

fn require_content(body: &TweetBody) -> Result<&str, ApiError> {
    body.content
        .as_deref()
        .map(str::trim)
        .filter(|c| !c.is_empty())
        .ok_or_else(|| ApiError::validation("Content is required"))
}

/// POST /tweets - Create a tweet
async fn create_tweet(
    State(state): State<Arc<AppState>>,
    AuthUser(actor): AuthUser,
    Json(body): Json<TweetBody>,
) -> Result<ApiResponse<TweetRecordResponse>, ApiError> {
    let content = require_content(&body)?.to_string();

    let tweet = tweets::insert(&state.db, actor, &content)
        .await
        .log_500("Create tweet error")?;

    Ok(ApiResponse::created(
        tweet.into(),
        "Tweet created successfully",
    ))
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct TweetDto {
    id: i64,
    content: String,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
    likes_count: i64,
    is_liked: bool,
    owner: OwnerDto,
}

/// GET /tweets/user/:userId - A user's tweets, newest-first, annotated for
/// the viewer
async fn user_tweets(
    State(state): State<Arc<AppState>>,
    AuthUser(viewer): AuthUser,
    Path(user_id): Path<String>,
) -> Result<ApiResponse<Vec<TweetDto>>, ApiError> {
    let user_id = parse_id(&user_id, "userId")?;

    let rows = tweets::list_for_user(&state.db, user_id, viewer)
        .await
        .log_500("List tweets error")?;

    let items = rows
        .into_iter()
        .map(|t| TweetDto {
            id: t.id,
            content: t.content,
            created_at: t.created_at,
            updated_at: t.updated_at,
            likes_count: t.likes_count,
            is_liked: t.is_liked,
            owner: OwnerDto {
                id: t.owner_id,
                username: t.owner_username,
                full_name: Some(t.owner_full_name),
                avatar_url: t.owner_avatar_url,
            },
        })
        .collect();

    Ok(ApiResponse::ok(items, "Tweets fetched successfully"))
}

/// PATCH /tweets/:tweetId - Edit a tweet. Owner only.
async fn update_tweet(
    State(state): State<Arc<AppState>>,
    AuthUser(actor): AuthUser,
    Path(tweet_id): Path<String>,
    Json(body): Json<TweetBody>,
) -> Result<ApiResponse<TweetRecordResponse>, ApiError> {
    let tweet_id = parse_id(&tweet_id, "tweetId")?;
    let content = require_content(&body)?.to_string();

    let tweet = tweets::get_record(&state.db, tweet_id)
        .await
        .log_500("Get tweet error")?
        .ok_or(ApiError::NotFound("Tweet not found"))?;

    if tweet.owner_id != actor {
        return Err(ApiError::Forbidden(
            "You are not authorized to update this tweet",
        ));
    }

    let updated = tweets::update_content(&state.db, tweet_id, &content)
        .await
        .log_500("Update tweet error")?
        .ok_or(ApiError::Internal)?;

    Ok(ApiResponse::ok(updated.into(), "Tweet updated successfully"))
}

/// DELETE /tweets/:tweetId - Delete a tweet and the likes on it. Owner only.
async fn delete_tweet(
    State(state): State<Arc<AppState>>,
    AuthUser(actor): AuthUser,
    Path(tweet_id): Path<String>,
) -> Result<ApiResponse<serde_json::Value>, ApiError> {
    let tweet_id = parse_id(&tweet_id, "tweetId")?;

    let tweet = tweets::get_record(&state.db, tweet_id)
        .await
        .log_500("Get tweet error")?
        .ok_or(ApiError::NotFound("Tweet not found"))?;

    if tweet.owner_id != actor {
        return Err(ApiError::Forbidden(
            "You are not authorized to delete this tweet",
        ));
    }

    let mut tx = state.db.begin().await.log_500("Begin tx error")?;

    likes::delete_for_tweet(&mut *tx, tweet_id)
        .await
        .log_500("Cascade tweet likes error")?;
    let deleted = tweets::delete_record(&mut *tx, tweet_id)
        .await
        .log_500("Delete tweet error")?;
    if !deleted {
        return Err(ApiError::Internal);
    }

    tx.commit().await.log_500("Commit tweet delete error")?;

    Ok(ApiResponse::ok(
        serde_json::json!({ "tweetId": tweet_id }),
        "Tweet deleted successfully",
    ))
}
