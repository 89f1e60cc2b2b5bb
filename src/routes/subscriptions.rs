//! Subscription endpoints (/subscriptions/*)

use axum::{
    Router,
    extract::{Path, State},
    routing::get,
};
use chrono::{DateTime, Utc};
use serde::Serialize;
use std::sync::Arc;

use crate::AppState;
use crate::domain::{subscriptions, users};
use crate::routes::auth::AuthUser;
use crate::routes::parse_id;
use crate::services::error::{ApiError, ApiResponse, LogErr};

pub fn routes() -> Router<Arc<AppState>> {
    Router::new()
        .route(
            "/subscriptions/c/{channelId}",
            get(channel_subscribers).post(toggle_subscription),
        )
        .route("/subscriptions/u/{subscriberId}", get(subscribed_channels))
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct ToggleResponse {
    is_subscribed: bool,
}

/// POST /subscriptions/c/:channelId - Toggle the actor's subscription to a
/// channel. Subscribing to yourself is rejected.
async fn toggle_subscription(
    State(state): State<Arc<AppState>>,
    AuthUser(actor): AuthUser,
    Path(channel_id): Path<String>,
) -> Result<ApiResponse<ToggleResponse>, ApiError> {
    let channel_id = parse_id(&channel_id, "channelId")?;

    if channel_id == actor {
        return Err(ApiError::validation("You cannot subscribe to yourself"));
    }

    users::get_by_id(&state.db, channel_id)
        .await
        .log_500("Get channel error")?
        .ok_or(ApiError::NotFound("Channel not found"))?;

    let is_subscribed = subscriptions::toggle(&state.db, actor, channel_id)
        .await
        .log_500("Toggle subscription error")?;

    Ok(ApiResponse::ok(
        ToggleResponse { is_subscribed },
        "Subscription toggled",
    ))
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct SubscriberDto {
    id: i64,
    username: String,
    full_name: String,
    avatar_url: String,
    subscribed_at: DateTime<Utc>,
}

/// GET /subscriptions/c/:channelId - Users subscribed to a channel
async fn channel_subscribers(
    State(state): State<Arc<AppState>>,
    AuthUser(_viewer): AuthUser,
    Path(channel_id): Path<String>,
) -> Result<ApiResponse<Vec<SubscriberDto>>, ApiError> {
    let channel_id = parse_id(&channel_id, "channelId")?;

    users::get_by_id(&state.db, channel_id)
        .await
        .log_500("Get channel error")?
        .ok_or(ApiError::NotFound("Channel not found"))?;

    let rows = subscriptions::list_subscribers(&state.db, channel_id)
        .await
        .log_500("List subscribers error")?;

    let items = rows
        .into_iter()
        .map(|s| SubscriberDto {
            id: s.id,
            username: s.username,
            full_name: s.full_name,
            avatar_url: s.avatar_url,
            subscribed_at: s.subscribed_at,
        })
        .collect();

    Ok(ApiResponse::ok(items, "Subscribers fetched successfully"))
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct SubscribedChannelDto {
    id: i64,
    username: String,
    full_name: String,
    avatar_url: String,
    subscribed_at: DateTime<Utc>,
    subscribers_count: i64,
}

/// GET /subscriptions/u/:subscriberId - Channels a user subscribes to
async fn subscribed_channels(
    State(state): State<Arc<AppState>>,
    AuthUser(_viewer): AuthUser,
    Path(subscriber_id): Path<String>,
) -> Result<ApiResponse<Vec<SubscribedChannelDto>>, ApiError> {
    let subscriber_id = parse_id(&subscriber_id, "subscriberId")?;

    users::get_by_id(&state.db, subscriber_id)
        .await
        .log_500("Get user error")?
        .ok_or(ApiError::NotFound("User not found"))?;

    let rows = subscriptions::list_subscribed_channels(&state.db, subscriber_id)
        .await
        .log_500("List subscribed channels error")?;

    let items = rows
        .into_iter()
        .map(|c| SubscribedChannelDto {
            id: c.id,
            username: c.username,
            full_name: c.full_name,
            avatar_url: c.avatar_url,
            subscribed_at: c.subscribed_at,
            subscribers_count: c.subscribers_count,
        })
        .collect();

    Ok(ApiResponse::ok(
        items,
        "Subscribed channels fetched successfully",
    ))
}
