//! Identity and profile endpoints (/users/*)
//!
//! Registration and login are rate-limited per client IP; everything else
//! rides on the access-token cookie via the `AuthUser` extractor.

use axum::{
    Json, Router,
    extract::{Multipart, Path, State},
    http::header::SET_COOKIE,
    response::{IntoResponse, Response},
    routing::{get, patch, post},
};
use axum_extra::extract::CookieJar;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tower_governor::{
    GovernorLayer, governor::GovernorConfigBuilder, key_extractor::SmartIpKeyExtractor,
};

use crate::AppState;
use crate::domain::{self, users};
use crate::routes::auth::AuthUser;
use crate::routes::MultipartForm;
use crate::services::cookies;
use crate::services::error::{ApiError, ApiResponse, LogErr};
use crate::services::{password, session};
use crate::storage::{MediaStore, StoredFile, get_extension};

pub fn routes() -> Router<Arc<AppState>> {
    // Rate limit: 10 requests per minute for credential endpoints to slow
    // down brute force attempts
    let rate_limit_config = GovernorConfigBuilder::default()
        .per_second(6)
        .burst_size(10)
        .key_extractor(SmartIpKeyExtractor)
        .finish()
        .expect("Failed to build rate limit config");

    let rate_limit_layer = GovernorLayer {
        config: rate_limit_config.into(),
    };

    let credential_routes = Router::new()
        .route("/users/register", post(register))
        .route("/users/login", post(login))
        .layer(rate_limit_layer);

    Router::new()
        .merge(credential_routes)
        .route("/users/logout", post(logout))
        .route("/users/refresh-token", post(refresh_token))
        .route("/users/change-password", post(change_password))
        .route("/users/current-user", get(current_user))
        .route("/users/update-account", patch(update_account))
        .route("/users/avatar", patch(update_avatar))
        .route("/users/cover-image", patch(update_cover))
        .route("/users/c/{username}", get(channel_profile))
        .route("/users/history", get(watch_history))
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct UserDto {
    id: i64,
    username: String,
    email: String,
    full_name: String,
    avatar_url: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    cover_url: Option<String>,
    created_at: DateTime<Utc>,
}

impl From<users::UserRecord> for UserDto {
    fn from(u: users::UserRecord) -> Self {
        Self {
            id: u.id,
            username: u.username,
            email: u.email,
            full_name: u.full_name,
            avatar_url: u.avatar_url,
            cover_url: u.cover_url,
            created_at: u.created_at,
        }
    }
}

async fn upload_field(
    storage: &MediaStore,
    kind: &str,
    owner: i64,
    field: &crate::routes::UploadedField,
) -> Result<StoredFile, ApiError> {
    let path = MediaStore::object_path(kind, owner, get_extension(&field.content_type));
    storage
        .upload(&path, field.data.clone())
        .await
        .log_500("Media upload error")
}

/// POST /users/register - Create an account (multipart: fullName, email,
/// username, password, avatar file, optional coverImage file)
async fn register(
    State(state): State<Arc<AppState>>,
    multipart: Multipart,
) -> Result<ApiResponse<UserDto>, ApiError> {
    let form = MultipartForm::collect(multipart).await?;

    let full_name = form.require_text("fullName")?.to_string();
    let email = users::normalize_handle(form.require_text("email")?);
    let username = users::normalize_handle(form.require_text("username")?);
    let plain_password = form.require_text("password")?;

    if !email.contains('@') {
        return Err(ApiError::validation("Invalid email address"));
    }
    if plain_password.len() < 8 {
        return Err(ApiError::validation(
            "Password must be at least 8 characters",
        ));
    }

    let avatar_field = form.require_file("avatar")?;
    let cover_field = form.file("coverImage").filter(|f| !f.data.is_empty());

    let password_hash = password::hash_password(plain_password).log_500("Password hash error")?;

    // Upload before insert; avatar_url is NOT NULL on the user row. Objects
    // are cleaned up if the insert loses the uniqueness race.
    let avatar = upload_field(&state.storage, "avatar", 0, avatar_field).await?;
    let mut cover = None;
    if let Some(field) = cover_field {
        cover = Some(upload_field(&state.storage, "cover", 0, field).await?);
    }

    let created = users::create_user(
        &state.db,
        &username,
        &email,
        &full_name,
        &password_hash,
        &avatar,
        cover.as_ref(),
    )
    .await;

    let user = match created {
        Ok(user) => user,
        Err(e) => {
            state
                .storage
                .delete_best_effort(&avatar.path, "register rollback")
                .await;
            if let Some(c) = &cover {
                state
                    .storage
                    .delete_best_effort(&c.path, "register rollback")
                    .await;
            }
            if domain::is_unique_violation(&e) {
                return Err(ApiError::Conflict(
                    "User with this email or username already exists",
                ));
            }
            return Err(e).log_500("Create user error");
        }
    };

    Ok(ApiResponse::created(
        user.into(),
        "User registered successfully",
    ))
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct LoginBody {
    username: Option<String>,
    email: Option<String>,
    password: Option<String>,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct LoginData {
    user: UserDto,
    access_token: String,
    refresh_token: String,
}

/// POST /users/login - Verify credentials, issue tokens, and set session
/// cookies. Tokens are also returned in the body for non-browser clients.
async fn login(
    State(state): State<Arc<AppState>>,
    Json(body): Json<LoginBody>,
) -> Result<Response, ApiError> {
    let identifier = body
        .username
        .as_deref()
        .or(body.email.as_deref())
        .map(users::normalize_handle)
        .filter(|s| !s.is_empty())
        .ok_or_else(|| ApiError::validation("username or email is required"))?;
    let plain_password = body
        .password
        .as_deref()
        .filter(|s| !s.is_empty())
        .ok_or_else(|| ApiError::validation("password is required"))?;

    let user = users::get_by_username_or_email(&state.db, &identifier)
        .await
        .log_500("Login lookup error")?
        .ok_or(ApiError::NotFound("User does not exist"))?;

    let valid = password::verify_password(plain_password, &user.password_hash)
        .log_500("Password verify error")?;
    if !valid {
        return Err(ApiError::Unauthorized("Invalid user credentials"));
    }

    let access_token =
        session::create_access_token(user.id, &state.jwt_secret).log_500("Access token error")?;
    let refresh_token = session::create_refresh_token(user.id, &state.db)
        .await
        .log_500("Refresh token error")?;

    let access_cookie = cookies::build_access_cookie(&access_token)?;
    let refresh_cookie = cookies::build_refresh_cookie(&refresh_token)?;

    let mut response = ApiResponse::ok(
        LoginData {
            user: user.into(),
            access_token,
            refresh_token,
        },
        "User logged in successfully",
    )
    .into_response();
    response.headers_mut().append(SET_COOKIE, access_cookie);
    response.headers_mut().append(SET_COOKIE, refresh_cookie);

    Ok(response)
}

/// POST /users/logout - Revoke the refresh token and clear both cookies
async fn logout(
    State(state): State<Arc<AppState>>,
    AuthUser(_user_id): AuthUser,
    jar: CookieJar,
) -> Response {
    if let Some(refresh) = jar.get(cookies::config::REFRESH_TOKEN_NAME) {
        if let Err(e) = session::revoke_refresh_token(refresh.value(), &state.db).await {
            // Logout still succeeds client-side when revocation fails
            eprintln!("Refresh token revoke error: {}", e);
        }
    }

    let mut response =
        ApiResponse::ok(serde_json::json!({}), "User logged out successfully").into_response();
    response
        .headers_mut()
        .append(SET_COOKIE, cookies::build_clear_access_cookie());
    response
        .headers_mut()
        .append(SET_COOKIE, cookies::build_clear_refresh_cookie());
    response
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct RefreshBody {
    refresh_token: Option<String>,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct TokenPair {
    access_token: String,
    refresh_token: String,
}

/// POST /users/refresh-token - Rotate the refresh token and mint a new access
/// token. The old refresh token is consumed whether it comes from the cookie
/// or the body.
async fn refresh_token(
    State(state): State<Arc<AppState>>,
    jar: CookieJar,
    body: Option<Json<RefreshBody>>,
) -> Result<Response, ApiError> {
    let old_token = jar
        .get(cookies::config::REFRESH_TOKEN_NAME)
        .map(|c| c.value().to_string())
        .or_else(|| body.and_then(|Json(b)| b.refresh_token))
        .filter(|s| !s.is_empty())
        .ok_or(ApiError::Unauthorized("Refresh token is required"))?;

    // Invalid or expired tokens are expected here, so no error log
    let (user_id, new_refresh) = session::rotate_refresh_token(&old_token, &state.db)
        .await
        .map_err(|_| ApiError::Unauthorized("Invalid or expired refresh token"))?;

    let access_token =
        session::create_access_token(user_id, &state.jwt_secret).log_500("Access token error")?;

    let access_cookie = cookies::build_access_cookie(&access_token)?;
    let refresh_cookie = cookies::build_refresh_cookie(&new_refresh)?;

    let mut response = ApiResponse::ok(
        TokenPair {
            access_token,
            refresh_token: new_refresh,
        },
        "Access token refreshed",
    )
    .into_response();
    response.headers_mut().append(SET_COOKIE, access_cookie);
    response.headers_mut().append(SET_COOKIE, refresh_cookie);

    Ok(response)
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct ChangePasswordBody {
    old_password: Option<String>,
    new_password: Option<String>,
}

/// POST /users/change-password - Verify the old password, store a new hash
async fn change_password(
    State(state): State<Arc<AppState>>,
    AuthUser(user_id): AuthUser,
    Json(body): Json<ChangePasswordBody>,
) -> Result<ApiResponse<serde_json::Value>, ApiError> {
    let old_password = body
        .old_password
        .as_deref()
        .filter(|s| !s.is_empty())
        .ok_or_else(|| ApiError::validation("oldPassword is required"))?;
    let new_password = body
        .new_password
        .as_deref()
        .filter(|s| !s.is_empty())
        .ok_or_else(|| ApiError::validation("newPassword is required"))?;
    if new_password.len() < 8 {
        return Err(ApiError::validation(
            "Password must be at least 8 characters",
        ));
    }

    let user = users::get_by_id(&state.db, user_id)
        .await
        .log_500("Get user error")?
        .ok_or(ApiError::Unauthorized("Invalid session"))?;

    let valid = password::verify_password(old_password, &user.password_hash)
        .log_500("Password verify error")?;
    if !valid {
        return Err(ApiError::validation("Invalid old password"));
    }

    let new_hash = password::hash_password(new_password).log_500("Password hash error")?;
    let updated = users::update_password(&state.db, user_id, &new_hash)
        .await
        .log_500("Update password error")?;
    if !updated {
        return Err(ApiError::Internal);
    }

    Ok(ApiResponse::ok(
        serde_json::json!({}),
        "Password changed successfully",
    ))
}

/// GET /users/current-user - The authenticated user's own record
async fn current_user(
    State(state): State<Arc<AppState>>,
    AuthUser(user_id): AuthUser,
) -> Result<ApiResponse<UserDto>, ApiError> {
    // A valid JWT for a deleted user is still unauthorized
    let user = users::get_by_id(&state.db, user_id)
        .await
        .log_500("Get user error")?
        .ok_or(ApiError::Unauthorized("Invalid session"))?;

    Ok(ApiResponse::ok(user.into(), "User fetched successfully"))
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct UpdateAccountBody {
    full_name: Option<String>,
    email: Option<String>,
}

/// PATCH /users/update-account - Update full name and email together
async fn update_account(
    State(state): State<Arc<AppState>>,
    AuthUser(user_id): AuthUser,
    Json(body): Json<UpdateAccountBody>,
) -> Result<ApiResponse<UserDto>, ApiError> {
    let full_name = body
        .full_name
        .as_deref()
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .ok_or_else(|| ApiError::validation("fullName is required"))?;
    let email = body
        .email
        .as_deref()
        .map(users::normalize_handle)
        .filter(|s| !s.is_empty())
        .ok_or_else(|| ApiError::validation("email is required"))?;
    if !email.contains('@') {
        return Err(ApiError::validation("Invalid email address"));
    }

    let updated = users::update_account(&state.db, user_id, full_name, &email).await;
    let user = match updated {
        Ok(user) => user.ok_or(ApiError::Unauthorized("Invalid session"))?,
        Err(e) if domain::is_unique_violation(&e) => {
            return Err(ApiError::Conflict("Email is already in use"));
        }
        Err(e) => return Err(e).log_500("Update account error"),
    };

    Ok(ApiResponse::ok(user.into(), "Account updated successfully"))
}

/// PATCH /users/avatar - Replace the avatar image (multipart: avatar)
async fn update_avatar(
    State(state): State<Arc<AppState>>,
    AuthUser(user_id): AuthUser,
    multipart: Multipart,
) -> Result<ApiResponse<UserDto>, ApiError> {
    let form = MultipartForm::collect(multipart).await?;
    let field = form.require_file("avatar")?;

    let current = users::get_by_id(&state.db, user_id)
        .await
        .log_500("Get user error")?
        .ok_or(ApiError::Unauthorized("Invalid session"))?;

    let avatar = upload_field(&state.storage, "avatar", user_id, field).await?;
    let user = users::update_avatar(&state.db, user_id, &avatar)
        .await
        .log_500("Update avatar error")?
        .ok_or(ApiError::Unauthorized("Invalid session"))?;

    state
        .storage
        .delete_best_effort(&current.avatar_path, "avatar replace")
        .await;

    Ok(ApiResponse::ok(user.into(), "Avatar updated successfully"))
}

/// PATCH /users/cover-image - Replace the cover image (multipart: coverImage)
async fn update_cover(
    State(state): State<Arc<AppState>>,
    AuthUser(user_id): AuthUser,
    multipart: Multipart,
) -> Result<ApiResponse<UserDto>, ApiError> {
    let form = MultipartForm::collect(multipart).await?;
    let field = form.require_file("coverImage")?;

    let current = users::get_by_id(&state.db, user_id)
        .await
        .log_500("Get user error")?
        .ok_or(ApiError::Unauthorized("Invalid session"))?;

    let cover = upload_field(&state.storage, "cover", user_id, field).await?;
    let user = users::update_cover(&state.db, user_id, &cover)
        .await
        .log_500("Update cover error")?
        .ok_or(ApiError::Unauthorized("Invalid session"))?;

    if let Some(old) = current.cover_path {
        state
            .storage
            .delete_best_effort(&old, "cover replace")
            .await;
    }

    Ok(ApiResponse::ok(
        user.into(),
        "Cover image updated successfully",
    ))
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct ChannelProfileDto {
    id: i64,
    username: String,
    full_name: String,
    avatar_url: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    cover_url: Option<String>,
    created_at: DateTime<Utc>,
    subscribers_count: i64,
    subscribed_to_count: i64,
    is_subscribed: bool,
}

/// GET /users/c/:username - Public channel profile annotated with the
/// viewer's subscription state
async fn channel_profile(
    State(state): State<Arc<AppState>>,
    AuthUser(viewer): AuthUser,
    Path(username): Path<String>,
) -> Result<ApiResponse<ChannelProfileDto>, ApiError> {
    let username = users::normalize_handle(&username);
    if username.is_empty() {
        return Err(ApiError::validation("username is required"));
    }

    let profile = users::get_channel_profile(&state.db, &username, viewer)
        .await
        .log_500("Channel profile error")?
        .ok_or(ApiError::NotFound("Channel does not exist"))?;

    Ok(ApiResponse::ok(
        ChannelProfileDto {
            id: profile.id,
            username: profile.username,
            full_name: profile.full_name,
            avatar_url: profile.avatar_url,
            cover_url: profile.cover_url,
            created_at: profile.created_at,
            subscribers_count: profile.subscribers_count,
            subscribed_to_count: profile.subscribed_to_count,
            is_subscribed: profile.is_subscribed,
        },
        "Channel fetched successfully",
    ))
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct WatchHistoryDto {
    id: i64,
    video_url: String,
    thumbnail_url: String,
    title: String,
    description: String,
    duration: f64,
    views: i64,
    watched_at: DateTime<Utc>,
    owner: crate::routes::dto::OwnerDto,
}

/// GET /users/history - The viewer's watched videos, most recent first
async fn watch_history(
    State(state): State<Arc<AppState>>,
    AuthUser(user_id): AuthUser,
) -> Result<ApiResponse<Vec<WatchHistoryDto>>, ApiError> {
    let rows = users::list_watch_history(&state.db, user_id)
        .await
        .log_500("Watch history error")?;

    let items = rows
        .into_iter()
        .map(|r| WatchHistoryDto {
            id: r.video_id,
            video_url: r.video_url,
            thumbnail_url: r.thumbnail_url,
            title: r.title,
            description: r.description,
            duration: r.duration,
            views: r.views,
            watched_at: r.watched_at,
            owner: crate::routes::dto::OwnerDto {
                id: r.owner_id,
                username: r.owner_username,
                full_name: Some(r.owner_full_name),
                avatar_url: r.owner_avatar_url,
            },
        })
        .collect();

    Ok(ApiResponse::ok(items, "Watch history fetched successfully"))
}
