//! User domain - DB queries for users, channel profiles, and watch history
//!
//! All functions use the generic Executor pattern, allowing them to work with
//! both `&PgPool` (for standalone queries) and `&mut PgConnection` (for
//! transactions).

use chrono::{DateTime, Utc};
use sqlx::{Executor, Postgres};

use crate::storage::StoredFile;

#[derive(Debug, sqlx::FromRow)]
pub struct UserRecord {
    pub id: i64,
    pub username: String,
    pub email: String,
    pub full_name: String,
    pub password_hash: String,
    pub avatar_path: String,
    pub avatar_url: String,
    pub cover_path: Option<String>,
    pub cover_url: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

const USER_COLUMNS: &str = "id, username, email, full_name, password_hash, avatar_path, \
     avatar_url, cover_path, cover_url, created_at, updated_at";

/// Lowercase a handle/email the way registration stores them
pub fn normalize_handle(raw: &str) -> String {
    raw.trim().to_lowercase()
}

#[allow(clippy::too_many_arguments)]
pub async fn create_user<'e, E>(
    executor: E,
    username: &str,
    email: &str,
    full_name: &str,
    password_hash: &str,
    avatar: &StoredFile,
    cover: Option<&StoredFile>,
) -> Result<UserRecord, sqlx::Error>
where
    E: Executor<'e, Database = Postgres>,
{
    let sql = format!(
        r#"
        INSERT INTO users (username, email, full_name, password_hash,
                           avatar_path, avatar_url, cover_path, cover_url)
        VALUES ($1, $2, $3, $4, $5, $6, $7, $8)
        RETURNING {USER_COLUMNS}
        "#
    );
    sqlx::query_as(&sql)
        .bind(username)
        .bind(email)
        .bind(full_name)
        .bind(password_hash)
        .bind(&avatar.path)
        .bind(&avatar.url)
        .bind(cover.map(|c| c.path.as_str()))
        .bind(cover.map(|c| c.url.as_str()))
        .fetch_one(executor)
        .await
}

pub async fn get_by_id<'e, E>(executor: E, user_id: i64) -> Result<Option<UserRecord>, sqlx::Error>
where
    E: Executor<'e, Database = Postgres>,
{
    let sql = format!("SELECT {USER_COLUMNS} FROM users WHERE id = $1");
    sqlx::query_as(&sql).bind(user_id).fetch_optional(executor).await
}

/// Login lookup: the identifier may be a username or an email
pub async fn get_by_username_or_email<'e, E>(
    executor: E,
    identifier: &str,
) -> Result<Option<UserRecord>, sqlx::Error>
where
    E: Executor<'e, Database = Postgres>,
{
    let sql = format!("SELECT {USER_COLUMNS} FROM users WHERE username = $1 OR email = $1");
    sqlx::query_as(&sql)
        .bind(identifier)
        .fetch_optional(executor)
        .await
}

pub async fn update_password<'e, E>(
    executor: E,
    user_id: i64,
    password_hash: &str,
) -> Result<bool, sqlx::Error>
where
    E: Executor<'e, Database = Postgres>,
{
    let result =
        sqlx::query("UPDATE users SET password_hash = $2, updated_at = NOW() WHERE id = $1")
            .bind(user_id)
            .bind(password_hash)
            .execute(executor)
            .await?;
    Ok(result.rows_affected() > 0)
}

pub async fn update_account<'e, E>(
    executor: E,
    user_id: i64,
    full_name: &str,
    email: &str,
) -> Result<Option<UserRecord>, sqlx::Error>
where
    E: Executor<'e, Database = Postgres>,
{
    let sql = format!(
        r#"
        UPDATE users SET full_name = $2, email = $3, updated_at = NOW()
        WHERE id = $1
        RETURNING {USER_COLUMNS}
        "#
    );
    sqlx::query_as(&sql)
        .bind(user_id)
        .bind(full_name)
        .bind(email)
        .fetch_optional(executor)
        .await
}

pub async fn update_avatar<'e, E>(
    executor: E,
    user_id: i64,
    avatar: &StoredFile,
) -> Result<Option<UserRecord>, sqlx::Error>
where
    E: Executor<'e, Database = Postgres>,
{
    let sql = format!(
        r#"
        UPDATE users SET avatar_path = $2, avatar_url = $3, updated_at = NOW()
        WHERE id = $1
        RETURNING {USER_COLUMNS}
        "#
    );
    sqlx::query_as(&sql)
        .bind(user_id)
        .bind(&avatar.path)
        .bind(&avatar.url)
        .fetch_optional(executor)
        .await
}

pub async fn update_cover<'e, E>(
    executor: E,
    user_id: i64,
    cover: &StoredFile,
) -> Result<Option<UserRecord>, sqlx::Error>
where
    E: Executor<'e, Database = Postgres>,
{
    let sql = format!(
        r#"
        UPDATE users SET cover_path = $2, cover_url = $3, updated_at = NOW()
        WHERE id = $1
        RETURNING {USER_COLUMNS}
        "#
    );
    sqlx::query_as(&sql)
        .bind(user_id)
        .bind(&cover.path)
        .bind(&cover.url)
        .fetch_optional(executor)
        .await
}

/// Public channel profile annotated for the viewer
#[derive(Debug, sqlx::FromRow)]
pub struct ChannelProfileRow {
    pub id: i64,
    pub username: String,
    pub full_name: String,
    pub avatar_url: String,
    pub cover_url: Option<String>,
    pub created_at: DateTime<Utc>,
    pub subscribers_count: i64,
    pub subscribed_to_count: i64,
    pub is_subscribed: bool,
}

pub async fn get_channel_profile<'e, E>(
    executor: E,
    username: &str,
    viewer_id: i64,
) -> Result<Option<ChannelProfileRow>, sqlx::Error>
where
    E: Executor<'e, Database = Postgres>,
{
    sqlx::query_as(
        r#"
        SELECT u.id, u.username, u.full_name, u.avatar_url, u.cover_url, u.created_at,
               COUNT(DISTINCT subs.id) AS subscribers_count,
               COUNT(DISTINCT outgoing.id) AS subscribed_to_count,
               COALESCE(bool_or(subs.subscriber_id = $2), FALSE) AS is_subscribed
        FROM users u
        LEFT JOIN subscriptions subs ON subs.channel_id = u.id
        LEFT JOIN subscriptions outgoing ON outgoing.subscriber_id = u.id
        WHERE u.username = $1
        GROUP BY u.id
        "#,
    )
    .bind(username)
    .bind(viewer_id)
    .fetch_optional(executor)
    .await
}

/// Watch-history append with set semantics: re-watching bumps watched_at
/// instead of inserting a duplicate row.
pub async fn upsert_watch_history<'e, E>(
    executor: E,
    user_id: i64,
    video_id: i64,
) -> Result<(), sqlx::Error>
where
    E: Executor<'e, Database = Postgres>,
{
    sqlx::query(
        r#"
        INSERT INTO watch_history (user_id, video_id)
        VALUES ($1, $2)
        ON CONFLICT (user_id, video_id) DO UPDATE SET watched_at = NOW()
        "#,
    )
    .bind(user_id)
    .bind(video_id)
    .execute(executor)
    .await?;
    Ok(())
}

#[derive(Debug, sqlx::FromRow)]
pub struct WatchHistoryRow {
    pub video_id: i64,
    pub video_url: String,
    pub thumbnail_url: String,
    pub title: String,
    pub description: String,
    pub duration: f64,
    pub views: i64,
    pub watched_at: DateTime<Utc>,
    pub owner_id: i64,
    pub owner_username: String,
    pub owner_full_name: String,
    pub owner_avatar_url: String,
}

/// The viewer's watched videos, most recently watched first
pub async fn list_watch_history<'e, E>(
    executor: E,
    user_id: i64,
) -> Result<Vec<WatchHistoryRow>, sqlx::Error>
where
    E: Executor<'e, Database = Postgres>,
{
    sqlx::query_as(
        r#"
        SELECT v.id AS video_id, v.video_url, v.thumbnail_url, v.title, v.description,
               v.duration, v.views, wh.watched_at,
               u.id AS owner_id, u.username AS owner_username,
               u.full_name AS owner_full_name, u.avatar_url AS owner_avatar_url
        FROM watch_history wh
        JOIN videos v ON v.id = wh.video_id
        JOIN users u ON u.id = v.owner_id
        WHERE wh.user_id = $1
        ORDER BY wh.watched_at DESC
        "#,
    )
    .bind(user_id)
    .fetch_all(executor)
    .await
}

/// Cascade: forget a deleted video in every user's history
pub async fn delete_watch_history_for_video<'e, E>(
    executor: E,
    video_id: i64,
) -> Result<u64, sqlx::Error>
where
    E: Executor<'e, Database = Postgres>,
{
    let result = sqlx::query("DELETE FROM watch_history WHERE video_id = $1")
        .bind(video_id)
        .execute(executor)
        .await?;
    Ok(result.rows_affected())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_normalize_handle() {
        assert_eq!(normalize_handle("  AliCe "), "alice");
        assert_eq!(normalize_handle("Bob@Example.COM"), "bob@example.com");
    }
}
