//! Playlist domain - DB queries for playlists and their video memberships
//!
//! Membership is a set: `ON CONFLICT DO NOTHING` makes add-video idempotent,
//! and `added_at` preserves append order for listing.

use chrono::{DateTime, Utc};
use sqlx::{Executor, Postgres};

#[derive(Debug, sqlx::FromRow)]
pub struct PlaylistRecord {
    pub id: i64,
    pub owner_id: i64,
    pub name: String,
    pub description: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

pub async fn insert<'e, E>(
    executor: E,
    owner_id: i64,
    name: &str,
    description: &str,
) -> Result<PlaylistRecord, sqlx::Error>
where
    E: Executor<'e, Database = Postgres>,
{
    sqlx::query_as(
        r#"
        INSERT INTO playlists (owner_id, name, description)
        VALUES ($1, $2, $3)
        RETURNING id, owner_id, name, description, created_at, updated_at
        "#,
    )
    .bind(owner_id)
    .bind(name)
    .bind(description)
    .fetch_one(executor)
    .await
}

pub async fn get_record<'e, E>(
    executor: E,
    playlist_id: i64,
) -> Result<Option<PlaylistRecord>, sqlx::Error>
where
    E: Executor<'e, Database = Postgres>,
{
    sqlx::query_as(
        "SELECT id, owner_id, name, description, created_at, updated_at FROM playlists WHERE id = $1",
    )
    .bind(playlist_id)
    .fetch_optional(executor)
    .await
}

pub async fn update_details<'e, E>(
    executor: E,
    playlist_id: i64,
    name: &str,
    description: &str,
) -> Result<Option<PlaylistRecord>, sqlx::Error>
where
    E: Executor<'e, Database = Postgres>,
{
    sqlx::query_as(
        r#"
        UPDATE playlists SET name = $2, description = $3, updated_at = NOW()
        WHERE id = $1
        RETURNING id, owner_id, name, description, created_at, updated_at
        "#,
    )
    .bind(playlist_id)
    .bind(name)
    .bind(description)
    .fetch_optional(executor)
    .await
}

/// Deleting the playlist row cascades its memberships (FK ON DELETE CASCADE)
pub async fn delete_record<'e, E>(executor: E, playlist_id: i64) -> Result<bool, sqlx::Error>
where
    E: Executor<'e, Database = Postgres>,
{
    let result = sqlx::query("DELETE FROM playlists WHERE id = $1")
        .bind(playlist_id)
        .execute(executor)
        .await?;
    Ok(result.rows_affected() > 0)
}

/// Idempotent set insert; returns false when the video was already present
pub async fn add_video<'e, E>(
    executor: E,
    playlist_id: i64,
    video_id: i64,
) -> Result<bool, sqlx::Error>
where
    E: Executor<'e, Database = Postgres>,
{
    let result = sqlx::query(
        r#"
        INSERT INTO playlist_videos (playlist_id, video_id)
        VALUES ($1, $2)
        ON CONFLICT (playlist_id, video_id) DO NOTHING
        "#,
    )
    .bind(playlist_id)
    .bind(video_id)
    .execute(executor)
    .await?;
    Ok(result.rows_affected() > 0)
}

pub async fn remove_video<'e, E>(
    executor: E,
    playlist_id: i64,
    video_id: i64,
) -> Result<bool, sqlx::Error>
where
    E: Executor<'e, Database = Postgres>,
{
    let result =
        sqlx::query("DELETE FROM playlist_videos WHERE playlist_id = $1 AND video_id = $2")
            .bind(playlist_id)
            .bind(video_id)
            .execute(executor)
            .await?;
    Ok(result.rows_affected() > 0)
}

/// Cascade: drop a deleted video from every playlist
pub async fn remove_video_everywhere<'e, E>(executor: E, video_id: i64) -> Result<u64, sqlx::Error>
where
    E: Executor<'e, Database = Postgres>,
{
    let result = sqlx::query("DELETE FROM playlist_videos WHERE video_id = $1")
        .bind(video_id)
        .execute(executor)
        .await?;
    Ok(result.rows_affected())
}

/// Playlist summary with computed aggregates over contained videos
#[derive(Debug, sqlx::FromRow)]
pub struct PlaylistSummaryRow {
    pub id: i64,
    pub name: String,
    pub description: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    pub total_videos: i64,
    pub total_views: i64,
}

pub async fn list_for_user<'e, E>(
    executor: E,
    user_id: i64,
) -> Result<Vec<PlaylistSummaryRow>, sqlx::Error>
where
    E: Executor<'e, Database = Postgres>,
{
    sqlx::query_as(
        r#"
        SELECT p.id, p.name, p.description, p.created_at, p.updated_at,
               COUNT(pv.video_id) AS total_videos,
               COALESCE(SUM(v.views), 0)::BIGINT AS total_views
        FROM playlists p
        LEFT JOIN playlist_videos pv ON pv.playlist_id = p.id
        LEFT JOIN videos v ON v.id = pv.video_id
        WHERE p.owner_id = $1
        GROUP BY p.id
        ORDER BY p.updated_at DESC
        "#,
    )
    .bind(user_id)
    .fetch_all(executor)
    .await
}

/// Playlist header for the detail endpoint: aggregates + owner sub-document
#[derive(Debug, sqlx::FromRow)]
pub struct PlaylistDetailRow {
    pub id: i64,
    pub name: String,
    pub description: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    pub total_videos: i64,
    pub total_views: i64,
    pub owner_id: i64,
    pub owner_username: String,
    pub owner_full_name: String,
    pub owner_avatar_url: String,
}

pub async fn get_detail<'e, E>(
    executor: E,
    playlist_id: i64,
) -> Result<Option<PlaylistDetailRow>, sqlx::Error>
where
    E: Executor<'e, Database = Postgres>,
{
    sqlx::query_as(
        r#"
        SELECT p.id, p.name, p.description, p.created_at, p.updated_at,
               COUNT(pv.video_id) AS total_videos,
               COALESCE(SUM(v.views), 0)::BIGINT AS total_views,
               u.id AS owner_id, u.username AS owner_username,
               u.full_name AS owner_full_name, u.avatar_url AS owner_avatar_url
        FROM playlists p
        JOIN users u ON u.id = p.owner_id
        LEFT JOIN playlist_videos pv ON pv.playlist_id = p.id
        LEFT JOIN videos v ON v.id = pv.video_id
        WHERE p.id = $1
        GROUP BY p.id, u.id
        "#,
    )
    .bind(playlist_id)
    .fetch_optional(executor)
    .await
}

/// A contained video summary, in append order
#[derive(Debug, sqlx::FromRow)]
pub struct PlaylistVideoRow {
    pub id: i64,
    pub video_url: String,
    pub thumbnail_url: String,
    pub title: String,
    pub description: String,
    pub duration: f64,
    pub views: i64,
    pub created_at: DateTime<Utc>,
    pub added_at: DateTime<Utc>,
}

pub async fn list_videos<'e, E>(
    executor: E,
    playlist_id: i64,
) -> Result<Vec<PlaylistVideoRow>, sqlx::Error>
where
    E: Executor<'e, Database = Postgres>,
{
    sqlx::query_as(
        r#"
        SELECT v.id, v.video_url, v.thumbnail_url, v.title, v.description,
               v.duration, v.views, v.created_at, pv.added_at
        FROM playlist_videos pv
        JOIN videos v ON v.id = pv.video_id
        WHERE pv.playlist_id = $1
        ORDER BY pv.added_at ASC
        "#,
    )
    .bind(playlist_id)
    .fetch_all(executor)
    .await
}
