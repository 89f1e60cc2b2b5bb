//! Comment domain - DB queries for video comments

use chrono::{DateTime, Utc};
use sqlx::{Executor, Postgres};

#[derive(Debug, sqlx::FromRow)]
pub struct CommentRecord {
    pub id: i64,
    pub owner_id: i64,
    pub video_id: i64,
    pub content: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Thread item: comment + owner sub-document + like count + viewer flag
#[derive(Debug, sqlx::FromRow)]
pub struct CommentThreadRow {
    pub id: i64,
    pub content: String,
    pub created_at: DateTime<Utc>,
    pub likes_count: i64,
    pub is_liked: bool,
    pub owner_id: i64,
    pub owner_username: String,
    pub owner_full_name: String,
    pub owner_avatar_url: String,
}

/// One page of a video's comment thread, newest-first
pub async fn list_for_video<'e, E>(
    executor: E,
    video_id: i64,
    viewer_id: i64,
    limit: i64,
    offset: i64,
) -> Result<Vec<CommentThreadRow>, sqlx::Error>
where
    E: Executor<'e, Database = Postgres>,
{
    sqlx::query_as(
        r#"
        SELECT c.id, c.content, c.created_at,
               COUNT(l.id) AS likes_count,
               COALESCE(bool_or(l.liked_by = $2), FALSE) AS is_liked,
               u.id AS owner_id, u.username AS owner_username,
               u.full_name AS owner_full_name, u.avatar_url AS owner_avatar_url
        FROM comments c
        JOIN users u ON u.id = c.owner_id
        LEFT JOIN likes l ON l.target_kind = 'comment' AND l.target_id = c.id
        WHERE c.video_id = $1
        GROUP BY c.id, u.id
        ORDER BY c.created_at DESC, c.id DESC
        LIMIT $3 OFFSET $4
        "#,
    )
    .bind(video_id)
    .bind(viewer_id)
    .bind(limit)
    .bind(offset)
    .fetch_all(executor)
    .await
}

pub async fn count_for_video<'e, E>(executor: E, video_id: i64) -> Result<i64, sqlx::Error>
where
    E: Executor<'e, Database = Postgres>,
{
    let (count,): (i64,) = sqlx::query_as("SELECT COUNT(*) FROM comments WHERE video_id = $1")
        .bind(video_id)
        .fetch_one(executor)
        .await?;
    Ok(count)
}

pub async fn insert<'e, E>(
    executor: E,
    owner_id: i64,
    video_id: i64,
    content: &str,
) -> Result<CommentRecord, sqlx::Error>
where
    E: Executor<'e, Database = Postgres>,
{
    sqlx::query_as(
        r#"
        INSERT INTO comments (owner_id, video_id, content)
        VALUES ($1, $2, $3)
        RETURNING id, owner_id, video_id, content, created_at, updated_at
        "#,
    )
    .bind(owner_id)
    .bind(video_id)
    .bind(content)
    .fetch_one(executor)
    .await
}

pub async fn get_record<'e, E>(
    executor: E,
    comment_id: i64,
) -> Result<Option<CommentRecord>, sqlx::Error>
where
    E: Executor<'e, Database = Postgres>,
{
    sqlx::query_as(
        "SELECT id, owner_id, video_id, content, created_at, updated_at FROM comments WHERE id = $1",
    )
    .bind(comment_id)
    .fetch_optional(executor)
    .await
}

pub async fn update_content<'e, E>(
    executor: E,
    comment_id: i64,
    content: &str,
) -> Result<Option<CommentRecord>, sqlx::Error>
where
    E: Executor<'e, Database = Postgres>,
{
    sqlx::query_as(
        r#"
        UPDATE comments SET content = $2, updated_at = NOW()
        WHERE id = $1
        RETURNING id, owner_id, video_id, content, created_at, updated_at
        "#,
    )
    .bind(comment_id)
    .bind(content)
    .fetch_optional(executor)
    .await
}

pub async fn delete_record<'e, E>(executor: E, comment_id: i64) -> Result<bool, sqlx::Error>
where
    E: Executor<'e, Database = Postgres>,
{
    let result = sqlx::query("DELETE FROM comments WHERE id = $1")
        .bind(comment_id)
        .execute(executor)
        .await?;
    Ok(result.rows_affected() > 0)
}

/// Cascade: all comments on a video
pub async fn delete_for_video<'e, E>(executor: E, video_id: i64) -> Result<u64, sqlx::Error>
where
    E: Executor<'e, Database = Postgres>,
{
    let result = sqlx::query("DELETE FROM comments WHERE video_id = $1")
        .bind(video_id)
        .execute(executor)
        .await?;
    Ok(result.rows_affected())
}
