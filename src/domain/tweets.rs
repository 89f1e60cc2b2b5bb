//! Tweet domain - DB queries for tweets

use chrono::{DateTime, Utc};
use sqlx::{Executor, Postgres};

#[derive(Debug, sqlx::FromRow)]
pub struct TweetRecord {
    pub id: i64,
    pub owner_id: i64,
    pub content: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// List item: tweet + owner sub-document + like count + viewer flag
#[derive(Debug, sqlx::FromRow)]
pub struct TweetListRow {
    pub id: i64,
    pub content: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    pub likes_count: i64,
    pub is_liked: bool,
    pub owner_id: i64,
    pub owner_username: String,
    pub owner_full_name: String,
    pub owner_avatar_url: String,
}

pub async fn insert<'e, E>(
    executor: E,
    owner_id: i64,
    content: &str,
) -> Result<TweetRecord, sqlx::Error>
where
    E: Executor<'e, Database = Postgres>,
{
    sqlx::query_as(
        r#"
        INSERT INTO tweets (owner_id, content)
        VALUES ($1, $2)
        RETURNING id, owner_id, content, created_at, updated_at
        "#,
    )
    .bind(owner_id)
    .bind(content)
    .fetch_one(executor)
    .await
}

/// A user's tweets newest-first, annotated for the viewer
pub async fn list_for_user<'e, E>(
    executor: E,
    user_id: i64,
    viewer_id: i64,
) -> Result<Vec<TweetListRow>, sqlx::Error>
where
    E: Executor<'e, Database = Postgres>,
{
    sqlx::query_as(
        r#"
        SELECT t.id, t.content, t.created_at, t.updated_at,
               COUNT(l.id) AS likes_count,
               COALESCE(bool_or(l.liked_by = $2), FALSE) AS is_liked,
               u.id AS owner_id, u.username AS owner_username,
               u.full_name AS owner_full_name, u.avatar_url AS owner_avatar_url
        FROM tweets t
        JOIN users u ON u.id = t.owner_id
        LEFT JOIN likes l ON l.target_kind = 'tweet' AND l.target_id = t.id
        WHERE t.owner_id = $1
        GROUP BY t.id, u.id
        ORDER BY t.created_at DESC, t.id DESC
        "#,
    )
    .bind(user_id)
    .bind(viewer_id)
    .fetch_all(executor)
    .await
}

pub async fn get_record<'e, E>(executor: E, tweet_id: i64) -> Result<Option<TweetRecord>, sqlx::Error>
where
    E: Executor<'e, Database = Postgres>,
{
    sqlx::query_as(
        "SELECT id, owner_id, content, created_at, updated_at FROM tweets WHERE id = $1",
    )
    .bind(tweet_id)
    .fetch_optional(executor)
    .await
}

pub async fn update_content<'e, E>(
    executor: E,
    tweet_id: i64,
    content: &str,
) -> Result<Option<TweetRecord>, sqlx::Error>
where
    E: Executor<'e, Database = Postgres>,
{
    sqlx::query_as(
        r#"
        UPDATE tweets SET content = $2, updated_at = NOW()
        WHERE id = $1
        RETURNING id, owner_id, content, created_at, updated_at
        "#,
    )
    .bind(tweet_id)
    .bind(content)
    .fetch_optional(executor)
    .await
}

pub async fn delete_record<'e, E>(executor: E, tweet_id: i64) -> Result<bool, sqlx::Error>
where
    E: Executor<'e, Database = Postgres>,
{
    let result = sqlx::query("DELETE FROM tweets WHERE id = $1")
        .bind(tweet_id)
        .execute(executor)
        .await?;
    Ok(result.rows_affected() > 0)
}
