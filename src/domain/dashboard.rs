//! Dashboard domain - channel-level aggregates for the owner's own view

use chrono::{DateTime, Utc};
use sqlx::{Executor, Postgres};

#[derive(Debug, sqlx::FromRow)]
pub struct ChannelStatsRow {
    pub total_videos: i64,
    pub total_views: i64,
    pub total_subscribers: i64,
    pub total_likes: i64,
}

/// Channel totals: videos, accumulated views, subscribers, and likes received
/// on the channel's videos.
pub async fn get_channel_stats<'e, E>(
    executor: E,
    channel_id: i64,
) -> Result<ChannelStatsRow, sqlx::Error>
where
    E: Executor<'e, Database = Postgres>,
{
    sqlx::query_as(
        r#"
        SELECT
            (SELECT COUNT(*) FROM videos WHERE owner_id = $1) AS total_videos,
            (SELECT COALESCE(SUM(views), 0)::BIGINT FROM videos WHERE owner_id = $1) AS total_views,
            (SELECT COUNT(*) FROM subscriptions WHERE channel_id = $1) AS total_subscribers,
            (SELECT COUNT(*)
             FROM likes l
             JOIN videos v ON l.target_kind = 'video' AND l.target_id = v.id
             WHERE v.owner_id = $1) AS total_likes
        "#,
    )
    .bind(channel_id)
    .fetch_one(executor)
    .await
}

/// The channel's own video (published or not) with its like count
#[derive(Debug, sqlx::FromRow)]
pub struct ChannelVideoRow {
    pub id: i64,
    pub video_url: String,
    pub thumbnail_url: String,
    pub title: String,
    pub description: String,
    pub duration: f64,
    pub views: i64,
    pub is_published: bool,
    pub created_at: DateTime<Utc>,
    pub likes_count: i64,
}

pub async fn list_channel_videos<'e, E>(
    executor: E,
    channel_id: i64,
) -> Result<Vec<ChannelVideoRow>, sqlx::Error>
where
    E: Executor<'e, Database = Postgres>,
{
    sqlx::query_as(
        r#"
        SELECT v.id, v.video_url, v.thumbnail_url, v.title, v.description,
               v.duration, v.views, v.is_published, v.created_at,
               COUNT(l.id) AS likes_count
        FROM videos v
        LEFT JOIN likes l ON l.target_kind = 'video' AND l.target_id = v.id
        WHERE v.owner_id = $1
        GROUP BY v.id
        ORDER BY v.created_at DESC
        "#,
    )
    .bind(channel_id)
    .fetch_all(executor)
    .await
}
