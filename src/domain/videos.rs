//! Video domain - DB queries for videos
//!
//! All functions use the generic Executor pattern, allowing them to work with
//! both `&PgPool` (for standalone queries) and `&mut PgConnection` (for
//! transactions). The feed and detail queries are the view composer: one
//! round trip each, with counts and viewer-relative flags computed from the
//! same joins that gather the related rows.

use chrono::{DateTime, Utc};
use sqlx::{Executor, Postgres};

use crate::storage::StoredFile;

#[derive(Debug, sqlx::FromRow)]
pub struct VideoRecord {
    pub id: i64,
    pub owner_id: i64,
    pub video_path: String,
    pub video_url: String,
    pub thumbnail_path: String,
    pub thumbnail_url: String,
    pub title: String,
    pub description: String,
    pub duration: f64,
    pub views: i64,
    pub is_published: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

const VIDEO_COLUMNS: &str = "id, owner_id, video_path, video_url, thumbnail_path, thumbnail_url, \
     title, description, duration, views, is_published, created_at, updated_at";

/// Sortable feed columns; anything else falls back to newest-first
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SortField {
    CreatedAt,
    Views,
    Duration,
}

impl SortField {
    pub fn from_str(s: Option<&str>) -> Self {
        match s {
            Some("views") => SortField::Views,
            Some("duration") => SortField::Duration,
            _ => SortField::CreatedAt,
        }
    }

    fn column(&self) -> &'static str {
        match self {
            SortField::CreatedAt => "created_at",
            SortField::Views => "views",
            SortField::Duration => "duration",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SortOrder {
    Asc,
    Desc,
}

impl SortOrder {
    pub fn from_str(s: Option<&str>) -> Self {
        match s {
            Some("asc") => SortOrder::Asc,
            _ => SortOrder::Desc,
        }
    }

    fn keyword(&self) -> &'static str {
        match self {
            SortOrder::Asc => "ASC",
            SortOrder::Desc => "DESC",
        }
    }
}

/// Feed item: video summary + compact owner sub-document
#[derive(Debug, sqlx::FromRow)]
pub struct VideoFeedRow {
    pub id: i64,
    pub video_url: String,
    pub thumbnail_url: String,
    pub title: String,
    pub description: String,
    pub duration: f64,
    pub views: i64,
    pub created_at: DateTime<Utc>,
    pub owner_id: i64,
    pub owner_username: String,
    pub owner_avatar_url: String,
}

// Both feed queries share the filter: published only, optional full-text
// match on title+description (NULL query matches all), optional owner filter.
const FEED_FILTER: &str = "v.is_published \
     AND ($1::text IS NULL OR to_tsvector('english', v.title || ' ' || v.description) \
          @@ websearch_to_tsquery('english', $1)) \
     AND ($2::bigint IS NULL OR v.owner_id = $2)";

/// List published videos for the public feed (one page)
pub async fn list_feed<'e, E>(
    executor: E,
    text_query: Option<&str>,
    owner_id: Option<i64>,
    sort: SortField,
    order: SortOrder,
    limit: i64,
    offset: i64,
) -> Result<Vec<VideoFeedRow>, sqlx::Error>
where
    E: Executor<'e, Database = Postgres>,
{
    let sql = format!(
        r#"
        SELECT v.id, v.video_url, v.thumbnail_url, v.title, v.description,
               v.duration, v.views, v.created_at,
               u.id AS owner_id, u.username AS owner_username, u.avatar_url AS owner_avatar_url
        FROM videos v
        JOIN users u ON u.id = v.owner_id
        WHERE {FEED_FILTER}
        ORDER BY v.{} {}, v.id DESC
        LIMIT $3 OFFSET $4
        "#,
        sort.column(),
        order.keyword(),
    );

    sqlx::query_as(&sql)
        .bind(text_query)
        .bind(owner_id)
        .bind(limit)
        .bind(offset)
        .fetch_all(executor)
        .await
}

/// Count videos matching the feed filter (for page metadata)
pub async fn count_feed<'e, E>(
    executor: E,
    text_query: Option<&str>,
    owner_id: Option<i64>,
) -> Result<i64, sqlx::Error>
where
    E: Executor<'e, Database = Postgres>,
{
    let sql = format!("SELECT COUNT(*) FROM videos v WHERE {FEED_FILTER}");
    let (count,): (i64,) = sqlx::query_as(&sql)
        .bind(text_query)
        .bind(owner_id)
        .fetch_one(executor)
        .await?;
    Ok(count)
}

/// Video detail: the record plus like count, viewer like flag, and the owner
/// enriched with subscriber count and the viewer's subscription flag.
#[derive(Debug, sqlx::FromRow)]
pub struct VideoDetailRow {
    pub id: i64,
    pub video_url: String,
    pub thumbnail_url: String,
    pub title: String,
    pub description: String,
    pub duration: f64,
    pub views: i64,
    pub created_at: DateTime<Utc>,
    pub likes_count: i64,
    pub is_liked: bool,
    pub owner_id: i64,
    pub owner_username: String,
    pub owner_avatar_url: String,
    pub subscribers_count: i64,
    pub is_subscribed: bool,
}

pub async fn get_detail<'e, E>(
    executor: E,
    video_id: i64,
    viewer_id: i64,
) -> Result<Option<VideoDetailRow>, sqlx::Error>
where
    E: Executor<'e, Database = Postgres>,
{
    // The viewer flags come from the same joins that produce the counts
    // (membership of the viewer id in the joined set), so the whole detail
    // is one round trip.
    sqlx::query_as(
        r#"
        SELECT v.id, v.video_url, v.thumbnail_url, v.title, v.description,
               v.duration, v.views, v.created_at,
               COUNT(DISTINCT l.id) AS likes_count,
               COALESCE(bool_or(l.liked_by = $2), FALSE) AS is_liked,
               u.id AS owner_id, u.username AS owner_username, u.avatar_url AS owner_avatar_url,
               COUNT(DISTINCT s.id) AS subscribers_count,
               COALESCE(bool_or(s.subscriber_id = $2), FALSE) AS is_subscribed
        FROM videos v
        JOIN users u ON u.id = v.owner_id
        LEFT JOIN likes l ON l.target_kind = 'video' AND l.target_id = v.id
        LEFT JOIN subscriptions s ON s.channel_id = v.owner_id
        WHERE v.id = $1
        GROUP BY v.id, u.id
        "#,
    )
    .bind(video_id)
    .bind(viewer_id)
    .fetch_optional(executor)
    .await
}

pub async fn get_record<'e, E>(executor: E, video_id: i64) -> Result<Option<VideoRecord>, sqlx::Error>
where
    E: Executor<'e, Database = Postgres>,
{
    let sql = format!("SELECT {VIDEO_COLUMNS} FROM videos WHERE id = $1");
    sqlx::query_as(&sql).bind(video_id).fetch_optional(executor).await
}

#[allow(clippy::too_many_arguments)]
pub async fn insert<'e, E>(
    executor: E,
    owner_id: i64,
    video: &StoredFile,
    thumbnail: &StoredFile,
    title: &str,
    description: &str,
    duration: f64,
) -> Result<VideoRecord, sqlx::Error>
where
    E: Executor<'e, Database = Postgres>,
{
    let sql = format!(
        r#"
        INSERT INTO videos (owner_id, video_path, video_url, thumbnail_path, thumbnail_url,
                            title, description, duration, is_published)
        VALUES ($1, $2, $3, $4, $5, $6, $7, $8, FALSE)
        RETURNING {VIDEO_COLUMNS}
        "#
    );
    sqlx::query_as(&sql)
        .bind(owner_id)
        .bind(&video.path)
        .bind(&video.url)
        .bind(&thumbnail.path)
        .bind(&thumbnail.url)
        .bind(title)
        .bind(description)
        .bind(duration)
        .fetch_one(executor)
        .await
}

/// Update title/description and swap the thumbnail
pub async fn update_details<'e, E>(
    executor: E,
    video_id: i64,
    title: &str,
    description: &str,
    thumbnail: &StoredFile,
) -> Result<Option<VideoRecord>, sqlx::Error>
where
    E: Executor<'e, Database = Postgres>,
{
    let sql = format!(
        r#"
        UPDATE videos
        SET title = $2, description = $3, thumbnail_path = $4, thumbnail_url = $5,
            updated_at = NOW()
        WHERE id = $1
        RETURNING {VIDEO_COLUMNS}
        "#
    );
    sqlx::query_as(&sql)
        .bind(video_id)
        .bind(title)
        .bind(description)
        .bind(&thumbnail.path)
        .bind(&thumbnail.url)
        .fetch_optional(executor)
        .await
}

pub async fn set_published<'e, E>(
    executor: E,
    video_id: i64,
    published: bool,
) -> Result<Option<VideoRecord>, sqlx::Error>
where
    E: Executor<'e, Database = Postgres>,
{
    let sql = format!(
        r#"
        UPDATE videos SET is_published = $2, updated_at = NOW()
        WHERE id = $1
        RETURNING {VIDEO_COLUMNS}
        "#
    );
    sqlx::query_as(&sql)
        .bind(video_id)
        .bind(published)
        .fetch_optional(executor)
        .await
}

/// Each detail fetch counts as a view; no dedup
pub async fn increment_views<'e, E>(executor: E, video_id: i64) -> Result<(), sqlx::Error>
where
    E: Executor<'e, Database = Postgres>,
{
    sqlx::query("UPDATE videos SET views = views + 1 WHERE id = $1")
        .bind(video_id)
        .execute(executor)
        .await?;
    Ok(())
}

pub async fn delete_record<'e, E>(executor: E, video_id: i64) -> Result<bool, sqlx::Error>
where
    E: Executor<'e, Database = Postgres>,
{
    let result = sqlx::query("DELETE FROM videos WHERE id = $1")
        .bind(video_id)
        .execute(executor)
        .await?;
    Ok(result.rows_affected() > 0)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::likes::{self, LikeTarget};
    use crate::domain::{comments, playlists, users};
    use sqlx::PgPool;

    #[test]
    fn test_sort_field_whitelist() {
        assert_eq!(SortField::from_str(Some("views")), SortField::Views);
        assert_eq!(SortField::from_str(Some("duration")), SortField::Duration);
        assert_eq!(SortField::from_str(Some("created_at")), SortField::CreatedAt);
        // unknown fields never reach the SQL string
        assert_eq!(
            SortField::from_str(Some("owner_id; DROP TABLE videos")),
            SortField::CreatedAt
        );
        assert_eq!(SortField::from_str(None), SortField::CreatedAt);
    }

    #[test]
    fn test_sort_order_defaults_desc() {
        assert_eq!(SortOrder::from_str(Some("asc")), SortOrder::Asc);
        assert_eq!(SortOrder::from_str(Some("desc")), SortOrder::Desc);
        assert_eq!(SortOrder::from_str(Some("sideways")), SortOrder::Desc);
        assert_eq!(SortOrder::from_str(None), SortOrder::Desc);
    }

    fn stored(path: &str) -> StoredFile {
        StoredFile {
            path: path.to_string(),
            url: format!("https://example.com/{path}"),
        }
    }

    async fn count_rows(db: &PgPool, sql: &str, video_id: i64) -> i64 {
        let (count,): (i64,) = sqlx::query_as(sql)
            .bind(video_id)
            .fetch_one(db)
            .await
            .unwrap();
        count
    }

    // Same delete sequence the video-delete handler runs in its transaction;
    // afterwards nothing may still reference the video.
    #[sqlx::test]
    async fn test_delete_cascade_leaves_no_orphans(db: PgPool) {
        let owner = users::create_user(
            &db,
            "carol",
            "carol@example.com",
            "carol",
            "hash",
            &stored("a.png"),
            None,
        )
        .await
        .unwrap()
        .id;

        let video = insert(&db, owner, &stored("v.mp4"), &stored("t.jpg"), "t", "d", 1.0)
            .await
            .unwrap()
            .id;
        let comment = comments::insert(&db, owner, video, "hi").await.unwrap().id;
        likes::toggle(&db, owner, LikeTarget::Video(video)).await.unwrap();
        likes::toggle(&db, owner, LikeTarget::Comment(comment))
            .await
            .unwrap();
        let playlist = playlists::insert(&db, owner, "mix", "d").await.unwrap().id;
        playlists::add_video(&db, playlist, video).await.unwrap();
        users::upsert_watch_history(&db, owner, video).await.unwrap();

        let mut tx = db.begin().await.unwrap();
        likes::delete_for_video(&mut *tx, video).await.unwrap();
        comments::delete_for_video(&mut *tx, video).await.unwrap();
        playlists::remove_video_everywhere(&mut *tx, video)
            .await
            .unwrap();
        users::delete_watch_history_for_video(&mut *tx, video)
            .await
            .unwrap();
        assert!(delete_record(&mut *tx, video).await.unwrap());
        tx.commit().await.unwrap();

        assert!(get_record(&db, video).await.unwrap().is_none());
        let (likes_left,): (i64,) = sqlx::query_as("SELECT COUNT(*) FROM likes")
            .fetch_one(&db)
            .await
            .unwrap();
        assert_eq!(likes_left, 0);
        assert_eq!(
            count_rows(&db, "SELECT COUNT(*) FROM comments WHERE video_id = $1", video).await,
            0
        );
        assert_eq!(
            count_rows(
                &db,
                "SELECT COUNT(*) FROM playlist_videos WHERE video_id = $1",
                video
            )
            .await,
            0
        );
        assert_eq!(
            count_rows(
                &db,
                "SELECT COUNT(*) FROM watch_history WHERE video_id = $1",
                video
            )
            .await,
            0
        );
        // the playlist itself survives, emptied
        assert!(
            playlists::get_record(&db, playlist)
                .await
                .unwrap()
                .is_some()
        );
    }
}
