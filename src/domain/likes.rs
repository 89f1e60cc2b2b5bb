//! Like domain - the polymorphic (video/comment/tweet) like join record
//!
//! A like targets exactly one entity, modeled as a tagged union so a row with
//! multiple targets is unrepresentable. The `(liked_by, target_kind,
//! target_id)` unique constraint makes the toggle safe under concurrent
//! requests: the insert either wins or hits the conflict, never duplicates.

use chrono::{DateTime, Utc};
use sqlx::{Executor, PgPool, Postgres};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LikeTarget {
    Video(i64),
    Comment(i64),
    Tweet(i64),
}

impl LikeTarget {
    pub fn kind(&self) -> &'static str {
        match self {
            LikeTarget::Video(_) => "video",
            LikeTarget::Comment(_) => "comment",
            LikeTarget::Tweet(_) => "tweet",
        }
    }

    pub fn id(&self) -> i64 {
        match self {
            LikeTarget::Video(id) | LikeTarget::Comment(id) | LikeTarget::Tweet(id) => *id,
        }
    }
}

/// Toggle a like. Returns the resulting state: true = liked, false = unliked.
///
/// The insert relies on the unique constraint: zero rows affected means the
/// like already existed, in which case it is removed.
pub async fn toggle(db: &PgPool, user_id: i64, target: LikeTarget) -> Result<bool, sqlx::Error> {
    let inserted = sqlx::query(
        r#"
        INSERT INTO likes (liked_by, target_kind, target_id)
        VALUES ($1, $2, $3)
        ON CONFLICT (liked_by, target_kind, target_id) DO NOTHING
        "#,
    )
    .bind(user_id)
    .bind(target.kind())
    .bind(target.id())
    .execute(db)
    .await?
    .rows_affected();

    if inserted > 0 {
        return Ok(true);
    }

    sqlx::query(
        r#"
        DELETE FROM likes
        WHERE liked_by = $1 AND target_kind = $2 AND target_id = $3
        "#,
    )
    .bind(user_id)
    .bind(target.kind())
    .bind(target.id())
    .execute(db)
    .await?;

    Ok(false)
}

/// A liked video with its owner, ordered by most recent like
#[derive(Debug, sqlx::FromRow)]
pub struct LikedVideoRow {
    pub video_id: i64,
    pub video_url: String,
    pub thumbnail_url: String,
    pub title: String,
    pub description: String,
    pub duration: f64,
    pub views: i64,
    pub is_published: bool,
    pub video_created_at: DateTime<Utc>,
    pub liked_at: DateTime<Utc>,
    pub owner_id: i64,
    pub owner_username: String,
    pub owner_full_name: String,
    pub owner_avatar_url: String,
}

/// All videos the viewer has liked, newest-like-first. Inner joins drop likes
/// whose video or owner row no longer exists.
pub async fn liked_videos<'e, E>(executor: E, user_id: i64) -> Result<Vec<LikedVideoRow>, sqlx::Error>
where
    E: Executor<'e, Database = Postgres>,
{
    sqlx::query_as(
        r#"
        SELECT v.id AS video_id, v.video_url, v.thumbnail_url, v.title, v.description,
               v.duration, v.views, v.is_published, v.created_at AS video_created_at,
               l.created_at AS liked_at,
               u.id AS owner_id, u.username AS owner_username,
               u.full_name AS owner_full_name, u.avatar_url AS owner_avatar_url
        FROM likes l
        JOIN videos v ON l.target_kind = 'video' AND v.id = l.target_id
        JOIN users u ON u.id = v.owner_id
        WHERE l.liked_by = $1
        ORDER BY l.created_at DESC
        "#,
    )
    .bind(user_id)
    .fetch_all(executor)
    .await
}

/// Cascade: likes on a video and on all of its comments
pub async fn delete_for_video<'e, E>(executor: E, video_id: i64) -> Result<u64, sqlx::Error>
where
    E: Executor<'e, Database = Postgres>,
{
    let result = sqlx::query(
        r#"
        DELETE FROM likes
        WHERE (target_kind = 'video' AND target_id = $1)
           OR (target_kind = 'comment'
               AND target_id IN (SELECT id FROM comments WHERE video_id = $1))
        "#,
    )
    .bind(video_id)
    .execute(executor)
    .await?;
    Ok(result.rows_affected())
}

pub async fn delete_for_comment<'e, E>(executor: E, comment_id: i64) -> Result<u64, sqlx::Error>
where
    E: Executor<'e, Database = Postgres>,
{
    let result = sqlx::query("DELETE FROM likes WHERE target_kind = 'comment' AND target_id = $1")
        .bind(comment_id)
        .execute(executor)
        .await?;
    Ok(result.rows_affected())
}

pub async fn delete_for_tweet<'e, E>(executor: E, tweet_id: i64) -> Result<u64, sqlx::Error>
where
    E: Executor<'e, Database = Postgres>,
{
    let result = sqlx::query("DELETE FROM likes WHERE target_kind = 'tweet' AND target_id = $1")
        .bind(tweet_id)
        .execute(executor)
        .await?;
    Ok(result.rows_affected())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::{comments, users, videos};
    use crate::storage::StoredFile;

    #[test]
    fn test_target_tagging() {
        assert_eq!(LikeTarget::Video(3).kind(), "video");
        assert_eq!(LikeTarget::Comment(4).kind(), "comment");
        assert_eq!(LikeTarget::Tweet(5).kind(), "tweet");
        assert_eq!(LikeTarget::Tweet(5).id(), 5);
    }

    fn stored(path: &str) -> StoredFile {
        StoredFile {
            path: path.to_string(),
            url: format!("https://example.com/{path}"),
        }
    }

    async fn seed_user(db: &PgPool, name: &str) -> i64 {
        users::create_user(
            db,
            name,
            &format!("{name}@example.com"),
            name,
            "hash",
            &stored("a.png"),
            None,
        )
        .await
        .unwrap()
        .id
    }

    async fn seed_video(db: &PgPool, owner: i64) -> i64 {
        videos::insert(db, owner, &stored("v.mp4"), &stored("t.jpg"), "t", "d", 1.0)
            .await
            .unwrap()
            .id
    }

    async fn count_likes(db: &PgPool) -> i64 {
        let (count,): (i64,) = sqlx::query_as("SELECT COUNT(*) FROM likes")
            .fetch_one(db)
            .await
            .unwrap();
        count
    }

    #[sqlx::test]
    async fn test_toggle_parity(db: PgPool) {
        let user = seed_user(&db, "alice").await;
        let video = seed_video(&db, user).await;
        let target = LikeTarget::Video(video);

        // odd number of toggles lands on liked, even on not-liked
        assert!(toggle(&db, user, target).await.unwrap());
        assert!(!toggle(&db, user, target).await.unwrap());
        assert!(toggle(&db, user, target).await.unwrap());
        assert_eq!(count_likes(&db).await, 1);

        assert!(!toggle(&db, user, target).await.unwrap());
        assert_eq!(count_likes(&db).await, 0);
    }

    #[sqlx::test]
    async fn test_delete_for_video_takes_comment_likes(db: PgPool) {
        let user = seed_user(&db, "bob").await;
        let video = seed_video(&db, user).await;
        let other_video = seed_video(&db, user).await;
        let comment = comments::insert(&db, user, video, "hi").await.unwrap().id;

        toggle(&db, user, LikeTarget::Video(video)).await.unwrap();
        toggle(&db, user, LikeTarget::Comment(comment)).await.unwrap();
        toggle(&db, user, LikeTarget::Video(other_video)).await.unwrap();

        delete_for_video(&db, video).await.unwrap();

        // the like on the unrelated video is the only survivor
        let (kind, id): (String, i64) =
            sqlx::query_as("SELECT target_kind, target_id FROM likes")
                .fetch_one(&db)
                .await
                .unwrap();
        assert_eq!(kind, "video");
        assert_eq!(id, other_video);
    }
}
