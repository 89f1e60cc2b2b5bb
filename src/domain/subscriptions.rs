//! Subscription domain - the directed "follows" edge between users
//!
//! Same toggle discipline as likes: the `(subscriber_id, channel_id)` unique
//! constraint plus `ON CONFLICT DO NOTHING` keeps concurrent toggles from
//! producing duplicate edges.

use chrono::{DateTime, Utc};
use sqlx::{Executor, PgPool, Postgres};

/// Toggle a subscription. Returns the resulting state: true = subscribed.
pub async fn toggle(db: &PgPool, subscriber_id: i64, channel_id: i64) -> Result<bool, sqlx::Error> {
    let inserted = sqlx::query(
        r#"
        INSERT INTO subscriptions (subscriber_id, channel_id)
        VALUES ($1, $2)
        ON CONFLICT (subscriber_id, channel_id) DO NOTHING
        "#,
    )
    .bind(subscriber_id)
    .bind(channel_id)
    .execute(db)
    .await?
    .rows_affected();

    if inserted > 0 {
        return Ok(true);
    }

    sqlx::query("DELETE FROM subscriptions WHERE subscriber_id = $1 AND channel_id = $2")
        .bind(subscriber_id)
        .bind(channel_id)
        .execute(db)
        .await?;

    Ok(false)
}

#[derive(Debug, sqlx::FromRow)]
pub struct SubscriberRow {
    pub id: i64,
    pub username: String,
    pub full_name: String,
    pub avatar_url: String,
    pub subscribed_at: DateTime<Utc>,
}

/// Users subscribed to a channel, newest subscription first
pub async fn list_subscribers<'e, E>(
    executor: E,
    channel_id: i64,
) -> Result<Vec<SubscriberRow>, sqlx::Error>
where
    E: Executor<'e, Database = Postgres>,
{
    sqlx::query_as(
        r#"
        SELECT u.id, u.username, u.full_name, u.avatar_url, s.created_at AS subscribed_at
        FROM subscriptions s
        JOIN users u ON u.id = s.subscriber_id
        WHERE s.channel_id = $1
        ORDER BY s.created_at DESC
        "#,
    )
    .bind(channel_id)
    .fetch_all(executor)
    .await
}

#[derive(Debug, sqlx::FromRow)]
pub struct SubscribedChannelRow {
    pub id: i64,
    pub username: String,
    pub full_name: String,
    pub avatar_url: String,
    pub subscribed_at: DateTime<Utc>,
    pub subscribers_count: i64,
}

/// Channels a user subscribes to, each with its own subscriber count
pub async fn list_subscribed_channels<'e, E>(
    executor: E,
    subscriber_id: i64,
) -> Result<Vec<SubscribedChannelRow>, sqlx::Error>
where
    E: Executor<'e, Database = Postgres>,
{
    sqlx::query_as(
        r#"
        SELECT ch.id, ch.username, ch.full_name, ch.avatar_url,
               s.created_at AS subscribed_at,
               COUNT(others.id) AS subscribers_count
        FROM subscriptions s
        JOIN users ch ON ch.id = s.channel_id
        LEFT JOIN subscriptions others ON others.channel_id = ch.id
        WHERE s.subscriber_id = $1
        GROUP BY ch.id, s.created_at
        ORDER BY s.created_at DESC
        "#,
    )
    .bind(subscriber_id)
    .fetch_all(executor)
    .await
}
