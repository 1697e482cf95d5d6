use super::traits::{NotificationStore, StoreResult};
use super::StoreError;
use crate::domain::models::{Notification, NotificationKey};
use chrono::{DateTime, Utc};
use sqlx::PgPool;
use uuid::Uuid;

#[derive(Debug, sqlx::FromRow)]
struct NotificationRow {
    id: Uuid,
    from_id: Uuid,
    to_id: Uuid,
    kind: String,
    post_id: Option<Uuid>,
    read: bool,
    created_at: DateTime<Utc>,
}

impl TryFrom<NotificationRow> for Notification {
    type Error = StoreError;

    fn try_from(row: NotificationRow) -> Result<Self, Self::Error> {
        Ok(Notification {
            id: row.id,
            from: row.from_id,
            to: row.to_id,
            kind: row.kind.parse().map_err(StoreError::Backend)?,
            post: row.post_id,
            read: row.read,
            created_at: row.created_at,
        })
    }
}

fn decode_all(rows: Vec<NotificationRow>) -> StoreResult<Vec<Notification>> {
    rows.into_iter().map(Notification::try_from).collect()
}

/// PostgreSQL-backed Notification Ledger.
///
/// The `(from_id, to_id, kind, post_id)` uniqueness constraint (NULLs not
/// distinct) enforces at most one record per notification key.
#[derive(Clone)]
pub struct PgNotificationRepository {
    pool: PgPool,
}

impl PgNotificationRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait::async_trait]
impl NotificationStore for PgNotificationRepository {
    async fn create_if_absent(&self, notification: &Notification) -> StoreResult<Notification> {
        // Insert-or-fetch: a concurrent delete between the two statements can
        // make the fetch miss, so try the pair twice before giving up.
        for _ in 0..2 {
            let inserted = sqlx::query_as::<_, NotificationRow>(
                r#"
                INSERT INTO notifications (id, from_id, to_id, kind, post_id, read, created_at)
                VALUES ($1, $2, $3, $4, $5, $6, $7)
                ON CONFLICT ON CONSTRAINT notifications_tuple_key DO NOTHING
                RETURNING id, from_id, to_id, kind, post_id, read, created_at
                "#,
            )
            .bind(notification.id)
            .bind(notification.from)
            .bind(notification.to)
            .bind(notification.kind.as_str())
            .bind(notification.post)
            .bind(notification.read)
            .bind(notification.created_at)
            .fetch_optional(&self.pool)
            .await?;

            if let Some(row) = inserted {
                return row.try_into();
            }
            if let Some(existing) = self.find_by_key(&notification.key()).await? {
                return Ok(existing);
            }
        }

        Err(StoreError::Backend(
            "notification neither inserted nor found".to_string(),
        ))
    }

    async fn find_by_key(&self, key: &NotificationKey) -> StoreResult<Option<Notification>> {
        let row = sqlx::query_as::<_, NotificationRow>(
            r#"
            SELECT id, from_id, to_id, kind, post_id, read, created_at
            FROM notifications
            WHERE from_id = $1 AND to_id = $2 AND kind = $3 AND post_id IS NOT DISTINCT FROM $4
            "#,
        )
        .bind(key.from)
        .bind(key.to)
        .bind(key.kind.as_str())
        .bind(key.post)
        .fetch_optional(&self.pool)
        .await?;

        row.map(Notification::try_from).transpose()
    }

    async fn delete_matching(&self, key: &NotificationKey) -> StoreResult<bool> {
        let affected = sqlx::query(
            r#"
            DELETE FROM notifications
            WHERE from_id = $1 AND to_id = $2 AND kind = $3 AND post_id IS NOT DISTINCT FROM $4
            "#,
        )
        .bind(key.from)
        .bind(key.to)
        .bind(key.kind.as_str())
        .bind(key.post)
        .execute(&self.pool)
        .await?
        .rows_affected();
        Ok(affected > 0)
    }

    async fn list_for_recipient(&self, to: Uuid) -> StoreResult<Vec<Notification>> {
        let rows = sqlx::query_as::<_, NotificationRow>(
            r#"
            SELECT id, from_id, to_id, kind, post_id, read, created_at
            FROM notifications
            WHERE to_id = $1
            ORDER BY created_at DESC, seq DESC
            "#,
        )
        .bind(to)
        .fetch_all(&self.pool)
        .await?;
        decode_all(rows)
    }

    async fn mark_all_read(&self, to: Uuid) -> StoreResult<u64> {
        let affected =
            sqlx::query("UPDATE notifications SET read = TRUE WHERE to_id = $1 AND read = FALSE")
                .bind(to)
                .execute(&self.pool)
                .await?
                .rows_affected();
        Ok(affected)
    }

    async fn mark_read_many(&self, to: Uuid, ids: &[Uuid]) -> StoreResult<u64> {
        if ids.is_empty() {
            return Ok(0);
        }
        let affected = sqlx::query(
            "UPDATE notifications SET read = TRUE WHERE to_id = $1 AND id = ANY($2) AND read = FALSE",
        )
        .bind(to)
        .bind(ids)
        .execute(&self.pool)
        .await?
        .rows_affected();
        Ok(affected)
    }

    async fn mark_read(&self, id: Uuid, to: Uuid) -> StoreResult<Option<Notification>> {
        let row = sqlx::query_as::<_, NotificationRow>(
            r#"
            UPDATE notifications SET read = TRUE
            WHERE id = $1 AND to_id = $2
            RETURNING id, from_id, to_id, kind, post_id, read, created_at
            "#,
        )
        .bind(id)
        .bind(to)
        .fetch_optional(&self.pool)
        .await?;

        row.map(Notification::try_from).transpose()
    }

    async fn delete(&self, id: Uuid, to: Uuid) -> StoreResult<bool> {
        let affected = sqlx::query("DELETE FROM notifications WHERE id = $1 AND to_id = $2")
            .bind(id)
            .bind(to)
            .execute(&self.pool)
            .await?
            .rows_affected();
        Ok(affected > 0)
    }

    async fn delete_all(&self, to: Uuid) -> StoreResult<u64> {
        let affected = sqlx::query("DELETE FROM notifications WHERE to_id = $1")
            .bind(to)
            .execute(&self.pool)
            .await?
            .rows_affected();
        Ok(affected)
    }

    async fn count_unread(&self, to: Uuid) -> StoreResult<u64> {
        let count: i64 = sqlx::query_scalar(
            "SELECT COUNT(*) FROM notifications WHERE to_id = $1 AND read = FALSE",
        )
        .bind(to)
        .fetch_one(&self.pool)
        .await?;
        Ok(count.max(0) as u64)
    }
}
