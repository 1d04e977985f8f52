//! Notifications repository for database operations

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::{types::Json, Pool, Postgres};
use uuid::Uuid;

use super::NotificationStore;
use crate::{
    error::{AppError, AppResult},
    models::{
        notification::{
            ChannelDelivery, NewNotification, Notification, NotificationPreferences, NotificationQuery,
            NotificationRow, NotificationStatus,
        },
        Page,
    },
};

#[derive(Clone)]
pub struct NotificationsRepository {
    pool: Pool<Postgres>,
}

impl NotificationsRepository {
    pub fn new(pool: Pool<Postgres>) -> Self {
        Self { pool }
    }
}

/// Inbox predicate. `$1` is always the owner.
fn inbox_clause(query: &NotificationQuery) -> String {
    let mut clause = "WHERE user_id = $1".to_string();
    if query.unread_only.unwrap_or(false) {
        clause.push_str(" AND is_read = FALSE");
    }
    if query.notification_type.is_some() {
        clause.push_str(" AND notification_type = $2");
    }
    clause
}

#[async_trait]
impl NotificationStore for NotificationsRepository {
    async fn insert(&self, id: Uuid, notification: NewNotification, created_at: DateTime<Utc>) -> AppResult<Notification> {
        let pending = notification.into_pending(id, created_at);

        let row = sqlx::query_as::<_, NotificationRow>(
            r#"
            INSERT INTO notifications (
                id, user_id, notification_type, title, message, data,
                channels, priority, status, deliveries, is_read, created_at
            ) VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, FALSE, $11)
            RETURNING *
            "#,
        )
        .bind(pending.id)
        .bind(pending.user_id)
        .bind(&pending.notification_type)
        .bind(&pending.title)
        .bind(&pending.message)
        .bind(&pending.data)
        .bind(Json(&pending.channels))
        .bind(pending.priority)
        .bind(pending.status)
        .bind(Json(&pending.deliveries))
        .bind(pending.created_at)
        .fetch_one(&self.pool)
        .await?;

        Ok(row.into())
    }

    async fn record_dispatch(
        &self,
        id: Uuid,
        status: NotificationStatus,
        deliveries: &[ChannelDelivery],
        sent_at: DateTime<Utc>,
    ) -> AppResult<Notification> {
        sqlx::query_as::<_, NotificationRow>(
            "UPDATE notifications SET status = $1, deliveries = $2, sent_at = $3 WHERE id = $4 RETURNING *",
        )
        .bind(status)
        .bind(Json(deliveries))
        .bind(sent_at)
        .bind(id)
        .fetch_optional(&self.pool)
        .await?
        .map(Notification::from)
        .ok_or_else(|| AppError::NotFound(format!("Notification {} not found", id)))
    }

    async fn list(&self, user_id: Uuid, query: &NotificationQuery, page: Page) -> AppResult<(Vec<Notification>, i64)> {
        let where_clause = inbox_clause(query);

        let count_q = format!("SELECT COUNT(*) FROM notifications {}", where_clause);
        let mut count_builder = sqlx::query_scalar::<_, i64>(&count_q).bind(user_id);
        if let Some(ref t) = query.notification_type {
            count_builder = count_builder.bind(t.clone());
        }
        let total = count_builder.fetch_one(&self.pool).await?;

        let select_q = format!(
            "SELECT * FROM notifications {} ORDER BY created_at DESC LIMIT {} OFFSET {}",
            where_clause,
            page.per_page,
            page.offset()
        );
        let mut builder = sqlx::query_as::<_, NotificationRow>(&select_q).bind(user_id);
        if let Some(ref t) = query.notification_type {
            builder = builder.bind(t.clone());
        }
        let rows = builder.fetch_all(&self.pool).await?;

        Ok((rows.into_iter().map(Notification::from).collect(), total))
    }

    async fn unread_count(&self, user_id: Uuid) -> AppResult<i64> {
        let count = sqlx::query_scalar::<_, i64>(
            "SELECT COUNT(*) FROM notifications WHERE user_id = $1 AND is_read = FALSE",
        )
        .bind(user_id)
        .fetch_one(&self.pool)
        .await?;
        Ok(count)
    }

    async fn mark_read(&self, user_id: Uuid, id: Uuid, at: DateTime<Utc>) -> AppResult<bool> {
        // Already-read rows keep their original read_at
        let result = sqlx::query(
            r#"
            UPDATE notifications
            SET is_read = TRUE, read_at = COALESCE(read_at, $1)
            WHERE id = $2 AND user_id = $3
            "#,
        )
        .bind(at)
        .bind(id)
        .bind(user_id)
        .execute(&self.pool)
        .await?;
        Ok(result.rows_affected() > 0)
    }

    async fn mark_all_read(&self, user_id: Uuid, at: DateTime<Utc>) -> AppResult<u64> {
        let result = sqlx::query(
            "UPDATE notifications SET is_read = TRUE, read_at = $1 WHERE user_id = $2 AND is_read = FALSE",
        )
        .bind(at)
        .bind(user_id)
        .execute(&self.pool)
        .await?;
        Ok(result.rows_affected())
    }

    async fn delete(&self, user_id: Uuid, id: Uuid) -> AppResult<bool> {
        let result = sqlx::query("DELETE FROM notifications WHERE id = $1 AND user_id = $2")
            .bind(id)
            .bind(user_id)
            .execute(&self.pool)
            .await?;
        Ok(result.rows_affected() > 0)
    }

    async fn preferences(&self, user_id: Uuid) -> AppResult<Option<NotificationPreferences>> {
        let row = sqlx::query_as::<_, NotificationPreferences>(
            "SELECT * FROM notification_preferences WHERE user_id = $1",
        )
        .bind(user_id)
        .fetch_optional(&self.pool)
        .await?;
        Ok(row)
    }

    async fn save_preferences(&self, preferences: &NotificationPreferences) -> AppResult<NotificationPreferences> {
        let row = sqlx::query_as::<_, NotificationPreferences>(
            r#"
            INSERT INTO notification_preferences (
                user_id, email_enabled, sms_enabled, push_enabled, in_app_enabled, updated_at
            ) VALUES ($1, $2, $3, $4, $5, $6)
            ON CONFLICT (user_id) DO UPDATE SET
                email_enabled = EXCLUDED.email_enabled,
                sms_enabled = EXCLUDED.sms_enabled,
                push_enabled = EXCLUDED.push_enabled,
                in_app_enabled = EXCLUDED.in_app_enabled,
                updated_at = EXCLUDED.updated_at
            RETURNING *
            "#,
        )
        .bind(preferences.user_id)
        .bind(preferences.email_enabled)
        .bind(preferences.sms_enabled)
        .bind(preferences.push_enabled)
        .bind(preferences.in_app_enabled)
        .bind(preferences.updated_at)
        .fetch_one(&self.pool)
        .await?;
        Ok(row)
    }
}
