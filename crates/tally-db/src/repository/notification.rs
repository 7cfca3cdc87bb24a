//! # Notification Repository
//!
//! Per-business notifications. The sale flow raises `low_stock`
//! notifications after commit; the CLI lists and acknowledges them.

use sqlx::SqlitePool;
use tracing::debug;

use crate::error::{DbError, DbResult};
use tally_core::{Notification, LOW_STOCK_NOTIFICATION};

/// Repository for notification database operations.
#[derive(Debug, Clone)]
pub struct NotificationRepository {
    pool: SqlitePool,
}

impl NotificationRepository {
    /// Creates a new NotificationRepository.
    pub fn new(pool: SqlitePool) -> Self {
        NotificationRepository { pool }
    }

    /// Inserts a notification.
    pub async fn create(&self, notification: &Notification) -> DbResult<()> {
        debug!(
            business_id = %notification.business_id,
            product_id = %notification.product_id,
            kind = %notification.notification_type,
            "Creating notification"
        );

        sqlx::query(
            r#"
            INSERT INTO notifications (
                id, business_id, product_id, notification_type,
                message, is_read, created_at
            ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7)
            "#,
        )
        .bind(&notification.id)
        .bind(&notification.business_id)
        .bind(&notification.product_id)
        .bind(&notification.notification_type)
        .bind(&notification.message)
        .bind(notification.is_read)
        .bind(notification.created_at)
        .execute(&self.pool)
        .await?;

        Ok(())
    }

    /// Lists notifications for a business, newest first.
    pub async fn list(
        &self,
        business_id: &str,
        unread_only: bool,
        limit: u32,
        offset: u32,
    ) -> DbResult<Vec<Notification>> {
        let notifications = sqlx::query_as::<_, Notification>(
            r#"
            SELECT
                id,
                business_id,
                product_id,
                notification_type,
                message,
                is_read,
                created_at
            FROM notifications
            WHERE business_id = ?1
              AND (?2 = 0 OR is_read = 0)
            ORDER BY created_at DESC, rowid DESC
            LIMIT ?3 OFFSET ?4
            "#,
        )
        .bind(business_id)
        .bind(unread_only)
        .bind(limit)
        .bind(offset)
        .fetch_all(&self.pool)
        .await?;

        Ok(notifications)
    }

    /// Marks one of a business's notifications as read.
    ///
    /// ## Errors
    /// `DbError::NotFound` if the id does not exist for this business.
    pub async fn mark_read(&self, id: &str, business_id: &str) -> DbResult<()> {
        let result = sqlx::query(
            "UPDATE notifications SET is_read = 1 WHERE id = ?1 AND business_id = ?2",
        )
        .bind(id)
        .bind(business_id)
        .execute(&self.pool)
        .await?;

        if result.rows_affected() == 0 {
            return Err(DbError::not_found("Notification", id));
        }

        Ok(())
    }

    /// Checks for an unread low-stock notification on a product.
    pub async fn exists_unread_low_stock(&self, business_id: &str, product_id: &str) -> DbResult<bool> {
        let count: i64 = sqlx::query_scalar(
            r#"
            SELECT COUNT(1) FROM notifications
            WHERE business_id = ?1
              AND product_id = ?2
              AND notification_type = ?3
              AND is_read = 0
            "#,
        )
        .bind(business_id)
        .bind(product_id)
        .bind(LOW_STOCK_NOTIFICATION)
        .fetch_one(&self.pool)
        .await?;

        Ok(count > 0)
    }
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::pool::{Database, DbConfig};
    use crate::test_support::low_stock_notification;

    #[tokio::test]
    async fn test_create_list_and_mark_read() {
        let db = Database::new(DbConfig::in_memory()).await.unwrap();
        let repo = db.notifications();

        repo.create(&low_stock_notification("n-1", "biz-1", "p-1", 10))
            .await
            .unwrap();
        repo.create(&low_stock_notification("n-2", "biz-1", "p-2", 20))
            .await
            .unwrap();
        repo.create(&low_stock_notification("n-3", "biz-2", "p-3", 30))
            .await
            .unwrap();

        let all = repo.list("biz-1", false, 10, 0).await.unwrap();
        let ids: Vec<_> = all.iter().map(|n| n.id.as_str()).collect();
        assert_eq!(ids, ["n-2", "n-1"]);

        repo.mark_read("n-2", "biz-1").await.unwrap();
        let unread = repo.list("biz-1", true, 10, 0).await.unwrap();
        assert_eq!(unread.len(), 1);
        assert_eq!(unread[0].id, "n-1");

        let page = repo.list("biz-1", false, 1, 1).await.unwrap();
        assert_eq!(page[0].id, "n-1");
    }

    #[tokio::test]
    async fn test_mark_read_other_business_fails() {
        let db = Database::new(DbConfig::in_memory()).await.unwrap();
        let repo = db.notifications();

        repo.create(&low_stock_notification("n-1", "biz-1", "p-1", 10))
            .await
            .unwrap();

        let err = repo.mark_read("n-1", "biz-2").await.unwrap_err();
        assert!(matches!(err, DbError::NotFound { .. }));
    }

    #[tokio::test]
    async fn test_exists_unread_low_stock() {
        let db = Database::new(DbConfig::in_memory()).await.unwrap();
        let repo = db.notifications();

        assert!(!repo.exists_unread_low_stock("biz-1", "p-1").await.unwrap());

        repo.create(&low_stock_notification("n-1", "biz-1", "p-1", 10))
            .await
            .unwrap();
        assert!(repo.exists_unread_low_stock("biz-1", "p-1").await.unwrap());

        repo.mark_read("n-1", "biz-1").await.unwrap();
        assert!(!repo.exists_unread_low_stock("biz-1", "p-1").await.unwrap());
    }
}
