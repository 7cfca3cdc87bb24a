//! # Sale Repository
//!
//! Read-side database operations for sales and sale items.
//!
//! ## Sale Lifecycle
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                       Sale Lifecycle                                    │
//! │                                                                         │
//! │  1. CREATE (coordinator, one transaction)                              │
//! │     └── sale row (total 0) → items → stock → total → commit            │
//! │                                                                         │
//! │  2. READ (this repository)                                             │
//! │     └── get_by_id() / get_items()                                      │
//! │     └── count_today() / total_revenue() / recent()                     │
//! │                                                                         │
//! │  Sales are never updated after commit.                                 │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! Writes live in [`crate::store::sqlite`] so that they can only happen
//! inside the coordinator's transaction.

use chrono::{NaiveTime, Utc};
use sqlx::SqlitePool;
use tracing::debug;

use crate::error::DbResult;
use tally_core::{Money, Sale, SaleItem};

const SALE_COLUMNS: &str = r#"
    id,
    business_id,
    branch_id,
    cashier_id,
    total_amount_cents,
    payment_method,
    status,
    created_at
"#;

/// Repository for sale reads.
#[derive(Debug, Clone)]
pub struct SaleRepository {
    pool: SqlitePool,
}

impl SaleRepository {
    /// Creates a new SaleRepository.
    pub fn new(pool: SqlitePool) -> Self {
        SaleRepository { pool }
    }

    /// Gets a sale by ID, scoped to the owning business.
    pub async fn get_by_id(&self, id: &str, business_id: &str) -> DbResult<Option<Sale>> {
        let sql = format!("SELECT {SALE_COLUMNS} FROM sales WHERE id = ?1 AND business_id = ?2");

        let sale = sqlx::query_as::<_, Sale>(&sql)
            .bind(id)
            .bind(business_id)
            .fetch_optional(&self.pool)
            .await?;

        Ok(sale)
    }

    /// Gets all items for a sale, in insertion order.
    pub async fn get_items(&self, sale_id: &str) -> DbResult<Vec<SaleItem>> {
        let items = sqlx::query_as::<_, SaleItem>(
            r#"
            SELECT
                id,
                sale_id,
                product_id,
                quantity,
                unit_price_cents,
                subtotal_cents,
                created_at
            FROM sale_items
            WHERE sale_id = ?1
            ORDER BY created_at, rowid
            "#,
        )
        .bind(sale_id)
        .fetch_all(&self.pool)
        .await?;

        Ok(items)
    }

    /// Counts sales created at or after `since` (unix seconds).
    pub async fn count_since(
        &self,
        business_id: &str,
        branch_id: Option<&str>,
        since: i64,
    ) -> DbResult<i64> {
        let count: i64 = sqlx::query_scalar(
            r#"
            SELECT COUNT(*) FROM sales
            WHERE business_id = ?1
              AND (?2 IS NULL OR branch_id = ?2)
              AND created_at >= ?3
            "#,
        )
        .bind(business_id)
        .bind(branch_id)
        .bind(since)
        .fetch_one(&self.pool)
        .await?;

        Ok(count)
    }

    /// Counts sales created since midnight UTC today.
    pub async fn count_today(&self, business_id: &str, branch_id: Option<&str>) -> DbResult<i64> {
        self.count_since(business_id, branch_id, start_of_today()).await
    }

    /// Sums every sale total of a business (optionally one branch).
    ///
    /// A business with no sales has revenue zero.
    pub async fn total_revenue(&self, business_id: &str, branch_id: Option<&str>) -> DbResult<Money> {
        let total: Option<i64> = sqlx::query_scalar(
            r#"
            SELECT SUM(total_amount_cents) FROM sales
            WHERE business_id = ?1
              AND (?2 IS NULL OR branch_id = ?2)
            "#,
        )
        .bind(business_id)
        .bind(branch_id)
        .fetch_one(&self.pool)
        .await?;

        Ok(Money::from_cents(total.unwrap_or(0)))
    }

    /// Most recent sales, newest first.
    pub async fn recent(
        &self,
        business_id: &str,
        branch_id: Option<&str>,
        limit: u32,
    ) -> DbResult<Vec<Sale>> {
        debug!(business_id = %business_id, limit = limit, "Loading recent sales");

        let sql = format!(
            "SELECT {SALE_COLUMNS} FROM sales \
             WHERE business_id = ?1 AND (?2 IS NULL OR branch_id = ?2) \
             ORDER BY created_at DESC, rowid DESC \
             LIMIT ?3"
        );

        let sales = sqlx::query_as::<_, Sale>(&sql)
            .bind(business_id)
            .bind(branch_id)
            .bind(limit)
            .fetch_all(&self.pool)
            .await?;

        Ok(sales)
    }
}

/// Midnight UTC today as unix seconds.
fn start_of_today() -> i64 {
    Utc::now().date_naive().and_time(NaiveTime::MIN).and_utc().timestamp()
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::pool::{Database, DbConfig};
    use crate::store::{SaleStore, SaleTransaction};
    use crate::test_support::sale;

    async fn record(db: &Database, sale: &Sale) {
        let mut tx = db.sale_store().begin().await.unwrap();
        tx.insert_sale(sale).await.unwrap();
        tx.commit().await.unwrap();
    }

    #[tokio::test]
    async fn test_empty_business_has_zero_revenue() {
        let db = Database::new(DbConfig::in_memory()).await.unwrap();
        let repo = db.sales();

        assert_eq!(repo.total_revenue("biz-1", None).await.unwrap(), Money::zero());
        assert_eq!(repo.count_today("biz-1", None).await.unwrap(), 0);
        assert!(repo.recent("biz-1", None, 5).await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_counts_and_revenue_by_branch() {
        let db = Database::new(DbConfig::in_memory()).await.unwrap();
        let now = Utc::now().timestamp();

        let mut a = sale("s-1", "biz-1", 3000, now);
        a.branch_id = "br-1".to_string();
        let mut b = sale("s-2", "biz-1", 1500, now);
        b.branch_id = "br-2".to_string();
        let old = sale("s-3", "biz-1", 500, now - 3 * 86_400);
        let foreign = sale("s-4", "biz-2", 9900, now);

        for s in [&a, &b, &old, &foreign] {
            record(&db, s).await;
        }

        let repo = db.sales();
        assert_eq!(repo.count_today("biz-1", None).await.unwrap(), 2);
        assert_eq!(repo.count_today("biz-1", Some("br-2")).await.unwrap(), 1);
        assert_eq!(
            repo.total_revenue("biz-1", None).await.unwrap(),
            Money::from_cents(5000)
        );
        assert_eq!(
            repo.total_revenue("biz-1", Some("br-1")).await.unwrap(),
            Money::from_cents(3500)
        );
    }

    #[tokio::test]
    async fn test_recent_newest_first_with_limit() {
        let db = Database::new(DbConfig::in_memory()).await.unwrap();

        for (i, at) in [100, 300, 200].into_iter().enumerate() {
            record(&db, &sale(&format!("s-{i}"), "biz-1", 100, at)).await;
        }

        let recent = db.sales().recent("biz-1", None, 2).await.unwrap();
        let ids: Vec<_> = recent.iter().map(|s| s.id.as_str()).collect();
        assert_eq!(ids, ["s-1", "s-2"]);
    }

    #[tokio::test]
    async fn test_get_by_id_scoped_to_business() {
        let db = Database::new(DbConfig::in_memory()).await.unwrap();
        record(&db, &sale("s-1", "biz-1", 100, 0)).await;

        let repo = db.sales();
        assert!(repo.get_by_id("s-1", "biz-1").await.unwrap().is_some());
        assert!(repo.get_by_id("s-1", "biz-2").await.unwrap().is_none());
    }
}
