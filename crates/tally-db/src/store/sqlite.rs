//! # SQLite Sale Store
//!
//! Sale transactions on top of a `sqlx` SQLite transaction.
//!
//! ## Locking
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │  SQLite has one writer per database.                                    │
//! │                                                                         │
//! │  Sale A: BEGIN ─► INSERT sales ───────────────────────────► COMMIT     │
//! │                   (write lock taken here)                   (released) │
//! │                                                                         │
//! │  Sale B: BEGIN ─► INSERT sales ··· busy wait ···············► proceeds │
//! │                                                                         │
//! │  The sale header is the first statement, so a transaction holds the   │
//! │  write lock before it reads any product. Every product row it reads   │
//! │  afterwards is locked against other sales until commit or rollback.   │
//! │  A wait longer than busy_timeout fails the sale with DbError::Busy.   │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```

use async_trait::async_trait;
use chrono::Utc;
use sqlx::{Sqlite, SqlitePool, Transaction};
use tracing::debug;

use crate::error::{DbError, DbResult, PRODUCT};
use crate::repository::product::PRODUCT_COLUMNS;
use crate::store::{SaleStore, SaleTransaction};
use tally_core::{Money, Product, Sale, SaleItem};

/// Opens sale transactions on a SQLite pool.
#[derive(Debug, Clone)]
pub struct SqliteSaleStore {
    pool: SqlitePool,
}

impl SqliteSaleStore {
    pub fn new(pool: SqlitePool) -> Self {
        SqliteSaleStore { pool }
    }
}

#[async_trait]
impl SaleStore for SqliteSaleStore {
    type Tx = SqliteSaleTransaction;

    async fn begin(&self) -> DbResult<SqliteSaleTransaction> {
        let tx = self
            .pool
            .begin()
            .await
            .map_err(|e| DbError::transaction(e.to_string()))?;

        Ok(SqliteSaleTransaction { tx })
    }
}

/// An open SQLite transaction. Dropping it without commit rolls back.
pub struct SqliteSaleTransaction {
    tx: Transaction<'static, Sqlite>,
}

#[async_trait]
impl SaleTransaction for SqliteSaleTransaction {
    async fn insert_sale(&mut self, sale: &Sale) -> DbResult<()> {
        debug!(id = %sale.id, business_id = %sale.business_id, "Inserting sale");

        sqlx::query(
            r#"
            INSERT INTO sales (
                id, business_id, branch_id, cashier_id,
                total_amount_cents, payment_method, status, created_at
            ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8)
            "#,
        )
        .bind(&sale.id)
        .bind(&sale.business_id)
        .bind(&sale.branch_id)
        .bind(&sale.cashier_id)
        .bind(sale.total_amount_cents)
        .bind(&sale.payment_method)
        .bind(sale.status)
        .bind(sale.created_at)
        .execute(&mut *self.tx)
        .await?;

        Ok(())
    }

    async fn lock_product(&mut self, product_id: &str) -> DbResult<Option<Product>> {
        let sql = format!(
            "SELECT {PRODUCT_COLUMNS} FROM products WHERE id = ?1 AND deleted_at IS NULL"
        );

        let product = sqlx::query_as::<_, Product>(&sql)
            .bind(product_id)
            .fetch_optional(&mut *self.tx)
            .await?;

        Ok(product)
    }

    async fn insert_sale_item(&mut self, item: &SaleItem) -> DbResult<()> {
        debug!(sale_id = %item.sale_id, product_id = %item.product_id, "Adding sale item");

        sqlx::query(
            r#"
            INSERT INTO sale_items (
                id, sale_id, product_id, quantity,
                unit_price_cents, subtotal_cents, created_at
            ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7)
            "#,
        )
        .bind(&item.id)
        .bind(&item.sale_id)
        .bind(&item.product_id)
        .bind(item.quantity)
        .bind(item.unit_price_cents)
        .bind(item.subtotal_cents)
        .bind(item.created_at)
        .execute(&mut *self.tx)
        .await?;

        Ok(())
    }

    async fn update_stock(&mut self, product_id: &str, new_stock: i64) -> DbResult<()> {
        let now = Utc::now().timestamp();

        let result = sqlx::query(
            "UPDATE products SET quantity_in_stock = ?2, updated_at = ?3 WHERE id = ?1",
        )
        .bind(product_id)
        .bind(new_stock)
        .bind(now)
        .execute(&mut *self.tx)
        .await?;

        if result.rows_affected() == 0 {
            return Err(DbError::not_found(PRODUCT, product_id));
        }

        Ok(())
    }

    async fn update_sale_total(&mut self, sale_id: &str, total: Money) -> DbResult<()> {
        let result = sqlx::query("UPDATE sales SET total_amount_cents = ?2 WHERE id = ?1")
            .bind(sale_id)
            .bind(total.cents())
            .execute(&mut *self.tx)
            .await?;

        if result.rows_affected() == 0 {
            return Err(DbError::not_found("Sale", sale_id));
        }

        Ok(())
    }

    async fn commit(self) -> DbResult<()> {
        self.tx
            .commit()
            .await
            .map_err(|e| DbError::transaction(e.to_string()))
    }

    async fn rollback(self) -> DbResult<()> {
        self.tx
            .rollback()
            .await
            .map_err(|e| DbError::transaction(e.to_string()))
    }
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::pool::{Database, DbConfig};
    use crate::test_support::{product, sale};

    #[tokio::test]
    async fn test_rollback_discards_writes() {
        let db = Database::new(DbConfig::in_memory()).await.unwrap();
        db.products().insert(&product("p-1", "biz-1", 1000, 5)).await.unwrap();

        let store = db.sale_store();
        let mut tx = store.begin().await.unwrap();
        tx.insert_sale(&sale("s-1", "biz-1", 0, 0)).await.unwrap();
        tx.update_stock("p-1", 1).await.unwrap();
        assert_eq!(
            tx.lock_product("p-1").await.unwrap().unwrap().quantity_in_stock,
            1
        );
        tx.rollback().await.unwrap();

        let p = db.products().get_by_id("p-1").await.unwrap().unwrap();
        assert_eq!(p.quantity_in_stock, 5);
        assert!(db.sales().get_by_id("s-1", "biz-1").await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_drop_rolls_back() {
        let db = Database::new(DbConfig::in_memory()).await.unwrap();
        db.products().insert(&product("p-1", "biz-1", 1000, 5)).await.unwrap();

        {
            let mut tx = db.sale_store().begin().await.unwrap();
            tx.update_stock("p-1", 0).await.unwrap();
        }

        let p = db.products().get_by_id("p-1").await.unwrap().unwrap();
        assert_eq!(p.quantity_in_stock, 5);
    }

    #[tokio::test]
    async fn test_negative_stock_rejected_by_schema() {
        let db = Database::new(DbConfig::in_memory()).await.unwrap();
        db.products().insert(&product("p-1", "biz-1", 1000, 5)).await.unwrap();

        let mut tx = db.sale_store().begin().await.unwrap();
        let err = tx.update_stock("p-1", -1).await.unwrap_err();
        assert!(matches!(err, DbError::CheckViolation { .. }));
    }

    #[tokio::test]
    async fn test_lock_skips_soft_deleted() {
        let db = Database::new(DbConfig::in_memory()).await.unwrap();
        db.products().insert(&product("p-1", "biz-1", 1000, 5)).await.unwrap();
        db.products().soft_delete("p-1", "biz-1").await.unwrap();

        let mut tx = db.sale_store().begin().await.unwrap();
        assert!(tx.lock_product("p-1").await.unwrap().is_none());
        assert!(tx.lock_product("nope").await.unwrap().is_none());
    }
}
