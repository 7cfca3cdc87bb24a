//! # Product Repository
//!
//! Database operations for products outside of a sale.
//!
//! ## Key Operations
//! - Insert (seeding, tests)
//! - Lookup by id (soft-delete aware)
//! - Soft delete
//! - Low-stock counting for the sales summary
//!
//! Stock is never written here. The only writer of `quantity_in_stock` is
//! the sale coordinator, inside its transaction.

use chrono::Utc;
use sqlx::SqlitePool;
use tracing::debug;

use crate::error::{DbError, DbResult, PRODUCT};
use tally_core::Product;

/// Column list shared by every product SELECT.
pub(crate) const PRODUCT_COLUMNS: &str = r#"
    id,
    business_id,
    branch_id,
    name,
    selling_price_cents,
    cost_price_cents,
    quantity_in_stock,
    low_stock_threshold,
    created_at,
    updated_at,
    deleted_at
"#;

/// Repository for product database operations.
///
/// ## Usage
/// ```rust,ignore
/// let repo = ProductRepository::new(pool);
///
/// repo.insert(&product).await?;
/// let product = repo.get_by_id("p-1").await?;
/// let low = repo.count_low_stock("biz-1", None).await?;
/// ```
#[derive(Debug, Clone)]
pub struct ProductRepository {
    pool: SqlitePool,
}

impl ProductRepository {
    /// Creates a new ProductRepository.
    pub fn new(pool: SqlitePool) -> Self {
        ProductRepository { pool }
    }

    /// Inserts a product.
    pub async fn insert(&self, product: &Product) -> DbResult<()> {
        debug!(id = %product.id, business_id = %product.business_id, "Inserting product");

        sqlx::query(
            r#"
            INSERT INTO products (
                id, business_id, branch_id, name,
                selling_price_cents, cost_price_cents,
                quantity_in_stock, low_stock_threshold,
                created_at, updated_at, deleted_at
            ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11)
            "#,
        )
        .bind(&product.id)
        .bind(&product.business_id)
        .bind(&product.branch_id)
        .bind(&product.name)
        .bind(product.selling_price_cents)
        .bind(product.cost_price_cents)
        .bind(product.quantity_in_stock)
        .bind(product.low_stock_threshold)
        .bind(product.created_at)
        .bind(product.updated_at)
        .bind(product.deleted_at)
        .execute(&self.pool)
        .await?;

        Ok(())
    }

    /// Gets a product by its ID.
    ///
    /// ## Returns
    /// * `Ok(Some(Product))` - Product found
    /// * `Ok(None)` - Product not found or soft-deleted
    pub async fn get_by_id(&self, id: &str) -> DbResult<Option<Product>> {
        let sql = format!(
            "SELECT {PRODUCT_COLUMNS} FROM products WHERE id = ?1 AND deleted_at IS NULL"
        );

        let product = sqlx::query_as::<_, Product>(&sql)
            .bind(id)
            .fetch_optional(&self.pool)
            .await?;

        Ok(product)
    }

    /// Soft-deletes a product owned by `business_id`.
    ///
    /// ## Errors
    /// `DbError::NotFound` if no live product matches.
    pub async fn soft_delete(&self, id: &str, business_id: &str) -> DbResult<()> {
        let now = Utc::now().timestamp();

        let result = sqlx::query(
            r#"
            UPDATE products SET deleted_at = ?3, updated_at = ?3
            WHERE id = ?1 AND business_id = ?2 AND deleted_at IS NULL
            "#,
        )
        .bind(id)
        .bind(business_id)
        .bind(now)
        .execute(&self.pool)
        .await?;

        if result.rows_affected() == 0 {
            return Err(DbError::not_found(PRODUCT, id));
        }

        debug!(id = %id, "Product soft-deleted");
        Ok(())
    }

    /// Counts live products at or below their low-stock threshold.
    ///
    /// `branch_id = None` counts across every branch of the business.
    pub async fn count_low_stock(&self, business_id: &str, branch_id: Option<&str>) -> DbResult<i64> {
        let count: i64 = sqlx::query_scalar(
            r#"
            SELECT COUNT(*) FROM products
            WHERE business_id = ?1
              AND (?2 IS NULL OR branch_id = ?2)
              AND deleted_at IS NULL
              AND quantity_in_stock <= low_stock_threshold
            "#,
        )
        .bind(business_id)
        .bind(branch_id)
        .fetch_one(&self.pool)
        .await?;

        Ok(count)
    }
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::pool::{Database, DbConfig};
    use crate::test_support::product;

    #[tokio::test]
    async fn test_insert_and_get() {
        let db = Database::new(DbConfig::in_memory()).await.unwrap();
        let repo = db.products();

        repo.insert(&product("p-1", "biz-1", 1000, 5)).await.unwrap();

        let found = repo.get_by_id("p-1").await.unwrap().unwrap();
        assert_eq!(found.name, "Product p-1");
        assert_eq!(found.quantity_in_stock, 5);
        assert!(repo.get_by_id("missing").await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_duplicate_insert_is_unique_violation() {
        let db = Database::new(DbConfig::in_memory()).await.unwrap();
        let repo = db.products();

        repo.insert(&product("p-1", "biz-1", 1000, 5)).await.unwrap();
        let err = repo.insert(&product("p-1", "biz-1", 1000, 5)).await.unwrap_err();
        assert!(matches!(err, DbError::UniqueViolation { .. }));
    }

    #[tokio::test]
    async fn test_soft_delete_hides_product() {
        let db = Database::new(DbConfig::in_memory()).await.unwrap();
        let repo = db.products();

        let mut p = product("p-1", "biz-1", 1000, 5);
        p.low_stock_threshold = 10;
        repo.insert(&p).await.unwrap();
        assert_eq!(repo.count_low_stock("biz-1", None).await.unwrap(), 1);

        // Wrong business cannot delete it
        assert!(repo.soft_delete("p-1", "biz-2").await.is_err());

        repo.soft_delete("p-1", "biz-1").await.unwrap();
        assert!(repo.get_by_id("p-1").await.unwrap().is_none());
        assert_eq!(repo.count_low_stock("biz-1", None).await.unwrap(), 0);
    }

    #[tokio::test]
    async fn test_count_low_stock() {
        let db = Database::new(DbConfig::in_memory()).await.unwrap();
        let repo = db.products();

        let mut low = product("p-1", "biz-1", 1000, 2);
        low.low_stock_threshold = 3;
        let mut other_branch = product("p-2", "biz-1", 1000, 1);
        other_branch.branch_id = "br-2".to_string();
        other_branch.low_stock_threshold = 3;
        let plenty = product("p-3", "biz-1", 1000, 50);

        for p in [&low, &other_branch, &plenty] {
            repo.insert(p).await.unwrap();
        }

        assert_eq!(repo.count_low_stock("biz-1", None).await.unwrap(), 2);
        assert_eq!(repo.count_low_stock("biz-1", Some("br-1")).await.unwrap(), 1);
        assert_eq!(repo.count_low_stock("biz-2", None).await.unwrap(), 0);
    }
}
