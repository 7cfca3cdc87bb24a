//! # tally-service: Sale Usecase for Tally POS
//!
//! The boundary between an authenticated caller and the sale engine.
//!
//! ## Request Flow
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                    create_sale                                          │
//! │                                                                         │
//! │  AuthContext { business_id, cashier_id }   CreateSaleRequest (JSON)    │
//! │         │                                          │                    │
//! │         ▼                                          ▼                    │
//! │  empty identity? ── 401            validate_sale_request ── 400        │
//! │         │                                          │                    │
//! │         └──────────────────┬───────────────────────┘                    │
//! │                            ▼                                            │
//! │     coordinator.create_sale_within(sale_timeout)  (commit untimed)    │
//! │                            │                                            │
//! │               ┌────────────┴────────────┐                               │
//! │               ▼                         ▼                               │
//! │        CreateSaleResponse          ApiError (status + body)            │
//! │               │                                                         │
//! │               ▼                                                         │
//! │   low-stock notifications (best effort, after commit)                  │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```

pub mod config;
pub mod error;

use chrono::Utc;
use std::time::Duration;
use tracing::{debug, info, warn};
use uuid::Uuid;

use tally_core::validation::validate_sale_request;
use tally_core::{
    low_stock_message, CreateSaleRequest, CreateSaleResponse, Notification, SaleError,
    SalesSummary, LOW_STOCK_NOTIFICATION,
};
use tally_db::{
    CompletedLine, CompletedSale, Database, DbError, NewSale, SaleCoordinator, SqliteSaleStore,
};

pub use config::{ConfigError, ServiceConfig};
pub use error::ApiError;

/// Identity of the caller, taken from the authenticated session.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AuthContext {
    pub business_id: String,
    pub cashier_id: String,
}

impl AuthContext {
    pub fn new(business_id: impl Into<String>, cashier_id: impl Into<String>) -> Self {
        AuthContext {
            business_id: business_id.into(),
            cashier_id: cashier_id.into(),
        }
    }

    fn is_complete(&self) -> bool {
        !self.business_id.trim().is_empty() && !self.cashier_id.trim().is_empty()
    }
}

/// Sale operations for one database.
///
/// ## Concurrency
/// Sales run on SQLite, which has one write lock per database file. A sale
/// takes it with its first write and keeps it until commit, so concurrent
/// sales are serialized even when they touch different products. Stock is
/// still never oversold. Per-product parallelism is only available through
/// [`tally_db::MemoryStore`].
#[derive(Debug, Clone)]
pub struct SaleService {
    db: Database,
    coordinator: SaleCoordinator<SqliteSaleStore>,
    sale_timeout: Duration,
    recent_sales_limit: u32,
}

impl SaleService {
    pub fn new(db: Database, config: &ServiceConfig) -> Self {
        SaleService {
            coordinator: SaleCoordinator::new(db.sale_store()),
            db,
            sale_timeout: config.sale_timeout(),
            recent_sales_limit: config.recent_sales_limit,
        }
    }

    /// Opens the configured database (running migrations) and wraps it.
    pub async fn connect(config: &ServiceConfig) -> Result<Self, DbError> {
        let db = Database::new(config.db_config()).await?;
        Ok(SaleService::new(db, config))
    }

    pub fn database(&self) -> &Database {
        &self.db
    }

    /// Creates a sale for the caller's business.
    ///
    /// ## Errors
    /// See [`error::status_for`] for the status of each failure kind.
    /// On any error nothing was written.
    pub async fn create_sale(
        &self,
        auth: &AuthContext,
        request: CreateSaleRequest,
    ) -> Result<CreateSaleResponse, ApiError> {
        if !auth.is_complete() {
            return Err(SaleError::Unauthorized.into());
        }
        validate_sale_request(&request).map_err(SaleError::from)?;

        let new_sale = NewSale::from_request(&auth.business_id, &auth.cashier_id, request);

        let completed = self
            .coordinator
            .create_sale_within(new_sale, self.sale_timeout)
            .await?;

        self.raise_low_stock_notifications(&completed).await;

        Ok(CreateSaleResponse::new(
            completed.sale_id,
            completed.total_amount,
        ))
    }

    /// Dashboard figures for a business, optionally one branch.
    pub async fn summary(
        &self,
        business_id: &str,
        branch_id: Option<&str>,
    ) -> Result<SalesSummary, ApiError> {
        let sales = self.db.sales();

        let total_sales_today = sales.count_today(business_id, branch_id).await?;
        let total_revenue = sales.total_revenue(business_id, branch_id).await?;
        let recent_sales = sales
            .recent(business_id, branch_id, self.recent_sales_limit)
            .await?;
        let low_stock_count = self
            .db
            .products()
            .count_low_stock(business_id, branch_id)
            .await?;

        Ok(SalesSummary {
            total_sales_today,
            total_revenue: total_revenue.to_major_units(),
            low_stock_count,
            recent_sales,
        })
    }

    /// Lists a business's notifications, newest first.
    pub async fn notifications(
        &self,
        business_id: &str,
        unread_only: bool,
        limit: u32,
        offset: u32,
    ) -> Result<Vec<Notification>, ApiError> {
        Ok(self
            .db
            .notifications()
            .list(business_id, unread_only, limit, offset)
            .await?)
    }

    pub async fn mark_notification_read(&self, id: &str, business_id: &str) -> Result<(), ApiError> {
        Ok(self.db.notifications().mark_read(id, business_id).await?)
    }

    /// Raises one unread low-stock notification per product left at or
    /// below its threshold. Failures are logged; the sale stays committed.
    async fn raise_low_stock_notifications(&self, completed: &CompletedSale) {
        for line in completed.low_stock_lines() {
            if let Err(err) = self.raise_low_stock(&completed.business_id, line).await {
                warn!(
                    sale_id = %completed.sale_id,
                    product_id = %line.product_id,
                    error = %err,
                    "Failed to create low-stock notification"
                );
            }
        }
    }

    async fn raise_low_stock(&self, business_id: &str, line: &CompletedLine) -> Result<(), DbError> {
        let repo = self.db.notifications();

        if repo
            .exists_unread_low_stock(business_id, &line.product_id)
            .await?
        {
            debug!(product_id = %line.product_id, "Unread low-stock notification exists");
            return Ok(());
        }

        let notification = Notification {
            id: Uuid::new_v4().to_string(),
            business_id: business_id.to_string(),
            product_id: line.product_id.clone(),
            notification_type: LOW_STOCK_NOTIFICATION.to_string(),
            message: low_stock_message(&line.product_name, line.remaining_stock),
            is_read: false,
            created_at: Utc::now().timestamp(),
        };
        repo.create(&notification).await?;

        info!(product_id = %line.product_id, remaining = line.remaining_stock, "Low stock");
        Ok(())
    }
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use tally_core::{Product, SaleItemRequest};
    use tally_db::test_support::product;
    use tally_db::{DbConfig, SaleStore};

    fn low_stock_product(id: &str, stock: i64, threshold: i64) -> Product {
        Product {
            low_stock_threshold: threshold,
            ..product(id, "biz-1", 1000, stock)
        }
    }

    fn request(items: &[(&str, i64)]) -> CreateSaleRequest {
        CreateSaleRequest {
            branch_id: "br-1".to_string(),
            payment_method: "cash".to_string(),
            items: items
                .iter()
                .map(|(id, qty)| SaleItemRequest::new(*id, *qty))
                .collect(),
        }
    }

    async fn service_with(products: &[Product], config: ServiceConfig) -> SaleService {
        let db = Database::new(DbConfig::in_memory()).await.unwrap();
        for p in products {
            db.products().insert(p).await.unwrap();
        }
        SaleService::new(db, &config)
    }

    fn cashier() -> AuthContext {
        AuthContext::new("biz-1", "cashier-1")
    }

    #[tokio::test]
    async fn test_create_sale_then_conflict() {
        let service = service_with(&[product("P", "biz-1", 1000, 5)], ServiceConfig::default()).await;

        let resp = service.create_sale(&cashier(), request(&[("P", 3)])).await.unwrap();
        assert!(resp.success);
        assert_eq!(resp.total_amount, 30.0);

        let err = service
            .create_sale(&cashier(), request(&[("P", 3)]))
            .await
            .unwrap_err();
        assert_eq!(err.status, 400);
        assert_eq!(err.message(), "insufficient stock for product P");
    }

    #[tokio::test]
    async fn test_missing_identity_is_unauthorized() {
        let service = service_with(&[product("P", "biz-1", 1000, 5)], ServiceConfig::default()).await;

        for auth in [AuthContext::new("", "cashier-1"), AuthContext::new("biz-1", " ")] {
            let err = service.create_sale(&auth, request(&[("P", 1)])).await.unwrap_err();
            assert_eq!(err.status, 401);
            assert_eq!(err.message(), "unauthorized");
        }
    }

    #[tokio::test]
    async fn test_invalid_request_never_reaches_storage() {
        let service = service_with(&[product("P", "biz-1", 1000, 5)], ServiceConfig::default()).await;

        for _ in 0..2 {
            let err = service
                .create_sale(&cashier(), request(&[("P", 0)]))
                .await
                .unwrap_err();
            assert_eq!(err.status, 400);
            assert_eq!(err.message(), "quantity must be greater than 0");
        }

        let mut empty = request(&[]);
        empty.payment_method = String::new();
        assert_eq!(service.create_sale(&cashier(), empty).await.unwrap_err().status, 400);

        let summary = service.summary("biz-1", None).await.unwrap();
        assert_eq!(summary.total_sales_today, 0);
    }

    #[tokio::test]
    async fn test_status_for_foreign_and_missing_products() {
        let service = service_with(
            &[product("P", "biz-1", 1000, 5), product("Q", "biz-2", 1000, 5)],
            ServiceConfig::default(),
        )
        .await;

        let err = service
            .create_sale(&cashier(), request(&[("Q", 1)]))
            .await
            .unwrap_err();
        assert_eq!(err.status, 400);
        assert_eq!(err.message(), "product does not belong to business");

        let err = service
            .create_sale(&cashier(), request(&[("Z", 1)]))
            .await
            .unwrap_err();
        assert_eq!(err.status, 500);
        assert_eq!(err.message(), "product not found");
    }

    #[tokio::test]
    async fn test_low_stock_notification_deduplicated() {
        let service = service_with(&[low_stock_product("P", 10, 5)], ServiceConfig::default()).await;

        service.create_sale(&cashier(), request(&[("P", 6)])).await.unwrap();
        service.create_sale(&cashier(), request(&[("P", 1)])).await.unwrap();

        let unread = service.notifications("biz-1", true, 10, 0).await.unwrap();
        assert_eq!(unread.len(), 1);
        assert_eq!(unread[0].message, "Product P is running low, only 4 items left.");

        service
            .mark_notification_read(&unread[0].id, "biz-1")
            .await
            .unwrap();
        service.create_sale(&cashier(), request(&[("P", 1)])).await.unwrap();

        let unread = service.notifications("biz-1", true, 10, 0).await.unwrap();
        assert_eq!(unread.len(), 1);
        assert_eq!(unread[0].message, "Product P is running low, only 2 items left.");
        assert_eq!(service.notifications("biz-1", false, 10, 0).await.unwrap().len(), 2);
    }

    #[tokio::test]
    async fn test_summary() {
        let service = service_with(
            &[low_stock_product("P", 10, 3), product("Q", "biz-1", 250, 10)],
            ServiceConfig {
                recent_sales_limit: 2,
                ..ServiceConfig::default()
            },
        )
        .await;

        service.create_sale(&cashier(), request(&[("P", 7)])).await.unwrap();
        service.create_sale(&cashier(), request(&[("Q", 2)])).await.unwrap();
        service.create_sale(&cashier(), request(&[("Q", 1)])).await.unwrap();

        let summary = service.summary("biz-1", None).await.unwrap();
        assert_eq!(summary.total_sales_today, 3);
        assert_eq!(summary.total_revenue, 77.5);
        assert_eq!(summary.low_stock_count, 1);
        assert_eq!(summary.recent_sales.len(), 2);

        let other = service.summary("biz-2", None).await.unwrap();
        assert_eq!(other.total_revenue, 0.0);
    }

    #[tokio::test]
    async fn test_timed_out_sale_rolls_back() {
        let service = service_with(
            &[product("P", "biz-1", 1000, 5)],
            ServiceConfig {
                sale_timeout_ms: 50,
                ..ServiceConfig::default()
            },
        )
        .await;

        // The in-memory pool has one connection; holding it stalls the sale.
        let holder = service.database().sale_store().begin().await.unwrap();

        let err = service
            .create_sale(&cashier(), request(&[("P", 1)]))
            .await
            .unwrap_err();
        assert_eq!(err.status, 500);
        assert_eq!(err.message(), error::INTERNAL_MESSAGE);

        drop(holder);
        let p = service.database().products().get_by_id("P").await.unwrap().unwrap();
        assert_eq!(p.quantity_in_stock, 5);
    }

    #[tokio::test]
    async fn test_mark_unknown_notification() {
        let service = service_with(&[], ServiceConfig::default()).await;
        let err = service.mark_notification_read("n-404", "biz-1").await.unwrap_err();
        assert_eq!(err.status, 404);
    }
}
