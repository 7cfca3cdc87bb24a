//! # Domain Types
//!
//! Rows the sale engine reads and writes.
//!
//! ## Type Hierarchy
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                         Domain Types                                    │
//! │                                                                         │
//! │  ┌─────────────────┐   ┌─────────────────┐   ┌─────────────────┐       │
//! │  │    Product      │   │      Sale       │   │    SaleItem     │       │
//! │  │  ─────────────  │   │  ─────────────  │   │  ─────────────  │       │
//! │  │  id             │   │  id (UUID)      │   │  id (UUID)      │       │
//! │  │  business_id    │◄──│  business_id    │   │  sale_id (FK)   │       │
//! │  │  selling_price  │   │  total_amount   │◄──│  subtotal       │       │
//! │  │  stock (>= 0)   │   │  status         │   │  unit_price     │       │
//! │  └─────────────────┘   └─────────────────┘   └─────────────────┘       │
//! │                                                                         │
//! │  ┌─────────────────┐   ┌─────────────────┐                             │
//! │  │  Notification   │   │   SaleStatus    │                             │
//! │  │  low_stock      │   │  Completed      │                             │
//! │  └─────────────────┘   └─────────────────┘                             │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! Timestamps are unix seconds.

use serde::{Deserialize, Serialize};
use ts_rs::TS;

use crate::money::Money;

// =============================================================================
// Product
// =============================================================================

/// A sellable product. The sale engine only mutates `quantity_in_stock`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS)]
#[cfg_attr(feature = "sqlx", derive(sqlx::FromRow))]
#[ts(export)]
pub struct Product {
    pub id: String,

    /// Owning business (tenant).
    pub business_id: String,

    pub branch_id: String,

    /// Display name, used in low-stock notifications.
    pub name: String,

    /// Current selling price in minor units. Authoritative at sale time.
    pub selling_price_cents: i64,

    pub cost_price_cents: i64,

    /// Sellable units. Never below zero.
    pub quantity_in_stock: i64,

    /// Stock at or below this level raises a low-stock notification.
    pub low_stock_threshold: i64,

    pub created_at: i64,

    pub updated_at: i64,

    /// Soft delete marker. Deleted products cannot be sold.
    pub deleted_at: Option<i64>,
}

impl Product {
    /// Returns the selling price as Money.
    #[inline]
    pub fn selling_price(&self) -> Money {
        Money::from_cents(self.selling_price_cents)
    }

    /// Checks whether the product has been soft-deleted.
    #[inline]
    pub fn is_deleted(&self) -> bool {
        self.deleted_at.is_some()
    }

    /// Checks whether the given stock level counts as low for this product.
    #[inline]
    pub fn is_low_stock(&self, stock: i64) -> bool {
        stock <= self.low_stock_threshold
    }
}

// =============================================================================
// Sale Status
// =============================================================================

/// The status of a sale. The engine only ever produces `Completed`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize, TS)]
#[cfg_attr(feature = "sqlx", derive(sqlx::Type))]
#[cfg_attr(feature = "sqlx", sqlx(rename_all = "lowercase"))]
#[ts(export)]
#[serde(rename_all = "snake_case")]
pub enum SaleStatus {
    #[default]
    Completed,
}

// =============================================================================
// Sale
// =============================================================================

/// One completed sale.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS)]
#[cfg_attr(feature = "sqlx", derive(sqlx::FromRow))]
#[ts(export)]
pub struct Sale {
    pub id: String,
    pub business_id: String,
    pub branch_id: String,
    /// Staff member or owner who rang the sale up.
    pub cashier_id: String,
    /// Sum of item subtotals, computed under lock.
    pub total_amount_cents: i64,
    /// Free-form ("cash", "card", "transfer", ...).
    pub payment_method: String,
    pub status: SaleStatus,
    pub created_at: i64,
}

impl Sale {
    /// Returns the total as Money.
    #[inline]
    pub fn total_amount(&self) -> Money {
        Money::from_cents(self.total_amount_cents)
    }
}

// =============================================================================
// Sale Item
// =============================================================================

/// A line in a sale.
/// Uses the snapshot pattern: the unit price is frozen at time of sale.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS)]
#[cfg_attr(feature = "sqlx", derive(sqlx::FromRow))]
#[ts(export)]
pub struct SaleItem {
    pub id: String,
    pub sale_id: String,
    pub product_id: String,
    pub quantity: i64,
    /// Selling price at time of sale (frozen).
    pub unit_price_cents: i64,
    /// unit_price × quantity.
    pub subtotal_cents: i64,
    pub created_at: i64,
}

impl SaleItem {
    #[inline]
    pub fn subtotal(&self) -> Money {
        Money::from_cents(self.subtotal_cents)
    }
}

// =============================================================================
// Notification
// =============================================================================

/// A per-business notification (currently only low stock).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS)]
#[cfg_attr(feature = "sqlx", derive(sqlx::FromRow))]
#[ts(export)]
pub struct Notification {
    pub id: String,
    pub business_id: String,
    pub product_id: String,
    /// See [`crate::LOW_STOCK_NOTIFICATION`].
    pub notification_type: String,
    pub message: String,
    pub is_read: bool,
    pub created_at: i64,
}

/// Message shown for a low-stock notification.
pub fn low_stock_message(product_name: &str, remaining: i64) -> String {
    format!("{product_name} is running low, only {remaining} items left.")
}

// =============================================================================
// Sales Summary
// =============================================================================

/// Dashboard figures for a business (optionally one branch).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct SalesSummary {
    pub total_sales_today: i64,
    pub total_revenue: f64,
    pub low_stock_count: i64,
    pub recent_sales: Vec<Sale>,
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    fn product() -> Product {
        Product {
            id: "p-1".to_string(),
            business_id: "biz-1".to_string(),
            branch_id: "br-1".to_string(),
            name: "Bread".to_string(),
            selling_price_cents: 1000,
            cost_price_cents: 600,
            quantity_in_stock: 5,
            low_stock_threshold: 2,
            created_at: 0,
            updated_at: 0,
            deleted_at: None,
        }
    }

    #[test]
    fn test_product_helpers() {
        let p = product();
        assert_eq!(p.selling_price(), Money::from_cents(1000));
        assert!(!p.is_deleted());
        assert!(p.is_low_stock(2));
        assert!(!p.is_low_stock(3));
    }

    #[test]
    fn test_sale_status_serializes_lowercase() {
        let json = serde_json::to_string(&SaleStatus::Completed).unwrap();
        assert_eq!(json, "\"completed\"");
    }

    #[test]
    fn test_low_stock_message() {
        assert_eq!(
            low_stock_message("Bread", 2),
            "Bread is running low, only 2 items left."
        );
    }
}
