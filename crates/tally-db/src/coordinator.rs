//! # Sale Coordinator
//!
//! Runs one sale as a single atomic, isolated unit of work.
//!
//! ## Flow
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                     create_sale(NewSale)                                │
//! │                                                                         │
//! │  begin ─► insert sale (total 0, completed)                             │
//! │       │                                                                 │
//! │       ▼                                                                 │
//! │  lock distinct products in ascending id order                          │
//! │       │                                                                 │
//! │       ▼                                                                 │
//! │  for each item (request order):                                        │
//! │       ├── product missing / deleted?   → NotFound                      │
//! │       ├── other business?              → Forbidden  (warn)             │
//! │       ├── quantity <= 0?               → InvalidInput                  │
//! │       ├── quantity > stock?            → Conflict                      │
//! │       ├── subtotal = price × quantity                                  │
//! │       ├── insert sale item                                             │
//! │       ├── stock - quantity < 0?        → Conflict                      │
//! │       ├── update stock                                                 │
//! │       └── total += subtotal                                            │
//! │       │                                                                 │
//! │       ▼                                                                 │
//! │  update sale total ─► commit                                           │
//! │                                                                         │
//! │  Any error: rollback. No sale, no items, no stock change.              │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! The coordinator is the only place that decides to roll back. If the
//! future is dropped mid-sale (timeout, cancelled request) the open
//! transaction is dropped with it, which also rolls back. Deadlines go
//! through [`SaleCoordinator::create_sale_within`], which stops timing at
//! commit: a commit already handed to the database cannot be taken back.

use std::time::Duration;

use chrono::Utc;
use tracing::{debug, info, warn};
use uuid::Uuid;

use crate::store::{SaleStore, SaleTransaction};
use tally_core::aggregator::line_subtotal;
use tally_core::{
    CreateSaleRequest, LockPlan, Money, Product, Sale, SaleError, SaleItem, SaleItemRequest,
    SaleResult, SaleStatus, SaleTotal, ValidationError,
};

// =============================================================================
// Input / Output
// =============================================================================

/// A validated sale request plus the session identity it runs under.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewSale {
    pub business_id: String,
    pub cashier_id: String,
    pub branch_id: String,
    pub payment_method: String,
    pub items: Vec<SaleItemRequest>,
}

impl NewSale {
    /// Combines a wire request with the authenticated business and cashier.
    pub fn from_request(
        business_id: impl Into<String>,
        cashier_id: impl Into<String>,
        request: CreateSaleRequest,
    ) -> Self {
        NewSale {
            business_id: business_id.into(),
            cashier_id: cashier_id.into(),
            branch_id: request.branch_id,
            payment_method: request.payment_method,
            items: request.items,
        }
    }
}

/// One committed line.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CompletedLine {
    pub product_id: String,
    pub product_name: String,
    pub quantity: i64,
    pub unit_price: Money,
    pub subtotal: Money,
    /// Stock left on the product right after this line.
    pub remaining_stock: i64,
    /// `remaining_stock` is at or below the product's low-stock threshold.
    pub low_stock: bool,
}

/// Result of a committed sale.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CompletedSale {
    pub sale_id: String,
    pub business_id: String,
    pub total_amount: Money,
    pub lines: Vec<CompletedLine>,
}

impl CompletedSale {
    /// Products left at or below their low-stock threshold, one entry per
    /// product with its final stock.
    pub fn low_stock_lines(&self) -> Vec<&CompletedLine> {
        let mut seen = Vec::<&str>::new();
        let mut low = Vec::new();

        for line in self.lines.iter().rev() {
            if seen.contains(&line.product_id.as_str()) {
                continue;
            }
            seen.push(&line.product_id);
            if line.low_stock {
                low.push(line);
            }
        }

        low.reverse();
        low
    }
}

// =============================================================================
// Coordinator
// =============================================================================

/// Executes sales against an injected [`SaleStore`].
///
/// ## Usage
/// ```rust,ignore
/// let coordinator = SaleCoordinator::new(db.sale_store());
/// let completed = coordinator
///     .create_sale(NewSale::from_request("biz-1", "cashier-1", request))
///     .await?;
/// println!("{} {}", completed.sale_id, completed.total_amount);
/// ```
#[derive(Debug, Clone)]
pub struct SaleCoordinator<S> {
    store: S,
}

impl<S: SaleStore> SaleCoordinator<S> {
    pub fn new(store: S) -> Self {
        SaleCoordinator { store }
    }

    /// Returns the underlying store.
    pub fn store(&self) -> &S {
        &self.store
    }

    /// Creates a sale, deducting stock for every item, or nothing at all.
    ///
    /// ## Errors
    /// - `ProductNotFound` - an item's product is missing or soft-deleted
    /// - `ForeignProduct` - an item's product belongs to another business
    /// - `Validation` - an item quantity is not positive
    /// - `InsufficientStock` / `NegativeStock` - not enough stock under lock
    /// - `AmountOverflow` - price × quantity does not fit
    /// - `Internal` - storage failure
    pub async fn create_sale(&self, new_sale: NewSale) -> SaleResult<CompletedSale> {
        let (tx, completed) = self.prepare(&new_sale).await?;
        commit_sale(tx, completed).await
    }

    /// Like [`create_sale`](Self::create_sale), but gives up when the work
    /// before commit takes longer than `deadline`.
    ///
    /// The deadline never covers the commit itself. A sale that reached
    /// commit reports the commit's real outcome, so a timeout error always
    /// means nothing was written.
    ///
    /// ## Errors
    /// As `create_sale`, plus `Internal` "sale timed out" when the deadline
    /// expires first. The open transaction is dropped, which rolls it back.
    pub async fn create_sale_within(
        &self,
        new_sale: NewSale,
        deadline: Duration,
    ) -> SaleResult<CompletedSale> {
        let (tx, completed) = match tokio::time::timeout(deadline, self.prepare(&new_sale)).await {
            Ok(prepared) => prepared?,
            Err(_) => {
                warn!(
                    business_id = %new_sale.business_id,
                    timeout_ms = deadline.as_millis() as u64,
                    "Sale timed out before commit"
                );
                return Err(SaleError::internal("sale timed out"));
            }
        };

        commit_sale(tx, completed).await
    }

    /// Begins and runs the sale up to, not including, commit. Rolls back
    /// on failure.
    async fn prepare(&self, new_sale: &NewSale) -> SaleResult<(S::Tx, CompletedSale)> {
        let mut tx = self.store.begin().await?;

        match execute(&mut tx, new_sale).await {
            Ok(completed) => Ok((tx, completed)),
            Err(err) => {
                if let Err(rollback_err) = tx.rollback().await {
                    warn!(error = %rollback_err, "Sale rollback failed");
                }
                debug!(business_id = %new_sale.business_id, error = %err, "Sale rolled back");
                Err(err)
            }
        }
    }
}

async fn commit_sale<T: SaleTransaction>(tx: T, completed: CompletedSale) -> SaleResult<CompletedSale> {
    tx.commit().await?;
    info!(
        sale_id = %completed.sale_id,
        business_id = %completed.business_id,
        total = %completed.total_amount,
        items = completed.lines.len(),
        "Sale committed"
    );
    Ok(completed)
}

/// Everything between begin and commit.
async fn execute<T: SaleTransaction>(tx: &mut T, new_sale: &NewSale) -> SaleResult<CompletedSale> {
    let now = Utc::now().timestamp();

    let sale = Sale {
        id: Uuid::new_v4().to_string(),
        business_id: new_sale.business_id.clone(),
        branch_id: new_sale.branch_id.clone(),
        cashier_id: new_sale.cashier_id.clone(),
        total_amount_cents: 0,
        payment_method: new_sale.payment_method.clone(),
        status: SaleStatus::Completed,
        created_at: now,
    };
    tx.insert_sale(&sale).await?;

    // Total lock order: every sale locks shared products in the same order.
    let plan = LockPlan::from_items(&new_sale.items);
    for product_id in plan.product_ids() {
        tx.lock_product(product_id).await?;
    }
    debug!(sale_id = %sale.id, locked = plan.len(), "Products locked");

    let mut total = SaleTotal::new();
    let mut lines = Vec::with_capacity(new_sale.items.len());

    for item in &new_sale.items {
        let product = tx
            .lock_product(&item.product_id)
            .await?
            .ok_or_else(|| SaleError::ProductNotFound {
                product_id: item.product_id.clone(),
            })?;

        let line = apply_item(tx, &sale, &product, item, now).await?;

        total
            .checked_add(line.subtotal)
            .ok_or_else(|| SaleError::AmountOverflow {
                product_id: product.id.clone(),
            })?;
        lines.push(line);
    }

    tx.update_sale_total(&sale.id, total.amount()).await?;

    Ok(CompletedSale {
        sale_id: sale.id,
        business_id: sale.business_id,
        total_amount: total.amount(),
        lines,
    })
}

/// Checks, prices and records one item against its locked product.
async fn apply_item<T: SaleTransaction>(
    tx: &mut T,
    sale: &Sale,
    product: &Product,
    item: &SaleItemRequest,
    now: i64,
) -> SaleResult<CompletedLine> {
    if product.business_id != sale.business_id {
        warn!(
            product_id = %product.id,
            product_business_id = %product.business_id,
            sale_business_id = %sale.business_id,
            "Cross-business product in sale request"
        );
        return Err(SaleError::ForeignProduct {
            product_id: product.id.clone(),
            business_id: sale.business_id.clone(),
        });
    }

    if item.quantity <= 0 {
        return Err(ValidationError::MustBePositive {
            field: "quantity".to_string(),
        }
        .into());
    }

    if item.quantity > product.quantity_in_stock {
        return Err(SaleError::InsufficientStock {
            product_id: product.id.clone(),
            available: product.quantity_in_stock,
            requested: item.quantity,
        });
    }

    let unit_price = product.selling_price();
    let subtotal = line_subtotal(unit_price, item.quantity).ok_or_else(|| {
        SaleError::AmountOverflow {
            product_id: product.id.clone(),
        }
    })?;

    let sale_item = SaleItem {
        id: Uuid::new_v4().to_string(),
        sale_id: sale.id.clone(),
        product_id: product.id.clone(),
        quantity: item.quantity,
        unit_price_cents: unit_price.cents(),
        subtotal_cents: subtotal.cents(),
        created_at: now,
    };
    tx.insert_sale_item(&sale_item).await?;

    let new_stock = product
        .quantity_in_stock
        .checked_sub(item.quantity)
        .filter(|stock| *stock >= 0)
        .ok_or_else(|| SaleError::NegativeStock {
            product_id: product.id.clone(),
        })?;
    tx.update_stock(&product.id, new_stock).await?;

    Ok(CompletedLine {
        product_id: product.id.clone(),
        product_name: product.name.clone(),
        quantity: item.quantity,
        unit_price,
        subtotal,
        remaining_stock: new_stock,
        low_stock: product.is_low_stock(new_stock),
    })
}

// =============================================================================
// Unit Tests
// =============================================================================
