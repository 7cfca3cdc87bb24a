//! # Sale Store
//!
//! The transactional seam the sale coordinator writes through.
//!
//! ## Unit of Work
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                    One Sale = One Transaction                           │
//! │                                                                         │
//! │  store.begin()                                                         │
//! │       │                                                                 │
//! │       ▼                                                                 │
//! │  tx.insert_sale(sale)          total = 0                               │
//! │  tx.lock_product(P1)           exclusive until commit/rollback         │
//! │  tx.lock_product(P2)                                                   │
//! │  tx.insert_sale_item(..)                                               │
//! │  tx.update_stock(P1, n)                                                │
//! │  tx.update_sale_total(..)                                              │
//! │       │                                                                 │
//! │       ├── tx.commit()    → every write visible at once                 │
//! │       └── tx.rollback()  → nothing happened                            │
//! │           (or drop tx)                                                  │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Implementations
//!
//! - [`SqliteSaleStore`](sqlite::SqliteSaleStore) - A `sqlx` transaction.
//!   The first write takes SQLite's database write lock, which covers every
//!   product row the sale later locks.
//! - [`MemoryStore`](memory::MemoryStore) - Per-product `tokio` mutexes held
//!   as owned guards until the transaction ends.
//!
//! Both roll back when the transaction value is dropped without a commit,
//! so a cancelled or timed-out sale leaves no trace.

use async_trait::async_trait;

use crate::error::DbResult;
use tally_core::{Money, Product, Sale, SaleItem};

pub mod memory;
pub mod sqlite;

/// Opens sale transactions.
#[async_trait]
pub trait SaleStore: Send + Sync {
    type Tx: SaleTransaction;

    /// Starts a new unit of work.
    async fn begin(&self) -> DbResult<Self::Tx>;
}

/// One open unit of work.
///
/// Every method only affects state visible inside this transaction until
/// [`commit`](SaleTransaction::commit) succeeds.
#[async_trait]
pub trait SaleTransaction: Send {
    /// Records the sale header.
    async fn insert_sale(&mut self, sale: &Sale) -> DbResult<()>;

    /// Takes the exclusive lock on a product and returns its current state
    /// as seen by this transaction.
    ///
    /// Waits while another transaction holds the lock. Locking a product a
    /// second time returns the same row including this transaction's own
    /// stock changes. Missing or soft-deleted products return `None`.
    async fn lock_product(&mut self, product_id: &str) -> DbResult<Option<Product>>;

    /// Records a sale line. The sale and the product must already exist.
    async fn insert_sale_item(&mut self, item: &SaleItem) -> DbResult<()>;

    /// Overwrites a locked product's stock.
    async fn update_stock(&mut self, product_id: &str, new_stock: i64) -> DbResult<()>;

    /// Overwrites the sale's total.
    async fn update_sale_total(&mut self, sale_id: &str, total: Money) -> DbResult<()>;

    /// Makes every write visible and releases the locks.
    async fn commit(self) -> DbResult<()>;

    /// Discards every write and releases the locks.
    async fn rollback(self) -> DbResult<()>;
}
