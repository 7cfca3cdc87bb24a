//! # tally-db: Storage and Sale Transactions for Tally POS
//!
//! This crate owns everything that touches storage: the SQLite pool,
//! embedded migrations, read repositories, the transactional sale store
//! and the coordinator that runs a sale inside one transaction.
//!
//! ## Architecture Position
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                        Tally POS Data Flow                              │
//! │                                                                         │
//! │  SaleService::create_sale (tally-service)                              │
//! │       │                                                                 │
//! │       ▼                                                                 │
//! │  ┌─────────────────────────────────────────────────────────────────┐   │
//! │  │                     tally-db (THIS CRATE)                       │   │
//! │  │                                                                 │   │
//! │  │   ┌───────────────┐    ┌───────────────┐    ┌──────────────┐  │   │
//! │  │   │ SaleCoordinator│──►│  SaleStore    │    │ Repositories │  │   │
//! │  │   │ (coordinator) │    │  ├─ SQLite    │    │ Product      │  │   │
//! │  │   │               │    │  └─ Memory    │    │ Sale (reads) │  │   │
//! │  │   └───────────────┘    └───────┬───────┘    │ Notification │  │   │
//! │  │                                │            └──────┬───────┘  │   │
//! │  │   ┌───────────────┐            │                   │          │   │
//! │  │   │   Database    │◄───────────┴───────────────────┘          │   │
//! │  │   │  (pool.rs)    │   migrations: 0001_initial_schema.sql    │   │
//! │  │   └───────────────┘                                            │   │
//! │  └─────────────────────────────────────────────────────────────────┘   │
//! │       │                                                                 │
//! │       ▼                                                                 │
//! │  ┌─────────────────────────────────────────────────────────────────┐   │
//! │  │                     SQLite Database (WAL)                       │   │
//! │  └─────────────────────────────────────────────────────────────────┘   │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Module Organization
//!
//! - [`pool`] - Connection pool creation and configuration
//! - [`migrations`] - Embedded database migrations
//! - [`error`] - Database error types
//! - [`repository`] - Product, sale and notification repositories
//! - [`store`] - The sale transaction seam and its two implementations
//! - [`coordinator`] - The inventory-locking sale coordinator
//!
//! ## Usage
//!
//! ```rust,ignore
//! use tally_db::{Database, DbConfig, NewSale, SaleCoordinator};
//!
//! let db = Database::new(DbConfig::new("path/to/tally.db")).await?;
//!
//! let coordinator = SaleCoordinator::new(db.sale_store());
//! let completed = coordinator
//!     .create_sale(NewSale::from_request("biz-1", "cashier-1", request))
//!     .await?;
//!
//! let recent = db.sales().recent("biz-1", None, 5).await?;
//! ```

// =============================================================================
// Module Declarations
// =============================================================================

pub mod coordinator;
pub mod error;
pub mod migrations;
pub mod pool;
pub mod repository;
pub mod store;

#[cfg(any(test, feature = "test-utils"))]
pub mod test_support;

// =============================================================================
// Re-exports
// =============================================================================

pub use coordinator::{CompletedLine, CompletedSale, NewSale, SaleCoordinator};
pub use error::{DbError, DbResult};
pub use pool::{Database, DbConfig};

// Repository re-exports for convenience
pub use repository::notification::NotificationRepository;
pub use repository::product::ProductRepository;
pub use repository::sale::SaleRepository;

pub use store::memory::MemoryStore;
pub use store::sqlite::SqliteSaleStore;
pub use store::{SaleStore, SaleTransaction};
