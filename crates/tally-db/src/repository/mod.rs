//! # Repository Module
//!
//! Pool-backed repositories for everything outside the sale transaction.
//!
//! ## Repository Pattern
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                    Reads vs. the Sale Write Path                        │
//! │                                                                         │
//! │  Service / CLI                                                         │
//! │       │                                                                 │
//! │       ├── db.products().count_low_stock("biz-1", None)                 │
//! │       ├── db.sales().recent("biz-1", None, 5)                          │
//! │       └── db.notifications().list("biz-1", true, 20, 0)                │
//! │       │                                                                 │
//! │       ▼                                                                 │
//! │  Repositories (this module) ── SqlitePool ──► SQLite                   │
//! │                                                                         │
//! │  Sale writes never go through here: they go through                    │
//! │  SaleStore::begin() and one SaleTransaction (see crate::store).        │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Available Repositories
//!
//! - [`ProductRepository`](product::ProductRepository) - Product insert, lookup, soft delete, low-stock count
//! - [`SaleRepository`](sale::SaleRepository) - Sale reads and summary figures
//! - [`NotificationRepository`](notification::NotificationRepository) - Low-stock notifications

pub mod notification;
pub mod product;
pub mod sale;
