//! # tally-core: Pure Sale Logic for Tally POS
//!
//! This crate holds everything about a sale that can be decided without
//! touching storage: the request shape, validation, money arithmetic, the
//! running total and the error taxonomy that the boundary maps to
//! responses.
//!
//! ## Architecture Position
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                        Tally POS Architecture                           │
//! │                                                                         │
//! │  ┌─────────────────────────────────────────────────────────────────┐   │
//! │  │                 tally-service (usecase + CLI)                   │   │
//! │  │     auth context ──► validate ──► coordinator ──► response      │   │
//! │  └─────────────────────────────┬───────────────────────────────────┘   │
//! │                                │                                        │
//! │  ┌─────────────────────────────▼───────────────────────────────────┐   │
//! │  │               ★ tally-core (THIS CRATE) ★                       │   │
//! │  │                                                                 │   │
//! │  │   ┌───────────┐  ┌───────────┐  ┌────────────┐  ┌───────────┐  │   │
//! │  │   │   types   │  │   money   │  │ aggregator │  │ validation│  │   │
//! │  │   │  Product  │  │   Money   │  │  SaleTotal │  │  request  │  │   │
//! │  │   │   Sale    │  │           │  │  LockPlan  │  │  checks   │  │   │
//! │  │   └───────────┘  └───────────┘  └────────────┘  └───────────┘  │   │
//! │  │                                                                 │   │
//! │  │   NO I/O • NO DATABASE • NO NETWORK • PURE FUNCTIONS           │   │
//! │  └─────────────────────────────────────────────────────────────────┘   │
//! │                                │                                        │
//! │  ┌─────────────────────────────▼───────────────────────────────────┐   │
//! │  │          tally-db (SQLite, repositories, coordinator)           │   │
//! │  └─────────────────────────────────────────────────────────────────┘   │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Modules
//!
//! - [`types`] - Domain rows (Product, Sale, SaleItem, Notification)
//! - [`dto`] - Wire shapes (CreateSaleRequest, CreateSaleResponse, ErrorResponse)
//! - [`money`] - Money type with integer arithmetic (no floating point!)
//! - [`error`] - Error kinds and the sale error enum
//! - [`validation`] - Sale request validation
//! - [`aggregator`] - Line subtotals, the running sale total and lock ordering
//!
//! ## Example Usage
//!
//! ```rust
//! use tally_core::aggregator::{line_subtotal, SaleTotal};
//! use tally_core::money::Money;
//!
//! let mut total = SaleTotal::new();
//! let subtotal = line_subtotal(Money::from_cents(1000), 3).unwrap();
//! assert!(total.checked_add(subtotal).is_some());
//! assert_eq!(total.amount().cents(), 3000);
//! ```

// =============================================================================
// Module Declarations
// =============================================================================

pub mod aggregator;
pub mod dto;
pub mod error;
pub mod money;
pub mod types;
pub mod validation;

// =============================================================================
// Re-exports for Convenience
// =============================================================================

pub use aggregator::{LockPlan, SaleTotal};
pub use dto::{CreateSaleRequest, CreateSaleResponse, ErrorResponse, SaleItemRequest};
pub use error::{ErrorKind, SaleError, SaleResult, ValidationError};
pub use money::Money;
pub use types::*;

// =============================================================================
// Crate-Level Constants
// =============================================================================

/// Notification type recorded when a sale leaves a product at or below its
/// low-stock threshold.
pub const LOW_STOCK_NOTIFICATION: &str = "low_stock";
