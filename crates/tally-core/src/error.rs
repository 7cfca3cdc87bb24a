//! # Error Types
//!
//! The sale error taxonomy.
//!
//! ## Error Hierarchy
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                         Error Types                                     │
//! │                                                                         │
//! │  tally-core errors (this file)                                         │
//! │  ├── ErrorKind        - What the boundary switches on                  │
//! │  ├── SaleError        - Every way a sale can fail                      │
//! │  └── ValidationError  - Request shape failures                         │
//! │                                                                         │
//! │  tally-db errors (separate crate)                                      │
//! │  └── DbError          - Database failures, folded into SaleError       │
//! │                                                                         │
//! │  tally-service errors (app)                                            │
//! │  └── ApiError         - Status code + { error, message } body          │
//! │                                                                         │
//! │  Flow: ValidationError → SaleError → ApiError → caller                 │
//! │        DbError ─────────────┘                                          │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! The boundary never inspects message text: it matches on
//! [`SaleError::kind`].

use serde::Serialize;
use thiserror::Error;

// =============================================================================
// Error Kind
// =============================================================================

/// Coarse classification of a sale failure.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ErrorKind {
    /// Malformed or semantically invalid request. Never retried.
    InvalidInput,
    /// No authenticated business or cashier was supplied.
    Unauthorized,
    /// A referenced product does not exist.
    NotFound,
    /// Cross-tenant access: the product belongs to another business.
    Forbidden,
    /// Business-rule violation on stock. The caller may retry after the
    /// user adjusts the quantity.
    Conflict,
    /// Unexpected persistence failure. The sale was rolled back.
    Internal,
}

// =============================================================================
// Sale Error
// =============================================================================

/// Every way creating a sale can fail.
///
/// Messages are the human-readable text returned to the caller, so they are
/// kept short and stable.
#[derive(Debug, Error)]
pub enum SaleError {
    /// Request failed structural validation.
    #[error("{0}")]
    Validation(#[from] ValidationError),

    /// The session carried no business or cashier.
    #[error("unauthorized")]
    Unauthorized,

    /// Product missing (or soft-deleted) when fetched under lock.
    #[error("product not found")]
    ProductNotFound { product_id: String },

    /// Product belongs to a different business than the sale.
    #[error("product does not belong to business")]
    ForeignProduct {
        product_id: String,
        business_id: String,
    },

    /// Requested quantity exceeds the stock seen under lock.
    ///
    /// ## User Workflow
    /// ```text
    /// Sale request (P × 3)
    ///      │
    ///      ▼
    /// Lock P: stock = 2
    ///      │
    ///      ▼
    /// InsufficientStock { product_id: "P", available: 2, requested: 3 }
    ///      │
    ///      ▼
    /// Whole sale rolled back, caller sees 400
    /// ```
    #[error("insufficient stock for product {product_id}")]
    InsufficientStock {
        product_id: String,
        available: i64,
        requested: i64,
    },

    /// Deduction would take stock below zero.
    #[error("stock would become negative")]
    NegativeStock { product_id: String },

    /// Price × quantity (or the running total) does not fit in an i64.
    #[error("amount overflow for product {product_id}")]
    AmountOverflow { product_id: String },

    /// Persistence failure, lock timeout, cancelled request.
    #[error("{0}")]
    Internal(String),
}

impl SaleError {
    /// Classifies the error for the boundary.
    pub fn kind(&self) -> ErrorKind {
        match self {
            SaleError::Validation(_) | SaleError::AmountOverflow { .. } => ErrorKind::InvalidInput,
            SaleError::Unauthorized => ErrorKind::Unauthorized,
            SaleError::ProductNotFound { .. } => ErrorKind::NotFound,
            SaleError::ForeignProduct { .. } => ErrorKind::Forbidden,
            SaleError::InsufficientStock { .. } | SaleError::NegativeStock { .. } => {
                ErrorKind::Conflict
            }
            SaleError::Internal(_) => ErrorKind::Internal,
        }
    }

    /// Creates an internal error.
    pub fn internal(message: impl Into<String>) -> Self {
        SaleError::Internal(message.into())
    }
}

// =============================================================================
// Validation Error
// =============================================================================

/// Request validation errors.
///
/// Produced before any storage is touched.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ValidationError {
    /// A required field is missing or empty.
    #[error("{field} is required")]
    Required { field: String },

    /// A list that must have entries is empty.
    #[error("{field} must not be empty")]
    Empty { field: String },

    /// Value must be strictly positive.
    #[error("{field} must be greater than 0")]
    MustBePositive { field: String },
}

impl ValidationError {
    pub(crate) fn required(field: &str) -> Self {
        ValidationError::Required {
            field: field.to_string(),
        }
    }
}

// =============================================================================
// Result Type Alias
// =============================================================================

/// Convenience type alias for Results with SaleError.
pub type SaleResult<T> = Result<T, SaleError>;

// =============================================================================
// Unit Tests
// =============================================================================
