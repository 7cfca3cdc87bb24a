//! # Validation Module
//!
//! Structural checks on an incoming sale request.
//!
//! ## Validation Strategy
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                      Validation Layers                                  │
//! │                                                                         │
//! │  Layer 1: Service                                                      │
//! │  ├── Session carries business + cashier (else Unauthorized)            │
//! │  └── THIS MODULE: request shape                                        │
//! │           │                                                             │
//! │           ▼                                                             │
//! │  Layer 2: Coordinator (under lock)                                     │
//! │  ├── Product exists, belongs to the business                           │
//! │  ├── quantity > 0 (again)                                              │
//! │  └── quantity <= stock                                                 │
//! │           │                                                             │
//! │           ▼                                                             │
//! │  Layer 3: Database (SQLite)                                            │
//! │  ├── CHECK (quantity_in_stock >= 0)                                    │
//! │  └── Foreign key constraints                                           │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! Everything here is pure: no storage is touched, and validating the same
//! request twice gives the same answer.
//!
//! ## Usage
//! ```rust
//! use tally_core::dto::{CreateSaleRequest, SaleItemRequest};
//! use tally_core::validation::validate_sale_request;
//!
//! let req = CreateSaleRequest {
//!     branch_id: "br-1".to_string(),
//!     payment_method: "cash".to_string(),
//!     items: vec![SaleItemRequest::new("p-1", 3)],
//! };
//! assert!(validate_sale_request(&req).is_ok());
//! ```

use crate::dto::CreateSaleRequest;
use crate::error::ValidationError;

/// Result type for validation operations.
pub type ValidationResult<T> = Result<T, ValidationError>;

// =============================================================================
// Request Validator
// =============================================================================

/// Validates the shape of a create-sale request.
///
/// ## Rules
/// - `branch_id` must not be empty
/// - `payment_method` must not be empty
/// - `items` must have at least one entry
/// - every item needs a `product_id` and a quantity > 0
///
/// The first failing rule is reported. Duplicate product ids are allowed;
/// the coordinator treats them as separate lines against the same stock.
pub fn validate_sale_request(req: &CreateSaleRequest) -> ValidationResult<()> {
    validate_required("branch_id", &req.branch_id)?;
    validate_required("payment_method", &req.payment_method)?;

    if req.items.is_empty() {
        return Err(ValidationError::Empty {
            field: "items".to_string(),
        });
    }

    for item in &req.items {
        validate_required("product_id", &item.product_id)?;
        validate_quantity(item.quantity)?;
    }

    Ok(())
}

// =============================================================================
// Field Validators
// =============================================================================

/// Rejects empty identifiers. Values are otherwise taken as sent.
///
/// ## Example
/// ```rust
/// use tally_core::validation::validate_required;
///
/// assert!(validate_required("branch_id", "br-1").is_ok());
/// assert!(validate_required("branch_id", "").is_err());
/// ```
pub fn validate_required(field: &str, value: &str) -> ValidationResult<()> {
    if value.is_empty() {
        return Err(ValidationError::required(field));
    }

    Ok(())
}

/// Validates a requested quantity.
///
/// ## User Workflow
/// ```text
/// ┌─────────────────────────────────────────────────────────────────────────┐
/// │  Checkout: item line                                                    │
/// │                                                                         │
/// │  Cashier enters quantity: 0                                            │
/// │       │                                                                 │
/// │       ▼                                                                 │
/// │  validate_quantity(0) ← THIS FUNCTION                                  │
/// │       │                                                                 │
/// │       ├── qty <= 0? → "quantity must be greater than 0"                │
/// │       │                                                                 │
/// │       └── OK → coordinator checks it against stock                     │
/// │                                                                         │
/// └─────────────────────────────────────────────────────────────────────────┘
/// ```
pub fn validate_quantity(qty: i64) -> ValidationResult<()> {
    if qty <= 0 {
        return Err(ValidationError::MustBePositive {
            field: "quantity".to_string(),
        });
    }

    Ok(())
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::dto::SaleItemRequest;

    fn request() -> CreateSaleRequest {
        CreateSaleRequest {
            branch_id: "br-1".to_string(),
            payment_method: "cash".to_string(),
            items: vec![SaleItemRequest::new("p-1", 3), SaleItemRequest::new("p-2", 1)],
        }
    }

    #[test]
    fn test_valid_request() {
        assert!(validate_sale_request(&request()).is_ok());
    }

    #[test]
    fn test_empty_identifiers() {
        let mut req = request();
        req.branch_id = "".to_string();
        assert_eq!(
            validate_sale_request(&req),
            Err(ValidationError::required("branch_id"))
        );

        let mut req = request();
        req.payment_method = String::new();
        assert_eq!(
            validate_sale_request(&req),
            Err(ValidationError::required("payment_method"))
        );

        let mut req = request();
        req.items[1].product_id = String::new();
        assert_eq!(
            validate_sale_request(&req),
            Err(ValidationError::required("product_id"))
        );
    }

    #[test]
    fn test_only_empty_counts_as_missing() {
        let mut req = request();
        req.branch_id = " ".to_string();
        req.payment_method = "\tcash".to_string();
        assert!(validate_sale_request(&req).is_ok());
    }

    #[test]
    fn test_empty_items() {
        let mut req = request();
        req.items.clear();
        let err = validate_sale_request(&req).unwrap_err();
        assert_eq!(err.to_string(), "items must not be empty");
    }

    #[test]
    fn test_validate_quantity() {
        assert!(validate_quantity(1).is_ok());
        assert!(validate_quantity(10_000).is_ok());

        assert!(validate_quantity(0).is_err());
        assert!(validate_quantity(-1).is_err());
    }

    #[test]
    fn test_non_positive_item_quantity() {
        let mut req = request();
        req.items[0].quantity = -2;
        let err = validate_sale_request(&req).unwrap_err();
        assert_eq!(err.to_string(), "quantity must be greater than 0");
    }

    #[test]
    fn test_validation_is_repeatable() {
        let mut req = request();
        req.items[0].quantity = 0;
        let first = validate_sale_request(&req);
        let second = validate_sale_request(&req);
        assert!(first.is_err());
        assert_eq!(first, second);
    }

    #[test]
    fn test_duplicate_products_allowed() {
        let mut req = request();
        req.items.push(SaleItemRequest::new("p-1", 2));
        assert!(validate_sale_request(&req).is_ok());
    }
}
