//! # Wire Types
//!
//! Request and response shapes of the create-sale operation.
//!
//! ```json
//! // request
//! { "branch_id": "br-1", "payment_method": "cash",
//!   "items": [{ "product_id": "p-1", "quantity": 3 }] }
//!
//! // success
//! { "success": true, "sale_id": "…", "total_amount": 30.0 }
//!
//! // failure
//! { "error": true, "message": "insufficient stock for product p-1" }
//! ```
//!
//! Missing request fields deserialize to empty values so that they are
//! reported by validation as `InvalidInput` rather than as a decode error.

use serde::{Deserialize, Serialize};
use ts_rs::TS;

use crate::money::Money;

/// One requested line: which product and how many.
///
/// There is deliberately no price field; prices come from the product row.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct SaleItemRequest {
    #[serde(default)]
    pub product_id: String,
    #[serde(default)]
    pub quantity: i64,
}

impl SaleItemRequest {
    pub fn new(product_id: impl Into<String>, quantity: i64) -> Self {
        SaleItemRequest {
            product_id: product_id.into(),
            quantity,
        }
    }
}

/// Body of a create-sale call. Business and cashier come from the session.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct CreateSaleRequest {
    #[serde(default)]
    pub branch_id: String,
    #[serde(default)]
    pub payment_method: String,
    #[serde(default)]
    pub items: Vec<SaleItemRequest>,
}

/// Successful create-sale response.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct CreateSaleResponse {
    pub success: bool,
    pub sale_id: String,
    /// Decimal major units, derived from the integer total.
    pub total_amount: f64,
}

impl CreateSaleResponse {
    pub fn new(sale_id: impl Into<String>, total: Money) -> Self {
        CreateSaleResponse {
            success: true,
            sale_id: sale_id.into(),
            total_amount: total.to_major_units(),
        }
    }
}

/// Failure body: `{ "error": true, "message": "…" }`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct ErrorResponse {
    pub error: bool,
    pub message: String,
}

impl ErrorResponse {
    pub fn new(message: impl Into<String>) -> Self {
        ErrorResponse {
            error: true,
            message: message.into(),
        }
    }
}
