//! # Sale Aggregator
//!
//! Line pricing, the running sale total, and the order products are locked in.
//!
//! ## Where This Sits
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │  Coordinator transaction                                                │
//! │                                                                         │
//! │  LockPlan::from_items(items)  ──► lock P1, P2, P3 (ascending id)       │
//! │                                                                         │
//! │  for item in items (request order):                                    │
//! │      product = locked row                                              │
//! │      subtotal = line_subtotal(product.selling_price, qty)  ◄── here    │
//! │      total.checked_add(subtotal)                           ◄── here    │
//! │                                                                         │
//! │  sale.total_amount = total.amount()                                    │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! Prices always come from the product row read under lock. Nothing in this
//! module accepts a client-supplied price.

use std::collections::BTreeSet;

use crate::dto::SaleItemRequest;
use crate::money::Money;

// =============================================================================
// Line Pricing
// =============================================================================

/// Computes `unit_price × quantity`, `None` on overflow.
///
/// ## Example
/// ```rust
/// use tally_core::aggregator::line_subtotal;
/// use tally_core::money::Money;
///
/// assert_eq!(line_subtotal(Money::from_cents(1000), 3), Some(Money::from_cents(3000)));
/// assert_eq!(line_subtotal(Money::from_cents(i64::MAX), 2), None);
/// ```
#[inline]
pub fn line_subtotal(unit_price: Money, quantity: i64) -> Option<Money> {
    unit_price.checked_multiply_quantity(quantity)
}

// =============================================================================
// Running Total
// =============================================================================

/// Accumulates line subtotals in integer minor units.
///
/// The final amount equals the sum of every subtotal added, whatever the
/// order they were added in.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct SaleTotal {
    amount: Money,
}

impl SaleTotal {
    /// Creates an empty total.
    pub fn new() -> Self {
        SaleTotal::default()
    }

    /// Adds a subtotal unless the total would overflow.
    ///
    /// Returns the new total, or `None` with the total left unchanged.
    pub fn checked_add(&mut self, subtotal: Money) -> Option<Money> {
        let next = self.amount.checked_add(subtotal)?;
        self.amount = next;
        Some(next)
    }

    /// The current total.
    pub fn amount(&self) -> Money {
        self.amount
    }
}

// =============================================================================
// Lock Ordering
// =============================================================================

/// The distinct product ids of a request in ascending order.
///
/// ## Deadlock Avoidance
/// ```text
/// Sale A: [P2, P1]            Sale B: [P1, P2]
///    │                           │
///    ▼                           ▼
/// LockPlan: [P1, P2]          LockPlan: [P1, P2]
///
/// Both sales take P1 first, so neither can hold P2 while waiting on P1.
/// ```
///
/// A product listed twice appears once: a transaction never tries to lock
/// a row it already holds.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LockPlan {
    product_ids: Vec<String>,
}

impl LockPlan {
    /// Builds the lock order for a list of requested items.
    pub fn from_items(items: &[SaleItemRequest]) -> Self {
        let ids: BTreeSet<&str> = items.iter().map(|item| item.product_id.as_str()).collect();
        LockPlan {
            product_ids: ids.into_iter().map(str::to_string).collect(),
        }
    }

    /// Product ids in the order they must be locked.
    pub fn product_ids(&self) -> &[String] {
        &self.product_ids
    }

    pub fn len(&self) -> usize {
        self.product_ids.len()
    }

    pub fn is_empty(&self) -> bool {
        self.product_ids.is_empty()
    }
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_line_subtotal() {
        assert_eq!(line_subtotal(Money::from_cents(299), 3), Some(Money::from_cents(897)));
        assert_eq!(line_subtotal(Money::zero(), 5), Some(Money::zero()));
        assert_eq!(line_subtotal(Money::from_cents(i64::MAX / 2 + 1), 2), None);
    }

    #[test]
    fn test_total_is_order_independent() {
        let subtotals = [1000, 250, 3999, 1].map(Money::from_cents);

        let mut forward = SaleTotal::new();
        for s in subtotals {
            forward.checked_add(s).unwrap();
        }

        let mut backward = SaleTotal::new();
        for s in subtotals.iter().rev() {
            backward.checked_add(*s).unwrap();
        }

        assert_eq!(forward.amount(), backward.amount());
        assert_eq!(forward.amount().cents(), 5250);
    }

    #[test]
    fn test_checked_add_leaves_total_on_overflow() {
        let mut total = SaleTotal::new();
        assert_eq!(
            total.checked_add(Money::from_cents(i64::MAX)),
            Some(Money::from_cents(i64::MAX))
        );
        assert_eq!(total.checked_add(Money::from_cents(1)), None);
        assert_eq!(total.amount().cents(), i64::MAX);
    }

    #[test]
    fn test_lock_plan_sorted_and_distinct() {
        let items = vec![
            SaleItemRequest::new("p-3", 1),
            SaleItemRequest::new("p-1", 2),
            SaleItemRequest::new("p-3", 4),
            SaleItemRequest::new("p-2", 1),
        ];
        let plan = LockPlan::from_items(&items);
        assert_eq!(plan.product_ids(), ["p-1", "p-2", "p-3"]);
        assert_eq!(plan.len(), 3);
    }

    #[test]
    fn test_lock_plan_same_for_any_request_order() {
        let a = [SaleItemRequest::new("b", 1), SaleItemRequest::new("a", 1)];
        let b = [SaleItemRequest::new("a", 1), SaleItemRequest::new("b", 1)];
        assert_eq!(LockPlan::from_items(&a), LockPlan::from_items(&b));
    }
}
