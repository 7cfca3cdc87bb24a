//! Row builders for tests, in this crate and in crates built on it
//! (enable the `test-utils` feature).

use tally_core::{low_stock_message, Notification, Product, Sale, SaleStatus, LOW_STOCK_NOTIFICATION};

pub fn product(id: &str, business_id: &str, price_cents: i64, stock: i64) -> Product {
    Product {
        id: id.to_string(),
        business_id: business_id.to_string(),
        branch_id: "br-1".to_string(),
        name: format!("Product {id}"),
        selling_price_cents: price_cents,
        cost_price_cents: price_cents / 2,
        quantity_in_stock: stock,
        low_stock_threshold: 0,
        created_at: 0,
        updated_at: 0,
        deleted_at: None,
    }
}

pub fn sale(id: &str, business_id: &str, total_cents: i64, created_at: i64) -> Sale {
    Sale {
        id: id.to_string(),
        business_id: business_id.to_string(),
        branch_id: "br-1".to_string(),
        cashier_id: "cashier-1".to_string(),
        total_amount_cents: total_cents,
        payment_method: "cash".to_string(),
        status: SaleStatus::Completed,
        created_at,
    }
}

pub fn low_stock_notification(
    id: &str,
    business_id: &str,
    product_id: &str,
    created_at: i64,
) -> Notification {
    Notification {
        id: id.to_string(),
        business_id: business_id.to_string(),
        product_id: product_id.to_string(),
        notification_type: LOW_STOCK_NOTIFICATION.to_string(),
        message: low_stock_message(product_id, 1),
        is_read: false,
        created_at,
    }
}
