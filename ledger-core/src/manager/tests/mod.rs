//! Scenario tests for the LedgerManager
//!
//! Each submodule drives full operations through the public manager API
//! against an in-memory store.

mod test_audit;
mod test_returns;

use crate::manager::LedgerManager;
use shared::order::{Actor, Order, OrderItem, OrderStatus};

fn manager() -> LedgerManager {
    LedgerManager::in_memory().unwrap()
}

fn admin() -> Actor {
    Actor::admin("admin-1", "Test Admin")
}

fn customer() -> Actor {
    Actor::customer("customer-1", "Test Customer")
}

/// Build an order from (item_id, product_id, quantity, price) tuples
fn order_with_items(items: &[(&str, &str, i32, f64)], total: f64) -> Order {
    Order::new(
        "customer-1",
        items
            .iter()
            .map(|(id, product_id, quantity, price)| OrderItem {
                id: id.to_string(),
                product_id: product_id.to_string(),
                name: format!("Product {}", product_id),
                quantity: *quantity,
                price: *price,
            })
            .collect(),
        total,
    )
}

fn place_order(
    manager: &LedgerManager,
    items: &[(&str, &str, i32, f64)],
    total: f64,
) -> Order {
    manager.insert_order(order_with_items(items, total)).unwrap()
}

/// Walk an order through the forward chain to DELIVERED
async fn deliver(manager: &LedgerManager, order_id: &str) {
    for status in [
        OrderStatus::Confirmed,
        OrderStatus::Processing,
        OrderStatus::Shipped,
        OrderStatus::Delivered,
    ] {
        manager
            .update_status(order_id, status, None, admin())
            .await
            .unwrap();
    }
}
