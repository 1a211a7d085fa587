//! UpdateStatus command handler
//!
//! Moves an order along the status transition graph.

use async_trait::async_trait;

use crate::traits::{
    check_expected_version, CommandContext, CommandHandler, CommandMetadata, OrderError,
};
use shared::order::{OrderStatus, TimelineEvent, TimelineEventType, TimelinePayload};

/// UpdateStatus action
#[derive(Debug, Clone)]
pub struct UpdateStatusAction {
    pub order_id: String,
    pub new_status: OrderStatus,
    pub notes: Option<String>,
    pub expected_version: Option<u64>,
}

#[async_trait]
impl CommandHandler for UpdateStatusAction {
    async fn execute(
        &self,
        ctx: &mut CommandContext<'_>,
        metadata: &CommandMetadata,
    ) -> Result<Vec<TimelineEvent>, OrderError> {
        // 1. Load the order
        let order = ctx.load_order(&self.order_id)?;
        check_expected_version(&order, self.expected_version)?;

        // 2. A same-status update is rejected, not silently accepted
        if order.status == self.new_status {
            return Err(OrderError::NoStatusChange(order.status));
        }

        // 3. Transition must be an edge of the adjacency table
        if !order.status.can_transition_to(self.new_status) {
            return Err(OrderError::InvalidStateTransition {
                from: order.status,
                to: self.new_status,
            });
        }

        // 4. Allocate sequence and emit the event; the applier stamps
        //    actual_delivery and the notes field from the payload
        let seq = ctx.next_sequence();
        let event = TimelineEvent::new(
            seq,
            self.order_id.clone(),
            &metadata.actor,
            metadata.command_id.clone(),
            TimelineEventType::StatusChanged,
            format!("Order status changed to {}", self.new_status),
            TimelinePayload::StatusChanged {
                previous_status: order.status,
                new_status: self.new_status,
                notes: self.notes.clone(),
            },
        );

        Ok(vec![event])
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::storage::LedgerStorage;
    use crate::traits::CommandContext;
    use shared::order::{Actor, Order, OrderItem};

    fn create_test_metadata() -> CommandMetadata {
        CommandMetadata {
            command_id: "cmd-1".to_string(),
            actor: Actor::admin("admin-1", "Test Admin"),
            timestamp: 1234567890,
        }
    }

    fn seed_order(
        storage: &LedgerStorage,
        txn: &redb::WriteTransaction,
        status: OrderStatus,
    ) -> Order {
        let mut order = Order::new(
            "customer-1",
            vec![OrderItem {
                id: "item-1".to_string(),
                product_id: "product-1".to_string(),
                name: "Widget".to_string(),
                quantity: 2,
                price: 25.0,
            }],
            50.0,
        );
        order.status = status;
        order.update_checksum();
        storage.store_order(txn, &order).unwrap();
        order
    }

    #[tokio::test]
    async fn test_update_status_success() {
        let storage = LedgerStorage::open_in_memory().unwrap();
        let txn = storage.begin_write().unwrap();
        let order = seed_order(&storage, &txn, OrderStatus::Pending);

        let mut ctx = CommandContext::new(&txn, &storage, 0);
        let action = UpdateStatusAction {
            order_id: order.id.clone(),
            new_status: OrderStatus::Confirmed,
            notes: Some("confirmed by phone".to_string()),
            expected_version: None,
        };

        let events = action.execute(&mut ctx, &create_test_metadata()).await.unwrap();

        assert_eq!(events.len(), 1);
        let event = &events[0];
        assert_eq!(event.order_id, order.id);
        assert_eq!(event.event_type, TimelineEventType::StatusChanged);
        assert_eq!(event.sequence, 1);

        if let TimelinePayload::StatusChanged {
            previous_status,
            new_status,
            notes,
        } = &event.payload
        {
            assert_eq!(*previous_status, OrderStatus::Pending);
            assert_eq!(*new_status, OrderStatus::Confirmed);
            assert_eq!(notes.as_deref(), Some("confirmed by phone"));
        } else {
            panic!("Expected StatusChanged payload");
        }
    }

    #[tokio::test]
    async fn test_same_status_rejected() {
        let storage = LedgerStorage::open_in_memory().unwrap();
        let txn = storage.begin_write().unwrap();
        let order = seed_order(&storage, &txn, OrderStatus::Shipped);

        let mut ctx = CommandContext::new(&txn, &storage, 0);
        let action = UpdateStatusAction {
            order_id: order.id.clone(),
            new_status: OrderStatus::Shipped,
            notes: None,
            expected_version: None,
        };

        let result = action.execute(&mut ctx, &create_test_metadata()).await;
        assert!(matches!(
            result,
            Err(OrderError::NoStatusChange(OrderStatus::Shipped))
        ));
    }

    #[tokio::test]
    async fn test_backward_transition_rejected() {
        let storage = LedgerStorage::open_in_memory().unwrap();
        let txn = storage.begin_write().unwrap();
        let order = seed_order(&storage, &txn, OrderStatus::Shipped);

        let mut ctx = CommandContext::new(&txn, &storage, 0);
        let action = UpdateStatusAction {
            order_id: order.id.clone(),
            new_status: OrderStatus::Pending,
            notes: None,
            expected_version: None,
        };

        let result = action.execute(&mut ctx, &create_test_metadata()).await;
        assert!(matches!(
            result,
            Err(OrderError::InvalidStateTransition {
                from: OrderStatus::Shipped,
                to: OrderStatus::Pending,
            })
        ));
    }

    #[tokio::test]
    async fn test_cancelled_via_update_status_rejected() {
        let storage = LedgerStorage::open_in_memory().unwrap();
        let txn = storage.begin_write().unwrap();
        let order = seed_order(&storage, &txn, OrderStatus::Pending);

        let mut ctx = CommandContext::new(&txn, &storage, 0);
        let action = UpdateStatusAction {
            order_id: order.id.clone(),
            new_status: OrderStatus::Cancelled,
            notes: None,
            expected_version: None,
        };

        let result = action.execute(&mut ctx, &create_test_metadata()).await;
        assert!(matches!(
            result,
            Err(OrderError::InvalidStateTransition { .. })
        ));
    }

    #[tokio::test]
    async fn test_nonexistent_order() {
        let storage = LedgerStorage::open_in_memory().unwrap();
        let txn = storage.begin_write().unwrap();

        let mut ctx = CommandContext::new(&txn, &storage, 0);
        let action = UpdateStatusAction {
            order_id: "nonexistent".to_string(),
            new_status: OrderStatus::Confirmed,
            notes: None,
            expected_version: None,
        };

        let result = action.execute(&mut ctx, &create_test_metadata()).await;
        assert!(matches!(result, Err(OrderError::OrderNotFound(_))));
    }

    #[tokio::test]
    async fn test_version_conflict() {
        let storage = LedgerStorage::open_in_memory().unwrap();
        let txn = storage.begin_write().unwrap();
        let mut order = Order::new("customer-1", vec![], 10.0);
        order.last_sequence = 4;
        order.update_checksum();
        storage.store_order(&txn, &order).unwrap();

        let mut ctx = CommandContext::new(&txn, &storage, 4);
        let action = UpdateStatusAction {
            order_id: order.id.clone(),
            new_status: OrderStatus::Confirmed,
            notes: None,
            expected_version: Some(3),
        };

        let result = action.execute(&mut ctx, &create_test_metadata()).await;
        assert!(matches!(
            result,
            Err(OrderError::ConcurrencyConflict {
                expected: 3,
                actual: 4,
            })
        ));
    }
}
