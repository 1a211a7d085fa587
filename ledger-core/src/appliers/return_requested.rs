//! ReturnRequested event applier
//!
//! The return row itself lives in its own table; on the order record this
//! event only advances the audit bookkeeping.

use super::touch;
use crate::traits::EventApplier;
use shared::order::{Order, TimelineEvent, TimelinePayload};

/// ReturnRequested applier
pub struct ReturnRequestedApplier;

impl EventApplier for ReturnRequestedApplier {
    fn apply(&self, order: &mut Order, event: &TimelineEvent) {
        if matches!(event.payload, TimelinePayload::ReturnRequested { .. }) {
            touch(order, event);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use shared::order::{Actor, OrderStatus, TimelineEventType};

    #[test]
    fn test_only_bookkeeping_changes() {
        let mut order = Order::new("customer-1", vec![], 100.0);
        order.status = OrderStatus::Delivered;
        order.update_checksum();

        let event = TimelineEvent::new(
            2,
            order.id.clone(),
            &Actor::customer("customer-1", "Customer"),
            "cmd-1".to_string(),
            TimelineEventType::ReturnRequested,
            "Return RT00000001AAAA requested".to_string(),
            TimelinePayload::ReturnRequested {
                return_id: "return-1".to_string(),
                return_number: "RT00000001AAAA".to_string(),
                item_count: 1,
            },
        );

        ReturnRequestedApplier.apply(&mut order, &event);

        assert_eq!(order.status, OrderStatus::Delivered);
        assert_eq!(order.last_sequence, 2);
        assert_eq!(order.updated_at, event.timestamp);
        assert!(order.verify_checksum());
    }
}
