//! RefundInitiated event applier
//!
//! The refund row carries the money; the order record only advances its
//! audit bookkeeping.

use super::touch;
use crate::traits::EventApplier;
use shared::order::{Order, TimelineEvent, TimelinePayload};

/// RefundInitiated applier
pub struct RefundInitiatedApplier;

impl EventApplier for RefundInitiatedApplier {
    fn apply(&self, order: &mut Order, event: &TimelineEvent) {
        if matches!(event.payload, TimelinePayload::RefundInitiated { .. }) {
            touch(order, event);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use shared::order::{Actor, RefundType, TimelineEventType};

    #[test]
    fn test_refund_event_advances_sequence() {
        let mut order = Order::new("customer-1", vec![], 100.0);

        let event = TimelineEvent::new(
            6,
            order.id.clone(),
            &Actor::admin("admin-1", "Admin"),
            "cmd-1".to_string(),
            TimelineEventType::RefundInitiated,
            "Refund RF00000001AAAA initiated".to_string(),
            TimelinePayload::RefundInitiated {
                refund_id: "refund-1".to_string(),
                refund_number: "RF00000001AAAA".to_string(),
                amount: 25.0,
                refund_type: RefundType::Partial,
            },
        );

        RefundInitiatedApplier.apply(&mut order, &event);

        assert_eq!(order.last_sequence, 6);
        assert_eq!(order.total, 100.0);
        assert!(order.verify_checksum());
    }
}
