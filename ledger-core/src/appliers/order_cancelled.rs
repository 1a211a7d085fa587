//! OrderCancelled event applier
//!
//! Applies the cancellation metadata to the order record. Stock restitution
//! is a side table the action already wrote inside the same transaction; the
//! event's `restored_stock` list is the audit copy.

use super::touch;
use crate::traits::EventApplier;
use shared::order::{Order, OrderStatus, TimelineEvent, TimelinePayload};

/// OrderCancelled applier
pub struct OrderCancelledApplier;

impl EventApplier for OrderCancelledApplier {
    fn apply(&self, order: &mut Order, event: &TimelineEvent) {
        if let TimelinePayload::OrderCancelled { reason, notes, .. } = &event.payload {
            order.status = OrderStatus::Cancelled;
            order.cancellation_reason = Some(reason.clone());
            order.cancellation_notes = notes.clone();
            order.cancelled_at = Some(event.timestamp);
            order.cancelled_by = event.actor_name.clone();

            touch(order, event);
        }
    }
}
