//! StatusChanged event applier

use super::touch;
use crate::traits::EventApplier;
use shared::order::{Order, OrderStatus, TimelineEvent, TimelinePayload};

/// StatusChanged applier
pub struct StatusChangedApplier;

impl EventApplier for StatusChangedApplier {
    fn apply(&self, order: &mut Order, event: &TimelineEvent) {
        if let TimelinePayload::StatusChanged {
            new_status, notes, ..
        } = &event.payload
        {
            order.status = *new_status;

            // Delivery stamp comes from the event so replay is deterministic
            if *new_status == OrderStatus::Delivered {
                order.actual_delivery = Some(event.timestamp);
            }

            if notes.is_some() {
                order.notes = notes.clone();
            }

            touch(order, event);
        }
    }
}
