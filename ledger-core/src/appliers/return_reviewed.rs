//! Return review event appliers
//!
//! Review outcomes mutate the return row, not the order; the order record
//! only advances its audit bookkeeping.

use super::touch;
use crate::traits::EventApplier;
use shared::order::{Order, TimelineEvent, TimelinePayload};

/// ReturnApproved applier
pub struct ReturnApprovedApplier;

impl EventApplier for ReturnApprovedApplier {
    fn apply(&self, order: &mut Order, event: &TimelineEvent) {
        if matches!(event.payload, TimelinePayload::ReturnApproved { .. }) {
            touch(order, event);
        }
    }
}

/// ReturnRejected applier
pub struct ReturnRejectedApplier;

impl EventApplier for ReturnRejectedApplier {
    fn apply(&self, order: &mut Order, event: &TimelineEvent) {
        if matches!(event.payload, TimelinePayload::ReturnRejected { .. }) {
            touch(order, event);
        }
    }
}
