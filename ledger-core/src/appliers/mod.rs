//! Event applier implementations
//!
//! Each applier implements the `EventApplier` trait and handles one timeline
//! event type. Appliers are PURE functions on the order record: replaying the
//! same events always yields the same record, which is what makes the
//! timeline a sufficient audit log.

use enum_dispatch::enum_dispatch;

use crate::traits::EventApplier;
use shared::order::{Order, TimelineEvent, TimelinePayload};

mod order_cancelled;
mod refund_initiated;
mod return_requested;
mod return_reviewed;
mod status_changed;

pub use order_cancelled::OrderCancelledApplier;
pub use refund_initiated::RefundInitiatedApplier;
pub use return_requested::ReturnRequestedApplier;
pub use return_reviewed::{ReturnApprovedApplier, ReturnRejectedApplier};
pub use status_changed::StatusChangedApplier;

/// EventAction enum - dispatches to concrete applier implementations
///
/// Uses enum_dispatch for zero-cost static dispatch.
#[enum_dispatch(EventApplier)]
pub enum EventAction {
    StatusChanged(StatusChangedApplier),
    OrderCancelled(OrderCancelledApplier),
    ReturnRequested(ReturnRequestedApplier),
    ReturnApproved(ReturnApprovedApplier),
    ReturnRejected(ReturnRejectedApplier),
    RefundInitiated(RefundInitiatedApplier),
}

/// Convert TimelineEvent reference to EventAction
///
/// This is the ONLY place with a match on TimelinePayload.
impl From<&TimelineEvent> for EventAction {
    fn from(event: &TimelineEvent) -> Self {
        match &event.payload {
            TimelinePayload::StatusChanged { .. } => {
                EventAction::StatusChanged(StatusChangedApplier)
            }
            TimelinePayload::OrderCancelled { .. } => {
                EventAction::OrderCancelled(OrderCancelledApplier)
            }
            TimelinePayload::ReturnRequested { .. } => {
                EventAction::ReturnRequested(ReturnRequestedApplier)
            }
            TimelinePayload::ReturnApproved { .. } => {
                EventAction::ReturnApproved(ReturnApprovedApplier)
            }
            TimelinePayload::ReturnRejected { .. } => {
                EventAction::ReturnRejected(ReturnRejectedApplier)
            }
            TimelinePayload::RefundInitiated { .. } => {
                EventAction::RefundInitiated(RefundInitiatedApplier)
            }
        }
    }
}

/// Advance the audit bookkeeping shared by every applier
pub(crate) fn touch(order: &mut Order, event: &TimelineEvent) {
    order.last_sequence = event.sequence;
    order.updated_at = event.timestamp;
    order.update_checksum();
}
