//! Timeline replay
//!
//! Rebuilds an order's lifecycle state by replaying its timeline onto the
//! placement baseline. Because appliers are pure and every mutable field is
//! derived from event data, a faithful timeline reproduces the stored record
//! exactly - checksum included.

use crate::appliers::EventAction;
use crate::traits::EventApplier;
use shared::order::{Order, TimelineEvent};

/// Replay events (in sequence order) onto a baseline order record
pub fn replay_order(baseline: Order, events: &[TimelineEvent]) -> Order {
    let mut order = baseline;
    for event in events {
        let applier = EventAction::from(event);
        applier.apply(&mut order, event);
    }
    order
}
