//! CancelOrder command handler
//!
//! Cancels an order and restores the reserved stock of every item line, as
//! one atomic unit with the status change and the timeline entry.

use async_trait::async_trait;

use crate::traits::{
    check_expected_version, CommandContext, CommandHandler, CommandMetadata, OrderError,
};
use shared::order::{
    OrderStatus, RestoredStock, TimelineEvent, TimelineEventType, TimelinePayload,
};

/// CancelOrder action
#[derive(Debug, Clone)]
pub struct CancelOrderAction {
    pub order_id: String,
    pub reason: String,
    pub notes: Option<String>,
    pub expected_version: Option<u64>,
}

#[async_trait]
impl CommandHandler for CancelOrderAction {
    async fn execute(
        &self,
        ctx: &mut CommandContext<'_>,
        metadata: &CommandMetadata,
    ) -> Result<Vec<TimelineEvent>, OrderError> {
        // 1. Load the order
        let order = ctx.load_order(&self.order_id)?;
        check_expected_version(&order, self.expected_version)?;

        // 2. Only PENDING / CONFIRMED / PROCESSING orders may be cancelled.
        //    Rejecting an already-cancelled order here is what prevents
        //    double restitution.
        if !order.status.is_cancellable() {
            return Err(OrderError::InvalidStateTransition {
                from: order.status,
                to: OrderStatus::Cancelled,
            });
        }

        // 3. Full restitution: one increment per item line. Runs inside the
        //    open transaction, so a later failure rolls these back too.
        let mut restored_stock = Vec::with_capacity(order.items.len());
        for item in &order.items {
            let level = ctx.restore_stock(&item.product_id, item.quantity)?;
            tracing::debug!(
                order_id = %order.id,
                product_id = %item.product_id,
                quantity = item.quantity,
                stock = level,
                "Restored stock"
            );
            restored_stock.push(RestoredStock {
                product_id: item.product_id.clone(),
                quantity: item.quantity,
            });
        }

        // 4. Emit the event; the applier writes the cancellation metadata
        let seq = ctx.next_sequence();
        let event = TimelineEvent::new(
            seq,
            self.order_id.clone(),
            &metadata.actor,
            metadata.command_id.clone(),
            TimelineEventType::OrderCancelled,
            "Order cancelled".to_string(),
            TimelinePayload::OrderCancelled {
                reason: self.reason.clone(),
                notes: self.notes.clone(),
                restored_stock,
            },
        );

        Ok(vec![event])
    }
}
