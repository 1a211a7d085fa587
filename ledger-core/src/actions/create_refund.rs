//! CreateRefund command handler
//!
//! Issues a refund record against an order while enforcing that cumulative
//! non-failed refunds never exceed the order total. Gateway settlement is
//! external; this only records intent.

use async_trait::async_trait;

use crate::money::{to_decimal, to_f64, validate_amount};
use crate::traits::{
    check_expected_version, CommandContext, CommandHandler, CommandMetadata, OrderError,
};
use shared::order::{
    OrderRefund, RefundStatus, RefundType, TimelineEvent, TimelineEventType, TimelinePayload,
};

/// CreateRefund action
#[derive(Debug, Clone)]
pub struct CreateRefundAction {
    pub order_id: String,
    pub amount: f64,
    pub refund_type: RefundType,
    pub reason: String,
    pub description: Option<String>,
    pub return_id: Option<String>,
    pub expected_version: Option<u64>,
}

#[async_trait]
impl CommandHandler for CreateRefundAction {
    async fn execute(
        &self,
        ctx: &mut CommandContext<'_>,
        metadata: &CommandMetadata,
    ) -> Result<Vec<TimelineEvent>, OrderError> {
        // 1. Load the order
        let order = ctx.load_order(&self.order_id)?;
        check_expected_version(&order, self.expected_version)?;
        validate_amount(self.amount)?;

        // Cancelled orders are closed in the audit sense and take no refunds
        if order.is_cancelled() {
            return Err(OrderError::InvalidStateForRefund(order.status));
        }

        // 2. An optional return link must point at a return of this order
        if let Some(return_id) = &self.return_id {
            let linked = ctx.load_return(return_id)?;
            if linked.order_id != self.order_id {
                return Err(OrderError::ReturnNotFound(return_id.clone()));
            }
        }

        // 3. Decimal arithmetic: refunded total counts PROCESSING + COMPLETED
        let refunded = ctx.refunded_total(&self.order_id)?;
        let requested = to_decimal(self.amount);
        let total = to_decimal(order.total);
        if refunded + requested > total {
            return Err(OrderError::RefundExceedsOrderTotal {
                requested: self.amount,
                refunded: to_f64(refunded),
                total: order.total,
            });
        }

        // 4. Create the PROCESSING refund in the same write.
        //    refund_type is descriptive only; the arithmetic above is the
        //    single source of truth.
        let refund = OrderRefund {
            id: uuid::Uuid::new_v4().to_string(),
            refund_number: shared::util::refund_number(),
            order_id: self.order_id.clone(),
            return_id: self.return_id.clone(),
            amount: self.amount,
            refund_type: self.refund_type,
            status: RefundStatus::Processing,
            reason: self.reason.clone(),
            description: self.description.clone(),
            processed_by: metadata.actor.actor_id.clone(),
            processed_by_name: metadata.actor.actor_name.clone(),
            processed_at: shared::util::now_millis(),
        };
        ctx.insert_refund(&refund)?;

        // 5. Emit the event
        let seq = ctx.next_sequence();
        let event = TimelineEvent::new(
            seq,
            self.order_id.clone(),
            &metadata.actor,
            metadata.command_id.clone(),
            TimelineEventType::RefundInitiated,
            format!("Refund {} initiated", refund.refund_number),
            TimelinePayload::RefundInitiated {
                refund_id: refund.id.clone(),
                refund_number: refund.refund_number.clone(),
                amount: refund.amount,
                refund_type: refund.refund_type,
            },
        );

        Ok(vec![event])
    }
}
