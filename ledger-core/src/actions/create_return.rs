//! CreateReturnRequest command handler
//!
//! Opens a post-delivery return request after validating every requested
//! line against the original order.

use async_trait::async_trait;

use crate::traits::{
    check_expected_version, CommandContext, CommandHandler, CommandMetadata, OrderError,
};
use shared::order::{
    OrderReturn, OrderReturnItem, ReturnItemInput, ReturnStatus, TimelineEvent,
    TimelineEventType, TimelinePayload,
};

/// CreateReturnRequest action
#[derive(Debug, Clone)]
pub struct CreateReturnAction {
    pub order_id: String,
    pub items: Vec<ReturnItemInput>,
    pub reason: String,
    pub description: Option<String>,
    pub images: Option<Vec<String>>,
    pub expected_version: Option<u64>,
}

#[async_trait]
impl CommandHandler for CreateReturnAction {
    async fn execute(
        &self,
        ctx: &mut CommandContext<'_>,
        metadata: &CommandMetadata,
    ) -> Result<Vec<TimelineEvent>, OrderError> {
        // 1. Load the order; only delivered orders accept returns
        let order = ctx.load_order(&self.order_id)?;
        check_expected_version(&order, self.expected_version)?;
        if !order.is_delivered() {
            return Err(OrderError::InvalidStateForReturn(order.status));
        }

        if self.items.is_empty() {
            return Err(OrderError::EmptyReturn);
        }

        // 2. Per line: membership, positive quantity, and the remaining
        //    returnable ceiling. The ceiling subtracts quantities already
        //    claimed by prior non-rejected returns, so several requests can
        //    never together exceed the ordered quantity.
        let prior_returns = ctx.returns_for_order(&self.order_id)?;
        for input in &self.items {
            let ordered = order
                .find_item(&input.order_item_id)
                .ok_or_else(|| OrderError::ItemNotFound(input.order_item_id.clone()))?;

            if input.quantity <= 0 {
                return Err(OrderError::InvalidQuantity(input.quantity));
            }

            let claimed: i32 = prior_returns
                .iter()
                .filter(|r| r.status != ReturnStatus::Rejected)
                .map(|r| r.quantity_for_item(&input.order_item_id))
                .sum();
            let available = ordered.quantity - claimed;

            if input.quantity > available {
                return Err(OrderError::QuantityExceedsOrdered {
                    order_item_id: input.order_item_id.clone(),
                    requested: input.quantity,
                    available,
                });
            }
        }

        // 3. Create the return with its item lines in the same write
        let now = shared::util::now_millis();
        let ret = OrderReturn {
            id: uuid::Uuid::new_v4().to_string(),
            return_number: shared::util::return_number(),
            order_id: self.order_id.clone(),
            status: ReturnStatus::Requested,
            reason: self.reason.clone(),
            description: self.description.clone(),
            images: self.images.clone(),
            items: self
                .items
                .iter()
                .map(|i| OrderReturnItem {
                    order_item_id: i.order_item_id.clone(),
                    quantity: i.quantity,
                    reason: i.reason.clone(),
                    condition: i.condition.clone(),
                })
                .collect(),
            requested_by: metadata.actor.actor_id.clone(),
            requested_by_name: metadata.actor.actor_name.clone(),
            requested_at: now,
            reviewed_by: None,
            reviewed_by_name: None,
            reviewed_at: None,
            review_notes: None,
        };
        ctx.insert_return(&ret)?;

        // 4. Emit the event
        let seq = ctx.next_sequence();
        let event = TimelineEvent::new(
            seq,
            self.order_id.clone(),
            &metadata.actor,
            metadata.command_id.clone(),
            TimelineEventType::ReturnRequested,
            format!("Return {} requested", ret.return_number),
            TimelinePayload::ReturnRequested {
                return_id: ret.id.clone(),
                return_number: ret.return_number.clone(),
                item_count: ret.items.len(),
            },
        );

        Ok(vec![event])
    }
}
