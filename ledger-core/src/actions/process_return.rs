//! ProcessReturnRequest command handler
//!
//! Reviews a REQUESTED return: one transition to APPROVED or REJECTED, then
//! the return is immutable. Refund issuance is a separate, explicit call;
//! approval and money movement are different authorities.

use async_trait::async_trait;

use crate::traits::{CommandContext, CommandHandler, CommandMetadata, OrderError};
use shared::order::{ReturnStatus, TimelineEvent, TimelineEventType, TimelinePayload};

/// ProcessReturnRequest action
#[derive(Debug, Clone)]
pub struct ProcessReturnAction {
    pub return_id: String,
    pub approved: bool,
    pub review_notes: Option<String>,
}

#[async_trait]
impl CommandHandler for ProcessReturnAction {
    async fn execute(
        &self,
        ctx: &mut CommandContext<'_>,
        metadata: &CommandMetadata,
    ) -> Result<Vec<TimelineEvent>, OrderError> {
        // 1. Load the return; only REQUESTED returns can be reviewed
        let mut ret = ctx.load_return(&self.return_id)?;
        if ret.status != ReturnStatus::Requested {
            return Err(OrderError::InvalidReturnState(ret.status));
        }

        // 2. Stamp the review
        ret.status = if self.approved {
            ReturnStatus::Approved
        } else {
            ReturnStatus::Rejected
        };
        ret.reviewed_by = metadata.actor.actor_id.clone();
        ret.reviewed_by_name = metadata.actor.actor_name.clone();
        ret.reviewed_at = Some(shared::util::now_millis());
        ret.review_notes = self.review_notes.clone();
        ctx.update_return(&ret)?;

        // 3. Emit the event against the owning order
        let seq = ctx.next_sequence();
        let (event_type, title, payload) = if self.approved {
            (
                TimelineEventType::ReturnApproved,
                format!("Return {} approved", ret.return_number),
                TimelinePayload::ReturnApproved {
                    return_id: ret.id.clone(),
                    return_number: ret.return_number.clone(),
                    approved: true,
                },
            )
        } else {
            (
                TimelineEventType::ReturnRejected,
                format!("Return {} rejected", ret.return_number),
                TimelinePayload::ReturnRejected {
                    return_id: ret.id.clone(),
                    return_number: ret.return_number.clone(),
                    approved: false,
                },
            )
        };

        let event = TimelineEvent::new(
            seq,
            ret.order_id.clone(),
            &metadata.actor,
            metadata.command_id.clone(),
            event_type,
            title,
            payload,
        );

        Ok(vec![event])
    }
}
