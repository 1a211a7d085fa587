//! Command action implementations
//!
//! Each action implements the `CommandHandler` trait and handles one ledger
//! operation: read state, validate preconditions, write entity rows through
//! the context, and emit exactly one timeline event.

use async_trait::async_trait;

use crate::traits::{CommandContext, CommandHandler, CommandMetadata, OrderError};
use shared::order::{LedgerCommand, LedgerCommandPayload, TimelineEvent};

mod cancel_order;
mod create_refund;
mod create_return;
mod process_return;
mod update_status;

pub use cancel_order::CancelOrderAction;
pub use create_refund::CreateRefundAction;
pub use create_return::CreateReturnAction;
pub use process_return::ProcessReturnAction;
pub use update_status::UpdateStatusAction;

/// CommandAction enum - dispatches to concrete action implementations
pub enum CommandAction {
    UpdateStatus(UpdateStatusAction),
    CancelOrder(CancelOrderAction),
    CreateReturn(CreateReturnAction),
    ProcessReturn(ProcessReturnAction),
    CreateRefund(CreateRefundAction),
}

#[async_trait]
impl CommandHandler for CommandAction {
    async fn execute(
        &self,
        ctx: &mut CommandContext<'_>,
        metadata: &CommandMetadata,
    ) -> Result<Vec<TimelineEvent>, OrderError> {
        match self {
            CommandAction::UpdateStatus(action) => action.execute(ctx, metadata).await,
            CommandAction::CancelOrder(action) => action.execute(ctx, metadata).await,
            CommandAction::CreateReturn(action) => action.execute(ctx, metadata).await,
            CommandAction::ProcessReturn(action) => action.execute(ctx, metadata).await,
            CommandAction::CreateRefund(action) => action.execute(ctx, metadata).await,
        }
    }
}

/// Convert LedgerCommand to CommandAction
///
/// This is the ONLY place with a match on LedgerCommandPayload.
impl From<&LedgerCommand> for CommandAction {
    fn from(cmd: &LedgerCommand) -> Self {
        match &cmd.payload {
            LedgerCommandPayload::UpdateStatus {
                order_id,
                new_status,
                notes,
            } => CommandAction::UpdateStatus(UpdateStatusAction {
                order_id: order_id.clone(),
                new_status: *new_status,
                notes: notes.clone(),
                expected_version: cmd.expected_version,
            }),
            LedgerCommandPayload::CancelOrder {
                order_id,
                reason,
                notes,
            } => CommandAction::CancelOrder(CancelOrderAction {
                order_id: order_id.clone(),
                reason: reason.clone(),
                notes: notes.clone(),
                expected_version: cmd.expected_version,
            }),
            LedgerCommandPayload::CreateReturnRequest {
                order_id,
                items,
                reason,
                description,
                images,
            } => CommandAction::CreateReturn(CreateReturnAction {
                order_id: order_id.clone(),
                items: items.clone(),
                reason: reason.clone(),
                description: description.clone(),
                images: images.clone(),
                expected_version: cmd.expected_version,
            }),
            LedgerCommandPayload::ProcessReturnRequest {
                return_id,
                approved,
                review_notes,
            } => CommandAction::ProcessReturn(ProcessReturnAction {
                return_id: return_id.clone(),
                approved: *approved,
                review_notes: review_notes.clone(),
            }),
            LedgerCommandPayload::CreateRefund {
                order_id,
                amount,
                refund_type,
                reason,
                description,
                return_id,
            } => CommandAction::CreateRefund(CreateRefundAction {
                order_id: order_id.clone(),
                amount: *amount,
                refund_type: *refund_type,
                reason: reason.clone(),
                description: description.clone(),
                return_id: return_id.clone(),
                expected_version: cmd.expected_version,
            }),
        }
    }
}
