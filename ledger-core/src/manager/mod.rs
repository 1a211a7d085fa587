//! LedgerManager - command processing and event generation
//!
//! This module handles:
//! - Command validation and processing
//! - Timeline event generation with global sequence numbers
//! - Atomic persistence to redb
//! - Event broadcasting to subscribers
//!
//! # Command Flow
//!
//! ```text
//! execute_command(cmd)
//!     ├─ 1. Idempotency check (command_id)
//!     ├─ 2. Begin write transaction
//!     ├─ 3. Create CommandContext
//!     ├─ 4. Convert command to action and execute
//!     ├─ 5. Apply events to the order record via EventApplier
//!     ├─ 6. Persist order, entity rows and timeline
//!     ├─ 7. Mark command processed, advance sequence
//!     ├─ 8. Commit transaction
//!     ├─ 9. Broadcast event(s)
//!     └─ 10. Return the created/updated entity
//! ```
//!
//! The single write transaction covers the precondition reads and every row
//! touched by the operation, so concurrent callers cannot interleave between
//! a check and its write.

mod error;
pub use error::*;

#[cfg(test)]
mod tests;

use crate::actions::CommandAction;
use crate::appliers::EventAction;
use crate::reducer::replay_order;
use crate::storage::{LedgerStorage, StorageStats};
use crate::traits::{CommandContext, CommandHandler, CommandMetadata, EventApplier, OrderError};
use shared::order::{
    Actor, LedgerCommand, LedgerCommandPayload, Order, OrderRefund, OrderReturn, OrderStatus,
    RefundType, ReturnItemInput, TimelineEvent, TimelinePayload,
};
use std::path::Path;
use tokio::sync::broadcast;

/// Event broadcast channel capacity
const EVENT_CHANNEL_CAPACITY: usize = 4096;

/// Entity returned by a successful command
#[derive(Debug, Clone, serde::Serialize)]
#[serde(untagged)]
pub enum CommandOutcome {
    Order(Order),
    Return(OrderReturn),
    Refund(OrderRefund),
}

/// LedgerManager for command processing
///
/// The `epoch` field is a unique identifier generated on each startup.
/// Timeline consumers use it to detect restarts and trigger a full resync.
#[derive(Clone)]
pub struct LedgerManager {
    storage: LedgerStorage,
    event_tx: broadcast::Sender<TimelineEvent>,
    epoch: String,
}

impl std::fmt::Debug for LedgerManager {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("LedgerManager")
            .field("storage", &"<LedgerStorage>")
            .field("event_tx", &"<broadcast::Sender>")
            .field("epoch", &self.epoch)
            .finish()
    }
}

impl LedgerManager {
    /// Create a new LedgerManager with the given database path
    pub fn new(db_path: impl AsRef<Path>) -> ManagerResult<Self> {
        Ok(Self::with_storage(LedgerStorage::open(db_path)?))
    }

    /// Create a LedgerManager over an in-memory store (tests, tooling)
    pub fn in_memory() -> ManagerResult<Self> {
        Ok(Self::with_storage(LedgerStorage::open_in_memory()?))
    }

    /// Create a LedgerManager with an existing storage handle
    pub fn with_storage(storage: LedgerStorage) -> Self {
        let (event_tx, _) = broadcast::channel(EVENT_CHANNEL_CAPACITY);
        let epoch = uuid::Uuid::new_v4().to_string();
        tracing::info!(epoch = %epoch, "LedgerManager started with new epoch");
        Self {
            storage,
            event_tx,
            epoch,
        }
    }

    /// Get the server epoch (unique instance ID)
    pub fn epoch(&self) -> &str {
        &self.epoch
    }

    /// Subscribe to committed timeline events
    pub fn subscribe(&self) -> broadcast::Receiver<TimelineEvent> {
        self.event_tx.subscribe()
    }

    /// Access the underlying storage
    pub fn storage(&self) -> &LedgerStorage {
        &self.storage
    }

    // ========== Placement seam (used by the external placement flow) ==========

    /// Register a freshly placed order, enforcing order-number uniqueness.
    ///
    /// Placement is not a ledger operation and writes no timeline event.
    pub fn insert_order(&self, order: Order) -> ManagerResult<Order> {
        let order = self.storage.insert_new_order(order)?;
        tracing::info!(order_id = %order.id, order_number = %order.order_number, "Order registered");
        Ok(order)
    }

    // ========== Ledger operations ==========

    /// Execute a caller-assembled command (carries the idempotency key)
    pub async fn execute_command(&self, cmd: LedgerCommand) -> ManagerResult<CommandOutcome> {
        let command_id = cmd.command_id.clone();
        match self.process_command(cmd).await {
            Ok((outcome, events)) => {
                for event in events {
                    tracing::info!(
                        order_id = %event.order_id,
                        sequence = event.sequence,
                        event_type = %event.event_type,
                        "Timeline event committed"
                    );
                    let _ = self.event_tx.send(event);
                }
                Ok(outcome)
            }
            Err(e) => {
                tracing::warn!(command_id = %command_id, error = %e, "Command rejected");
                Err(e)
            }
        }
    }

    /// Change an order's status along the transition graph
    pub async fn update_status(
        &self,
        order_id: &str,
        new_status: OrderStatus,
        notes: Option<String>,
        actor: Actor,
    ) -> ManagerResult<Order> {
        let cmd = LedgerCommand::new(
            actor,
            LedgerCommandPayload::UpdateStatus {
                order_id: order_id.to_string(),
                new_status,
                notes,
            },
        );
        self.expect_order(self.execute_command(cmd).await?)
    }

    /// Cancel an order and restore its reserved stock
    pub async fn cancel_order(
        &self,
        order_id: &str,
        reason: impl Into<String>,
        notes: Option<String>,
        actor: Actor,
    ) -> ManagerResult<Order> {
        let cmd = LedgerCommand::new(
            actor,
            LedgerCommandPayload::CancelOrder {
                order_id: order_id.to_string(),
                reason: reason.into(),
                notes,
            },
        );
        self.expect_order(self.execute_command(cmd).await?)
    }

    /// Open a return request against a delivered order
    pub async fn create_return_request(
        &self,
        order_id: &str,
        items: Vec<ReturnItemInput>,
        reason: impl Into<String>,
        description: Option<String>,
        images: Option<Vec<String>>,
        actor: Actor,
    ) -> ManagerResult<OrderReturn> {
        let cmd = LedgerCommand::new(
            actor,
            LedgerCommandPayload::CreateReturnRequest {
                order_id: order_id.to_string(),
                items,
                reason: reason.into(),
                description,
                images,
            },
        );
        self.expect_return(self.execute_command(cmd).await?)
    }

    /// Approve or reject a requested return
    pub async fn process_return_request(
        &self,
        return_id: &str,
        approved: bool,
        review_notes: Option<String>,
        actor: Actor,
    ) -> ManagerResult<OrderReturn> {
        let cmd = LedgerCommand::new(
            actor,
            LedgerCommandPayload::ProcessReturnRequest {
                return_id: return_id.to_string(),
                approved,
                review_notes,
            },
        );
        self.expect_return(self.execute_command(cmd).await?)
    }

    /// Issue a refund against an order's remaining refundable balance
    #[allow(clippy::too_many_arguments)]
    pub async fn create_refund(
        &self,
        order_id: &str,
        amount: f64,
        refund_type: RefundType,
        reason: impl Into<String>,
        description: Option<String>,
        return_id: Option<String>,
        actor: Actor,
    ) -> ManagerResult<OrderRefund> {
        let cmd = LedgerCommand::new(
            actor,
            LedgerCommandPayload::CreateRefund {
                order_id: order_id.to_string(),
                amount,
                refund_type,
                reason: reason.into(),
                description,
                return_id,
            },
        );
        match self.execute_command(cmd).await? {
            CommandOutcome::Refund(refund) => Ok(refund),
            _ => Err(ManagerError::Internal(
                "unexpected outcome for refund command".to_string(),
            )),
        }
    }

    /// Process command and return outcome with events
    ///
    /// Uses the action-based architecture:
    /// 1. Convert command to CommandAction
    /// 2. Execute action to generate the timeline event
    /// 3. Apply the event to the order record via EventApplier
    /// 4. Persist everything atomically
    async fn process_command(
        &self,
        cmd: LedgerCommand,
    ) -> ManagerResult<(CommandOutcome, Vec<TimelineEvent>)> {
        tracing::debug!(command_id = %cmd.command_id, payload = ?cmd.payload, "Processing command");

        // 1. Idempotency check (before transaction)
        if self.storage.is_command_processed(&cmd.command_id)? {
            tracing::warn!(command_id = %cmd.command_id, "Duplicate command");
            return Err(ManagerError::DuplicateCommand(cmd.command_id));
        }

        // 2. Begin write transaction
        let txn = self.storage.begin_write()?;

        // Double-check idempotency within transaction
        if self
            .storage
            .is_command_processed_txn(&txn, &cmd.command_id)?
        {
            return Err(ManagerError::DuplicateCommand(cmd.command_id));
        }

        // 3. Create context and metadata
        let current_sequence = self.storage.get_current_sequence()?;
        let mut ctx = CommandContext::new(&txn, &self.storage, current_sequence);
        let metadata = CommandMetadata {
            command_id: cmd.command_id.clone(),
            actor: cmd.actor.clone(),
            timestamp: cmd.timestamp,
        };

        // 4. Convert to action and execute
        let action = CommandAction::from(&cmd);
        let events = action.execute(&mut ctx, &metadata).await?;

        // 5. Apply each event to its order record and append the timeline
        let mut updated_order: Option<Order> = None;
        for event in &events {
            let mut order = self
                .storage
                .get_order_txn(&txn, &event.order_id)?
                .ok_or_else(|| {
                    ManagerError::Internal(format!(
                        "order {} missing while applying event",
                        event.order_id
                    ))
                })?;
            let applier = EventAction::from(event);
            applier.apply(&mut order, event);
            self.storage.store_order(&txn, &order)?;
            self.storage.store_timeline_event(&txn, event)?;
            updated_order = Some(order);
        }

        // 6. Resolve the entity the caller gets back
        let first = events
            .first()
            .ok_or_else(|| ManagerError::Internal("command produced no events".to_string()))?;
        let outcome = match &first.payload {
            TimelinePayload::StatusChanged { .. } | TimelinePayload::OrderCancelled { .. } => {
                CommandOutcome::Order(updated_order.ok_or_else(|| {
                    ManagerError::Internal("no order state after apply".to_string())
                })?)
            }
            TimelinePayload::ReturnRequested { return_id, .. }
            | TimelinePayload::ReturnApproved { return_id, .. }
            | TimelinePayload::ReturnRejected { return_id, .. } => {
                let ret = self
                    .storage
                    .get_return_txn(&txn, return_id)?
                    .ok_or_else(|| {
                        ManagerError::Internal(format!("return {} missing after write", return_id))
                    })?;
                CommandOutcome::Return(ret)
            }
            TimelinePayload::RefundInitiated { refund_id, .. } => {
                let refund = self
                    .storage
                    .get_refund_txn(&txn, refund_id)?
                    .ok_or_else(|| {
                        ManagerError::Internal(format!("refund {} missing after write", refund_id))
                    })?;
                CommandOutcome::Refund(refund)
            }
        };

        // 7. Advance sequence, mark processed, commit
        self.storage.set_sequence(&txn, ctx.current_sequence())?;
        self.storage.mark_command_processed(&txn, &cmd.command_id)?;
        txn.commit().map_err(crate::storage::StorageError::from)?;

        Ok((outcome, events))
    }

    fn expect_order(&self, outcome: CommandOutcome) -> ManagerResult<Order> {
        match outcome {
            CommandOutcome::Order(order) => Ok(order),
            _ => Err(ManagerError::Internal(
                "unexpected outcome for order command".to_string(),
            )),
        }
    }

    fn expect_return(&self, outcome: CommandOutcome) -> ManagerResult<OrderReturn> {
        match outcome {
            CommandOutcome::Return(ret) => Ok(ret),
            _ => Err(ManagerError::Internal(
                "unexpected outcome for return command".to_string(),
            )),
        }
    }

    // ========== Queries ==========

    /// Get an order by ID
    pub fn get_order(&self, order_id: &str) -> ManagerResult<Order> {
        self.storage
            .get_order(order_id)?
            .ok_or_else(|| ManagerError::Order(OrderError::OrderNotFound(order_id.to_string())))
    }

    /// Get a return by ID
    pub fn get_return(&self, return_id: &str) -> ManagerResult<OrderReturn> {
        self.storage
            .get_return(return_id)?
            .ok_or_else(|| ManagerError::Order(OrderError::ReturnNotFound(return_id.to_string())))
    }

    /// All returns recorded against an order
    pub fn get_returns_for_order(&self, order_id: &str) -> ManagerResult<Vec<OrderReturn>> {
        Ok(self.storage.get_returns_for_order(order_id)?)
    }

    /// All refunds issued against an order
    pub fn get_refunds_for_order(&self, order_id: &str) -> ManagerResult<Vec<OrderRefund>> {
        Ok(self.storage.get_refunds_for_order(order_id)?)
    }

    /// Full audit timeline of an order, in sequence order
    pub fn get_timeline_for_order(&self, order_id: &str) -> ManagerResult<Vec<TimelineEvent>> {
        Ok(self.storage.get_timeline_for_order(order_id)?)
    }

    /// Events after a sequence, across all orders (consumer catch-up)
    pub fn get_events_since(&self, since_sequence: u64) -> ManagerResult<Vec<TimelineEvent>> {
        Ok(self.storage.get_events_since(since_sequence)?)
    }

    /// Storage statistics
    pub fn get_stats(&self) -> ManagerResult<StorageStats> {
        Ok(self.storage.get_stats()?)
    }

    // ========== Audit verification ==========

    /// Rebuild an order's lifecycle state from its timeline
    pub fn rebuild_order(&self, order_id: &str) -> ManagerResult<Order> {
        let stored = self.get_order(order_id)?;
        let events = self.storage.get_timeline_for_order(order_id)?;
        Ok(replay_order(stored.placement_baseline(), &events))
    }

    /// Verify the stored record matches a replay of its timeline
    pub fn verify_order(&self, order_id: &str) -> ManagerResult<bool> {
        let stored = self.get_order(order_id)?;
        let rebuilt = self.rebuild_order(order_id)?;
        let matches = rebuilt.state_checksum == stored.state_checksum
            && rebuilt.status == stored.status
            && rebuilt.last_sequence == stored.last_sequence;
        if !matches {
            tracing::error!(
                order_id = %order_id,
                stored_checksum = %stored.state_checksum,
                rebuilt_checksum = %rebuilt.state_checksum,
                "Replay drift detected"
            );
        }
        Ok(matches)
    }
}
