//! Core traits and context for command processing
//!
//! Actions implement `CommandHandler`: they read current state through the
//! `CommandContext`, validate preconditions, write their entity rows, and
//! emit exactly one timeline event. Appliers implement `EventApplier`: pure
//! functions from (order, event) to the next order state.

use async_trait::async_trait;
use enum_dispatch::enum_dispatch;
use redb::WriteTransaction;
use rust_decimal::Decimal;
use thiserror::Error;

use crate::money::to_decimal;
use crate::storage::LedgerStorage;
use shared::order::{
    Actor, Order, OrderRefund, OrderReturn, OrderStatus, ReturnStatus, TimelineEvent,
};

/// Domain errors raised by command actions
#[derive(Debug, Error)]
pub enum OrderError {
    #[error("Order not found: {0}")]
    OrderNotFound(String),

    #[error("Return not found: {0}")]
    ReturnNotFound(String),

    #[error("Item not found on order: {0}")]
    ItemNotFound(String),

    #[error("Order already has status {0}")]
    NoStatusChange(OrderStatus),

    #[error("Invalid status transition: {from} -> {to}")]
    InvalidStateTransition {
        from: OrderStatus,
        to: OrderStatus,
    },

    #[error("Order in status {0} does not accept returns")]
    InvalidStateForReturn(OrderStatus),

    #[error("Return already reviewed: status is {0}")]
    InvalidReturnState(ReturnStatus),

    #[error("Order in status {0} does not accept refunds")]
    InvalidStateForRefund(OrderStatus),

    #[error("Return request has no items")]
    EmptyReturn,

    #[error("Invalid quantity: {0}")]
    InvalidQuantity(i32),

    #[error(
        "Return quantity {requested} exceeds remaining returnable {available} for item {order_item_id}"
    )]
    QuantityExceedsOrdered {
        order_item_id: String,
        requested: i32,
        available: i32,
    },

    #[error("Refund of {requested} exceeds order total {total} (already refunded {refunded})")]
    RefundExceedsOrderTotal {
        requested: f64,
        refunded: f64,
        total: f64,
    },

    #[error("Invalid amount: {0}")]
    InvalidAmount(String),

    #[error("Version conflict: expected {expected}, actual {actual}")]
    ConcurrencyConflict { expected: u64, actual: u64 },

    #[error("Storage error: {0}")]
    Storage(String),
}

/// Command metadata passed to every action
#[derive(Debug, Clone)]
pub struct CommandMetadata {
    /// Idempotency key of the originating command
    pub command_id: String,
    /// Triggering identity
    pub actor: Actor,
    /// Client timestamp (Unix milliseconds), audit only
    pub timestamp: i64,
}

/// Execution context for command actions
///
/// Wraps the open write transaction so every read an action performs sees the
/// same state the write will commit against. All entity writes an action
/// performs go through this context and commit (or roll back) together with
/// the order record and the timeline row.
pub struct CommandContext<'a> {
    txn: &'a WriteTransaction,
    storage: &'a LedgerStorage,
    sequence: u64,
}

impl<'a> CommandContext<'a> {
    pub fn new(txn: &'a WriteTransaction, storage: &'a LedgerStorage, current_sequence: u64) -> Self {
        Self {
            txn,
            storage,
            sequence: current_sequence,
        }
    }

    /// Allocate the next global sequence number
    pub fn next_sequence(&mut self) -> u64 {
        self.sequence += 1;
        self.sequence
    }

    /// Highest sequence allocated so far
    pub fn current_sequence(&self) -> u64 {
        self.sequence
    }

    /// Load an order within the transaction
    pub fn load_order(&self, order_id: &str) -> Result<Order, OrderError> {
        self.storage
            .get_order_txn(self.txn, order_id)
            .map_err(|e| OrderError::Storage(e.to_string()))?
            .ok_or_else(|| OrderError::OrderNotFound(order_id.to_string()))
    }

    /// Load a return within the transaction
    pub fn load_return(&self, return_id: &str) -> Result<OrderReturn, OrderError> {
        self.storage
            .get_return_txn(self.txn, return_id)
            .map_err(|e| OrderError::Storage(e.to_string()))?
            .ok_or_else(|| OrderError::ReturnNotFound(return_id.to_string()))
    }

    /// All returns recorded against an order
    pub fn returns_for_order(&self, order_id: &str) -> Result<Vec<OrderReturn>, OrderError> {
        self.storage
            .get_returns_for_order_txn(self.txn, order_id)
            .map_err(|e| OrderError::Storage(e.to_string()))
    }

    /// Sum of refunds that count against the order total (PROCESSING + COMPLETED)
    pub fn refunded_total(&self, order_id: &str) -> Result<Decimal, OrderError> {
        let refunds = self
            .storage
            .get_refunds_for_order_txn(self.txn, order_id)
            .map_err(|e| OrderError::Storage(e.to_string()))?;
        Ok(refunds
            .iter()
            .filter(|r| r.status.counts_against_total())
            .map(|r| to_decimal(r.amount))
            .sum())
    }

    /// Insert a return row (same transaction as the timeline write)
    pub fn insert_return(&self, ret: &OrderReturn) -> Result<(), OrderError> {
        self.storage
            .store_return(self.txn, ret)
            .map_err(|e| OrderError::Storage(e.to_string()))
    }

    /// Overwrite a return row with its reviewed state
    pub fn update_return(&self, ret: &OrderReturn) -> Result<(), OrderError> {
        self.storage
            .store_return(self.txn, ret)
            .map_err(|e| OrderError::Storage(e.to_string()))
    }

    /// Insert a refund row (same transaction as the timeline write)
    pub fn insert_refund(&self, refund: &OrderRefund) -> Result<(), OrderError> {
        self.storage
            .store_refund(self.txn, refund)
            .map_err(|e| OrderError::Storage(e.to_string()))
    }

    /// Increment a product stock counter; returns the new level
    pub fn restore_stock(&self, product_id: &str, quantity: i32) -> Result<i64, OrderError> {
        self.storage
            .adjust_stock_txn(self.txn, product_id, i64::from(quantity))
            .map_err(|e| OrderError::Storage(e.to_string()))
    }
}

/// Optimistic version check shared by order-keyed actions
pub(crate) fn check_expected_version(
    order: &Order,
    expected: Option<u64>,
) -> Result<(), OrderError> {
    if let Some(expected) = expected
        && expected != order.last_sequence
    {
        return Err(OrderError::ConcurrencyConflict {
            expected,
            actual: order.last_sequence,
        });
    }
    Ok(())
}

/// Command handler - one implementation per ledger operation
#[async_trait]
pub trait CommandHandler {
    async fn execute(
        &self,
        ctx: &mut CommandContext<'_>,
        metadata: &CommandMetadata,
    ) -> Result<Vec<TimelineEvent>, OrderError>;
}

/// Event applier - pure function applying one event to the order record
#[enum_dispatch]
pub trait EventApplier {
    fn apply(&self, order: &mut Order, event: &TimelineEvent);
}
