//! redb-based storage layer for the settlement ledger
//!
//! # Tables
//!
//! | Table | Key | Value | Purpose |
//! |-------|-----|-------|---------|
//! | `orders` | `order_id` | `Order` | Current order state |
//! | `order_numbers` | `order_number` | `order_id` | Uniqueness index |
//! | `returns` | `return_id` | `OrderReturn` | Return requests |
//! | `refunds` | `refund_id` | `OrderRefund` | Refund ledger |
//! | `timeline` | `(order_id, sequence)` | `TimelineEvent` | Audit trail (append-only) |
//! | `product_stock` | `product_id` | `i64` | Stock counters (restitution target) |
//! | `processed_commands` | `command_id` | `()` | Idempotency check |
//! | `sequence_counter` | `()` | `u64` | Global sequence |
//!
//! # Atomicity
//!
//! Every state-changing operation writes through a single `WriteTransaction`
//! spanning all of the tables above, so the order mutation, its side rows,
//! and the timeline entry become visible together or not at all. redb admits
//! one writer at a time; the write transaction is the serialization point
//! that keeps precondition checks and their writes from interleaving.

use redb::{
    Database, ReadableDatabase, ReadableTable, ReadableTableMetadata, TableDefinition,
    WriteTransaction,
};
use shared::order::{Order, OrderRefund, OrderReturn, TimelineEvent};
use std::path::Path;
use std::sync::Arc;
use thiserror::Error;

/// Table for current order state: key = order_id, value = JSON-serialized Order
const ORDERS_TABLE: TableDefinition<&str, &[u8]> = TableDefinition::new("orders");

/// Uniqueness index for display numbers: key = order_number, value = order_id
const ORDER_NUMBERS_TABLE: TableDefinition<&str, &str> = TableDefinition::new("order_numbers");

/// Table for return requests: key = return_id, value = JSON-serialized OrderReturn
const RETURNS_TABLE: TableDefinition<&str, &[u8]> = TableDefinition::new("returns");

/// Table for refunds: key = refund_id, value = JSON-serialized OrderRefund
const REFUNDS_TABLE: TableDefinition<&str, &[u8]> = TableDefinition::new("refunds");

/// Table for the audit timeline: key = (order_id, sequence), value = JSON-serialized TimelineEvent
const TIMELINE_TABLE: TableDefinition<(&str, u64), &[u8]> = TableDefinition::new("timeline");

/// Table for product stock counters: key = product_id, value = units on hand
const STOCK_TABLE: TableDefinition<&str, i64> = TableDefinition::new("product_stock");

/// Table for processed commands: key = command_id, value = empty (idempotency)
const PROCESSED_COMMANDS_TABLE: TableDefinition<&str, ()> =
    TableDefinition::new("processed_commands");

/// Table for sequence counter: key = "seq", value = u64
const SEQUENCE_TABLE: TableDefinition<&str, u64> = TableDefinition::new("sequence_counter");

const SEQUENCE_KEY: &str = "seq";

/// Retries for order-number collisions before giving up
const NUMBER_RETRY_LIMIT: usize = 5;

/// Storage errors
#[derive(Debug, Error)]
pub enum StorageError {
    #[error("Database error: {0}")]
    Database(#[from] redb::DatabaseError),

    #[error("Transaction error: {0}")]
    Transaction(#[from] redb::TransactionError),

    #[error("Table error: {0}")]
    Table(#[from] redb::TableError),

    #[error("Storage error: {0}")]
    Storage(#[from] redb::StorageError),

    #[error("Commit error: {0}")]
    Commit(#[from] redb::CommitError),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("Order not found: {0}")]
    OrderNotFound(String),

    #[error("Duplicate order number: {0}")]
    DuplicateOrderNumber(String),
}

pub type StorageResult<T> = Result<T, StorageError>;

/// Settlement ledger storage backed by redb
#[derive(Clone)]
pub struct LedgerStorage {
    db: Arc<Database>,
}

impl LedgerStorage {
    /// Open or create the database at the given path
    ///
    /// redb commits are durable as soon as `commit()` returns and the file is
    /// always in a consistent state, so a crash never leaves a half-applied
    /// operation behind.
    pub fn open(path: impl AsRef<Path>) -> StorageResult<Self> {
        let db = Database::create(path)?;
        let storage = Self { db: Arc::new(db) };
        storage.init_tables()?;
        Ok(storage)
    }

    /// Open an in-memory database (for tests and substituted stores)
    pub fn open_in_memory() -> StorageResult<Self> {
        let db = Database::builder().create_with_backend(redb::backends::InMemoryBackend::new())?;
        let storage = Self { db: Arc::new(db) };
        storage.init_tables()?;
        Ok(storage)
    }

    fn init_tables(&self) -> StorageResult<()> {
        let write_txn = self.db.begin_write()?;
        {
            let _ = write_txn.open_table(ORDERS_TABLE)?;
            let _ = write_txn.open_table(ORDER_NUMBERS_TABLE)?;
            let _ = write_txn.open_table(RETURNS_TABLE)?;
            let _ = write_txn.open_table(REFUNDS_TABLE)?;
            let _ = write_txn.open_table(TIMELINE_TABLE)?;
            let _ = write_txn.open_table(STOCK_TABLE)?;
            let _ = write_txn.open_table(PROCESSED_COMMANDS_TABLE)?;

            let mut seq_table = write_txn.open_table(SEQUENCE_TABLE)?;
            if seq_table.get(SEQUENCE_KEY)?.is_none() {
                seq_table.insert(SEQUENCE_KEY, 0u64)?;
            }
        }
        write_txn.commit()?;
        Ok(())
    }

    /// Begin a write transaction
    pub fn begin_write(&self) -> StorageResult<WriteTransaction> {
        Ok(self.db.begin_write()?)
    }

    // ========== Sequence Operations ==========

    /// Get current sequence (read-only)
    pub fn get_current_sequence(&self) -> StorageResult<u64> {
        let read_txn = self.db.begin_read()?;
        let table = read_txn.open_table(SEQUENCE_TABLE)?;
        Ok(table
            .get(SEQUENCE_KEY)?
            .map(|guard| guard.value())
            .unwrap_or(0))
    }

    /// Set sequence number (within transaction)
    ///
    /// Called by the manager after a command allocated its event sequence.
    pub fn set_sequence(&self, txn: &WriteTransaction, sequence: u64) -> StorageResult<()> {
        let mut table = txn.open_table(SEQUENCE_TABLE)?;
        table.insert(SEQUENCE_KEY, sequence)?;
        Ok(())
    }

    // ========== Command Idempotency ==========

    /// Check if a command has been processed
    pub fn is_command_processed(&self, command_id: &str) -> StorageResult<bool> {
        let read_txn = self.db.begin_read()?;
        let table = read_txn.open_table(PROCESSED_COMMANDS_TABLE)?;
        Ok(table.get(command_id)?.is_some())
    }

    /// Check if a command has been processed (within transaction)
    pub fn is_command_processed_txn(
        &self,
        txn: &WriteTransaction,
        command_id: &str,
    ) -> StorageResult<bool> {
        let table = txn.open_table(PROCESSED_COMMANDS_TABLE)?;
        Ok(table.get(command_id)?.is_some())
    }

    /// Mark a command as processed
    pub fn mark_command_processed(
        &self,
        txn: &WriteTransaction,
        command_id: &str,
    ) -> StorageResult<()> {
        let mut table = txn.open_table(PROCESSED_COMMANDS_TABLE)?;
        table.insert(command_id, ())?;
        Ok(())
    }

    // ========== Order Operations ==========

    /// Insert a new order, enforcing order-number uniqueness.
    ///
    /// The display number has a non-zero collision probability; on conflict a
    /// fresh number is generated and the insert retried. Returns the order as
    /// stored (its number may differ from the input on retry).
    pub fn insert_new_order(&self, mut order: Order) -> StorageResult<Order> {
        for _ in 0..NUMBER_RETRY_LIMIT {
            let txn = self.db.begin_write()?;
            let taken = {
                let numbers = txn.open_table(ORDER_NUMBERS_TABLE)?;
                numbers.get(order.order_number.as_str())?.is_some()
            };
            if taken {
                tracing::warn!(
                    order_number = %order.order_number,
                    "Order number collision, regenerating"
                );
                txn.abort()?;
                order.order_number = shared::util::order_number();
                continue;
            }
            {
                let mut numbers = txn.open_table(ORDER_NUMBERS_TABLE)?;
                numbers.insert(order.order_number.as_str(), order.id.as_str())?;
            }
            self.store_order(&txn, &order)?;
            txn.commit()?;
            return Ok(order);
        }
        Err(StorageError::DuplicateOrderNumber(order.order_number))
    }

    /// Store an order record (within transaction)
    pub fn store_order(&self, txn: &WriteTransaction, order: &Order) -> StorageResult<()> {
        let mut table = txn.open_table(ORDERS_TABLE)?;
        let value = serde_json::to_vec(order)?;
        table.insert(order.id.as_str(), value.as_slice())?;
        Ok(())
    }

    /// Get an order by ID
    pub fn get_order(&self, order_id: &str) -> StorageResult<Option<Order>> {
        let read_txn = self.db.begin_read()?;
        let table = read_txn.open_table(ORDERS_TABLE)?;
        match table.get(order_id)? {
            Some(value) => Ok(Some(serde_json::from_slice(value.value())?)),
            None => Ok(None),
        }
    }

    /// Get an order by ID (within transaction)
    pub fn get_order_txn(
        &self,
        txn: &WriteTransaction,
        order_id: &str,
    ) -> StorageResult<Option<Order>> {
        let table = txn.open_table(ORDERS_TABLE)?;
        match table.get(order_id)? {
            Some(value) => Ok(Some(serde_json::from_slice(value.value())?)),
            None => Ok(None),
        }
    }

    // ========== Return Operations ==========

    /// Store a return request (within transaction)
    pub fn store_return(&self, txn: &WriteTransaction, ret: &OrderReturn) -> StorageResult<()> {
        let mut table = txn.open_table(RETURNS_TABLE)?;
        let value = serde_json::to_vec(ret)?;
        table.insert(ret.id.as_str(), value.as_slice())?;
        Ok(())
    }

    /// Get a return by ID
    pub fn get_return(&self, return_id: &str) -> StorageResult<Option<OrderReturn>> {
        let read_txn = self.db.begin_read()?;
        let table = read_txn.open_table(RETURNS_TABLE)?;
        match table.get(return_id)? {
            Some(value) => Ok(Some(serde_json::from_slice(value.value())?)),
            None => Ok(None),
        }
    }

    /// Get a return by ID (within transaction)
    pub fn get_return_txn(
        &self,
        txn: &WriteTransaction,
        return_id: &str,
    ) -> StorageResult<Option<OrderReturn>> {
        let table = txn.open_table(RETURNS_TABLE)?;
        match table.get(return_id)? {
            Some(value) => Ok(Some(serde_json::from_slice(value.value())?)),
            None => Ok(None),
        }
    }

    /// All returns recorded against one order
    pub fn get_returns_for_order(&self, order_id: &str) -> StorageResult<Vec<OrderReturn>> {
        let read_txn = self.db.begin_read()?;
        let table = read_txn.open_table(RETURNS_TABLE)?;
        let mut returns = Vec::new();
        for result in table.iter()? {
            let (_key, value) = result?;
            let ret: OrderReturn = serde_json::from_slice(value.value())?;
            if ret.order_id == order_id {
                returns.push(ret);
            }
        }
        returns.sort_by_key(|r| r.requested_at);
        Ok(returns)
    }

    /// All returns recorded against one order (within transaction)
    pub fn get_returns_for_order_txn(
        &self,
        txn: &WriteTransaction,
        order_id: &str,
    ) -> StorageResult<Vec<OrderReturn>> {
        let table = txn.open_table(RETURNS_TABLE)?;
        let mut returns = Vec::new();
        for result in table.iter()? {
            let (_key, value) = result?;
            let ret: OrderReturn = serde_json::from_slice(value.value())?;
            if ret.order_id == order_id {
                returns.push(ret);
            }
        }
        returns.sort_by_key(|r| r.requested_at);
        Ok(returns)
    }

    // ========== Refund Operations ==========

    /// Store a refund (within transaction)
    pub fn store_refund(&self, txn: &WriteTransaction, refund: &OrderRefund) -> StorageResult<()> {
        let mut table = txn.open_table(REFUNDS_TABLE)?;
        let value = serde_json::to_vec(refund)?;
        table.insert(refund.id.as_str(), value.as_slice())?;
        Ok(())
    }

    /// Get a refund by ID (within transaction)
    pub fn get_refund_txn(
        &self,
        txn: &WriteTransaction,
        refund_id: &str,
    ) -> StorageResult<Option<OrderRefund>> {
        let table = txn.open_table(REFUNDS_TABLE)?;
        match table.get(refund_id)? {
            Some(value) => Ok(Some(serde_json::from_slice(value.value())?)),
            None => Ok(None),
        }
    }

    /// All refunds issued against one order
    pub fn get_refunds_for_order(&self, order_id: &str) -> StorageResult<Vec<OrderRefund>> {
        let read_txn = self.db.begin_read()?;
        let table = read_txn.open_table(REFUNDS_TABLE)?;
        let mut refunds = Vec::new();
        for result in table.iter()? {
            let (_key, value) = result?;
            let refund: OrderRefund = serde_json::from_slice(value.value())?;
            if refund.order_id == order_id {
                refunds.push(refund);
            }
        }
        refunds.sort_by_key(|r| r.processed_at);
        Ok(refunds)
    }

    /// All refunds issued against one order (within transaction)
    pub fn get_refunds_for_order_txn(
        &self,
        txn: &WriteTransaction,
        order_id: &str,
    ) -> StorageResult<Vec<OrderRefund>> {
        let table = txn.open_table(REFUNDS_TABLE)?;
        let mut refunds = Vec::new();
        for result in table.iter()? {
            let (_key, value) = result?;
            let refund: OrderRefund = serde_json::from_slice(value.value())?;
            if refund.order_id == order_id {
                refunds.push(refund);
            }
        }
        refunds.sort_by_key(|r| r.processed_at);
        Ok(refunds)
    }

    // ========== Timeline Operations (append-only) ==========

    /// Append a timeline event. There is deliberately no update or delete
    /// path for this table.
    pub fn store_timeline_event(
        &self,
        txn: &WriteTransaction,
        event: &TimelineEvent,
    ) -> StorageResult<()> {
        let mut table = txn.open_table(TIMELINE_TABLE)?;
        let key = (event.order_id.as_str(), event.sequence);
        let value = serde_json::to_vec(event)?;
        table.insert(key, value.as_slice())?;
        Ok(())
    }

    /// All timeline events for an order, in sequence order
    pub fn get_timeline_for_order(&self, order_id: &str) -> StorageResult<Vec<TimelineEvent>> {
        let read_txn = self.db.begin_read()?;
        let table = read_txn.open_table(TIMELINE_TABLE)?;

        let mut events = Vec::new();
        let range_start = (order_id, 0u64);
        let range_end = (order_id, u64::MAX);

        for result in table.range(range_start..=range_end)? {
            let (_key, value) = result?;
            let event: TimelineEvent = serde_json::from_slice(value.value())?;
            events.push(event);
        }

        events.sort_by_key(|e| e.sequence);
        Ok(events)
    }

    /// Get events since a given sequence (across all orders, for consumers
    /// catching up)
    pub fn get_events_since(&self, since_sequence: u64) -> StorageResult<Vec<TimelineEvent>> {
        let read_txn = self.db.begin_read()?;
        let table = read_txn.open_table(TIMELINE_TABLE)?;

        let mut events = Vec::new();
        for result in table.iter()? {
            let (_key, value) = result?;
            let event: TimelineEvent = serde_json::from_slice(value.value())?;
            if event.sequence > since_sequence {
                events.push(event);
            }
        }

        events.sort_by_key(|e| e.sequence);
        Ok(events)
    }

    // ========== Product Stock ==========

    /// Seed or overwrite a product stock counter
    pub fn set_stock(&self, product_id: &str, quantity: i64) -> StorageResult<()> {
        let txn = self.db.begin_write()?;
        {
            let mut table = txn.open_table(STOCK_TABLE)?;
            table.insert(product_id, quantity)?;
        }
        txn.commit()?;
        Ok(())
    }

    /// Current stock level (0 if unknown product)
    pub fn get_stock(&self, product_id: &str) -> StorageResult<i64> {
        let read_txn = self.db.begin_read()?;
        let table = read_txn.open_table(STOCK_TABLE)?;
        Ok(table.get(product_id)?.map(|g| g.value()).unwrap_or(0))
    }

    /// Adjust a stock counter by delta (within transaction); returns the new level
    pub fn adjust_stock_txn(
        &self,
        txn: &WriteTransaction,
        product_id: &str,
        delta: i64,
    ) -> StorageResult<i64> {
        let mut table = txn.open_table(STOCK_TABLE)?;
        let current = table.get(product_id)?.map(|g| g.value()).unwrap_or(0);
        let next = current + delta;
        table.insert(product_id, next)?;
        Ok(next)
    }

    // ========== Statistics ==========

    /// Get storage statistics
    pub fn get_stats(&self) -> StorageResult<StorageStats> {
        let read_txn = self.db.begin_read()?;

        let orders_table = read_txn.open_table(ORDERS_TABLE)?;
        let returns_table = read_txn.open_table(RETURNS_TABLE)?;
        let refunds_table = read_txn.open_table(REFUNDS_TABLE)?;
        let timeline_table = read_txn.open_table(TIMELINE_TABLE)?;
        let seq_table = read_txn.open_table(SEQUENCE_TABLE)?;

        Ok(StorageStats {
            order_count: orders_table.len()?,
            return_count: returns_table.len()?,
            refund_count: refunds_table.len()?,
            timeline_count: timeline_table.len()?,
            current_sequence: seq_table
                .get(SEQUENCE_KEY)?
                .map(|guard| guard.value())
                .unwrap_or(0),
        })
    }
}

/// Storage statistics
#[derive(Debug, Clone)]
pub struct StorageStats {
    pub order_count: u64,
    pub return_count: u64,
    pub refund_count: u64,
    pub timeline_count: u64,
    pub current_sequence: u64,
}
