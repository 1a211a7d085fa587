//! Order lifecycle and settlement ledger
//!
//! This crate implements the order settlement core:
//!
//! - **manager**: `LedgerManager` for command processing and event generation
//! - **storage**: redb-based persistence for orders, returns, refunds, stock
//!   counters and the append-only timeline
//! - **actions**: one command handler per ledger operation
//! - **appliers**: pure event application onto the order record
//! - **reducer**: timeline replay and audit verification
//!
//! # Architecture
//!
//! ```text
//! Command → LedgerManager → TimelineEvent → Storage (redb)
//!                 ↓                              ↓
//!              Broadcast                  Order/Return/Refund rows
//!                 ↓
//!           All Subscribers
//! ```
//!
//! # Command Flow
//!
//! 1. Caller submits a `LedgerCommand` (or uses a typed manager method)
//! 2. LedgerManager validates and processes the command inside one write
//!    transaction; the single-writer transaction is the serialization point
//!    that closes the check-then-write races
//! 3. Exactly one `TimelineEvent` is generated with a global sequence
//! 4. Entity rows, the order record, and the timeline row commit atomically
//! 5. The event is broadcast to all subscribers

pub mod actions;
pub mod appliers;
pub mod manager;
pub mod money;
pub mod reducer;
pub mod storage;
pub mod traits;

// Re-exports
pub use manager::{CommandOutcome, LedgerManager, ManagerError, ManagerResult};
pub use reducer::replay_order;
pub use storage::{LedgerStorage, StorageError, StorageResult};
pub use traits::{CommandContext, CommandHandler, CommandMetadata, EventApplier, OrderError};

// Re-export shared types for convenience
pub use shared::order::{
    Actor, ActorType, LedgerCommand, LedgerCommandPayload, Order, OrderRefund, OrderReturn,
    OrderStatus, RefundStatus, RefundType, ReturnItemInput, ReturnStatus, TimelineEvent,
    TimelineEventType, TimelinePayload,
};
