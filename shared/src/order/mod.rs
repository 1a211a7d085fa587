//! Order lifecycle and settlement ledger types
//!
//! This module provides the types for the order settlement system:
//! - Commands: requests from callers to mutate an order
//! - Timeline events: immutable audit facts recorded after command processing
//! - Records: the current state of orders, returns, and refunds

pub mod command;
pub mod record;
pub mod refund;
pub mod returns;
pub mod timeline;
pub mod types;

// Re-exports
pub use command::{LedgerCommand, LedgerCommandPayload, ReturnItemInput};
pub use record::{Order, OrderStatus};
pub use refund::{OrderRefund, RefundStatus, RefundType};
pub use returns::{OrderReturn, OrderReturnItem, ReturnStatus};
pub use timeline::{RestoredStock, TimelineEvent, TimelineEventType, TimelinePayload};
pub use types::*;
