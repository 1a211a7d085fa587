//! Ledger commands - requests from callers to mutate an order
//!
//! The command envelope carries the client-supplied idempotency key
//! (`command_id`) and an optional optimistic version check.

use super::refund::RefundType;
use super::record::OrderStatus;
use super::types::Actor;
use serde::{Deserialize, Serialize};

/// One requested item line in a return request
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ReturnItemInput {
    pub order_item_id: String,
    pub quantity: i32,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub reason: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub condition: Option<String>,
}

/// Command envelope
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LedgerCommand {
    /// Client-supplied idempotency key; duplicates are rejected
    pub command_id: String,
    /// Triggering identity
    pub actor: Actor,
    /// Client timestamp (Unix milliseconds) - audit only, the server stamps
    /// the authoritative event time
    pub timestamp: i64,
    /// Optional optimistic check against the order's `last_sequence`
    #[serde(skip_serializing_if = "Option::is_none")]
    pub expected_version: Option<u64>,
    pub payload: LedgerCommandPayload,
}

impl LedgerCommand {
    pub fn new(actor: Actor, payload: LedgerCommandPayload) -> Self {
        Self {
            command_id: uuid::Uuid::new_v4().to_string(),
            actor,
            timestamp: crate::util::now_millis(),
            expected_version: None,
            payload,
        }
    }

    pub fn with_expected_version(mut self, version: u64) -> Self {
        self.expected_version = Some(version);
        self
    }
}

/// Command payload variants - one per ledger operation
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "SCREAMING_SNAKE_CASE")]
pub enum LedgerCommandPayload {
    UpdateStatus {
        order_id: String,
        new_status: OrderStatus,
        #[serde(skip_serializing_if = "Option::is_none")]
        notes: Option<String>,
    },

    CancelOrder {
        order_id: String,
        reason: String,
        #[serde(skip_serializing_if = "Option::is_none")]
        notes: Option<String>,
    },

    CreateReturnRequest {
        order_id: String,
        items: Vec<ReturnItemInput>,
        reason: String,
        #[serde(skip_serializing_if = "Option::is_none")]
        description: Option<String>,
        #[serde(skip_serializing_if = "Option::is_none")]
        images: Option<Vec<String>>,
    },

    ProcessReturnRequest {
        return_id: String,
        approved: bool,
        #[serde(skip_serializing_if = "Option::is_none")]
        review_notes: Option<String>,
    },

    CreateRefund {
        order_id: String,
        amount: f64,
        refund_type: RefundType,
        reason: String,
        #[serde(skip_serializing_if = "Option::is_none")]
        description: Option<String>,
        #[serde(skip_serializing_if = "Option::is_none")]
        return_id: Option<String>,
    },
}
