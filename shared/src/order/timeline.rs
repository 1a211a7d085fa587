//! Timeline events - immutable audit facts recorded after command processing
//!
//! Every state-changing operation appends exactly one timeline event inside
//! the same transaction as the mutation it describes. Rows are never updated
//! or deleted.

use super::types::{Actor, ActorType};
use super::{OrderStatus, RefundType};
use serde::{Deserialize, Serialize};

/// Timeline event - immutable audit record
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct TimelineEvent {
    /// Event unique ID
    pub event_id: String,
    /// Global sequence number (for ordering and replay)
    /// This is the AUTHORITATIVE ordering mechanism for state evolution
    pub sequence: u64,
    /// Order this event belongs to
    pub order_id: String,
    /// Server timestamp (Unix milliseconds)
    pub timestamp: i64,
    /// Actor category
    pub actor_type: ActorType,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub actor_id: Option<String>,
    /// Actor name (snapshot for audit)
    #[serde(skip_serializing_if = "Option::is_none")]
    pub actor_name: Option<String>,
    /// Command that triggered this event (for audit tracing)
    pub command_id: String,
    /// Event type
    pub event_type: TimelineEventType,
    /// Short human-readable title
    pub title: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    /// Typed per-event-kind payload
    pub payload: TimelinePayload,
    /// Open extension field for forward compatibility
    #[serde(skip_serializing_if = "Option::is_none")]
    pub extra: Option<serde_json::Value>,
}

impl TimelineEvent {
    #[allow(clippy::too_many_arguments)]
    pub fn new(
        sequence: u64,
        order_id: String,
        actor: &Actor,
        command_id: String,
        event_type: TimelineEventType,
        title: String,
        payload: TimelinePayload,
    ) -> Self {
        Self {
            event_id: uuid::Uuid::new_v4().to_string(),
            sequence,
            order_id,
            timestamp: crate::util::now_millis(),
            actor_type: actor.actor_type,
            actor_id: actor.actor_id.clone(),
            actor_name: actor.actor_name.clone(),
            command_id,
            event_type,
            title,
            description: None,
            payload,
            extra: None,
        }
    }

    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = Some(description.into());
        self
    }
}

/// Event type enumeration
///
/// Extensible: new operations add new kinds rather than overloading these.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum TimelineEventType {
    StatusChanged,
    OrderCancelled,
    ReturnRequested,
    ReturnApproved,
    ReturnRejected,
    RefundInitiated,
}

impl std::fmt::Display for TimelineEventType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            TimelineEventType::StatusChanged => write!(f, "STATUS_CHANGED"),
            TimelineEventType::OrderCancelled => write!(f, "ORDER_CANCELLED"),
            TimelineEventType::ReturnRequested => write!(f, "RETURN_REQUESTED"),
            TimelineEventType::ReturnApproved => write!(f, "RETURN_APPROVED"),
            TimelineEventType::ReturnRejected => write!(f, "RETURN_REJECTED"),
            TimelineEventType::RefundInitiated => write!(f, "REFUND_INITIATED"),
        }
    }
}

/// Stock restored to a product during cancellation
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct RestoredStock {
    pub product_id: String,
    pub quantity: i32,
}

/// Event payload variants
///
/// Common fields are type-checked here rather than documented by convention;
/// the `extra` field on the event remains open for anything else.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(tag = "type", rename_all = "SCREAMING_SNAKE_CASE")]
pub enum TimelinePayload {
    StatusChanged {
        previous_status: OrderStatus,
        new_status: OrderStatus,
        /// Caller-supplied notes applied to the order (kept for replay)
        #[serde(skip_serializing_if = "Option::is_none")]
        notes: Option<String>,
    },

    OrderCancelled {
        reason: String,
        #[serde(skip_serializing_if = "Option::is_none")]
        notes: Option<String>,
        /// One entry per item line, full restitution
        restored_stock: Vec<RestoredStock>,
    },

    ReturnRequested {
        return_id: String,
        return_number: String,
        item_count: usize,
    },

    ReturnApproved {
        return_id: String,
        return_number: String,
        approved: bool,
    },

    ReturnRejected {
        return_id: String,
        return_number: String,
        approved: bool,
    },

    RefundInitiated {
        refund_id: String,
        refund_number: String,
        amount: f64,
        refund_type: RefundType,
    },
}
