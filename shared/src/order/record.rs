//! Order record - current lifecycle state
//!
//! The record includes a `state_checksum` field for drift detection. The
//! replay verifier compares the checksum of a rebuilt record (placement
//! baseline + timeline) with the stored one to prove the timeline is a
//! faithful audit log.

use super::types::OrderItem;
use serde::{Deserialize, Serialize};
use std::hash::Hash;

/// Order status
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash, Default)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum OrderStatus {
    #[default]
    Pending,
    Confirmed,
    Processing,
    Shipped,
    Delivered,
    Cancelled,
}

impl OrderStatus {
    /// Explicit transition adjacency for `updateStatus`.
    ///
    /// CANCELLED is reachable only through the cancellation workflow, and
    /// CANCELLED/DELIVERED have no outgoing edges here. The source system
    /// allowed any-to-any; the graph below replaces that placeholder.
    pub fn can_transition_to(self, to: OrderStatus) -> bool {
        use OrderStatus::*;
        matches!(
            (self, to),
            (Pending, Confirmed)
                | (Pending, Processing)
                | (Confirmed, Processing)
                | (Confirmed, Shipped)
                | (Processing, Shipped)
                | (Shipped, Delivered)
        )
    }

    /// Statuses from which the cancellation workflow may run
    pub fn is_cancellable(self) -> bool {
        matches!(
            self,
            OrderStatus::Pending | OrderStatus::Confirmed | OrderStatus::Processing
        )
    }
}

impl std::fmt::Display for OrderStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            OrderStatus::Pending => write!(f, "PENDING"),
            OrderStatus::Confirmed => write!(f, "CONFIRMED"),
            OrderStatus::Processing => write!(f, "PROCESSING"),
            OrderStatus::Shipped => write!(f, "SHIPPED"),
            OrderStatus::Delivered => write!(f, "DELIVERED"),
            OrderStatus::Cancelled => write!(f, "CANCELLED"),
        }
    }
}

/// Order record - root entity of the settlement ledger
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Order {
    /// Order ID (assigned at placement)
    pub id: String,
    /// Human-readable order number (display label, uniqueness enforced by the store)
    pub order_number: String,
    /// Owning customer
    pub customer_id: String,
    /// Current lifecycle status
    pub status: OrderStatus,
    /// Frozen item lines
    pub items: Vec<OrderItem>,
    /// Monetary total, discounts/taxes already baked in by the pricing engine
    pub total: f64,
    /// Free-text notes, updated by status changes
    #[serde(skip_serializing_if = "Option::is_none")]
    pub notes: Option<String>,

    // === Cancellation metadata ===
    #[serde(skip_serializing_if = "Option::is_none")]
    pub cancellation_reason: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub cancellation_notes: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub cancelled_at: Option<i64>,
    /// Actor name snapshot
    #[serde(skip_serializing_if = "Option::is_none")]
    pub cancelled_by: Option<String>,

    /// Stamped when the order reaches DELIVERED
    #[serde(skip_serializing_if = "Option::is_none")]
    pub actual_delivery: Option<i64>,

    /// Created timestamp (Unix milliseconds)
    pub created_at: i64,
    /// Last modification timestamp
    pub updated_at: i64,
    /// Global sequence of the last applied timeline event (optimistic version)
    pub last_sequence: u64,
    /// State checksum for replay verification
    pub state_checksum: String,
}

impl Order {
    /// Create a new PENDING order as the placement flow would
    pub fn new(
        customer_id: impl Into<String>,
        items: Vec<OrderItem>,
        total: f64,
    ) -> Self {
        let now = crate::util::now_millis();
        let mut order = Self {
            id: uuid::Uuid::new_v4().to_string(),
            order_number: crate::util::order_number(),
            customer_id: customer_id.into(),
            status: OrderStatus::Pending,
            items,
            total,
            notes: None,
            cancellation_reason: None,
            cancellation_notes: None,
            cancelled_at: None,
            cancelled_by: None,
            actual_delivery: None,
            created_at: now,
            updated_at: now,
            last_sequence: 0,
            state_checksum: String::new(),
        };
        order.update_checksum();
        order
    }

    pub fn is_cancelled(&self) -> bool {
        self.status == OrderStatus::Cancelled
    }

    pub fn is_delivered(&self) -> bool {
        self.status == OrderStatus::Delivered
    }

    /// Find an item line by its id
    pub fn find_item(&self, order_item_id: &str) -> Option<&OrderItem> {
        self.items.iter().find(|i| i.id == order_item_id)
    }

    /// Reset lifecycle state back to the placement baseline.
    ///
    /// Keeps identity and the frozen item lines; clears every field that only
    /// timeline events may have written. Replaying the timeline onto the
    /// result must reproduce the stored record.
    pub fn placement_baseline(&self) -> Self {
        let mut base = self.clone();
        base.status = OrderStatus::Pending;
        base.notes = None;
        base.cancellation_reason = None;
        base.cancellation_notes = None;
        base.cancelled_at = None;
        base.cancelled_by = None;
        base.actual_delivery = None;
        base.updated_at = base.created_at;
        base.last_sequence = 0;
        base.update_checksum();
        base
    }

    /// Compute state checksum over the audit-relevant fields.
    ///
    /// Returns a 16-character hex string.
    pub fn compute_checksum(&self) -> String {
        use std::collections::hash_map::DefaultHasher;
        use std::hash::Hasher as _;

        let mut hasher = DefaultHasher::new();

        self.items.len().hash(&mut hasher);
        // Total in cents to avoid float precision issues
        ((self.total * 100.0).round() as i64).hash(&mut hasher);
        self.last_sequence.hash(&mut hasher);
        (self.status as u8).hash(&mut hasher);
        self.notes.hash(&mut hasher);
        self.cancellation_reason.hash(&mut hasher);
        self.cancellation_notes.hash(&mut hasher);
        self.cancelled_at.hash(&mut hasher);
        self.cancelled_by.hash(&mut hasher);
        self.actual_delivery.hash(&mut hasher);

        format!("{:016x}", hasher.finish())
    }

    /// Update the state_checksum field based on current state
    pub fn update_checksum(&mut self) {
        self.state_checksum = self.compute_checksum();
    }

    /// Verify that the state_checksum matches computed checksum
    pub fn verify_checksum(&self) -> bool {
        self.state_checksum == self.compute_checksum()
    }
}
