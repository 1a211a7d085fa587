//! Post-delivery return request records

use serde::{Deserialize, Serialize};

/// Return request status
///
/// A return is created REQUESTED, transitions exactly once to APPROVED or
/// REJECTED, and is immutable afterwards.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Default)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ReturnStatus {
    #[default]
    Requested,
    Approved,
    Rejected,
}

impl std::fmt::Display for ReturnStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ReturnStatus::Requested => write!(f, "REQUESTED"),
            ReturnStatus::Approved => write!(f, "APPROVED"),
            ReturnStatus::Rejected => write!(f, "REJECTED"),
        }
    }
}

/// One requested item line within a return
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct OrderReturnItem {
    /// Referenced line of the original order
    pub order_item_id: String,
    /// Requested return quantity
    pub quantity: i32,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub reason: Option<String>,
    /// Declared item condition, e.g. "unopened"
    #[serde(skip_serializing_if = "Option::is_none")]
    pub condition: Option<String>,
}

/// Return request - belongs to one order
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct OrderReturn {
    pub id: String,
    /// Human-readable return number
    pub return_number: String,
    pub order_id: String,
    pub status: ReturnStatus,
    pub reason: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub images: Option<Vec<String>>,
    /// Requested item lines
    pub items: Vec<OrderReturnItem>,

    /// Requesting actor
    #[serde(skip_serializing_if = "Option::is_none")]
    pub requested_by: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub requested_by_name: Option<String>,
    pub requested_at: i64,

    // === Review metadata ===
    #[serde(skip_serializing_if = "Option::is_none")]
    pub reviewed_by: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub reviewed_by_name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub reviewed_at: Option<i64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub review_notes: Option<String>,
}

impl OrderReturn {
    /// Total quantity claimed by this return for a given order item.
    ///
    /// Counts only non-rejected returns' lines; callers filter by status.
    pub fn quantity_for_item(&self, order_item_id: &str) -> i32 {
        self.items
            .iter()
            .filter(|i| i.order_item_id == order_item_id)
            .map(|i| i.quantity)
            .sum()
    }
}
