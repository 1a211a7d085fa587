//! Refund ledger records
//!
//! A refund records money owed back to the customer. Gateway settlement is
//! external; this core only tracks intent and bookkeeping.

use serde::{Deserialize, Serialize};

/// Refund settlement status
///
/// Created PROCESSING; the external settlement confirmation later marks it
/// COMPLETED or FAILED. Only PROCESSING and COMPLETED refunds count against
/// the order's refundable balance.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Default)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum RefundStatus {
    #[default]
    Processing,
    Completed,
    Failed,
}

impl RefundStatus {
    /// Whether this refund counts toward the refunded total
    pub fn counts_against_total(self) -> bool {
        matches!(self, RefundStatus::Processing | RefundStatus::Completed)
    }
}

impl std::fmt::Display for RefundStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            RefundStatus::Processing => write!(f, "PROCESSING"),
            RefundStatus::Completed => write!(f, "COMPLETED"),
            RefundStatus::Failed => write!(f, "FAILED"),
        }
    }
}

/// Refund category - descriptive metadata only, never drives the arithmetic
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Default)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum RefundType {
    Full,
    #[default]
    Partial,
    ShippingOnly,
    TaxOnly,
}

impl std::fmt::Display for RefundType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            RefundType::Full => write!(f, "FULL"),
            RefundType::Partial => write!(f, "PARTIAL"),
            RefundType::ShippingOnly => write!(f, "SHIPPING_ONLY"),
            RefundType::TaxOnly => write!(f, "TAX_ONLY"),
        }
    }
}

/// Refund record - belongs to one order, optionally linked to one return
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct OrderRefund {
    pub id: String,
    /// Human-readable refund number
    pub refund_number: String,
    pub order_id: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub return_id: Option<String>,
    pub amount: f64,
    pub refund_type: RefundType,
    pub status: RefundStatus,
    pub reason: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub processed_by: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub processed_by_name: Option<String>,
    pub processed_at: i64,
}
