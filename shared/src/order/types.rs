//! Shared types for the settlement ledger

use serde::{Deserialize, Serialize};

// ============================================================================
// Actor Identity
// ============================================================================

/// Actor category for audit attribution
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Default)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ActorType {
    #[default]
    System,
    Admin,
    Customer,
}

impl std::fmt::Display for ActorType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ActorType::System => write!(f, "SYSTEM"),
            ActorType::Admin => write!(f, "ADMIN"),
            ActorType::Customer => write!(f, "CUSTOMER"),
        }
    }
}

/// Identity responsible for triggering an operation
///
/// Supplied by the external identity provider; this core never authenticates,
/// it only records the attribution on the timeline.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq, Default)]
pub struct Actor {
    pub actor_type: ActorType,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub actor_id: Option<String>,
    /// Name snapshot for audit (not re-resolved later)
    #[serde(skip_serializing_if = "Option::is_none")]
    pub actor_name: Option<String>,
}

impl Actor {
    pub fn system() -> Self {
        Self {
            actor_type: ActorType::System,
            actor_id: None,
            actor_name: None,
        }
    }

    pub fn admin(id: impl Into<String>, name: impl Into<String>) -> Self {
        Self {
            actor_type: ActorType::Admin,
            actor_id: Some(id.into()),
            actor_name: Some(name.into()),
        }
    }

    pub fn customer(id: impl Into<String>, name: impl Into<String>) -> Self {
        Self {
            actor_type: ActorType::Customer,
            actor_id: Some(id.into()),
            actor_name: Some(name.into()),
        }
    }
}

// ============================================================================
// Order Items
// ============================================================================

/// One product line within an order
///
/// Quantity and unit price are frozen at order time; they are never re-linked
/// to the live product.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct OrderItem {
    /// Item ID (unique within the store, assigned at placement)
    pub id: String,
    /// Referenced product
    pub product_id: String,
    /// Product name snapshot
    pub name: String,
    /// Ordered quantity
    pub quantity: i32,
    /// Unit price frozen at order time
    pub price: f64,
}
