//! Shared types for the settlement ledger
//!
//! Common types used across the ledger core and any transport/client crates:
//! order entities, return/refund records, the timeline audit event, command
//! envelopes, and identifier utilities.

pub mod order;
pub mod util;

// Re-exports
pub use serde::{Deserialize, Serialize};
