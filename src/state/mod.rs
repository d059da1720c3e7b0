//! State management between pipeline runs.
//!
//! This module provides the persisted state record and the content-hash
//! gate that reads it to decide whether regeneration is needed.

pub mod gate;
pub mod store;

pub use gate::{ContentHashGate, GateDecision, RegenerationReason};
pub use store::StateStore;
