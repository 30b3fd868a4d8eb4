//! # mm-app
//!
//! Application layer for MealMate account sync: the offline-first sync
//! pipeline, its orchestrator, and the account use cases that arm the
//! pending-change ledger.

pub mod account;
pub mod sync;

#[cfg(test)]
pub(crate) mod test_support;

pub use sync::{ConnectivityBroadcast, SyncOrchestrator, SyncPipeline};
