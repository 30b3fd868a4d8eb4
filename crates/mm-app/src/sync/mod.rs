//! The sync engine: three reconciliation tasks, the sequential pipeline
//! that drives them, and the orchestrator that decides when a pass runs.

pub mod broadcast;
pub mod orchestrator;
pub mod pipeline;
pub mod tasks;

pub use broadcast::ConnectivityBroadcast;
pub use orchestrator::SyncOrchestrator;
pub use pipeline::{PipelineError, PipelineOutcome, SkipReason, SyncPipeline};
pub use tasks::{PasswordSyncTask, ProfileSyncTask, RegistrationSyncTask, TaskError};
