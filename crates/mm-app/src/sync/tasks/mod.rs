//! The sync task set.
//!
//! Each task shares one contract: read the ledger, call the remote store,
//! and clear the ledger flag only after a confirmed remote success. A task
//! that fails leaves the ledger untouched so the next pass retries from
//! scratch. All three no-op unless connectivity is currently validated and
//! a logged-in record exists.

mod password;
mod profile;
mod registration;

pub use password::PasswordSyncTask;
pub use profile::ProfileSyncTask;
pub use registration::RegistrationSyncTask;

use mm_core::ports::{ConnectivityError, UserStoreError};
use thiserror::Error;

/// A task-level failure (as opposed to a per-record remote failure, which
/// is tallied in the task's report). The pipeline absorbs these so one
/// broken task cannot block the others.
#[derive(Debug, Error)]
pub enum TaskError {
    #[error(transparent)]
    Store(#[from] UserStoreError),

    #[error(transparent)]
    Connectivity(#[from] ConnectivityError),
}
