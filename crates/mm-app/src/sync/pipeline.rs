use std::sync::Arc;

use thiserror::Error;
use tracing::{debug, info, warn};

use mm_core::ports::{
    ClockPort, ConnectivityError, ConnectivityPort, RemoteAccountPort, UserStorePort,
};
use mm_core::sync::{SyncReport, TaskReport};

use super::tasks::{PasswordSyncTask, ProfileSyncTask, RegistrationSyncTask};

/// The ordered registration → password → profile pass.
///
/// The three tasks run sequentially and unconditionally: each subsequent
/// task runs whether or not the prior one found work, and a task's own
/// failure is absorbed so it cannot block the others. Ordering matters:
/// password and profile sync assume the account already exists remotely.
///
/// Only a failure of the connectivity check itself, at pipeline start,
/// escalates to the orchestrator's bounded retry.
pub struct SyncPipeline {
    connectivity: Arc<dyn ConnectivityPort>,
    store: Arc<dyn UserStorePort>,
    registration: RegistrationSyncTask,
    password: PasswordSyncTask,
    profile: ProfileSyncTask,
}

/// Why a pass ended without running the task set.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SkipReason {
    Offline,
    NotLoggedIn,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PipelineOutcome {
    Skipped(SkipReason),
    Ran(SyncReport),
}

#[derive(Debug, Error)]
pub enum PipelineError {
    #[error(transparent)]
    Connectivity(#[from] ConnectivityError),
}

impl SyncPipeline {
    pub fn new(
        store: Arc<dyn UserStorePort>,
        remote: Arc<dyn RemoteAccountPort>,
        connectivity: Arc<dyn ConnectivityPort>,
        clock: Arc<dyn ClockPort>,
    ) -> Self {
        Self {
            registration: RegistrationSyncTask::new(
                store.clone(),
                remote.clone(),
                connectivity.clone(),
                clock.clone(),
            ),
            password: PasswordSyncTask::new(
                store.clone(),
                remote.clone(),
                connectivity.clone(),
                clock.clone(),
            ),
            profile: ProfileSyncTask::new(store.clone(), remote, connectivity.clone(), clock),
            connectivity,
            store,
        }
    }

    pub async fn run(&self) -> Result<PipelineOutcome, PipelineError> {
        if !self.connectivity.is_available()? {
            debug!("sync pass skipped, offline");
            return Ok(PipelineOutcome::Skipped(SkipReason::Offline));
        }

        match self.store.get_logged_in().await {
            Ok(Some(_)) => {}
            Ok(None) => {
                debug!("sync pass skipped, no logged-in session");
                return Ok(PipelineOutcome::Skipped(SkipReason::NotLoggedIn));
            }
            Err(err) => {
                // Store trouble is not a connectivity problem; treat it like
                // a missing session and let the next trigger try again.
                warn!(error = %err, "could not read session state, sync pass skipped");
                return Ok(PipelineOutcome::Skipped(SkipReason::NotLoggedIn));
            }
        }

        let mut report = SyncReport::default();
        report.registration = absorb("registration", self.registration.run().await);
        report.password = absorb("password", self.password.run().await);
        report.profile = absorb("profile", self.profile.run().await);

        if report.is_empty() {
            debug!("sync pass found nothing to do");
        } else {
            info!(
                synced = report.total_synced(),
                failed = report.total_failed(),
                "sync pass finished"
            );
        }
        Ok(PipelineOutcome::Ran(report))
    }
}

fn absorb(task: &str, result: Result<TaskReport, super::tasks::TaskError>) -> TaskReport {
    match result {
        Ok(report) => report,
        Err(err) => {
            warn!(task, error = %err, "sync task failed, continuing with remaining tasks");
            TaskReport::default()
        }
    }
}
