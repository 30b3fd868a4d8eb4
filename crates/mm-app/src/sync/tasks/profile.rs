use std::sync::Arc;

use tracing::{debug, info, warn};

use mm_core::ports::{ClockPort, ConnectivityPort, RemoteAccountPort, UserStorePort};
use mm_core::sync::TaskReport;

use super::TaskError;

/// Mirrors pending profile-field edits to the remote store with
/// last-writer-wins semantics.
pub struct ProfileSyncTask {
    store: Arc<dyn UserStorePort>,
    remote: Arc<dyn RemoteAccountPort>,
    connectivity: Arc<dyn ConnectivityPort>,
    clock: Arc<dyn ClockPort>,
}

impl ProfileSyncTask {
    pub fn new(
        store: Arc<dyn UserStorePort>,
        remote: Arc<dyn RemoteAccountPort>,
        connectivity: Arc<dyn ConnectivityPort>,
        clock: Arc<dyn ClockPort>,
    ) -> Self {
        Self {
            store,
            remote,
            connectivity,
            clock,
        }
    }

    pub async fn run(&self) -> Result<TaskReport, TaskError> {
        let mut report = TaskReport::default();

        if !self.connectivity.is_available()? {
            debug!("profile sync skipped, offline");
            return Ok(report);
        }
        if self.store.get_logged_in().await?.is_none() {
            debug!("profile sync skipped, no logged-in session");
            return Ok(report);
        }

        let pending = self.store.get_all_with_pending_profile_sync().await?;
        if pending.is_empty() {
            return Ok(report);
        }
        debug!(count = pending.len(), "syncing pending profile edits");

        for record in pending {
            let Some(remote_id) = record.remote_id.as_deref() else {
                // The account itself has not been mirrored yet; registration
                // sync will assign a remote id on a later pass.
                debug!(user_id = %record.id, "profile edit awaiting registration sync");
                report.record_failed();
                continue;
            };

            match self
                .remote
                .upsert_profile(remote_id, &record.full_name, &record.email)
                .await
            {
                Ok(()) => {
                    match self
                        .store
                        .clear_profile_pending(&record.id, self.clock.now())
                        .await
                    {
                        Ok(()) => {
                            info!(user_id = %record.id, "profile edit mirrored to remote store");
                            report.record_synced();
                        }
                        Err(err) => {
                            warn!(user_id = %record.id, error = %err, "failed to clear profile flag");
                            report.record_failed();
                        }
                    }
                }
                Err(err) => {
                    warn!(user_id = %record.id, error = %err, "profile sync failed, edit left pending");
                    report.record_failed();
                }
            }
        }

        Ok(report)
    }
}
