use std::sync::Arc;

use tracing::{debug, info, warn};

use mm_core::ports::{ClockPort, ConnectivityPort, RemoteAccountPort, UserStorePort};
use mm_core::sync::TaskReport;

use super::TaskError;

/// Mirrors accounts that were registered entirely offline to the remote
/// store, assigning each its remote identifier.
pub struct RegistrationSyncTask {
    store: Arc<dyn UserStorePort>,
    remote: Arc<dyn RemoteAccountPort>,
    connectivity: Arc<dyn ConnectivityPort>,
    clock: Arc<dyn ClockPort>,
}

impl RegistrationSyncTask {
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
            debug!("registration sync skipped, offline");
            return Ok(report);
        }
        if self.store.get_logged_in().await?.is_none() {
            debug!("registration sync skipped, no logged-in session");
            return Ok(report);
        }

        let pending = self.store.get_all_with_pending_registration().await?;
        if pending.is_empty() {
            return Ok(report);
        }
        debug!(count = pending.len(), "syncing offline registrations");

        for record in pending {
            let Some(plain) = record
                .pending_plain_password
                .as_deref()
                .filter(|p| !p.is_empty())
            else {
                // Cannot create the remote credential without the captured
                // password; leave the record pending rather than invent one.
                warn!(user_id = %record.id, "pending registration without stored password");
                report.record_failed();
                continue;
            };

            match self
                .remote
                .create_account(&record.email, &record.full_name, plain)
                .await
            {
                Ok(remote_id) => {
                    match self
                        .store
                        .clear_registration_pending(&record.id, &remote_id, self.clock.now())
                        .await
                    {
                        Ok(()) => {
                            info!(user_id = %record.id, "offline registration mirrored to remote store");
                            report.record_synced();
                        }
                        Err(err) => {
                            warn!(user_id = %record.id, error = %err, "failed to clear registration flag");
                            report.record_failed();
                        }
                    }
                }
                Err(err) => {
                    // Includes the email being taken by another device; a
                    // legitimate external conflict, never grounds to delete
                    // or dedup the local record.
                    warn!(user_id = %record.id, error = %err, "registration sync failed, record left pending");
                    report.record_failed();
                }
            }
        }

        Ok(report)
    }
}
