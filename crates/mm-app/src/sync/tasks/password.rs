use std::sync::Arc;

use tracing::{debug, info, warn};

use mm_core::ports::{ClockPort, ConnectivityPort, RemoteAccountPort, UserStorePort};
use mm_core::sync::TaskReport;

use super::TaskError;

/// Replays a locally applied password change against the remote credential
/// store, authenticating with the retained old plaintext.
pub struct PasswordSyncTask {
    store: Arc<dyn UserStorePort>,
    remote: Arc<dyn RemoteAccountPort>,
    connectivity: Arc<dyn ConnectivityPort>,
    clock: Arc<dyn ClockPort>,
}

impl PasswordSyncTask {
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
            debug!("password sync skipped, offline");
            return Ok(report);
        }
        if self.store.get_logged_in().await?.is_none() {
            debug!("password sync skipped, no logged-in session");
            return Ok(report);
        }

        let Some(record) = self.store.get_with_pending_password().await? else {
            return Ok(report);
        };

        match record.password_sync_payload() {
            None => {
                // Fail-safe discard: without the plaintext pair the remote
                // call can never succeed, so retrying would stick forever.
                warn!(user_id = %record.id, "pending password payload missing or empty, discarding");
                self.store
                    .clear_password_pending(&record.id, self.clock.now())
                    .await?;
                report.record_discarded();
            }
            Some((old_plain, new_plain)) => {
                match self
                    .remote
                    .update_credential(&record.email, old_plain, new_plain)
                    .await
                {
                    Ok(()) => {
                        self.store
                            .clear_password_pending(&record.id, self.clock.now())
                            .await?;
                        info!(user_id = %record.id, "password change mirrored to remote store");
                        report.record_synced();
                    }
                    Err(err) => {
                        warn!(user_id = %record.id, error = %err, "password sync failed, change left pending");
                        report.record_failed();
                    }
                }
            }
        }

        Ok(report)
    }
}
