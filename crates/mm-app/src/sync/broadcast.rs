use std::sync::Arc;

use tracing::{debug, warn};

use mm_core::ports::ConnectivityPort;

use super::orchestrator::SyncOrchestrator;

/// System-broadcast entry point.
///
/// Wired to the OS-level "connectivity changed to available" signal that can
/// arrive while the app is backgrounded. The OS already edge-triggers and
/// de-duplicates that signal, so it bypasses the orchestrator's debounce and
/// forces a pass directly, after re-checking that the report is still true.
pub struct ConnectivityBroadcast {
    orchestrator: SyncOrchestrator,
    connectivity: Arc<dyn ConnectivityPort>,
}

impl ConnectivityBroadcast {
    pub fn new(orchestrator: SyncOrchestrator, connectivity: Arc<dyn ConnectivityPort>) -> Self {
        Self {
            orchestrator,
            connectivity,
        }
    }

    pub async fn on_connectivity_available(&self) {
        match self.connectivity.is_available() {
            Ok(true) => {
                debug!("system broadcast: connectivity available, forcing sync");
                self.orchestrator.force_sync_now().await;
            }
            Ok(false) => {
                debug!("system broadcast ignored, reachability probe disagrees");
            }
            Err(err) => {
                warn!(error = %err, "system broadcast ignored, probe failed");
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::sync::pipeline::SyncPipeline;
    use crate::test_support::{
        pending_registration_record, FixedClock, InMemoryUserStore, RecordingRemote,
        StubConnectivity,
    };
    use chrono::Utc;
    use mm_core::ports::UserStorePort;
    use mm_core::sync::SyncSettings;

    async fn harness(available: bool) -> (Arc<RecordingRemote>, Arc<StubConnectivity>, ConnectivityBroadcast) {
        let store = Arc::new(InMemoryUserStore::default());
        let remote = Arc::new(RecordingRemote::default());
        let connectivity = Arc::new(StubConnectivity::new(available));
        let clock = Arc::new(FixedClock(Utc::now()));
        let record = pending_registration_record("a@x.com", "Secret1!");
        store.insert(record.clone()).await.unwrap();
        store.set_logged_in(&record.id).await.unwrap();
        let pipeline = SyncPipeline::new(
            store,
            remote.clone(),
            connectivity.clone(),
            clock,
        );
        let orchestrator =
            SyncOrchestrator::new(SyncSettings::default(), pipeline, connectivity.clone());
        let broadcast = ConnectivityBroadcast::new(orchestrator, connectivity.clone());
        (remote, connectivity, broadcast)
    }

    #[tokio::test]
    async fn broadcast_forces_an_immediate_pass() {
        let (remote, _connectivity, broadcast) = harness(true).await;

        broadcast.on_connectivity_available().await;

        assert_eq!(remote.calls().len(), 1);
    }

    #[tokio::test]
    async fn broadcast_is_ignored_when_probe_disagrees() {
        let (remote, _connectivity, broadcast) = harness(false).await;

        broadcast.on_connectivity_available().await;

        assert!(remote.calls().is_empty());
    }
}
