//! Sync orchestrator
//!
//! Decides *when* a pipeline pass runs: debounces trigger bursts, enforces
//! the single-flight guarantee, and retries failed passes a bounded number
//! of times. The pipeline decides *what* a pass does.
//!
//! ```text
//! Connectivity events / OS broadcast
//!   ↓
//! SyncOrchestrator (debounce, single-flight, bounded retry)
//!   ↓
//! SyncPipeline (registration → password → profile)
//! ```
//!
//! A long-lived service object constructed once at startup and cloned into
//! whichever trigger sources need it; all clones share state.

use std::future::Future;
use std::pin::Pin;
use std::sync::atomic::{AtomicBool, AtomicU32, Ordering};
use std::sync::Arc;

use tokio::sync::Mutex;
use tokio::task::AbortHandle;
use tracing::{debug, info, info_span, warn, Instrument};

use mm_core::connectivity::ConnectivityEvent;
use mm_core::ports::ConnectivityPort;
use mm_core::sync::{SyncPhase, SyncSettings};

use super::pipeline::{PipelineOutcome, SyncPipeline};

#[derive(Clone)]
pub struct SyncOrchestrator {
    settings: SyncSettings,
    pipeline: Arc<SyncPipeline>,
    connectivity: Arc<dyn ConnectivityPort>,
    state: Arc<OrchestratorState>,
}

struct OrchestratorState {
    phase: Mutex<SyncPhase>,
    /// Single-flight guard: set at pipeline entry, cleared at exit.
    is_syncing: AtomicBool,
    consecutive_failures: AtomicU32,
    disposed: AtomicBool,
    debounce_timer: Mutex<Option<AbortHandle>>,
    retry_timer: Mutex<Option<AbortHandle>>,
    listener: Mutex<Option<AbortHandle>>,
}

impl SyncOrchestrator {
    pub fn new(
        settings: SyncSettings,
        pipeline: SyncPipeline,
        connectivity: Arc<dyn ConnectivityPort>,
    ) -> Self {
        Self {
            settings,
            pipeline: Arc::new(pipeline),
            connectivity,
            state: Arc::new(OrchestratorState {
                phase: Mutex::new(SyncPhase::Idle),
                is_syncing: AtomicBool::new(false),
                consecutive_failures: AtomicU32::new(0),
                disposed: AtomicBool::new(false),
                debounce_timer: Mutex::new(None),
                retry_timer: Mutex::new(None),
                listener: Mutex::new(None),
            }),
        }
    }

    /// Subscribe to connectivity edges and, if the host is already online,
    /// schedule an initial pass.
    pub async fn start_listening(&self) -> anyhow::Result<()> {
        let mut events = self.connectivity.subscribe().await?;

        let orchestrator = self.clone();
        let handle = tokio::spawn(async move {
            while let Some(event) = events.recv().await {
                match event {
                    ConnectivityEvent::Available => orchestrator.request_sync().await,
                    ConnectivityEvent::Lost => orchestrator.cancel_scheduled().await,
                }
            }
        });
        arm(&self.state.listener, handle.abort_handle()).await;

        if self.connectivity.is_available().unwrap_or(false) {
            debug!("already online at startup, scheduling initial sync");
            self.request_sync().await;
        }
        Ok(())
    }

    /// Debounced trigger: cancels any scheduled-but-not-run pass and
    /// reschedules it, coalescing bursts of connectivity callbacks into a
    /// single pipeline run.
    pub async fn request_sync(&self) {
        if self.state.disposed.load(Ordering::SeqCst) {
            return;
        }
        if self.state.is_syncing.load(Ordering::SeqCst) {
            debug!("pass already in flight, trigger coalesced");
            return;
        }

        cancel(&self.state.debounce_timer).await;
        cancel(&self.state.retry_timer).await;
        {
            let mut phase = self.state.phase.lock().await;
            if let Some(next) = phase.schedule() {
                *phase = next;
            }
        }

        let orchestrator = self.clone();
        let delay = self.settings.debounce_delay;
        let handle = tokio::spawn(async move {
            tokio::time::sleep(delay).await;
            orchestrator.run_pipeline().await;
        });
        arm(&self.state.debounce_timer, handle.abort_handle()).await;
        debug!(delay_ms = delay.as_millis() as u64, "sync scheduled");
    }

    /// Immediate trigger for edge-triggered sources (user action, OS
    /// broadcast): clears all scheduling state, then re-enters the single
    /// pipeline entry point, which still no-ops if a pass is underway.
    pub async fn force_sync_now(&self) {
        let span = info_span!("sync.force");
        async {
            if self.state.disposed.load(Ordering::SeqCst) {
                return;
            }
            cancel(&self.state.debounce_timer).await;
            cancel(&self.state.retry_timer).await;
            {
                let mut phase = self.state.phase.lock().await;
                *phase = phase.cancel();
            }
            self.run_pipeline().await;
        }
        .instrument(span)
        .await
    }

    /// Detach from the connectivity observer and cancel all timers. An
    /// in-flight remote call is left to finish naturally; its result is
    /// discarded.
    pub async fn dispose(&self) {
        self.state.disposed.store(true, Ordering::SeqCst);
        cancel(&self.state.debounce_timer).await;
        cancel(&self.state.retry_timer).await;
        cancel(&self.state.listener).await;
        let mut phase = self.state.phase.lock().await;
        *phase = SyncPhase::Idle;
        debug!("sync orchestrator disposed");
    }

    pub fn is_syncing(&self) -> bool {
        self.state.is_syncing.load(Ordering::SeqCst)
    }

    pub async fn phase(&self) -> SyncPhase {
        *self.state.phase.lock().await
    }

    async fn cancel_scheduled(&self) {
        cancel(&self.state.debounce_timer).await;
        let mut phase = self.state.phase.lock().await;
        if *phase == SyncPhase::Scheduled {
            *phase = phase.cancel();
            debug!("connectivity lost, scheduled sync cancelled");
        }
    }

    /// The single pipeline entry point.
    ///
    /// Returns a concrete boxed `Send` future rather than an `async fn`'s
    /// opaque one: the retry path below re-enters `run_pipeline`, and the
    /// compiler cannot prove an opaque future `Send` when that proof depends
    /// on itself. A named `Send` return type breaks the cycle.
    fn run_pipeline(&self) -> Pin<Box<dyn Future<Output = ()> + Send + '_>> {
        Box::pin(async move {
        let span = info_span!("sync.pass");
        async {
            if self.state.disposed.load(Ordering::SeqCst) {
                return;
            }
            if self
                .state
                .is_syncing
                .compare_exchange(false, true, Ordering::SeqCst, Ordering::SeqCst)
                .is_err()
            {
                debug!("pass already running, exit");
                return;
            }
            {
                let mut phase = self.state.phase.lock().await;
                if let Some(next) = phase.begin() {
                    *phase = next;
                }
            }

            let result = self.pipeline.run().await;

            if self.state.disposed.load(Ordering::SeqCst) {
                self.state.is_syncing.store(false, Ordering::SeqCst);
                debug!("disposed during pass, result discarded");
                return;
            }

            let retry_scheduled = match result {
                Ok(outcome) => {
                    self.state.consecutive_failures.store(0, Ordering::SeqCst);
                    if let PipelineOutcome::Ran(report) = outcome {
                        if !report.is_empty() {
                            info!(synced = report.total_synced(), "sync pass complete");
                        }
                    }
                    false
                }
                Err(err) => {
                    let failures =
                        self.state.consecutive_failures.fetch_add(1, Ordering::SeqCst) + 1;
                    if failures < self.settings.max_retry_attempts {
                        warn!(error = %err, failures, "sync pass failed, retry scheduled");
                        true
                    } else {
                        warn!(
                            error = %err,
                            failures,
                            "sync pass failed, retry attempts exhausted, waiting for next trigger"
                        );
                        self.state.consecutive_failures.store(0, Ordering::SeqCst);
                        false
                    }
                }
            };

            {
                let mut phase = self.state.phase.lock().await;
                *phase = phase.complete(retry_scheduled);
            }
            self.state.is_syncing.store(false, Ordering::SeqCst);

            if retry_scheduled {
                let orchestrator = self.clone();
                let delay = self.settings.retry_delay;
                let future: Pin<Box<dyn Future<Output = ()> + Send>> = Box::pin(async move {
                    tokio::time::sleep(delay).await;
                    orchestrator.run_pipeline().await;
                });
                let handle = tokio::spawn(future);
                // Any unfired retry timer was cancelled by whichever trigger
                // started this pass; a plain replace cannot abort this task
                // when the pass itself runs inside the fired retry timer.
                *self.state.retry_timer.lock().await = Some(handle.abort_handle());
            }
        }
        .instrument(span)
        .await
        })
    }
}

async fn arm(slot: &Mutex<Option<AbortHandle>>, handle: AbortHandle) {
    let mut guard = slot.lock().await;
    if let Some(old) = guard.replace(handle) {
        old.abort();
    }
}

async fn cancel(slot: &Mutex<Option<AbortHandle>>) {
    if let Some(handle) = slot.lock().await.take() {
        handle.abort();
    }
}
