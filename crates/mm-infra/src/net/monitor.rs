//! Debounced connectivity monitor.
//!
//! Raw OS reachability callbacks flap during Wi-Fi↔cellular handover; naive
//! forwarding would trigger redundant sync passes. A raw loss report only
//! becomes a `Lost` event if connectivity is still absent after a short
//! delay, and a single `last_known_available` flag suppresses duplicate
//! edges in both directions.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use tokio::sync::{mpsc, Mutex};
use tokio::task::AbortHandle;
use tracing::debug;

use mm_core::connectivity::{ConnectivityEvent, RawLinkEvent};
use mm_core::ports::{ConnectivityError, ConnectivityPort, ReachabilityPort};

#[derive(Clone)]
pub struct ConnectivityMonitor {
    reachability: Arc<dyn ReachabilityPort>,
    lost_debounce: Duration,
    inner: Arc<MonitorInner>,
}

struct MonitorInner {
    /// Last published state; gates callback delivery to real edges.
    last_known_available: AtomicBool,
    pending_lost: Mutex<Option<AbortHandle>>,
    senders: Mutex<Vec<mpsc::Sender<ConnectivityEvent>>>,
    consume_loop: Mutex<Option<AbortHandle>>,
}

impl ConnectivityMonitor {
    pub fn new(reachability: Arc<dyn ReachabilityPort>, lost_debounce: Duration) -> Self {
        Self {
            reachability,
            lost_debounce,
            inner: Arc::new(MonitorInner {
                last_known_available: AtomicBool::new(false),
                pending_lost: Mutex::new(None),
                senders: Mutex::new(Vec::new()),
                consume_loop: Mutex::new(None),
            }),
        }
    }

    /// Seed the published state from a probe and start consuming raw events.
    pub async fn start(&self) -> Result<(), ConnectivityError> {
        let initial = self.reachability.current_reachability().unwrap_or(false);
        self.inner
            .last_known_available
            .store(initial, Ordering::SeqCst);

        let mut raw = self.reachability.subscribe_raw().await?;
        let monitor = self.clone();
        let handle = tokio::spawn(async move {
            while let Some(event) = raw.recv().await {
                match event {
                    RawLinkEvent::LinkUp
                    | RawLinkEvent::CapabilitiesChanged { validated: true } => {
                        monitor.handle_up().await;
                    }
                    RawLinkEvent::LinkDown
                    | RawLinkEvent::CapabilitiesChanged { validated: false } => {
                        monitor.schedule_lost_check().await;
                    }
                }
            }
        });

        let mut guard = self.inner.consume_loop.lock().await;
        if let Some(old) = guard.replace(handle.abort_handle()) {
            old.abort();
        }
        Ok(())
    }

    pub async fn shutdown(&self) {
        if let Some(handle) = self.inner.consume_loop.lock().await.take() {
            handle.abort();
        }
        if let Some(handle) = self.inner.pending_lost.lock().await.take() {
            handle.abort();
        }
    }

    async fn handle_up(&self) {
        if let Some(handle) = self.inner.pending_lost.lock().await.take() {
            handle.abort();
            debug!("pending lost check cancelled");
        }
        if !self
            .inner
            .last_known_available
            .swap(true, Ordering::SeqCst)
        {
            debug!("connectivity available");
            self.publish(ConnectivityEvent::Available).await;
        }
    }

    /// A raw loss report is not believed until it survives the debounce
    /// window; handovers routinely report loss for a few hundred ms.
    async fn schedule_lost_check(&self) {
        let monitor = self.clone();
        let delay = self.lost_debounce;
        let handle = tokio::spawn(async move {
            tokio::time::sleep(delay).await;
            monitor.inner.pending_lost.lock().await.take();

            let still_reachable = monitor
                .reachability
                .current_reachability()
                .unwrap_or(false);
            if !still_reachable
                && monitor
                    .inner
                    .last_known_available
                    .swap(false, Ordering::SeqCst)
            {
                debug!("connectivity lost");
                monitor.publish(ConnectivityEvent::Lost).await;
            }
        });

        let mut guard = self.inner.pending_lost.lock().await;
        if let Some(old) = guard.replace(handle.abort_handle()) {
            old.abort();
        }
    }

    async fn publish(&self, event: ConnectivityEvent) {
        let senders = { self.inner.senders.lock().await.clone() };
        for sender in senders {
            if sender.send(event).await.is_err() {
                debug!("connectivity event receiver dropped");
            }
        }
    }
}

#[async_trait]
impl ConnectivityPort for ConnectivityMonitor {
    fn is_available(&self) -> Result<bool, ConnectivityError> {
        self.reachability.current_reachability()
    }

    async fn subscribe(&self) -> Result<mpsc::Receiver<ConnectivityEvent>, ConnectivityError> {
        let (tx, rx) = mpsc::channel(16);
        self.inner.senders.lock().await.push(tx);
        Ok(rx)
    }
}
