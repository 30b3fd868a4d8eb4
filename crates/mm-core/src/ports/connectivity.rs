use async_trait::async_trait;
use tokio::sync::mpsc;

use crate::connectivity::{ConnectivityEvent, RawLinkEvent};
use crate::ports::errors::ConnectivityError;

/// Debounced connectivity, as seen by the sync engine.
#[async_trait]
pub trait ConnectivityPort: Send + Sync {
    /// Whether the host currently has validated internet reachability.
    /// Link presence alone is not enough (captive portals, routeless links).
    fn is_available(&self) -> Result<bool, ConnectivityError>;

    /// Subscribe to edge-triggered, debounced connectivity changes.
    async fn subscribe(&self) -> Result<mpsc::Receiver<ConnectivityEvent>, ConnectivityError>;
}

/// Raw platform network-reachability API, consumed by the monitor.
///
/// Implementations forward OS callbacks verbatim; all debouncing and
/// edge deduplication happens above this port.
#[async_trait]
pub trait ReachabilityPort: Send + Sync {
    fn current_reachability(&self) -> Result<bool, ConnectivityError>;

    async fn subscribe_raw(&self) -> Result<mpsc::Receiver<RawLinkEvent>, ConnectivityError>;
}
