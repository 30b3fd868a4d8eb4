//! Connectivity event types shared by the reachability port and the monitor.

/// Raw platform reachability callback, before debouncing.
///
/// Mirrors what OS network stacks actually deliver: link-level edges plus
/// capability reports. A link can be up without routing anywhere (captive
/// portal), so only `CapabilitiesChanged { validated: true }` or a probe
/// confirms usable internet.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RawLinkEvent {
    LinkUp,
    LinkDown,
    CapabilitiesChanged { validated: bool },
}

/// Debounced, edge-triggered connectivity state change.
///
/// Consumers see at most one event per real state edge; flaps shorter than
/// the lost-debounce window are swallowed by the monitor.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConnectivityEvent {
    Available,
    Lost,
}
