use thiserror::Error;

#[derive(Debug, Error)]
pub enum UserStoreError {
    #[error("user not found")]
    NotFound,

    #[error("email already registered locally")]
    EmailExists,

    #[error("storage error: {0}")]
    Storage(String),
}

/// Failures reported by the cloud account store.
///
/// Transient variants leave ledger flags untouched and are retried on the
/// next pipeline pass; permanent variants signal an external conflict the
/// user has to resolve (the ledger is still left untouched, the engine
/// never drops a mutation over a remote refusal).
#[derive(Debug, Error)]
pub enum RemoteAccountError {
    #[error("network error: {0}")]
    Network(String),

    #[error("remote store unavailable: {0}")]
    RemoteUnavailable(String),

    #[error("email already registered remotely")]
    EmailTaken,

    #[error("re-authentication rejected by remote store")]
    AuthRejected,

    #[error("remote store error: {0}")]
    Remote(String),
}

impl RemoteAccountError {
    /// Worth retrying without user intervention.
    pub fn is_transient(&self) -> bool {
        matches!(self, Self::Network(_) | Self::RemoteUnavailable(_))
    }
}

#[derive(Debug, Error)]
pub enum ConnectivityError {
    #[error("reachability probe failed: {0}")]
    Probe(String),

    #[error("connectivity monitor not started")]
    NotStarted,
}
