use async_trait::async_trait;

use crate::ports::errors::RemoteAccountError;

/// Cloud account store, consumed as an opaque request/response API.
///
/// The sync engine owns no wire format here; it only relies on the remote
/// store confirming success before any ledger flag is cleared.
#[async_trait]
pub trait RemoteAccountPort: Send + Sync {
    /// Create the remote credential and profile for a locally registered
    /// account. Returns the account's identifier in the remote store.
    async fn create_account(
        &self,
        email: &str,
        full_name: &str,
        plain_password: &str,
    ) -> Result<String, RemoteAccountError>;

    /// Replay a password change, re-authenticating with the old plaintext.
    async fn update_credential(
        &self,
        email: &str,
        old_plain: &str,
        new_plain: &str,
    ) -> Result<(), RemoteAccountError>;

    /// Last-writer-wins profile upsert.
    async fn upsert_profile(
        &self,
        remote_id: &str,
        full_name: &str,
        email: &str,
    ) -> Result<(), RemoteAccountError>;
}
