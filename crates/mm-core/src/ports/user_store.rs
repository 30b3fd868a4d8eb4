use async_trait::async_trait;
use chrono::{DateTime, Utc};

use crate::ports::errors::UserStoreError;
use crate::user::UserRecord;

/// Local user store and pending-change ledger.
///
/// Every mutation that touches a pending flag and its payload must happen in
/// a single write: a crash must never leave a flag cleared while its
/// plaintext payload survives, nor the payload erased while the flag still
/// claims a sync is owed. The sync tasks always call the remote store first
/// and only then invoke a `clear_*` method.
#[async_trait]
pub trait UserStorePort: Send + Sync {
    async fn get_by_id(&self, id: &str) -> Result<Option<UserRecord>, UserStoreError>;

    /// The at-most-one record currently logged in.
    async fn get_logged_in(&self) -> Result<Option<UserRecord>, UserStoreError>;

    async fn email_exists(&self, email: &str) -> Result<bool, UserStoreError>;

    async fn get_all_with_pending_registration(&self) -> Result<Vec<UserRecord>, UserStoreError>;

    /// At most one record by design; password changes only apply to the
    /// logged-in account.
    async fn get_with_pending_password(&self) -> Result<Option<UserRecord>, UserStoreError>;

    async fn get_all_with_pending_profile_sync(&self) -> Result<Vec<UserRecord>, UserStoreError>;

    async fn insert(&self, record: UserRecord) -> Result<(), UserStoreError>;

    /// Mark `id` logged in and every other record logged out, atomically.
    async fn set_logged_in(&self, id: &str) -> Result<(), UserStoreError>;

    async fn clear_logged_in(&self) -> Result<(), UserStoreError>;

    /// Store new profile fields and arm the profile ledger flag in one write.
    async fn update_profile_pending(
        &self,
        id: &str,
        full_name: &str,
        email: &str,
    ) -> Result<(), UserStoreError>;

    /// Store the new digest and arm the password ledger flag, retaining the
    /// plaintext pair needed for remote re-authentication, in one write.
    async fn update_password_pending(
        &self,
        id: &str,
        digest: &str,
        old_plain: &str,
        new_plain: &str,
    ) -> Result<(), UserStoreError>;

    /// Store a new digest with no pending flag (online password change).
    async fn update_password_digest(&self, id: &str, digest: &str) -> Result<(), UserStoreError>;

    /// Record the remote identifier, clear the registration flag and erase
    /// the retained plaintext, all in one write.
    async fn clear_registration_pending(
        &self,
        id: &str,
        remote_id: &str,
        synced_at: DateTime<Utc>,
    ) -> Result<(), UserStoreError>;

    /// Clear the password flag and erase the plaintext pair in one write.
    async fn clear_password_pending(
        &self,
        id: &str,
        synced_at: DateTime<Utc>,
    ) -> Result<(), UserStoreError>;

    /// Clear the profile flag and action, stamping `last_synced_at`.
    async fn clear_profile_pending(
        &self,
        id: &str,
        synced_at: DateTime<Utc>,
    ) -> Result<(), UserStoreError>;
}
