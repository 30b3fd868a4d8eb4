use std::sync::Arc;

use thiserror::Error;
use tracing::{info, warn};

use mm_core::ports::{ClockPort, ConnectivityPort, RemoteAccountPort, UserStoreError, UserStorePort};
use mm_core::user::is_valid_email;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ProfileUpdateOutcome {
    /// Written locally and mirrored remotely in the same call.
    Synced,
    /// Written locally; the remote upsert waits for the sync engine.
    PendingSync,
}

#[derive(Debug, Error)]
pub enum ProfileUpdateError {
    #[error("user not found")]
    UserNotFound,

    #[error("full name must be at least 2 characters")]
    InvalidFullName,

    #[error("email address is not valid")]
    InvalidEmail,

    #[error("email already used by another account")]
    EmailInUse,

    #[error(transparent)]
    Store(#[from] UserStoreError),
}

/// Edit the profile fields, locally first.
///
/// The local write always arms the profile ledger flag; an immediate remote
/// upsert clears it again when it succeeds, which keeps the flag-and-payload
/// invariant trivially true even if this process dies between the two steps.
pub struct UpdateProfile {
    store: Arc<dyn UserStorePort>,
    remote: Arc<dyn RemoteAccountPort>,
    connectivity: Arc<dyn ConnectivityPort>,
    clock: Arc<dyn ClockPort>,
}

impl UpdateProfile {
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

    pub async fn run(
        &self,
        user_id: &str,
        full_name: &str,
        email: &str,
    ) -> Result<ProfileUpdateOutcome, ProfileUpdateError> {
        if full_name.trim().len() < 2 {
            return Err(ProfileUpdateError::InvalidFullName);
        }
        if !is_valid_email(email) {
            return Err(ProfileUpdateError::InvalidEmail);
        }

        let record = self
            .store
            .get_by_id(user_id)
            .await?
            .ok_or(ProfileUpdateError::UserNotFound)?;
        if record.email != email && self.store.email_exists(email).await? {
            return Err(ProfileUpdateError::EmailInUse);
        }

        self.store
            .update_profile_pending(user_id, full_name, email)
            .await?;

        let online = self.connectivity.is_available().unwrap_or(false);
        if online {
            if let Some(remote_id) = record.remote_id.as_deref() {
                match self.remote.upsert_profile(remote_id, full_name, email).await {
                    Ok(()) => {
                        self.store
                            .clear_profile_pending(user_id, self.clock.now())
                            .await?;
                        info!(user_id, "profile updated and mirrored");
                        return Ok(ProfileUpdateOutcome::Synced);
                    }
                    Err(err) => {
                        warn!(user_id, error = %err, "remote profile upsert deferred to sync");
                    }
                }
            }
        }

        info!(user_id, "profile updated locally, mirror pending");
        Ok(ProfileUpdateOutcome::PendingSync)
    }
}
