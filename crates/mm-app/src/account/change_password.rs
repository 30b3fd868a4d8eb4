use std::sync::Arc;

use thiserror::Error;
use tracing::{info, warn};

use mm_core::ports::{
    ConnectivityPort, HashError, PasswordHasherPort, RemoteAccountError, RemoteAccountPort,
    UserStoreError, UserStorePort,
};
use mm_core::user::is_valid_password;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PasswordChangeOutcome {
    /// Local digest and remote credential both updated.
    Completed,
    /// Local digest updated; the remote replay waits for the sync engine.
    PendingSync,
}

#[derive(Debug, Error)]
pub enum PasswordChangeError {
    #[error("user not found")]
    UserNotFound,

    #[error("current password is incorrect")]
    IncorrectPassword,

    #[error("new password is too short")]
    InvalidNewPassword,

    #[error(transparent)]
    Store(#[from] UserStoreError),

    #[error(transparent)]
    Hash(#[from] HashError),

    #[error("remote credential update failed: {0}")]
    Remote(RemoteAccountError),
}

/// Change the account password, locally first.
///
/// When the remote replay cannot happen now (offline, unreachable, or the
/// remote store refusing the re-authentication) the new digest is stored
/// together with the plaintext pair needed to replay the change later.
pub struct ChangePassword {
    store: Arc<dyn UserStorePort>,
    remote: Arc<dyn RemoteAccountPort>,
    connectivity: Arc<dyn ConnectivityPort>,
    hasher: Arc<dyn PasswordHasherPort>,
}

impl ChangePassword {
    pub fn new(
        store: Arc<dyn UserStorePort>,
        remote: Arc<dyn RemoteAccountPort>,
        connectivity: Arc<dyn ConnectivityPort>,
        hasher: Arc<dyn PasswordHasherPort>,
    ) -> Self {
        Self {
            store,
            remote,
            connectivity,
            hasher,
        }
    }

    pub async fn run(
        &self,
        user_id: &str,
        old_plain: &str,
        new_plain: &str,
    ) -> Result<PasswordChangeOutcome, PasswordChangeError> {
        let record = self
            .store
            .get_by_id(user_id)
            .await?
            .ok_or(PasswordChangeError::UserNotFound)?;

        if !self.hasher.verify(old_plain, &record.password_digest).await? {
            return Err(PasswordChangeError::IncorrectPassword);
        }
        if !is_valid_password(new_plain) {
            return Err(PasswordChangeError::InvalidNewPassword);
        }

        let digest = self.hasher.hash(new_plain).await?;

        let online = self.connectivity.is_available().unwrap_or(false);
        if online {
            match self
                .remote
                .update_credential(&record.email, old_plain, new_plain)
                .await
            {
                Ok(()) => {
                    self.store.update_password_digest(user_id, &digest).await?;
                    info!(user_id, "password changed online");
                    return Ok(PasswordChangeOutcome::Completed);
                }
                Err(err)
                    if err.is_transient() || matches!(err, RemoteAccountError::AuthRejected) =>
                {
                    warn!(user_id, error = %err, "remote credential update deferred to sync");
                }
                Err(err) => return Err(PasswordChangeError::Remote(err)),
            }
        }

        self.store
            .update_password_pending(user_id, &digest, old_plain, new_plain)
            .await?;
        info!(user_id, "password changed offline, replay pending");
        Ok(PasswordChangeOutcome::PendingSync)
    }
}
