use std::sync::Arc;

use thiserror::Error;
use tracing::{info, warn};

use mm_core::ports::{
    ClockPort, ConnectivityPort, HashError, PasswordHasherPort, RemoteAccountError,
    RemoteAccountPort, UserStoreError, UserStorePort,
};
use mm_core::user::{is_valid_email, is_valid_password, UserRecord};

#[derive(Debug, Error)]
pub enum RegisterError {
    #[error("full name must be at least 2 characters")]
    InvalidFullName,

    #[error("email address is not valid")]
    InvalidEmail,

    #[error("password is too short")]
    InvalidPassword,

    #[error("email already registered")]
    EmailInUse,

    #[error(transparent)]
    Store(#[from] UserStoreError),

    #[error(transparent)]
    Hash(#[from] HashError),

    #[error("remote registration failed: {0}")]
    Remote(RemoteAccountError),
}

/// Create a local account, mirroring it remotely right away when online.
///
/// Offline (or when the remote store is transiently unreachable) the record
/// is created locally with `pending_registration_sync` armed and the
/// plaintext retained for the later remote credential creation.
pub struct RegisterAccount {
    store: Arc<dyn UserStorePort>,
    remote: Arc<dyn RemoteAccountPort>,
    connectivity: Arc<dyn ConnectivityPort>,
    hasher: Arc<dyn PasswordHasherPort>,
    clock: Arc<dyn ClockPort>,
}

impl RegisterAccount {
    pub fn new(
        store: Arc<dyn UserStorePort>,
        remote: Arc<dyn RemoteAccountPort>,
        connectivity: Arc<dyn ConnectivityPort>,
        hasher: Arc<dyn PasswordHasherPort>,
        clock: Arc<dyn ClockPort>,
    ) -> Self {
        Self {
            store,
            remote,
            connectivity,
            hasher,
            clock,
        }
    }

    pub async fn run(
        &self,
        full_name: &str,
        email: &str,
        plain_password: &str,
    ) -> Result<UserRecord, RegisterError> {
        if full_name.trim().len() < 2 {
            return Err(RegisterError::InvalidFullName);
        }
        if !is_valid_email(email) {
            return Err(RegisterError::InvalidEmail);
        }
        if !is_valid_password(plain_password) {
            return Err(RegisterError::InvalidPassword);
        }
        if self.store.email_exists(email).await? {
            return Err(RegisterError::EmailInUse);
        }

        let digest = self.hasher.hash(plain_password).await?;
        let mut record = UserRecord::new(
            full_name.to_string(),
            email.to_string(),
            digest,
            self.clock.now(),
        );

        let online = self.connectivity.is_available().unwrap_or(false);
        if online {
            match self
                .remote
                .create_account(email, full_name, plain_password)
                .await
            {
                Ok(remote_id) => {
                    record.remote_id = Some(remote_id);
                    info!(user_id = %record.id, "account registered online");
                }
                Err(err) if err.is_transient() => {
                    warn!(error = %err, "remote registration unreachable, deferring to sync");
                    arm_registration_sync(&mut record, plain_password);
                }
                Err(RemoteAccountError::EmailTaken) => return Err(RegisterError::EmailInUse),
                Err(err) => return Err(RegisterError::Remote(err)),
            }
        } else {
            info!(user_id = %record.id, "offline registration, deferring to sync");
            arm_registration_sync(&mut record, plain_password);
        }

        self.store.insert(record.clone()).await?;
        self.store.set_logged_in(&record.id).await?;
        record.is_logged_in = true;
        Ok(record)
    }
}

fn arm_registration_sync(record: &mut UserRecord, plain_password: &str) {
    record.pending_registration_sync = true;
    record.pending_plain_password = Some(plain_password.to_string());
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_support::{
        FixedClock, InMemoryUserStore, RecordingRemote, StubConnectivity, StubHasher,
    };
    use chrono::Utc;

    struct Harness {
        store: Arc<InMemoryUserStore>,
        remote: Arc<RecordingRemote>,
        register: RegisterAccount,
    }

    fn harness(online: bool) -> Harness {
        let store = Arc::new(InMemoryUserStore::default());
        let remote = Arc::new(RecordingRemote::default());
        let connectivity = Arc::new(StubConnectivity::new(online));
        let register = RegisterAccount::new(
            store.clone(),
            remote.clone(),
            connectivity,
            Arc::new(StubHasher),
            Arc::new(FixedClock(Utc::now())),
        );
        Harness {
            store,
            remote,
            register,
        }
    }

    #[tokio::test]
    async fn online_registration_stores_remote_id_and_no_pending_flags() {
        let h = harness(true);
        h.remote.set_next_remote_id("R1");

        let record = h
            .register
            .run("Ada Lovelace", "ada@example.com", "Secret1!")
            .await
            .unwrap();

        assert_eq!(record.remote_id.as_deref(), Some("R1"));
        assert!(!record.pending_registration_sync);
        assert!(record.pending_plain_password.is_none());
        assert!(record.is_logged_in);
        let stored = h.store.get_logged_in().await.unwrap().unwrap();
        assert_eq!(stored.id, record.id);
    }

    #[tokio::test]
    async fn offline_registration_arms_the_ledger() {
        let h = harness(false);

        let record = h
            .register
            .run("Ada Lovelace", "ada@example.com", "Secret1!")
            .await
            .unwrap();

        assert!(record.pending_registration_sync);
        assert_eq!(record.pending_plain_password.as_deref(), Some("Secret1!"));
        assert!(record.remote_id.is_none());
        assert!(h.remote.calls().is_empty());
    }

    #[tokio::test]
    async fn transient_remote_failure_falls_back_to_offline_path() {
        let h = harness(true);
        h.remote.fail_all_transient(true);

        let record = h
            .register
            .run("Ada Lovelace", "ada@example.com", "Secret1!")
            .await
            .unwrap();

        assert!(record.pending_registration_sync);
        assert_eq!(record.pending_plain_password.as_deref(), Some("Secret1!"));
    }

    #[tokio::test]
    async fn remote_email_conflict_is_surfaced() {
        let h = harness(true);
        h.remote.fail_create_with_email_taken(true);

        let result = h
            .register
            .run("Ada Lovelace", "ada@example.com", "Secret1!")
            .await;

        assert!(matches!(result, Err(RegisterError::EmailInUse)));
        assert!(h.store.get_logged_in().await.unwrap().is_none());
    }

    #[tokio::test]
    async fn local_duplicate_email_is_rejected_before_any_remote_call() {
        let h = harness(true);
        h.register
            .run("Ada Lovelace", "ada@example.com", "Secret1!")
            .await
            .unwrap();

        let calls_before = h.remote.calls().len();
        let result = h
            .register
            .run("Someone Else", "ada@example.com", "Other123")
            .await;

        assert!(matches!(result, Err(RegisterError::EmailInUse)));
        assert_eq!(h.remote.calls().len(), calls_before);
    }

    #[tokio::test]
    async fn invalid_input_is_rejected() {
        let h = harness(true);
        assert!(matches!(
            h.register.run("A", "ada@example.com", "Secret1!").await,
            Err(RegisterError::InvalidFullName)
        ));
        assert!(matches!(
            h.register.run("Ada", "not-an-email", "Secret1!").await,
            Err(RegisterError::InvalidEmail)
        ));
        assert!(matches!(
            h.register.run("Ada", "ada@example.com", "short").await,
            Err(RegisterError::InvalidPassword)
        ));
    }
}
