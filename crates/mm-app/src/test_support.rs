//! Hand-rolled port fakes shared by the sync and account tests.

use std::collections::VecDeque;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Mutex;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use tokio::sync::mpsc;

use mm_core::connectivity::ConnectivityEvent;
use mm_core::ports::{
    ClockPort, ConnectivityError, ConnectivityPort, HashError, PasswordHasherPort,
    RemoteAccountError, RemoteAccountPort, UserStoreError, UserStorePort,
};
use mm_core::user::{SyncAction, UserRecord};

pub fn pending_registration_record(email: &str, plain: &str) -> UserRecord {
    let mut record = UserRecord::new(
        "Test User".to_string(),
        email.to_string(),
        format!("hashed:{plain}"),
        Utc::now(),
    );
    record.pending_registration_sync = true;
    record.pending_plain_password = Some(plain.to_string());
    record
}

pub fn pending_password_record(email: &str, old: &str, new: &str) -> UserRecord {
    let mut record = UserRecord::new(
        "Test User".to_string(),
        email.to_string(),
        format!("hashed:{new}"),
        Utc::now(),
    );
    record.remote_id = Some("R-existing".to_string());
    record.pending_password_sync = true;
    record.pending_old_password = Some(old.to_string());
    record.pending_new_password = Some(new.to_string());
    record
}

pub fn pending_profile_record(email: &str) -> UserRecord {
    let mut record = UserRecord::new(
        "Edited Name".to_string(),
        email.to_string(),
        "hashed:whatever".to_string(),
        Utc::now(),
    );
    record.remote_id = Some("R-existing".to_string());
    record.pending_sync = true;
    record.pending_sync_action = Some(SyncAction::Update);
    record
}

/// Give spawned timer tasks a chance to observe an advanced paused clock.
pub async fn settle() {
    for _ in 0..25 {
        tokio::task::yield_now().await;
    }
}

// ---------------------------------------------------------------------------
// Local store

#[derive(Default)]
pub struct InMemoryUserStore {
    records: Mutex<Vec<UserRecord>>,
    fail_next_clear: AtomicBool,
}

impl InMemoryUserStore {
    /// Make the next `clear_*` call fail, simulating a crash after the
    /// remote call but before the local write.
    pub fn fail_next_clear(&self) {
        self.fail_next_clear.store(true, Ordering::SeqCst);
    }

    fn clear_should_fail(&self) -> bool {
        self.fail_next_clear.swap(false, Ordering::SeqCst)
    }

    fn with<T>(&self, f: impl FnOnce(&mut Vec<UserRecord>) -> T) -> T {
        let mut records = self.records.lock().expect("store lock");
        f(&mut records)
    }

    fn update(
        &self,
        id: &str,
        f: impl FnOnce(&mut UserRecord),
    ) -> Result<(), UserStoreError> {
        self.with(|records| {
            let record = records
                .iter_mut()
                .find(|r| r.id == id)
                .ok_or(UserStoreError::NotFound)?;
            f(record);
            Ok(())
        })
    }
}

#[async_trait]
impl UserStorePort for InMemoryUserStore {
    async fn get_by_id(&self, id: &str) -> Result<Option<UserRecord>, UserStoreError> {
        Ok(self.with(|r| r.iter().find(|u| u.id == id).cloned()))
    }

    async fn get_logged_in(&self) -> Result<Option<UserRecord>, UserStoreError> {
        Ok(self.with(|r| r.iter().find(|u| u.is_logged_in).cloned()))
    }

    async fn email_exists(&self, email: &str) -> Result<bool, UserStoreError> {
        Ok(self.with(|r| r.iter().any(|u| u.email == email)))
    }

    async fn get_all_with_pending_registration(&self) -> Result<Vec<UserRecord>, UserStoreError> {
        Ok(self.with(|r| {
            r.iter()
                .filter(|u| u.pending_registration_sync)
                .cloned()
                .collect()
        }))
    }

    async fn get_with_pending_password(&self) -> Result<Option<UserRecord>, UserStoreError> {
        Ok(self.with(|r| r.iter().find(|u| u.pending_password_sync).cloned()))
    }

    async fn get_all_with_pending_profile_sync(&self) -> Result<Vec<UserRecord>, UserStoreError> {
        Ok(self.with(|r| {
            r.iter()
                .filter(|u| u.pending_sync && u.pending_sync_action == Some(SyncAction::Update))
                .cloned()
                .collect()
        }))
    }

    async fn insert(&self, record: UserRecord) -> Result<(), UserStoreError> {
        self.with(|records| {
            if records.iter().any(|r| r.email == record.email) {
                return Err(UserStoreError::EmailExists);
            }
            records.push(record);
            Ok(())
        })
    }

    async fn set_logged_in(&self, id: &str) -> Result<(), UserStoreError> {
        self.with(|records| {
            if !records.iter().any(|r| r.id == id) {
                return Err(UserStoreError::NotFound);
            }
            for record in records.iter_mut() {
                record.is_logged_in = record.id == id;
            }
            Ok(())
        })
    }

    async fn clear_logged_in(&self) -> Result<(), UserStoreError> {
        self.with(|records| {
            for record in records.iter_mut() {
                record.is_logged_in = false;
            }
            Ok(())
        })
    }

    async fn update_profile_pending(
        &self,
        id: &str,
        full_name: &str,
        email: &str,
    ) -> Result<(), UserStoreError> {
        self.update(id, |record| {
            record.full_name = full_name.to_string();
            record.email = email.to_string();
            record.pending_sync = true;
            record.pending_sync_action = Some(SyncAction::Update);
            record.updated_at = Utc::now();
        })
    }

    async fn update_password_pending(
        &self,
        id: &str,
        digest: &str,
        old_plain: &str,
        new_plain: &str,
    ) -> Result<(), UserStoreError> {
        self.update(id, |record| {
            record.password_digest = digest.to_string();
            record.pending_password_sync = true;
            record.pending_old_password = Some(old_plain.to_string());
            record.pending_new_password = Some(new_plain.to_string());
            record.updated_at = Utc::now();
        })
    }

    async fn update_password_digest(&self, id: &str, digest: &str) -> Result<(), UserStoreError> {
        self.update(id, |record| {
            record.password_digest = digest.to_string();
            record.updated_at = Utc::now();
        })
    }

    async fn clear_registration_pending(
        &self,
        id: &str,
        remote_id: &str,
        synced_at: DateTime<Utc>,
    ) -> Result<(), UserStoreError> {
        if self.clear_should_fail() {
            return Err(UserStoreError::Storage("simulated crash".to_string()));
        }
        self.update(id, |record| {
            record.remote_id = Some(remote_id.to_string());
            record.pending_registration_sync = false;
            record.pending_plain_password = None;
            record.last_synced_at = Some(synced_at);
            record.updated_at = synced_at;
        })
    }

    async fn clear_password_pending(
        &self,
        id: &str,
        synced_at: DateTime<Utc>,
    ) -> Result<(), UserStoreError> {
        if self.clear_should_fail() {
            return Err(UserStoreError::Storage("simulated crash".to_string()));
        }
        self.update(id, |record| {
            record.pending_password_sync = false;
            record.pending_old_password = None;
            record.pending_new_password = None;
            record.last_synced_at = Some(synced_at);
            record.updated_at = synced_at;
        })
    }

    async fn clear_profile_pending(
        &self,
        id: &str,
        synced_at: DateTime<Utc>,
    ) -> Result<(), UserStoreError> {
        self.update(id, |record| {
            record.pending_sync = false;
            record.pending_sync_action = None;
            record.last_synced_at = Some(synced_at);
            record.updated_at = synced_at;
        })
    }
}

// ---------------------------------------------------------------------------
// Remote store

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RemoteCall {
    CreateAccount {
        email: String,
        full_name: String,
        plain: String,
    },
    UpdateCredential {
        email: String,
        old_plain: String,
        new_plain: String,
    },
    UpsertProfile {
        remote_id: String,
        full_name: String,
        email: String,
    },
}

/// Records every call and answers from configurable state.
#[derive(Default)]
pub struct RecordingRemote {
    calls: Mutex<Vec<RemoteCall>>,
    next_remote_ids: Mutex<VecDeque<String>>,
    fail_transient: AtomicBool,
    email_taken: AtomicBool,
}

impl RecordingRemote {
    pub fn calls(&self) -> Vec<RemoteCall> {
        self.calls.lock().expect("calls lock").clone()
    }

    pub fn set_next_remote_id(&self, id: &str) {
        self.next_remote_ids
            .lock()
            .expect("ids lock")
            .push_back(id.to_string());
    }

    pub fn fail_all_transient(&self, fail: bool) {
        self.fail_transient.store(fail, Ordering::SeqCst);
    }

    pub fn fail_create_with_email_taken(&self, fail: bool) {
        self.email_taken.store(fail, Ordering::SeqCst);
    }

    fn record(&self, call: RemoteCall) {
        self.calls.lock().expect("calls lock").push(call);
    }

    fn check_transient(&self) -> Result<(), RemoteAccountError> {
        if self.fail_transient.load(Ordering::SeqCst) {
            Err(RemoteAccountError::Network("simulated outage".to_string()))
        } else {
            Ok(())
        }
    }
}

#[async_trait]
impl RemoteAccountPort for RecordingRemote {
    async fn create_account(
        &self,
        email: &str,
        full_name: &str,
        plain_password: &str,
    ) -> Result<String, RemoteAccountError> {
        self.record(RemoteCall::CreateAccount {
            email: email.to_string(),
            full_name: full_name.to_string(),
            plain: plain_password.to_string(),
        });
        self.check_transient()?;
        if self.email_taken.load(Ordering::SeqCst) {
            return Err(RemoteAccountError::EmailTaken);
        }
        let next = self.next_remote_ids.lock().expect("ids lock").pop_front();
        Ok(next.unwrap_or_else(|| format!("remote-{email}")))
    }

    async fn update_credential(
        &self,
        email: &str,
        old_plain: &str,
        new_plain: &str,
    ) -> Result<(), RemoteAccountError> {
        self.record(RemoteCall::UpdateCredential {
            email: email.to_string(),
            old_plain: old_plain.to_string(),
            new_plain: new_plain.to_string(),
        });
        self.check_transient()
    }

    async fn upsert_profile(
        &self,
        remote_id: &str,
        full_name: &str,
        email: &str,
    ) -> Result<(), RemoteAccountError> {
        self.record(RemoteCall::UpsertProfile {
            remote_id: remote_id.to_string(),
            full_name: full_name.to_string(),
            email: email.to_string(),
        });
        self.check_transient()
    }
}

// ---------------------------------------------------------------------------
// Connectivity

pub struct StubConnectivity {
    available: AtomicBool,
    probe_fails: AtomicBool,
    probe_calls: Mutex<u32>,
    senders: Mutex<Vec<mpsc::Sender<ConnectivityEvent>>>,
}

impl StubConnectivity {
    pub fn new(available: bool) -> Self {
        Self {
            available: AtomicBool::new(available),
            probe_fails: AtomicBool::new(false),
            probe_calls: Mutex::new(0),
            senders: Mutex::new(Vec::new()),
        }
    }

    pub fn set_available(&self, available: bool) {
        self.available.store(available, Ordering::SeqCst);
    }

    pub fn fail_probe(&self, fail: bool) {
        self.probe_fails.store(fail, Ordering::SeqCst);
    }

    pub fn probe_calls(&self) -> u32 {
        *self.probe_calls.lock().expect("probe lock")
    }

    pub async fn emit(&self, event: ConnectivityEvent) {
        let senders = self.senders.lock().expect("senders lock").clone();
        for sender in senders {
            let _ = sender.send(event).await;
        }
    }
}

#[async_trait]
impl ConnectivityPort for StubConnectivity {
    fn is_available(&self) -> Result<bool, ConnectivityError> {
        *self.probe_calls.lock().expect("probe lock") += 1;
        if self.probe_fails.load(Ordering::SeqCst) {
            return Err(ConnectivityError::Probe("simulated probe failure".to_string()));
        }
        Ok(self.available.load(Ordering::SeqCst))
    }

    async fn subscribe(&self) -> Result<mpsc::Receiver<ConnectivityEvent>, ConnectivityError> {
        let (tx, rx) = mpsc::channel(16);
        self.senders.lock().expect("senders lock").push(tx);
        Ok(rx)
    }
}

// ---------------------------------------------------------------------------
// Clock and hasher

pub struct FixedClock(pub DateTime<Utc>);

impl ClockPort for FixedClock {
    fn now(&self) -> DateTime<Utc> {
        self.0
    }
}

/// Deterministic stand-in for the argon2 adapter.
pub struct StubHasher;

#[async_trait]
impl PasswordHasherPort for StubHasher {
    async fn hash(&self, plain: &str) -> Result<String, HashError> {
        Ok(format!("hashed:{plain}"))
    }

    async fn verify(&self, plain: &str, digest: &str) -> Result<bool, HashError> {
        Ok(digest == format!("hashed:{plain}"))
    }
}
