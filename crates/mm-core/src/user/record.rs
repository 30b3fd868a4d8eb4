use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Kind of profile mutation waiting to be mirrored to the remote store.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum SyncAction {
    Update,
}

impl SyncAction {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Update => "UPDATE",
        }
    }

    pub fn parse(value: &str) -> Option<Self> {
        match value {
            "UPDATE" => Some(Self::Update),
            _ => None,
        }
    }
}

/// A locally known account.
///
/// The local store is authoritative for this record until its pending-*
/// fields have been mirrored to the remote store. The pending-* fields form
/// the pending-change ledger: each flag marks a mutation that has not yet
/// been replayed remotely, together with the payload needed to replay it.
///
/// Invariants upheld by the store and the sync tasks:
/// - at most one record has `is_logged_in` set,
/// - `pending_plain_password` is `Some` only while `pending_registration_sync`,
/// - the old/new plaintext pair is `Some` only while `pending_password_sync`,
/// - `pending_registration_sync` and `remote_id` are never both set.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UserRecord {
    pub id: String,
    /// Identifier in the remote store, assigned by registration sync.
    pub remote_id: Option<String>,
    pub email: String,
    pub full_name: String,
    /// Argon2 digest; the plaintext never lands in this field.
    pub password_digest: String,
    pub is_logged_in: bool,

    /// Created entirely offline, never mirrored to the remote store.
    pub pending_registration_sync: bool,
    /// Plaintext captured at offline registration, erased once the remote
    /// credential exists.
    pub pending_plain_password: Option<String>,

    pub pending_sync: bool,
    pub pending_sync_action: Option<SyncAction>,

    pub pending_password_sync: bool,
    pub pending_old_password: Option<String>,
    pub pending_new_password: Option<String>,

    pub last_synced_at: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl UserRecord {
    /// Create a fresh record with no pending mutations.
    pub fn new(full_name: String, email: String, password_digest: String, now: DateTime<Utc>) -> Self {
        Self {
            id: Uuid::new_v4().to_string(),
            remote_id: None,
            email,
            full_name,
            password_digest,
            is_logged_in: false,
            pending_registration_sync: false,
            pending_plain_password: None,
            pending_sync: false,
            pending_sync_action: None,
            pending_password_sync: false,
            pending_old_password: None,
            pending_new_password: None,
            last_synced_at: None,
            created_at: now,
            updated_at: now,
        }
    }

    pub fn has_pending_changes(&self) -> bool {
        self.pending_registration_sync || self.pending_sync || self.pending_password_sync
    }

    /// The stored plaintext pair behind `pending_password_sync`, or `None`
    /// when either half is missing or empty (a data-integrity anomaly).
    pub fn password_sync_payload(&self) -> Option<(&str, &str)> {
        let old = self.pending_old_password.as_deref().filter(|p| !p.is_empty())?;
        let new = self.pending_new_password.as_deref().filter(|p| !p.is_empty())?;
        Some((old, new))
    }

    pub fn is_valid_full_name(&self) -> bool {
        self.full_name.trim().len() >= 2
    }

    pub fn is_valid_email(&self) -> bool {
        is_valid_email(&self.email)
    }
}

/// Minimal shape check, matching what the registration form enforces.
pub fn is_valid_email(email: &str) -> bool {
    let Some((local, domain)) = email.split_once('@') else {
        return false;
    };
    !local.is_empty() && domain.contains('.') && !domain.starts_with('.') && !domain.ends_with('.')
}

/// Passwords shorter than this are rejected at registration time.
pub const MIN_PASSWORD_LEN: usize = 6;

pub fn is_valid_password(plain: &str) -> bool {
    plain.len() >= MIN_PASSWORD_LEN
}
