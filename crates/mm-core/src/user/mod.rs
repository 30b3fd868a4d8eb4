//! User account domain model and pending-change ledger fields.

mod record;

pub use record::{is_valid_email, is_valid_password, SyncAction, UserRecord, MIN_PASSWORD_LEN};
