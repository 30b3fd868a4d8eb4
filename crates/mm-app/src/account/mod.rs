//! Account use cases.
//!
//! The foreground flows that arm the pending-change ledger: each prefers the
//! remote store when the host is online and falls back to a local write plus
//! a pending flag when it is not. The sync task set is the only code that
//! clears those flags.

mod change_password;
mod register;
mod update_profile;

pub use change_password::{ChangePassword, PasswordChangeError, PasswordChangeOutcome};
pub use register::{RegisterAccount, RegisterError};
pub use update_profile::{ProfileUpdateError, ProfileUpdateOutcome, UpdateProfile};
