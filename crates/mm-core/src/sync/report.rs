use serde::{Deserialize, Serialize};

/// Per-task tally for one pipeline pass.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct TaskReport {
    /// Records whose ledger flag was cleared after a confirmed remote success.
    pub synced: u32,
    /// Records left pending for the next pass.
    pub failed: u32,
    /// Records whose flag was cleared without a remote call (fail-safe discard).
    pub discarded: u32,
}

impl TaskReport {
    pub fn record_synced(&mut self) {
        self.synced += 1;
    }

    pub fn record_failed(&mut self) {
        self.failed += 1;
    }

    pub fn record_discarded(&mut self) {
        self.discarded += 1;
    }

    pub fn is_empty(&self) -> bool {
        self.synced == 0 && self.failed == 0 && self.discarded == 0
    }
}

/// Outcome of one full registration → password → profile pass.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SyncReport {
    pub registration: TaskReport,
    pub password: TaskReport,
    pub profile: TaskReport,
}

impl SyncReport {
    pub fn total_synced(&self) -> u32 {
        self.registration.synced + self.password.synced + self.profile.synced
    }

    pub fn total_failed(&self) -> u32 {
        self.registration.failed + self.password.failed + self.profile.failed
    }

    pub fn is_empty(&self) -> bool {
        self.registration.is_empty() && self.password.is_empty() && self.profile.is_empty()
    }
}
