use serde::{Deserialize, Serialize};

/// Sync orchestrator state machine
///
/// Design principle: this is a pure type state machine with only state
/// definitions and transition validation logic. Runtime behaviors like
/// timers, debouncing and the single-flight guard are handled by the
/// application layer (mm-app).
///
/// State transitions:
///
/// ```text
/// Idle ──→ Scheduled ──→ Running ──→ Idle
///                                 └─→ RetryScheduled ──→ Running
///
/// Scheduled ──→ Idle            (schedule cancelled)
/// RetryScheduled ──→ Idle       (retry attempts exhausted / cancelled)
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum SyncPhase {
    /// No sync pass scheduled or running
    Idle,

    /// A debounced pass is scheduled but has not started yet
    Scheduled,

    /// A pipeline pass is executing
    Running,

    /// The last pass failed and a bounded retry is waiting out its delay
    RetryScheduled,
}

impl SyncPhase {
    /// Check if a pass is waiting on a timer
    pub fn is_waiting(self) -> bool {
        matches!(self, Self::Scheduled | Self::RetryScheduled)
    }

    /// Check if a pipeline pass is executing
    pub fn is_running(self) -> bool {
        self == Self::Running
    }

    /// Schedule a debounced pass
    pub fn schedule(self) -> Option<Self> {
        match self {
            Self::Idle | Self::Scheduled | Self::RetryScheduled => Some(Self::Scheduled),
            Self::Running => None,
        }
    }

    /// Enter the pipeline
    pub fn begin(self) -> Option<Self> {
        match self {
            Self::Running => None,
            _ => Some(Self::Running),
        }
    }

    /// Transition after a pass finishes
    pub fn complete(self, retry_scheduled: bool) -> Self {
        match self {
            Self::Running if retry_scheduled => Self::RetryScheduled,
            Self::Running => Self::Idle,
            _ => self,
        }
    }

    /// Cancel whatever is waiting
    pub fn cancel(self) -> Self {
        if self.is_waiting() {
            Self::Idle
        } else {
            self
        }
    }
}

impl Default for SyncPhase {
    fn default() -> Self {
        Self::Idle
    }
}
