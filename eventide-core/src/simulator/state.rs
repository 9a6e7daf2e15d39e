//! Run-state and replication-state machines.

use std::fmt;

use serde::{Deserialize, Serialize};

/// Operational status of the driver loop.
///
/// Transitions: `NotInitialized → Initialized → Starting → Started →
/// Stopping → Stopped`, with `Stopped → Starting` as resume. `Ended` is
/// terminal; only a fresh `initialize` leaves it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum RunState {
    NotInitialized,
    Initialized,
    Starting,
    Started,
    Stopping,
    Stopped,
    Ended,
}

impl RunState {
    /// True while the driver loop is active or being started.
    pub fn is_running(&self) -> bool {
        matches!(self, RunState::Starting | RunState::Started)
    }

    /// True when `start()` may begin a run from this state.
    pub fn can_start(&self) -> bool {
        matches!(self, RunState::Initialized | RunState::Stopped)
    }

    /// True when a stop request is meaningful in this state.
    pub fn can_stop(&self) -> bool {
        self.is_running()
    }
}

impl fmt::Display for RunState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            RunState::NotInitialized => "NOT_INITIALIZED",
            RunState::Initialized => "INITIALIZED",
            RunState::Starting => "STARTING",
            RunState::Started => "STARTED",
            RunState::Stopping => "STOPPING",
            RunState::Stopped => "STOPPED",
            RunState::Ended => "ENDED",
        };
        write!(f, "{name}")
    }
}

/// Lifecycle status of the current replication, independent of whether
/// the loop is executing right now.
///
/// Transitions: `NotInitialized → Initialized → Started → Ending →
/// Ended`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ReplicationState {
    NotInitialized,
    Initialized,
    Started,
    Ending,
    Ended,
}

impl ReplicationState {
    /// True when the replication can still execute events.
    pub fn is_active(&self) -> bool {
        matches!(self, ReplicationState::Initialized | ReplicationState::Started)
    }
}

impl fmt::Display for ReplicationState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            ReplicationState::NotInitialized => "NOT_INITIALIZED",
            ReplicationState::Initialized => "INITIALIZED",
            ReplicationState::Started => "STARTED",
            ReplicationState::Ending => "ENDING",
            ReplicationState::Ended => "ENDED",
        };
        write!(f, "{name}")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn running_states() {
        assert!(RunState::Starting.is_running());
        assert!(RunState::Started.is_running());
        assert!(!RunState::Stopped.is_running());
        assert!(!RunState::Ended.is_running());
    }

    #[test]
    fn startable_states() {
        assert!(RunState::Initialized.can_start());
        assert!(RunState::Stopped.can_start());
        assert!(!RunState::NotInitialized.can_start());
        assert!(!RunState::Started.can_start());
        assert!(!RunState::Ended.can_start());
    }

    #[test]
    fn replication_activity() {
        assert!(ReplicationState::Initialized.is_active());
        assert!(ReplicationState::Started.is_active());
        assert!(!ReplicationState::Ending.is_active());
        assert!(!ReplicationState::Ended.is_active());
    }
}
