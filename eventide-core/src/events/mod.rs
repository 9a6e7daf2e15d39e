//! Scheduled events and the time-ordered event list.
//!
//! Events are executed in strict `(time, priority, insertion sequence)`
//! order. The sequence number makes the order total: no two events ever
//! compare equal, so a replay of the same schedule executes in the same
//! order every run.

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::time::SimTime;

mod list;

pub use list::{EventList, PendingEvent};

/// Priority levels for simulation events.
///
/// Among events scheduled for the identical simulation time, lower
/// numeric values execute first.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum Priority {
    Critical = 0,
    High = 1,
    Normal = 2,
    Low = 3,
}

impl Default for Priority {
    fn default() -> Self {
        Priority::Normal
    }
}

/// Opaque handle to a scheduled event, used for cancellation by identity.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct EventHandle(u64);

impl EventHandle {
    pub(crate) fn from_raw(id: u64) -> Self {
        Self(id)
    }

    /// Returns the raw event id.
    pub fn as_raw(&self) -> u64 {
        self.0
    }
}

/// Errors raised at the scheduling call site.
#[derive(Debug, Error)]
pub enum SchedulingError {
    /// Attempted to schedule an event strictly before the current
    /// simulation time. This is a programming error in the model and is
    /// surfaced, never silently corrected.
    #[error("event scheduled in the past: event time {event_time} < current time {now}")]
    EventInPast {
        /// Requested execution time.
        event_time: String,
        /// Simulation time at the moment of the call.
        now: String,
    },

    /// Event list exceeded its configured capacity.
    #[error("event list overflow: {count} events scheduled")]
    QueueOverflow {
        /// Number of events already pending.
        count: usize,
    },
}

/// Ordering key for the event list: time, then priority, then sequence.
///
/// Derived `Ord` compares fields in declaration order, which is exactly
/// the tie-break contract: lower time first, then higher priority (lower
/// numeric value), then earlier insertion.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord)]
pub(crate) struct EventKey<T: SimTime> {
    pub time: T,
    pub priority: Priority,
    pub sequence: u64,
}

/// An event removed from the list, ready for execution.
///
/// Once created the execution time is immutable; the only ways off the
/// list are execution and cancellation.
#[derive(Debug)]
pub struct ScheduledEvent<T: SimTime, A> {
    /// Handle under which the event was scheduled.
    pub handle: EventHandle,
    /// Absolute execution time.
    pub time: T,
    /// Tie-break rank among equal-time events.
    pub priority: Priority,
    /// Insertion sequence, the final tie-breaker.
    pub sequence: u64,
    /// Deferred action captured at scheduling time.
    pub action: A,
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::time::TimeTicks;

    #[test]
    fn key_orders_by_time_first() {
        let early = EventKey {
            time: TimeTicks::new(1),
            priority: Priority::Low,
            sequence: 99,
        };
        let late = EventKey {
            time: TimeTicks::new(2),
            priority: Priority::Critical,
            sequence: 0,
        };
        assert!(early < late);
    }

    #[test]
    fn key_orders_by_priority_within_time() {
        let high = EventKey {
            time: TimeTicks::new(5),
            priority: Priority::High,
            sequence: 7,
        };
        let low = EventKey {
            time: TimeTicks::new(5),
            priority: Priority::Low,
            sequence: 1,
        };
        assert!(high < low);
    }

    #[test]
    fn key_orders_by_sequence_last() {
        let first = EventKey {
            time: TimeTicks::new(5),
            priority: Priority::Normal,
            sequence: 1,
        };
        let second = EventKey {
            time: TimeTicks::new(5),
            priority: Priority::Normal,
            sequence: 2,
        };
        assert!(first < second);
    }
}
