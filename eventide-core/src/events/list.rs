//! Time-ordered event list with cancellation by identity.

use std::collections::{BTreeMap, HashMap};

use super::{EventHandle, EventKey, Priority, ScheduledEvent, SchedulingError};
use crate::time::SimTime;

/// Priority queue of scheduled events.
///
/// Conceptually a mapping from `(time, priority, sequence)` to a
/// deferred action, maintained as an ordered tree so that `first` always
/// returns the globally smallest key and cancellation by handle stays
/// O(log n). The list carries a floor (the owning simulator's current
/// time); inserting below the floor is rejected.
#[derive(Debug)]
pub struct EventList<T: SimTime, A> {
    entries: BTreeMap<EventKey<T>, Entry<A>>,
    /// Handle id to ordering key, for cancellation by identity.
    index: HashMap<u64, EventKey<T>>,
    floor: T,
    capacity: usize,
    next_id: u64,
    next_sequence: u64,
}

#[derive(Debug)]
struct Entry<A> {
    id: u64,
    action: A,
}

impl<T: SimTime, A> EventList<T, A> {
    /// Creates an empty list with the given capacity and floor at the
    /// time origin.
    pub fn new(capacity: usize) -> Self {
        Self {
            entries: BTreeMap::new(),
            index: HashMap::new(),
            floor: T::zero(),
            capacity,
            next_id: 0,
            next_sequence: 0,
        }
    }

    /// Raises the floor below which insertions are rejected.
    ///
    /// Called by the simulator whenever its clock advances; the floor
    /// never moves backwards.
    pub fn set_floor(&mut self, floor: T) {
        debug_assert!(floor >= self.floor, "event list floor may not move backwards");
        self.floor = floor;
    }

    /// Inserts an event at an absolute time.
    ///
    /// Returns the handle under which the event can be cancelled.
    ///
    /// # Errors
    ///
    /// - `SchedulingError::EventInPast` - `time` is strictly before the floor
    /// - `SchedulingError::QueueOverflow` - the list is at capacity
    pub fn insert(
        &mut self,
        time: T,
        priority: Priority,
        action: A,
    ) -> Result<EventHandle, SchedulingError> {
        if time < self.floor {
            return Err(SchedulingError::EventInPast {
                event_time: time.to_string(),
                now: self.floor.to_string(),
            });
        }
        if self.entries.len() >= self.capacity {
            return Err(SchedulingError::QueueOverflow {
                count: self.entries.len(),
            });
        }

        let id = self.next_id;
        self.next_id += 1;
        let key = EventKey {
            time,
            priority,
            sequence: self.next_sequence,
        };
        self.next_sequence += 1;

        self.index.insert(id, key.clone());
        self.entries.insert(key, Entry { id, action });
        Ok(EventHandle::from_raw(id))
    }

    /// Peeks at the earliest pending event without removing it.
    pub fn first(&self) -> Option<PendingEvent<'_, T>> {
        self.entries.first_key_value().map(|(key, entry)| PendingEvent {
            handle: EventHandle::from_raw(entry.id),
            time: &key.time,
            priority: key.priority,
        })
    }

    /// Removes and returns the earliest pending event.
    pub fn remove_first(&mut self) -> Option<ScheduledEvent<T, A>> {
        let (key, entry) = self.entries.pop_first()?;
        self.index.remove(&entry.id);
        Some(ScheduledEvent {
            handle: EventHandle::from_raw(entry.id),
            time: key.time,
            priority: key.priority,
            sequence: key.sequence,
            action: entry.action,
        })
    }

    /// Removes an event before execution, by identity.
    ///
    /// Returns whether the event was still pending. Cancelling an
    /// already-executed or unknown event returns `false` with no side
    /// effect.
    pub fn cancel(&mut self, handle: EventHandle) -> bool {
        match self.index.remove(&handle.as_raw()) {
            Some(key) => self.entries.remove(&key).is_some(),
            None => false,
        }
    }

    /// Returns the execution time of the earliest pending event.
    pub fn next_time(&self) -> Option<&T> {
        self.entries.first_key_value().map(|(key, _)| &key.time)
    }

    /// Returns the number of pending events.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Returns true when no events are pending.
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Drops all pending events.
    pub fn clear(&mut self) {
        self.entries.clear();
        self.index.clear();
    }
}

/// Borrowed view of the earliest pending event.
#[derive(Debug, Clone, Copy)]
pub struct PendingEvent<'a, T: SimTime> {
    /// Handle under which the event was scheduled.
    pub handle: EventHandle,
    /// Absolute execution time.
    pub time: &'a T,
    /// Tie-break rank among equal-time events.
    pub priority: Priority,
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::time::TimeTicks;

    fn list() -> EventList<TimeTicks, &'static str> {
        EventList::new(1024)
    }

    #[test]
    fn events_come_out_in_time_order() {
        let mut events = list();
        events.insert(TimeTicks::new(3), Priority::Normal, "c").unwrap();
        events.insert(TimeTicks::new(1), Priority::Normal, "a").unwrap();
        events.insert(TimeTicks::new(2), Priority::Normal, "b").unwrap();

        let order: Vec<_> = std::iter::from_fn(|| events.remove_first())
            .map(|e| e.action)
            .collect();
        assert_eq!(order, vec!["a", "b", "c"]);
    }

    #[test]
    fn higher_priority_wins_at_equal_time() {
        let mut events = list();
        events.insert(TimeTicks::new(5), Priority::Low, "low").unwrap();
        events.insert(TimeTicks::new(5), Priority::High, "high").unwrap();

        assert_eq!(events.remove_first().unwrap().action, "high");
        assert_eq!(events.remove_first().unwrap().action, "low");
    }

    #[test]
    fn equal_time_and_priority_is_fifo() {
        let mut events = list();
        for name in ["first", "second", "third"] {
            events.insert(TimeTicks::new(7), Priority::Normal, name).unwrap();
        }

        let order: Vec<_> = std::iter::from_fn(|| events.remove_first())
            .map(|e| e.action)
            .collect();
        assert_eq!(order, vec!["first", "second", "third"]);
    }

    #[test]
    fn first_does_not_remove() {
        let mut events = list();
        let handle = events.insert(TimeTicks::new(1), Priority::Normal, "x").unwrap();

        let peeked = events.first().unwrap();
        assert_eq!(peeked.handle, handle);
        assert_eq!(*peeked.time, TimeTicks::new(1));
        assert_eq!(events.len(), 1);
    }

    #[test]
    fn cancel_removes_pending_event() {
        let mut events = list();
        let keep = events.insert(TimeTicks::new(1), Priority::Normal, "keep").unwrap();
        let drop = events.insert(TimeTicks::new(2), Priority::Normal, "drop").unwrap();

        assert!(events.cancel(drop));
        assert_eq!(events.len(), 1);
        assert_eq!(events.first().unwrap().handle, keep);
    }

    #[test]
    fn cancel_after_execution_is_a_noop() {
        let mut events = list();
        let handle = events.insert(TimeTicks::new(1), Priority::Normal, "x").unwrap();
        events.remove_first().unwrap();

        assert!(!events.cancel(handle));
        assert!(!events.cancel(handle));
    }

    #[test]
    fn insert_below_floor_is_rejected() {
        let mut events = list();
        events.set_floor(TimeTicks::new(10));

        let result = events.insert(TimeTicks::new(9), Priority::Normal, "late");
        assert!(matches!(result, Err(SchedulingError::EventInPast { .. })));

        // Exactly at the floor is legal ("now" events).
        assert!(events.insert(TimeTicks::new(10), Priority::Normal, "now").is_ok());
    }

    #[test]
    fn capacity_overflow_is_rejected() {
        let mut events: EventList<TimeTicks, u32> = EventList::new(2);
        events.insert(TimeTicks::new(1), Priority::Normal, 1).unwrap();
        events.insert(TimeTicks::new(2), Priority::Normal, 2).unwrap();

        let result = events.insert(TimeTicks::new(3), Priority::Normal, 3);
        assert!(matches!(result, Err(SchedulingError::QueueOverflow { count: 2 })));
    }

    #[test]
    fn clear_removes_everything() {
        let mut events = list();
        let handle = events.insert(TimeTicks::new(1), Priority::Normal, "x").unwrap();
        events.insert(TimeTicks::new(2), Priority::Normal, "y").unwrap();

        events.clear();
        assert!(events.is_empty());
        assert!(!events.cancel(handle));
    }

    #[test]
    fn handles_stay_unique_across_removal() {
        let mut events = list();
        let a = events.insert(TimeTicks::new(1), Priority::Normal, "a").unwrap();
        events.remove_first().unwrap();
        let b = events.insert(TimeTicks::new(1), Priority::Normal, "b").unwrap();
        assert_ne!(a, b);
    }

    mod ordering_property {
        use proptest::prelude::*;

        use super::*;

        fn priority_of(index: u8) -> Priority {
            match index % 4 {
                0 => Priority::Critical,
                1 => Priority::High,
                2 => Priority::Normal,
                _ => Priority::Low,
            }
        }

        proptest! {
            /// Whatever the insertion order, events drain sorted by
            /// (time, priority, insertion sequence).
            #[test]
            fn removal_order_matches_the_sort_key(
                entries in prop::collection::vec((0i64..100, 0u8..4), 1..50)
            ) {
                let mut events: EventList<TimeTicks, usize> = EventList::new(1024);
                for (index, (time, priority)) in entries.iter().enumerate() {
                    events
                        .insert(TimeTicks::new(*time), priority_of(*priority), index)
                        .unwrap();
                }

                let drained: Vec<usize> = std::iter::from_fn(|| events.remove_first())
                    .map(|e| e.action)
                    .collect();
                let mut expected: Vec<usize> = (0..entries.len()).collect();
                expected.sort_by_key(|&i| (entries[i].0, priority_of(entries[i].1), i));
                prop_assert_eq!(drained, expected);
            }
        }
    }
}
