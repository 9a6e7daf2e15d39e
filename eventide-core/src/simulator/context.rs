//! Scheduling context handed to model code.

use crate::events::{EventHandle, EventList, Priority, SchedulingError};
use crate::rng::SimRng;
use crate::time::SimTime;

use super::replication::Replication;

/// Deferred action captured at scheduling time.
///
/// Replaces reflective "target + method name + arguments" dispatch with
/// a typed closure over the model; the closure receives the model and a
/// fresh context so executed events can schedule follow-up events.
pub type Action<T, M> = Box<dyn FnOnce(&mut M, &mut SimContext<'_, T, M>) + Send + 'static>;

/// The simulator surface visible to model code.
///
/// Passed to `Model::construct_model` and to every executed event
/// action. Control requests made through the context (scheduling,
/// cancellation, stop) execute synchronously on the worker thread that
/// is already driving the loop; they are never re-dispatched, so they
/// are safe to call from inside an event.
pub struct SimContext<'a, T: SimTime, M> {
    pub(super) now: &'a T,
    pub(super) events: &'a mut EventList<T, Action<T, M>>,
    pub(super) replication: &'a Replication<T>,
    pub(super) rng: &'a mut SimRng,
    pub(super) stop_requested: &'a mut bool,
}

impl<'a, T: SimTime, M> SimContext<'a, T, M> {
    /// Current simulation time.
    pub fn now(&self) -> &T {
        self.now
    }

    /// The active replication's configuration.
    pub fn replication(&self) -> &Replication<T> {
        self.replication
    }

    /// The replication's deterministic random stream.
    pub fn rng(&mut self) -> &mut SimRng {
        self.rng
    }

    /// Schedules an action at an absolute simulation time.
    ///
    /// # Errors
    ///
    /// - `SchedulingError::EventInPast` - `time` is before the current time
    /// - `SchedulingError::QueueOverflow` - the event list is at capacity
    pub fn schedule_at<F>(
        &mut self,
        time: T,
        priority: Priority,
        action: F,
    ) -> Result<EventHandle, SchedulingError>
    where
        F: FnOnce(&mut M, &mut SimContext<'_, T, M>) + Send + 'static,
    {
        self.events.insert(time, priority, Box::new(action))
    }

    /// Schedules an action a relative duration after the current time.
    ///
    /// # Errors
    ///
    /// Same as [`SimContext::schedule_at`].
    pub fn schedule<F>(
        &mut self,
        delay: T::Delta,
        priority: Priority,
        action: F,
    ) -> Result<EventHandle, SchedulingError>
    where
        F: FnOnce(&mut M, &mut SimContext<'_, T, M>) + Send + 'static,
    {
        self.schedule_at(self.now.add(&delay), priority, action)
    }

    /// Schedules an action at the current simulation time.
    ///
    /// # Errors
    ///
    /// Same as [`SimContext::schedule_at`].
    pub fn schedule_now<F>(
        &mut self,
        priority: Priority,
        action: F,
    ) -> Result<EventHandle, SchedulingError>
    where
        F: FnOnce(&mut M, &mut SimContext<'_, T, M>) + Send + 'static,
    {
        self.schedule_at(self.now.clone(), priority, action)
    }

    /// Cancels a pending event. Returns whether it was still pending.
    pub fn cancel(&mut self, handle: EventHandle) -> bool {
        self.events.cancel(handle)
    }

    /// Requests the driver loop to stop after the current event.
    ///
    /// The loop checks the flag at the next iteration boundary; the
    /// event list and current time stay resumable.
    pub fn request_stop(&mut self) {
        *self.stop_requested = true;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::time::TimeTicks;

    struct NullModel;

    fn fixture() -> (
        TimeTicks,
        EventList<TimeTicks, Action<TimeTicks, NullModel>>,
        Replication<TimeTicks>,
        SimRng,
        bool,
    ) {
        (
            TimeTicks::new(5),
            EventList::new(64),
            Replication::new(TimeTicks::new(0), TimeTicks::new(100)).unwrap(),
            SimRng::from_seed(1),
            false,
        )
    }

    #[test]
    fn schedule_uses_relative_delay() {
        let (now, mut events, replication, mut rng, mut stop) = fixture();
        let mut ctx = SimContext {
            now: &now,
            events: &mut events,
            replication: &replication,
            rng: &mut rng,
            stop_requested: &mut stop,
        };

        ctx.schedule(10, Priority::Normal, |_m: &mut NullModel, _c| {})
            .unwrap();
        assert_eq!(events.next_time(), Some(&TimeTicks::new(15)));
    }

    #[test]
    fn schedule_in_the_past_is_rejected() {
        let (now, mut events, replication, mut rng, mut stop) = fixture();
        events.set_floor(now);
        let mut ctx = SimContext {
            now: &now,
            events: &mut events,
            replication: &replication,
            rng: &mut rng,
            stop_requested: &mut stop,
        };

        let result =
            ctx.schedule_at(TimeTicks::new(4), Priority::Normal, |_m: &mut NullModel, _c| {});
        assert!(matches!(result, Err(SchedulingError::EventInPast { .. })));
    }

    #[test]
    fn request_stop_sets_the_flag() {
        let (now, mut events, replication, mut rng, mut stop) = fixture();
        {
            let mut ctx = SimContext {
                now: &now,
                events: &mut events,
                replication: &replication,
                rng: &mut rng,
                stop_requested: &mut stop,
            };
            ctx.request_stop();
        }
        assert!(stop);
    }
}
