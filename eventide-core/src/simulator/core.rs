//! Simulator core: clock, event list, state machine and driver loops.
//!
//! `SimCore` is the single lock-protected owner of everything a run
//! mutates: current time, run/replication state, the event list and the
//! notifier. The worker thread and the public facade both talk to it
//! through the simulator's mutex; the loop strategies are written as a
//! single `advance_once` step so the lock is released between executed
//! events.

use std::panic::{self, AssertUnwindSafe};
use std::sync::Arc;
use std::time::Duration;

use crate::config::SimulatorConfig;
use crate::events::{EventHandle, EventList, Priority};
use crate::notify::{Notifier, SimSignal, SimulationListener, SubscriptionId};
use crate::rng::SimRng;
use crate::time::SimTime;

use super::context::{Action, SimContext};
use super::error::SimulatorError;
use super::replication::Replication;
use super::state::{ReplicationState, RunState};
use super::{LoopPolicy, Model};

/// Inclusive/exclusive run-until bound set by `run_up_to` variants.
#[derive(Debug, Clone)]
pub(super) struct RunUntil<T: SimTime> {
    pub time: T,
    pub inclusive: bool,
}

/// What the worker should do after one `advance_once` call.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(super) enum StepOutcome {
    /// Keep iterating.
    Progressed,
    /// Throttled loop: sleep (interruptibly) before the next batch.
    SleepThen(Duration),
    /// The loop is done; final states and notifications are already set.
    Finished,
}

pub(super) struct SimCore<T: SimTime, M: Model<T>> {
    policy: LoopPolicy<T>,
    config: SimulatorConfig,
    run_state: RunState,
    replication_state: ReplicationState,
    time: T,
    events: EventList<T, Action<T, M>>,
    model: Option<M>,
    replication: Option<Replication<T>>,
    rng: SimRng,
    notifier: Notifier<T>,
    run_until: Option<RunUntil<T>>,
    /// Upper edge of the fixed step the hybrid loop is currently
    /// draining, if any.
    hybrid_boundary: Option<T>,
    animation_delay: Duration,
    stop_requested: bool,
    warmup_fired: bool,
    finalized: bool,
}

impl<T: SimTime, M: Model<T>> SimCore<T, M> {
    pub fn new(policy: LoopPolicy<T>, config: SimulatorConfig) -> Self {
        let capacity = config.scheduler.max_scheduled_events;
        let animation_delay = config.animation.frame_delay;
        Self {
            policy,
            config,
            run_state: RunState::NotInitialized,
            replication_state: ReplicationState::NotInitialized,
            time: T::zero(),
            events: EventList::new(capacity),
            model: None,
            replication: None,
            rng: SimRng::from_seed(0),
            notifier: Notifier::new(),
            run_until: None,
            hybrid_boundary: None,
            animation_delay,
            stop_requested: false,
            warmup_fired: false,
            finalized: false,
        }
    }

    fn invalid_state(&self, operation: &'static str, reason: &'static str) -> SimulatorError {
        SimulatorError::InvalidState {
            operation,
            run_state: self.run_state,
            replication_state: self.replication_state,
            reason,
        }
    }

    // ------------------------------------------------------------------
    // Control transitions
    // ------------------------------------------------------------------

    /// Binds a model and replication, constructs the model, and moves
    /// the state machine to INITIALIZED.
    ///
    /// # Errors
    ///
    /// - `SimulatorError::InvalidState` - the simulator is running
    /// - `SimulatorError::WorkerUnavailable` - after `clean_up`
    /// - any error the model's construction callback returns
    pub fn initialize(
        &mut self,
        model: M,
        replication: Replication<T>,
    ) -> Result<(), SimulatorError> {
        if self.finalized {
            return Err(SimulatorError::WorkerUnavailable {
                reason: "simulator has been cleaned up".to_string(),
            });
        }
        if self.run_state.is_running() {
            return Err(self.invalid_state(
                "initialize",
                "cannot reinitialize a running simulator",
            ));
        }

        self.time = replication.start_time().clone();
        self.events = EventList::new(self.config.scheduler.max_scheduled_events);
        self.events.set_floor(self.time.clone());
        self.rng = SimRng::from_seed(replication.seed());
        self.run_until = None;
        self.hybrid_boundary = None;
        self.stop_requested = false;
        self.warmup_fired = false;
        self.replication = Some(replication);
        self.run_state = RunState::Initialized;
        self.replication_state = ReplicationState::Initialized;

        let mut model = model;
        let constructed = {
            let Some(replication) = self.replication.as_ref() else {
                return Err(SimulatorError::NoReplication);
            };
            let mut ctx = SimContext {
                now: &self.time,
                events: &mut self.events,
                replication,
                rng: &mut self.rng,
                stop_requested: &mut self.stop_requested,
            };
            model.construct_model(&mut ctx)
        };
        if let Err(error) = constructed {
            // A failed constructor must not leave a startable simulator
            // behind: unwind to the pre-initialize state.
            self.model = None;
            self.replication = None;
            self.events.clear();
            self.run_state = RunState::NotInitialized;
            self.replication_state = ReplicationState::NotInitialized;
            tracing::debug!("model construction failed; initialize rolled back");
            return Err(error);
        }
        self.model = Some(model);

        tracing::debug!(time = %self.time, pending = self.events.len(), "simulator initialized");
        Ok(())
    }

    /// Validates `start`/`step` preconditions and moves to STARTING.
    ///
    /// # Errors
    ///
    /// - `SimulatorError::WorkerUnavailable` - after `clean_up`
    /// - `SimulatorError::Ended` - the replication already ended
    /// - `SimulatorError::NoReplication` - `initialize` was never called
    /// - `SimulatorError::InvalidState` - already running, not yet
    ///   initialized, or current time at/past the replication end
    pub fn prepare_start(
        &mut self,
        operation: &'static str,
        run_until: Option<RunUntil<T>>,
    ) -> Result<(), SimulatorError> {
        if self.finalized {
            return Err(SimulatorError::WorkerUnavailable {
                reason: "simulator has been cleaned up".to_string(),
            });
        }
        if self.run_state == RunState::Ended || !self.replication_state.is_active() {
            if self.replication.is_none() {
                return Err(SimulatorError::NoReplication);
            }
            return Err(SimulatorError::Ended);
        }
        if self.run_state.is_running() {
            return Err(self.invalid_state(operation, "simulator is already running"));
        }
        let Some(replication) = self.replication.as_ref() else {
            return Err(SimulatorError::NoReplication);
        };
        if !self.run_state.can_start() {
            return Err(self.invalid_state(
                operation,
                "run state must be INITIALIZED or STOPPED",
            ));
        }
        if self.time >= *replication.end_time() {
            return Err(self.invalid_state(
                operation,
                "current time is at or past the replication end time",
            ));
        }

        self.run_until = run_until;
        self.stop_requested = false;
        self.run_state = RunState::Starting;
        tracing::debug!(operation, time = %self.time, "run requested");
        Ok(())
    }

    /// Transition STARTING -> STARTED, firing the start notifications.
    pub fn begin_run(&mut self) {
        self.run_state = RunState::Started;
        self.notifier.fire(SimSignal::Started, &self.time);
        if self.replication_state == ReplicationState::Initialized {
            self.replication_state = ReplicationState::Started;
            self.notifier.fire(SimSignal::StartOfReplication, &self.time);
        }
        self.check_warmup();
        tracing::debug!(time = %self.time, "run started");
    }

    /// Requests the driver loop to stop at the next iteration boundary.
    ///
    /// # Errors
    ///
    /// - `SimulatorError::InvalidState` - already stopping/stopped, or
    ///   not running at all
    pub fn request_stop(&mut self) -> Result<(), SimulatorError> {
        if matches!(self.run_state, RunState::Stopping | RunState::Stopped) {
            return Err(self.invalid_state("stop", "simulator is already stopping or stopped"));
        }
        if !self.run_state.can_stop() {
            return Err(self.invalid_state("stop", "simulator is not running"));
        }
        self.stop_requested = true;
        self.run_state = RunState::Stopping;
        self.notifier.fire(SimSignal::Stopping, &self.time);
        tracing::debug!(time = %self.time, "stop requested");
        Ok(())
    }

    /// Transition to STOPPED, leaving the event list and clock
    /// resumable.
    pub fn finish_stop(&mut self) {
        self.run_state = RunState::Stopped;
        self.stop_requested = false;
        self.notifier.fire(SimSignal::Stopped, &self.time);
        tracing::debug!(time = %self.time, "run stopped");
    }

    /// Ends the replication exactly once: clamps an overshot clock to
    /// the end time, fires end-of-replication, and makes ENDED terminal.
    fn end_replication(&mut self) {
        if !self.replication_state.is_active() {
            return;
        }
        self.replication_state = ReplicationState::Ending;
        if let Some(replication) = self.replication.as_ref() {
            let end = replication.end_time().clone();
            if self.time > end {
                self.time = end;
            }
        }
        self.notifier.fire(SimSignal::EndOfReplication, &self.time);
        self.replication_state = ReplicationState::Ended;
        self.run_state = RunState::Ended;
        self.stop_requested = false;
        self.notifier.fire(SimSignal::Stopped, &self.time);
        tracing::debug!(time = %self.time, "replication ended");
    }

    // ------------------------------------------------------------------
    // Clock
    // ------------------------------------------------------------------

    /// Advances the clock, never backwards, firing time-changed and the
    /// one-shot warmup crossing.
    fn set_time(&mut self, new_time: T) {
        debug_assert!(new_time >= self.time, "simulation time may not decrease");
        self.time = new_time.clone();
        self.events.set_floor(new_time);
        self.notifier.fire(SimSignal::TimeChanged, &self.time);
        self.check_warmup();
    }

    fn check_warmup(&mut self) {
        if self.warmup_fired {
            return;
        }
        let Some(replication) = self.replication.as_ref() else {
            return;
        };
        if self.time >= *replication.warmup_time() {
            self.warmup_fired = true;
            self.notifier.fire(SimSignal::Warmup, &self.time);
        }
    }

    // ------------------------------------------------------------------
    // Driver loops
    // ------------------------------------------------------------------

    /// Where the current run should stop advancing the clock: the
    /// run-until bound when one is set below the replication end, the
    /// end time otherwise.
    fn effective_target(&self, end: &T) -> T {
        match &self.run_until {
            Some(bound) if bound.time < *end => bound.time.clone(),
            _ => end.clone(),
        }
    }

    /// Whether an event at `event_time` may execute under the current
    /// bounds. The replication end is inclusive; a run-until bound is
    /// inclusive only when requested.
    fn event_executable(&self, event_time: &T, end: &T) -> bool {
        if *event_time > *end {
            return false;
        }
        match &self.run_until {
            None => true,
            Some(bound) => {
                *event_time < bound.time || (bound.inclusive && *event_time == bound.time)
            }
        }
    }

    /// Advances the clock to the active bound and finishes the run:
    /// end-of-replication when the bound is the end time, a plain stop
    /// otherwise.
    fn finish_at_target(&mut self, end: &T) {
        let target = self.effective_target(end);
        if target > self.time {
            self.set_time(target.clone());
        }
        if target == *end {
            self.end_replication();
        } else {
            self.run_until = None;
            self.finish_stop();
        }
    }

    /// Executes one iteration of the configured loop strategy.
    ///
    /// Called with the simulator lock held; at most one event executes
    /// per call so the lock is released between events.
    pub fn advance_once(&mut self) -> StepOutcome {
        if self.finalized {
            return StepOutcome::Finished;
        }
        if self.stop_requested || self.run_state == RunState::Stopping {
            self.finish_stop();
            return StepOutcome::Finished;
        }
        if self.run_state != RunState::Started {
            return StepOutcome::Finished;
        }
        let Some(replication) = self.replication.as_ref() else {
            self.finish_stop();
            return StepOutcome::Finished;
        };
        let end = replication.end_time().clone();

        match self.policy.clone() {
            LoopPolicy::DiscreteEvent => self.advance_discrete(&end),
            LoopPolicy::FixedStep { step } => self.advance_fixed(&end, &step),
            LoopPolicy::Hybrid { step } => self.advance_hybrid(&end, &step),
            LoopPolicy::Throttled => self.advance_throttled(&end),
        }
    }

    fn advance_discrete(&mut self, end: &T) -> StepOutcome {
        match self.events.next_time().cloned() {
            // An empty list ends the replication at the unchanged
            // current time; the clock never walks to the end on its own
            // in the pure discrete loop.
            None => {
                self.end_replication();
                StepOutcome::Finished
            }
            Some(next) if self.event_executable(&next, end) => {
                self.execute_next_event();
                StepOutcome::Progressed
            }
            Some(_) => {
                self.finish_at_target(end);
                StepOutcome::Finished
            }
        }
    }

    fn advance_fixed(&mut self, end: &T, step: &T::Delta) -> StepOutcome {
        let target = self.effective_target(end);
        if self.time >= target {
            if target == *end {
                self.end_replication();
            } else {
                self.run_until = None;
                self.finish_stop();
            }
            return StepOutcome::Finished;
        }
        let next = self.time.add(step);
        let new_time = if next > target { target } else { next };
        self.set_time(new_time);
        StepOutcome::Progressed
    }

    fn advance_hybrid(&mut self, end: &T, step: &T::Delta) -> StepOutcome {
        let target = self.effective_target(end);
        let boundary = match self.hybrid_boundary.clone() {
            Some(boundary) => boundary,
            None => {
                if self.time >= target {
                    if target == *end {
                        self.end_replication();
                    } else {
                        self.run_until = None;
                        self.finish_stop();
                    }
                    return StepOutcome::Finished;
                }
                let next = self.time.add(step);
                let boundary = if next > target { target.clone() } else { next };
                self.hybrid_boundary = Some(boundary.clone());
                boundary
            }
        };

        // Drain discrete events inside the step before advancing to the
        // boundary; the sub-loop never moves the clock past it.
        let event_due = match self.events.next_time() {
            Some(next) => *next <= boundary,
            None => false,
        };
        if event_due {
            let next = self
                .events
                .next_time()
                .cloned()
                .filter(|next| self.event_executable(next, end));
            if let Some(_next) = next {
                self.execute_next_event();
                return StepOutcome::Progressed;
            }
        }

        if boundary > self.time {
            self.set_time(boundary.clone());
        }
        self.hybrid_boundary = None;
        if boundary >= target {
            if target == *end {
                self.end_replication();
            } else {
                self.run_until = None;
                self.finish_stop();
            }
            return StepOutcome::Finished;
        }
        StepOutcome::Progressed
    }

    fn advance_throttled(&mut self, end: &T) -> StepOutcome {
        let Some(batch_time) = self.events.next_time().cloned() else {
            self.end_replication();
            return StepOutcome::Finished;
        };
        if !self.event_executable(&batch_time, end) {
            self.finish_at_target(end);
            return StepOutcome::Finished;
        }
        if batch_time > self.time {
            self.set_time(batch_time.clone());
        }
        // One batch = every event due at this exact time, FIFO,
        // including follow-ups an executed event schedules for "now".
        while self.events.next_time() == Some(&batch_time) {
            self.execute_next_event();
            if self.stop_requested {
                break;
            }
        }
        self.notifier.fire(SimSignal::UpdateAnimation, &self.time);
        StepOutcome::SleepThen(self.animation_delay)
    }

    /// Removes and executes the earliest event, isolating model panics.
    ///
    /// A panicking action is logged with its event id and time and the
    /// loop carries on; a single bad event must not corrupt the run.
    fn execute_next_event(&mut self) {
        let Some(event) = self.events.remove_first() else {
            return;
        };
        if event.time > self.time {
            self.set_time(event.time.clone());
        }
        let Some(model) = self.model.as_mut() else {
            return;
        };
        let Some(replication) = self.replication.as_ref() else {
            return;
        };

        tracing::trace!(event = event.handle.as_raw(), time = %self.time, "executing event");
        let mut ctx = SimContext {
            now: &self.time,
            events: &mut self.events,
            replication,
            rng: &mut self.rng,
            stop_requested: &mut self.stop_requested,
        };
        let action = event.action;
        let result = panic::catch_unwind(AssertUnwindSafe(|| action(model, &mut ctx)));
        if let Err(payload) = result {
            let reason = payload
                .downcast_ref::<&str>()
                .map(|s| (*s).to_string())
                .or_else(|| payload.downcast_ref::<String>().cloned())
                .unwrap_or_else(|| "non-string panic payload".to_string());
            tracing::error!(
                event = event.handle.as_raw(),
                time = %self.time,
                "model action panicked: {reason}"
            );
        }
    }

    /// Runs exactly one loop iteration synchronously: STARTED, one
    /// event (or one step), STOPPED, with notifications around it.
    ///
    /// # Errors
    ///
    /// Same preconditions as `start`.
    pub fn step(&mut self) -> Result<(), SimulatorError> {
        self.prepare_start("step", None)?;
        self.begin_run();
        let _ = self.advance_once();
        if self.run_state == RunState::Started {
            self.finish_stop();
        }
        Ok(())
    }

    // ------------------------------------------------------------------
    // Scheduling and introspection
    // ------------------------------------------------------------------

    /// Schedules an action at an absolute time.
    ///
    /// # Errors
    ///
    /// - `SimulatorError::NoReplication` - before `initialize`
    /// - `SimulatorError::Ended` - the replication already ended
    /// - `SimulatorError::Scheduling` - past time or queue overflow
    pub fn schedule_at(
        &mut self,
        time: T,
        priority: Priority,
        action: Action<T, M>,
    ) -> Result<EventHandle, SimulatorError> {
        if self.replication.is_none() {
            return Err(SimulatorError::NoReplication);
        }
        if !self.replication_state.is_active() {
            return Err(SimulatorError::Ended);
        }
        Ok(self.events.insert(time, priority, action)?)
    }

    /// Schedules an action a relative delay after the current time.
    ///
    /// # Errors
    ///
    /// Same as [`SimCore::schedule_at`].
    pub fn schedule_after(
        &mut self,
        delay: T::Delta,
        priority: Priority,
        action: Action<T, M>,
    ) -> Result<EventHandle, SimulatorError> {
        let time = self.time.add(&delay);
        self.schedule_at(time, priority, action)
    }

    pub fn cancel(&mut self, handle: EventHandle) -> bool {
        self.events.cancel(handle)
    }

    pub fn time(&self) -> T {
        self.time.clone()
    }

    pub fn run_state(&self) -> RunState {
        self.run_state
    }

    pub fn replication_state(&self) -> ReplicationState {
        self.replication_state
    }

    pub fn pending_events(&self) -> usize {
        self.events.len()
    }

    pub fn is_finalized(&self) -> bool {
        self.finalized
    }

    // ------------------------------------------------------------------
    // Notifications
    // ------------------------------------------------------------------

    pub fn subscribe(&mut self, listener: Arc<dyn SimulationListener<T>>) -> SubscriptionId {
        self.notifier.subscribe(listener)
    }

    pub fn subscribe_filtered(
        &mut self,
        signals: &[SimSignal],
        listener: Arc<dyn SimulationListener<T>>,
    ) -> SubscriptionId {
        self.notifier.subscribe_filtered(signals, listener)
    }

    pub fn unsubscribe(&mut self, id: SubscriptionId) -> bool {
        self.notifier.unsubscribe(id)
    }

    pub fn set_animation_delay(&mut self, delay: Duration) {
        self.animation_delay = delay;
        self.notifier
            .fire(SimSignal::AnimationDelayChanged, &self.time);
    }

    pub fn animation_delay(&self) -> Duration {
        self.animation_delay
    }

    // ------------------------------------------------------------------
    // Cleanup
    // ------------------------------------------------------------------

    /// Forcibly stops the loop, detaches every subscriber and marks the
    /// core finalized. Idempotent.
    pub fn finalize(&mut self) {
        if self.finalized {
            return;
        }
        self.stop_requested = true;
        if self.run_state.is_running() || self.run_state == RunState::Stopping {
            self.run_state = RunState::Stopped;
        }
        self.notifier.detach_all();
        self.finalized = true;
        tracing::debug!("simulator core finalized");
    }
}

#[cfg(test)]
mod tests {
    use parking_lot::Mutex;

    use super::*;
    use crate::notify::SimNotification;
    use crate::time::TimeTicks;

    #[derive(Default)]
    struct TraceModel {
        executed: Vec<&'static str>,
    }

    impl Model<TimeTicks> for TraceModel {
        fn construct_model(
            &mut self,
            _ctx: &mut SimContext<'_, TimeTicks, Self>,
        ) -> Result<(), SimulatorError> {
            Ok(())
        }
    }

    fn core_with(policy: LoopPolicy<TimeTicks>) -> SimCore<TimeTicks, TraceModel> {
        SimCore::new(policy, SimulatorConfig::default())
    }

    fn run_to_completion(core: &mut SimCore<TimeTicks, TraceModel>) {
        core.prepare_start("start", None).unwrap();
        core.begin_run();
        let mut budget = 100_000;
        loop {
            match core.advance_once() {
                StepOutcome::Finished => break,
                _ => {
                    budget -= 1;
                    assert!(budget > 0, "loop did not terminate");
                }
            }
        }
    }

    fn replication(end: i64) -> Replication<TimeTicks> {
        Replication::new(TimeTicks::new(0), TimeTicks::new(end)).unwrap()
    }

    #[test]
    fn events_execute_in_time_order() {
        let mut core = core_with(LoopPolicy::DiscreteEvent);
        core.initialize(TraceModel::default(), replication(10)).unwrap();
        for (t, name) in [(1, "a"), (3, "c"), (2, "b")] {
            core.schedule_at(
                TimeTicks::new(t),
                Priority::Normal,
                Box::new(move |m: &mut TraceModel, _ctx| m.executed.push(name)),
            )
            .unwrap();
        }

        run_to_completion(&mut core);
        let model = core.model.as_ref().unwrap();
        assert_eq!(model.executed, vec!["a", "b", "c"]);
        assert_eq!(core.run_state(), RunState::Ended);
        assert_eq!(core.replication_state(), ReplicationState::Ended);
    }

    #[test]
    fn empty_discrete_run_ends_without_advancing_time() {
        let mut core = core_with(LoopPolicy::DiscreteEvent);
        core.initialize(TraceModel::default(), replication(10)).unwrap();

        run_to_completion(&mut core);
        assert_eq!(core.time(), TimeTicks::new(0));
        assert_eq!(core.replication_state(), ReplicationState::Ended);
    }

    #[test]
    fn fixed_step_walks_the_clock_to_the_end() {
        let mut core = core_with(LoopPolicy::FixedStep { step: 3 });
        core.initialize(TraceModel::default(), replication(10)).unwrap();

        run_to_completion(&mut core);
        assert_eq!(core.time(), TimeTicks::new(10));
        assert_eq!(core.replication_state(), ReplicationState::Ended);
    }

    #[test]
    fn hybrid_drains_events_without_passing_the_step_boundary() {
        #[derive(Default)]
        struct Watcher {
            times: Mutex<Vec<TimeTicks>>,
        }
        impl crate::notify::SimulationListener<TimeTicks> for Watcher {
            fn on_notification(&self, n: &SimNotification<TimeTicks>) {
                if n.signal == SimSignal::TimeChanged {
                    self.times.lock().push(n.time);
                }
            }
        }

        let mut core = core_with(LoopPolicy::Hybrid { step: 4 });
        core.initialize(TraceModel::default(), replication(8)).unwrap();
        core.schedule_at(
            TimeTicks::new(3),
            Priority::Normal,
            Box::new(|m: &mut TraceModel, _ctx| m.executed.push("inside-step")),
        )
        .unwrap();
        let watcher = Arc::new(Watcher::default());
        core.subscribe(watcher.clone());

        run_to_completion(&mut core);
        assert_eq!(core.time(), TimeTicks::new(8));
        assert_eq!(core.model.as_ref().unwrap().executed, vec!["inside-step"]);
        // Clock visits the event time, then each step boundary in order.
        let times = watcher.times.lock();
        assert!(times.windows(2).all(|w| w[0] <= w[1]));
        assert!(times.contains(&TimeTicks::new(3)));
        assert!(times.contains(&TimeTicks::new(4)));
        assert_eq!(*times.last().unwrap(), TimeTicks::new(8));
    }

    #[test]
    fn run_until_exclusive_stops_before_the_bound_event() {
        let mut core = core_with(LoopPolicy::DiscreteEvent);
        core.initialize(TraceModel::default(), replication(10)).unwrap();
        core.schedule_at(
            TimeTicks::new(5),
            Priority::Normal,
            Box::new(|m: &mut TraceModel, _ctx| m.executed.push("at-bound")),
        )
        .unwrap();
        core.prepare_start(
            "run_up_to",
            Some(RunUntil {
                time: TimeTicks::new(5),
                inclusive: false,
            }),
        )
        .unwrap();
        core.begin_run();
        while core.advance_once() != StepOutcome::Finished {}

        assert_eq!(core.time(), TimeTicks::new(5));
        assert!(core.model.as_ref().unwrap().executed.is_empty());
        assert_eq!(core.run_state(), RunState::Stopped);
        assert_eq!(core.pending_events(), 1);
    }

    #[test]
    fn run_until_inclusive_executes_the_bound_event() {
        let mut core = core_with(LoopPolicy::DiscreteEvent);
        core.initialize(TraceModel::default(), replication(10)).unwrap();
        core.schedule_at(
            TimeTicks::new(5),
            Priority::Normal,
            Box::new(|m: &mut TraceModel, _ctx| m.executed.push("at-bound")),
        )
        .unwrap();
        core.schedule_at(
            TimeTicks::new(6),
            Priority::Normal,
            Box::new(|m: &mut TraceModel, _ctx| m.executed.push("past-bound")),
        )
        .unwrap();
        core.prepare_start(
            "run_up_to_and_including",
            Some(RunUntil {
                time: TimeTicks::new(5),
                inclusive: true,
            }),
        )
        .unwrap();
        core.begin_run();
        while core.advance_once() != StepOutcome::Finished {}

        assert_eq!(core.model.as_ref().unwrap().executed, vec!["at-bound"]);
        assert_eq!(core.time(), TimeTicks::new(5));
        assert_eq!(core.pending_events(), 1);
    }

    #[test]
    fn panicking_event_does_not_stop_the_run() {
        let mut core = core_with(LoopPolicy::DiscreteEvent);
        core.initialize(TraceModel::default(), replication(10)).unwrap();
        core.schedule_at(
            TimeTicks::new(1),
            Priority::Normal,
            Box::new(|_m: &mut TraceModel, _ctx| panic!("bad model event")),
        )
        .unwrap();
        core.schedule_at(
            TimeTicks::new(2),
            Priority::Normal,
            Box::new(|m: &mut TraceModel, _ctx| m.executed.push("survivor")),
        )
        .unwrap();

        run_to_completion(&mut core);
        assert_eq!(core.model.as_ref().unwrap().executed, vec!["survivor"]);
        assert_eq!(core.replication_state(), ReplicationState::Ended);
    }

    #[test]
    fn stop_request_leaves_the_run_resumable() {
        let mut core = core_with(LoopPolicy::DiscreteEvent);
        core.initialize(TraceModel::default(), replication(10)).unwrap();
        core.schedule_at(
            TimeTicks::new(1),
            Priority::Normal,
            Box::new(|m: &mut TraceModel, ctx| {
                m.executed.push("first");
                ctx.request_stop();
            }),
        )
        .unwrap();
        core.schedule_at(
            TimeTicks::new(2),
            Priority::Normal,
            Box::new(|m: &mut TraceModel, _ctx| m.executed.push("second")),
        )
        .unwrap();

        run_to_completion(&mut core);
        assert_eq!(core.run_state(), RunState::Stopped);
        assert_eq!(core.model.as_ref().unwrap().executed, vec!["first"]);

        // Resume picks up the remaining event.
        run_to_completion(&mut core);
        assert_eq!(
            core.model.as_ref().unwrap().executed,
            vec!["first", "second"]
        );
        assert_eq!(core.replication_state(), ReplicationState::Ended);
    }

    #[test]
    fn warmup_fires_once_when_the_clock_crosses_it() {
        #[derive(Default)]
        struct WarmupCounter {
            count: Mutex<u32>,
        }
        impl crate::notify::SimulationListener<TimeTicks> for WarmupCounter {
            fn on_notification(&self, n: &SimNotification<TimeTicks>) {
                if n.signal == SimSignal::Warmup {
                    *self.count.lock() += 1;
                }
            }
        }

        let mut core = core_with(LoopPolicy::FixedStep { step: 2 });
        core.initialize(
            TraceModel::default(),
            Replication::with_warmup(TimeTicks::new(0), TimeTicks::new(5), TimeTicks::new(10))
                .unwrap(),
        )
        .unwrap();
        let counter = Arc::new(WarmupCounter::default());
        core.subscribe(counter.clone());

        run_to_completion(&mut core);
        assert_eq!(*counter.count.lock(), 1);
    }

    #[test]
    fn failed_model_construction_rolls_back_initialize() {
        struct BadModel;
        impl Model<TimeTicks> for BadModel {
            fn construct_model(
                &mut self,
                ctx: &mut SimContext<'_, TimeTicks, Self>,
            ) -> Result<(), SimulatorError> {
                // Scheduling before the start time fails the constructor.
                ctx.schedule_at(TimeTicks::new(-1), Priority::Normal, |_m, _c| {})?;
                Ok(())
            }
        }

        let mut core: SimCore<TimeTicks, BadModel> =
            SimCore::new(LoopPolicy::DiscreteEvent, SimulatorConfig::default());
        let result = core.initialize(BadModel, replication(10));
        assert!(matches!(result, Err(SimulatorError::Scheduling(_))));

        // Nothing half-initialized survives the failure.
        assert_eq!(core.run_state(), RunState::NotInitialized);
        assert_eq!(core.replication_state(), ReplicationState::NotInitialized);
        assert_eq!(core.pending_events(), 0);
        assert!(matches!(
            core.prepare_start("start", None),
            Err(SimulatorError::NoReplication)
        ));
    }

    #[test]
    fn start_guards_reject_bad_states() {
        let mut core = core_with(LoopPolicy::DiscreteEvent);
        assert!(matches!(
            core.prepare_start("start", None),
            Err(SimulatorError::NoReplication)
        ));

        core.initialize(TraceModel::default(), replication(10)).unwrap();
        core.prepare_start("start", None).unwrap();
        assert!(matches!(
            core.prepare_start("start", None),
            Err(SimulatorError::InvalidState { .. })
        ));
    }

    #[test]
    fn step_executes_exactly_one_event() {
        let mut core = core_with(LoopPolicy::DiscreteEvent);
        core.initialize(TraceModel::default(), replication(10)).unwrap();
        for (t, name) in [(1, "a"), (2, "b")] {
            core.schedule_at(
                TimeTicks::new(t),
                Priority::Normal,
                Box::new(move |m: &mut TraceModel, _ctx| m.executed.push(name)),
            )
            .unwrap();
        }

        core.step().unwrap();
        assert_eq!(core.model.as_ref().unwrap().executed, vec!["a"]);
        assert_eq!(core.run_state(), RunState::Stopped);

        core.step().unwrap();
        assert_eq!(core.model.as_ref().unwrap().executed, vec!["a", "b"]);
    }

    #[test]
    fn step_on_ended_replication_is_rejected() {
        let mut core = core_with(LoopPolicy::DiscreteEvent);
        core.initialize(TraceModel::default(), replication(10)).unwrap();
        run_to_completion(&mut core);

        assert!(matches!(core.step(), Err(SimulatorError::Ended)));
    }

    #[test]
    fn finalize_is_idempotent() {
        let mut core = core_with(LoopPolicy::DiscreteEvent);
        core.initialize(TraceModel::default(), replication(10)).unwrap();
        struct Null;
        impl crate::notify::SimulationListener<TimeTicks> for Null {
            fn on_notification(&self, _n: &SimNotification<TimeTicks>) {}
        }
        core.subscribe(Arc::new(Null));

        core.finalize();
        let state_after_first = core.run_state();
        core.finalize();
        assert_eq!(core.run_state(), state_after_first);
        assert!(core.is_finalized());
    }
}
