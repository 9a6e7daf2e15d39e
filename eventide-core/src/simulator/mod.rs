//! Event-driven simulator with pluggable driver loops.
//!
//! [`Simulator`] owns a worker thread, a lock-protected core and a
//! notification bus. A run binds a [`Model`] to a [`Replication`] via
//! `initialize`, then `start`/`step`/`stop` drive the state machine.
//! Four [`LoopPolicy`] strategies decide how the clock advances: pure
//! discrete-event, fixed time steps, a hybrid of both, and a throttled
//! animation loop that sleeps between equal-time batches.
//!
//! Control methods return immediately; the loop itself executes on the
//! worker thread. `wait_until_stopped` blocks until the worker goes
//! idle again.

mod context;
mod core;
mod error;
mod replication;
mod state;
mod worker;

use std::sync::Arc;
use std::time::{Duration, Instant};

use parking_lot::{Condvar, Mutex};

use crate::config::SimulatorConfig;
use crate::events::{EventHandle, Priority};
use crate::notify::{SimSignal, SimulationListener, SubscriptionId};
use crate::time::SimTime;

pub use context::{Action, SimContext};
pub use error::SimulatorError;
pub use replication::Replication;
pub use state::{ReplicationState, RunState};

use self::core::{RunUntil, SimCore};
use self::worker::{Shared, Worker};

/// A simulation model: state plus the events that mutate it.
///
/// `construct_model` runs during `initialize` and schedules the model's
/// initial events; everything after that is event-driven.
pub trait Model<T: SimTime>: Sized + Send + 'static {
    /// Builds the model's starting condition.
    ///
    /// # Errors
    ///
    /// Returns an error to abort initialization, typically a
    /// [`SimulatorError::Scheduling`] from seeding the event list.
    fn construct_model(
        &mut self,
        ctx: &mut SimContext<'_, T, Self>,
    ) -> Result<(), SimulatorError>;
}

/// How the driver loop advances the clock.
#[derive(Debug, Clone)]
pub enum LoopPolicy<T: SimTime> {
    /// Jump from event to event; idle spans cost nothing.
    DiscreteEvent,
    /// Advance in fixed increments, ignoring the event list.
    FixedStep { step: T::Delta },
    /// Fixed increments, draining due events inside each step first.
    Hybrid { step: T::Delta },
    /// Discrete-event batches with a real-time delay between distinct
    /// event times, for animated front ends.
    Throttled,
}

/// Thread-safe simulator facade.
///
/// All methods take `&self`; the core is behind a mutex shared with the
/// worker thread. Dropping the simulator (or calling `clean_up`) stops
/// the loop, detaches every listener and joins the worker.
pub struct Simulator<T: SimTime, M: Model<T>> {
    shared: Arc<Shared<T, M>>,
    worker: Worker,
}

impl<T: SimTime, M: Model<T>> Simulator<T, M> {
    /// Creates a simulator with the default configuration.
    ///
    /// # Errors
    ///
    /// - `SimulatorError::WorkerUnavailable` - the worker thread could
    ///   not be spawned
    pub fn new(policy: LoopPolicy<T>) -> Result<Self, SimulatorError> {
        Self::with_config(policy, SimulatorConfig::default())
    }

    /// Creates a simulator with an explicit configuration.
    ///
    /// # Errors
    ///
    /// Same as [`Simulator::new`].
    pub fn with_config(
        policy: LoopPolicy<T>,
        config: SimulatorConfig,
    ) -> Result<Self, SimulatorError> {
        let shared = Arc::new(Shared {
            core: Mutex::new(SimCore::new(policy, config)),
            idle: Condvar::new(),
        });
        let worker = Worker::spawn(Arc::clone(&shared)).map_err(|source| {
            SimulatorError::WorkerUnavailable {
                reason: format!("failed to spawn worker thread: {source}"),
            }
        })?;
        Ok(Self { shared, worker })
    }

    /// Binds a model and replication and constructs the model's initial
    /// events. Legal from any non-running state, including after a
    /// previous replication ended.
    ///
    /// # Errors
    ///
    /// See [`SimulatorError`]; rejected while a run is in progress.
    pub fn initialize(&self, model: M, replication: Replication<T>) -> Result<(), SimulatorError> {
        self.shared.core.lock().initialize(model, replication)
    }

    /// Starts (or resumes) the driver loop, running until the
    /// replication ends or a stop is requested.
    ///
    /// # Errors
    ///
    /// See [`SimulatorError`]; rejected when already running, before
    /// `initialize`, or once the replication has ended.
    pub fn start(&self) -> Result<(), SimulatorError> {
        self.start_with("start", None)
    }

    /// Runs until the clock reaches `time`; events at exactly `time`
    /// stay pending.
    ///
    /// # Errors
    ///
    /// Same as [`Simulator::start`].
    pub fn run_up_to(&self, time: T) -> Result<(), SimulatorError> {
        self.start_with(
            "run_up_to",
            Some(RunUntil {
                time,
                inclusive: false,
            }),
        )
    }

    /// Runs until the clock reaches `time`, executing events at exactly
    /// `time` before stopping.
    ///
    /// # Errors
    ///
    /// Same as [`Simulator::start`].
    pub fn run_up_to_and_including(&self, time: T) -> Result<(), SimulatorError> {
        self.start_with(
            "run_up_to_and_including",
            Some(RunUntil {
                time,
                inclusive: true,
            }),
        )
    }

    fn start_with(
        &self,
        operation: &'static str,
        run_until: Option<RunUntil<T>>,
    ) -> Result<(), SimulatorError> {
        self.shared.core.lock().prepare_start(operation, run_until)?;
        if !self.worker.wake() {
            let mut core = self.shared.core.lock();
            core.finish_stop();
            return Err(SimulatorError::WorkerUnavailable {
                reason: "worker thread is shut down".to_string(),
            });
        }
        Ok(())
    }

    /// Executes exactly one loop iteration synchronously on the calling
    /// thread, then stops.
    ///
    /// # Errors
    ///
    /// Same preconditions as [`Simulator::start`].
    pub fn step(&self) -> Result<(), SimulatorError> {
        self.shared.core.lock().step()
    }

    /// Requests the running loop to stop at the next iteration
    /// boundary. Returns before the loop has necessarily exited; use
    /// [`Simulator::wait_until_stopped`] to synchronize.
    ///
    /// # Errors
    ///
    /// - `SimulatorError::InvalidState` - not running, or already
    ///   stopping/stopped
    pub fn stop(&self) -> Result<(), SimulatorError> {
        self.shared.core.lock().request_stop()?;
        self.worker.wake();
        Ok(())
    }

    /// Blocks until the driver loop is idle, up to `timeout`. Returns
    /// whether the loop is idle.
    pub fn wait_until_stopped(&self, timeout: Duration) -> bool {
        let deadline = Instant::now() + timeout;
        let mut core = self.shared.core.lock();
        while core.run_state().is_running() || core.run_state() == RunState::Stopping {
            if self
                .shared
                .idle
                .wait_until(&mut core, deadline)
                .timed_out()
            {
                break;
            }
        }
        !(core.run_state().is_running() || core.run_state() == RunState::Stopping)
    }

    /// Schedules an action at an absolute simulation time.
    ///
    /// # Errors
    ///
    /// - `SimulatorError::NoReplication` - before `initialize`
    /// - `SimulatorError::Ended` - the replication already ended
    /// - `SimulatorError::Scheduling` - past time or queue overflow
    pub fn schedule_event_at<F>(
        &self,
        time: T,
        priority: Priority,
        action: F,
    ) -> Result<EventHandle, SimulatorError>
    where
        F: FnOnce(&mut M, &mut SimContext<'_, T, M>) + Send + 'static,
    {
        self.shared
            .core
            .lock()
            .schedule_at(time, priority, Box::new(action))
    }

    /// Schedules an action a relative delay after the current time.
    ///
    /// # Errors
    ///
    /// Same as [`Simulator::schedule_event_at`].
    pub fn schedule_event<F>(
        &self,
        delay: T::Delta,
        priority: Priority,
        action: F,
    ) -> Result<EventHandle, SimulatorError>
    where
        F: FnOnce(&mut M, &mut SimContext<'_, T, M>) + Send + 'static,
    {
        self.shared
            .core
            .lock()
            .schedule_after(delay, priority, Box::new(action))
    }

    /// Schedules an action at the current simulation time.
    ///
    /// # Errors
    ///
    /// Same as [`Simulator::schedule_event_at`].
    pub fn schedule_event_now<F>(
        &self,
        priority: Priority,
        action: F,
    ) -> Result<EventHandle, SimulatorError>
    where
        F: FnOnce(&mut M, &mut SimContext<'_, T, M>) + Send + 'static,
    {
        let mut core = self.shared.core.lock();
        let now = core.time();
        core.schedule_at(now, priority, Box::new(action))
    }

    /// Cancels a pending event. Returns whether it was still pending.
    pub fn cancel_event(&self, handle: EventHandle) -> bool {
        self.shared.core.lock().cancel(handle)
    }

    /// Current simulation time.
    pub fn simulator_time(&self) -> T {
        self.shared.core.lock().time()
    }

    pub fn run_state(&self) -> RunState {
        self.shared.core.lock().run_state()
    }

    pub fn replication_state(&self) -> ReplicationState {
        self.shared.core.lock().replication_state()
    }

    /// Number of events still pending in the event list.
    pub fn pending_events(&self) -> usize {
        self.shared.core.lock().pending_events()
    }

    /// Subscribes a listener to every signal.
    pub fn subscribe(&self, listener: Arc<dyn SimulationListener<T>>) -> SubscriptionId {
        self.shared.core.lock().subscribe(listener)
    }

    /// Subscribes a listener to a subset of signals.
    pub fn subscribe_filtered(
        &self,
        signals: &[SimSignal],
        listener: Arc<dyn SimulationListener<T>>,
    ) -> SubscriptionId {
        self.shared.core.lock().subscribe_filtered(signals, listener)
    }

    /// Removes a subscription. Returns whether it was present.
    pub fn unsubscribe(&self, id: SubscriptionId) -> bool {
        self.shared.core.lock().unsubscribe(id)
    }

    /// Reconfigures the throttled loop's frame delay. Takes effect from
    /// the next batch; fires `AnimationDelayChanged`.
    pub fn set_animation_delay(&self, delay: Duration) {
        self.shared.core.lock().set_animation_delay(delay);
    }

    pub fn animation_delay(&self) -> Duration {
        self.shared.core.lock().animation_delay()
    }

    /// Stops the loop, detaches every listener, and joins the worker
    /// thread. Idempotent; every control method afterwards returns
    /// `WorkerUnavailable`.
    pub fn clean_up(&mut self) {
        self.shared.core.lock().finalize();
        self.worker.finalize();
        self.shared.idle.notify_all();
    }
}

impl<T: SimTime, M: Model<T>> Drop for Simulator<T, M> {
    fn drop(&mut self) {
        self.clean_up();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::time::TimeTicks;

    struct EmptyModel;

    impl Model<TimeTicks> for EmptyModel {
        fn construct_model(
            &mut self,
            ctx: &mut SimContext<'_, TimeTicks, Self>,
        ) -> Result<(), SimulatorError> {
            ctx.schedule_at(TimeTicks::new(5), Priority::Normal, |_m, _c| {})?;
            Ok(())
        }
    }

    #[test]
    fn start_runs_to_the_end_on_the_worker() {
        let sim = Simulator::new(LoopPolicy::DiscreteEvent).unwrap();
        sim.initialize(
            EmptyModel,
            Replication::new(TimeTicks::new(0), TimeTicks::new(10)).unwrap(),
        )
        .unwrap();

        sim.start().unwrap();
        assert!(sim.wait_until_stopped(Duration::from_secs(5)));
        assert_eq!(sim.run_state(), RunState::Ended);
        assert_eq!(sim.simulator_time(), TimeTicks::new(5));
    }

    #[test]
    fn control_calls_fail_after_clean_up() {
        let mut sim = Simulator::new(LoopPolicy::DiscreteEvent).unwrap();
        sim.initialize(
            EmptyModel,
            Replication::new(TimeTicks::new(0), TimeTicks::new(10)).unwrap(),
        )
        .unwrap();

        sim.clean_up();
        sim.clean_up();
        assert!(matches!(
            sim.start(),
            Err(SimulatorError::WorkerUnavailable { .. })
        ));
    }
}
