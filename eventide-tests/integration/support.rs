//! Shared fixtures for the integration suite.

use std::sync::Arc;
use std::time::Duration;

use parking_lot::Mutex;

use eventide_core::notify::{SimNotification, SimSignal, SimulationListener};
use eventide_core::simulator::{Model, Replication, SimContext, SimulatorError};
use eventide_core::time::TimeTicks;

/// Generous bound for waiting on the worker thread.
pub const WAIT: Duration = Duration::from_secs(10);

/// Polls `condition` until it holds or `WAIT` elapses.
pub fn wait_for(condition: impl Fn() -> bool) -> bool {
    let deadline = std::time::Instant::now() + WAIT;
    while std::time::Instant::now() < deadline {
        if condition() {
            return true;
        }
        std::thread::sleep(Duration::from_millis(1));
    }
    condition()
}

/// Model whose events append labels to a shared log.
pub struct LogModel {
    pub log: Arc<Mutex<Vec<String>>>,
}

impl LogModel {
    pub fn new() -> (Self, Arc<Mutex<Vec<String>>>) {
        let log = Arc::new(Mutex::new(Vec::new()));
        (Self { log: log.clone() }, log)
    }
}

impl Model<TimeTicks> for LogModel {
    fn construct_model(
        &mut self,
        _ctx: &mut SimContext<'_, TimeTicks, Self>,
    ) -> Result<(), SimulatorError> {
        Ok(())
    }
}

/// An action that appends `label` to the model's log.
pub fn mark(
    label: &'static str,
) -> impl FnOnce(&mut LogModel, &mut SimContext<'_, TimeTicks, LogModel>) + Send + 'static {
    move |model, _ctx| model.log.lock().push(label.to_string())
}

pub fn ticks(value: i64) -> TimeTicks {
    TimeTicks::new(value)
}

pub fn replication(end: i64) -> Replication<TimeTicks> {
    Replication::new(ticks(0), ticks(end)).expect("valid replication")
}

/// Listener recording every notification it receives.
#[derive(Default)]
pub struct SignalRecorder {
    pub seen: Mutex<Vec<(SimSignal, TimeTicks)>>,
}

impl SignalRecorder {
    pub fn signals(&self) -> Vec<SimSignal> {
        self.seen.lock().iter().map(|(signal, _)| *signal).collect()
    }

    pub fn times_of(&self, signal: SimSignal) -> Vec<TimeTicks> {
        self.seen
            .lock()
            .iter()
            .filter(|(s, _)| *s == signal)
            .map(|(_, t)| *t)
            .collect()
    }
}

impl SimulationListener<TimeTicks> for SignalRecorder {
    fn on_notification(&self, notification: &SimNotification<TimeTicks>) {
        self.seen
            .lock()
            .push((notification.signal, notification.time));
    }
}
