//! Worker thread driving the simulator loop.
//!
//! The worker blocks on a channel between runs. `start`/`stop` wake it
//! with a message instead of interrupting it; the throttled loop's
//! frame delay is a `recv_timeout` on the same channel, so a stop or
//! cleanup cancels the sleep promptly. Dropping the sender disconnects
//! the channel, which is the shutdown signal.

use std::sync::Arc;
use std::sync::mpsc::{self, RecvTimeoutError};
use std::thread;

use parking_lot::{Condvar, Mutex};

use crate::time::SimTime;

use super::Model;
use super::core::{SimCore, StepOutcome};
use super::state::RunState;

/// State shared between the facade and the worker thread.
///
/// The condvar is signalled whenever the worker goes idle, so callers
/// can block until a run finishes without polling.
pub(super) struct Shared<T: SimTime, M: Model<T>> {
    pub core: Mutex<SimCore<T, M>>,
    pub idle: Condvar,
}

enum WorkerSignal {
    Wake,
}

pub(super) struct Worker {
    sender: Option<mpsc::Sender<WorkerSignal>>,
    thread: Option<thread::JoinHandle<()>>,
}

impl Worker {
    /// Spawns the worker thread for a simulator.
    ///
    /// # Errors
    ///
    /// Returns the OS error if the thread cannot be spawned.
    pub fn spawn<T: SimTime, M: Model<T>>(
        shared: Arc<Shared<T, M>>,
    ) -> std::io::Result<Self> {
        let (sender, receiver) = mpsc::channel();
        let thread = thread::Builder::new()
            .name("eventide-worker".to_string())
            .spawn(move || worker_loop(shared, receiver))?;
        Ok(Self {
            sender: Some(sender),
            thread: Some(thread),
        })
    }

    /// Wakes the worker. Returns false once the worker is shut down.
    pub fn wake(&self) -> bool {
        match &self.sender {
            Some(sender) => sender.send(WorkerSignal::Wake).is_ok(),
            None => false,
        }
    }

    /// Disconnects the channel and joins the thread. Idempotent.
    pub fn finalize(&mut self) {
        drop(self.sender.take());
        if let Some(thread) = self.thread.take() {
            if thread.join().is_err() {
                tracing::warn!("simulator worker panicked during shutdown");
            }
        }
    }
}

impl Drop for Worker {
    fn drop(&mut self) {
        self.finalize();
    }
}

fn worker_loop<T: SimTime, M: Model<T>>(
    shared: Arc<Shared<T, M>>,
    receiver: mpsc::Receiver<WorkerSignal>,
) {
    tracing::debug!("simulator worker started");
    loop {
        if receiver.recv().is_err() {
            break;
        }
        let proceed = {
            let mut core = shared.core.lock();
            if core.is_finalized() {
                break;
            }
            match core.run_state() {
                RunState::Starting => {
                    core.begin_run();
                    true
                }
                // Stop raced ahead of the start wake; settle it here.
                RunState::Stopping => {
                    core.finish_stop();
                    false
                }
                _ => false,
            }
        };
        if proceed {
            drive(&shared, &receiver);
        }
        shared.idle.notify_all();
    }
    shared.idle.notify_all();
    tracing::debug!("simulator worker stopped");
}

/// Runs the driver loop to completion, taking the lock once per
/// iteration so control calls interleave with event execution.
fn drive<T: SimTime, M: Model<T>>(
    shared: &Arc<Shared<T, M>>,
    receiver: &mpsc::Receiver<WorkerSignal>,
) {
    loop {
        let outcome = shared.core.lock().advance_once();
        match outcome {
            StepOutcome::Progressed => {}
            StepOutcome::SleepThen(delay) => {
                match receiver.recv_timeout(delay) {
                    // A wake during the frame delay skips the rest of
                    // it; the next advance_once observes whatever state
                    // change caused it.
                    Ok(WorkerSignal::Wake) | Err(RecvTimeoutError::Timeout) => {}
                    Err(RecvTimeoutError::Disconnected) => break,
                }
            }
            StepOutcome::Finished => break,
        }
    }
}
