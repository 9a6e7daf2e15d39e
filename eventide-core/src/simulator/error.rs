//! Simulator control errors.

use thiserror::Error;

use super::state::{ReplicationState, RunState};
use crate::events::SchedulingError;

/// Errors raised by simulator control operations.
///
/// State and scheduling violations abort the triggering call with the
/// violated precondition; model failures during event execution are
/// logged by the driver loop instead and never surface here.
#[derive(Debug, Error)]
pub enum SimulatorError {
    /// Operation invoked while the state machine is in an incompatible
    /// state.
    #[error(
        "{operation} not allowed (run state {run_state}, replication state {replication_state}): {reason}"
    )]
    InvalidState {
        /// Name of the rejected operation.
        operation: &'static str,
        /// Run state at the time of the call.
        run_state: RunState,
        /// Replication state at the time of the call.
        replication_state: ReplicationState,
        /// The violated precondition.
        reason: &'static str,
    },

    /// Control operation before any replication was bound.
    #[error("no replication bound; call initialize() first")]
    NoReplication,

    /// The replication has ended; only a fresh `initialize()` is legal.
    #[error("replication has ended; initialize() a new replication to continue")]
    Ended,

    /// Replication configuration violates `start <= warmup <= end`.
    #[error("invalid replication: {reason}")]
    InvalidReplication {
        /// What the configuration got wrong.
        reason: String,
    },

    /// The worker thread is gone (cleaned up or failed to spawn).
    #[error("simulator worker unavailable: {reason}")]
    WorkerUnavailable {
        /// Why the worker cannot serve the request.
        reason: String,
    },

    /// Scheduling failure surfaced at the call site.
    #[error(transparent)]
    Scheduling(#[from] SchedulingError),
}
