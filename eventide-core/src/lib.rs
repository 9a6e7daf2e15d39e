//! Eventide Core - Discrete-event simulation engine
//!
//! This crate provides the building blocks for event-driven simulation:
//! a time-ordered event list, a simulator with a run/replication state
//! machine and pluggable driver loops, a family of simulation-time
//! representations, and a notification bus for observers.

pub mod config;
pub mod events;
pub mod logging;
pub mod notify;
pub mod rng;
pub mod simulator;
pub mod time;

// Re-export main types for convenient access
pub use config::SimulatorConfig;
pub use events::{EventHandle, EventList, Priority, SchedulingError};
pub use notify::{SimNotification, SimSignal, SimulationListener, SubscriptionId};
pub use rng::SimRng;
pub use simulator::{
    Action, LoopPolicy, Model, Replication, ReplicationState, RunState, SimContext, Simulator,
    SimulatorError,
};
pub use time::{SimTime, TimeCalendar, TimeF32, TimeF64, TimeSpan, TimeTicks};

/// Errors that can bubble up from any Eventide subsystem.
#[derive(Debug, thiserror::Error)]
pub enum EventideError {
    #[error("Simulator error: {0}")]
    Simulator(#[from] SimulatorError),

    #[error("Scheduling error: {0}")]
    Scheduling(#[from] SchedulingError),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

pub type Result<T> = std::result::Result<T, EventideError>;
