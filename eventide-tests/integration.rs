//! Integration tests for Eventide
//!
//! These tests drive the simulator through its public facade, worker
//! thread included, and check the contracts that matter across module
//! boundaries: execution order, state-machine legality, run bounds,
//! notification sequences and cleanup.

#[path = "integration/support.rs"]
mod support;

#[path = "integration/event_ordering.rs"]
mod event_ordering;

#[path = "integration/state_machine.rs"]
mod state_machine;

#[path = "integration/run_bounds.rs"]
mod run_bounds;

#[path = "integration/driver_loops.rs"]
mod driver_loops;

#[path = "integration/notifications.rs"]
mod notifications;

#[path = "integration/cancellation.rs"]
mod cancellation;

#[path = "integration/cleanup.rs"]
mod cleanup;

#[path = "integration/determinism.rs"]
mod determinism;

#[path = "integration/calendar_time.rs"]
mod calendar_time;
