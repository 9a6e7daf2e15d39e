//! Cleanup, drop behaviour and post-cleanup rejection.

use std::sync::Arc;

use eventide_core::events::Priority;
use eventide_core::simulator::{LoopPolicy, Simulator, SimulatorError};

use crate::support::{LogModel, SignalRecorder, WAIT, mark, replication, ticks};

#[test]
fn clean_up_is_idempotent() {
    let mut sim = Simulator::new(LoopPolicy::DiscreteEvent).unwrap();
    let (model, _log) = LogModel::new();
    sim.initialize(model, replication(10)).unwrap();

    sim.clean_up();
    sim.clean_up();
    sim.clean_up();
}

#[test]
fn control_calls_after_clean_up_are_rejected() {
    let mut sim = Simulator::new(LoopPolicy::DiscreteEvent).unwrap();
    let (model, _log) = LogModel::new();
    sim.initialize(model, replication(10)).unwrap();
    sim.clean_up();

    assert!(matches!(
        sim.start(),
        Err(SimulatorError::WorkerUnavailable { .. })
    ));
    assert!(matches!(
        sim.step(),
        Err(SimulatorError::WorkerUnavailable { .. })
    ));
    let (model, _log) = LogModel::new();
    assert!(matches!(
        sim.initialize(model, replication(10)),
        Err(SimulatorError::WorkerUnavailable { .. })
    ));
}

#[test]
fn clean_up_detaches_listeners() {
    let mut sim: Simulator<_, LogModel> = Simulator::new(LoopPolicy::DiscreteEvent).unwrap();
    let recorder = Arc::new(SignalRecorder::default());
    sim.subscribe(recorder.clone());

    sim.clean_up();
    // The only way a detached listener could still fire is a bug; the
    // recorder saw nothing before and sees nothing after.
    assert!(recorder.seen.lock().is_empty());
}

#[test]
fn drop_mid_run_does_not_hang() {
    let sim = Simulator::new(LoopPolicy::DiscreteEvent).unwrap();
    let (model, _log) = LogModel::new();
    sim.initialize(model, replication(1_000_000)).unwrap();

    // A self-perpetuating event chain that would run for a long time.
    fn tick(model: &mut LogModel, ctx: &mut eventide_core::simulator::SimContext<'_, eventide_core::time::TimeTicks, LogModel>) {
        let _ = model;
        let _ = ctx.schedule(1, Priority::Normal, tick);
    }
    sim.schedule_event_at(ticks(1), Priority::Normal, tick).unwrap();

    sim.start().unwrap();
    // Dropping while the worker is mid-run must stop the loop and join.
    drop(sim);
}

#[test]
fn completed_runs_leave_a_clean_drop() {
    let sim = Simulator::new(LoopPolicy::DiscreteEvent).unwrap();
    let (model, log) = LogModel::new();
    sim.initialize(model, replication(10)).unwrap();
    sim.schedule_event_at(ticks(1), Priority::Normal, mark("only"))
        .unwrap();

    sim.start().unwrap();
    assert!(sim.wait_until_stopped(WAIT));
    assert_eq!(*log.lock(), vec!["only"]);
    drop(sim);
}
