//! Bounded runs: `run_up_to` (exclusive) and `run_up_to_and_including`.

use eventide_core::events::Priority;
use eventide_core::simulator::{LoopPolicy, RunState, Simulator};

use crate::support::{LogModel, WAIT, mark, replication, ticks};

#[test]
fn run_up_to_leaves_events_at_the_bound_pending() {
    let sim = Simulator::new(LoopPolicy::DiscreteEvent).unwrap();
    let (model, log) = LogModel::new();
    sim.initialize(model, replication(10)).unwrap();

    sim.schedule_event_at(ticks(3), Priority::Normal, mark("before"))
        .unwrap();
    sim.schedule_event_at(ticks(5), Priority::Normal, mark("at-bound"))
        .unwrap();

    sim.run_up_to(ticks(5)).unwrap();
    assert!(sim.wait_until_stopped(WAIT));

    assert_eq!(*log.lock(), vec!["before"]);
    assert_eq!(sim.simulator_time(), ticks(5));
    assert_eq!(sim.run_state(), RunState::Stopped);
    assert_eq!(sim.pending_events(), 1);
}

#[test]
fn run_up_to_and_including_executes_events_at_the_bound() {
    let sim = Simulator::new(LoopPolicy::DiscreteEvent).unwrap();
    let (model, log) = LogModel::new();
    sim.initialize(model, replication(10)).unwrap();

    sim.schedule_event_at(ticks(5), Priority::Normal, mark("at-bound"))
        .unwrap();
    sim.schedule_event_at(ticks(6), Priority::Normal, mark("past-bound"))
        .unwrap();

    sim.run_up_to_and_including(ticks(5)).unwrap();
    assert!(sim.wait_until_stopped(WAIT));

    assert_eq!(*log.lock(), vec!["at-bound"]);
    assert_eq!(sim.simulator_time(), ticks(5));
    assert_eq!(sim.run_state(), RunState::Stopped);
    assert_eq!(sim.pending_events(), 1);
}

#[test]
fn bounded_run_resumes_to_the_end() {
    let sim = Simulator::new(LoopPolicy::DiscreteEvent).unwrap();
    let (model, log) = LogModel::new();
    sim.initialize(model, replication(10)).unwrap();

    sim.schedule_event_at(ticks(2), Priority::Normal, mark("early"))
        .unwrap();
    sim.schedule_event_at(ticks(7), Priority::Normal, mark("late"))
        .unwrap();

    sim.run_up_to(ticks(5)).unwrap();
    assert!(sim.wait_until_stopped(WAIT));
    assert_eq!(*log.lock(), vec!["early"]);

    // A plain start afterwards is unbounded again.
    sim.start().unwrap();
    assert!(sim.wait_until_stopped(WAIT));
    assert_eq!(*log.lock(), vec!["early", "late"]);
    assert_eq!(sim.run_state(), RunState::Ended);
}

#[test]
fn bound_past_the_end_behaves_like_start() {
    let sim = Simulator::new(LoopPolicy::FixedStep { step: 3 }).unwrap();
    let (model, _log) = LogModel::new();
    sim.initialize(model, replication(10)).unwrap();

    sim.run_up_to(ticks(50)).unwrap();
    assert!(sim.wait_until_stopped(WAIT));

    // The clock never overshoots the replication end.
    assert_eq!(sim.simulator_time(), ticks(10));
    assert_eq!(sim.run_state(), RunState::Ended);
}

#[test]
fn fixed_step_respects_the_bound_exactly() {
    let sim = Simulator::new(LoopPolicy::FixedStep { step: 4 }).unwrap();
    let (model, _log) = LogModel::new();
    sim.initialize(model, replication(20)).unwrap();

    // 0 -> 4 -> 7: the final step is clamped to the bound.
    sim.run_up_to(ticks(7)).unwrap();
    assert!(sim.wait_until_stopped(WAIT));

    assert_eq!(sim.simulator_time(), ticks(7));
    assert_eq!(sim.run_state(), RunState::Stopped);
}
