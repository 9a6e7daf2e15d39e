//! Behavioural differences between the four driver-loop strategies.

use std::time::Duration;

use eventide_core::events::Priority;
use eventide_core::notify::SimSignal;
use eventide_core::simulator::{LoopPolicy, ReplicationState, RunState, Simulator};
use std::sync::Arc;

use crate::support::{LogModel, SignalRecorder, WAIT, mark, replication, ticks};

#[test]
fn discrete_loop_with_no_events_ends_at_the_unchanged_time() {
    let sim = Simulator::new(LoopPolicy::DiscreteEvent).unwrap();
    let (model, _log) = LogModel::new();
    sim.initialize(model, replication(10)).unwrap();

    sim.start().unwrap();
    assert!(sim.wait_until_stopped(WAIT));

    // No events means nothing moves the clock; the replication just
    // ends where it started.
    assert_eq!(sim.simulator_time(), ticks(0));
    assert_eq!(sim.replication_state(), ReplicationState::Ended);
}

#[test]
fn fixed_step_loop_with_no_events_walks_to_the_end() {
    let sim = Simulator::new(LoopPolicy::FixedStep { step: 2 }).unwrap();
    let (model, _log) = LogModel::new();
    sim.initialize(model, replication(10)).unwrap();

    sim.start().unwrap();
    assert!(sim.wait_until_stopped(WAIT));

    assert_eq!(sim.simulator_time(), ticks(10));
    assert_eq!(sim.replication_state(), ReplicationState::Ended);
}

#[test]
fn fixed_step_ignores_the_event_list() {
    let sim = Simulator::new(LoopPolicy::FixedStep { step: 5 }).unwrap();
    let (model, log) = LogModel::new();
    sim.initialize(model, replication(10)).unwrap();
    sim.schedule_event_at(ticks(3), Priority::Normal, mark("ignored"))
        .unwrap();

    sim.start().unwrap();
    assert!(sim.wait_until_stopped(WAIT));

    assert!(log.lock().is_empty());
    assert_eq!(sim.simulator_time(), ticks(10));
}

#[test]
fn hybrid_executes_events_between_step_boundaries() {
    let sim = Simulator::new(LoopPolicy::Hybrid { step: 4 }).unwrap();
    let (model, log) = LogModel::new();
    sim.initialize(model, replication(8)).unwrap();

    sim.schedule_event_at(ticks(3), Priority::Normal, mark("inside-first-step"))
        .unwrap();
    sim.schedule_event_at(ticks(6), Priority::Normal, mark("inside-second-step"))
        .unwrap();

    let recorder = Arc::new(SignalRecorder::default());
    sim.subscribe_filtered(&[SimSignal::TimeChanged], recorder.clone());

    sim.start().unwrap();
    assert!(sim.wait_until_stopped(WAIT));

    assert_eq!(*log.lock(), vec!["inside-first-step", "inside-second-step"]);
    assert_eq!(sim.simulator_time(), ticks(8));
    assert_eq!(sim.replication_state(), ReplicationState::Ended);

    // The clock visits event times and step boundaries, in order.
    let times = recorder.times_of(SimSignal::TimeChanged);
    assert!(times.windows(2).all(|w| w[0] <= w[1]));
    assert!(times.contains(&ticks(3)));
    assert!(times.contains(&ticks(4)));
    assert!(times.contains(&ticks(6)));
    assert_eq!(times.last(), Some(&ticks(8)));
}

#[test]
fn throttled_loop_batches_equal_time_events() {
    let sim = Simulator::new(LoopPolicy::Throttled).unwrap();
    sim.set_animation_delay(Duration::from_millis(1));
    let (model, log) = LogModel::new();
    sim.initialize(model, replication(10)).unwrap();

    sim.schedule_event_at(ticks(1), Priority::Normal, mark("batch1-a"))
        .unwrap();
    sim.schedule_event_at(ticks(1), Priority::Normal, mark("batch1-b"))
        .unwrap();
    sim.schedule_event_at(ticks(2), Priority::Normal, mark("batch2"))
        .unwrap();

    let recorder = Arc::new(SignalRecorder::default());
    sim.subscribe_filtered(&[SimSignal::UpdateAnimation], recorder.clone());

    sim.start().unwrap();
    assert!(sim.wait_until_stopped(WAIT));

    assert_eq!(*log.lock(), vec!["batch1-a", "batch1-b", "batch2"]);
    // One animation update per distinct event time.
    assert_eq!(recorder.times_of(SimSignal::UpdateAnimation), vec![ticks(1), ticks(2)]);
    assert_eq!(sim.replication_state(), ReplicationState::Ended);
}

#[test]
fn throttled_stop_during_frame_delay_is_prompt() {
    let sim = Simulator::new(LoopPolicy::Throttled).unwrap();
    sim.set_animation_delay(Duration::from_secs(60));
    let (model, log) = LogModel::new();
    sim.initialize(model, replication(10)).unwrap();

    sim.schedule_event_at(ticks(1), Priority::Normal, mark("first"))
        .unwrap();
    sim.schedule_event_at(ticks(2), Priority::Normal, mark("second"))
        .unwrap();

    sim.start().unwrap();
    assert!(crate::support::wait_for(|| sim.simulator_time() == ticks(1)));

    // The worker is asleep in a 60s frame delay; the stop wakes it.
    sim.stop().unwrap();
    assert!(sim.wait_until_stopped(WAIT));

    assert_eq!(*log.lock(), vec!["first"]);
    assert_eq!(sim.run_state(), RunState::Stopped);
    assert_eq!(sim.pending_events(), 1);
}
