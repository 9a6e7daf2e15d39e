//! Notification sequences over a run's lifecycle.

use std::sync::Arc;
use std::time::Duration;

use eventide_core::events::Priority;
use eventide_core::notify::SimSignal;
use eventide_core::simulator::{LoopPolicy, Replication, Simulator};

use crate::support::{LogModel, SignalRecorder, WAIT, mark, replication, ticks, wait_for};

#[test]
fn full_run_fires_the_lifecycle_in_order() {
    let sim = Simulator::new(LoopPolicy::DiscreteEvent).unwrap();
    let (model, _log) = LogModel::new();
    sim.initialize(model, replication(10)).unwrap();
    sim.schedule_event_at(ticks(5), Priority::Normal, mark("only"))
        .unwrap();

    let recorder = Arc::new(SignalRecorder::default());
    sim.subscribe(recorder.clone());

    sim.start().unwrap();
    assert!(sim.wait_until_stopped(WAIT));

    let signals = recorder.signals();
    // Warmup defaults to the start time, so it fires right after the
    // replication begins.
    assert_eq!(
        &signals[..3],
        &[
            SimSignal::Started,
            SimSignal::StartOfReplication,
            SimSignal::Warmup
        ]
    );
    assert_eq!(
        &signals[signals.len() - 2..],
        &[SimSignal::EndOfReplication, SimSignal::Stopped]
    );
    assert!(signals.contains(&SimSignal::TimeChanged));
}

#[test]
fn time_changed_never_goes_backwards() {
    let sim = Simulator::new(LoopPolicy::Hybrid { step: 3 }).unwrap();
    let (model, _log) = LogModel::new();
    sim.initialize(model, replication(20)).unwrap();
    for t in [7, 2, 13, 2] {
        sim.schedule_event_at(ticks(t), Priority::Normal, mark("e"))
            .unwrap();
    }

    let recorder = Arc::new(SignalRecorder::default());
    sim.subscribe_filtered(&[SimSignal::TimeChanged], recorder.clone());

    sim.start().unwrap();
    assert!(sim.wait_until_stopped(WAIT));

    let times = recorder.times_of(SimSignal::TimeChanged);
    assert!(!times.is_empty());
    assert!(times.windows(2).all(|w| w[0] <= w[1]));
}

#[test]
fn warmup_fires_exactly_once_at_the_crossing() {
    let sim = Simulator::new(LoopPolicy::FixedStep { step: 2 }).unwrap();
    let (model, _log) = LogModel::new();
    sim.initialize(
        model,
        Replication::with_warmup(ticks(0), ticks(5), ticks(10)).unwrap(),
    )
    .unwrap();

    let recorder = Arc::new(SignalRecorder::default());
    sim.subscribe_filtered(&[SimSignal::Warmup], recorder.clone());

    sim.start().unwrap();
    assert!(sim.wait_until_stopped(WAIT));

    let warmups = recorder.times_of(SimSignal::Warmup);
    assert_eq!(warmups.len(), 1);
    // Steps land on even ticks; the crossing is observed at 6.
    assert_eq!(warmups[0], ticks(6));
}

#[test]
fn explicit_stop_fires_stopping_then_stopped() {
    let sim = Simulator::new(LoopPolicy::Throttled).unwrap();
    sim.set_animation_delay(Duration::from_secs(60));
    let (model, _log) = LogModel::new();
    sim.initialize(model, replication(10)).unwrap();
    sim.schedule_event_at(ticks(1), Priority::Normal, mark("first"))
        .unwrap();
    sim.schedule_event_at(ticks(2), Priority::Normal, mark("second"))
        .unwrap();

    let recorder = Arc::new(SignalRecorder::default());
    sim.subscribe_filtered(&[SimSignal::Stopping, SimSignal::Stopped], recorder.clone());

    sim.start().unwrap();
    assert!(wait_for(|| sim.simulator_time() == ticks(1)));
    sim.stop().unwrap();
    assert!(sim.wait_until_stopped(WAIT));

    assert_eq!(
        recorder.signals(),
        vec![SimSignal::Stopping, SimSignal::Stopped]
    );
}

#[test]
fn unsubscribe_stops_delivery() {
    let sim = Simulator::new(LoopPolicy::DiscreteEvent).unwrap();
    let (model, _log) = LogModel::new();
    sim.initialize(model, replication(10)).unwrap();

    let recorder = Arc::new(SignalRecorder::default());
    let id = sim.subscribe(recorder.clone());
    assert!(sim.unsubscribe(id));
    assert!(!sim.unsubscribe(id));

    sim.start().unwrap();
    assert!(sim.wait_until_stopped(WAIT));
    assert!(recorder.seen.lock().is_empty());
}

#[test]
fn animation_delay_change_is_announced() {
    let sim: Simulator<_, LogModel> = Simulator::new(LoopPolicy::Throttled).unwrap();
    let recorder = Arc::new(SignalRecorder::default());
    sim.subscribe_filtered(&[SimSignal::AnimationDelayChanged], recorder.clone());

    sim.set_animation_delay(Duration::from_millis(100));
    assert_eq!(sim.animation_delay(), Duration::from_millis(100));
    assert_eq!(recorder.signals(), vec![SimSignal::AnimationDelayChanged]);
}
