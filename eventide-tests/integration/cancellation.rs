//! Cancellation by handle, from outside and from inside event actions.

use eventide_core::events::Priority;
use eventide_core::simulator::{LoopPolicy, ReplicationState, Simulator};

use crate::support::{LogModel, WAIT, mark, replication, ticks};

#[test]
fn cancelled_event_never_executes() {
    let sim = Simulator::new(LoopPolicy::DiscreteEvent).unwrap();
    let (model, log) = LogModel::new();
    sim.initialize(model, replication(10)).unwrap();

    sim.schedule_event_at(ticks(1), Priority::Normal, mark("keep"))
        .unwrap();
    let doomed = sim
        .schedule_event_at(ticks(2), Priority::Normal, mark("doomed"))
        .unwrap();
    sim.schedule_event_at(ticks(3), Priority::Normal, mark("keep-too"))
        .unwrap();

    assert!(sim.cancel_event(doomed));
    assert!(!sim.cancel_event(doomed));

    sim.start().unwrap();
    assert!(sim.wait_until_stopped(WAIT));
    assert_eq!(*log.lock(), vec!["keep", "keep-too"]);
}

#[test]
fn cancel_after_execution_is_a_noop() {
    let sim = Simulator::new(LoopPolicy::DiscreteEvent).unwrap();
    let (model, log) = LogModel::new();
    sim.initialize(model, replication(10)).unwrap();

    let handle = sim
        .schedule_event_at(ticks(1), Priority::Normal, mark("ran"))
        .unwrap();

    sim.start().unwrap();
    assert!(sim.wait_until_stopped(WAIT));
    assert_eq!(*log.lock(), vec!["ran"]);

    assert!(!sim.cancel_event(handle));
}

#[test]
fn events_can_cancel_other_events() {
    let sim = Simulator::new(LoopPolicy::DiscreteEvent).unwrap();
    let (model, log) = LogModel::new();
    sim.initialize(model, replication(10)).unwrap();

    let victim = sim
        .schedule_event_at(ticks(5), Priority::Normal, mark("victim"))
        .unwrap();
    sim.schedule_event_at(ticks(1), Priority::Normal, move |model: &mut LogModel, ctx| {
        model.log.lock().push("canceller".to_string());
        assert!(ctx.cancel(victim));
    })
    .unwrap();

    sim.start().unwrap();
    assert!(sim.wait_until_stopped(WAIT));

    assert_eq!(*log.lock(), vec!["canceller"]);
    assert_eq!(sim.replication_state(), ReplicationState::Ended);
    assert_eq!(sim.pending_events(), 0);
}
