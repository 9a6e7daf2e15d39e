//! Execution-order contract: time, then priority, then insertion order.

use eventide_core::events::Priority;
use eventide_core::simulator::{LoopPolicy, RunState, Simulator};
use proptest::prelude::*;

use crate::support::{LogModel, WAIT, mark, replication, ticks};

#[test]
fn events_execute_in_time_order_regardless_of_insertion() {
    let sim = Simulator::new(LoopPolicy::DiscreteEvent).unwrap();
    let (model, log) = LogModel::new();
    sim.initialize(model, replication(10)).unwrap();

    sim.schedule_event_at(ticks(1), Priority::Normal, mark("t1"))
        .unwrap();
    sim.schedule_event_at(ticks(3), Priority::Normal, mark("t3"))
        .unwrap();
    sim.schedule_event_at(ticks(2), Priority::Normal, mark("t2"))
        .unwrap();

    sim.start().unwrap();
    assert!(sim.wait_until_stopped(WAIT));

    assert_eq!(*log.lock(), vec!["t1", "t2", "t3"]);
    assert_eq!(sim.run_state(), RunState::Ended);
}

#[test]
fn priority_breaks_ties_at_equal_time() {
    let sim = Simulator::new(LoopPolicy::DiscreteEvent).unwrap();
    let (model, log) = LogModel::new();
    sim.initialize(model, replication(10)).unwrap();

    sim.schedule_event_at(ticks(5), Priority::Low, mark("low"))
        .unwrap();
    sim.schedule_event_at(ticks(5), Priority::High, mark("high"))
        .unwrap();
    sim.schedule_event_at(ticks(5), Priority::Critical, mark("critical"))
        .unwrap();

    sim.start().unwrap();
    assert!(sim.wait_until_stopped(WAIT));

    assert_eq!(*log.lock(), vec!["critical", "high", "low"]);
}

#[test]
fn insertion_order_breaks_ties_at_equal_time_and_priority() {
    let sim = Simulator::new(LoopPolicy::DiscreteEvent).unwrap();
    let (model, log) = LogModel::new();
    sim.initialize(model, replication(10)).unwrap();

    for label in ["first", "second", "third"] {
        sim.schedule_event_at(ticks(4), Priority::Normal, mark(label))
            .unwrap();
    }

    sim.start().unwrap();
    assert!(sim.wait_until_stopped(WAIT));

    assert_eq!(*log.lock(), vec!["first", "second", "third"]);
}

#[test]
fn events_scheduled_during_execution_keep_the_order() {
    let sim = Simulator::new(LoopPolicy::DiscreteEvent).unwrap();
    let (model, log) = LogModel::new();
    sim.initialize(model, replication(10)).unwrap();

    // The t=1 event schedules a follow-up at t=2, between two
    // pre-scheduled neighbours.
    sim.schedule_event_at(ticks(1), Priority::Normal, |model: &mut LogModel, ctx| {
        model.log.lock().push("t1".to_string());
        ctx.schedule(1, Priority::Normal, |model: &mut LogModel, _ctx| {
            model.log.lock().push("t2-followup".to_string());
        })
        .unwrap();
    })
    .unwrap();
    sim.schedule_event_at(ticks(3), Priority::Normal, mark("t3"))
        .unwrap();

    sim.start().unwrap();
    assert!(sim.wait_until_stopped(WAIT));

    assert_eq!(*log.lock(), vec!["t1", "t2-followup", "t3"]);
}

#[test]
fn schedule_now_executes_at_the_current_time() {
    let sim = Simulator::new(LoopPolicy::DiscreteEvent).unwrap();
    let (model, log) = LogModel::new();
    sim.initialize(model, replication(10)).unwrap();

    sim.schedule_event_now(Priority::Normal, mark("immediate"))
        .unwrap();
    sim.schedule_event_at(ticks(1), Priority::Normal, mark("later"))
        .unwrap();

    sim.start().unwrap();
    assert!(sim.wait_until_stopped(WAIT));

    assert_eq!(*log.lock(), vec!["immediate", "later"]);
}

fn priority_from(index: u8) -> Priority {
    match index % 4 {
        0 => Priority::Critical,
        1 => Priority::High,
        2 => Priority::Normal,
        _ => Priority::Low,
    }
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(64))]

    /// Any batch of events executes sorted by (time, priority,
    /// insertion sequence).
    #[test]
    fn execution_order_matches_the_sort_key(
        events in prop::collection::vec((0i64..50, 0u8..4), 1..40)
    ) {
        let sim = Simulator::new(LoopPolicy::DiscreteEvent).unwrap();
        let (model, log) = LogModel::new();
        sim.initialize(model, replication(100)).unwrap();

        for (index, (time, priority)) in events.iter().enumerate() {
            sim.schedule_event_at(
                ticks(*time),
                priority_from(*priority),
                move |model: &mut LogModel, _ctx| {
                    model.log.lock().push(index.to_string());
                },
            )
            .unwrap();
        }

        sim.start().unwrap();
        prop_assert!(sim.wait_until_stopped(WAIT));

        let executed: Vec<usize> = log.lock().iter().map(|s| s.parse().unwrap()).collect();
        let mut expected: Vec<usize> = (0..events.len()).collect();
        expected.sort_by_key(|&i| (events[i].0, priority_from(events[i].1), i));
        prop_assert_eq!(executed, expected);
    }
}
