//! Legality of control transitions on the run/replication state
//! machines.

use std::time::Duration;

use eventide_core::events::Priority;
use eventide_core::simulator::{
    LoopPolicy, ReplicationState, RunState, Simulator, SimulatorError,
};

use crate::support::{LogModel, WAIT, mark, replication, ticks, wait_for};

#[test]
fn control_before_initialize_is_rejected() {
    let sim: Simulator<_, LogModel> = Simulator::new(LoopPolicy::DiscreteEvent).unwrap();

    assert!(matches!(sim.start(), Err(SimulatorError::NoReplication)));
    assert!(matches!(sim.step(), Err(SimulatorError::NoReplication)));
    assert!(matches!(
        sim.stop(),
        Err(SimulatorError::InvalidState { .. })
    ));
    assert_eq!(sim.run_state(), RunState::NotInitialized);
}

#[test]
fn start_while_running_is_rejected() {
    // The throttled loop sleeps between batches without holding the
    // simulator lock, so control calls can be made mid-run.
    let sim = Simulator::new(LoopPolicy::Throttled).unwrap();
    sim.set_animation_delay(Duration::from_millis(250));
    let (model, _log) = LogModel::new();
    sim.initialize(model, replication(10)).unwrap();

    sim.schedule_event_at(ticks(1), Priority::Normal, mark("first"))
        .unwrap();
    sim.schedule_event_at(ticks(2), Priority::Normal, mark("second"))
        .unwrap();

    sim.start().unwrap();
    assert!(wait_for(|| sim.simulator_time() == ticks(1)));

    assert!(matches!(
        sim.start(),
        Err(SimulatorError::InvalidState { .. })
    ));
    assert!(matches!(
        sim.step(),
        Err(SimulatorError::InvalidState { .. })
    ));

    assert!(sim.wait_until_stopped(WAIT));
    assert_eq!(sim.run_state(), RunState::Ended);
}

#[test]
fn ended_replication_rejects_everything_but_initialize() {
    let sim = Simulator::new(LoopPolicy::DiscreteEvent).unwrap();
    let (model, _log) = LogModel::new();
    sim.initialize(model, replication(10)).unwrap();
    sim.start().unwrap();
    assert!(sim.wait_until_stopped(WAIT));
    assert_eq!(sim.replication_state(), ReplicationState::Ended);

    assert!(matches!(sim.start(), Err(SimulatorError::Ended)));
    assert!(matches!(sim.step(), Err(SimulatorError::Ended)));
    assert!(matches!(
        sim.schedule_event_at(ticks(5), Priority::Normal, mark("late")),
        Err(SimulatorError::Ended)
    ));

    // A fresh initialize leaves the terminal state behind.
    let (model, log) = LogModel::new();
    sim.initialize(model, replication(10)).unwrap();
    assert_eq!(sim.run_state(), RunState::Initialized);
    assert_eq!(sim.simulator_time(), ticks(0));

    sim.schedule_event_at(ticks(2), Priority::Normal, mark("second-life"))
        .unwrap();
    sim.start().unwrap();
    assert!(sim.wait_until_stopped(WAIT));
    assert_eq!(*log.lock(), vec!["second-life"]);
}

#[test]
fn stop_from_an_event_leaves_the_run_resumable() {
    let sim = Simulator::new(LoopPolicy::DiscreteEvent).unwrap();
    let (model, log) = LogModel::new();
    sim.initialize(model, replication(10)).unwrap();

    sim.schedule_event_at(ticks(1), Priority::Normal, |model: &mut LogModel, ctx| {
        model.log.lock().push("before-stop".to_string());
        ctx.request_stop();
    })
    .unwrap();
    sim.schedule_event_at(ticks(2), Priority::Normal, mark("after-resume"))
        .unwrap();

    sim.start().unwrap();
    assert!(sim.wait_until_stopped(WAIT));
    assert_eq!(sim.run_state(), RunState::Stopped);
    assert_eq!(*log.lock(), vec!["before-stop"]);
    assert_eq!(sim.simulator_time(), ticks(1));

    sim.start().unwrap();
    assert!(sim.wait_until_stopped(WAIT));
    assert_eq!(sim.run_state(), RunState::Ended);
    assert_eq!(*log.lock(), vec!["before-stop", "after-resume"]);
}

#[test]
fn step_executes_one_event_at_a_time() {
    let sim = Simulator::new(LoopPolicy::DiscreteEvent).unwrap();
    let (model, log) = LogModel::new();
    sim.initialize(model, replication(10)).unwrap();

    sim.schedule_event_at(ticks(1), Priority::Normal, mark("a"))
        .unwrap();
    sim.schedule_event_at(ticks(2), Priority::Normal, mark("b"))
        .unwrap();

    sim.step().unwrap();
    assert_eq!(*log.lock(), vec!["a"]);
    assert_eq!(sim.run_state(), RunState::Stopped);
    assert_eq!(sim.simulator_time(), ticks(1));

    sim.step().unwrap();
    assert_eq!(*log.lock(), vec!["a", "b"]);
}

#[test]
fn initialize_while_running_is_rejected() {
    let sim = Simulator::new(LoopPolicy::Throttled).unwrap();
    sim.set_animation_delay(Duration::from_millis(250));
    let (model, _log) = LogModel::new();
    sim.initialize(model, replication(10)).unwrap();

    sim.schedule_event_at(ticks(1), Priority::Normal, mark("first"))
        .unwrap();
    sim.schedule_event_at(ticks(2), Priority::Normal, mark("second"))
        .unwrap();
    sim.start().unwrap();
    assert!(wait_for(|| sim.simulator_time() == ticks(1)));

    let (other, _other_log) = LogModel::new();
    assert!(matches!(
        sim.initialize(other, replication(20)),
        Err(SimulatorError::InvalidState { .. })
    ));

    assert!(sim.wait_until_stopped(WAIT));
}

#[test]
fn failed_initialize_leaves_nothing_startable() {
    use eventide_core::simulator::{Model, SimContext};
    use eventide_core::time::TimeTicks;

    struct BrokenModel;
    impl Model<TimeTicks> for BrokenModel {
        fn construct_model(
            &mut self,
            ctx: &mut SimContext<'_, TimeTicks, Self>,
        ) -> Result<(), SimulatorError> {
            ctx.schedule_at(ticks(-1), Priority::Normal, |_m, _c| {})?;
            Ok(())
        }
    }

    let sim: Simulator<TimeTicks, BrokenModel> =
        Simulator::new(LoopPolicy::DiscreteEvent).unwrap();
    assert!(matches!(
        sim.initialize(BrokenModel, replication(10)),
        Err(SimulatorError::Scheduling(_))
    ));

    // The failure rolls the state machine back; a follow-up start has
    // nothing to run and says so.
    assert_eq!(sim.run_state(), RunState::NotInitialized);
    assert_eq!(sim.pending_events(), 0);
    assert!(matches!(sim.start(), Err(SimulatorError::NoReplication)));
    assert!(matches!(sim.step(), Err(SimulatorError::NoReplication)));
}

#[test]
fn panicking_event_is_isolated() {
    let sim = Simulator::new(LoopPolicy::DiscreteEvent).unwrap();
    let (model, log) = LogModel::new();
    sim.initialize(model, replication(10)).unwrap();

    sim.schedule_event_at(ticks(1), Priority::Normal, |_m: &mut LogModel, _c| {
        panic!("model bug");
    })
    .unwrap();
    sim.schedule_event_at(ticks(2), Priority::Normal, mark("survivor"))
        .unwrap();

    sim.start().unwrap();
    assert!(sim.wait_until_stopped(WAIT));
    assert_eq!(*log.lock(), vec!["survivor"]);
    assert_eq!(sim.replication_state(), ReplicationState::Ended);
}
