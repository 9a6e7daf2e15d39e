//! The simulator over calendar time, where the absolute and relative
//! time types differ.

use std::sync::Arc;

use chrono::{TimeDelta, TimeZone, Utc};
use parking_lot::Mutex;

use eventide_core::events::Priority;
use eventide_core::simulator::{
    LoopPolicy, Model, Replication, RunState, SimContext, Simulator, SimulatorError,
};
use eventide_core::time::{SimTime, TimeCalendar};

use crate::support::WAIT;

struct Timetable {
    departures: Arc<Mutex<Vec<TimeCalendar>>>,
}

impl Model<TimeCalendar> for Timetable {
    fn construct_model(
        &mut self,
        ctx: &mut SimContext<'_, TimeCalendar, Self>,
    ) -> Result<(), SimulatorError> {
        // Hourly departures for the first three hours of the run.
        for hour in 1..=3 {
            ctx.schedule(
                TimeDelta::hours(hour),
                Priority::Normal,
                |model: &mut Timetable, ctx| {
                    model.departures.lock().push(ctx.now().clone());
                },
            )?;
        }
        Ok(())
    }
}

#[test]
fn calendar_run_executes_at_wall_clock_instants() {
    let day_start = TimeCalendar::new(Utc.with_ymd_and_hms(2024, 3, 1, 6, 0, 0).unwrap());
    let day_end = day_start.add(&TimeDelta::hours(12));

    let sim = Simulator::new(LoopPolicy::DiscreteEvent).unwrap();
    let departures = Arc::new(Mutex::new(Vec::new()));
    sim.initialize(
        Timetable {
            departures: departures.clone(),
        },
        Replication::new(day_start.clone(), day_end).unwrap(),
    )
    .unwrap();

    sim.start().unwrap();
    assert!(sim.wait_until_stopped(WAIT));
    assert_eq!(sim.run_state(), RunState::Ended);

    let departures = departures.lock();
    let expected: Vec<TimeCalendar> = (1..=3)
        .map(|hour| day_start.add(&TimeDelta::hours(hour)))
        .collect();
    assert_eq!(*departures, expected);
}

#[test]
fn fixed_step_advances_by_time_delta() {
    let start = TimeCalendar::new(Utc.with_ymd_and_hms(2024, 3, 1, 0, 0, 0).unwrap());
    let end = start.add(&TimeDelta::minutes(90));

    let sim: Simulator<_, Timetable> = Simulator::new(LoopPolicy::FixedStep {
        step: TimeDelta::minutes(20),
    })
    .unwrap();
    sim.initialize(
        Timetable {
            departures: Arc::new(Mutex::new(Vec::new())),
        },
        Replication::new(start, end.clone()).unwrap(),
    )
    .unwrap();

    sim.start().unwrap();
    assert!(sim.wait_until_stopped(WAIT));

    // 4 full steps plus a clamped final one land exactly on the end.
    assert_eq!(sim.simulator_time(), end);
}
