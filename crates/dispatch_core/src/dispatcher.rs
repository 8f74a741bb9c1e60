//! The run object: one world, one schedule, one simulation.

use bevy_ecs::prelude::{Schedule, World};

use crate::clock::{SimulationClock, Tick};
use crate::error::{ConfigError, DispatchResult};
use crate::hospital::{Hospital, HospitalId, HospitalNetwork};
use crate::input::DispatchInput;
use crate::patient::{Patient, PatientId, PatientRegistry};
use crate::report::SimulationSummary;
use crate::runner::{
    run_next_tick, run_until_settled_with_hook, simulation_schedule, stop_reason, RunOutcome,
};
use crate::scenario::{build_world, DispatchConfig};
use crate::telemetry::{DispatchTelemetry, TickSnapshot};

/// Read-only view of a run's state, handed to per-tick hooks.
#[derive(Clone, Copy)]
pub struct DispatchView<'w> {
    world: &'w World,
}

impl<'w> DispatchView<'w> {
    pub fn new(world: &'w World) -> Self {
        Self { world }
    }

    /// Last tick processed, 0 before the first step.
    pub fn now(&self) -> Tick {
        self.world.resource::<SimulationClock>().now()
    }

    pub fn patient(&self, pid: PatientId) -> Option<&'w Patient> {
        self.world.resource::<PatientRegistry>().get(pid)
    }

    pub fn patients(&self) -> &'w PatientRegistry {
        self.world.resource::<PatientRegistry>()
    }

    pub fn hospital(&self, id: HospitalId) -> Option<&'w Hospital> {
        self.hospitals().get(id)
    }

    pub fn hospitals(&self) -> &'w HospitalNetwork {
        self.world.resource::<HospitalNetwork>()
    }

    pub fn telemetry(&self) -> &'w DispatchTelemetry {
        self.world.resource::<DispatchTelemetry>()
    }

    pub fn snapshot(&self) -> TickSnapshot {
        TickSnapshot::capture(self.now(), self.hospitals(), self.telemetry())
    }

    /// Statistics as of the current tick.
    pub fn summary(&self) -> SimulationSummary {
        SimulationSummary::compute(
            self.now(),
            self.patients(),
            self.hospitals(),
            self.telemetry(),
        )
    }
}

/// Owns the state of a single simulation run from load to report.
pub struct Dispatcher {
    world: World,
    schedule: Schedule,
    outcome: Option<RunOutcome>,
}

impl Dispatcher {
    /// Validates `input` and prepares a run; nothing is simulated yet.
    pub fn new(input: &DispatchInput, config: DispatchConfig) -> Result<Self, ConfigError> {
        let mut world = World::new();
        build_world(&mut world, input, config)?;
        Ok(Self {
            world,
            schedule: simulation_schedule(),
            outcome: None,
        })
    }

    pub fn view(&self) -> DispatchView<'_> {
        DispatchView::new(&self.world)
    }

    /// `Some` once the run has stopped.
    pub fn outcome(&self) -> Option<RunOutcome> {
        self.outcome
    }

    pub fn is_finished(&self) -> bool {
        self.outcome.is_some()
    }

    /// Simulates one tick. Returns the outcome once the run has stopped; further
    /// calls after that do nothing.
    pub fn step(&mut self) -> DispatchResult<Option<RunOutcome>> {
        if self.outcome.is_some() {
            return Ok(self.outcome);
        }
        let tick = run_next_tick(&mut self.world, &mut self.schedule)?;
        self.outcome = stop_reason(&self.world).map(|stop| RunOutcome {
            final_tick: tick,
            stop,
        });
        Ok(self.outcome)
    }

    /// Runs to completion.
    pub fn run(&mut self) -> DispatchResult<RunOutcome> {
        self.run_with_hook(|_| {})
    }

    /// Runs to completion, calling `hook` after every tick.
    pub fn run_with_hook<F>(&mut self, mut hook: F) -> DispatchResult<RunOutcome>
    where
        F: FnMut(DispatchView<'_>),
    {
        if let Some(outcome) = self.outcome {
            return Ok(outcome);
        }
        let outcome = run_until_settled_with_hook(&mut self.world, &mut self.schedule, |world, _| {
            hook(DispatchView::new(world))
        })?;
        self.outcome = Some(outcome);
        Ok(outcome)
    }

    pub fn now(&self) -> Tick {
        self.view().now()
    }

    pub fn patient(&self, pid: PatientId) -> Option<&Patient> {
        self.view().patient(pid)
    }

    pub fn hospital(&self, id: HospitalId) -> Option<&Hospital> {
        self.view().hospital(id)
    }

    pub fn hospitals(&self) -> &HospitalNetwork {
        self.view().hospitals()
    }

    pub fn telemetry(&self) -> &DispatchTelemetry {
        self.view().telemetry()
    }

    pub fn snapshot(&self) -> TickSnapshot {
        self.view().snapshot()
    }

    pub fn summary(&self) -> SimulationSummary {
        self.view().summary()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::input::parse_input;
    use crate::runner::StopReason;

    const ONE_NORMAL: &str = "1\n5 5\n0\n1 1\n1\nNP 1 1 1 10\n0\n";

    #[test]
    fn step_walks_the_documented_trip() {
        let input = parse_input(ONE_NORMAL).expect("input");
        let mut dispatcher = Dispatcher::new(&input, DispatchConfig::default()).expect("build");
        assert_eq!(dispatcher.now(), 0);

        let mut outcome = None;
        while outcome.is_none() {
            outcome = dispatcher.step().expect("step");
            let snapshot = dispatcher.snapshot();
            match snapshot.tick {
                1 | 2 => assert_eq!(snapshot.hospitals[0].outgoing.len(), 1),
                3 | 4 => assert_eq!(snapshot.hospitals[0].returning.len(), 1),
                5 => assert_eq!(snapshot.finished, vec![PatientId(1)]),
                other => panic!("unexpected tick {other}"),
            }
        }
        assert_eq!(outcome.map(|o| o.stop), Some(StopReason::Settled));

        let patient = dispatcher.patient(PatientId(1)).expect("patient");
        assert_eq!(patient.pickup_tick(), Some(3));
        assert_eq!(patient.finish_tick(), Some(5));
        assert_eq!(patient.waiting_time(), Some(2));

        let summary = dispatcher.summary();
        assert_eq!(summary.served_patients, 1);
        assert_eq!(summary.total_ticks, 5);
        assert_eq!(summary.average_wait_time, 2.0);
        assert_eq!(summary.average_busy_time, 2.0);
    }

    #[test]
    fn run_is_idempotent_once_finished() {
        let input = parse_input(ONE_NORMAL).expect("input");
        let mut dispatcher = Dispatcher::new(&input, DispatchConfig::default()).expect("build");
        let first = dispatcher.run().expect("run");
        let second = dispatcher.run().expect("rerun");
        assert_eq!(first, second);
        assert_eq!(dispatcher.step().expect("step"), Some(first));
        assert_eq!(dispatcher.now(), 5);
    }

    #[test]
    fn hook_observes_every_tick() {
        let input = parse_input(ONE_NORMAL).expect("input");
        let mut dispatcher = Dispatcher::new(&input, DispatchConfig::default()).expect("build");
        let mut ticks = Vec::new();
        dispatcher
            .run_with_hook(|view| ticks.push(view.now()))
            .expect("run");
        assert_eq!(ticks, vec![1, 2, 3, 4, 5]);
    }
}
