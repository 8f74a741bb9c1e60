//! Simulation runner: advances the clock and drives the per-tick schedule.
//!
//! Clock progression happens here, outside systems. Each step moves the clock
//! one tick, hands that tick's due events to the systems as [CurrentTickEvents],
//! runs the schedule, then turns any parked [InvariantViolations] into an error.

use bevy_ecs::prelude::{Schedule, World};
use bevy_ecs::schedule::IntoSystemConfigs;
use serde::{Deserialize, Serialize};
use tracing::{info, warn};

use crate::clock::{CurrentTickEvents, SimulationClock, Tick};
use crate::error::{DispatchError, DispatchResult};
use crate::hospital::HospitalNetwork;
use crate::scenario::{SimulationHorizon, TerminationPolicy};
use crate::systems::{
    cancellation::cancellation_system, fleet::fleet_system, forwarding::forwarding_system,
    request_inbound::request_inbound_system, InvariantViolations,
};

/// Why a run stopped.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum StopReason {
    /// Nothing busy, queued or scheduled.
    Settled,
    /// The safety horizon was reached.
    HorizonReached,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct RunOutcome {
    /// Last tick processed; also the number of elapsed ticks.
    pub final_tick: Tick,
    pub stop: StopReason,
}

/// Builds the per-tick schedule. The phases are chained so their order never
/// depends on the executor: admission, cancellation, fleet, forwarding.
pub fn simulation_schedule() -> Schedule {
    let mut schedule = Schedule::default();
    schedule.add_systems(
        (
            request_inbound_system,
            cancellation_system,
            fleet_system,
            forwarding_system,
        )
            .chain(),
    );
    schedule
}

/// Runs one tick and returns it. Fails on the first invariant violation any
/// system recorded during the tick.
pub fn run_next_tick(world: &mut World, schedule: &mut Schedule) -> DispatchResult<Tick> {
    let (tick, due) = {
        let mut clock = world.resource_mut::<SimulationClock>();
        let tick = clock.advance();
        (tick, clock.drain_due())
    };
    world.insert_resource(CurrentTickEvents(due));

    schedule.run(world);

    if let Some((tick, source)) = world.resource_mut::<InvariantViolations>().take_first() {
        return Err(DispatchError::Invariant { tick, source });
    }
    Ok(tick)
}

/// No vehicle busy, no request queued and no event left to deliver.
pub fn is_settled(world: &World) -> bool {
    world.resource::<SimulationClock>().is_empty() && world.resource::<HospitalNetwork>().is_idle()
}

/// Decides whether the run ends after the tick just processed.
pub fn stop_reason(world: &World) -> Option<StopReason> {
    let now = world.resource::<SimulationClock>().now();
    let horizon = world.resource::<SimulationHorizon>();
    if horizon.termination == TerminationPolicy::Converged && is_settled(world) {
        return Some(StopReason::Settled);
    }
    if now >= horizon.end_tick {
        if horizon.termination == TerminationPolicy::Converged {
            warn!(
                tick = now,
                end_tick = horizon.end_tick,
                "safety horizon reached before the run settled"
            );
        }
        return Some(StopReason::HorizonReached);
    }
    None
}

/// Runs ticks until the run settles or reaches its horizon.
pub fn run_until_settled(world: &mut World, schedule: &mut Schedule) -> DispatchResult<RunOutcome> {
    run_until_settled_with_hook(world, schedule, |_, _| {})
}

/// Like [run_until_settled], invoking `hook` after every tick.
pub fn run_until_settled_with_hook<F>(
    world: &mut World,
    schedule: &mut Schedule,
    mut hook: F,
) -> DispatchResult<RunOutcome>
where
    F: FnMut(&World, Tick),
{
    loop {
        let tick = run_next_tick(world, schedule)?;
        hook(world, tick);
        if let Some(stop) = stop_reason(world) {
            info!(final_tick = tick, ?stop, "simulation finished");
            return Ok(RunOutcome {
                final_tick: tick,
                stop,
            });
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::input::parse_input;
    use crate::scenario::{build_world, DispatchConfig};

    fn world_from(text: &str, config: DispatchConfig) -> World {
        let input = parse_input(text).expect("input");
        let mut world = World::new();
        build_world(&mut world, &input, config).expect("build");
        world
    }

    const ONE_TRIP: &str = "1\n5 5\n0\n0 1\n1\nNP 2 1 1 5\n0\n";

    #[test]
    fn empty_input_settles_on_the_first_tick() {
        let mut world = world_from("1\n1 1\n0\n1 1\n0\n0\n", DispatchConfig::default());
        let mut schedule = simulation_schedule();
        let outcome = run_until_settled(&mut world, &mut schedule).expect("run");
        assert_eq!(
            outcome,
            RunOutcome {
                final_tick: 1,
                stop: StopReason::Settled
            }
        );
    }

    #[test]
    fn fixed_horizon_runs_past_settlement() {
        let config = DispatchConfig::default()
            .with_termination(TerminationPolicy::FixedHorizon)
            .with_horizon_margin(10);
        let mut world = world_from(ONE_TRIP, config);
        let mut schedule = simulation_schedule();
        let outcome = run_until_settled(&mut world, &mut schedule).expect("run");
        assert_eq!(outcome.final_tick, 12);
        assert_eq!(outcome.stop, StopReason::HorizonReached);
    }

    #[test]
    fn horizon_bounds_a_run_that_cannot_settle() {
        let config = DispatchConfig::default().with_horizon_margin(0);
        let mut world = world_from(ONE_TRIP, config);
        let mut schedule = simulation_schedule();
        let outcome = run_until_settled(&mut world, &mut schedule).expect("run");
        assert_eq!(outcome.final_tick, 2);
        assert_eq!(outcome.stop, StopReason::HorizonReached);
    }

    #[test]
    fn hook_sees_every_tick_in_order() {
        let mut world = world_from(ONE_TRIP, DispatchConfig::default());
        let mut schedule = simulation_schedule();
        let mut seen = Vec::new();
        let outcome =
            run_until_settled_with_hook(&mut world, &mut schedule, |_, tick| seen.push(tick))
                .expect("run");
        assert_eq!(seen, (1..=outcome.final_tick).collect::<Vec<_>>());
        assert_eq!(outcome.final_tick, 4);
    }
}
