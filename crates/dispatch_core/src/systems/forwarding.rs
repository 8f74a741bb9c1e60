use bevy_ecs::prelude::{Res, ResMut};

use crate::clock::SimulationClock;
use crate::distance::DistanceModel;
use crate::forwarding::{forward_unserved_emergencies, ForwardingStrategyResource};
use crate::hospital::HospitalNetwork;
use crate::patient::PatientRegistry;
use crate::systems::InvariantViolations;
use crate::telemetry::DispatchTelemetry;

/// Rebalances emergencies still queued after every hospital's assignment pass.
pub fn forwarding_system(
    clock: Res<SimulationClock>,
    distances: Res<DistanceModel>,
    strategy: Res<ForwardingStrategyResource>,
    mut registry: ResMut<PatientRegistry>,
    mut network: ResMut<HospitalNetwork>,
    mut telemetry: ResMut<DispatchTelemetry>,
    mut violations: ResMut<InvariantViolations>,
) {
    let tick = clock.now();
    match forward_unserved_emergencies(tick, &mut network, &distances, &mut registry, &**strategy)
    {
        Ok(records) => telemetry.forwards.extend(records),
        Err(violation) => violations.record(tick, violation),
    }
}
