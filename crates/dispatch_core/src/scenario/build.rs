use bevy_ecs::prelude::World;
use tracing::info;

use crate::clock::{CurrentTickEvents, EventKind, SimulationClock, FIRST_TICK};
use crate::distance::DistanceModel;
use crate::error::ConfigError;
use crate::forwarding::build_forwarding_strategy;
use crate::hospital::{Hospital, HospitalId, HospitalNetwork};
use crate::input::DispatchInput;
use crate::patient::{Patient, PatientRegistry};
use crate::scenario::params::{DispatchConfig, SimulationHorizon};
use crate::systems::InvariantViolations;
use crate::telemetry::DispatchTelemetry;
use crate::vehicle::VehicleClass;

/// Validates `input` and inserts every resource a run needs into `world`.
///
/// Nothing is inserted when validation fails. Request events are scheduled in
/// source order, so same-tick requests are admitted in the order they were listed.
pub fn build_world(
    world: &mut World,
    input: &DispatchInput,
    config: DispatchConfig,
) -> Result<(), ConfigError> {
    let distances = DistanceModel::new(input.distances.clone())?;
    let hospital_count = distances.hospital_count();
    if input.fleets.len() != hospital_count {
        return Err(ConfigError::FleetCountMismatch {
            expected: hospital_count,
            found: input.fleets.len(),
        });
    }
    for class in [VehicleClass::Standard, VehicleClass::Restricted] {
        if input.speeds.of(class) == 0 {
            return Err(ConfigError::ZeroSpeed { class });
        }
    }

    let network = HospitalNetwork::new(
        input
            .fleets
            .iter()
            .enumerate()
            .map(|(index, fleet)| Hospital::new(HospitalId::from_index(index), *fleet, input.speeds))
            .collect(),
    );

    let mut clock = SimulationClock::default();
    let mut registry = PatientRegistry::default();
    for request in &input.requests {
        if request.request_tick < FIRST_TICK {
            return Err(ConfigError::TickBeforeStart {
                pid: request.pid,
                what: "request",
            });
        }
        if network.get(request.hospital).is_none() {
            return Err(ConfigError::UnknownHospital {
                pid: request.pid,
                hospital: request.hospital.0,
                count: hospital_count,
            });
        }
        registry.insert(Patient::new(
            request.pid,
            request.priority,
            request.severity,
            request.request_tick,
            request.hospital,
            request.distance,
        ))?;
        clock.schedule_at(request.request_tick, EventKind::RequestInbound, request.pid);
    }

    for cancellation in &input.cancellations {
        if cancellation.tick < FIRST_TICK {
            return Err(ConfigError::TickBeforeStart {
                pid: cancellation.pid,
                what: "cancellation",
            });
        }
        if !registry.contains(cancellation.pid) {
            return Err(ConfigError::UnknownCancellationTarget {
                pid: cancellation.pid,
                tick: cancellation.tick,
            });
        }
        clock.schedule_at(cancellation.tick, EventKind::Cancellation, cancellation.pid);
    }

    let last_tick = clock.last_scheduled_tick();
    let end_tick = last_tick
        .checked_add(config.horizon_margin)
        .ok_or(ConfigError::HorizonOverflow {
            last_tick,
            margin: config.horizon_margin,
        })?;
    let horizon = SimulationHorizon {
        end_tick,
        termination: config.termination,
    };
    info!(
        hospitals = hospital_count,
        vehicles = network.total_vehicles(),
        requests = registry.len(),
        cancellations = input.cancellations.len(),
        end_tick = horizon.end_tick,
        "scenario built"
    );

    world.insert_resource(clock);
    world.insert_resource(CurrentTickEvents::default());
    world.insert_resource(registry);
    world.insert_resource(network);
    world.insert_resource(distances);
    world.insert_resource(config.policy);
    world.insert_resource(build_forwarding_strategy(config.forwarding));
    world.insert_resource(horizon);
    world.insert_resource(DispatchTelemetry::default());
    world.insert_resource(InvariantViolations::default());
    Ok(())
}
