use bevy_ecs::prelude::{Res, ResMut};

use crate::clock::{SimulationClock, Tick};
use crate::error::TransitionError;
use crate::hospital::{FleetProgress, HospitalId, HospitalNetwork};
use crate::patient::PatientRegistry;
use crate::scenario::DispatchPolicy;
use crate::systems::InvariantViolations;
use crate::telemetry::{DispatchTelemetry, FinishedPatientRecord};

/// Per hospital, in id order: move every busy vehicle, then hand Ready vehicles
/// (including ones freed this tick) to queued requests.
pub fn fleet_system(
    clock: Res<SimulationClock>,
    policy: Res<DispatchPolicy>,
    mut registry: ResMut<PatientRegistry>,
    mut network: ResMut<HospitalNetwork>,
    mut telemetry: ResMut<DispatchTelemetry>,
    mut violations: ResMut<InvariantViolations>,
) {
    let tick = clock.now();
    for hospital in network.iter_mut() {
        match hospital.advance_fleet(tick, &mut registry) {
            Ok(progress) => {
                if let Err(violation) =
                    record_finished(tick, hospital.id(), &progress, &registry, &mut telemetry)
                {
                    violations.record(tick, violation);
                }
            }
            Err(violation) => {
                violations.record(tick, violation);
                continue;
            }
        }

        match hospital.assign_waiting(tick, &registry, policy.emergency_vehicle_preference) {
            Ok(assignments) => telemetry.assignments += assignments.len() as u64,
            Err(violation) => violations.record(tick, violation),
        }
    }
}

fn record_finished(
    tick: Tick,
    hospital: HospitalId,
    progress: &FleetProgress,
    registry: &PatientRegistry,
    telemetry: &mut DispatchTelemetry,
) -> Result<(), TransitionError> {
    for &(vehicle, pid) in &progress.returned {
        let patient = registry
            .get(pid)
            .ok_or(TransitionError::MissingPatient { pid })?;
        let pickup_tick = patient
            .pickup_tick()
            .ok_or(TransitionError::MissingPatient { pid })?;
        telemetry.finished.push(FinishedPatientRecord {
            pid,
            priority: patient.priority,
            hospital,
            vehicle,
            request_tick: patient.request_tick,
            pickup_tick,
            finish_tick: tick,
        });
    }
    Ok(())
}
