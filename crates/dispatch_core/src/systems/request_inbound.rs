use bevy_ecs::prelude::{Res, ResMut};
use tracing::debug;

use crate::clock::{CurrentTickEvents, EventKind, SimulationClock};
use crate::error::TransitionError;
use crate::hospital::HospitalNetwork;
use crate::patient::PatientRegistry;
use crate::systems::InvariantViolations;
use crate::telemetry::DispatchTelemetry;

/// Enqueues every request due this tick at its home hospital, in source order.
/// Requests cancelled before they arrived are dropped.
pub fn request_inbound_system(
    clock: Res<SimulationClock>,
    events: Res<CurrentTickEvents>,
    registry: Res<PatientRegistry>,
    mut network: ResMut<HospitalNetwork>,
    mut telemetry: ResMut<DispatchTelemetry>,
    mut violations: ResMut<InvariantViolations>,
) {
    let tick = clock.now();
    for event in events.of_kind(EventKind::RequestInbound) {
        let pid = event.subject;
        let Some(patient) = registry.get(pid) else {
            violations.record(tick, TransitionError::MissingPatient { pid });
            continue;
        };
        if patient.is_cancelled() {
            debug!(tick, pid = %pid, "request withdrawn before arrival");
            continue;
        }
        let Some(hospital) = network.get_mut(patient.home_hospital) else {
            violations.record(
                tick,
                TransitionError::MissingHospital {
                    hospital: patient.home_hospital,
                },
            );
            continue;
        };
        hospital.admit(patient);
        telemetry.requests_admitted += 1;
        debug!(
            tick,
            pid = %pid,
            hospital = %patient.home_hospital,
            priority = %patient.priority,
            "request admitted"
        );
    }
}
