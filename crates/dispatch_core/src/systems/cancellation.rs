use bevy_ecs::prelude::{Res, ResMut};
use tracing::{info, warn};

use crate::clock::{CurrentTickEvents, EventKind, SimulationClock, Tick};
use crate::error::TransitionError;
use crate::hospital::HospitalNetwork;
use crate::patient::{PatientId, PatientRegistry};
use crate::scenario::{CancellationScope, DispatchPolicy};
use crate::systems::InvariantViolations;
use crate::telemetry::{
    CancellationRecord, CancellationStage, DispatchTelemetry, IgnoredCancellation,
    IgnoredCancellationReason,
};
use crate::vehicle::VehicleState;

/// Applies every cancellation due this tick. Runs after admission and before
/// the fleet moves, so a cancellation landing on the pickup tick wins.
pub fn cancellation_system(
    clock: Res<SimulationClock>,
    events: Res<CurrentTickEvents>,
    policy: Res<DispatchPolicy>,
    mut registry: ResMut<PatientRegistry>,
    mut network: ResMut<HospitalNetwork>,
    mut telemetry: ResMut<DispatchTelemetry>,
    mut violations: ResMut<InvariantViolations>,
) {
    let tick = clock.now();
    for event in events.of_kind(EventKind::Cancellation) {
        if let Err(violation) = cancel_patient(
            tick,
            event.subject,
            &policy,
            &mut registry,
            &mut network,
            &mut telemetry,
        ) {
            violations.record(tick, violation);
        }
    }
}

fn ignore(
    telemetry: &mut DispatchTelemetry,
    tick: Tick,
    pid: PatientId,
    reason: IgnoredCancellationReason,
) {
    warn!(tick, pid = %pid, ?reason, "cancellation ignored");
    telemetry.ignored_cancellations.push(IgnoredCancellation { pid, tick, reason });
}

fn cancel_patient(
    tick: Tick,
    pid: PatientId,
    policy: &DispatchPolicy,
    registry: &mut PatientRegistry,
    network: &mut HospitalNetwork,
    telemetry: &mut DispatchTelemetry,
) -> Result<(), TransitionError> {
    let patient = registry
        .get(pid)
        .ok_or(TransitionError::MissingPatient { pid })?;
    if patient.is_served() {
        ignore(telemetry, tick, pid, IgnoredCancellationReason::AlreadyServed);
        return Ok(());
    }
    if patient.is_cancelled() {
        ignore(telemetry, tick, pid, IgnoredCancellationReason::AlreadyCancelled);
        return Ok(());
    }

    let stage = if let Some(hospital) = network.locate_queued(pid) {
        network.require_mut(hospital)?.withdraw(pid);
        CancellationStage::Queued
    } else if let Some(hospital) = network.locate_carrier(pid) {
        let hospital = network.require_mut(hospital)?;
        let Some(vehicle) = hospital.vehicle_carrying_mut(pid) else {
            return Err(TransitionError::MissingPatient { pid });
        };
        let stage = match vehicle.state() {
            VehicleState::Loaded => CancellationStage::Loaded,
            _ => CancellationStage::Assigned,
        };
        if stage == CancellationStage::Loaded
            && policy.cancellation_scope == CancellationScope::OutboundOnly
        {
            ignore(
                telemetry,
                tick,
                pid,
                IgnoredCancellationReason::PastCancellationPoint,
            );
            return Ok(());
        }
        let label = vehicle.label();
        vehicle.force_reset(tick, policy.credit_aborted_trips);
        info!(tick, pid = %pid, vehicle = %label, "trip aborted");
        stage
    } else {
        CancellationStage::NotYetAdmitted
    };

    registry.require_mut(pid)?.cancel()?;
    telemetry
        .cancellations
        .push(CancellationRecord { pid, tick, stage });
    info!(tick, pid = %pid, ?stage, "request cancelled");
    Ok(())
}
