//! Telemetry: trip, forward and cancellation records plus per-tick snapshots.

use bevy_ecs::prelude::Resource;
use serde::{Deserialize, Serialize};

use crate::clock::Tick;
use crate::hospital::{Hospital, HospitalId, HospitalNetwork};
use crate::patient::{PatientId, PriorityClass};
use crate::vehicle::{Vehicle, VehicleClass, VehicleId, VehicleState};

/// One served patient, recorded when its vehicle returns.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct FinishedPatientRecord {
    pub pid: PatientId,
    pub priority: PriorityClass,
    pub hospital: HospitalId,
    pub vehicle: VehicleId,
    pub request_tick: Tick,
    pub pickup_tick: Tick,
    pub finish_tick: Tick,
}

impl FinishedPatientRecord {
    /// Ticks from request to pickup.
    pub fn waiting_time(&self) -> u64 {
        self.pickup_tick.saturating_sub(self.request_tick)
    }

    /// Ticks from pickup to arrival at the hospital.
    pub fn ride_time(&self) -> u64 {
        self.finish_tick.saturating_sub(self.pickup_tick)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ForwardRecord {
    pub pid: PatientId,
    pub from: HospitalId,
    pub to: HospitalId,
    pub tick: Tick,
}

/// Where the patient was when its cancellation took effect.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum CancellationStage {
    NotYetAdmitted,
    Queued,
    Assigned,
    Loaded,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct CancellationRecord {
    pub pid: PatientId,
    pub tick: Tick,
    pub stage: CancellationStage,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum IgnoredCancellationReason {
    AlreadyServed,
    AlreadyCancelled,
    /// The patient is already aboard and the policy only allows outbound aborts.
    PastCancellationPoint,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct IgnoredCancellation {
    pub pid: PatientId,
    pub tick: Tick,
    pub reason: IgnoredCancellationReason,
}

/// Collects run telemetry. Inserted as a resource when the run is built.
#[derive(Debug, Clone, Default, Resource)]
pub struct DispatchTelemetry {
    pub finished: Vec<FinishedPatientRecord>,
    pub forwards: Vec<ForwardRecord>,
    pub cancellations: Vec<CancellationRecord>,
    pub ignored_cancellations: Vec<IgnoredCancellation>,
    pub requests_admitted: u64,
    pub assignments: u64,
}

impl DispatchTelemetry {
    /// Patients whose trip ended at `tick`, in completion order.
    pub fn finished_at(&self, tick: Tick) -> impl Iterator<Item = &FinishedPatientRecord> + '_ {
        self.finished.iter().filter(move |r| r.finish_tick == tick)
    }
}

/// A busy vehicle as shown in a snapshot.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct VehicleSnapshot {
    pub label: String,
    pub class: VehicleClass,
    pub state: VehicleState,
    pub patient: Option<PatientId>,
    pub remaining_distance: u64,
}

impl VehicleSnapshot {
    fn of(vehicle: &Vehicle) -> Self {
        Self {
            label: vehicle.label(),
            class: vehicle.class(),
            state: vehicle.state(),
            patient: vehicle.current_patient(),
            remaining_distance: vehicle.remaining_distance(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct HospitalSnapshot {
    pub id: HospitalId,
    /// Emergency queue in service order.
    pub emergency: Vec<PatientId>,
    pub serious: Vec<PatientId>,
    pub normal: Vec<PatientId>,
    pub ready_standard: usize,
    pub ready_restricted: usize,
    pub outgoing: Vec<VehicleSnapshot>,
    pub returning: Vec<VehicleSnapshot>,
    pub emergency_forwarded: u64,
}

impl HospitalSnapshot {
    fn of(hospital: &Hospital) -> Self {
        let queues = hospital.queues();
        Self {
            id: hospital.id(),
            emergency: queues.emergency.iter().collect(),
            serious: queues.serious.iter().collect(),
            normal: queues.normal.iter().collect(),
            ready_standard: hospital.ready_count(VehicleClass::Standard),
            ready_restricted: hospital.ready_count(VehicleClass::Restricted),
            outgoing: hospital.outgoing().map(VehicleSnapshot::of).collect(),
            returning: hospital.returning().map(VehicleSnapshot::of).collect(),
            emergency_forwarded: hospital.emergency_forwarded(),
        }
    }
}

/// Read-only view of the network at the end of a tick.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct TickSnapshot {
    pub tick: Tick,
    pub hospitals: Vec<HospitalSnapshot>,
    pub finished: Vec<PatientId>,
}

impl TickSnapshot {
    pub fn capture(tick: Tick, network: &HospitalNetwork, telemetry: &DispatchTelemetry) -> Self {
        Self {
            tick,
            hospitals: network.iter().map(HospitalSnapshot::of).collect(),
            finished: telemetry.finished_at(tick).map(|r| r.pid).collect(),
        }
    }
}
