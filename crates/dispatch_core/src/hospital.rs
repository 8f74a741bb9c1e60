//! Hospitals: a fixed vehicle pool, three inbound queues and the per-tick
//! assignment policy.

use std::fmt;

use bevy_ecs::prelude::Resource;
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::clock::Tick;
use crate::error::TransitionError;
use crate::patient::{Patient, PatientId, PatientRegistry, PriorityClass};
use crate::queue::{FifoQueue, RequestQueues};
use crate::scenario::EmergencyVehiclePreference;
use crate::vehicle::{Vehicle, VehicleClass, VehicleId, VehicleState};

/// 1-based hospital identifier, as used by the input format.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct HospitalId(pub usize);

impl HospitalId {
    /// Zero-based position in the network, `None` for the invalid id 0.
    pub fn index(self) -> Option<usize> {
        self.0.checked_sub(1)
    }

    pub fn from_index(index: usize) -> Self {
        HospitalId(index + 1)
    }
}

impl fmt::Display for HospitalId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Number of vehicles of each class a hospital starts with.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct FleetSize {
    pub standard: u32,
    pub restricted: u32,
}

impl FleetSize {
    pub fn total(&self) -> u32 {
        self.standard + self.restricted
    }
}

/// Travel speed per vehicle class, shared by every hospital.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct VehicleSpeeds {
    pub standard: u64,
    pub restricted: u64,
}

impl VehicleSpeeds {
    pub fn of(&self, class: VehicleClass) -> u64 {
        match class {
            VehicleClass::Standard => self.standard,
            VehicleClass::Restricted => self.restricted,
        }
    }
}

/// A vehicle leaving for a patient during the assignment pass.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Assignment {
    pub vehicle: VehicleId,
    pub class: VehicleClass,
    pub patient: PatientId,
    pub priority: PriorityClass,
}

/// Trip milestones reached while advancing a fleet by one tick.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FleetProgress {
    pub picked_up: Vec<(VehicleId, PatientId)>,
    pub returned: Vec<(VehicleId, PatientId)>,
}

#[derive(Debug, Clone)]
pub struct Hospital {
    id: HospitalId,
    vehicles: Vec<Vehicle>,
    queues: RequestQueues,
    emergency_forwarded: u64,
}

impl Hospital {
    /// Builds the pool with Standard vehicles numbered first, then Restricted.
    pub fn new(id: HospitalId, fleet: FleetSize, speeds: VehicleSpeeds) -> Self {
        let classes = std::iter::repeat(VehicleClass::Standard)
            .take(fleet.standard as usize)
            .chain(std::iter::repeat(VehicleClass::Restricted).take(fleet.restricted as usize));
        let vehicles = classes
            .zip(1u32..)
            .map(|(class, number)| {
                Vehicle::new(
                    VehicleId {
                        hospital: id,
                        number,
                    },
                    class,
                    speeds.of(class),
                )
            })
            .collect();
        Self {
            id,
            vehicles,
            queues: RequestQueues::default(),
            emergency_forwarded: 0,
        }
    }

    pub fn id(&self) -> HospitalId {
        self.id
    }

    pub fn vehicles(&self) -> &[Vehicle] {
        &self.vehicles
    }

    pub fn queues(&self) -> &RequestQueues {
        &self.queues
    }

    pub(crate) fn queues_mut(&mut self) -> &mut RequestQueues {
        &mut self.queues
    }

    /// Emergency requests this hospital handed to another hospital.
    pub fn emergency_forwarded(&self) -> u64 {
        self.emergency_forwarded
    }

    pub fn fleet_size(&self) -> usize {
        self.vehicles.len()
    }

    pub fn count_in_state(&self, state: VehicleState) -> usize {
        self.vehicles.iter().filter(|v| v.state() == state).count()
    }

    pub fn count_of_class(&self, class: VehicleClass) -> usize {
        self.vehicles.iter().filter(|v| v.class() == class).count()
    }

    pub fn ready_count(&self, class: VehicleClass) -> usize {
        self.vehicles
            .iter()
            .filter(|v| v.class() == class && v.is_ready())
            .count()
    }

    /// Vehicles en route to a patient.
    pub fn outgoing(&self) -> impl Iterator<Item = &Vehicle> + '_ {
        self.vehicles
            .iter()
            .filter(|v| v.state() == VehicleState::Assigned)
    }

    /// Vehicles heading back with a patient aboard.
    pub fn returning(&self) -> impl Iterator<Item = &Vehicle> + '_ {
        self.vehicles
            .iter()
            .filter(|v| v.state() == VehicleState::Loaded)
    }

    /// No busy vehicle and no queued request.
    pub fn is_idle(&self) -> bool {
        self.queues.is_empty() && self.vehicles.iter().all(Vehicle::is_ready)
    }

    pub fn admit(&mut self, patient: &Patient) {
        self.queues.enqueue(patient);
    }

    /// Takes a queued request out of whichever queue holds it.
    pub fn withdraw(&mut self, pid: PatientId) -> Option<PriorityClass> {
        self.queues.remove(pid)
    }

    pub fn vehicle_carrying(&self, pid: PatientId) -> Option<&Vehicle> {
        self.vehicles
            .iter()
            .find(|v| v.current_patient() == Some(pid))
    }

    pub fn vehicle_carrying_mut(&mut self, pid: PatientId) -> Option<&mut Vehicle> {
        self.vehicles
            .iter_mut()
            .find(|v| v.current_patient() == Some(pid))
    }

    pub(crate) fn record_forward(&mut self) {
        self.emergency_forwarded += 1;
    }

    /// Moves every busy vehicle one tick and applies pickups and returns.
    pub fn advance_fleet(
        &mut self,
        tick: Tick,
        registry: &mut PatientRegistry,
    ) -> Result<FleetProgress, TransitionError> {
        let mut progress = FleetProgress::default();
        for vehicle in self.vehicles.iter_mut().filter(|v| !v.is_ready()) {
            vehicle.advance();
            if !vehicle.has_arrived() {
                continue;
            }
            let Some(pid) = vehicle.current_patient() else {
                continue;
            };
            let patient = registry.require_mut(pid)?;
            match vehicle.state() {
                VehicleState::Assigned => {
                    vehicle.pickup(patient, tick)?;
                    debug!(tick, vehicle = %vehicle.label(), pid = %pid, "patient picked up");
                    progress.picked_up.push((vehicle.id(), pid));
                }
                VehicleState::Loaded => {
                    vehicle.return_home(patient, tick)?;
                    debug!(tick, vehicle = %vehicle.label(), pid = %pid, "patient delivered");
                    progress.returned.push((vehicle.id(), pid));
                }
                VehicleState::Ready => {}
            }
        }
        Ok(progress)
    }

    /// Hands Ready vehicles to queued requests: emergencies by severity on either
    /// class, then Serious on Standard vehicles, then Normal on Restricted vehicles.
    pub fn assign_waiting(
        &mut self,
        tick: Tick,
        registry: &PatientRegistry,
        preference: EmergencyVehiclePreference,
    ) -> Result<Vec<Assignment>, TransitionError> {
        let mut assignments = Vec::new();

        while !self.queues.emergency.is_empty() {
            let Some(index) = preference
                .order()
                .into_iter()
                .find_map(|class| self.ready_vehicle(class))
            else {
                break;
            };
            let Some(pid) = self.queues.emergency.pop() else {
                break;
            };
            assignments.push(self.dispatch(index, pid, tick, registry)?);
        }

        self.drain_fifo(
            PriorityClass::Serious,
            VehicleClass::Standard,
            tick,
            registry,
            &mut assignments,
        )?;
        self.drain_fifo(
            PriorityClass::Normal,
            VehicleClass::Restricted,
            tick,
            registry,
            &mut assignments,
        )?;
        Ok(assignments)
    }

    fn drain_fifo(
        &mut self,
        priority: PriorityClass,
        class: VehicleClass,
        tick: Tick,
        registry: &PatientRegistry,
        assignments: &mut Vec<Assignment>,
    ) -> Result<(), TransitionError> {
        while let Some(index) = self.ready_vehicle(class) {
            let Some(pid) = self.fifo_mut(priority).pop() else {
                break;
            };
            assignments.push(self.dispatch(index, pid, tick, registry)?);
        }
        Ok(())
    }

    fn fifo_mut(&mut self, priority: PriorityClass) -> &mut FifoQueue {
        match priority {
            PriorityClass::Serious => &mut self.queues.serious,
            _ => &mut self.queues.normal,
        }
    }

    fn ready_vehicle(&self, class: VehicleClass) -> Option<usize> {
        self.vehicles
            .iter()
            .position(|v| v.class() == class && v.is_ready())
    }

    fn dispatch(
        &mut self,
        index: usize,
        pid: PatientId,
        tick: Tick,
        registry: &PatientRegistry,
    ) -> Result<Assignment, TransitionError> {
        let patient = registry
            .get(pid)
            .ok_or(TransitionError::MissingPatient { pid })?;
        let vehicle = &mut self.vehicles[index];
        vehicle.assign(patient, patient.distance, tick)?;
        debug!(
            tick,
            hospital = %self.id,
            vehicle = %vehicle.label(),
            pid = %pid,
            priority = %patient.priority,
            "vehicle assigned"
        );
        Ok(Assignment {
            vehicle: vehicle.id(),
            class: vehicle.class(),
            patient: pid,
            priority: patient.priority,
        })
    }
}

/// Every hospital in the run, indexed by [HospitalId].
#[derive(Debug, Clone, Default, Resource)]
pub struct HospitalNetwork {
    hospitals: Vec<Hospital>,
}

impl HospitalNetwork {
    pub fn new(hospitals: Vec<Hospital>) -> Self {
        Self { hospitals }
    }

    pub fn len(&self) -> usize {
        self.hospitals.len()
    }

    pub fn is_empty(&self) -> bool {
        self.hospitals.is_empty()
    }

    pub fn get(&self, id: HospitalId) -> Option<&Hospital> {
        self.hospitals.get(id.index()?)
    }

    pub fn get_mut(&mut self, id: HospitalId) -> Option<&mut Hospital> {
        self.hospitals.get_mut(id.index()?)
    }

    pub(crate) fn require_mut(&mut self, id: HospitalId) -> Result<&mut Hospital, TransitionError> {
        self.get_mut(id)
            .ok_or(TransitionError::MissingHospital { hospital: id })
    }

    pub fn iter(&self) -> impl Iterator<Item = &Hospital> + '_ {
        self.hospitals.iter()
    }

    pub fn iter_mut(&mut self) -> impl Iterator<Item = &mut Hospital> + '_ {
        self.hospitals.iter_mut()
    }

    pub fn ids(&self) -> impl Iterator<Item = HospitalId> + '_ {
        self.hospitals.iter().map(Hospital::id)
    }

    /// Every vehicle Ready and every queue empty.
    pub fn is_idle(&self) -> bool {
        self.hospitals.iter().all(Hospital::is_idle)
    }

    pub fn vehicle_count(&self, class: VehicleClass) -> usize {
        self.hospitals.iter().map(|h| h.count_of_class(class)).sum()
    }

    pub fn total_vehicles(&self) -> usize {
        self.hospitals.iter().map(Hospital::fleet_size).sum()
    }

    pub fn vehicles(&self) -> impl Iterator<Item = &Vehicle> + '_ {
        self.hospitals.iter().flat_map(|h| h.vehicles().iter())
    }

    /// Hospital whose queue holds `pid`, if any.
    pub fn locate_queued(&self, pid: PatientId) -> Option<HospitalId> {
        self.hospitals
            .iter()
            .find(|h| h.queues().contains(pid))
            .map(Hospital::id)
    }

    /// Hospital owning the vehicle that carries `pid`, if any.
    pub fn locate_carrier(&self, pid: PatientId) -> Option<HospitalId> {
        self.hospitals
            .iter()
            .find(|h| h.vehicle_carrying(pid).is_some())
            .map(Hospital::id)
    }

    pub fn total_emergency_forwarded(&self) -> u64 {
        self.hospitals.iter().map(Hospital::emergency_forwarded).sum()
    }
}
