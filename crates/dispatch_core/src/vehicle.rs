//! Vehicle state machine: Ready -> Assigned -> Loaded -> Ready.
//!
//! Transitions are guarded; calling one from the wrong state returns a
//! [TransitionError] and leaves the vehicle untouched.

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::clock::Tick;
use crate::error::TransitionError;
use crate::hospital::HospitalId;
use crate::patient::{Patient, PatientId};

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum VehicleClass {
    Standard,
    Restricted,
}

impl VehicleClass {
    /// Short code used by the input, report and display formats.
    pub fn code(self) -> &'static str {
        match self {
            VehicleClass::Standard => "SC",
            VehicleClass::Restricted => "NC",
        }
    }
}

impl fmt::Display for VehicleClass {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            VehicleClass::Standard => f.write_str("standard"),
            VehicleClass::Restricted => f.write_str("restricted"),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum VehicleState {
    Ready,
    /// En route to the patient.
    Assigned,
    /// Returning to the hospital with the patient aboard.
    Loaded,
}

impl fmt::Display for VehicleState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            VehicleState::Ready => f.write_str("ready"),
            VehicleState::Assigned => f.write_str("assigned"),
            VehicleState::Loaded => f.write_str("loaded"),
        }
    }
}

/// Vehicle identity, scoped to its owning hospital for the whole run.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct VehicleId {
    pub hospital: HospitalId,
    pub number: u32,
}

impl fmt::Display for VehicleId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}_H{}", self.number, self.hospital)
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Vehicle {
    id: VehicleId,
    class: VehicleClass,
    speed: u64,
    state: VehicleState,
    current_patient: Option<PatientId>,
    remaining_distance: u64,
    busy_start_tick: Option<Tick>,
    total_busy_ticks: u64,
}

impl Vehicle {
    pub fn new(id: VehicleId, class: VehicleClass, speed: u64) -> Self {
        Self {
            id,
            class,
            speed,
            state: VehicleState::Ready,
            current_patient: None,
            remaining_distance: 0,
            busy_start_tick: None,
            total_busy_ticks: 0,
        }
    }

    pub fn id(&self) -> VehicleId {
        self.id
    }

    pub fn class(&self) -> VehicleClass {
        self.class
    }

    pub fn speed(&self) -> u64 {
        self.speed
    }

    pub fn state(&self) -> VehicleState {
        self.state
    }

    pub fn current_patient(&self) -> Option<PatientId> {
        self.current_patient
    }

    pub fn remaining_distance(&self) -> u64 {
        self.remaining_distance
    }

    pub fn busy_start_tick(&self) -> Option<Tick> {
        self.busy_start_tick
    }

    pub fn total_busy_ticks(&self) -> u64 {
        self.total_busy_ticks
    }

    pub fn is_ready(&self) -> bool {
        self.state == VehicleState::Ready
    }

    /// Display label such as `SC1_H2`.
    pub fn label(&self) -> String {
        format!("{}{}", self.class.code(), self.id)
    }

    fn illegal(&self, action: &'static str) -> TransitionError {
        TransitionError::IllegalVehicleState {
            vehicle: self.id,
            action,
            state: self.state,
        }
    }

    fn ensure_carrying(&self, pid: PatientId) -> Result<(), TransitionError> {
        if self.current_patient != Some(pid) {
            return Err(TransitionError::PatientMismatch {
                vehicle: self.id,
                pid,
                carried: self.current_patient,
            });
        }
        Ok(())
    }

    /// Sends a Ready vehicle towards `patient`, `distance` units away.
    pub fn assign(
        &mut self,
        patient: &Patient,
        distance: u64,
        tick: Tick,
    ) -> Result<(), TransitionError> {
        if self.state != VehicleState::Ready {
            return Err(self.illegal("be assigned"));
        }
        self.state = VehicleState::Assigned;
        self.current_patient = Some(patient.id);
        self.remaining_distance = distance;
        self.busy_start_tick = Some(tick);
        Ok(())
    }

    /// Moves one tick of travel; a Ready vehicle does not move.
    pub fn advance(&mut self) {
        if self.state != VehicleState::Ready {
            self.remaining_distance = self.remaining_distance.saturating_sub(self.speed);
        }
    }

    pub fn has_arrived(&self) -> bool {
        self.remaining_distance == 0
    }

    /// Loads the patient once the outbound leg is complete.
    pub fn pickup(&mut self, patient: &mut Patient, tick: Tick) -> Result<(), TransitionError> {
        if self.state != VehicleState::Assigned {
            return Err(self.illegal("pick up"));
        }
        if !self.has_arrived() {
            return Err(TransitionError::NotArrived {
                vehicle: self.id,
                action: "pick up",
                remaining: self.remaining_distance,
            });
        }
        self.ensure_carrying(patient.id)?;
        patient.record_pickup(tick)?;
        self.state = VehicleState::Loaded;
        self.remaining_distance = patient.distance;
        Ok(())
    }

    /// Drops the patient at the hospital and becomes Ready again.
    pub fn return_home(
        &mut self,
        patient: &mut Patient,
        tick: Tick,
    ) -> Result<(), TransitionError> {
        if self.state != VehicleState::Loaded {
            return Err(self.illegal("return home"));
        }
        if !self.has_arrived() {
            return Err(TransitionError::NotArrived {
                vehicle: self.id,
                action: "return home",
                remaining: self.remaining_distance,
            });
        }
        self.ensure_carrying(patient.id)?;
        patient.record_return(tick)?;
        if let Some(start) = self.busy_start_tick.take() {
            self.total_busy_ticks += tick.saturating_sub(start);
        }
        self.state = VehicleState::Ready;
        self.current_patient = None;
        self.remaining_distance = 0;
        Ok(())
    }

    /// Aborts the current trip from any state. The aborted trip's busy time is
    /// credited only when `credit_busy_time` is set. Returns the dropped patient.
    pub fn force_reset(&mut self, tick: Tick, credit_busy_time: bool) -> Option<PatientId> {
        if let Some(start) = self.busy_start_tick.take() {
            if credit_busy_time {
                self.total_busy_ticks += tick.saturating_sub(start);
            }
        }
        self.state = VehicleState::Ready;
        self.remaining_distance = 0;
        self.current_patient.take()
    }
}
