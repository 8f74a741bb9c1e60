//! Patients and the registry that owns them.
//!
//! Every other structure (queues, vehicles, telemetry) refers to a patient by
//! [PatientId] and looks it up here.

use std::collections::BTreeMap;
use std::fmt;

use bevy_ecs::prelude::Resource;
use serde::{Deserialize, Serialize};

use crate::clock::Tick;
use crate::error::{ConfigError, TransitionError};
use crate::hospital::HospitalId;

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct PatientId(pub u64);

impl fmt::Display for PatientId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum PriorityClass {
    Normal,
    Serious,
    Emergency,
}

impl PriorityClass {
    pub const ALL: [PriorityClass; 3] = [
        PriorityClass::Normal,
        PriorityClass::Serious,
        PriorityClass::Emergency,
    ];

    /// Short code used by the input and report formats.
    pub fn code(self) -> &'static str {
        match self {
            PriorityClass::Normal => "NP",
            PriorityClass::Serious => "SP",
            PriorityClass::Emergency => "EP",
        }
    }

    pub fn from_code(code: &str) -> Option<Self> {
        match code {
            "NP" => Some(PriorityClass::Normal),
            "SP" => Some(PriorityClass::Serious),
            "EP" => Some(PriorityClass::Emergency),
            _ => None,
        }
    }
}

impl fmt::Display for PriorityClass {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.code())
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Patient {
    pub id: PatientId,
    pub priority: PriorityClass,
    /// Ranking key inside the emergency queue; always 0 for other classes.
    pub severity: u32,
    pub request_tick: Tick,
    /// Hospital whose queue currently owns the request. Rebound on forwarding.
    pub home_hospital: HospitalId,
    /// Hospital named in the request.
    pub requested_hospital: HospitalId,
    /// One-way travel distance between the patient and the hospital.
    pub distance: u64,
    pickup_tick: Option<Tick>,
    finish_tick: Option<Tick>,
    cancelled: bool,
    served: bool,
    forwarded: bool,
}

impl Patient {
    pub fn new(
        id: PatientId,
        priority: PriorityClass,
        severity: u32,
        request_tick: Tick,
        hospital: HospitalId,
        distance: u64,
    ) -> Self {
        let severity = if priority == PriorityClass::Emergency {
            severity
        } else {
            0
        };
        Self {
            id,
            priority,
            severity,
            request_tick,
            home_hospital: hospital,
            requested_hospital: hospital,
            distance,
            pickup_tick: None,
            finish_tick: None,
            cancelled: false,
            served: false,
            forwarded: false,
        }
    }

    pub fn pickup_tick(&self) -> Option<Tick> {
        self.pickup_tick
    }

    pub fn finish_tick(&self) -> Option<Tick> {
        self.finish_tick
    }

    pub fn is_cancelled(&self) -> bool {
        self.cancelled
    }

    pub fn is_served(&self) -> bool {
        self.served
    }

    pub fn was_forwarded(&self) -> bool {
        self.forwarded
    }

    /// Served or cancelled: no further lifecycle change is possible.
    pub fn is_finalized(&self) -> bool {
        self.served || self.cancelled
    }

    /// Ticks between the request and the pickup.
    pub fn waiting_time(&self) -> Option<u64> {
        self.pickup_tick
            .map(|pickup| pickup.saturating_sub(self.request_tick))
    }

    fn ensure_open(&self, action: &'static str) -> Result<(), TransitionError> {
        if self.served {
            return Err(TransitionError::PatientFinalized {
                pid: self.id,
                action,
                status: "served",
            });
        }
        if self.cancelled {
            return Err(TransitionError::PatientFinalized {
                pid: self.id,
                action,
                status: "cancelled",
            });
        }
        Ok(())
    }

    pub(crate) fn record_pickup(&mut self, tick: Tick) -> Result<(), TransitionError> {
        self.ensure_open("picked up")?;
        debug_assert!(tick >= self.request_tick, "pickup before request");
        self.pickup_tick = Some(tick);
        Ok(())
    }

    pub(crate) fn record_return(&mut self, tick: Tick) -> Result<(), TransitionError> {
        self.ensure_open("returned")?;
        debug_assert!(
            self.pickup_tick.is_some_and(|pickup| pickup <= tick),
            "return before pickup"
        );
        self.finish_tick = Some(tick);
        self.served = true;
        Ok(())
    }

    pub(crate) fn cancel(&mut self) -> Result<(), TransitionError> {
        self.ensure_open("cancelled")?;
        self.cancelled = true;
        Ok(())
    }

    pub(crate) fn forward_to(&mut self, target: HospitalId) -> Result<(), TransitionError> {
        self.ensure_open("forwarded")?;
        if self.forwarded {
            return Err(TransitionError::AlreadyForwarded { pid: self.id });
        }
        self.forwarded = true;
        self.home_hospital = target;
        Ok(())
    }
}

/// Owner of every patient in the run, iterable in load order.
#[derive(Debug, Clone, Default, Resource)]
pub struct PatientRegistry {
    patients: BTreeMap<PatientId, Patient>,
    load_order: Vec<PatientId>,
}

impl PatientRegistry {
    pub fn insert(&mut self, patient: Patient) -> Result<(), ConfigError> {
        if self.patients.contains_key(&patient.id) {
            return Err(ConfigError::DuplicatePatient { pid: patient.id });
        }
        self.load_order.push(patient.id);
        self.patients.insert(patient.id, patient);
        Ok(())
    }

    pub fn get(&self, pid: PatientId) -> Option<&Patient> {
        self.patients.get(&pid)
    }

    pub fn get_mut(&mut self, pid: PatientId) -> Option<&mut Patient> {
        self.patients.get_mut(&pid)
    }

    pub(crate) fn require_mut(&mut self, pid: PatientId) -> Result<&mut Patient, TransitionError> {
        self.patients
            .get_mut(&pid)
            .ok_or(TransitionError::MissingPatient { pid })
    }

    pub fn contains(&self, pid: PatientId) -> bool {
        self.patients.contains_key(&pid)
    }

    pub fn len(&self) -> usize {
        self.load_order.len()
    }

    pub fn is_empty(&self) -> bool {
        self.load_order.is_empty()
    }

    /// Patients in the order they were loaded.
    pub fn iter(&self) -> impl Iterator<Item = &Patient> + '_ {
        self.load_order
            .iter()
            .filter_map(move |pid| self.patients.get(pid))
    }

    pub fn count_by_priority(&self, priority: PriorityClass) -> usize {
        self.iter().filter(|p| p.priority == priority).count()
    }

    pub fn served(&self) -> impl Iterator<Item = &Patient> + '_ {
        self.iter().filter(|p| p.is_served())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn emergency(pid: u64, severity: u32) -> Patient {
        Patient::new(
            PatientId(pid),
            PriorityClass::Emergency,
            severity,
            2,
            HospitalId(1),
            10,
        )
    }

    #[test]
    fn severity_is_dropped_for_non_emergency_patients() {
        let patient = Patient::new(
            PatientId(1),
            PriorityClass::Serious,
            7,
            1,
            HospitalId(1),
            4,
        );
        assert_eq!(patient.severity, 0);
        assert_eq!(emergency(2, 7).severity, 7);
    }

    #[test]
    fn served_patient_cannot_be_cancelled() {
        let mut patient = emergency(1, 3);
        patient.record_pickup(4).expect("pickup");
        patient.record_return(6).expect("return");
        assert!(patient.is_served());
        assert_eq!(patient.waiting_time(), Some(2));

        let err = patient.cancel().expect_err("cancel after serve");
        assert!(matches!(err, TransitionError::PatientFinalized { .. }));
        assert!(!patient.is_cancelled());
    }

    #[test]
    fn cancelled_patient_cannot_be_served() {
        let mut patient = emergency(1, 3);
        patient.cancel().expect("cancel");
        assert!(patient.record_pickup(3).is_err());
        assert!(patient.record_return(3).is_err());
        assert!(!patient.is_served());
    }

    #[test]
    fn forwarding_happens_at_most_once() {
        let mut patient = emergency(1, 3);
        patient.forward_to(HospitalId(2)).expect("first forward");
        assert_eq!(patient.home_hospital, HospitalId(2));
        assert_eq!(patient.requested_hospital, HospitalId(1));
        assert_eq!(
            patient.forward_to(HospitalId(3)),
            Err(TransitionError::AlreadyForwarded { pid: PatientId(1) })
        );
        assert_eq!(patient.home_hospital, HospitalId(2));
    }

    #[test]
    fn registry_rejects_duplicates_and_keeps_load_order() {
        let mut registry = PatientRegistry::default();
        registry.insert(emergency(9, 1)).expect("insert 9");
        registry.insert(emergency(3, 1)).expect("insert 3");
        assert_eq!(
            registry.insert(emergency(9, 2)),
            Err(ConfigError::DuplicatePatient { pid: PatientId(9) })
        );
        let order: Vec<_> = registry.iter().map(|p| p.id).collect();
        assert_eq!(order, vec![PatientId(9), PatientId(3)]);
        assert_eq!(registry.count_by_priority(PriorityClass::Emergency), 2);
    }
}
