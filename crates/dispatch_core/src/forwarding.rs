//! Cross-hospital forwarding of emergency requests that could not be served locally.

use bevy_ecs::prelude::Resource;
use tracing::debug;

use crate::clock::Tick;
use crate::distance::DistanceModel;
use crate::error::TransitionError;
use crate::hospital::{HospitalId, HospitalNetwork};
use crate::patient::{PatientId, PatientRegistry};
use crate::scenario::ForwardingMode;
use crate::telemetry::ForwardRecord;

/// Another hospital that could take over an emergency request.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ForwardCandidate {
    pub hospital: HospitalId,
    pub emergency_queue_len: usize,
    /// Distance from the origin hospital.
    pub distance: u64,
}

/// Chooses where an unserved emergency request goes.
pub trait ForwardingStrategy: Send + Sync {
    /// Returns the hospital that should receive one request from `origin`, or
    /// `None` to keep it where it is. `candidates` never contains `origin`.
    fn select_target(
        &self,
        origin: HospitalId,
        origin_queue_len: usize,
        candidates: &[ForwardCandidate],
    ) -> Option<HospitalId>;
}

/// Fewest queued emergencies wins, nearest breaks ties, lowest id breaks the
/// rest. A move only happens when the target's queue is strictly shorter than
/// the origin's before the move, so a queue of 3 against 2 still forwards.
#[derive(Debug, Clone, Copy, Default)]
pub struct LeastLoadedForwarding;

impl ForwardingStrategy for LeastLoadedForwarding {
    fn select_target(
        &self,
        _origin: HospitalId,
        origin_queue_len: usize,
        candidates: &[ForwardCandidate],
    ) -> Option<HospitalId> {
        candidates
            .iter()
            .min_by_key(|c| (c.emergency_queue_len, c.distance, c.hospital))
            .filter(|c| c.emergency_queue_len < origin_queue_len)
            .map(|c| c.hospital)
    }
}

/// Every request stays with its home hospital.
#[derive(Debug, Clone, Copy, Default)]
pub struct NoForwarding;

impl ForwardingStrategy for NoForwarding {
    fn select_target(
        &self,
        _origin: HospitalId,
        _origin_queue_len: usize,
        _candidates: &[ForwardCandidate],
    ) -> Option<HospitalId> {
        None
    }
}

/// Resource wrapper for the forwarding strategy trait object.
#[derive(Resource)]
pub struct ForwardingStrategyResource(pub Box<dyn ForwardingStrategy>);

impl ForwardingStrategyResource {
    pub fn new(strategy: Box<dyn ForwardingStrategy>) -> Self {
        Self(strategy)
    }
}

impl std::ops::Deref for ForwardingStrategyResource {
    type Target = dyn ForwardingStrategy;

    fn deref(&self) -> &Self::Target {
        self.0.as_ref()
    }
}

pub fn build_forwarding_strategy(mode: ForwardingMode) -> ForwardingStrategyResource {
    match mode {
        ForwardingMode::LeastLoaded => ForwardingStrategyResource::new(Box::new(LeastLoadedForwarding)),
        ForwardingMode::Disabled => ForwardingStrategyResource::new(Box::new(NoForwarding)),
    }
}

/// One pass over every hospital's emergency queue, in hospital order. A patient
/// moves at most once per run; each move bumps the origin's forwarded counter.
/// Hospitals without vehicles are never offered as targets, since a forward is
/// final and such a hospital could not serve the request.
pub fn forward_unserved_emergencies(
    tick: Tick,
    network: &mut HospitalNetwork,
    distances: &DistanceModel,
    registry: &mut PatientRegistry,
    strategy: &dyn ForwardingStrategy,
) -> Result<Vec<ForwardRecord>, TransitionError> {
    let mut records = Vec::new();
    let origins: Vec<HospitalId> = network.ids().collect();

    for origin in origins {
        let waiting: Vec<PatientId> = match network.get(origin) {
            Some(hospital) => hospital.queues().emergency.iter().collect(),
            None => continue,
        };

        for pid in waiting {
            let patient = registry
                .get(pid)
                .ok_or(TransitionError::MissingPatient { pid })?;
            if patient.was_forwarded() {
                continue;
            }

            let origin_queue_len = network
                .get(origin)
                .map_or(0, |h| h.queues().emergency.len());
            let candidates: Vec<ForwardCandidate> = network
                .iter()
                .filter(|h| h.id() != origin && h.fleet_size() > 0)
                .filter_map(|h| {
                    Some(ForwardCandidate {
                        hospital: h.id(),
                        emergency_queue_len: h.queues().emergency.len(),
                        distance: distances.distance(origin, h.id())?,
                    })
                })
                .collect();

            let Some(target) = strategy.select_target(origin, origin_queue_len, &candidates)
            else {
                continue;
            };
            if target == origin {
                continue;
            }

            let patient = registry.require_mut(pid)?;
            patient.forward_to(target)?;
            let origin_hospital = network.require_mut(origin)?;
            origin_hospital.queues_mut().emergency.remove(pid);
            origin_hospital.record_forward();
            network.require_mut(target)?.admit(patient);

            debug!(tick, pid = %pid, from = %origin, to = %target, "emergency forwarded");
            records.push(ForwardRecord {
                pid,
                from: origin,
                to: target,
                tick,
            });
        }
    }
    Ok(records)
}
