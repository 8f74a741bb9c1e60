//! Test helpers for building small inputs and worlds.
//!
//! Shared by unit tests, integration tests and benchmarks so every fixture
//! is written the same way.

use bevy_ecs::prelude::World;

use crate::clock::Tick;
use crate::hospital::{FleetSize, HospitalId, VehicleSpeeds};
use crate::input::{CancellationRequest, DispatchInput, PatientRequest};
use crate::patient::{PatientId, PriorityClass};
use crate::scenario::{build_world, DispatchConfig};

/// Speed used for both vehicle classes unless overridden.
pub const TEST_SPEED: u64 = 5;

/// Builder for hand-written inputs. Hospital numbers are 1-based, as in the
/// input format.
#[derive(Debug, Clone)]
pub struct InputBuilder {
    speeds: VehicleSpeeds,
    distances: Vec<Vec<u64>>,
    fleets: Vec<FleetSize>,
    requests: Vec<PatientRequest>,
    cancellations: Vec<CancellationRequest>,
}

impl InputBuilder {
    /// `hospitals` hospitals spaced 10 apart on a line, each with one
    /// Standard and one Restricted vehicle.
    pub fn new(hospitals: usize) -> Self {
        let distances = (0..hospitals)
            .map(|from| {
                (0..hospitals)
                    .map(|to| from.abs_diff(to) as u64 * 10)
                    .collect()
            })
            .collect();
        Self {
            speeds: VehicleSpeeds {
                standard: TEST_SPEED,
                restricted: TEST_SPEED,
            },
            distances,
            fleets: vec![
                FleetSize {
                    standard: 1,
                    restricted: 1,
                };
                hospitals
            ],
            requests: Vec::new(),
            cancellations: Vec::new(),
        }
    }

    pub fn with_speeds(mut self, standard: u64, restricted: u64) -> Self {
        self.speeds = VehicleSpeeds {
            standard,
            restricted,
        };
        self
    }

    /// # Panics
    ///
    /// Panics if `hospital` is outside the network.
    pub fn with_fleet(mut self, hospital: usize, standard: u32, restricted: u32) -> Self {
        self.fleets[hospital - 1] = FleetSize {
            standard,
            restricted,
        };
        self
    }

    /// Sets the distance both ways.
    pub fn with_distance(mut self, a: usize, b: usize, distance: u64) -> Self {
        self.distances[a - 1][b - 1] = distance;
        self.distances[b - 1][a - 1] = distance;
        self
    }

    fn request(
        mut self,
        priority: PriorityClass,
        tick: Tick,
        pid: u64,
        hospital: usize,
        distance: u64,
        severity: u32,
    ) -> Self {
        self.requests.push(PatientRequest {
            priority,
            request_tick: tick,
            pid: PatientId(pid),
            hospital: HospitalId(hospital),
            distance,
            severity,
        });
        self
    }

    pub fn normal(self, tick: Tick, pid: u64, hospital: usize, distance: u64) -> Self {
        self.request(PriorityClass::Normal, tick, pid, hospital, distance, 0)
    }

    pub fn serious(self, tick: Tick, pid: u64, hospital: usize, distance: u64) -> Self {
        self.request(PriorityClass::Serious, tick, pid, hospital, distance, 0)
    }

    pub fn emergency(
        self,
        tick: Tick,
        pid: u64,
        hospital: usize,
        distance: u64,
        severity: u32,
    ) -> Self {
        self.request(PriorityClass::Emergency, tick, pid, hospital, distance, severity)
    }

    pub fn cancel(mut self, tick: Tick, pid: u64) -> Self {
        self.cancellations.push(CancellationRequest {
            tick,
            pid: PatientId(pid),
        });
        self
    }

    pub fn build(self) -> DispatchInput {
        DispatchInput {
            speeds: self.speeds,
            distances: self.distances,
            fleets: self.fleets,
            requests: self.requests,
            cancellations: self.cancellations,
        }
    }
}

/// Builds a ready-to-run world from `input`.
///
/// # Panics
///
/// Panics if the input is rejected.
pub fn create_test_world(input: &DispatchInput, config: DispatchConfig) -> World {
    let mut world = World::new();
    build_world(&mut world, input, config).expect("test input should be valid");
    world
}
