//! Seeded random scenarios, for benchmarks and for exercising the CLI without
//! hand-written input files.

use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

use crate::clock::{Tick, FIRST_TICK};
use crate::hospital::{FleetSize, HospitalId, VehicleSpeeds};
use crate::input::{CancellationRequest, DispatchInput, PatientRequest};
use crate::patient::{PatientId, PriorityClass};

/// Parameters for [generate_input]. The same parameters always produce the
/// same input.
#[derive(Debug, Clone)]
pub struct GeneratorParams {
    pub seed: u64,
    pub hospitals: usize,
    /// Upper bound on each hospital's Standard and Restricted vehicle counts.
    pub max_vehicles_per_class: u32,
    pub standard_speed: u64,
    pub restricted_speed: u64,
    /// Largest distance between two hospitals.
    pub max_hospital_distance: u64,
    pub requests: usize,
    /// Requests arrive uniformly over ticks `1..=request_window`.
    pub request_window: Tick,
    /// Largest one-way distance between a patient and its hospital.
    pub max_patient_distance: u64,
    /// Probability (0.0–1.0) that a request is an emergency.
    pub emergency_share: f64,
    /// Probability (0.0–1.0) that a non-emergency request is serious.
    pub serious_share: f64,
    pub max_severity: u32,
    /// Probability (0.0–1.0) that a request is later cancelled.
    pub cancellation_share: f64,
    /// Cancellations land at most this many ticks after the request.
    pub max_cancellation_delay: Tick,
}

impl Default for GeneratorParams {
    fn default() -> Self {
        Self {
            seed: 0,
            hospitals: 3,
            max_vehicles_per_class: 3,
            standard_speed: 5,
            restricted_speed: 8,
            max_hospital_distance: 40,
            requests: 50,
            request_window: 100,
            max_patient_distance: 30,
            emergency_share: 0.3,
            serious_share: 0.4,
            max_severity: 10,
            cancellation_share: 0.05,
            max_cancellation_delay: 10,
        }
    }
}

impl GeneratorParams {
    pub fn with_seed(mut self, seed: u64) -> Self {
        self.seed = seed;
        self
    }

    pub fn with_hospitals(mut self, hospitals: usize) -> Self {
        self.hospitals = hospitals;
        self
    }

    pub fn with_max_vehicles_per_class(mut self, max: u32) -> Self {
        self.max_vehicles_per_class = max;
        self
    }

    pub fn with_speeds(mut self, standard: u64, restricted: u64) -> Self {
        self.standard_speed = standard;
        self.restricted_speed = restricted;
        self
    }

    pub fn with_requests(mut self, requests: usize, window: Tick) -> Self {
        self.requests = requests;
        self.request_window = window;
        self
    }

    pub fn with_emergency_share(mut self, share: f64) -> Self {
        self.emergency_share = share;
        self
    }

    pub fn with_cancellation_share(mut self, share: f64) -> Self {
        self.cancellation_share = share;
        self
    }
}

/// Builds a random input. Every hospital gets at least one vehicle, patient ids
/// are `1..=requests` and requests are listed in arrival order.
pub fn generate_input(params: &GeneratorParams) -> DispatchInput {
    let mut rng = StdRng::seed_from_u64(params.seed);
    let hospitals = params.hospitals.max(1);

    let mut distances = vec![vec![0; hospitals]; hospitals];
    for from in 0..hospitals {
        for to in (from + 1)..hospitals {
            let distance = rng.gen_range(1..=params.max_hospital_distance.max(1));
            distances[from][to] = distance;
            distances[to][from] = distance;
        }
    }

    let fleets = (0..hospitals)
        .map(|_| {
            let standard = rng.gen_range(0..=params.max_vehicles_per_class);
            let restricted = rng.gen_range(0..=params.max_vehicles_per_class);
            if standard + restricted == 0 {
                FleetSize {
                    standard: 1,
                    restricted: 1,
                }
            } else {
                FleetSize {
                    standard,
                    restricted,
                }
            }
        })
        .collect();

    let emergency_share = params.emergency_share.clamp(0.0, 1.0);
    let serious_share = params.serious_share.clamp(0.0, 1.0);
    let mut requests: Vec<PatientRequest> = (1..=params.requests as u64)
        .map(|pid| {
            let priority = if rng.gen_bool(emergency_share) {
                PriorityClass::Emergency
            } else if rng.gen_bool(serious_share) {
                PriorityClass::Serious
            } else {
                PriorityClass::Normal
            };
            let severity = if priority == PriorityClass::Emergency {
                rng.gen_range(1..=params.max_severity.max(1))
            } else {
                0
            };
            PatientRequest {
                priority,
                request_tick: rng.gen_range(FIRST_TICK..=params.request_window.max(FIRST_TICK)),
                pid: PatientId(pid),
                hospital: HospitalId(rng.gen_range(1..=hospitals)),
                distance: rng.gen_range(1..=params.max_patient_distance.max(1)),
                severity,
            }
        })
        .collect();
    requests.sort_by_key(|request| request.request_tick);

    let cancellation_share = params.cancellation_share.clamp(0.0, 1.0);
    let mut cancellations = Vec::new();
    for request in &requests {
        if rng.gen_bool(cancellation_share) {
            cancellations.push(CancellationRequest {
                tick: request.request_tick + rng.gen_range(0..=params.max_cancellation_delay),
                pid: request.pid,
            });
        }
    }
    cancellations.sort_by_key(|cancellation| cancellation.tick);

    DispatchInput {
        speeds: VehicleSpeeds {
            standard: params.standard_speed.max(1),
            restricted: params.restricted_speed.max(1),
        },
        distances,
        fleets,
        requests,
        cancellations,
    }
}
