//! Error taxonomy for loading, validating and running a dispatch simulation.

use std::io;
use std::path::PathBuf;

use thiserror::Error;

use crate::clock::Tick;
use crate::hospital::HospitalId;
use crate::patient::PatientId;
use crate::vehicle::{VehicleClass, VehicleId, VehicleState};

pub type DispatchResult<T> = Result<T, DispatchError>;

/// The input file could not be read or does not follow the line grammar.
#[derive(Debug, Error)]
pub enum LoadError {
    #[error("failed to read {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    #[error("unexpected end of input: expected {expected}")]
    UnexpectedEof { expected: &'static str },

    #[error("line {line}: expected {expected} fields, found {found}")]
    FieldCount {
        line: usize,
        expected: usize,
        found: usize,
    },

    #[error("line {line}: `{token}` is not a valid {what}")]
    InvalidNumber {
        line: usize,
        token: String,
        what: &'static str,
    },

    #[error("line {line}: unknown priority class `{token}` (expected NP, SP or EP)")]
    UnknownPriority { line: usize, token: String },

    #[error("line {line}: unexpected trailing content `{content}`")]
    TrailingContent { line: usize, content: String },
}

/// Parsed input that cannot describe a run.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum ConfigError {
    #[error("the network has no hospitals")]
    EmptyNetwork,

    #[error("distance matrix row {row} has {found} entries, expected {expected}")]
    DistanceMatrixShape {
        row: usize,
        expected: usize,
        found: usize,
    },

    #[error("fleet table has {found} rows for {expected} hospitals")]
    FleetCountMismatch { expected: usize, found: usize },

    #[error("{class} vehicles must have a non-zero speed")]
    ZeroSpeed { class: VehicleClass },

    #[error("patient {pid} references hospital {hospital}, valid range is 1..={count}")]
    UnknownHospital {
        pid: PatientId,
        hospital: usize,
        count: usize,
    },

    #[error("patient {pid} is listed more than once")]
    DuplicatePatient { pid: PatientId },

    #[error("cancellation at tick {tick} references unknown patient {pid}")]
    UnknownCancellationTarget { pid: PatientId, tick: Tick },

    #[error("{what} for patient {pid} is scheduled at tick 0; the clock starts at 1")]
    TickBeforeStart { pid: PatientId, what: &'static str },

    #[error("horizon margin {margin} past tick {last_tick} does not fit in a tick counter")]
    HorizonOverflow { last_tick: Tick, margin: Tick },
}

/// An illegal state-machine transition. These never happen while the assignment
/// policy is followed, so surfacing one means an internal invariant broke.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum TransitionError {
    #[error("vehicle {vehicle} cannot {action} while {state}")]
    IllegalVehicleState {
        vehicle: VehicleId,
        action: &'static str,
        state: VehicleState,
    },

    #[error("vehicle {vehicle} has {remaining} distance left and cannot {action}")]
    NotArrived {
        vehicle: VehicleId,
        action: &'static str,
        remaining: u64,
    },

    #[error("vehicle {vehicle} carries {carried:?}, not patient {pid}")]
    PatientMismatch {
        vehicle: VehicleId,
        pid: PatientId,
        carried: Option<PatientId>,
    },

    #[error("patient {pid} cannot be {action}: already {status}")]
    PatientFinalized {
        pid: PatientId,
        action: &'static str,
        status: &'static str,
    },

    #[error("patient {pid} was already forwarded once")]
    AlreadyForwarded { pid: PatientId },

    #[error("patient {pid} is not in the registry")]
    MissingPatient { pid: PatientId },

    #[error("hospital {hospital} is not part of the network")]
    MissingHospital { hospital: HospitalId },
}

/// The report or an export could not be written.
#[derive(Debug, Error)]
pub enum ReportError {
    #[error("failed to write report: {0}")]
    Io(#[from] io::Error),

    #[error("failed to encode summary as json: {0}")]
    Json(#[from] serde_json::Error),

    #[error("failed to write csv records: {0}")]
    Csv(#[from] csv::Error),
}

/// Anything that stops a run.
#[derive(Debug, Error)]
pub enum DispatchError {
    #[error(transparent)]
    Load(#[from] LoadError),

    #[error("invalid configuration: {0}")]
    Config(#[from] ConfigError),

    #[error("invariant violated at tick {tick}: {source}")]
    Invariant {
        tick: Tick,
        #[source]
        source: TransitionError,
    },
}
