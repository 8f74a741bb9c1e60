pub mod clock;
pub mod dispatcher;
pub mod distance;
pub mod error;
pub mod forwarding;
pub mod hospital;
pub mod input;
pub mod patient;
pub mod queue;
pub mod report;
pub mod runner;
pub mod scenario;
pub mod systems;
pub mod telemetry;
pub mod telemetry_export;
pub mod vehicle;

#[cfg(any(test, feature = "test-helpers"))]
pub mod test_helpers;
