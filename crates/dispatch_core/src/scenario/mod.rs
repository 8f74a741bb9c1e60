//! Scenario setup: turn parsed input plus run policy into a ready-to-run world,
//! or generate a random input to feed it.

mod build;
pub mod generate;
mod params;

pub use build::build_world;
pub use generate::{generate_input, GeneratorParams};
pub use params::{
    CancellationScope, DispatchConfig, DispatchPolicy, EmergencyVehiclePreference,
    ForwardingMode, SimulationHorizon, TerminationPolicy, DEFAULT_HORIZON_MARGIN,
};
