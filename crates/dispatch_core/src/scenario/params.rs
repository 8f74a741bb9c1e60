use bevy_ecs::prelude::Resource;
use serde::{Deserialize, Serialize};

use crate::clock::Tick;
use crate::vehicle::VehicleClass;

/// Ticks added to the latest scheduled event to bound a run.
pub const DEFAULT_HORIZON_MARGIN: Tick = 1000;

/// Vehicle class tried first when serving an emergency request.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum EmergencyVehiclePreference {
    #[default]
    RestrictedFirst,
    StandardFirst,
}

impl EmergencyVehiclePreference {
    pub fn order(self) -> [VehicleClass; 2] {
        match self {
            EmergencyVehiclePreference::RestrictedFirst => {
                [VehicleClass::Restricted, VehicleClass::Standard]
            }
            EmergencyVehiclePreference::StandardFirst => {
                [VehicleClass::Standard, VehicleClass::Restricted]
            }
        }
    }
}

/// Which trip stages a cancellation may abort.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum CancellationScope {
    /// Queued, Assigned and Loaded patients can all be cancelled.
    #[default]
    AnyTrip,
    /// A Loaded trip is past the point of cancellation.
    OutboundOnly,
}

/// How unserved emergency requests are rebalanced across hospitals.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum ForwardingMode {
    #[default]
    LeastLoaded,
    Disabled,
}

/// When the runner stops.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum TerminationPolicy {
    /// Stop once nothing is busy, queued or scheduled; the horizon is only a bound.
    #[default]
    Converged,
    /// Always run up to the horizon.
    FixedHorizon,
}

/// Per-tick dispatch rules read by the systems.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Resource)]
pub struct DispatchPolicy {
    pub emergency_vehicle_preference: EmergencyVehiclePreference,
    pub cancellation_scope: CancellationScope,
    /// Credit the ticks of an aborted trip to the vehicle's busy time.
    pub credit_aborted_trips: bool,
}

/// Last tick the runner may process and how it decides to stop before that.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Resource)]
pub struct SimulationHorizon {
    pub end_tick: Tick,
    pub termination: TerminationPolicy,
}

/// Parameters for building a run from parsed input.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DispatchConfig {
    pub policy: DispatchPolicy,
    pub forwarding: ForwardingMode,
    pub termination: TerminationPolicy,
    pub horizon_margin: Tick,
}

impl Default for DispatchConfig {
    fn default() -> Self {
        Self {
            policy: DispatchPolicy::default(),
            forwarding: ForwardingMode::default(),
            termination: TerminationPolicy::default(),
            horizon_margin: DEFAULT_HORIZON_MARGIN,
        }
    }
}

impl DispatchConfig {
    pub fn with_emergency_vehicle_preference(
        mut self,
        preference: EmergencyVehiclePreference,
    ) -> Self {
        self.policy.emergency_vehicle_preference = preference;
        self
    }

    pub fn with_cancellation_scope(mut self, scope: CancellationScope) -> Self {
        self.policy.cancellation_scope = scope;
        self
    }

    pub fn with_credit_aborted_trips(mut self, credit: bool) -> Self {
        self.policy.credit_aborted_trips = credit;
        self
    }

    pub fn with_forwarding(mut self, forwarding: ForwardingMode) -> Self {
        self.forwarding = forwarding;
        self
    }

    pub fn with_termination(mut self, termination: TerminationPolicy) -> Self {
        self.termination = termination;
        self
    }

    pub fn with_horizon_margin(mut self, margin: Tick) -> Self {
        self.horizon_margin = margin;
        self
    }
}
