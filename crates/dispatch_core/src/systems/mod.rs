pub mod cancellation;
pub mod fleet;
pub mod forwarding;
pub mod request_inbound;

use bevy_ecs::prelude::Resource;
use tracing::error;

use crate::clock::Tick;
use crate::error::TransitionError;

/// Transition failures raised inside systems. Systems cannot return errors, so
/// they park them here and the runner aborts the run after the schedule.
#[derive(Debug, Clone, Default, Resource)]
pub struct InvariantViolations(pub Vec<(Tick, TransitionError)>);

impl InvariantViolations {
    pub fn record(&mut self, tick: Tick, violation: TransitionError) {
        error!(tick, %violation, "invariant violated");
        self.0.push((tick, violation));
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Removes and returns the earliest recorded violation.
    pub fn take_first(&mut self) -> Option<(Tick, TransitionError)> {
        if self.0.is_empty() {
            None
        } else {
            Some(self.0.remove(0))
        }
    }
}
