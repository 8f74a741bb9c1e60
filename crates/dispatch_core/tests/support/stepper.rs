use dispatch_core::dispatcher::Dispatcher;
use dispatch_core::input::DispatchInput;
use dispatch_core::runner::RunOutcome;
use dispatch_core::scenario::DispatchConfig;
use dispatch_core::telemetry::TickSnapshot;

/// Steps a [Dispatcher] tick by tick, keeping every snapshot for later checks.
pub struct TickStepper {
    pub dispatcher: Dispatcher,
    pub snapshots: Vec<TickSnapshot>,
}

impl TickStepper {
    pub fn new(input: &DispatchInput, config: DispatchConfig) -> Self {
        Self {
            dispatcher: Dispatcher::new(input, config).expect("input should be valid"),
            snapshots: Vec::new(),
        }
    }

    /// Runs exactly one tick.
    pub fn step(&mut self) -> Option<RunOutcome> {
        let outcome = self.dispatcher.step().expect("tick should run");
        self.snapshots.push(self.dispatcher.snapshot());
        outcome
    }

    /// Runs `ticks` ticks, or fewer if the run stops first.
    pub fn step_n(&mut self, ticks: usize) -> Option<RunOutcome> {
        for _ in 0..ticks {
            if let Some(outcome) = self.step() {
                return Some(outcome);
            }
        }
        self.dispatcher.outcome()
    }

    /// Steps until the run stops.
    pub fn finish(&mut self) -> RunOutcome {
        loop {
            if let Some(outcome) = self.step() {
                return outcome;
            }
        }
    }
}

/// Runs `input` to completion and returns the stepper holding every snapshot.
pub fn run_to_end(input: &DispatchInput, config: DispatchConfig) -> (TickStepper, RunOutcome) {
    let mut stepper = TickStepper::new(input, config);
    let outcome = stepper.finish();
    (stepper, outcome)
}
