use std::cmp::Ordering;
use std::collections::BinaryHeap;

use bevy_ecs::prelude::Resource;

use crate::patient::PatientId;

/// One discrete unit of simulated time.
pub type Tick = u64;

/// The first tick the runner processes.
pub const FIRST_TICK: Tick = 1;

/// Kinds of scheduled admissions. Declaration order is the order in which
/// events sharing a tick are delivered.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum EventKind {
    RequestInbound,
    Cancellation,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Event {
    pub timestamp: Tick,
    pub kind: EventKind,
    pub subject: PatientId,
    /// Scheduling order; keeps same-tick events in source order.
    seq: u64,
}

impl Ord for Event {
    fn cmp(&self, other: &Self) -> Ordering {
        // Reverse ordering to make BinaryHeap a min-heap by (timestamp, kind, seq).
        other
            .timestamp
            .cmp(&self.timestamp)
            .then_with(|| other.kind.cmp(&self.kind))
            .then_with(|| other.seq.cmp(&self.seq))
    }
}

impl PartialOrd for Event {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

/// Logical tick counter plus the agenda of future admissions.
#[derive(Debug, Default, Resource)]
pub struct SimulationClock {
    now: Tick,
    events: BinaryHeap<Event>,
    next_seq: u64,
    last_scheduled: Tick,
}

impl SimulationClock {
    pub fn now(&self) -> Tick {
        self.now
    }

    pub fn schedule_at(&mut self, timestamp: Tick, kind: EventKind, subject: PatientId) {
        debug_assert!(
            timestamp > self.now,
            "event timestamp must be after the current tick"
        );
        let seq = self.next_seq;
        self.next_seq += 1;
        self.last_scheduled = self.last_scheduled.max(timestamp);
        self.events.push(Event {
            timestamp,
            kind,
            subject,
            seq,
        });
    }

    /// Moves the clock to the next tick and returns it.
    pub fn advance(&mut self) -> Tick {
        self.now += 1;
        self.now
    }

    /// Removes and returns every event due at or before the current tick, in delivery order.
    pub fn drain_due(&mut self) -> Vec<Event> {
        let mut due = Vec::new();
        while self
            .events
            .peek()
            .is_some_and(|event| event.timestamp <= self.now)
        {
            if let Some(event) = self.events.pop() {
                due.push(event);
            }
        }
        due
    }

    pub fn next_event_time(&self) -> Option<Tick> {
        self.events.peek().map(|event| event.timestamp)
    }

    /// Latest tick any event was ever scheduled for (0 when nothing was scheduled).
    pub fn last_scheduled_tick(&self) -> Tick {
        self.last_scheduled
    }

    pub fn pending(&self) -> usize {
        self.events.len()
    }

    pub fn is_empty(&self) -> bool {
        self.events.is_empty()
    }
}

/// Events delivered for the tick currently being processed.
#[derive(Debug, Clone, Default, Resource)]
pub struct CurrentTickEvents(pub Vec<Event>);

impl CurrentTickEvents {
    pub fn of_kind(&self, kind: EventKind) -> impl Iterator<Item = &Event> + '_ {
        self.0.iter().filter(move |event| event.kind == kind)
    }
}
