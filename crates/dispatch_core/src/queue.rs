//! Per-hospital request queues.

use std::cmp::Reverse;
use std::collections::{BTreeMap, VecDeque};

use crate::patient::{Patient, PatientId, PriorityClass};

/// Emergency requests keyed by (severity descending, insertion order ascending).
#[derive(Debug, Clone, Default)]
pub struct EmergencyQueue {
    entries: BTreeMap<(Reverse<u32>, u64), PatientId>,
    next_seq: u64,
}

impl EmergencyQueue {
    pub fn push(&mut self, pid: PatientId, severity: u32) {
        let seq = self.next_seq;
        self.next_seq += 1;
        self.entries.insert((Reverse(severity), seq), pid);
    }

    /// Highest-severity request; the earliest inserted wins ties.
    pub fn peek(&self) -> Option<PatientId> {
        self.entries.values().next().copied()
    }

    pub fn pop(&mut self) -> Option<PatientId> {
        self.entries.pop_first().map(|(_, pid)| pid)
    }

    pub fn remove(&mut self, pid: PatientId) -> bool {
        let key = self
            .entries
            .iter()
            .find(|(_, queued)| **queued == pid)
            .map(|(key, _)| *key);
        match key {
            Some(key) => self.entries.remove(&key).is_some(),
            None => false,
        }
    }

    pub fn contains(&self, pid: PatientId) -> bool {
        self.entries.values().any(|queued| *queued == pid)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Requests in service order.
    pub fn iter(&self) -> impl Iterator<Item = PatientId> + '_ {
        self.entries.values().copied()
    }
}

/// Strict first-in, first-out queue for Serious and Normal requests.
#[derive(Debug, Clone, Default)]
pub struct FifoQueue {
    entries: VecDeque<PatientId>,
}

impl FifoQueue {
    pub fn push(&mut self, pid: PatientId) {
        self.entries.push_back(pid);
    }

    pub fn peek(&self) -> Option<PatientId> {
        self.entries.front().copied()
    }

    pub fn pop(&mut self) -> Option<PatientId> {
        self.entries.pop_front()
    }

    pub fn remove(&mut self, pid: PatientId) -> bool {
        match self.entries.iter().position(|queued| *queued == pid) {
            Some(index) => self.entries.remove(index).is_some(),
            None => false,
        }
    }

    pub fn contains(&self, pid: PatientId) -> bool {
        self.entries.contains(&pid)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = PatientId> + '_ {
        self.entries.iter().copied()
    }
}

/// The three inbound queues of one hospital.
#[derive(Debug, Clone, Default)]
pub struct RequestQueues {
    pub emergency: EmergencyQueue,
    pub serious: FifoQueue,
    pub normal: FifoQueue,
}

impl RequestQueues {
    pub fn enqueue(&mut self, patient: &Patient) {
        match patient.priority {
            PriorityClass::Emergency => self.emergency.push(patient.id, patient.severity),
            PriorityClass::Serious => self.serious.push(patient.id),
            PriorityClass::Normal => self.normal.push(patient.id),
        }
    }

    /// Removes `pid` from whichever queue holds it and reports that queue's class.
    pub fn remove(&mut self, pid: PatientId) -> Option<PriorityClass> {
        if self.emergency.remove(pid) {
            Some(PriorityClass::Emergency)
        } else if self.serious.remove(pid) {
            Some(PriorityClass::Serious)
        } else if self.normal.remove(pid) {
            Some(PriorityClass::Normal)
        } else {
            None
        }
    }

    pub fn contains(&self, pid: PatientId) -> bool {
        self.emergency.contains(pid) || self.serious.contains(pid) || self.normal.contains(pid)
    }

    pub fn len(&self, priority: PriorityClass) -> usize {
        match priority {
            PriorityClass::Emergency => self.emergency.len(),
            PriorityClass::Serious => self.serious.len(),
            PriorityClass::Normal => self.normal.len(),
        }
    }

    pub fn total_len(&self) -> usize {
        self.emergency.len() + self.serious.len() + self.normal.len()
    }

    pub fn is_empty(&self) -> bool {
        self.total_len() == 0
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn emergency_queue_serves_highest_severity_first() {
        let mut queue = EmergencyQueue::default();
        queue.push(PatientId(1), 2);
        queue.push(PatientId(2), 9);
        queue.push(PatientId(3), 5);

        assert_eq!(queue.pop(), Some(PatientId(2)));
        assert_eq!(queue.pop(), Some(PatientId(3)));
        assert_eq!(queue.pop(), Some(PatientId(1)));
        assert_eq!(queue.pop(), None);
    }

    #[test]
    fn equal_severity_keeps_insertion_order() {
        let mut queue = EmergencyQueue::default();
        queue.push(PatientId(10), 4);
        queue.push(PatientId(11), 4);
        queue.push(PatientId(12), 7);
        queue.push(PatientId(13), 4);

        let order: Vec<_> = queue.iter().collect();
        assert_eq!(
            order,
            vec![PatientId(12), PatientId(10), PatientId(11), PatientId(13)]
        );
    }

    #[test]
    fn removing_from_the_middle_preserves_the_rest() {
        let mut queue = EmergencyQueue::default();
        queue.push(PatientId(1), 3);
        queue.push(PatientId(2), 3);
        queue.push(PatientId(3), 3);
        assert!(queue.remove(PatientId(2)));
        assert!(!queue.remove(PatientId(2)));
        assert_eq!(queue.iter().collect::<Vec<_>>(), vec![PatientId(1), PatientId(3)]);

        let mut fifo = FifoQueue::default();
        fifo.push(PatientId(4));
        fifo.push(PatientId(5));
        fifo.push(PatientId(6));
        assert!(fifo.remove(PatientId(5)));
        assert_eq!(fifo.pop(), Some(PatientId(4)));
        assert_eq!(fifo.pop(), Some(PatientId(6)));
    }

    #[test]
    fn request_queues_route_by_priority() {
        let mut queues = RequestQueues::default();
        let hospital = crate::hospital::HospitalId(1);
        for (pid, priority) in [
            (1, PriorityClass::Normal),
            (2, PriorityClass::Serious),
            (3, PriorityClass::Emergency),
        ] {
            queues.enqueue(&Patient::new(PatientId(pid), priority, 1, 1, hospital, 5));
        }
        assert_eq!(queues.len(PriorityClass::Normal), 1);
        assert_eq!(queues.len(PriorityClass::Serious), 1);
        assert_eq!(queues.len(PriorityClass::Emergency), 1);
        assert_eq!(queues.remove(PatientId(2)), Some(PriorityClass::Serious));
        assert_eq!(queues.remove(PatientId(2)), None);
        assert_eq!(queues.total_len(), 2);
    }
}
