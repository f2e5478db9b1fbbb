//! Trace-replay generator backed by a time-ordered queue.

use std::cmp::Ordering;
use std::collections::BinaryHeap;

use crate::clock::SimTime;
use crate::cloudlet::WorkUnit;
use crate::generator::{Generator, GeneratorError};

#[derive(Debug)]
struct Entry<W> {
    start: SimTime,
    seq: u64,
    unit: W,
}

impl<W> Ord for Entry<W> {
    fn cmp(&self, other: &Self) -> Ordering {
        // Reverse ordering to make the earliest start pop first from a max-heap.
        other
            .start
            .total_cmp(&self.start)
            .then_with(|| other.seq.cmp(&self.seq))
    }
}

impl<W> PartialOrd for Entry<W> {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl<W> PartialEq for Entry<W> {
    fn eq(&self, other: &Self) -> bool {
        self.cmp(other) == Ordering::Equal
    }
}

impl<W> Eq for Entry<W> {}

/// A generator that replays a fixed set of work units in start-time order.
///
/// Units with equal ideal start times come out in insertion order. The
/// generator ignores time notifications: everything it will ever yield is
/// known up front.
#[derive(Debug)]
pub struct ScheduledGenerator<W> {
    queue: BinaryHeap<Entry<W>>,
    next_seq: u64,
}

impl<W: WorkUnit> ScheduledGenerator<W> {
    /// Creates a new, empty generator.
    pub fn new() -> Self {
        Self {
            queue: BinaryHeap::new(),
            next_seq: 0,
        }
    }

    /// Adds a unit to the replay queue.
    pub fn schedule(&mut self, unit: W) {
        let entry = Entry {
            start: unit.ideal_start_time(),
            seq: self.next_seq,
            unit,
        };
        self.next_seq += 1;
        self.queue.push(entry);
    }

    /// Returns the ideal start time of the next unit, if any.
    pub fn next_start_time(&self) -> Option<SimTime> {
        self.queue.peek().map(|entry| entry.start)
    }

    /// Number of units left to replay.
    pub fn len(&self) -> usize {
        self.queue.len()
    }
}

impl<W: WorkUnit> Default for ScheduledGenerator<W> {
    fn default() -> Self {
        Self::new()
    }
}

impl<W: WorkUnit> Extend<W> for ScheduledGenerator<W> {
    fn extend<I: IntoIterator<Item = W>>(&mut self, iter: I) {
        for unit in iter {
            self.schedule(unit);
        }
    }
}

impl<W: WorkUnit> FromIterator<W> for ScheduledGenerator<W> {
    fn from_iter<I: IntoIterator<Item = W>>(iter: I) -> Self {
        let mut generator = Self::new();
        generator.extend(iter);
        generator
    }
}

impl<W: WorkUnit> Generator for ScheduledGenerator<W> {
    type Item = W;

    fn is_empty(&self) -> bool {
        self.queue.is_empty()
    }

    fn peek(&self) -> Result<&W, GeneratorError> {
        self.queue
            .peek()
            .map(|entry| &entry.unit)
            .ok_or(GeneratorError::Empty)
    }

    fn poll(&mut self) -> Result<W, GeneratorError> {
        self.queue
            .pop()
            .map(|entry| entry.unit)
            .ok_or(GeneratorError::Empty)
    }

    fn notify_of_time(&mut self, _time: SimTime) {}
}
