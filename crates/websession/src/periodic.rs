//! Time-driven generator emitting work units at a fixed period.

use std::fmt;

use crate::clock::SimTime;
use crate::cloudlet::WorkUnit;
use crate::generator::{Generator, GeneratorError};

/// Emits one work unit every `period` time units, starting at `start`.
///
/// Units are materialised lazily: the generator stays empty until it has been
/// notified of a time at or after the next unit's ideal start. Notifications
/// with an earlier time than one already seen are ignored, so the generator
/// never un-produces a unit.
pub struct PeriodicGenerator<W, F> {
    start: SimTime,
    period: SimTime,
    limit: Option<u64>,
    produced: u64,
    horizon: Option<SimTime>,
    pending: Option<W>,
    factory: F,
}

impl<W, F> PeriodicGenerator<W, F>
where
    W: WorkUnit,
    F: FnMut(SimTime) -> W,
{
    /// Creates an unbounded periodic generator.
    ///
    /// # Parameters
    /// - `start`: Ideal start time of the first unit.
    /// - `period`: Spacing between consecutive units; must be finite and
    ///   positive.
    /// - `factory`: Builds a unit for a given ideal start time.
    pub fn new(start: SimTime, period: SimTime, factory: F) -> Result<Self, GeneratorError> {
        if !(period.is_finite() && period > 0.0) {
            return Err(GeneratorError::InvalidPeriod(period));
        }
        Ok(Self {
            start,
            period,
            limit: None,
            produced: 0,
            horizon: None,
            pending: None,
            factory,
        })
    }

    /// Caps the total number of units the generator will ever produce.
    pub fn with_limit(mut self, count: u64) -> Self {
        self.limit = Some(count);
        self
    }

    /// Returns `true` once every unit allowed by the limit has been produced
    /// and consumed.
    pub fn is_exhausted(&self) -> bool {
        self.pending.is_none() && self.limit.is_some_and(|limit| self.produced >= limit)
    }

    fn next_start(&self) -> SimTime {
        self.start + self.period * self.produced as SimTime
    }

    fn refill(&mut self) {
        if self.pending.is_some() || self.limit.is_some_and(|limit| self.produced >= limit) {
            return;
        }
        let Some(horizon) = self.horizon else {
            return;
        };
        let start = self.next_start();
        if start <= horizon {
            self.pending = Some((self.factory)(start));
            self.produced += 1;
        }
    }
}

impl<W, F> Generator for PeriodicGenerator<W, F>
where
    W: WorkUnit,
    F: FnMut(SimTime) -> W,
{
    type Item = W;

    fn is_empty(&self) -> bool {
        self.pending.is_none()
    }

    fn peek(&self) -> Result<&W, GeneratorError> {
        self.pending.as_ref().ok_or(GeneratorError::Empty)
    }

    fn poll(&mut self) -> Result<W, GeneratorError> {
        let unit = self.pending.take().ok_or(GeneratorError::Empty)?;
        self.refill();
        Ok(unit)
    }

    fn notify_of_time(&mut self, time: SimTime) {
        if self.horizon.is_none_or(|seen| time > seen) {
            self.horizon = Some(time);
        }
        self.refill();
    }
}

impl<W: fmt::Debug, F> fmt::Debug for PeriodicGenerator<W, F> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("PeriodicGenerator")
            .field("start", &self.start)
            .field("period", &self.period)
            .field("limit", &self.limit)
            .field("produced", &self.produced)
            .field("horizon", &self.horizon)
            .field("pending", &self.pending)
            .finish_non_exhaustive()
    }
}
