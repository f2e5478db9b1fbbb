//! The generator capability sessions draw work units from.

use crate::clock::SimTime;
use crate::cloudlet::WorkUnit;

/// Errors reported by [`Generator`] implementations.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum GeneratorError {
    /// `peek` or `poll` was called while no next item exists.
    #[error("generator has no next work unit")]
    Empty,
    /// A periodic generator was configured with an unusable period.
    #[error("generator period must be finite and positive, got {0}")]
    InvalidPeriod(SimTime),
}

/// A lazy, ordered source of work units.
///
/// Items come out in non-decreasing ideal start time. Generators know nothing
/// about simulation time except what [`notify_of_time`](Self::notify_of_time)
/// tells them, and may hold no item now yet produce one after a later
/// notification.
pub trait Generator {
    type Item: WorkUnit;

    /// Returns `true` when no next item currently exists.
    fn is_empty(&self) -> bool;

    /// Returns the next item without consuming it.
    fn peek(&self) -> Result<&Self::Item, GeneratorError>;

    /// Consumes and returns the next item.
    fn poll(&mut self) -> Result<Self::Item, GeneratorError>;

    /// Informs the generator of the current simulation time.
    fn notify_of_time(&mut self, time: SimTime);
}

impl<G: Generator + ?Sized> Generator for Box<G> {
    type Item = G::Item;

    fn is_empty(&self) -> bool {
        (**self).is_empty()
    }

    fn peek(&self) -> Result<&Self::Item, GeneratorError> {
        (**self).peek()
    }

    fn poll(&mut self) -> Result<Self::Item, GeneratorError> {
        (**self).poll()
    }

    fn notify_of_time(&mut self, time: SimTime) {
        (**self).notify_of_time(time)
    }
}
