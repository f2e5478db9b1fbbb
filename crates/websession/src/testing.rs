//! Test-support helpers. Compiled for this crate's own tests and behind the
//! `test-support` feature; not part of the production surface.

use crate::clock::SimTime;
use crate::generator::{Generator, GeneratorError};

/// Read access to a session's in-flight units.
pub trait SessionInspect {
    type Item;

    /// The application-tier unit released last, if any.
    fn current_app_cloudlet(&self) -> Option<&Self::Item>;

    /// The database-tier unit released last, if any.
    fn current_db_cloudlet(&self) -> Option<&Self::Item>;
}

/// Wraps a generator and records how it is driven.
#[derive(Debug)]
pub struct CountingGenerator<G> {
    inner: G,
    polls: usize,
    notified: Vec<SimTime>,
}

impl<G: Generator> CountingGenerator<G> {
    pub fn new(inner: G) -> Self {
        Self {
            inner,
            polls: 0,
            notified: Vec::new(),
        }
    }

    /// Number of successful `poll` calls.
    pub fn polls(&self) -> usize {
        self.polls
    }

    /// Every time passed to `notify_of_time`, in call order.
    pub fn notified(&self) -> &[SimTime] {
        &self.notified
    }
}

impl<G: Generator> Generator for CountingGenerator<G> {
    type Item = G::Item;

    fn is_empty(&self) -> bool {
        self.inner.is_empty()
    }

    fn peek(&self) -> Result<&G::Item, GeneratorError> {
        self.inner.peek()
    }

    fn poll(&mut self) -> Result<G::Item, GeneratorError> {
        let unit = self.inner.poll()?;
        self.polls += 1;
        Ok(unit)
    }

    fn notify_of_time(&mut self, time: SimTime) {
        self.notified.push(time);
        self.inner.notify_of_time(time);
    }
}
