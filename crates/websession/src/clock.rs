//! Simulated clock used by the driver to pace sessions.

/// Simulation time, in abstract time units.
pub type SimTime = f64;

/// A deterministic simulated clock that only advances when instructed.
///
/// No wall-clock time is consulted, which keeps every session run
/// reproducible.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SimClock {
    current: SimTime,
}

impl SimClock {
    /// Creates a new clock starting at the given time.
    ///
    /// # Panics
    /// Panics if `start` is not finite.
    pub fn new(start: SimTime) -> Self {
        assert!(start.is_finite(), "simulated start time must be finite");
        Self { current: start }
    }

    /// Returns the current simulated time.
    pub fn now(&self) -> SimTime {
        self.current
    }

    /// Advances the clock by one time unit.
    pub fn tick(&mut self) {
        self.step(1.0);
    }

    /// Advances the clock by `delta`.
    ///
    /// # Panics
    /// Panics if `delta` is negative, NaN, or moves the clock to infinity.
    pub fn step(&mut self, delta: SimTime) {
        assert!(
            delta >= 0.0,
            "simulated time can only move forward (delta = {delta})"
        );
        let next = self.current + delta;
        assert!(next.is_finite(), "simulated time overflowed while stepping");
        self.current = next;
    }

    /// Moves the clock forward to `target` if it is in the future.
    ///
    /// Earlier targets leave the clock unchanged.
    pub fn advance_to(&mut self, target: SimTime) {
        if target > self.current {
            self.step(target - self.current);
        }
    }
}

impl Default for SimClock {
    fn default() -> Self {
        Self::new(0.0)
    }
}
