//! Clock-driven stepping of many sessions.

use tracing::{debug, warn};

use crate::clock::{SimClock, SimTime};
use crate::generator::Generator;
use crate::ids::SessionId;
use crate::session::{CloudletPair, Session, SessionError};

/// Consumer of simulated time updates and released work.
///
/// This is the execution substrate's side of the driver: it learns the time
/// first on every step, so it can mark finished work before sessions are
/// polled, and then receives every released pair.
pub trait CloudletSink<W> {
    /// Called whenever the driver publishes a new simulated time.
    fn publish_time(&mut self, time: SimTime);

    /// Called with each pair a session released at the current time.
    fn submit(&mut self, session: SessionId, pair: CloudletPair<W>);
}

/// Errors surfaced while stepping sessions.
#[derive(Debug, thiserror::Error)]
pub enum DriverError {
    #[error("{session}: {source}")]
    Session {
        session: SessionId,
        #[source]
        source: SessionError,
    },
}

/// Advances simulated time and polls every registered session on each step.
pub struct Driver<A, D, S>
where
    A: Generator,
{
    clock: SimClock,
    sessions: Vec<Session<A, D>>,
    sink: S,
    tick_rate: SimTime,
}

impl<A, D, S> Driver<A, D, S>
where
    A: Generator,
    D: Generator<Item = A::Item>,
    A::Item: Clone,
    S: CloudletSink<A::Item>,
{
    /// Creates a driver with the clock at zero and a tick rate of one.
    pub fn new(sink: S) -> Self {
        Self::new_with_tick_rate(sink, 0.0, 1.0)
    }

    /// Creates a driver with an explicit starting time and tick rate.
    ///
    /// # Panics
    /// Panics if `tick_rate` is not finite and positive.
    pub fn new_with_tick_rate(sink: S, start_time: SimTime, tick_rate: SimTime) -> Self {
        assert_tick_rate(tick_rate);
        Self {
            clock: SimClock::new(start_time),
            sessions: Vec::new(),
            sink,
            tick_rate,
        }
    }

    /// Registers a session; it is polled from the next step on.
    pub fn add_session(&mut self, session: Session<A, D>) -> SessionId {
        let id = session.session_id();
        debug!(session = %id, "session registered");
        self.sessions.push(session);
        id
    }

    /// Updates the time advanced by each [`tick`](Self::tick).
    ///
    /// # Panics
    /// Panics if `tick_rate` is not finite and positive.
    pub fn set_tick_rate(&mut self, tick_rate: SimTime) {
        assert_tick_rate(tick_rate);
        self.tick_rate = tick_rate;
    }

    /// Advances simulated time by `delta` and polls every session.
    pub fn step(&mut self, delta: SimTime) -> Result<(), DriverError> {
        self.clock.step(delta);
        self.publish_and_dispatch()
    }

    /// Advances simulated time by the configured tick rate.
    pub fn tick(&mut self) -> Result<(), DriverError> {
        self.step(self.tick_rate)
    }

    /// Runs a fixed number of ticks, stopping at the first error.
    pub fn run_for_ticks(&mut self, ticks: u64) -> Result<(), DriverError> {
        for _ in 0..ticks {
            self.tick()?;
        }
        Ok(())
    }

    /// Moves simulated time forward to `target` and polls every session.
    ///
    /// An earlier target keeps the clock where it is but still polls.
    pub fn advance_to(&mut self, target: SimTime) -> Result<(), DriverError> {
        self.clock.advance_to(target);
        self.publish_and_dispatch()
    }

    pub fn now(&self) -> SimTime {
        self.clock.now()
    }

    pub fn sessions(&self) -> &[Session<A, D>] {
        &self.sessions
    }

    pub fn sink(&self) -> &S {
        &self.sink
    }

    pub fn sink_mut(&mut self) -> &mut S {
        &mut self.sink
    }

    pub fn into_sink(self) -> S {
        self.sink
    }

    fn publish_and_dispatch(&mut self) -> Result<(), DriverError> {
        let now = self.clock.now();
        self.sink.publish_time(now);
        for session in &mut self.sessions {
            let id = session.session_id();
            session.notify_of_time(now);
            match session.poll_cloudlets(now) {
                Ok(Some(pair)) => self.sink.submit(id, pair),
                Ok(None) => {}
                Err(source) => {
                    warn!(session = %id, now, error = %source, "session poll failed");
                    return Err(DriverError::Session {
                        session: id,
                        source,
                    });
                }
            }
        }
        Ok(())
    }
}

fn assert_tick_rate(tick_rate: SimTime) {
    assert!(
        tick_rate.is_finite() && tick_rate > 0.0,
        "tick rate must be greater than zero"
    );
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cloudlet::{Cloudlet, WorkUnit};
    use crate::ids::{HostId, SessionIdAllocator};
    use crate::scheduled::ScheduledGenerator;
    use crate::session::Tier;

    #[derive(Debug, Default)]
    struct RecordingSink {
        times: Vec<SimTime>,
        submitted: Vec<(SessionId, SimTime, SimTime)>,
        finish_immediately: bool,
    }

    impl CloudletSink<Cloudlet> for RecordingSink {
        fn publish_time(&mut self, time: SimTime) {
            self.times.push(time);
        }

        fn submit(&mut self, session: SessionId, pair: CloudletPair<Cloudlet>) {
            self.submitted.push((
                session,
                pair.app.ideal_start_time(),
                pair.db.ideal_start_time(),
            ));
            if self.finish_immediately {
                pair.app.finish();
                pair.db.finish();
            }
        }
    }

    type ReplaySession = Session<ScheduledGenerator<Cloudlet>, ScheduledGenerator<Cloudlet>>;

    fn session(ids: &SessionIdAllocator, app: &[SimTime], db: &[SimTime]) -> ReplaySession {
        let replay = |starts: &[SimTime]| -> ScheduledGenerator<Cloudlet> {
            starts.iter().map(|&t| Cloudlet::new(t, 10)).collect()
        };
        let mut session = Session::new(replay(app), replay(db), ids);
        session.set_app_host_id(HostId(1));
        session.set_db_host_id(HostId(2));
        session
    }

    #[test]
    fn driver_publishes_time_then_dispatches() {
        let ids = SessionIdAllocator::default();
        let sink = RecordingSink {
            finish_immediately: true,
            ..Default::default()
        };
        let mut driver = Driver::new(sink);
        let id = driver.add_session(session(&ids, &[1.0, 2.0], &[1.0, 3.0]));

        driver.run_for_ticks(3).unwrap();

        assert_eq!(driver.sink().times, vec![1.0, 2.0, 3.0]);
        assert_eq!(driver.sink().submitted, vec![(id, 1.0, 1.0), (id, 2.0, 3.0)]);
    }

    #[test]
    fn sessions_are_paced_independently() {
        let ids = SessionIdAllocator::default();
        let sink = RecordingSink {
            finish_immediately: true,
            ..Default::default()
        };
        let mut driver = Driver::new(sink);
        let first = driver.add_session(session(&ids, &[0.0, 4.0], &[0.0, 4.0]));
        let second = driver.add_session(session(&ids, &[2.0], &[2.0]));

        driver.advance_to(2.0).unwrap();
        driver.advance_to(4.0).unwrap();

        assert_eq!(
            driver.sink().submitted,
            vec![(first, 0.0, 0.0), (second, 2.0, 2.0), (first, 4.0, 4.0)]
        );
        assert_eq!(driver.sessions().len(), 2);
    }

    #[test]
    fn unfinished_work_holds_back_the_session() {
        let ids = SessionIdAllocator::default();
        let mut driver = Driver::new(RecordingSink::default());
        driver.add_session(session(&ids, &[0.0, 1.0], &[0.0, 1.0]));

        driver.run_for_ticks(5).unwrap();
        assert_eq!(driver.sink().submitted.len(), 1);
    }

    #[test]
    fn driver_keeps_time_monotonic_when_advancing_backward() {
        let mut driver: Driver<ScheduledGenerator<Cloudlet>, ScheduledGenerator<Cloudlet>, _> =
            Driver::new_with_tick_rate(RecordingSink::default(), 5.0, 1.0);

        driver.advance_to(3.0).unwrap();
        driver.step(0.0).unwrap();

        assert_eq!(driver.now(), 5.0);
        assert_eq!(driver.sink().times, vec![5.0, 5.0]);
    }

    #[test]
    fn driver_advances_using_configured_tick_rate() {
        let ids = SessionIdAllocator::default();
        let mut driver = Driver::new_with_tick_rate(RecordingSink::default(), 0.0, 3.0);
        driver.add_session(session(&ids, &[6.0], &[6.0]));

        driver.run_for_ticks(2).unwrap();
        driver.set_tick_rate(0.5);
        driver.tick().unwrap();

        assert_eq!(driver.sink().times, vec![3.0, 6.0, 6.5]);
        assert_eq!(driver.sink().submitted.len(), 1);
    }

    #[test]
    fn unbound_host_surfaces_as_driver_error() {
        let ids = SessionIdAllocator::default();
        let mut driver = Driver::new(RecordingSink::default());
        let generator = |t: SimTime| -> ScheduledGenerator<Cloudlet> {
            std::iter::once(Cloudlet::new(t, 1)).collect()
        };
        let mut unbound = Session::new(generator(0.0), generator(0.0), &ids);
        unbound.set_db_host_id(HostId(2));
        let id = driver.add_session(unbound);

        let err = driver.tick().unwrap_err();
        let DriverError::Session { session, source } = err;
        assert_eq!(session, id);
        assert_eq!(source, SessionError::HostUnbound(Tier::App));
    }

    #[test]
    #[should_panic(expected = "tick rate must be greater than zero")]
    fn driver_rejects_zero_tick_rate() {
        let mut driver: Driver<ScheduledGenerator<Cloudlet>, ScheduledGenerator<Cloudlet>, _> =
            Driver::new(RecordingSink::default());
        driver.set_tick_rate(0.0);
    }
}
