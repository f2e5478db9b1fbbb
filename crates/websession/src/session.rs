//! Paired, lock-stepped release of application and database work units.

use std::fmt;

use tracing::{debug, trace};

use crate::clock::SimTime;
use crate::cloudlet::WorkUnit;
use crate::generator::{Generator, GeneratorError};
use crate::ids::{HostId, SessionId, SessionIdAllocator};

/// The two sides of a session.
#[derive(Debug, Clone, Copy, Eq, PartialEq, Hash)]
pub enum Tier {
    /// The application server side.
    App,
    /// The database server side.
    Db,
}

impl Tier {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::App => "app",
            Self::Db => "db",
        }
    }
}

impl fmt::Display for Tier {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Errors raised while building or polling a [`Session`].
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum SessionError {
    /// A session was built without one of its generators.
    #[error("missing {0} generator")]
    MissingGenerator(Tier),
    /// A pair became due before the host for this tier was bound.
    #[error("{0} host id must be set before the first pair is released")]
    HostUnbound(Tier),
    /// A generator violated its own emptiness contract.
    #[error(transparent)]
    Generator(#[from] GeneratorError),
}

/// One work unit per tier, released in the same call.
#[derive(Debug, Clone)]
pub struct CloudletPair<W> {
    pub app: W,
    pub db: W,
}

impl<W> CloudletPair<W> {
    /// Returns the unit for the given tier.
    pub fn get(&self, tier: Tier) -> &W {
        match tier {
            Tier::App => &self.app,
            Tier::Db => &self.db,
        }
    }

    pub fn into_parts(self) -> (W, W) {
        (self.app, self.db)
    }
}

/// A session between a user, an application server and a database server.
///
/// Throughout its lifetime the session draws work from two generators, one
/// per tier, and hands it out in pairs. A new pair is released only when the
/// previous pair has finished on *both* hosts and the next unit of *both*
/// generators is due. A faster host therefore never drains its generator
/// ahead of the slower one: the session, not host throughput, sets the pace.
///
/// The session holds no notion of time. A driver forwards the current time
/// through [`notify_of_time`](Self::notify_of_time) and
/// [`poll_cloudlets`](Self::poll_cloudlets).
pub struct Session<A, D>
where
    A: Generator,
{
    id: SessionId,
    app_generator: A,
    db_generator: D,
    current: Option<CloudletPair<A::Item>>,
    app_host: Option<HostId>,
    db_host: Option<HostId>,
}

impl<A, D> Session<A, D>
where
    A: Generator,
    D: Generator<Item = A::Item>,
    A::Item: Clone,
{
    /// Creates a session over the two generators.
    ///
    /// The id is taken from `ids`. Host ids start unbound and must be set
    /// before the first pair becomes due.
    pub fn new(app_generator: A, db_generator: D, ids: &SessionIdAllocator) -> Self {
        Self {
            id: ids.allocate(),
            app_generator,
            db_generator,
            current: None,
            app_host: None,
            db_host: None,
        }
    }

    /// Releases the next pair of work units if both tiers are free and due.
    ///
    /// Returns `Ok(None)` when no pair may be released at `now`: either tier
    /// still has an unfinished unit in flight, or either generator is empty or
    /// holds a unit whose ideal start lies after `now`. Partial pairs are never
    /// returned.
    ///
    /// # Errors
    /// Returns [`SessionError::HostUnbound`] when a pair is due but a host id
    /// is missing. Neither generator is polled in that case.
    pub fn poll_cloudlets(
        &mut self,
        now: SimTime,
    ) -> Result<Option<CloudletPair<A::Item>>, SessionError> {
        let (app_free, db_free) = match &self.current {
            Some(pair) => (pair.app.is_finished(), pair.db.is_finished()),
            None => (true, true),
        };
        let app_ready = next_is_due(&self.app_generator, now)?;
        let db_ready = next_is_due(&self.db_generator, now)?;

        if !(app_free && db_free && app_ready && db_ready) {
            trace!(
                session = %self.id,
                now,
                app_free,
                db_free,
                app_ready,
                db_ready,
                "pair withheld"
            );
            return Ok(None);
        }

        let app_host = self.app_host.ok_or(SessionError::HostUnbound(Tier::App))?;
        let db_host = self.db_host.ok_or(SessionError::HostUnbound(Tier::Db))?;

        let mut app = self.app_generator.poll()?;
        let mut db = self.db_generator.poll()?;
        app.set_target_host_id(app_host);
        app.set_session_id(self.id);
        db.set_target_host_id(db_host);
        db.set_session_id(self.id);

        debug!(
            session = %self.id,
            now,
            app_start = app.ideal_start_time(),
            db_start = db.ideal_start_time(),
            %app_host,
            %db_host,
            "pair released"
        );

        let pair = CloudletPair { app, db };
        self.current = Some(pair.clone());
        Ok(Some(pair))
    }

    /// Forwards the current simulation time to both generators.
    pub fn notify_of_time(&mut self, time: SimTime) {
        trace!(session = %self.id, time, "notifying generators");
        self.app_generator.notify_of_time(time);
        self.db_generator.notify_of_time(time);
    }

    pub fn session_id(&self) -> SessionId {
        self.id
    }

    /// Returns the host receiving application-tier units, once bound.
    pub fn app_host_id(&self) -> Option<HostId> {
        self.app_host
    }

    /// Binds the host receiving application-tier units.
    pub fn set_app_host_id(&mut self, host: HostId) {
        self.app_host = Some(host);
    }

    /// Returns the host receiving database-tier units, once bound.
    pub fn db_host_id(&self) -> Option<HostId> {
        self.db_host
    }

    /// Binds the host receiving database-tier units.
    pub fn set_db_host_id(&mut self, host: HostId) {
        self.db_host = Some(host);
    }
}

fn next_is_due<G: Generator>(generator: &G, now: SimTime) -> Result<bool, GeneratorError> {
    if generator.is_empty() {
        return Ok(false);
    }
    Ok(generator.peek()?.ideal_start_time() <= now)
}

impl<A, D> fmt::Debug for Session<A, D>
where
    A: Generator,
{
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Session")
            .field("id", &self.id)
            .field("app_host", &self.app_host)
            .field("db_host", &self.db_host)
            .field("in_flight", &self.current.is_some())
            .finish_non_exhaustive()
    }
}

/// Assembles a [`Session`] from parts that may not all be available yet.
#[derive(Debug)]
pub struct SessionBuilder<A, D> {
    app_generator: Option<A>,
    db_generator: Option<D>,
    app_host: Option<HostId>,
    db_host: Option<HostId>,
}

impl<A, D> SessionBuilder<A, D>
where
    A: Generator,
    D: Generator<Item = A::Item>,
    A::Item: Clone,
{
    pub fn new() -> Self {
        Self {
            app_generator: None,
            db_generator: None,
            app_host: None,
            db_host: None,
        }
    }

    pub fn app_generator(mut self, generator: A) -> Self {
        self.app_generator = Some(generator);
        self
    }

    pub fn db_generator(mut self, generator: D) -> Self {
        self.db_generator = Some(generator);
        self
    }

    pub fn app_host(mut self, host: HostId) -> Self {
        self.app_host = Some(host);
        self
    }

    pub fn db_host(mut self, host: HostId) -> Self {
        self.db_host = Some(host);
        self
    }

    /// Builds the session, allocating its id from `ids`.
    ///
    /// # Errors
    /// Returns [`SessionError::MissingGenerator`] if either generator was not
    /// supplied. No id is allocated in that case.
    pub fn build(self, ids: &SessionIdAllocator) -> Result<Session<A, D>, SessionError> {
        let app = self
            .app_generator
            .ok_or(SessionError::MissingGenerator(Tier::App))?;
        let db = self
            .db_generator
            .ok_or(SessionError::MissingGenerator(Tier::Db))?;

        let mut session = Session::new(app, db, ids);
        session.app_host = self.app_host;
        session.db_host = self.db_host;
        Ok(session)
    }
}

impl<A, D> Default for SessionBuilder<A, D>
where
    A: Generator,
    D: Generator<Item = A::Item>,
    A::Item: Clone,
{
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(any(test, feature = "test-support"))]
impl<A, D> crate::testing::SessionInspect for Session<A, D>
where
    A: Generator,
{
    type Item = A::Item;

    fn current_app_cloudlet(&self) -> Option<&A::Item> {
        self.current.as_ref().map(|pair| &pair.app)
    }

    fn current_db_cloudlet(&self) -> Option<&A::Item> {
        self.current.as_ref().map(|pair| &pair.db)
    }
}
