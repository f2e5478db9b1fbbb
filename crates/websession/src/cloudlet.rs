//! Work units dispatched to execution hosts.

use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

use crate::clock::SimTime;
use crate::ids::{HostId, SessionId};

/// A discrete task destined for one host.
///
/// Sessions keep a clone of every unit they release so that they can observe
/// its completion. Implementations must therefore share the completion state
/// between clones: finishing one clone finishes all of them.
pub trait WorkUnit {
    /// Returns `true` once the execution substrate has completed the unit.
    fn is_finished(&self) -> bool;

    /// Simulation time at or after which the unit should be released.
    fn ideal_start_time(&self) -> SimTime;

    /// Records the host the unit is dispatched to.
    fn set_target_host_id(&mut self, host: HostId);

    /// Records the session that released the unit.
    fn set_session_id(&mut self, session: SessionId);
}

/// Reference [`WorkUnit`] carrying an abstract amount of work.
#[derive(Debug, Clone)]
pub struct Cloudlet {
    ideal_start_time: SimTime,
    length: u64,
    target_host: Option<HostId>,
    session: Option<SessionId>,
    finished: Arc<AtomicBool>,
}

impl Cloudlet {
    /// Creates an unfinished, unassigned cloudlet.
    ///
    /// # Parameters
    /// - `ideal_start_time`: Earliest simulation time for release.
    /// - `length`: Amount of work, in host-independent instruction units.
    pub fn new(ideal_start_time: SimTime, length: u64) -> Self {
        Self {
            ideal_start_time,
            length,
            target_host: None,
            session: None,
            finished: Arc::new(AtomicBool::new(false)),
        }
    }

    pub fn length(&self) -> u64 {
        self.length
    }

    pub fn target_host_id(&self) -> Option<HostId> {
        self.target_host
    }

    pub fn session_id(&self) -> Option<SessionId> {
        self.session
    }

    /// Marks the cloudlet (and every clone of it) as finished.
    pub fn finish(&self) {
        self.finished.store(true, Ordering::Release);
    }

    /// Returns a handle the substrate can keep to finish the cloudlet later.
    pub fn completion_handle(&self) -> CompletionHandle {
        CompletionHandle(Arc::clone(&self.finished))
    }
}

impl WorkUnit for Cloudlet {
    fn is_finished(&self) -> bool {
        self.finished.load(Ordering::Acquire)
    }

    fn ideal_start_time(&self) -> SimTime {
        self.ideal_start_time
    }

    fn set_target_host_id(&mut self, host: HostId) {
        self.target_host = Some(host);
    }

    fn set_session_id(&mut self, session: SessionId) {
        self.session = Some(session);
    }
}

/// Detached completion switch for a [`Cloudlet`].
#[derive(Debug, Clone)]
pub struct CompletionHandle(Arc<AtomicBool>);

impl CompletionHandle {
    pub fn finish(&self) {
        self.0.store(true, Ordering::Release);
    }

    pub fn is_finished(&self) -> bool {
        self.0.load(Ordering::Acquire)
    }
}
