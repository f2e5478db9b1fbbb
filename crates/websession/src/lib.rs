//! Lock-stepped pacing of paired application and database work streams.
//!
//! A [`Session`] draws work units from two [`Generator`]s and releases them
//! in pairs, so neither tier's stream can run ahead of the other. The
//! [`Driver`] advances a [`SimClock`] and polls sessions on every step.

pub mod clock;
pub mod cloudlet;
pub mod driver;
pub mod generator;
pub mod ids;
pub mod periodic;
pub mod scheduled;
pub mod session;
pub mod trace;

#[cfg(any(test, feature = "test-support"))]
pub mod testing;

pub use clock::{SimClock, SimTime};
pub use cloudlet::{Cloudlet, CompletionHandle, WorkUnit};
pub use driver::{CloudletSink, Driver, DriverError};
pub use generator::{Generator, GeneratorError};
pub use ids::{HostId, SessionId, SessionIdAllocator};
pub use periodic::PeriodicGenerator;
pub use scheduled::ScheduledGenerator;
pub use session::{CloudletPair, Session, SessionBuilder, SessionError, Tier};
pub use trace::{TraceEntry, TraceError, parse_trace, parse_trace_line, read_trace};
