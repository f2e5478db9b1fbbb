//! Toy execution substrate: hosts that finish work after `length / speed`.

use std::collections::HashMap;
use std::io::{self, Write};

use serde::Serialize;
use tracing::{debug, warn};
use websession::{
    Cloudlet, CloudletPair, CloudletSink, CompletionHandle, HostId, SessionId, SimTime, Tier,
    WorkUnit,
};

#[derive(Copy, Clone, Debug, PartialEq, Eq, clap::ValueEnum)]
pub enum OutputFormat {
    Plain,
    Json,
}

/// One line of demo output per dispatched cloudlet.
#[derive(Debug, Serialize)]
pub struct DispatchRecord {
    pub time: SimTime,
    pub session: u64,
    pub tier: &'static str,
    pub host: Option<u32>,
    pub ideal_start: SimTime,
    pub length: u64,
    pub finishes_at: SimTime,
}

#[derive(Debug)]
struct Running {
    finishes_at: SimTime,
    handle: CompletionHandle,
}

/// Hosts with a fixed processing speed, in length units per time unit.
#[derive(Debug)]
pub struct HostFarm {
    now: SimTime,
    speeds: HashMap<HostId, f64>,
    running: Vec<Running>,
    format: OutputFormat,
    dispatched: usize,
}

impl HostFarm {
    pub fn new(format: OutputFormat) -> Self {
        Self {
            now: 0.0,
            speeds: HashMap::new(),
            running: Vec::new(),
            format,
            dispatched: 0,
        }
    }

    pub fn add_host(&mut self, host: HostId, speed: f64) {
        self.speeds.insert(host, speed);
    }

    pub fn dispatched(&self) -> usize {
        self.dispatched
    }

    fn start(&mut self, session: SessionId, tier: Tier, cloudlet: &Cloudlet) {
        let host = cloudlet.target_host_id();
        let speed = host.and_then(|h| self.speeds.get(&h)).copied();
        let finishes_at = match speed {
            Some(speed) if speed > 0.0 => self.now + cloudlet.length() as f64 / speed,
            _ => {
                warn!(%session, %tier, ?host, "no speed known for host, finishing instantly");
                self.now
            }
        };

        let record = DispatchRecord {
            time: self.now,
            session: session.get(),
            tier: tier.as_str(),
            host: host.map(|h| h.0),
            ideal_start: cloudlet.ideal_start_time(),
            length: cloudlet.length(),
            finishes_at,
        };
        self.emit(&record);

        self.running.push(Running {
            finishes_at,
            handle: cloudlet.completion_handle(),
        });
        self.dispatched += 1;
    }

    fn emit(&self, record: &DispatchRecord) {
        let mut stdout = io::stdout().lock();
        let result = match self.format {
            OutputFormat::Plain => writeln!(
                stdout,
                "[dispatch @{:.2}] session-{} {} -> host-{} (ideal {:.2}, length {}, done @{:.2})",
                record.time,
                record.session,
                record.tier,
                record.host.map_or_else(|| "?".to_string(), |h| h.to_string()),
                record.ideal_start,
                record.length,
                record.finishes_at,
            ),
            OutputFormat::Json => serde_json::to_writer(&mut stdout, record)
                .map_err(io::Error::from)
                .and_then(|()| writeln!(stdout)),
        };
        if let Err(err) = result {
            warn!(error = %err, "failed to write dispatch record");
        }
    }
}

impl CloudletSink<Cloudlet> for HostFarm {
    fn publish_time(&mut self, time: SimTime) {
        self.now = time;
        let before = self.running.len();
        self.running.retain(|job| {
            if job.finishes_at <= time {
                job.handle.finish();
                false
            } else {
                true
            }
        });
        let completed = before - self.running.len();
        if completed > 0 {
            debug!(time, completed, "cloudlets completed");
        }
    }

    fn submit(&mut self, session: SessionId, pair: CloudletPair<Cloudlet>) {
        self.start(session, Tier::App, &pair.app);
        self.start(session, Tier::Db, &pair.db);
    }
}
