//! Demo driver for paired web sessions.
//!
//! Builds a handful of sessions, binds each to an application host and a
//! database host of different speeds, and steps simulated time while printing
//! every dispatched cloudlet. Workload comes from trace files when both
//! `--app-trace` and `--db-trace` are given, otherwise from periodic
//! generators.

mod substrate;

use std::path::PathBuf;

use anyhow::{Context, Result, bail};
use clap::Parser;
use tracing::info;
use tracing_subscriber::EnvFilter;
use websession::{
    Cloudlet, Driver, Generator, HostId, PeriodicGenerator, Session, SessionIdAllocator, SimTime,
    read_trace,
};

use crate::substrate::{HostFarm, OutputFormat};

type BoxedGenerator = Box<dyn Generator<Item = Cloudlet>>;

#[derive(Debug, Parser)]
#[command(author, version, about = "Paired web-session pacing demo")]
struct Args {
    /// Number of sessions to run
    #[arg(short = 'n', long, env = "WEBSESSION_SESSIONS", default_value_t = 3)]
    sessions: u32,

    /// Number of ticks to simulate
    #[arg(short = 't', long, env = "WEBSESSION_TICKS", default_value_t = 40)]
    ticks: u64,

    /// Simulated time advanced per tick
    #[arg(short = 'r', long, env = "WEBSESSION_TICK_RATE", default_value_t = 1.0)]
    tick_rate: SimTime,

    /// Initial simulated time
    #[arg(long, default_value_t = 0.0)]
    start_time: SimTime,

    /// Trace file for application-tier cloudlets (`start:length` per line)
    #[arg(long, requires = "db_trace")]
    app_trace: Option<PathBuf>,

    /// Trace file for database-tier cloudlets (`start:length` per line)
    #[arg(long, requires = "app_trace")]
    db_trace: Option<PathBuf>,

    /// Spacing between generated cloudlets when no traces are given
    #[arg(long, default_value_t = 2.0)]
    period: SimTime,

    /// Length of generated cloudlets when no traces are given
    #[arg(long, default_value_t = 200)]
    length: u64,

    /// Processing speed of the application host
    #[arg(long, default_value_t = 200.0)]
    app_speed: f64,

    /// Processing speed of the database host
    #[arg(long, default_value_t = 50.0)]
    db_speed: f64,

    /// Output format for dispatch records
    #[arg(long, value_enum, default_value_t = OutputFormat::Plain)]
    format: OutputFormat,
}

const APP_HOST: HostId = HostId(1);
const DB_HOST: HostId = HostId(2);

fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| EnvFilter::new("websession=info,demo=info")),
        )
        .with_writer(std::io::stderr)
        .init();

    let args = Args::parse();
    if !(args.tick_rate.is_finite() && args.tick_rate > 0.0) {
        bail!("tick rate must be greater than zero");
    }
    if !args.start_time.is_finite() {
        bail!("start time must be finite");
    }

    let mut farm = HostFarm::new(args.format);
    farm.add_host(APP_HOST, args.app_speed);
    farm.add_host(DB_HOST, args.db_speed);

    let ids = SessionIdAllocator::default();
    let mut driver = Driver::new_with_tick_rate(farm, args.start_time, args.tick_rate);
    for _ in 0..args.sessions {
        let (app, db) = build_generators(&args)?;
        let mut session = Session::new(app, db, &ids);
        session.set_app_host_id(APP_HOST);
        session.set_db_host_id(DB_HOST);
        driver.add_session(session);
    }

    info!(
        sessions = args.sessions,
        ticks = args.ticks,
        tick_rate = args.tick_rate,
        "starting simulation"
    );
    driver
        .advance_to(args.start_time)
        .context("initial poll failed")?;
    driver
        .run_for_ticks(args.ticks)
        .context("simulation step failed")?;

    info!(
        now = driver.now(),
        dispatched = driver.sink().dispatched(),
        "simulation finished"
    );
    Ok(())
}

fn build_generators(args: &Args) -> Result<(BoxedGenerator, BoxedGenerator)> {
    if let (Some(app_path), Some(db_path)) = (&args.app_trace, &args.db_trace) {
        let app = read_trace(app_path)
            .with_context(|| format!("failed to load app trace {}", app_path.display()))?;
        let db = read_trace(db_path)
            .with_context(|| format!("failed to load db trace {}", db_path.display()))?;
        return Ok((Box::new(app), Box::new(db)));
    }

    let length = args.length;
    let periodic = |start: SimTime| -> Result<BoxedGenerator> {
        let generator =
            PeriodicGenerator::new(start, args.period, move |t: SimTime| Cloudlet::new(t, length))?;
        Ok(Box::new(generator))
    };
    Ok((periodic(args.start_time)?, periodic(args.start_time)?))
}
