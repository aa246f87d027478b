//! thermalctl entry point
//!
//! Hexagonal architecture with one thread per blocking resource.
//!
//! ```text
//! ┌────────────────────────────────────────────────────────────────┐
//! │                      Adapters (outer ring)                     │
//! │                                                                │
//! │  ConsoleSource    LogEventSink    JsonConfigFile   SystemClock │
//! │  (CommandSource)  (Event+Telem)   (ConfigPort)     (Clock)     │
//! │  SimulatedModel   ThermalScannerClient ×4                      │
//! │                                                                │
//! │  ──────────────── Port Trait Boundary ───────────────────      │
//! │                                                                │
//! │  subscriber ─┐                                                 │
//! │  outer-loop ─┼─▶ CommandQueue ─▶ dispatch ─▶ Controller (FSM)  │
//! │  scanners ───┘                                                 │
//! └────────────────────────────────────────────────────────────────┘
//! ```

use std::path::PathBuf;
use std::thread;
use std::time::Duration;

use anyhow::{Context, Result};
use clap::Parser;
use log::info;

use thermalctl::adapters::config_file::JsonConfigFile;
use thermalctl::adapters::console::ConsoleSource;
use thermalctl::adapters::log_sink::LogEventSink;
use thermalctl::adapters::sim_model::{ShutdownSignal, SimulatedModel};
use thermalctl::adapters::time::SystemClock;
use thermalctl::app::commands::{Command, CommandPayload};
use thermalctl::app::ports::ConfigPort;
use thermalctl::app::queue::CommandQueue;
use thermalctl::app::service::Controller;
use thermalctl::tasks::scanner::ScannerTasks;
use thermalctl::tasks::{dispatch, subscriber, ticker};

#[derive(Parser, Debug)]
#[command(name = "thermalctl", version, about = "Thermal-management controller")]
struct Cli {
    /// JSON configuration file (defaults are used if it does not exist)
    #[arg(short, long, default_value = "thermalctl.json")]
    config: PathBuf,

    /// Write the effective configuration to the config file and exit
    #[arg(long)]
    write_config: bool,
}

fn main() -> Result<()> {
    // ── 1. Logging + CLI ──────────────────────────────────────
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();
    let cli = Cli::parse();

    info!("thermalctl v{}", env!("CARGO_PKG_VERSION"));

    // ── 2. Configuration ──────────────────────────────────────
    let config_file = JsonConfigFile::new(&cli.config);
    let config = config_file
        .load()
        .with_context(|| format!("loading {}", cli.config.display()))?;
    config.validate().context("invalid configuration")?;

    if cli.write_config {
        config_file
            .save(&config)
            .with_context(|| format!("writing {}", cli.config.display()))?;
        info!("Configuration written to {}", cli.config.display());
        return Ok(());
    }

    // ── 3. Controller ─────────────────────────────────────────
    let queue = CommandQueue::new();
    let shutdown = ShutdownSignal::new();
    let mut controller = Controller::new(
        SimulatedModel::new(&config, shutdown.clone()),
        LogEventSink::new(),
        LogEventSink::new(),
        Box::new(SystemClock::new()),
    );
    controller.start();
    let state = controller.state_watch();

    // ── 4. Tasks ──────────────────────────────────────────────
    // Boot is queued ahead of the first outer-loop update.
    queue.enqueue(Command::internal(CommandPayload::Boot));
    let dispatch = dispatch::spawn(
        queue.clone(),
        controller,
        Duration::from_millis(config.dispatch_wake_interval_ms),
    )?;
    let scanners = ScannerTasks::spawn(&config, queue.clone())?;
    let ticker = ticker::spawn(
        queue.clone(),
        Duration::from_millis(config.outer_loop_interval_ms),
    )?;
    let subscriber = subscriber::spawn(
        ConsoleSource::stdin()?,
        queue.clone(),
        Duration::from_millis(config.subscriber_interval_ms),
    )?;

    info!("System ready. Waiting for shutdown.");

    // ── 5. Wait for the model to request shutdown ─────────────
    let poll = Duration::from_millis(config.shutdown_poll_interval_ms);
    while !shutdown.is_requested() {
        thread::sleep(poll);
    }
    info!("Shutdown requested in state {}", state.get());

    // ── 6. Stop producers, then the consumer ──────────────────
    subscriber.shutdown();
    let ticks = ticker.shutdown().unwrap_or_default();
    let scans = scanners.shutdown();
    let controller = dispatch.shutdown();
    let discarded = queue.clear();

    info!(
        "Stopped: {} updates, {} scans, {} commands executed, {} discarded",
        ticks,
        scans,
        controller.as_ref().map_or(0, |c| c.executed()),
        discarded
    );
    Ok(())
}
