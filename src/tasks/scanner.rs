//! Scanner ingestion tasks.
//!
//! ```text
//!  scanner-0 ─┐
//!  scanner-1 ─┤  (index, readings)
//!  scanner-2 ─┼──────────────────▶ scan-assembler ──▶ CommandQueue
//!  scanner-3 ─┘   crossbeam channel     (scannerData)
//! ```
//!
//! Each reader blocks on its own socket.  A frame that fails to decode is
//! forwarded as an empty channel so the bundled `scannerData` command fails
//! validation instead of carrying stale readings.  Readers are stopped by
//! clearing their flag and sending the loopback wake-up datagram.

use std::net::SocketAddr;
use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::Duration;

use crossbeam_channel::{Receiver, RecvTimeoutError, Sender, unbounded};
use log::{debug, error, info, warn};

use super::{RunFlag, Task};
use crate::app::commands::{Command, CommandPayload};
use crate::app::queue::CommandQueue;
use crate::config::SystemConfig;
use crate::error::{Error, Result};
use crate::scanner::assembler::ScanAssembler;
use crate::scanner::client::ThermalScannerClient;

/// One reader's output: scanner index plus its decoded readings.
pub type ScanHandoff = (usize, Vec<f32>);

/// Read frames from `client` until `flag` clears.
pub fn run_reader(
    index: usize,
    client: &mut ThermalScannerClient,
    tx: &Sender<ScanHandoff>,
    flag: &RunFlag,
) {
    while flag.is_running() {
        let result = client.receive();
        if !flag.is_running() {
            break;
        }
        let readings = match result {
            Ok(Some(frame)) => {
                debug!(
                    "Scanner {} ({}): {} readings",
                    index,
                    frame.scanner_id,
                    frame.readings.len()
                );
                frame.readings
            }
            Ok(None) => continue,
            Err(Error::Scanner(e)) => {
                warn!("Scanner {index}: malformed frame: {e}");
                Vec::new()
            }
            Err(e) => {
                error!("Scanner {index}: receive failed: {e}");
                continue;
            }
        };
        if tx.send((index, readings)).is_err() {
            break;
        }
    }
}

/// Bundle reader output and enqueue one `scannerData` per full cycle.
///
/// `completed` is bumped once the cycle's command has been offered to the
/// queue, whether admission accepted it or not.
pub fn run_assembler(
    rx: &Receiver<ScanHandoff>,
    queue: &CommandQueue,
    completed: &AtomicU64,
    wake_interval: Duration,
    flag: &RunFlag,
) -> u64 {
    let mut assembler = ScanAssembler::new();
    while flag.is_running() {
        match rx.recv_timeout(wake_interval) {
            Ok((index, readings)) => {
                if let Some(channels) = assembler.accept(index, readings) {
                    queue.enqueue(Command::internal(CommandPayload::ScannerData(channels)));
                    completed.store(assembler.cycles(), Ordering::Release);
                }
            }
            Err(RecvTimeoutError::Timeout) => {}
            Err(RecvTimeoutError::Disconnected) => break,
        }
    }
    assembler.cycles()
}

/// The four readers and the assembler, stopped together.
pub struct ScannerTasks {
    readers: Vec<Task>,
    addrs: Vec<SocketAddr>,
    completed: Arc<AtomicU64>,
    assembler: Task<u64>,
}

impl ScannerTasks {
    /// Bind every scanner socket and start the ingestion threads.
    ///
    /// If any socket or thread fails to start, the readers already running
    /// are stopped and joined before the error is returned.
    pub fn spawn(config: &SystemConfig, queue: CommandQueue) -> Result<Self> {
        let timeout = config.scanner_read_timeout_ms.map(Duration::from_millis);
        let (tx, rx) = unbounded::<ScanHandoff>();

        let mut readers = Vec::with_capacity(config.scanner_ports.len());
        let mut addrs = Vec::with_capacity(config.scanner_ports.len());
        for (index, &port) in config.scanner_ports.iter().enumerate() {
            match spawn_reader(index, config, port, timeout, tx.clone()) {
                Ok((task, addr)) => {
                    readers.push(task);
                    addrs.push(addr);
                }
                Err(e) => {
                    error!("Scanner {index}: start-up failed on port {port}: {e}");
                    stop_readers(readers);
                    return Err(e);
                }
            }
        }
        drop(tx);

        let wake = Duration::from_millis(config.dispatch_wake_interval_ms);
        let completed = Arc::new(AtomicU64::new(0));
        let counter = completed.clone();
        let assembler = match Task::spawn("scan-assembler", move |flag| {
            run_assembler(&rx, &queue, &counter, wake, &flag)
        }) {
            Ok(task) => task,
            Err(e) => {
                stop_readers(readers);
                return Err(e);
            }
        };

        info!("{} scanner readers running", readers.len());
        Ok(Self {
            readers,
            addrs,
            completed,
            assembler,
        })
    }

    /// Bound socket addresses, in scanner order.
    pub fn local_addrs(&self) -> &[SocketAddr] {
        &self.addrs
    }

    /// Scan cycles bundled so far.
    pub fn cycles(&self) -> u64 {
        self.completed.load(Ordering::Acquire)
    }

    /// Stop readers first, then the assembler.  Returns completed cycles.
    pub fn shutdown(self) -> u64 {
        stop_readers(self.readers);
        self.assembler.shutdown().unwrap_or_default()
    }
}

fn spawn_reader(
    index: usize,
    config: &SystemConfig,
    port: u16,
    timeout: Option<Duration>,
    tx: Sender<ScanHandoff>,
) -> Result<(Task, SocketAddr)> {
    let mut client = ThermalScannerClient::bind(
        &config.scanner_bind_ip,
        port,
        config.scanner_recv_buffer_bytes,
        timeout,
    )?;
    let addr = client.local_addr();
    let waker = client.waker();
    let task = Task::spawn(&format!("scanner-{index}"), move |flag| {
        run_reader(index, &mut client, &tx, &flag);
    })?
    .with_unblock(Box::new(move || {
        if let Err(e) = waker.wake() {
            warn!("Scanner {index}: wake-up failed: {e}");
        }
    }));
    Ok((task, addr))
}

/// Wake every reader, then wait for all of them.
fn stop_readers(readers: Vec<Task>) {
    for reader in &readers {
        reader.stop();
    }
    for reader in readers {
        reader.join();
    }
}
