//! Scanner ingestion end to end over UDP loopback.
//!
//! Four real sockets on ephemeral ports feed the assembler, whose
//! `scannerData` commands are dispatched to a controller on its own thread.

use std::net::{SocketAddr, UdpSocket};
use std::thread;
use std::time::{Duration, Instant};

use crate::mock_ports::{FixedClock, MockModel, SharedSink};

use thermalctl::app::commands::{Command, CommandPayload};
use thermalctl::app::queue::CommandQueue;
use thermalctl::app::service::Controller;
use thermalctl::config::SystemConfig;
use thermalctl::fsm::StateId;
use thermalctl::tasks::dispatch;
use thermalctl::tasks::scanner::ScannerTasks;

fn loopback_config() -> SystemConfig {
    SystemConfig {
        scanner_bind_ip: "127.0.0.1".to_string(),
        scanner_ports: [0; 4],
        scanner_read_timeout_ms: Some(200),
        dispatch_wake_interval_ms: 10,
        ..Default::default()
    }
}

fn frame(id: usize, value: f32, count: usize) -> String {
    let mut s = format!("TS{id}");
    for _ in 0..count {
        s.push_str(&format!(",{value:.1}"));
    }
    s.push('\n');
    s
}

fn send_all(addrs: &[SocketAddr], frames: &[String]) {
    let tx = UdpSocket::bind("127.0.0.1:0").unwrap();
    for (addr, f) in addrs.iter().zip(frames) {
        tx.send_to(f.as_bytes(), addr).unwrap();
    }
}

fn wait_for(mut cond: impl FnMut() -> bool) -> bool {
    let deadline = Instant::now() + Duration::from_secs(5);
    while Instant::now() < deadline {
        if cond() {
            return true;
        }
        thread::sleep(Duration::from_millis(5));
    }
    false
}

fn disabled_controller(sink: &SharedSink, model: &MockModel) -> Controller<MockModel, SharedSink, SharedSink> {
    let mut c = Controller::new(
        model.clone(),
        sink.clone(),
        sink.clone(),
        Box::new(FixedClock(42.0)),
    );
    c.start();
    c.execute(Command::internal(CommandPayload::Boot));
    c.execute(Command::internal(CommandPayload::Start {
        settings_to_apply: "Default".into(),
    }));
    assert_eq!(c.state(), StateId::Disabled);
    c
}

#[test]
fn four_frames_become_one_published_sample() {
    let config = loopback_config();
    let queue = CommandQueue::new();
    let sink = SharedSink::default();
    let model = MockModel::default();
    let controller = disabled_controller(&sink, &model);
    let watch = controller.state_watch();

    let dispatch = dispatch::spawn(queue.clone(), controller, Duration::from_millis(10)).unwrap();
    let scanners = ScannerTasks::spawn(&config, queue.clone()).unwrap();

    let frames: Vec<String> = (1..=4).map(|i| frame(i, i as f32, 95)).collect();
    send_all(scanners.local_addrs(), &frames);

    assert!(wait_for(|| sink.samples().len() == 1), "no sample published");

    let sample = &sink.samples()[0];
    for (i, channel) in sample.scanners.iter().enumerate() {
        assert_eq!(channel.len(), 95);
        assert!(channel.iter().all(|&r| (r - (i + 1) as f32).abs() < f32::EPSILON));
    }
    assert_eq!(watch.get(), StateId::Disabled);

    assert_eq!(scanners.shutdown(), 1);
    let controller = dispatch.shutdown().unwrap();
    assert_eq!(controller.state(), StateId::Disabled);
}

#[test]
fn short_frame_never_reaches_the_model() {
    let config = loopback_config();
    let queue = CommandQueue::new();
    let sink = SharedSink::default();
    let model = MockModel::default();
    let controller = disabled_controller(&sink, &model);

    let dispatch = dispatch::spawn(queue.clone(), controller, Duration::from_millis(10)).unwrap();
    let scanners = ScannerTasks::spawn(&config, queue.clone()).unwrap();

    let mut frames: Vec<String> = (1..=4).map(|i| frame(i, 20.0, 95)).collect();
    frames[1] = frame(2, 20.0, 60);
    send_all(scanners.local_addrs(), &frames);

    // The cycle completes but the bundle fails validation at admission.
    let addrs = scanners.local_addrs().to_vec();
    assert!(wait_for(|| scanners.cycles() == 1), "short cycle never bundled");
    assert!(queue.is_empty());
    assert!(sink.samples().is_empty());
    assert!(model.log().ingested.is_empty());

    // A following good cycle still gets through.
    let good: Vec<String> = (1..=4).map(|i| frame(i, 21.0, 95)).collect();
    send_all(&addrs, &good);
    assert!(wait_for(|| sink.samples().len() == 1));

    assert_eq!(scanners.shutdown(), 2);
    dispatch.shutdown();
}

#[test]
fn malformed_frame_counts_as_an_empty_channel() {
    let config = loopback_config();
    let queue = CommandQueue::new();
    let scanners = ScannerTasks::spawn(&config, queue.clone()).unwrap();

    let mut frames: Vec<String> = (1..=4).map(|i| frame(i, 20.0, 95)).collect();
    frames[3] = "TS4,not-a-number\n".to_string();
    send_all(scanners.local_addrs(), &frames);

    // One complete cycle, rejected at admission, so nothing queued.
    assert!(wait_for(|| scanners.cycles() == 1), "malformed cycle never bundled");
    assert!(queue.is_empty());
    assert_eq!(scanners.shutdown(), 1);
}

#[test]
fn shutdown_wakes_blocked_readers() {
    let config = SystemConfig {
        scanner_read_timeout_ms: None,
        ..loopback_config()
    };
    let scanners = ScannerTasks::spawn(&config, CommandQueue::new()).unwrap();
    let started = Instant::now();
    assert_eq!(scanners.shutdown(), 0);
    assert!(started.elapsed() < Duration::from_secs(2));
}

#[test]
fn failed_start_up_releases_ports_already_bound() {
    // Find three distinct free ports, then hold a fourth so its bind fails.
    let reserved: Vec<UdpSocket> = (0..3)
        .map(|_| UdpSocket::bind("127.0.0.1:0").unwrap())
        .collect();
    let free: Vec<u16> = reserved
        .iter()
        .map(|s| s.local_addr().unwrap().port())
        .collect();
    drop(reserved);
    let taken = UdpSocket::bind("127.0.0.1:0").unwrap();
    let config = SystemConfig {
        scanner_ports: [free[0], free[1], free[2], taken.local_addr().unwrap().port()],
        scanner_read_timeout_ms: None,
        ..loopback_config()
    };

    assert!(ScannerTasks::spawn(&config, CommandQueue::new()).is_err());

    // Every reader started before the failure has been joined, so its
    // socket is closed and the port can be bound again straight away.
    for port in free {
        UdpSocket::bind(("127.0.0.1", port)).unwrap();
    }
}
