//! CommandQueue behaviour under concurrent producers.

use std::thread;
use std::time::Duration;

use crate::mock_ports::RecordingAckPort;

use thermalctl::app::commands::{Command, CommandPayload, FailureReason};
use thermalctl::app::queue::CommandQueue;

#[test]
fn per_producer_order_survives_concurrent_enqueue() {
    const PRODUCERS: i32 = 4;
    const PER_PRODUCER: i32 = 250;

    let queue = CommandQueue::new();
    let acks = RecordingAckPort::new();

    let handles: Vec<_> = (0..PRODUCERS)
        .map(|p| {
            let queue = queue.clone();
            let acks = acks.clone();
            thread::spawn(move || {
                for n in 0..PER_PRODUCER {
                    let id = p * 10_000 + n;
                    queue.enqueue(Command::remote(CommandPayload::Enable, id, acks.clone()));
                }
            })
        })
        .collect();
    for h in handles {
        h.join().unwrap();
    }

    let mut last = vec![-1; PRODUCERS as usize];
    let mut seen = 0;
    while let Some(mut cmd) = queue.try_dequeue() {
        let id = cmd.command_id().unwrap();
        let producer = (id / 10_000) as usize;
        assert!(id % 10_000 > last[producer], "producer {producer} reordered");
        last[producer] = id % 10_000;
        cmd.ack_complete();
        seen += 1;
    }
    assert_eq!(seen, PRODUCERS * PER_PRODUCER);
}

#[test]
fn consumer_blocks_until_a_command_arrives() {
    let queue = CommandQueue::new();
    let producer = queue.clone();
    let handle = thread::spawn(move || {
        thread::sleep(Duration::from_millis(20));
        producer.enqueue(Command::internal(CommandPayload::Update));
    });
    let cmd = queue.dequeue().unwrap();
    assert_eq!(cmd.name(), "update");
    handle.join().unwrap();
}

#[test]
fn clear_acknowledges_every_discarded_remote_command() {
    let queue = CommandQueue::new();
    let acks = RecordingAckPort::new();
    for id in 0..5 {
        queue.enqueue(Command::remote(CommandPayload::Standby, id, acks.clone()));
    }
    assert_eq!(queue.clear(), 5);
    assert!(queue.is_empty());
    for id in 0..5 {
        let terminal = acks.terminal(id).unwrap();
        assert_eq!(terminal.error_code(), FailureReason::ExecutionBlocked.code());
        assert_eq!(acks.for_id(id).len(), 1);
    }
}

#[test]
fn wrong_channel_length_is_rejected_at_admission() {
    let queue = CommandQueue::new();
    let acks = RecordingAckPort::new();
    let mut channels = vec![vec![0.0; 95]; 4];
    channels[2].pop();
    assert!(!queue.enqueue(Command::remote(CommandPayload::ScannerData(channels), 9, acks.clone())));
    assert!(queue.is_empty());
    assert_eq!(
        acks.terminal(9).map(|a| a.error_code()),
        Some(FailureReason::InvalidParameter.code())
    );
}
