//! End-to-end: UDP datagrams in, deduplicated Vega-Lite plot out.
#![cfg(unix)]

use crossbeam_channel::unbounded;
use stackviz::analysis::{DedupConfig, ReportQuery};
use stackviz::export::PlotPublisher;
use stackviz::ingest::SampleReceiver;
use stackviz::pipeline::{DrainStatus, ReportSequencer, SampleProcessor, SharedHistory};
use stackviz::symbolization::{Addr2LineWorker, AddressResolver};
use stackviz_common::Sample;
use std::net::UdpSocket;
use std::process::Command;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::{Duration, Instant};

/// Stands in for `addr2line -e <target>`: one line per address
fn fake_addr2line() -> Addr2LineWorker {
    let mut command = Command::new("sh");
    command.arg("-c").arg(
        r#"while read a; do
             if [ "$a" = "dead" ]; then echo "??:0"; else echo "/src/fib.c:$((0x$a % 97))"; fi
           done"#,
    );
    Addr2LineWorker::from_command(command).unwrap()
}

fn sample(stack_depth: u32, pc: u64, timestamp_ns: u64) -> Sample {
    Sample { stack_depth, timestamp_ns, pc, sp: 0x7fff_0000 - u64::from(stack_depth) * 0x30 }
}

#[test]
fn test_datagrams_to_plot() {
    let dir = tempfile::tempdir().unwrap();
    let plot_path = dir.path().join("spec.json");

    let receiver = SampleReceiver::bind("127.0.0.1:0".parse().unwrap()).unwrap();
    let addr = receiver.local_addr().unwrap();
    let shutdown = Arc::new(AtomicBool::new(false));
    let (tx, rx) = unbounded();
    let receiver_handle = receiver.spawn(tx, Arc::clone(&shutdown)).unwrap();

    let history = SharedHistory::new();
    let mut processor = SampleProcessor::new(
        rx,
        AddressResolver::new(fake_addr2line()),
        ReportSequencer::new(history.clone()),
    );

    let sender = UdpSocket::bind("127.0.0.1:0").unwrap();
    let samples = [
        sample(0, 0x1000, 10),
        sample(1, 0x1040, 20),
        sample(0, 0x1000, 30),
        sample(1, 0x1040, 40),
        sample(1, 0xdead, 50),
    ];
    for (i, s) in samples.iter().enumerate() {
        sender.send_to(&s.to_bytes(), addr).unwrap();
        if i == 2 {
            // truncated datagram is dropped, not fatal
            sender.send_to(&[0u8; 27], addr).unwrap();
        }
    }

    let deadline = Instant::now() + Duration::from_secs(5);
    while history.len() < samples.len() && Instant::now() < deadline {
        processor.drain().unwrap();
        std::thread::sleep(Duration::from_millis(10));
    }

    shutdown.store(true, Ordering::Release);
    let stats = receiver_handle.join().unwrap();
    assert_eq!(stats.received, 5);
    assert_eq!(stats.malformed, 1);
    assert_eq!(processor.drain().unwrap(), DrainStatus::Disconnected(0));

    // Gapless indices in arrival order
    let reports = history.snapshot();
    let indices: Vec<u64> = reports.iter().map(|r| r.index).collect();
    assert_eq!(indices, vec![1, 2, 3, 4, 5]);
    assert_eq!(reports[1].function_location.to_string(), format!("/src/fib.c:{}", 0x1040 % 97));
    assert!(!reports[4].function_location.is_known());
    assert_eq!(reports[1].stack_size, 0x30);

    // 0x1000 and 0x1040 each cost one lookup despite repeating
    assert_eq!(processor.resolver().cached_addresses(), 3);
    assert_eq!(processor.stats.samples, 5);
    assert_eq!(processor.stats.unresolved, 1);

    let query = ReportQuery::new(history, DedupConfig::default());
    let distinct: Vec<u64> = query.distinct_reports().iter().map(|r| r.index).collect();
    assert_eq!(distinct, vec![1, 2, 5]);

    let mut publisher = PlotPublisher::new(query, plot_path.clone(), Duration::from_secs(1));
    assert_eq!(publisher.publish().unwrap(), 3);

    let spec: serde_json::Value =
        serde_json::from_str(&std::fs::read_to_string(&plot_path).unwrap()).unwrap();
    let values = spec["data"]["values"].as_array().unwrap();
    assert_eq!(values.len(), 3);
    assert_eq!(values[2]["index"], 5);
    assert_eq!(values[2]["functionLocation"], "<unknown>");
    assert_eq!(values[1]["stackDepth"], 1);
}

#[test]
fn test_dead_worker_stops_processing() {
    let (tx, rx) = unbounded();
    let mut command = Command::new("sh");
    command.arg("-c").arg("exit 0");
    let worker = Addr2LineWorker::from_command(command).unwrap();

    let history = SharedHistory::new();
    let mut processor = SampleProcessor::new(
        rx,
        AddressResolver::new(worker),
        ReportSequencer::new(history.clone()),
    );

    // give the worker time to exit
    std::thread::sleep(Duration::from_millis(200));
    tx.send(sample(0, 0x1000, 0)).unwrap();

    assert!(processor.drain().is_err());
    assert!(history.is_empty());
}
