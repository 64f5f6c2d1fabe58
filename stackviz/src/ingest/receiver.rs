//! UDP receive loop
//!
//! One dedicated thread owns the socket and performs blocking
//! receive → decode → enqueue. Samples are pushed into the channel in kernel
//! arrival order; malformed datagrams are dropped and counted.
//!
//! The socket carries a short read timeout so the loop can observe the shared
//! shutdown flag without a datagram arriving.

use anyhow::{Context, Result};
use crossbeam_channel::Sender;
use log::{debug, info, warn};
use stackviz_common::Sample;
use std::io::ErrorKind;
use std::net::{SocketAddr, UdpSocket};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::thread::JoinHandle;
use std::time::Duration;

use super::decode_sample;

/// Receive buffer size; anything longer than a sample is rejected anyway
pub const RECV_BUFFER_SIZE: usize = 1024;

/// Default ingest endpoint (loopback only, the sample source is trusted)
pub const DEFAULT_BIND_ADDR: &str = "127.0.0.1:7155";

/// How long a blocking receive waits before re-checking the shutdown flag
const SHUTDOWN_POLL: Duration = Duration::from_millis(200);

/// Counters reported when the receive loop exits
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct ReceiverStats {
    pub received: u64,
    pub malformed: u64,
}

/// Owns the ingest socket
pub struct SampleReceiver {
    socket: UdpSocket,
}

impl SampleReceiver {
    /// Bind the ingest socket
    ///
    /// # Errors
    /// Returns an error if the address cannot be bound or the read timeout cannot be set
    pub fn bind(addr: SocketAddr) -> Result<Self> {
        let socket =
            UdpSocket::bind(addr).with_context(|| format!("Failed to bind UDP socket on {addr}"))?;
        socket
            .set_read_timeout(Some(SHUTDOWN_POLL))
            .context("Failed to set socket read timeout")?;
        Ok(Self { socket })
    }

    /// Address actually bound (useful when binding port 0)
    ///
    /// # Errors
    /// Returns an error if the socket address cannot be queried
    pub fn local_addr(&self) -> Result<SocketAddr> {
        self.socket.local_addr().context("Failed to query local socket address")
    }

    /// Run the receive loop on a dedicated thread
    ///
    /// # Errors
    /// Returns an error if the thread cannot be spawned
    pub fn spawn(
        self,
        tx: Sender<Sample>,
        shutdown: Arc<AtomicBool>,
    ) -> Result<JoinHandle<ReceiverStats>> {
        std::thread::Builder::new()
            .name("stackviz-recv".to_string())
            .spawn(move || self.run(&tx, &shutdown))
            .context("Failed to spawn receiver thread")
    }

    /// Receive until `shutdown` is set or the consumer hangs up
    pub fn run(self, tx: &Sender<Sample>, shutdown: &AtomicBool) -> ReceiverStats {
        let mut stats = ReceiverStats::default();
        let mut buf = [0u8; RECV_BUFFER_SIZE];

        if let Ok(addr) = self.socket.local_addr() {
            info!("UDP receiver started on {addr}");
        }

        while !shutdown.load(Ordering::Acquire) {
            let (len, peer) = match self.socket.recv_from(&mut buf) {
                Ok(received) => received,
                Err(e) => {
                    if let Some(pause) = error_backoff(e.kind()) {
                        warn!("UDP receive failed: {e}");
                        std::thread::sleep(pause);
                    }
                    continue;
                }
            };

            let sample = match decode_sample(&buf[..len]) {
                Ok(sample) => sample,
                Err(e) => {
                    stats.malformed += 1;
                    warn!("Dropping datagram from {peer}: {e}");
                    continue;
                }
            };

            stats.received += 1;
            debug!("sample from {peer}: {sample:?}");

            if tx.send(sample).is_err() {
                debug!("Sample channel closed, stopping receiver");
                break;
            }
        }

        info!(
            "UDP receiver stopped ({} samples, {} malformed datagrams)",
            stats.received, stats.malformed
        );
        stats
    }
}

/// Pause after a failed receive; `None` for the expected idle wake-ups
fn error_backoff(kind: ErrorKind) -> Option<Duration> {
    match kind {
        ErrorKind::WouldBlock | ErrorKind::TimedOut | ErrorKind::Interrupted => None,
        _ => Some(SHUTDOWN_POLL),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crossbeam_channel::unbounded;

    fn loopback() -> SocketAddr {
        "127.0.0.1:0".parse().unwrap()
    }

    #[test]
    fn test_receives_samples_in_order_and_drops_malformed() {
        let receiver = SampleReceiver::bind(loopback()).unwrap();
        let addr = receiver.local_addr().unwrap();
        let shutdown = Arc::new(AtomicBool::new(false));
        let (tx, rx) = unbounded();
        let handle = receiver.spawn(tx, Arc::clone(&shutdown)).unwrap();

        let sender = UdpSocket::bind(loopback()).unwrap();
        let first = Sample { stack_depth: 1, timestamp_ns: 10, pc: 0x100, sp: 0x7000 };
        let second = Sample { stack_depth: 2, timestamp_ns: 20, pc: 0x200, sp: 0x6f00 };
        sender.send_to(&first.to_bytes(), addr).unwrap();
        sender.send_to(&[0u8; 12], addr).unwrap();
        sender.send_to(&second.to_bytes(), addr).unwrap();

        let timeout = Duration::from_secs(5);
        assert_eq!(rx.recv_timeout(timeout).unwrap(), first);
        assert_eq!(rx.recv_timeout(timeout).unwrap(), second);

        shutdown.store(true, Ordering::Release);
        let stats = handle.join().unwrap();
        assert_eq!(stats, ReceiverStats { received: 2, malformed: 1 });
    }

    #[test]
    fn test_stops_on_shutdown_without_traffic() {
        let receiver = SampleReceiver::bind(loopback()).unwrap();
        let shutdown = Arc::new(AtomicBool::new(false));
        let (tx, _rx) = unbounded();
        let handle = receiver.spawn(tx, Arc::clone(&shutdown)).unwrap();

        shutdown.store(true, Ordering::Release);
        let stats = handle.join().unwrap();
        assert_eq!(stats, ReceiverStats::default());
    }

    #[test]
    fn test_receive_errors_back_off_but_timeouts_do_not() {
        assert_eq!(error_backoff(ErrorKind::WouldBlock), None);
        assert_eq!(error_backoff(ErrorKind::TimedOut), None);
        assert_eq!(error_backoff(ErrorKind::Interrupted), None);
        assert_eq!(error_backoff(ErrorKind::ConnectionRefused), Some(SHUTDOWN_POLL));
        assert_eq!(error_backoff(ErrorKind::Other), Some(SHUTDOWN_POLL));
    }
}
