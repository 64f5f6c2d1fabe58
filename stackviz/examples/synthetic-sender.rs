//! Synthetic instrumented program for trying stackviz without a real target.
//!
//! Computes Fibonacci numbers recursively and reports every depth change the
//! way an instrumented binary would: one 28-byte datagram carrying the depth,
//! a timestamp, the current function's address and the stack pointer.
//!
//! The binary is position independent, so stackviz needs its load base. The
//! sender prints its PID and load base, then waits `--start-delay` seconds
//! before the first round:
//!
//!   cargo build --example synthetic-sender
//!   target/debug/examples/synthetic-sender --start-delay 10
//!   # in another terminal, within the delay:
//!   stackviz target/debug/examples/synthetic-sender --pid <PID>
//!   # or, equivalently:
//!   stackviz target/debug/examples/synthetic-sender --load-bias <LOAD BASE>

use clap::Parser;
use stackviz::symbolization::find_binary_range;
use stackviz_common::{Sample, DEFAULT_PORT};
use std::net::{SocketAddr, UdpSocket};
use std::time::{Duration, Instant};

#[derive(Parser, Debug)]
#[command(about = "Send recursive-Fibonacci stack samples to stackviz")]
struct Args {
    /// Fibonacci argument (controls maximum depth)
    #[arg(default_value = "10")]
    n: u32,

    /// Where stackviz listens
    #[arg(long, default_value_t = SocketAddr::from(([127, 0, 0, 1], DEFAULT_PORT)))]
    to: SocketAddr,

    /// Number of full computations to run
    #[arg(long, default_value = "3")]
    rounds: u32,

    /// Pause after each sample, in microseconds
    #[arg(long, default_value = "200")]
    pause_us: u64,

    /// Seconds to wait before sending, to attach stackviz with `--pid`
    #[arg(long, default_value = "5")]
    start_delay: u64,
}

/// Where this executable is mapped, if `/proc/self/maps` says so
fn own_load_base() -> Option<u64> {
    let exe = std::env::current_exe().ok()?;
    let maps = std::fs::read_to_string("/proc/self/maps").ok()?;
    find_binary_range(&maps, &exe.to_string_lossy()).map(|range| range.start)
}

struct Probe {
    socket: UdpSocket,
    started: Instant,
    pause: Duration,
    sent: u64,
}

impl Probe {
    #[inline(never)]
    fn report(&mut self, stack_depth: u32, pc: u64) {
        let marker = 0u8;
        let sample = Sample {
            stack_depth,
            timestamp_ns: u64::try_from(self.started.elapsed().as_nanos()).unwrap_or(u64::MAX),
            pc,
            sp: std::ptr::addr_of!(marker) as u64,
        };
        if let Err(e) = self.socket.send(&sample.to_bytes()) {
            eprintln!("send failed: {e}");
        }
        self.sent += 1;
        std::thread::sleep(self.pause);
    }
}

#[inline(never)]
fn fib(probe: &mut Probe, n: u32, depth: u32) -> u64 {
    probe.report(depth, fib as usize as u64);
    let result = if n < 2 {
        u64::from(n)
    } else {
        fib(probe, n - 1, depth + 1) + fib(probe, n - 2, depth + 1)
    };
    if depth > 0 {
        // back in the caller's frame
        probe.report(depth - 1, fib as usize as u64);
    }
    result
}

fn main() -> std::io::Result<()> {
    let args = Args::parse();

    let socket = UdpSocket::bind("127.0.0.1:0")?;
    socket.connect(args.to)?;

    println!("pid: {}", std::process::id());
    match own_load_base() {
        Some(base) => println!("load base: 0x{base:x}"),
        None => println!("load base: unknown (no /proc/self/maps)"),
    }
    println!("sending to udp://{} in {}s", args.to, args.start_delay);
    std::thread::sleep(Duration::from_secs(args.start_delay));

    let mut probe =
        Probe { socket, started: Instant::now(), pause: Duration::from_micros(args.pause_us), sent: 0 };

    for round in 1..=args.rounds {
        let value = fib(&mut probe, args.n, 0);
        println!("round {round}: fib({}) = {value}", args.n);
    }

    println!("{} samples sent", probe.sent);
    Ok(())
}
