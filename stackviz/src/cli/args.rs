//! CLI argument definitions

use clap::Parser;
use std::net::SocketAddr;
use std::path::PathBuf;
use std::time::Duration;

use crate::analysis::{DedupConfig, EvictionPolicy, MAX_DEPTH};
use crate::export::DEFAULT_PLOT_PATH;
use crate::ingest::DEFAULT_BIND_ADDR;
use crate::symbolization::DEFAULT_ADDR2LINE;

#[derive(Parser, Debug)]
#[command(
    name = "stackviz",
    version,
    about = "Visualize distinct call-stack shapes streamed from an instrumented program",
    after_help = "\
EXAMPLES:
    stackviz ./fib                           Symbolize with addr2line, write spec.json
    stackviz ./fib --dwarf -o stacks.json    In-process DWARF lookup
    stackviz ./fib --pid 4242                PIE target: load bias from /proc/4242/maps"
)]
pub struct Args {
    /// Instrumented binary, used for symbolication
    #[arg(value_name = "TARGET")]
    pub target: PathBuf,

    /// UDP address to receive samples on
    #[arg(long, default_value = DEFAULT_BIND_ADDR)]
    pub bind: SocketAddr,

    /// addr2line-compatible program used as the symbolication worker
    #[arg(long, value_name = "PROGRAM", default_value = DEFAULT_ADDR2LINE)]
    pub addr2line: String,

    /// Read DWARF debug info in-process instead of running a worker
    #[arg(long)]
    pub dwarf: bool,

    /// Subtract this base (hex or decimal) from every address before lookup
    #[arg(long, value_name = "ADDR", value_parser = parse_address, conflicts_with = "pid")]
    pub load_bias: Option<u64>,

    /// Running target's PID; its load bias is read from /proc/<PID>/maps
    #[arg(long)]
    pub pid: Option<u32>,

    /// Vega-Lite plot output file
    #[arg(short, long, value_name = "FILE", default_value = DEFAULT_PLOT_PATH)]
    pub output: PathBuf,

    /// Plot refresh interval in milliseconds
    #[arg(long, value_name = "MS", default_value = "1000")]
    pub export_interval_ms: u64,

    /// Deepest stack slot considered when comparing stack shapes
    #[arg(long, default_value_t = MAX_DEPTH)]
    pub max_depth: u32,

    /// Bound used to drop stale frames when the stack unwinds
    #[arg(long, value_enum, default_value_t = EvictionPolicy::Depth)]
    pub eviction: EvictionPolicy,

    /// Stop after N seconds (0 = unlimited)
    #[arg(long, default_value = "0")]
    pub duration: u64,

    /// Suppress per-sample output
    #[arg(short, long)]
    pub quiet: bool,
}

impl Args {
    #[must_use]
    pub fn dedup_config(&self) -> DedupConfig {
        DedupConfig { max_depth: self.max_depth, eviction: self.eviction }
    }

    #[must_use]
    pub fn export_interval(&self) -> Duration {
        Duration::from_millis(self.export_interval_ms)
    }

    #[must_use]
    pub fn duration_limit(&self) -> Option<Duration> {
        (self.duration > 0).then(|| Duration::from_secs(self.duration))
    }
}

/// Parse `0x`-prefixed hex or plain decimal
fn parse_address(value: &str) -> Result<u64, String> {
    let parsed = match value.strip_prefix("0x").or_else(|| value.strip_prefix("0X")) {
        Some(hex) => u64::from_str_radix(hex, 16),
        None => value.parse::<u64>(),
    };
    parsed.map_err(|e| format!("invalid address `{value}`: {e}"))
}
