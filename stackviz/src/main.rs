//! # stackviz - Main Entry Point
//!
//! Wires the three concurrent units together:
//! - **Receiver** thread: UDP datagrams → decoded samples on a channel
//! - **Processing loop** (this task): resolve → sequence → shared history
//! - **Publisher** thread: history → deduplicated Vega-Lite plot file
//!
//! The loop runs until Ctrl+C, the `--duration` limit, or a fatal
//! symbolication error. Either way both threads are stopped and joined and a
//! final plot is written before exit.

use anyhow::{anyhow, Context, Result};
use clap::Parser;
use crossbeam_channel::unbounded;
use env_logger::Env;
use log::info;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::{Duration, Instant};

use stackviz::analysis::ReportQuery;
use stackviz::cli::Args;
use stackviz::export::PlotPublisher;
use stackviz::ingest::SampleReceiver;
use stackviz::pipeline::{
    display_statistics, DrainStatus, ReportSequencer, SampleProcessor, SharedHistory,
    POLL_INTERVAL,
};
use stackviz::preflight::{check_process_access, run_preflight_checks};
use stackviz::symbolization::{
    load_bias_for, Addr2LineWorker, AddressResolver, DwarfSymbols, SymbolSource,
};

// Exit codes
const EXIT_SUCCESS: i32 = 0;
const EXIT_ERROR: i32 = 1;
const EXIT_NOPERM: i32 = 77;

/// How long to wait for the first sample before reminding the user
const IDLE_REMINDER: Duration = Duration::from_secs(10);

fn main() {
    let args = Args::parse();
    let default_filter = if args.quiet { "warn" } else { "info" };
    env_logger::Builder::from_env(Env::default().default_filter_or(default_filter)).init();

    std::process::exit(match run(args) {
        Ok(()) => EXIT_SUCCESS,
        Err(e) => {
            let code = exit_code_for(&e);
            eprintln!("error: {e:#}");
            code
        }
    });
}

fn exit_code_for(err: &anyhow::Error) -> i32 {
    let msg = format!("{err:#}").to_lowercase();
    if msg.contains("permission denied") {
        EXIT_NOPERM
    } else {
        EXIT_ERROR
    }
}

/// Load bias from `--load-bias`, or from the target's mappings with `--pid`
fn resolve_load_bias(args: &Args) -> Result<u64> {
    if let Some(bias) = args.load_bias {
        return Ok(bias);
    }
    let Some(pid) = args.pid else {
        return Ok(0);
    };

    check_process_access(pid)?;
    let target = std::fs::canonicalize(&args.target)
        .with_context(|| format!("Failed to resolve path: {}", args.target.display()))?;
    load_bias_for(pid, &target.to_string_lossy())
}

fn open_symbol_source(args: &Args) -> Result<Box<dyn SymbolSource>> {
    if args.dwarf {
        let symbols = DwarfSymbols::load(&args.target)
            .with_context(|| format!("Failed to load debug info from {}", args.target.display()))?;
        Ok(Box::new(symbols))
    } else {
        Ok(Box::new(Addr2LineWorker::spawn(&args.addr2line, &args.target)?))
    }
}

/// Drain and sleep until interrupted; returns why the loop stopped
async fn process_until_stopped<S: SymbolSource>(
    processor: &mut SampleProcessor<S>,
    duration_limit: Option<Duration>,
) -> Result<&'static str> {
    let ctrl_c = tokio::signal::ctrl_c();
    tokio::pin!(ctrl_c);

    let started = Instant::now();
    let mut last_status_time = Instant::now();

    loop {
        if duration_limit.is_some_and(|limit| started.elapsed() >= limit) {
            return Ok("duration limit reached");
        }

        if let DrainStatus::Disconnected(_) = processor.drain()? {
            return Ok("receiver stopped");
        }

        if processor.stats.samples == 0 && last_status_time.elapsed() > IDLE_REMINDER {
            info!("Still waiting for samples... (none received yet)");
            last_status_time = Instant::now();
        }

        tokio::select! {
            () = tokio::time::sleep(POLL_INTERVAL) => {}
            _ = &mut ctrl_c => return Ok("interrupted"),
        }
    }
}

#[tokio::main]
async fn run(args: Args) -> Result<()> {
    let quiet = args.quiet;

    run_preflight_checks(&args.target, quiet)?;
    let load_bias = resolve_load_bias(&args)?;
    let source = open_symbol_source(&args)?;
    let symbol_backend = source.name().to_string();
    let resolver = AddressResolver::with_load_bias(source, load_bias);

    let history = SharedHistory::new();
    let query = ReportQuery::new(history.clone(), args.dedup_config());
    let shutdown = Arc::new(AtomicBool::new(false));

    let receiver = SampleReceiver::bind(args.bind)?;
    let listen_addr = receiver.local_addr()?;
    let (sample_tx, sample_rx) = unbounded();
    let receiver_handle = receiver.spawn(sample_tx, Arc::clone(&shutdown))?;

    let publisher =
        PlotPublisher::new(query, args.output.clone(), args.export_interval());
    let publisher_handle = publisher.spawn(Arc::clone(&shutdown))?;

    if !quiet {
        println!("stackviz v{}", env!("CARGO_PKG_VERSION"));
        println!("target: {}", args.target.display());
        println!("symbols: {symbol_backend}");
        if load_bias != 0 {
            println!("load bias: 0x{load_bias:x}");
        }
        println!("listening: udp://{listen_addr}");
        println!("plot: {}", args.output.display());
    }

    let mut processor =
        SampleProcessor::new(sample_rx, resolver, ReportSequencer::new(history.clone()));

    let started = Instant::now();
    let outcome = process_until_stopped(&mut processor, args.duration_limit()).await;

    // Stop both threads before touching the history for the last time
    shutdown.store(true, Ordering::Release);
    let receiver_stats =
        receiver_handle.join().map_err(|_| anyhow!("receiver thread panicked"))?;
    let mut publisher =
        publisher_handle.join().map_err(|_| anyhow!("plot publisher thread panicked"))?;

    // Samples queued between the last drain and the receiver stopping
    let outcome = outcome.and_then(|reason| {
        processor.drain()?;
        Ok(reason)
    });

    // Whatever was sequenced is written even if symbolication failed
    let published = publisher
        .publish()
        .with_context(|| format!("Failed to write plot to {}", args.output.display()));
    let exit_reason = outcome?;
    let distinct = published?;

    if !quiet {
        eprintln!(
            "\n{}: {:.1}s, {} reports, {} distinct stack shapes (received: {}, malformed: {})",
            exit_reason,
            started.elapsed().as_secs_f64(),
            history.len(),
            distinct,
            receiver_stats.received,
            receiver_stats.malformed,
        );
        display_statistics(&processor.stats, processor.resolver().cached_addresses());
        println!("saved: {}", publisher.path().display());
    }

    Ok(())
}
