//! # stackviz - Live Call-Stack Shape Visualizer
//!
//! stackviz receives stack-depth samples from an instrumented program over
//! UDP, resolves each sample's instruction pointer to a `file:line` location,
//! numbers the results into an append-only history and keeps a Vega-Lite bar
//! chart of the distinct call-stack shapes up to date on disk.
//!
//! ## Architecture Overview
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────────┐
//! │                   Instrumented Target Program                   │
//! │          (one 28-byte datagram per stack-depth change)          │
//! └───────────────────────┬─────────────────────────────────────────┘
//!                         │ UDP
//!                         ▼
//! ┌─────────────────────────────────────────────────────────────────┐
//! │                     stackviz (This Crate)                       │
//! │                                                                 │
//! │  ┌──────────────┐   ┌──────────────┐   ┌──────────────┐         │
//! │  │   Receiver   │──▶│  Processor   │──▶│  Sequencer   │         │
//! │  │   (thread)   │   │ (main loop)  │   │  (history)   │         │
//! │  └──────────────┘   └──────┬───────┘   └──────┬───────┘         │
//! │                            │                  │ snapshot        │
//! │                            ▼                  ▼                 │
//! │                     ┌──────────────┐   ┌──────────────┐         │
//! │                     │   Resolver   │   │    Dedup     │         │
//! │                     │ (addr2line)  │   │   (query)    │         │
//! │                     └──────────────┘   └──────┬───────┘         │
//! │                                               ▼                 │
//! │                                        ┌──────────────┐         │
//! │                                        │  Publisher   │         │
//! │                                        │ (spec.json)  │         │
//! │                                        └──────────────┘         │
//! └─────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Module Structure
//!
//! - [`ingest`]: UDP receiver thread and wire decoding
//! - [`symbolization`]: address → source location, with memoization
//!   - `worker`: long-lived `addr2line` child process
//!   - `dwarf`: in-process DWARF lookup
//!   - `memory_maps`: load bias for PIE targets
//! - [`pipeline`]: the processing loop, the report sequencer and the shared history
//! - [`analysis`]: stack-shape deduplication and read-only queries
//! - [`export`]: Vega-Lite plot generation and the periodic publisher
//! - [`domain`]: reports, locations and error types
//! - [`cli`]: command-line arguments
//! - [`preflight`]: target validation before startup
//!
//! ## Concurrency
//!
//! Three units run at once: the receiver thread, the processing loop on the
//! main task and the plot publisher thread. The processing loop is the only
//! writer of the history; index assignment and append happen under one lock,
//! so indices are gapless and strictly increasing no matter how many readers
//! take snapshots concurrently.
//!
//! ## Typical Usage
//!
//! ```bash
//! # Start the visualizer, then run the instrumented program
//! stackviz ./fib
//! ./fib 20
//!
//! # Render spec.json with any Vega-Lite viewer
//! ```

pub mod analysis;
pub mod cli;
pub mod domain;
pub mod export;
pub mod ingest;
pub mod pipeline;
pub mod preflight;
pub mod symbolization;
