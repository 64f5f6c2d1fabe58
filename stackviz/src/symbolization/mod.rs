//! # Symbol Resolution
//!
//! Converts the raw instruction pointers reported by the instrumented target
//! into `file:line` locations.
//!
//! ## Sources
//!
//! Two interchangeable [`SymbolSource`] implementations:
//!
//! - **`worker`**: an `addr2line` child process started once against the
//!   target binary, driven over a line-oriented stdin/stdout protocol. If the
//!   worker dies the pipeline cannot continue; there is no restart.
//! - **`dwarf`**: in-process lookup of the target's DWARF line tables via the
//!   `addr2line`/`gimli`/`object` crates. No child process.
//!
//! Both report only the innermost location when an address sits inside an
//! inlined call chain.
//!
//! ## Memoization
//!
//! [`AddressResolver`] wraps a source with an unbounded, never-evicted cache.
//! A target binary has few distinct call sites relative to run length, so each
//! address costs at most one round-trip for the whole run.
//!
//! ## PIE Targets
//!
//! ```text
//! Runtime Address = Load Base + File Offset
//! ```
//!
//! The resolver can subtract a fixed load bias before lookup. `memory_maps`
//! finds that bias from `/proc/<pid>/maps` when the target's PID is known.
//!
//! ## Module Structure
//!
//! - **`source`**: the [`SymbolSource`] capability trait
//! - **`worker`**: [`Addr2LineWorker`]
//! - **`dwarf`**: [`DwarfSymbols`]
//! - **`resolver`**: [`AddressResolver`]
//! - **`memory_maps`**: load-bias discovery

pub mod dwarf;
pub mod memory_maps;
pub mod resolver;
pub mod source;
pub mod worker;

pub use dwarf::DwarfSymbols;
pub use memory_maps::{find_binary_range, load_bias_for, MemoryRange};
pub use resolver::AddressResolver;
pub use source::SymbolSource;
pub use worker::{Addr2LineWorker, DEFAULT_ADDR2LINE};
