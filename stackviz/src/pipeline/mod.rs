//! Ingest → history pipeline
//!
//! - `history`: the shared, append-only report store
//! - `sequencer`: index assignment and append (single writer)
//! - `processor`: channel drain → resolve → sequence
//! - `display`: log formatting and statistics

pub mod display;
pub mod history;
pub mod processor;
pub mod sequencer;

pub use display::{display_statistics, format_report, format_timestamp, PipelineStats};
pub use history::SharedHistory;
pub use processor::{DrainStatus, SampleProcessor, POLL_INTERVAL};
pub use sequencer::ReportSequencer;
