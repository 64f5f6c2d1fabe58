//! Analysis over the report history
//!
//! Pure logic, separated from ingestion and rendering:
//! - `dedup`: reduce the history to reports that introduce a new stack shape
//! - `query`: the snapshot → recompute → deduplicate read path

pub mod dedup;
pub mod query;

pub use dedup::{deduplicate, DedupConfig, EvictionPolicy, StackDeduplicator, MAX_DEPTH};
pub use query::ReportQuery;
