//! Consumer-facing read side of the pipeline.

use super::{deduplicate, DedupConfig};
use crate::domain::Report;
use crate::pipeline::SharedHistory;

/// Read handle over the report history
///
/// Every call takes a fresh snapshot, recomputes stack sizes over it, and
/// (for [`distinct_reports`](Self::distinct_reports)) deduplicates it, so
/// results always reflect the history "as of now".
#[derive(Debug, Clone)]
pub struct ReportQuery {
    history: SharedHistory,
    config: DedupConfig,
}

impl ReportQuery {
    #[must_use]
    pub fn new(history: SharedHistory, config: DedupConfig) -> Self {
        Self { history, config }
    }

    /// Reports that each introduce a new stack shape
    #[must_use]
    pub fn distinct_reports(&self) -> Vec<Report> {
        deduplicate(&self.history.snapshot(), self.config)
    }

    /// Every report, with recomputed stack sizes
    #[must_use]
    pub fn all_reports(&self) -> Vec<Report> {
        self.history.snapshot()
    }

    /// Number of reports in the history right now
    #[must_use]
    pub fn history_len(&self) -> usize {
        self.history.len()
    }
}
