//! Shared, append-only report history
//!
//! One writer (the sequencer) appends under the write lock; any number of
//! readers clone a consistent snapshot under the read lock. A reader never
//! sees a half-appended report or a torn length.

use std::sync::{Arc, PoisonError, RwLock};

use crate::domain::{recompute_stack_sizes, Report};

/// Cloneable handle to the process-wide report history
#[derive(Debug, Clone, Default)]
pub struct SharedHistory {
    reports: Arc<RwLock<Vec<Report>>>,
}

impl SharedHistory {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Build a report with the next index and append it, atomically
    pub(crate) fn append_with(&self, build: impl FnOnce(u64) -> Report) -> Report {
        let mut reports = self.reports.write().unwrap_or_else(PoisonError::into_inner);
        let report = build(reports.len() as u64 + 1);
        reports.push(report.clone());
        report
    }

    /// Number of reports appended so far
    #[must_use]
    pub fn len(&self) -> usize {
        self.reports.read().unwrap_or_else(PoisonError::into_inner).len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Copy of the full history with `stack_size` recomputed over that copy
    #[must_use]
    pub fn snapshot(&self) -> Vec<Report> {
        let mut reports = self.reports.read().unwrap_or_else(PoisonError::into_inner).clone();
        recompute_stack_sizes(&mut reports);
        reports
    }
}
