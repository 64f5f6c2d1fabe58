//! Report sequencing
//!
//! Turns a resolved sample into a [`Report`] with the next 1-based index and
//! appends it to the shared history. Indices are gapless and follow append
//! order, which is the arrival order on the ingest channel.

use log::info;
use stackviz_common::Sample;

use super::{format_report, SharedHistory};
use crate::domain::{FunctionLocation, Report};

/// Single writer of the report history
pub struct ReportSequencer {
    history: SharedHistory,
}

impl ReportSequencer {
    #[must_use]
    pub fn new(history: SharedHistory) -> Self {
        Self { history }
    }

    /// Append a resolved sample and return the report as stored
    ///
    /// The returned report's `stack_size` is zero; it is only meaningful on a
    /// snapshot (see [`SharedHistory::snapshot`]).
    pub fn record(&self, sample: Sample, function_location: FunctionLocation) -> Report {
        let report = self.history.append_with(|index| Report {
            index,
            stack_depth: sample.stack_depth,
            time: sample.timestamp_ns,
            function_location,
            pc: sample.pc,
            sp: sample.sp,
            stack_size: 0,
        });

        info!("{}", format_report(&report));
        report
    }

    #[must_use]
    pub fn history(&self) -> &SharedHistory {
        &self.history
    }
}
