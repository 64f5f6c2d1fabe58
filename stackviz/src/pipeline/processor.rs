//! # Sample Processing
//!
//! Drains the receiver's channel, resolves each sample's instruction pointer
//! and hands it to the sequencer. This is the only writer of the history.
//!
//! ## Backoff
//!
//! [`SampleProcessor::drain`] never blocks. When the channel is empty it
//! returns and the caller sleeps for [`POLL_INTERVAL`] before draining again,
//! so a sample becomes visible at most one interval after it was received.
//! An empty channel is the steady state and is not logged.

use crossbeam_channel::{Receiver, TryRecvError};
use stackviz_common::Sample;
use std::time::Duration;

use super::{PipelineStats, ReportSequencer};
use crate::domain::ResolveError;
use crate::symbolization::{AddressResolver, SymbolSource};

/// Sleep between drains when the channel is empty
pub const POLL_INTERVAL: Duration = Duration::from_millis(100);

/// Outcome of one drain pass
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DrainStatus {
    /// Channel is empty; `n` samples were processed in this pass
    Idle(usize),
    /// Receiver hung up and every queued sample has been processed
    Disconnected(usize),
}

/// Resolve → sequence loop state
pub struct SampleProcessor<S> {
    samples: Receiver<Sample>,
    resolver: AddressResolver<S>,
    sequencer: ReportSequencer,
    pub stats: PipelineStats,
}

impl<S: SymbolSource> SampleProcessor<S> {
    #[must_use]
    pub fn new(
        samples: Receiver<Sample>,
        resolver: AddressResolver<S>,
        sequencer: ReportSequencer,
    ) -> Self {
        Self { samples, resolver, sequencer, stats: PipelineStats::default() }
    }

    /// Process everything currently queued, without blocking
    ///
    /// # Errors
    /// Returns an error if the symbol source fails; the pipeline cannot continue.
    pub fn drain(&mut self) -> Result<DrainStatus, ResolveError> {
        let mut processed = 0;
        loop {
            match self.samples.try_recv() {
                Ok(sample) => {
                    self.process(sample)?;
                    processed += 1;
                }
                Err(TryRecvError::Empty) => return Ok(DrainStatus::Idle(processed)),
                Err(TryRecvError::Disconnected) => {
                    return Ok(DrainStatus::Disconnected(processed))
                }
            }
        }
    }

    fn process(&mut self, sample: Sample) -> Result<(), ResolveError> {
        let location = self.resolver.resolve(sample.pc)?;
        if !location.is_known() {
            self.stats.unresolved += 1;
        }
        self.stats.samples += 1;
        self.sequencer.record(sample, location);
        Ok(())
    }

    #[must_use]
    pub fn resolver(&self) -> &AddressResolver<S> {
        &self.resolver
    }
}
