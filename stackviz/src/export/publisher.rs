//! Periodic plot publisher
//!
//! The third concurrent unit: on its own thread, it queries the distinct
//! reports and rewrites the plot file whenever the history has grown since
//! the last write. It reads the history only; it never blocks the writer for
//! longer than a snapshot clone.

use anyhow::{Context, Result};
use log::{debug, warn};
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::thread::JoinHandle;
use std::time::{Duration, Instant};

use super::write_plot_file;
use crate::analysis::ReportQuery;
use crate::domain::ExportError;

/// Where the plot goes when no path is configured
pub const DEFAULT_PLOT_PATH: &str = "spec.json";

/// How often the plot file is refreshed
pub const DEFAULT_EXPORT_INTERVAL: Duration = Duration::from_secs(1);

/// Granularity at which the publisher thread observes shutdown
const TICK: Duration = Duration::from_millis(100);

/// Keeps a Vega-Lite file in sync with the distinct reports
pub struct PlotPublisher {
    query: ReportQuery,
    path: PathBuf,
    interval: Duration,
    published_len: Option<usize>,
}

impl PlotPublisher {
    #[must_use]
    pub fn new(query: ReportQuery, path: PathBuf, interval: Duration) -> Self {
        Self { query, path, interval, published_len: None }
    }

    #[must_use]
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Write the plot now; returns the number of distinct reports written
    ///
    /// # Errors
    /// Returns an error if the plot file cannot be written
    pub fn publish(&mut self) -> Result<usize, ExportError> {
        let history_len = self.query.history_len();
        let distinct = self.query.distinct_reports();
        write_plot_file(&self.path, &distinct)?;
        self.published_len = Some(history_len);

        debug!(
            "Published {} distinct stack shapes ({} reports) to {}",
            distinct.len(),
            history_len,
            self.path.display()
        );
        Ok(distinct.len())
    }

    /// Write the plot only if the history grew since the last write
    ///
    /// # Errors
    /// Returns an error if the plot file cannot be written
    pub fn publish_if_changed(&mut self) -> Result<Option<usize>, ExportError> {
        if self.published_len == Some(self.query.history_len()) {
            return Ok(None);
        }
        self.publish().map(Some)
    }

    /// Run the refresh loop on a dedicated thread until `shutdown` is set
    ///
    /// The publisher is handed back on join so the caller can do a final write.
    ///
    /// # Errors
    /// Returns an error if the thread cannot be spawned
    pub fn spawn(mut self, shutdown: Arc<AtomicBool>) -> Result<JoinHandle<Self>> {
        std::thread::Builder::new()
            .name("stackviz-plot".to_string())
            .spawn(move || {
                let mut last_attempt = Instant::now();
                while !shutdown.load(Ordering::Acquire) {
                    std::thread::sleep(TICK);
                    if last_attempt.elapsed() < self.interval {
                        continue;
                    }
                    last_attempt = Instant::now();
                    if let Err(e) = self.publish_if_changed() {
                        warn!("Failed to write plot to {}: {e}", self.path.display());
                    }
                }
                self
            })
            .context("Failed to spawn plot publisher thread")
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::analysis::DedupConfig;
    use crate::domain::FunctionLocation;
    use crate::pipeline::{ReportSequencer, SharedHistory};
    use stackviz_common::Sample;

    fn setup(dir: &Path) -> (ReportSequencer, PlotPublisher) {
        let history = SharedHistory::new();
        let query = ReportQuery::new(history.clone(), DedupConfig::default());
        let publisher =
            PlotPublisher::new(query, dir.join("spec.json"), Duration::from_millis(10));
        (ReportSequencer::new(history), publisher)
    }

    fn record(sequencer: &ReportSequencer, stack_depth: u32, pc: u64) {
        let sp = 0x7000 - u64::from(stack_depth) * 0x40;
        sequencer.record(Sample { stack_depth, timestamp_ns: 0, pc, sp }, FunctionLocation::Unknown);
    }

    fn read_values(path: &Path) -> Vec<serde_json::Value> {
        let spec: serde_json::Value =
            serde_json::from_str(&std::fs::read_to_string(path).unwrap()).unwrap();
        spec["data"]["values"].as_array().unwrap().clone()
    }

    #[test]
    fn test_publish_if_changed_skips_unchanged_history() {
        let dir = tempfile::tempdir().unwrap();
        let (sequencer, mut publisher) = setup(dir.path());

        assert_eq!(publisher.publish_if_changed().unwrap(), Some(0));
        assert_eq!(publisher.publish_if_changed().unwrap(), None);

        record(&sequencer, 0, 0x100);
        record(&sequencer, 1, 0x200);
        record(&sequencer, 0, 0x100);
        assert_eq!(publisher.publish_if_changed().unwrap(), Some(2));
        assert_eq!(read_values(publisher.path()).len(), 2);
    }

    #[test]
    fn test_background_publisher_writes_and_stops() {
        let dir = tempfile::tempdir().unwrap();
        let (sequencer, publisher) = setup(dir.path());
        record(&sequencer, 0, 0x100);
        record(&sequencer, 1, 0x200);

        let shutdown = Arc::new(AtomicBool::new(false));
        let handle = publisher.spawn(Arc::clone(&shutdown)).unwrap();

        let deadline = Instant::now() + Duration::from_secs(5);
        while !dir.path().join("spec.json").exists() && Instant::now() < deadline {
            std::thread::sleep(Duration::from_millis(20));
        }

        shutdown.store(true, Ordering::Release);
        let publisher = handle.join().unwrap();
        assert_eq!(read_values(publisher.path()).len(), 2);
    }
}
