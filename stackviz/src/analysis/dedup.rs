//! Stack-shape deduplication.
//!
//! Reduces a dense report history (one report per depth change) to the sparse
//! subsequence of reports that each introduce a call-stack configuration not
//! seen before. The first occurrence of a shape is kept; original indices are
//! preserved, so the output has gaps.
//!
//! # Algorithm
//!
//! A *stack snapshot* maps depth → `(stack_depth, pc, sp)` of the most recent
//! report seen at that depth. For each report, in order:
//!
//! 1. If the stack unwound (depth lower than the previous report's), drop the
//!    snapshot entries above the eviction bound.
//! 2. Record the report at its depth.
//! 3. Hash the snapshot entries at depths `0..max_depth`, in ascending order.
//! 4. Keep the report only if that hash is new.
//!
//! The very first report is always kept and seeds the seen set.
//!
//! # Determinism
//!
//! The hasher uses fixed keys, so identical input always yields identical
//! output. The function is pure: no I/O, no clock, no failure modes.

use clap::ValueEnum;
use std::collections::hash_map::DefaultHasher;
use std::collections::{BTreeMap, HashSet};
use std::hash::{Hash, Hasher};

use crate::domain::Report;

// =============================================================================
// CONFIGURATION
// =============================================================================

/// Deepest snapshot slot (exclusive) taken into account when hashing.
pub const MAX_DEPTH: u32 = 40;

/// Quantity used as the lower bound of snapshot eviction on unwind.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, ValueEnum)]
pub enum EvictionPolicy {
    /// Evict every frame deeper than the report's `stack_depth`
    #[default]
    Depth,
    /// Evict frames from `stack_size + 1` on, treating the byte count as a
    /// depth index. Reports must carry recomputed stack sizes.
    StackSize,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DedupConfig {
    pub max_depth: u32,
    pub eviction: EvictionPolicy,
}

impl Default for DedupConfig {
    fn default() -> Self {
        Self { max_depth: MAX_DEPTH, eviction: EvictionPolicy::Depth }
    }
}

// =============================================================================
// DEDUPLICATOR
// =============================================================================

/// The part of a report that identifies a frame in a stack shape
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
struct FrameKey {
    stack_depth: u32,
    pc: u64,
    sp: u64,
}

impl From<&Report> for FrameKey {
    fn from(report: &Report) -> Self {
        Self { stack_depth: report.stack_depth, pc: report.pc, sp: report.sp }
    }
}

/// Incremental stack-shape tracker
///
/// Feed reports in arrival order with [`observe`](Self::observe).
#[derive(Debug, Default)]
pub struct StackDeduplicator {
    config: DedupConfig,
    snapshot: BTreeMap<u32, FrameKey>,
    seen: HashSet<u64>,
    previous_depth: Option<u32>,
}

impl StackDeduplicator {
    #[must_use]
    pub fn new(config: DedupConfig) -> Self {
        Self { config, ..Self::default() }
    }

    /// Fold one report into the snapshot
    ///
    /// Returns `true` if the resulting stack shape has not been seen before.
    pub fn observe(&mut self, report: &Report) -> bool {
        if self.previous_depth.is_some_and(|previous| report.stack_depth < previous) {
            self.evict_above(self.eviction_bound(report));
        }
        self.previous_depth = Some(report.stack_depth);

        self.snapshot.insert(report.stack_depth, FrameKey::from(report));

        self.seen.insert(self.snapshot_hash())
    }

    /// Number of distinct stack shapes observed so far
    #[must_use]
    pub fn distinct_shapes(&self) -> usize {
        self.seen.len()
    }

    fn eviction_bound(&self, report: &Report) -> u64 {
        match self.config.eviction {
            EvictionPolicy::Depth => u64::from(report.stack_depth),
            EvictionPolicy::StackSize => report.stack_size,
        }
    }

    /// Drop entries at depths `bound + 1 ..= max_depth - 1`
    fn evict_above(&mut self, bound: u64) {
        let max_depth = self.config.max_depth;
        self.snapshot.retain(|&depth, _| u64::from(depth) <= bound || depth >= max_depth);
    }

    fn snapshot_hash(&self) -> u64 {
        let mut hasher = DefaultHasher::new();
        for frame in self.snapshot.range(..self.config.max_depth).map(|(_, frame)| frame) {
            frame.hash(&mut hasher);
        }
        hasher.finish()
    }
}

/// Keep only the reports that introduce a new stack shape
///
/// `reports` must be in arrival order. With [`EvictionPolicy::StackSize`] the
/// reports must come from a snapshot with recomputed stack sizes.
#[must_use]
pub fn deduplicate(reports: &[Report], config: DedupConfig) -> Vec<Report> {
    let mut dedup = StackDeduplicator::new(config);
    reports.iter().filter(|report| dedup.observe(report)).cloned().collect()
}
