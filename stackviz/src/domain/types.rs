//! Core domain types shared by the pipeline stages.

use serde::{Serialize, Serializer};
use std::fmt;

/// Resolved source location of an instruction pointer.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum FunctionLocation {
    /// `file:line` as reported by the symbol source
    Source { file: String, line: u32 },
    /// The symbol source had no usable answer for this address
    Unknown,
}

impl FunctionLocation {
    /// Parse the leading `path:line` token of a symbolizer response line.
    ///
    /// Anything after the first space (e.g. ` (discriminator 2)`) is ignored.
    /// Returns [`FunctionLocation::Unknown`] for `??` files, non-numeric lines
    /// and lines without a `:` separator.
    #[must_use]
    pub fn parse(response: &str) -> Self {
        let token = response.trim_end().split(' ').next().unwrap_or_default();

        let Some((file, line)) = token.rsplit_once(':') else {
            return Self::Unknown;
        };
        if file.is_empty() || file == "??" {
            return Self::Unknown;
        }

        match line.parse::<u32>() {
            Ok(line) => Self::Source { file: file.to_string(), line },
            Err(_) => Self::Unknown,
        }
    }

    #[must_use]
    pub fn is_known(&self) -> bool {
        matches!(self, Self::Source { .. })
    }
}

impl fmt::Display for FunctionLocation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Source { file, line } => write!(f, "{file}:{line}"),
            Self::Unknown => f.write_str("<unknown>"),
        }
    }
}

impl Serialize for FunctionLocation {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

/// A sample enriched with its sequence index and resolved source location.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Report {
    /// 1-based arrival index
    pub index: u64,
    pub stack_depth: u32,
    /// Capture time in nanoseconds, copied from the sample
    pub time: u64,
    pub function_location: FunctionLocation,
    pub pc: u64,
    /// Stack pointer (grows downwards)
    pub sp: u64,
    /// Bytes of stack in use relative to the shallowest `sp` seen so far.
    ///
    /// Zero until [`recompute_stack_sizes`] runs over a snapshot.
    pub stack_size: u64,
}

/// Recompute `stack_size` for every report against the snapshot's maximum `sp`.
pub fn recompute_stack_sizes(reports: &mut [Report]) {
    let Some(max_sp) = reports.iter().map(|r| r.sp).max() else {
        return;
    };
    for report in reports {
        report.stack_size = max_sp - report.sp;
    }
}
