//! Report formatting and end-of-run statistics

// Time conversions intentionally lose precision for display purposes
#![allow(clippy::cast_precision_loss)]

use crate::domain::Report;

const NS_PER_MS: u64 = 1_000_000;
const MS_PER_SECOND: u64 = 1_000;
const MS_PER_MINUTE: u64 = 60_000;
const MS_PER_HOUR: u64 = 3_600_000;

/// Format a nanosecond timestamp as `MMm:SSs:mmmms` (hours wrap)
#[must_use]
pub fn format_timestamp(timestamp_ns: u64) -> String {
    let ms = timestamp_ns / NS_PER_MS;
    let minutes = (ms % MS_PER_HOUR) / MS_PER_MINUTE;
    let seconds = (ms % MS_PER_MINUTE) / MS_PER_SECOND;
    let millis = ms % MS_PER_SECOND;
    format!("{minutes:02}m:{seconds:02}s:{millis:03}ms")
}

/// One-line log form of a report
#[must_use]
pub fn format_report(report: &Report) -> String {
    format!(
        "[{}]: {} {}, pc=0x{:x}, sp=0x{:x}",
        report.stack_depth,
        format_timestamp(report.time),
        report.function_location,
        report.pc,
        report.sp,
    )
}

/// Counters kept by the processing loop
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct PipelineStats {
    pub samples: u64,
    pub unresolved: u64,
}

/// Display pipeline statistics
pub fn display_statistics(stats: &PipelineStats, cached_addresses: usize) {
    let resolved_pct = if stats.samples == 0 {
        0.0
    } else {
        (stats.samples - stats.unresolved) as f64 / stats.samples as f64 * 100.0
    };
    eprintln!(
        "stats: samples={} resolved={resolved_pct:.1}% distinct_addresses={cached_addresses}",
        stats.samples
    );
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::FunctionLocation;

    #[test]
    fn test_format_timestamp() {
        assert_eq!(format_timestamp(0), "00m:00s:000ms");
        assert_eq!(format_timestamp(1_250 * NS_PER_MS), "00m:01s:250ms");
        assert_eq!(format_timestamp((61_000 + 7) * NS_PER_MS), "01m:01s:007ms");
        // hours wrap
        assert_eq!(format_timestamp((MS_PER_HOUR + 5) * NS_PER_MS), "00m:00s:005ms");
    }

    #[test]
    fn test_format_report() {
        let report = Report {
            index: 1,
            stack_depth: 2,
            time: 1_500 * NS_PER_MS,
            function_location: FunctionLocation::Source { file: "fib.c".into(), line: 8 },
            pc: 0x401136,
            sp: 0x7ffc_1000,
            stack_size: 0,
        };
        assert_eq!(format_report(&report), "[2]: 00m:01s:500ms fib.c:8, pc=0x401136, sp=0x7ffc1000");
    }
}
