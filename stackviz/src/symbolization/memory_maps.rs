//! Load-bias discovery for position-independent targets
//!
//! Instrumented targets report runtime instruction pointers. For a PIE binary
//! those are `load base + file offset`, while symbolization wants the file
//! offset. The base is the lowest mapping of the binary in `/proc/<pid>/maps`.

use anyhow::{Context, Result};
use log::info;
use std::fs;

/// Memory range of a loaded binary in a process's address space
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MemoryRange {
    pub start: u64,
    pub end: u64,
}

impl MemoryRange {
    /// Check if an address falls within this memory range
    #[must_use]
    pub fn contains(&self, addr: u64) -> bool {
        addr >= self.start && addr < self.end
    }
}

/// Find the combined range of every mapping whose path matches `binary_path`
///
/// Lines follow the kernel format `start-end perms offset dev inode pathname`.
#[must_use]
pub fn find_binary_range(maps: &str, binary_path: &str) -> Option<MemoryRange> {
    let mut range: Option<MemoryRange> = None;

    for line in maps.lines() {
        let mut parts = line.split_whitespace();
        let Some(addresses) = parts.next() else {
            continue;
        };
        if parts.nth(4) != Some(binary_path) {
            continue;
        }
        let Some((start, end)) = addresses.split_once('-') else {
            continue;
        };
        let (Ok(start), Ok(end)) = (u64::from_str_radix(start, 16), u64::from_str_radix(end, 16))
        else {
            continue;
        };

        range = Some(match range {
            Some(r) => MemoryRange { start: r.start.min(start), end: r.end.max(end) },
            None => MemoryRange { start, end },
        });
    }

    range
}

/// Read `/proc/<pid>/maps` and return the load base of `binary_path`
///
/// # Errors
/// Returns an error if the maps file cannot be read or the binary is not mapped
pub fn load_bias_for(pid: u32, binary_path: &str) -> Result<u64> {
    let maps_path = format!("/proc/{pid}/maps");
    let maps = fs::read_to_string(&maps_path).with_context(|| format!("Failed to read {maps_path}"))?;

    let range = find_binary_range(&maps, binary_path)
        .with_context(|| format!("Could not find {binary_path} mapped in process {pid}"))?;

    info!(
        "Executable memory range: 0x{:x} - 0x{:x} (size: {} KB)",
        range.start,
        range.end,
        (range.end - range.start) / 1024
    );
    Ok(range.start)
}

#[cfg(test)]
mod tests {
    use super::*;

    const MAPS: &str = "\
55d0c8a00000-55d0c8a01000 r--p 00000000 fd:01 1316 /home/me/fib
55d0c8a01000-55d0c8a02000 r-xp 00001000 fd:01 1316 /home/me/fib
55d0c8a02000-55d0c8a03000 r--p 00002000 fd:01 1316 /home/me/fib
55d0c9b6e000-55d0c9b8f000 rw-p 00000000 00:00 0    [heap]
7f1e2c800000-7f1e2c828000 r--p 00000000 fd:01 2101 /usr/lib/x86_64-linux-gnu/libc.so.6
7ffd4a3c1000-7ffd4a3e2000 rw-p 00000000 00:00 0    [stack]
";

    #[test]
    fn test_memory_range_contains() {
        let range = MemoryRange { start: 0x1000, end: 0x2000 };

        assert!(range.contains(0x1000));
        assert!(range.contains(0x1FFF));
        assert!(!range.contains(0x0FFF));
        assert!(!range.contains(0x2000));
    }

    #[test]
    fn test_find_binary_range_spans_all_mappings() {
        let range = find_binary_range(MAPS, "/home/me/fib").unwrap();
        assert_eq!(range, MemoryRange { start: 0x55d0_c8a0_0000, end: 0x55d0_c8a0_3000 });
    }

    #[test]
    fn test_find_binary_range_exact_path_only() {
        assert!(find_binary_range(MAPS, "/home/me/fi").is_none());
        assert!(find_binary_range(MAPS, "/home/me/other").is_none());
    }

    #[test]
    fn test_load_bias_for_missing_process() {
        assert!(load_bias_for(u32::MAX, "/bin/true").is_err());
    }
}
