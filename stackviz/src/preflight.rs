//! Pre-flight checks for stackviz
//!
//! Validates the target binary (and optional PID) before the socket is bound
//! or a symbol worker is started, so that misconfiguration fails fast with an
//! actionable message instead of a stream of `??:0` locations.

use anyhow::{bail, Context, Result};
use object::{Object, ObjectSection};
use std::path::Path;

/// What the target binary offers for symbolication
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DebugInfo {
    /// `.debug_info` present: `file:line` locations available
    Dwarf,
    /// Symbol table only
    SymbolsOnly,
    /// Fully stripped
    Stripped,
    /// Not an object file we can parse; later stages decide
    Unrecognized,
}

/// Run all pre-flight checks for the target binary
///
/// # Errors
/// Returns an error if the target is missing, not a file, or unreadable
pub fn run_preflight_checks(target: &Path, quiet: bool) -> Result<DebugInfo> {
    check_binary_exists(target)?;
    let debug_info = inspect_debug_info(target)?;

    if !quiet {
        match debug_info {
            DebugInfo::Stripped => {
                eprintln!("warning: binary stripped, every location will be <unknown>");
            }
            DebugInfo::SymbolsOnly => {
                eprintln!("warning: no DWARF debug info, source locations unavailable");
            }
            DebugInfo::Dwarf | DebugInfo::Unrecognized => {}
        }
    }

    Ok(debug_info)
}

/// Check if the target binary exists and is a regular file
fn check_binary_exists(target: &Path) -> Result<()> {
    if !target.exists() {
        bail!(
            "Binary not found: {}\n\n\
             Make sure the path is correct and the binary exists.",
            target.display()
        );
    }
    if !target.is_file() {
        bail!(
            "Not a file: {}\n\n\
             TARGET must point to an executable file, not a directory.",
            target.display()
        );
    }
    Ok(())
}

/// Classify the debug information carried by the binary
fn inspect_debug_info(target: &Path) -> Result<DebugInfo> {
    let file_data = std::fs::read(target)
        .with_context(|| format!("Failed to read binary: {}", target.display()))?;

    let Ok(obj) = object::File::parse(&*file_data) else {
        return Ok(DebugInfo::Unrecognized);
    };

    let has_debug_info = obj.section_by_name(".debug_info").is_some_and(|s| s.size() > 0);
    let has_symtab = obj.section_by_name(".symtab").is_some_and(|s| s.size() > 0);

    Ok(match (has_debug_info, has_symtab) {
        (true, _) => DebugInfo::Dwarf,
        (false, true) => DebugInfo::SymbolsOnly,
        (false, false) => DebugInfo::Stripped,
    })
}

/// Check that the target process exists and its memory maps are readable
///
/// # Errors
/// Returns an error if `/proc/<pid>` is missing or `/proc/<pid>/maps` cannot be read
pub fn check_process_access(pid: u32) -> Result<()> {
    let proc_path = format!("/proc/{pid}");
    if !Path::new(&proc_path).exists() {
        bail!(
            "Process {pid} not found.\n\n\
             Is the process still running? Check with: ps -p {pid}"
        );
    }

    let maps_path = format!("{proc_path}/maps");
    std::fs::read_to_string(&maps_path).with_context(|| {
        format!(
            "Cannot read {maps_path}\n\n\
             This usually means:\n\
             - The process belongs to another user (permission denied)\n\
             - /proc is not mounted"
        )
    })?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn test_binary_not_found() {
        let result = run_preflight_checks(Path::new("/nonexistent/path/to/binary"), true);
        assert!(result.is_err());
        let err = result.unwrap_err().to_string();
        assert!(err.contains("Binary not found"));
    }

    #[test]
    fn test_directory_rejected() {
        let dir = tempfile::tempdir().unwrap();
        let err = run_preflight_checks(dir.path(), true).unwrap_err().to_string();
        assert!(err.contains("Not a file"));
    }

    #[test]
    fn test_non_object_file_is_unrecognized() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        file.write_all(b"#!/bin/sh\necho hi\n").unwrap();

        assert_eq!(run_preflight_checks(file.path(), true).unwrap(), DebugInfo::Unrecognized);
    }

    #[test]
    #[cfg(target_os = "linux")]
    fn test_own_executable_is_parsed() {
        let exe = std::env::current_exe().unwrap();
        let info = run_preflight_checks(&exe, true).unwrap();
        assert_ne!(info, DebugInfo::Unrecognized);
    }

    #[test]
    fn test_process_not_found() {
        let err = check_process_access(u32::MAX).unwrap_err().to_string();
        assert!(err.contains("not found"));
    }

    #[test]
    #[cfg(target_os = "linux")]
    fn test_own_process_is_accessible() {
        assert!(check_process_access(std::process::id()).is_ok());
    }
}
