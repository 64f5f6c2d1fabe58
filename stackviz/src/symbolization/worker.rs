//! `addr2line` child process as a long-lived symbolication worker
//!
//! Protocol: write the address as lowercase hex plus `\n` to the worker's
//! stdin, read exactly one line back. The worker is started without `-i`, so
//! every request produces exactly one line and that line is the innermost
//! (inlined) location of the address.

use log::{debug, warn};
use std::ffi::OsStr;
use std::io::{BufRead, BufReader, ErrorKind, Write};
use std::path::Path;
use std::process::{Child, ChildStdin, ChildStdout, Command, Stdio};

use super::SymbolSource;
use crate::domain::{FunctionLocation, ResolveError};

/// Program used when none is configured
pub const DEFAULT_ADDR2LINE: &str = "addr2line";

/// Owned `addr2line` child process plus its pipes
pub struct Addr2LineWorker {
    program: String,
    child: Child,
    stdin: ChildStdin,
    stdout: BufReader<ChildStdout>,
    line: String,
}

impl Addr2LineWorker {
    /// Start `<program> -e <target>`
    ///
    /// # Errors
    /// Returns [`ResolveError::SpawnFailed`] if the process cannot be started
    pub fn spawn(program: impl AsRef<OsStr>, target: &Path) -> Result<Self, ResolveError> {
        let mut command = Command::new(program);
        command.arg("-e").arg(target);
        Self::from_command(command)
    }

    /// Start an arbitrary worker command speaking the same line protocol
    ///
    /// # Errors
    /// Returns [`ResolveError::SpawnFailed`] if the process cannot be started
    pub fn from_command(mut command: Command) -> Result<Self, ResolveError> {
        let program = command.get_program().to_string_lossy().into_owned();

        // Terminal Ctrl-C must reach stackviz only; the worker is stopped on drop
        configure_process_group(&mut command);

        let mut child = command
            .stdin(Stdio::piped())
            .stdout(Stdio::piped())
            .stderr(Stdio::inherit())
            .spawn()
            .map_err(|source| ResolveError::SpawnFailed { program: program.clone(), source })?;

        let (Some(stdin), Some(stdout)) = (child.stdin.take(), child.stdout.take()) else {
            let _ = child.kill();
            let _ = child.wait();
            return Err(ResolveError::SpawnFailed {
                program,
                source: std::io::Error::new(ErrorKind::BrokenPipe, "worker pipes unavailable"),
            });
        };

        debug!("Started symbolication worker `{program}` (pid {})", child.id());

        Ok(Self { program, child, stdin, stdout: BufReader::new(stdout), line: String::new() })
    }

    fn exit_description(&mut self) -> String {
        match self.child.try_wait() {
            Ok(Some(status)) => format!("{} {status}", self.program),
            Ok(None) => format!("{} stopped responding", self.program),
            Err(e) => format!("{}: {e}", self.program),
        }
    }
}

#[cfg(unix)]
fn configure_process_group(command: &mut Command) {
    use std::os::unix::process::CommandExt;
    command.process_group(0);
}

#[cfg(not(unix))]
fn configure_process_group(_command: &mut Command) {}

impl SymbolSource for Addr2LineWorker {
    fn name(&self) -> &str {
        &self.program
    }

    fn lookup(&mut self, address: u64) -> Result<FunctionLocation, ResolveError> {
        let written = writeln!(self.stdin, "{address:x}").and_then(|()| self.stdin.flush());
        if let Err(e) = written {
            if e.kind() == ErrorKind::BrokenPipe {
                return Err(ResolveError::WorkerExited(self.exit_description()));
            }
            return Err(e.into());
        }

        self.line.clear();
        if self.stdout.read_line(&mut self.line)? == 0 {
            return Err(ResolveError::WorkerClosed);
        }

        let location = FunctionLocation::parse(&self.line);
        if !location.is_known() {
            debug!("Unresolvable address 0x{address:x}: {:?}", self.line.trim_end());
        }
        Ok(location)
    }

    fn is_alive(&mut self) -> bool {
        matches!(self.child.try_wait(), Ok(None))
    }
}

impl Drop for Addr2LineWorker {
    fn drop(&mut self) {
        if let Err(e) = self.child.kill() {
            if e.kind() != ErrorKind::InvalidInput {
                warn!("Failed to stop symbolication worker: {e}");
            }
        }
        let _ = self.child.wait();
        debug!("Symbolication worker `{}` stopped", self.program);
    }
}
