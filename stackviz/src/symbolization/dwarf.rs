//! In-process symbolization from the target's DWARF line tables

use addr2line::Context;
use gimli::{EndianRcSlice, RunTimeEndian};
use object::{Object, ObjectSection};
use std::fs;
use std::path::Path;
use std::rc::Rc;

use super::SymbolSource;
use crate::domain::{FunctionLocation, ResolveError};

/// In-process symbol source reading DWARF line tables from the target binary
///
/// Answers the same question as the `addr2line` worker without a child
/// process. Only the innermost frame of an inlined chain is reported.
pub struct DwarfSymbols {
    name: String,
    ctx: Context<EndianRcSlice<RunTimeEndian>>,
}

impl DwarfSymbols {
    /// Load DWARF debug info from the given binary
    ///
    /// # Errors
    /// Returns an error if the binary file cannot be read or parsed, or if DWARF debug info is missing
    pub fn load<P: AsRef<Path>>(binary_path: P) -> Result<Self, ResolveError> {
        let binary_path = binary_path.as_ref();
        let binary_data = fs::read(binary_path)?;

        let obj_file = object::File::parse(&*binary_data)
            .map_err(|e| ResolveError::DebugInfoLoadFailed(format!("not an object file: {e}")))?;

        let endian =
            if obj_file.is_little_endian() { RunTimeEndian::Little } else { RunTimeEndian::Big };

        let load_section =
            |id: gimli::SectionId| -> Result<EndianRcSlice<RunTimeEndian>, gimli::Error> {
                let data = obj_file
                    .section_by_name(id.name())
                    .and_then(|section| section.uncompressed_data().ok())
                    .unwrap_or(std::borrow::Cow::Borrowed(&[][..]));
                Ok(EndianRcSlice::new(Rc::from(&*data), endian))
            };

        let dwarf = gimli::Dwarf::load(&load_section)
            .map_err(|e| ResolveError::DebugInfoLoadFailed(e.to_string()))?;
        let ctx =
            Context::from_dwarf(dwarf).map_err(|e| ResolveError::DebugInfoLoadFailed(e.to_string()))?;

        Ok(Self { name: format!("dwarf:{}", binary_path.display()), ctx })
    }
}

impl SymbolSource for DwarfSymbols {
    fn name(&self) -> &str {
        &self.name
    }

    fn lookup(&mut self, address: u64) -> Result<FunctionLocation, ResolveError> {
        let Ok(mut frames) = self.ctx.find_frames(address).skip_all_loads() else {
            return Ok(FunctionLocation::Unknown);
        };

        // First frame is the innermost inlined call site
        while let Ok(Some(frame)) = frames.next() {
            let Some(location) = frame.location else {
                continue;
            };
            if let (Some(file), Some(line)) = (location.file, location.line) {
                return Ok(FunctionLocation::Source { file: file.to_string(), line });
            }
        }

        Ok(FunctionLocation::Unknown)
    }

    fn is_alive(&mut self) -> bool {
        true
    }
}
