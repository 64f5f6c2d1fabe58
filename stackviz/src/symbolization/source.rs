//! The symbol-source capability seam.

use crate::domain::{FunctionLocation, ResolveError};

/// Something that can turn an address into a source location.
///
/// Implementations are driven from a single thread and may hold a sequential
/// request/response channel, so lookups take `&mut self`.
pub trait SymbolSource {
    /// Short human-readable name used in logs and errors
    fn name(&self) -> &str;

    /// Resolve one (bias-adjusted) address
    ///
    /// # Errors
    /// Returns an error when the source itself is broken (I/O failure, worker
    /// gone). An address the source simply cannot place is
    /// `Ok(FunctionLocation::Unknown)`.
    fn lookup(&mut self, address: u64) -> Result<FunctionLocation, ResolveError>;

    /// Whether the source can still answer lookups
    fn is_alive(&mut self) -> bool;
}

impl<S: SymbolSource + ?Sized> SymbolSource for Box<S> {
    fn name(&self) -> &str {
        (**self).name()
    }

    fn lookup(&mut self, address: u64) -> Result<FunctionLocation, ResolveError> {
        (**self).lookup(address)
    }

    fn is_alive(&mut self) -> bool {
        (**self).is_alive()
    }
}
