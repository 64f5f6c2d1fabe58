//! Memoizing front end over a symbol source

use log::debug;
use std::collections::HashMap;

use super::SymbolSource;
use crate::domain::{FunctionLocation, ResolveError};

/// Memoizing address → source-location resolver
///
/// Every distinct address costs exactly one round-trip to the symbol source;
/// later lookups are served from an unbounded cache keyed by the raw
/// (unadjusted) address. Unknown results are cached too.
pub struct AddressResolver<S> {
    source: S,
    load_bias: u64,
    cache: HashMap<u64, FunctionLocation>,
}

impl<S: SymbolSource> AddressResolver<S> {
    #[must_use]
    pub fn new(source: S) -> Self {
        Self::with_load_bias(source, 0)
    }

    /// Resolver that subtracts `load_bias` from each address before lookup
    #[must_use]
    pub fn with_load_bias(source: S, load_bias: u64) -> Self {
        Self { source, load_bias, cache: HashMap::new() }
    }

    /// Resolve an instruction pointer
    ///
    /// # Errors
    /// Returns [`ResolveError::WorkerExited`] if the symbol source is gone;
    /// this is unrecoverable. Other errors come from the source's own I/O.
    pub fn resolve(&mut self, pc: u64) -> Result<FunctionLocation, ResolveError> {
        if let Some(cached) = self.cache.get(&pc) {
            return Ok(cached.clone());
        }

        if !self.source.is_alive() {
            return Err(ResolveError::WorkerExited(self.source.name().to_string()));
        }

        // Below the load base: not part of the target binary
        let location = match pc.checked_sub(self.load_bias) {
            Some(address) => self.source.lookup(address)?,
            None => {
                debug!("Address 0x{pc:x} below load bias 0x{:x}", self.load_bias);
                FunctionLocation::Unknown
            }
        };

        self.cache.insert(pc, location.clone());
        Ok(location)
    }

    /// Number of distinct addresses resolved so far
    #[must_use]
    pub fn cached_addresses(&self) -> usize {
        self.cache.len()
    }

    #[must_use]
    pub fn source(&self) -> &S {
        &self.source
    }
}
