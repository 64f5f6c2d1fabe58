//! Domain model for stackviz
//!
//! This module contains core domain types and errors that provide:
//! - The report record shared by every pipeline stage
//! - The resolved-location sentinel used when symbolication has no answer
//! - Structured error handling

pub mod errors;
pub mod types;

// Re-export common types for convenience
pub use types::{recompute_stack_sizes, FunctionLocation, Report};

pub use errors::{ExportError, ResolveError, WireError};
