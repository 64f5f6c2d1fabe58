//! Plot export functionality
//!
//! This module renders the deduplicated report set as a Vega-Lite document
//! (one bar per distinct stack shape, height = stack size in bytes) and keeps
//! a file copy of it up to date while the pipeline runs.

pub mod publisher;
pub mod vega;

pub use publisher::{PlotPublisher, DEFAULT_EXPORT_INTERVAL, DEFAULT_PLOT_PATH};
pub use vega::{plot_spec, write_plot, write_plot_file};
