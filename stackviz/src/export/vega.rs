//! Vega-Lite rendering of report sets.

use serde_json::{json, Value};
use std::fs::{self, File};
use std::io::{BufWriter, Write};
use std::path::Path;

use crate::domain::{ExportError, Report};

const VEGA_LITE_SCHEMA: &str = "https://vega.github.io/schema/vega-lite/v5.json";

/// Build a bar chart spec: x = report index, y = stack size
#[must_use]
pub fn plot_spec(reports: &[Report]) -> Value {
    json!({
        "$schema": VEGA_LITE_SCHEMA,
        "data": { "values": reports },
        "mark": "bar",
        "encoding": {
            "x": { "field": "index", "type": "nominal", "sort": null },
            "y": { "field": "stackSize", "type": "quantitative", "title": "stack size (bytes)" },
            "tooltip": [
                { "field": "index", "type": "nominal" },
                { "field": "stackDepth", "type": "quantitative" },
                { "field": "functionLocation", "type": "nominal" },
                { "field": "time", "type": "quantitative" },
                { "field": "stackSize", "type": "quantitative" }
            ]
        }
    })
}

/// Serialize the plot spec for `reports` into `writer`
///
/// # Errors
/// Returns an error if serialization or the underlying write fails
pub fn write_plot<W: Write>(mut writer: W, reports: &[Report]) -> Result<(), ExportError> {
    serde_json::to_writer(&mut writer, &plot_spec(reports))?;
    writer.flush()?;
    Ok(())
}

/// Replace `path` with the plot spec for `reports`
///
/// Writes a sibling temp file and renames it over `path`, so readers never
/// observe a half-written document.
///
/// # Errors
/// Returns an error if `path` has no file name or the file cannot be written
pub fn write_plot_file(path: &Path, reports: &[Report]) -> Result<(), ExportError> {
    let file_name = path
        .file_name()
        .ok_or_else(|| ExportError::InvalidPath(path.display().to_string()))?;
    let mut tmp_name = file_name.to_os_string();
    tmp_name.push(".tmp");
    let tmp_path = path.with_file_name(tmp_name);

    write_plot(BufWriter::new(File::create(&tmp_path)?), reports)?;
    fs::rename(&tmp_path, path)?;
    Ok(())
}
