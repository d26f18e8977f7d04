//! Export calibration results to CSV and JSON.
//!
//! The CSV is meant to be easy to consume in spreadsheets or downstream
//! scripts; the JSON manifest is the "portable" record of a run
//! (configuration, variation list, per-event summaries).

use std::fs::File;
use std::io::Write;
use std::path::Path;

use chrono::Local;
use serde::Serialize;

use crate::domain::CalibConfig;
use crate::error::CalibError;
use crate::report::{CalibRow, EventSummary};

/// Write per-tau calibrated results to a CSV file.
pub fn write_results_csv(path: &Path, rows: &[CalibRow]) -> Result<(), CalibError> {
    let mut file = File::create(path)
        .map_err(|e| CalibError::Io(format!("Failed to create export CSV '{}': {e}", path.display())))?;

    writeln!(
        file,
        "event,variation,index,pt_in_gev,pt_out_gev,shift,calibrated,origin"
    )
    .map_err(|e| CalibError::Io(format!("Failed to write export CSV header: {e}")))?;

    for r in rows {
        let shift = if r.pt_in.is_finite() && r.pt_in > 0.0 {
            format!("{:.6}", (r.pt_out - r.pt_in) / r.pt_in)
        } else {
            String::new()
        };
        writeln!(
            file,
            "{},{},{},{:.4},{:.4},{},{},{}",
            r.event_number,
            r.variation,
            r.index,
            r.pt_in * 1e-3,
            r.pt_out * 1e-3,
            shift,
            r.calibrated,
            r.origin.map(|o| o.to_string()).unwrap_or_default(),
        )
        .map_err(|e| CalibError::Io(format!("Failed to write export CSV row: {e}")))?;
    }

    Ok(())
}

/// A saved run manifest (JSON).
#[derive(Debug, Clone, Serialize)]
pub struct RunManifest {
    pub tool: String,
    pub generated: String,
    pub config: CalibConfig,
    /// Variation-name suffixes in processing order; `""` is nominal.
    pub systematics: Vec<String>,
    pub events: Vec<EventSummary>,
}

impl RunManifest {
    pub fn new(config: &CalibConfig, systematics: Vec<String>, events: Vec<EventSummary>) -> Self {
        RunManifest {
            tool: "taucal".to_string(),
            generated: Local::now().to_rfc3339(),
            config: config.clone(),
            systematics,
            events,
        }
    }
}

/// Write the run manifest JSON file.
pub fn write_manifest_json(path: &Path, manifest: &RunManifest) -> Result<(), CalibError> {
    let file = File::create(path).map_err(|e| {
        CalibError::Io(format!("Failed to create manifest JSON '{}': {e}", path.display()))
    })?;
    serde_json::to_writer_pretty(file, manifest)
        .map_err(|e| CalibError::Io(format!("Failed to write manifest JSON: {e}")))?;
    Ok(())
}
