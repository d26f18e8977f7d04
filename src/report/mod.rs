//! Reporting utilities: per-event summaries, flat result rows, and
//! formatted terminal output.
//!
//! We keep formatting code in one place so:
//! - the calibration code stays clean and testable
//! - output changes are localized

use serde::Serialize;

use crate::domain::CalibConfig;
use crate::error::CalibError;
use crate::store::EventStore;

/// Aggregate numbers for one variation in one event.
#[derive(Debug, Clone, Serialize)]
pub struct VariationSummary {
    /// Variation-name suffix; empty for nominal.
    pub name: String,
    pub n_taus: usize,
    /// Mean relative pt shift of the corrected copies vs. the input.
    pub mean_pt_shift: f64,
}

/// Everything the report needs about one processed event.
#[derive(Debug, Clone, Serialize)]
pub struct EventSummary {
    pub event_number: u64,
    pub n_input: usize,
    pub variations: Vec<VariationSummary>,
}

/// One exported result row: a single tau under a single variation.
#[derive(Debug, Clone, Serialize)]
pub struct CalibRow {
    pub event_number: u64,
    pub variation: String,
    pub index: usize,
    /// Input pt in MeV.
    pub pt_in: f64,
    /// Corrected pt in MeV.
    pub pt_out: f64,
    pub calibrated: bool,
    pub origin: Option<usize>,
}

/// Summarize one processed event from the store, driven by the published
/// manifest (no key guessing).
pub fn summarize_event(
    store: &EventStore,
    config: &CalibConfig,
) -> Result<EventSummary, CalibError> {
    let info = store.event_info(&config.event_info_container)?;
    let input = store.taus(&config.in_container)?;
    let manifest = store.names(&config.output_algo_systs)?;

    let mut variations = Vec::with_capacity(manifest.len());
    for suffix in manifest {
        let copy = store.taus(&format!("{}ShallowCopy{suffix}", config.out_container))?;
        let mut sum = 0.0;
        let mut n = 0usize;
        for (orig, corr) in input.iter().zip(copy) {
            if orig.pt > 0.0 && orig.pt.is_finite() {
                sum += (corr.pt - orig.pt) / orig.pt;
                n += 1;
            }
        }
        variations.push(VariationSummary {
            name: suffix.clone(),
            n_taus: copy.len(),
            mean_pt_shift: if n > 0 { sum / n as f64 } else { 0.0 },
        });
    }

    Ok(EventSummary {
        event_number: info.event_number,
        n_input: input.len(),
        variations,
    })
}

/// Flatten one processed event into exportable rows, in view order.
pub fn collect_rows(store: &EventStore, config: &CalibConfig) -> Result<Vec<CalibRow>, CalibError> {
    let info = store.event_info(&config.event_info_container)?;
    let input = store.taus(&config.in_container)?;
    let manifest = store.names(&config.output_algo_systs)?;

    let mut rows = Vec::new();
    for suffix in manifest {
        let view = store.view(&format!("{}{suffix}", config.out_container))?;
        let copy = store.taus(&view.source)?;
        let aux = store.aux(&format!("{}ShallowCopyAux.{suffix}", config.out_container))?;

        for &i in &view.order {
            let tau = &copy[i];
            let origin = aux.origin.get(i).copied().flatten();
            let pt_in = origin.map(|o| input[o].pt).unwrap_or(f64::NAN);
            rows.push(CalibRow {
                event_number: info.event_number,
                variation: suffix.clone(),
                index: tau.index,
                pt_in,
                pt_out: tau.pt,
                calibrated: aux.calibrated.get(i).copied().unwrap_or(false),
                origin,
            });
        }
    }
    Ok(rows)
}

/// Format the full run summary (configuration + per-variation means).
pub fn format_run_summary(
    config: &CalibConfig,
    syst_names: &[String],
    events: &[EventSummary],
) -> String {
    let mut out = String::new();

    out.push_str("=== taucal - Tau Energy Calibration Fan-Out ===\n");
    out.push_str(&format!("Algo: {}\n", config.name));
    out.push_str(&format!(
        "Input: {} | Output base: {}\n",
        config.in_container, config.out_container
    ));
    out.push_str(&format!(
        "TES: mva={} combined={} fast_sim={} sort={}\n",
        config.apply_mva_tes, config.apply_combined_tes, config.fast_sim, config.sort
    ));
    if !config.input_algo_systs.is_empty() {
        out.push_str(&format!("Upstream syst list key: {}\n", config.input_algo_systs));
    }
    out.push_str(&format!(
        "Events: {} | Variations: {}\n",
        events.len(),
        syst_names.len()
    ));

    out.push_str("\nPer-variation mean pt shift:\n");
    for (vi, name) in syst_names.iter().enumerate() {
        let label = if name.is_empty() { "(nominal)" } else { name };
        let mut sum = 0.0;
        let mut n = 0usize;
        for ev in events {
            if let Some(v) = ev.variations.get(vi) {
                sum += v.mean_pt_shift;
                n += 1;
            }
        }
        let mean = if n > 0 { sum / n as f64 } else { 0.0 };
        out.push_str(&format!("  {label:<28} {:+.4}%\n", mean * 100.0));
    }

    out
}
