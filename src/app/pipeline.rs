//! Shared "calibration pipeline" logic used by the CLI front-end and tests.
//!
//! Keeping this in one place avoids duplicating the core workflow:
//! event generation -> calibrator lifecycle -> per-event fan-out -> summaries
//!
//! The CLI can then focus on presentation (printing and exports).

use crate::calib::TauCalibrator;
use crate::data::{generate_event, SampleConfig};
use crate::domain::CalibConfig;
use crate::error::CalibError;
use crate::meta::MetaStore;
use crate::report::{collect_rows, summarize_event, CalibRow, EventSummary};
use crate::smear::tes::{TesConfig, TesSmearingTool};
use crate::store::{EventStore, StoreObject};

/// All computed outputs of a single `taucal run`.
#[derive(Debug)]
pub struct RunOutput {
    /// Variation-name suffixes in processing order; `""` is nominal.
    pub syst_names: Vec<String>,
    pub events: Vec<EventSummary>,
    pub rows: Vec<CalibRow>,
    pub meta: MetaStore,
    /// (events processed, input objects seen).
    pub counters: (u64, u64),
}

/// Execute the full calibration pipeline over generated events.
pub fn run_calibration(
    config: &CalibConfig,
    sample: &SampleConfig,
    n_events: usize,
) -> Result<RunOutput, CalibError> {
    if n_events == 0 {
        return Err(CalibError::Config("event count must be > 0".into()));
    }

    let tool = TesSmearingTool::new(TesConfig {
        recommendation_tag: config.recommendation_tag.clone(),
        apply_mva_tes: config.apply_mva_tes,
        apply_combined_tes: config.apply_combined_tes,
        fast_sim: config.fast_sim,
    })?;

    let mut calib = TauCalibrator::new(config.clone(), Box::new(tool));
    let mut meta = MetaStore::new();

    // Host lifecycle order: histograms, file hooks, then initialize.
    calib.hist_initialize()?;
    calib.file_execute()?;
    calib.change_input(true)?;
    calib.initialize(&mut meta)?;

    let syst_names: Vec<String> = calib
        .systematics()
        .iter()
        .map(|v| v.name.clone())
        .collect();

    let mut events = Vec::with_capacity(n_events);
    let mut rows = Vec::new();
    let mut store = EventStore::new();

    for event_number in 1..=n_events as u64 {
        store.clear();
        let (info, taus) = generate_event(sample, event_number)?;
        store.record(
            config.event_info_container.clone(),
            StoreObject::Event(info),
        )?;
        store.record(config.in_container.clone(), StoreObject::Taus(taus))?;

        calib.execute(&mut store)?;

        events.push(summarize_event(&store, config)?);
        rows.extend(collect_rows(&store, config)?);
    }

    calib.finalize()?;
    calib.hist_finalize()?;
    let counters = calib.counters();

    Ok(RunOutput {
        syst_names,
        events,
        rows,
        meta,
        counters,
    })
}
