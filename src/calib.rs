//! The tau calibrator: lifecycle state machine plus the per-event
//! systematic fan-out loop.
//!
//! For each event the calibrator fetches the input tau collection, and for
//! every configured variation (nominal first, always):
//!
//! 1. reconfigures the smearing tool for that variation (fatal on failure)
//! 2. shallow-copies the input collection
//! 3. in simulation, corrects every copy that has a truth counterpart
//!    (a per-object error is a warning, not an abort)
//! 4. links the copies back to their originals (non-fatal on failure)
//! 5. builds a read-only view, optionally sorted by descending pt
//! 6. publishes copy, aux store and view under `<name><variation>` keys
//!
//! and finally publishes the manifest of variation-name suffixes so
//! downstream consumers can reconstruct the output keys without guessing.
//! There is no rollback: outputs already published when a later variation
//! fails stay published.

use tracing::{debug, error, info, warn};

use crate::domain::CalibConfig;
use crate::edm::{make_view, set_origin_links, shallow_copy, sort_view_by_pt};
use crate::error::CalibError;
use crate::meta::{MetaStore, SystematicsRecord};
use crate::smear::{CorrectionCode, SmearingTool};
use crate::store::{EventStore, StoreObject};
use crate::syst::{resolve_systematics, SystematicVariation};

/// Lifecycle phase. Entry points are only valid in the phases the host
/// contract dictates; anything else is a `Lifecycle` error.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Phase {
    Created,
    Initialized,
    Running,
    Finalized,
}

/// The calibration algorithm.
pub struct TauCalibrator {
    config: CalibConfig,
    tool: Box<dyn SmearingTool>,
    phase: Phase,
    hist_booked: bool,
    syst_list: Vec<SystematicVariation>,
    out_sc_name: String,
    out_sc_aux_name: String,
    num_events: u64,
    num_objects: u64,
}

impl TauCalibrator {
    pub fn new(config: CalibConfig, tool: Box<dyn SmearingTool>) -> Self {
        TauCalibrator {
            config,
            tool,
            phase: Phase::Created,
            hist_booked: false,
            syst_list: Vec::new(),
            out_sc_name: String::new(),
            out_sc_aux_name: String::new(),
            num_events: 0,
            num_objects: 0,
        }
    }

    pub fn phase(&self) -> Phase {
        self.phase
    }

    /// The resolved variation list. Empty before `initialize`.
    pub fn systematics(&self) -> &[SystematicVariation] {
        &self.syst_list
    }

    /// (events processed, input objects seen).
    pub fn counters(&self) -> (u64, u64) {
        (self.num_events, self.num_objects)
    }

    fn lifecycle_err(&self, entry: &str) -> CalibError {
        CalibError::Lifecycle(format!("{entry} called in phase {:?}", self.phase))
    }

    /// Per-worker setup before any input is connected.
    pub fn hist_initialize(&mut self) -> Result<(), CalibError> {
        if self.phase != Phase::Created || self.hist_booked {
            return Err(self.lifecycle_err("hist_initialize"));
        }
        self.hist_booked = true;
        Ok(())
    }

    /// Called once per input file. Nothing to collect here.
    pub fn file_execute(&mut self) -> Result<(), CalibError> {
        if self.phase == Phase::Finalized {
            return Err(self.lifecycle_err("file_execute"));
        }
        Ok(())
    }

    /// Called when the input file changes. Nothing to reset here.
    pub fn change_input(&mut self, _first_file: bool) -> Result<(), CalibError> {
        if self.phase == Phase::Finalized {
            return Err(self.lifecycle_err("change_input"));
        }
        Ok(())
    }

    /// Resolve the variation list and derive output names. The variation
    /// list is immutable after this call.
    pub fn initialize(&mut self, meta: &mut MetaStore) -> Result<(), CalibError> {
        if self.phase != Phase::Created {
            return Err(self.lifecycle_err("initialize"));
        }

        info!(algo = %self.config.name, "initializing tau calibrator");

        if self.config.in_container.is_empty() {
            return Err(CalibError::Config("input container name is empty".into()));
        }
        if self.config.output_algo_systs.is_empty() {
            return Err(CalibError::Config(
                "output systematic-name list key is empty".into(),
            ));
        }

        // Shallow copies are published under these derived names; the
        // trailing period on the aux name is part of the convention.
        self.out_sc_name = format!("{}ShallowCopy", self.config.out_container);
        self.out_sc_aux_name = format!("{}Aux.", self.out_sc_name);

        let recommended = self.tool.recommended_systematics();
        self.syst_list =
            resolve_systematics(&recommended, &self.config.syst_name, self.config.syst_val)?;

        let mut chosen = Vec::new();
        if self.config.syst_name.is_empty() {
            info!("running with nominal configuration only");
        } else {
            for syst in &self.syst_list {
                info!(variation = %syst.name, "will run smearing variation");
                chosen.push(syst.name.clone());
            }
        }
        meta.record_names(format!("taus_Syst{}", self.config.name), chosen)?;

        if self.config.write_syst_to_metadata {
            meta.add_record(SystematicsRecord {
                algo: self.config.name.clone(),
                variations: self.syst_list.iter().map(|v| v.name.clone()).collect(),
            });
        }

        self.phase = Phase::Initialized;
        info!(variations = self.syst_list.len(), "tau calibrator initialized");
        Ok(())
    }

    /// Process one event: the systematic fan-out loop.
    pub fn execute(&mut self, store: &mut EventStore) -> Result<(), CalibError> {
        if !matches!(self.phase, Phase::Initialized | Phase::Running) {
            return Err(self.lifecycle_err("execute"));
        }
        self.phase = Phase::Running;
        self.num_events += 1;

        debug!("applying tau calibration and smearing");

        let event_info = store.event_info(&self.config.event_info_container)?;
        let input = store.taus(&self.config.in_container)?.to_vec();
        let is_simulation = event_info.data_kind.is_simulation();
        self.num_objects += input.len() as u64;

        let mut manifest: Vec<String> = Vec::with_capacity(self.syst_list.len());

        for syst in &self.syst_list {
            let out_sc_key = format!("{}{}", self.out_sc_name, syst.name);
            let out_sc_aux_key = format!("{}{}", self.out_sc_aux_name, syst.name);
            let out_view_key = format!("{}{}", self.config.out_container, syst.name);

            if let Err(err) = self.tool.apply_systematic_variation(syst) {
                error!(variation = %syst.name, "failed to configure smearing tool");
                return Err(err);
            }

            // One independent copy per variation; mutations never reach the
            // input or another variation's copy.
            let mut copy = shallow_copy(&input);

            if is_simulation {
                let taus = &mut copy.taus;
                let calibrated = &mut copy.aux.calibrated;
                for (tau, done) in taus.iter_mut().zip(calibrated.iter_mut()) {
                    // Only objects with a ground-truth counterpart are
                    // corrected; the rest pass through silently.
                    if tau.truth.is_none() {
                        continue;
                    }
                    debug!(index = tau.index, pt_gev = tau.pt_gev(), "uncalibrated tau");
                    match self.tool.apply_correction(tau) {
                        CorrectionCode::Ok => *done = true,
                        CorrectionCode::OutOfValidityRange => {}
                        CorrectionCode::Error => {
                            warn!(
                                index = tau.index,
                                variation = %syst.name,
                                "smearing tool returned an error; tau left uncorrected"
                            );
                        }
                    }
                    debug!(index = tau.index, pt_gev = tau.pt_gev(), "corrected tau");
                }
            }

            if let Err(err) = set_origin_links(&input, &mut copy) {
                error!(
                    variation = %syst.name,
                    %err,
                    "failed to set origin links; missing-energy rebuilding cannot proceed"
                );
            }

            let mut view = make_view(out_sc_key.clone(), &copy);
            if self.config.sort {
                sort_view_by_pt(&mut view, &copy.taus);
            }

            store.record(out_sc_key, StoreObject::Taus(copy.taus))?;
            store.record(out_sc_aux_key, StoreObject::Aux(copy.aux))?;
            store.record(out_view_key, StoreObject::View(view))?;

            manifest.push(syst.name.clone());
        }

        store.record(
            self.config.output_algo_systs.clone(),
            StoreObject::Names(manifest),
        )?;

        debug!(keys = ?store.keys(), "event store after calibration");
        Ok(())
    }

    /// Mirror image of `initialize`.
    pub fn finalize(&mut self) -> Result<(), CalibError> {
        if !matches!(self.phase, Phase::Initialized | Phase::Running) {
            return Err(self.lifecycle_err("finalize"));
        }
        self.phase = Phase::Finalized;
        info!(
            events = self.num_events,
            objects = self.num_objects,
            "tau calibrator finalized"
        );
        Ok(())
    }

    /// Mirror image of `hist_initialize`, after `finalize`.
    pub fn hist_finalize(&mut self) -> Result<(), CalibError> {
        if self.phase != Phase::Finalized || !self.hist_booked {
            return Err(self.lifecycle_err("hist_finalize"));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::{DataKind, EventInfo, TauJet, TruthTau};
    use crate::smear::tes::{TesConfig, TesSmearingTool};

    fn tau(index: usize, pt: f64, with_truth: bool) -> TauJet {
        let truth = with_truth.then(|| TruthTau {
            pt: pt * 0.98,
            eta: 0.5,
            phi: 0.1,
            n_prong: 1,
        });
        TauJet {
            index,
            pt,
            eta: 0.5,
            phi: 0.1,
            e: pt * 1.4,
            n_prong: 1,
            truth,
        }
    }

    fn tool() -> Box<dyn SmearingTool> {
        Box::new(
            TesSmearingTool::new(TesConfig {
                recommendation_tag: String::new(),
                apply_mva_tes: false,
                apply_combined_tes: false,
                fast_sim: false,
            })
            .unwrap(),
        )
    }

    fn config(syst_name: &str) -> CalibConfig {
        CalibConfig {
            in_container: "TauJets".into(),
            out_container: "Out".into(),
            syst_name: syst_name.into(),
            syst_val: 1.0,
            output_algo_systs: "taus_calib_syst".into(),
            ..CalibConfig::default()
        }
    }

    fn event_store(data_kind: DataKind, taus: Vec<TauJet>) -> EventStore {
        let mut store = EventStore::new();
        store
            .record(
                "EventInfo",
                StoreObject::Event(EventInfo {
                    run_number: 300000,
                    event_number: 1,
                    data_kind,
                }),
            )
            .unwrap();
        store.record("TauJets", StoreObject::Taus(taus)).unwrap();
        store
    }

    fn initialized(config: CalibConfig) -> (TauCalibrator, MetaStore) {
        let mut calib = TauCalibrator::new(config, tool());
        let mut meta = MetaStore::new();
        calib.hist_initialize().unwrap();
        calib.file_execute().unwrap();
        calib.change_input(true).unwrap();
        calib.initialize(&mut meta).unwrap();
        (calib, meta)
    }

    fn three_taus() -> Vec<TauJet> {
        vec![
            tau(0, 40e3, true),
            tau(1, 80e3, true),
            tau(2, 60e3, true),
        ]
    }

    #[test]
    fn scenario_three_taus_two_variations() {
        let (mut calib, _meta) = initialized(config("TAUS_TES_TOTAL_1up"));
        let mut store = event_store(DataKind::FullSim, three_taus());

        calib.execute(&mut store).unwrap();

        // 2 inputs + per variation {copy, aux, view} x 2 + manifest.
        assert_eq!(store.len(), 9);
        for key in [
            "Out",
            "OutTAUS_TES_TOTAL_1up",
            "OutShallowCopy",
            "OutShallowCopyTAUS_TES_TOTAL_1up",
            "OutShallowCopyAux.",
            "OutShallowCopyAux.TAUS_TES_TOTAL_1up",
        ] {
            assert!(store.contains(key), "missing {key}");
        }
        assert_eq!(
            store.names("taus_calib_syst").unwrap(),
            ["".to_string(), "TAUS_TES_TOTAL_1up".to_string()]
        );
    }

    #[test]
    fn manifest_matches_variation_list_in_order() {
        let (mut calib, _meta) = initialized(config("All"));
        let expected: Vec<String> = calib
            .systematics()
            .iter()
            .map(|v| v.name.clone())
            .collect();
        assert_eq!(expected[0], "");
        assert_eq!(expected.len(), 9);

        let mut store = event_store(DataKind::FullSim, three_taus());
        calib.execute(&mut store).unwrap();

        assert_eq!(store.names("taus_calib_syst").unwrap(), expected);
    }

    #[test]
    fn missing_input_is_fatal_and_publishes_nothing() {
        let (mut calib, _meta) = initialized(config(""));
        let mut store = EventStore::new();
        store
            .record(
                "EventInfo",
                StoreObject::Event(EventInfo {
                    run_number: 300000,
                    event_number: 1,
                    data_kind: DataKind::FullSim,
                }),
            )
            .unwrap();

        let err = calib.execute(&mut store).unwrap_err();
        assert_eq!(err, CalibError::MissingInput("TauJets".into()));
        assert_eq!(store.len(), 1);
    }

    #[test]
    fn missing_event_info_is_fatal() {
        let (mut calib, _meta) = initialized(config(""));
        let mut store = EventStore::new();
        store
            .record("TauJets", StoreObject::Taus(three_taus()))
            .unwrap();

        let err = calib.execute(&mut store).unwrap_err();
        assert_eq!(err, CalibError::MissingInput("EventInfo".into()));
    }

    #[test]
    fn tau_without_truth_is_published_uncorrected_with_link() {
        let (mut calib, _meta) = initialized(config(""));
        let taus = vec![tau(0, 40e3, true), tau(1, 80e3, false), tau(2, 60e3, true)];
        let mut store = event_store(DataKind::FullSim, taus.clone());

        calib.execute(&mut store).unwrap();

        let copy = store.taus("OutShallowCopy").unwrap();
        let aux = store.aux("OutShallowCopyAux.").unwrap();

        assert_ne!(copy[0].pt, taus[0].pt);
        assert_eq!(copy[1].pt, taus[1].pt);
        assert_ne!(copy[2].pt, taus[2].pt);
        assert_eq!(aux.calibrated, vec![true, false, true]);
        assert_eq!(aux.origin, vec![Some(0), Some(1), Some(2)]);
    }

    #[test]
    fn data_events_are_never_corrected() {
        let (mut calib, _meta) = initialized(config(""));
        let taus = three_taus();
        let mut store = event_store(DataKind::Data, taus.clone());

        calib.execute(&mut store).unwrap();

        let copy = store.taus("OutShallowCopy").unwrap();
        assert_eq!(copy, &taus[..]);
        let aux = store.aux("OutShallowCopyAux.").unwrap();
        assert_eq!(aux.calibrated, vec![false, false, false]);
    }

    #[test]
    fn unsorted_view_preserves_input_order() {
        let (mut calib, _meta) = initialized(config(""));
        let mut store = event_store(DataKind::FullSim, three_taus());
        calib.execute(&mut store).unwrap();

        let view = store.view("Out").unwrap();
        assert_eq!(view.source, "OutShallowCopy");
        assert_eq!(view.order, vec![0, 1, 2]);
    }

    #[test]
    fn sorted_view_is_a_descending_pt_permutation() {
        let mut cfg = config("");
        cfg.sort = true;
        let (mut calib, _meta) = initialized(cfg);
        let mut store = event_store(DataKind::FullSim, three_taus());
        calib.execute(&mut store).unwrap();

        let view = store.view("Out").unwrap();
        let copy = store.taus("OutShallowCopy").unwrap();

        let mut sorted = view.order.clone();
        sorted.sort_unstable();
        assert_eq!(sorted, vec![0, 1, 2]);

        let pts: Vec<f64> = view.resolve(copy).iter().map(|t| t.pt).collect();
        assert!(pts.windows(2).all(|w| w[0] >= w[1]));
    }

    #[test]
    fn reprocessing_the_same_event_is_bit_identical() {
        let run = || {
            let (mut calib, _meta) = initialized(config("TAUS_TES_TOTAL"));
            let mut store = event_store(DataKind::FullSim, three_taus());
            calib.execute(&mut store).unwrap();
            let mut bits = Vec::new();
            for key in ["OutShallowCopy", "OutShallowCopyTAUS_TES_TOTAL_1up"] {
                for tau in store.taus(key).unwrap() {
                    bits.push((tau.pt.to_bits(), tau.e.to_bits()));
                }
            }
            bits
        };

        assert_eq!(run(), run());
    }

    #[test]
    fn key_collision_aborts_but_keeps_earlier_output() {
        let (mut calib, _meta) = initialized(config("TAUS_TES_TOTAL_1up"));
        let mut store = event_store(DataKind::FullSim, three_taus());
        // Poison the second variation's view key.
        store
            .record("OutTAUS_TES_TOTAL_1up", StoreObject::Names(vec![]))
            .unwrap();

        let err = calib.execute(&mut store).unwrap_err();
        assert!(matches!(err, CalibError::KeyCollision(_)));

        // Baseline outputs from the earlier iteration stay published; the
        // manifest never lands.
        assert!(store.contains("Out"));
        assert!(!store.contains("taus_calib_syst"));
    }

    #[test]
    fn initialize_rejects_empty_required_names() {
        let mut cfg = config("");
        cfg.in_container = String::new();
        let mut calib = TauCalibrator::new(cfg, tool());
        let mut meta = MetaStore::new();
        assert!(matches!(
            calib.initialize(&mut meta),
            Err(CalibError::Config(_))
        ));

        let mut cfg = config("");
        cfg.output_algo_systs = String::new();
        let mut calib = TauCalibrator::new(cfg, tool());
        assert!(matches!(
            calib.initialize(&mut meta),
            Err(CalibError::Config(_))
        ));
    }

    #[test]
    fn initialize_records_chosen_names_in_run_metadata() {
        let (_calib, meta) = initialized(config("All"));
        let names = meta.names("taus_Systtau_calibrator").unwrap();
        assert_eq!(names.len(), 9);
        assert_eq!(names[0], "");

        // Nominal-only runs record an empty list, matching the upstream
        // convention of breaking out before any name is pushed.
        let (_calib, meta) = initialized(config(""));
        assert!(meta.names("taus_Systtau_calibrator").unwrap().is_empty());
    }

    #[test]
    fn write_syst_to_metadata_files_a_descriptive_record() {
        let mut cfg = config("All");
        cfg.write_syst_to_metadata = true;
        let (_calib, meta) = initialized(cfg);

        assert_eq!(meta.records().len(), 1);
        assert_eq!(meta.records()[0].algo, "tau_calibrator");
        assert_eq!(meta.records()[0].variations.len(), 9);
    }

    #[test]
    fn lifecycle_rejects_out_of_order_calls() {
        let mut calib = TauCalibrator::new(config(""), tool());
        let mut store = event_store(DataKind::FullSim, three_taus());
        assert!(matches!(
            calib.execute(&mut store),
            Err(CalibError::Lifecycle(_))
        ));

        let mut meta = MetaStore::new();
        calib.initialize(&mut meta).unwrap();
        assert!(matches!(
            calib.initialize(&mut meta),
            Err(CalibError::Lifecycle(_))
        ));

        calib.execute(&mut store).unwrap();
        calib.finalize().unwrap();
        assert!(matches!(
            calib.execute(&mut store),
            Err(CalibError::Lifecycle(_))
        ));
        assert!(matches!(calib.finalize(), Err(CalibError::Lifecycle(_))));
    }

    #[test]
    fn counters_track_events_and_objects() {
        let (mut calib, _meta) = initialized(config(""));
        let mut store = event_store(DataKind::FullSim, three_taus());
        calib.execute(&mut store).unwrap();

        let mut store2 = event_store(DataKind::FullSim, vec![tau(0, 50e3, true)]);
        calib.execute(&mut store2).unwrap();

        assert_eq!(calib.counters(), (2, 4));
    }
}
