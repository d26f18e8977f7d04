//! Shared domain types.
//!
//! These types are intentionally kept lightweight and serializable so they can be:
//!
//! - used in-memory during calibration
//! - exported to JSON/CSV
//! - reconstructed in tests without any framework scaffolding

use clap::ValueEnum;
use serde::{Deserialize, Serialize};

/// Provenance of the event sample.
///
/// `FastSim` corresponds to the fast (AFII-style) detector simulation; the
/// smearing tool applies an extra scale on top of the full-simulation
/// calibration for it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, ValueEnum)]
#[serde(rename_all = "lowercase")]
pub enum DataKind {
    /// Real collision data: no smearing is applied.
    Data,
    /// Full detector simulation.
    FullSim,
    /// Fast detector simulation (AFII).
    FastSim,
}

impl DataKind {
    /// Whether energy smearing applies at all.
    pub fn is_simulation(self) -> bool {
        !matches!(self, DataKind::Data)
    }
}

/// Generator-level counterpart of a reconstructed tau.
///
/// Present only for simulated events where truth matching succeeded.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TruthTau {
    /// Transverse momentum in MeV.
    pub pt: f64,
    pub eta: f64,
    pub phi: f64,
    /// Number of charged decay tracks (1 or 3 for real taus).
    pub n_prong: u8,
}

/// One reconstructed tau candidate.
///
/// Energies are in MeV, matching the upstream reconstruction convention.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TauJet {
    /// Position in the parent collection. Stable across shallow copies, so a
    /// corrected copy can always be traced back to its input slot.
    pub index: usize,
    /// Transverse momentum in MeV.
    pub pt: f64,
    pub eta: f64,
    pub phi: f64,
    /// Total energy in MeV.
    pub e: f64,
    /// Number of charged decay tracks.
    pub n_prong: u8,
    /// Ground-truth counterpart, if truth matching found one.
    pub truth: Option<TruthTau>,
}

impl TauJet {
    /// Transverse momentum in GeV (for logs and reports).
    pub fn pt_gev(&self) -> f64 {
        self.pt * 1e-3
    }
}

/// Per-event bookkeeping record.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct EventInfo {
    pub run_number: u32,
    pub event_number: u64,
    pub data_kind: DataKind,
}

/// Full configuration surface of the calibrator.
///
/// Set once before `initialize`; immutable afterwards. The string keys are
/// runtime-generated store names, so empty required fields are rejected at
/// `initialize` rather than at construction.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CalibConfig {
    /// Name of the input tau collection in the event store. Required.
    pub in_container: String,
    /// Name of the per-event bookkeeping record in the event store.
    pub event_info_container: String,
    /// Base name for all published output collections.
    pub out_container: String,

    /// Recommendation tag forwarded to the smearing tool (empty = tool default).
    pub recommendation_tag: String,
    /// Use the MVA-based tau energy scale.
    pub apply_mva_tes: bool,
    /// Use the combined (calo+track) tau energy scale.
    pub apply_combined_tes: bool,
    /// Calibrate for fast simulation (AFII) instead of full simulation.
    pub fast_sim: bool,

    /// Publish the per-variation views sorted by descending pt.
    pub sort: bool,

    /// Requested systematic restriction: `""` = nominal only, `"All"` = every
    /// recommended variation, otherwise a single variation base name.
    pub syst_name: String,
    /// Magnitude (in sigma) for a single requested variation.
    pub syst_val: f64,

    /// Metadata-store key naming the upstream systematic-name list.
    pub input_algo_systs: String,
    /// Event-store key under which the output-name manifest is published.
    pub output_algo_systs: String,
    /// Also record the variation list as descriptive run metadata.
    pub write_syst_to_metadata: bool,

    /// Algorithm instance name, used to qualify run-metadata keys.
    pub name: String,
}

impl Default for CalibConfig {
    fn default() -> Self {
        CalibConfig {
            in_container: "TauJets".to_string(),
            event_info_container: "EventInfo".to_string(),
            out_container: "TauJetsCalib".to_string(),
            recommendation_tag: String::new(),
            apply_mva_tes: false,
            apply_combined_tes: false,
            fast_sim: false,
            sort: false,
            syst_name: String::new(),
            syst_val: 0.0,
            input_algo_systs: String::new(),
            output_algo_systs: "taus_calib_syst".to_string(),
            write_syst_to_metadata: false,
            name: "tau_calibrator".to_string(),
        }
    }
}
