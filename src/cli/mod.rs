//! Command-line parsing for the calibration demo pipeline.
//!
//! The goal of this module is to keep **argument parsing** and **command
//! dispatch** separate from the calibration code.

use std::path::PathBuf;

use clap::{Parser, Subcommand};

use crate::domain::DataKind;

/// Top-level CLI.
#[derive(Debug, Parser)]
#[command(name = "taucal", version, about = "Tau energy calibration fan-out over synthetic events")]
pub struct Cli {
    #[command(subcommand)]
    pub command: Command,
}

/// CLI subcommands.
#[derive(Debug, Subcommand)]
pub enum Command {
    /// Run the calibrator over generated events and print a run summary.
    Run(RunArgs),
    /// Print the smearing tool's recommended systematic variations.
    ListSysts(ToolArgs),
}

/// Smearing-tool configuration shared by both subcommands.
#[derive(Debug, Parser, Clone)]
pub struct ToolArgs {
    /// Recommendation tag forwarded to the smearing tool.
    #[arg(long, default_value = "")]
    pub recommendation_tag: String,

    /// Use the MVA-based tau energy scale.
    #[arg(long)]
    pub apply_mva_tes: bool,

    /// Use the combined (calo+track) tau energy scale.
    #[arg(long)]
    pub apply_combined_tes: bool,

    /// Calibrate for fast simulation (AFII).
    #[arg(long)]
    pub fast_sim: bool,
}

/// Options for `taucal run`.
#[derive(Debug, Parser, Clone)]
pub struct RunArgs {
    #[command(flatten)]
    pub tool: ToolArgs,

    /// Number of events to generate and process.
    #[arg(short = 'n', long, default_value_t = 10)]
    pub events: usize,

    /// Taus per generated event.
    #[arg(long, default_value_t = 3)]
    pub taus: usize,

    /// Random seed for event generation.
    #[arg(long, default_value_t = 42)]
    pub seed: u64,

    /// Sample provenance (data disables smearing entirely).
    #[arg(long, value_enum, default_value = "full-sim")]
    pub data_kind: DataKind,

    /// Probability that a simulated tau has a truth counterpart.
    #[arg(long, default_value_t = 0.9)]
    pub truth_match_prob: f64,

    /// Systematic restriction: empty = nominal only, "All" = every
    /// recommended variation, otherwise one variation (base or full name).
    #[arg(long, default_value = "")]
    pub syst: String,

    /// Magnitude (in sigma) for a single requested variation.
    #[arg(long, default_value_t = 1.0)]
    pub syst_val: f64,

    /// Sort published views by descending pt.
    #[arg(long)]
    pub sort: bool,

    /// Input collection name in the event store.
    #[arg(long, default_value = "TauJets")]
    pub in_container: String,

    /// Base name for published output collections.
    #[arg(long, default_value = "TauJetsCalib")]
    pub out_container: String,

    /// Event-store key for the output-name manifest.
    #[arg(long, default_value = "taus_calib_syst")]
    pub output_algo_systs: String,

    /// Metadata-store key naming the upstream systematic-name list.
    #[arg(long, default_value = "")]
    pub input_algo_systs: String,

    /// Also record the variation list as descriptive run metadata.
    #[arg(long)]
    pub write_syst_to_metadata: bool,

    /// Export per-tau results to CSV.
    #[arg(long)]
    pub export: Option<PathBuf>,

    /// Export the run manifest (config + variations + summaries) to JSON.
    #[arg(long = "export-manifest")]
    pub export_manifest: Option<PathBuf>,
}
