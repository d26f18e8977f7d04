//! Top-level application orchestration.
//!
//! `src/main.rs` is intentionally tiny; this module is the "real main" that:
//! - initializes logging
//! - parses CLI arguments
//! - runs the calibration pipeline
//! - prints reports
//! - writes optional exports

use clap::Parser;

use crate::cli::{Command, RunArgs, ToolArgs};
use crate::data::SampleConfig;
use crate::domain::CalibConfig;
use crate::error::CalibError;
use crate::smear::tes::{TesConfig, TesSmearingTool};
use crate::smear::SmearingTool;

pub mod pipeline;

/// Entry point for the `taucal` binary.
pub fn run() -> Result<(), CalibError> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive(tracing::Level::INFO.into()),
        )
        .with_writer(std::io::stderr)
        .init();

    let cli = crate::cli::Cli::parse();
    match cli.command {
        Command::Run(args) => handle_run(args),
        Command::ListSysts(args) => handle_list_systs(args),
    }
}

fn handle_run(args: RunArgs) -> Result<(), CalibError> {
    let config = calib_config_from_args(&args);
    let sample = SampleConfig {
        n_taus: args.taus,
        seed: args.seed,
        data_kind: args.data_kind,
        truth_match_prob: args.truth_match_prob,
        ..SampleConfig::default()
    };

    let out = pipeline::run_calibration(&config, &sample, args.events)?;

    println!(
        "{}",
        crate::report::format_run_summary(&config, &out.syst_names, &out.events)
    );

    if let Some(path) = &args.export {
        crate::io::export::write_results_csv(path, &out.rows)?;
        println!("Wrote results CSV: {}", path.display());
    }
    if let Some(path) = &args.export_manifest {
        let manifest =
            crate::io::export::RunManifest::new(&config, out.syst_names.clone(), out.events);
        crate::io::export::write_manifest_json(path, &manifest)?;
        println!("Wrote run manifest: {}", path.display());
    }

    Ok(())
}

fn handle_list_systs(args: ToolArgs) -> Result<(), CalibError> {
    let tool = TesSmearingTool::new(TesConfig {
        recommendation_tag: args.recommendation_tag,
        apply_mva_tes: args.apply_mva_tes,
        apply_combined_tes: args.apply_combined_tes,
        fast_sim: args.fast_sim,
    })?;

    println!("Recommended systematic variations:");
    for variation in tool.recommended_systematics().iter() {
        println!("  {} ({:+})", variation.name, variation.parameter);
    }
    Ok(())
}

fn calib_config_from_args(args: &RunArgs) -> CalibConfig {
    CalibConfig {
        in_container: args.in_container.clone(),
        out_container: args.out_container.clone(),
        recommendation_tag: args.tool.recommendation_tag.clone(),
        apply_mva_tes: args.tool.apply_mva_tes,
        apply_combined_tes: args.tool.apply_combined_tes,
        fast_sim: args.tool.fast_sim,
        sort: args.sort,
        syst_name: args.syst.clone(),
        syst_val: args.syst_val,
        input_algo_systs: args.input_algo_systs.clone(),
        output_algo_systs: args.output_algo_systs.clone(),
        write_syst_to_metadata: args.write_syst_to_metadata,
        ..CalibConfig::default()
    }
}
