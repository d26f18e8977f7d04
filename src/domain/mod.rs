//! Domain types used throughout the pipeline.
//!
//! This module defines:
//!
//! - event-data-model records (`TauJet`, `TruthTau`, `EventInfo`)
//! - the sample-provenance enum (`DataKind`)
//! - the full calibrator configuration surface (`CalibConfig`)

pub mod types;

pub use types::*;
