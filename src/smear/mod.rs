//! Correction-tool seam.
//!
//! The calibrator talks to the energy calibration/smearing tool through the
//! `SmearingTool` trait only, via three operations: list the recommended
//! variations, activate one variation, and correct one object. The tool
//! holds the single piece of mutable state in the whole pipeline (the active
//! variation), which is why the fan-out loop is strictly sequential.

pub mod tes;

pub use tes::TesSmearingTool;

use crate::domain::TauJet;
use crate::error::CalibError;
use crate::syst::{SystematicSet, SystematicVariation};

/// Outcome of correcting one object.
///
/// `OutOfValidityRange` is a success: the object is left untouched and
/// processing continues without a warning. Only `Error` is logged.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CorrectionCode {
    Ok,
    OutOfValidityRange,
    Error,
}

/// External energy calibration/smearing tool.
pub trait SmearingTool {
    /// Variations this tool supports, in a stable order.
    fn recommended_systematics(&self) -> SystematicSet;

    /// Reconfigure the tool to apply exactly this variation to every
    /// subsequent `apply_correction` call. Unsupported variations are a
    /// configuration error.
    fn apply_systematic_variation(
        &mut self,
        variation: &SystematicVariation,
    ) -> Result<(), CalibError>;

    /// Correct one object in place under the active variation.
    fn apply_correction(&self, tau: &mut TauJet) -> CorrectionCode;
}
