//! Deterministic tau-energy-scale (TES) smearing tool.
//!
//! This is a self-contained stand-in for the experiment's calibration tool
//! with the same observable contract: a recommended-variation list, a single
//! active variation, and a per-object correction that can report
//! out-of-validity or error. The numbers are a plausible parametrization,
//! not physics; what matters for the pipeline is that the correction is
//! fully deterministic so repeated processing of the same event is
//! bit-identical.

use crate::domain::TauJet;
use crate::error::CalibError;
use crate::smear::{CorrectionCode, SmearingTool};
use crate::syst::{SystematicSet, SystematicVariation};

/// Uncertainty families recommended by the tool, each in up/down pairs.
const FAMILIES: [&str; 4] = [
    "TAUS_TES_TOTAL",
    "TAUS_TES_DETECTOR",
    "TAUS_TES_INSITU",
    "TAUS_TES_MODEL",
];

/// Recommendation tags this parametrization knows about.
const KNOWN_TAGS: [&str; 3] = ["", "2019-summer", "2022-prerec"];

/// Below this pt (MeV) the calibration is not validated; objects are left
/// untouched and the correction reports `OutOfValidityRange`.
const MIN_VALID_PT: f64 = 15.0e3;

/// Tool configuration, mirrored from the calibrator's surface.
#[derive(Debug, Clone)]
pub struct TesConfig {
    pub recommendation_tag: String,
    pub apply_mva_tes: bool,
    pub apply_combined_tes: bool,
    pub fast_sim: bool,
}

/// Deterministic TES implementation of `SmearingTool`.
#[derive(Debug, Clone)]
pub struct TesSmearingTool {
    config: TesConfig,
    active: SystematicVariation,
    recommended: SystematicSet,
}

impl TesSmearingTool {
    /// Build the tool, validating the recommendation tag.
    pub fn new(config: TesConfig) -> Result<Self, CalibError> {
        if !KNOWN_TAGS.contains(&config.recommendation_tag.as_str()) {
            return Err(CalibError::Config(format!(
                "unknown recommendation tag '{}'",
                config.recommendation_tag
            )));
        }

        let recommended = FAMILIES
            .iter()
            .flat_map(|family| {
                [
                    SystematicVariation::new(format!("{family}_1up"), 1.0),
                    SystematicVariation::new(format!("{family}_1down"), -1.0),
                ]
            })
            .collect();

        Ok(TesSmearingTool {
            config,
            active: SystematicVariation::nominal(),
            recommended,
        })
    }

    /// Nominal calibration factor: an in-situ offset that flattens out with
    /// pt, adjusted by the energy-scale mode switches.
    fn nominal_scale(&self, tau: &TauJet) -> f64 {
        let pt_gev = tau.pt * 1e-3;
        let mut scale = 1.0 + 0.010 / pt_gev.sqrt();
        if self.config.apply_mva_tes {
            scale += 0.002;
        }
        if self.config.apply_combined_tes {
            scale -= 0.001;
        }
        if self.config.fast_sim {
            scale *= 1.003;
        }
        scale
    }

    /// Fractional one-sigma uncertainty of a family for this object.
    fn uncertainty(&self, family: &str, tau: &TauJet) -> f64 {
        let pt_gev = tau.pt * 1e-3;
        let prong_term = if tau.n_prong >= 3 { 0.002 } else { 0.0 };
        match family {
            "TAUS_TES_TOTAL" => 0.020 + 0.010 / pt_gev.sqrt() + prong_term,
            "TAUS_TES_DETECTOR" => 0.010 + prong_term,
            "TAUS_TES_INSITU" => 0.015 * (-pt_gev / 100.0).exp(),
            "TAUS_TES_MODEL" => 0.008 + 0.002 * tau.eta.abs(),
            _ => 0.0,
        }
    }
}

impl SmearingTool for TesSmearingTool {
    fn recommended_systematics(&self) -> SystematicSet {
        self.recommended.clone()
    }

    fn apply_systematic_variation(
        &mut self,
        variation: &SystematicVariation,
    ) -> Result<(), CalibError> {
        if !variation.is_nominal() && !self.recommended.contains_name(&variation.name) {
            return Err(CalibError::UnsupportedVariation(variation.name.clone()));
        }
        self.active = variation.clone();
        Ok(())
    }

    fn apply_correction(&self, tau: &mut TauJet) -> CorrectionCode {
        if !tau.pt.is_finite() || tau.pt <= 0.0 {
            return CorrectionCode::Error;
        }
        if tau.pt < MIN_VALID_PT {
            return CorrectionCode::OutOfValidityRange;
        }

        let mut scale = self.nominal_scale(tau);
        if !self.active.is_nominal() {
            let sigma = self.uncertainty(self.active.base_name(), tau);
            scale *= 1.0 + self.active.parameter * sigma;
        }

        tau.pt *= scale;
        tau.e *= scale;
        CorrectionCode::Ok
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn tool() -> TesSmearingTool {
        TesSmearingTool::new(TesConfig {
            recommendation_tag: String::new(),
            apply_mva_tes: false,
            apply_combined_tes: false,
            fast_sim: false,
        })
        .unwrap()
    }

    fn tau(pt: f64) -> TauJet {
        TauJet {
            index: 0,
            pt,
            eta: 1.2,
            phi: 0.4,
            e: pt * 1.8,
            n_prong: 1,
            truth: None,
        }
    }

    #[test]
    fn recommends_all_families_in_pairs() {
        let set = tool().recommended_systematics();
        assert_eq!(set.len(), 8);
        assert!(set.contains_name("TAUS_TES_TOTAL_1up"));
        assert!(set.contains_name("TAUS_TES_MODEL_1down"));
    }

    #[test]
    fn unknown_tag_is_rejected() {
        let err = TesSmearingTool::new(TesConfig {
            recommendation_tag: "2031-dream".into(),
            apply_mva_tes: false,
            apply_combined_tes: false,
            fast_sim: false,
        })
        .unwrap_err();
        assert!(matches!(err, CalibError::Config(_)));
    }

    #[test]
    fn nominal_correction_is_deterministic_and_scales_pt_and_e_together() {
        let tool = tool();
        let mut a = tau(60e3);
        let mut b = tau(60e3);
        assert_eq!(tool.apply_correction(&mut a), CorrectionCode::Ok);
        assert_eq!(tool.apply_correction(&mut b), CorrectionCode::Ok);

        assert_eq!(a.pt.to_bits(), b.pt.to_bits());
        let ratio_pt = a.pt / 60e3;
        let ratio_e = a.e / (60e3 * 1.8);
        assert!((ratio_pt - ratio_e).abs() < 1e-12);
    }

    #[test]
    fn up_and_down_bracket_the_nominal() {
        let mut tool = tool();
        let mut nominal = tau(60e3);
        tool.apply_systematic_variation(&SystematicVariation::nominal())
            .unwrap();
        tool.apply_correction(&mut nominal);

        let mut up = tau(60e3);
        tool.apply_systematic_variation(&SystematicVariation::new("TAUS_TES_TOTAL_1up", 1.0))
            .unwrap();
        tool.apply_correction(&mut up);

        let mut down = tau(60e3);
        tool.apply_systematic_variation(&SystematicVariation::new("TAUS_TES_TOTAL_1down", -1.0))
            .unwrap();
        tool.apply_correction(&mut down);

        assert!(up.pt > nominal.pt);
        assert!(down.pt < nominal.pt);
    }

    #[test]
    fn out_of_validity_leaves_object_untouched() {
        let tool = tool();
        let mut low = tau(10e3);
        let before = low.clone();
        assert_eq!(
            tool.apply_correction(&mut low),
            CorrectionCode::OutOfValidityRange
        );
        assert_eq!(low, before);
    }

    #[test]
    fn non_finite_pt_reports_error() {
        let tool = tool();
        let mut bad = tau(f64::NAN);
        assert_eq!(tool.apply_correction(&mut bad), CorrectionCode::Error);
    }

    #[test]
    fn unsupported_variation_is_rejected() {
        let mut tool = tool();
        let err = tool
            .apply_systematic_variation(&SystematicVariation::new("TAUS_EFF_ID_1up", 1.0))
            .unwrap_err();
        assert_eq!(
            err,
            CalibError::UnsupportedVariation("TAUS_EFF_ID_1up".into())
        );
    }

    #[test]
    fn mode_switches_shift_the_nominal_scale() {
        let plain = tool();
        let mva = TesSmearingTool::new(TesConfig {
            recommendation_tag: String::new(),
            apply_mva_tes: true,
            apply_combined_tes: false,
            fast_sim: false,
        })
        .unwrap();

        let mut a = tau(60e3);
        let mut b = tau(60e3);
        plain.apply_correction(&mut a);
        mva.apply_correction(&mut b);
        assert!(b.pt > a.pt);
    }
}
