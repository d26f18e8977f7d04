//! Systematic-variation bookkeeping.
//!
//! A variation is an opaque name plus a signed magnitude. The empty-name
//! variation is the nominal baseline; it is always processed first even when
//! no other variations are configured.

use serde::{Deserialize, Serialize};

use crate::error::CalibError;

/// One systematic variation of the energy calibration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SystematicVariation {
    /// Variation name, e.g. `TAUS_TES_TOTAL_1up`. Empty = nominal.
    pub name: String,
    /// Signed magnitude in units of the uncertainty (±1 as recommended).
    pub parameter: f64,
}

impl SystematicVariation {
    pub fn new(name: impl Into<String>, parameter: f64) -> Self {
        SystematicVariation {
            name: name.into(),
            parameter,
        }
    }

    /// The unmodified baseline.
    pub fn nominal() -> Self {
        SystematicVariation::new("", 0.0)
    }

    pub fn is_nominal(&self) -> bool {
        self.name.is_empty()
    }

    /// Variation name without a trailing `_1up` / `_1down` direction suffix.
    pub fn base_name(&self) -> &str {
        self.name
            .strip_suffix("_1up")
            .or_else(|| self.name.strip_suffix("_1down"))
            .unwrap_or(&self.name)
    }
}

/// Ordered set of variations recommended by a tool.
///
/// Insertion order is preserved; duplicate names are ignored.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct SystematicSet {
    variations: Vec<SystematicVariation>,
}

impl SystematicSet {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, variation: SystematicVariation) {
        if !self.contains_name(&variation.name) {
            self.variations.push(variation);
        }
    }

    pub fn contains_name(&self, name: &str) -> bool {
        self.variations.iter().any(|v| v.name == name)
    }

    pub fn iter(&self) -> impl Iterator<Item = &SystematicVariation> {
        self.variations.iter()
    }

    pub fn len(&self) -> usize {
        self.variations.len()
    }

    pub fn is_empty(&self) -> bool {
        self.variations.is_empty()
    }

    pub fn names(&self) -> Vec<String> {
        self.variations.iter().map(|v| v.name.clone()).collect()
    }
}

impl FromIterator<SystematicVariation> for SystematicSet {
    fn from_iter<T: IntoIterator<Item = SystematicVariation>>(iter: T) -> Self {
        let mut set = SystematicSet::new();
        for v in iter {
            set.insert(v);
        }
        set
    }
}

/// Compute the run list of variations from the tool's recommendations and
/// the user restriction. Called once at initialization; the result is
/// immutable for the remainder of processing.
///
/// Semantics of `requested`:
/// - `""`: nominal only
/// - `"All"`: nominal followed by every recommended variation, in
///   recommended order
/// - a full variation name (`TAUS_TES_TOTAL_1up`): nominal plus that single
///   variation, with `value` as its magnitude (sign from the direction)
/// - a base name (`TAUS_TES_TOTAL`): nominal plus both directions of that
///   family, with `±value` magnitudes
///
/// An unknown name is a configuration error.
pub fn resolve_systematics(
    recommended: &SystematicSet,
    requested: &str,
    value: f64,
) -> Result<Vec<SystematicVariation>, CalibError> {
    let mut list = vec![SystematicVariation::nominal()];

    if requested.is_empty() {
        return Ok(list);
    }

    if requested == "All" {
        list.extend(recommended.iter().cloned());
        return Ok(list);
    }

    if !value.is_finite() || value <= 0.0 {
        return Err(CalibError::Config(format!(
            "systematic value must be finite and > 0, got {value}"
        )));
    }

    let mut matched = false;
    for rec in recommended.iter() {
        let hit = rec.name == requested || rec.base_name() == requested;
        if hit {
            // Direction comes from the recommendation, magnitude from the user.
            let parameter = value * rec.parameter.signum();
            list.push(SystematicVariation::new(rec.name.clone(), parameter));
            matched = true;
        }
    }

    if !matched {
        return Err(CalibError::Config(format!(
            "unknown systematic variation '{requested}'"
        )));
    }

    Ok(list)
}
