//! Shallow-copy, provenance, and view utilities.
//!
//! The calibrator never mutates its input collection. Instead it works on
//! shallow copies:
//!
//! - `shallow_copy` produces an independent, mutable copy of every object
//!   plus a fresh auxiliary store for per-object decorations
//! - `set_origin_links` records which input slot each copy came from
//! - `make_view` builds a read-only, index-based view over the copies that
//!   can be reordered without touching the owning collection

use crate::domain::TauJet;
use crate::error::CalibError;

/// Per-object decoration storage attached to a shallow-copied collection.
///
/// Entries are parallel to the copied collection: `origin[i]` and
/// `calibrated[i]` describe copy `i`.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct AuxStore {
    /// Index of the original input object each copy descends from.
    /// `None` until `set_origin_links` succeeds.
    pub origin: Vec<Option<usize>>,
    /// Whether the smearing tool actually modified this copy.
    pub calibrated: Vec<bool>,
}

/// A shallow-copied collection: owned objects plus their auxiliary store.
#[derive(Debug, Clone, PartialEq)]
pub struct ShallowCopy {
    pub taus: Vec<TauJet>,
    pub aux: AuxStore,
}

/// Copy every object in `input`, producing independent mutable copies.
///
/// Mutating a copy never affects the input or any other copy.
pub fn shallow_copy(input: &[TauJet]) -> ShallowCopy {
    ShallowCopy {
        taus: input.to_vec(),
        aux: AuxStore {
            origin: vec![None; input.len()],
            calibrated: vec![false; input.len()],
        },
    }
}

/// Link each copy back to its original input object.
///
/// Fails if the two collections have different sizes. The caller treats the
/// failure as non-fatal (logged only): downstream consumers that need the
/// provenance, e.g. missing-energy rebuilding, will not be able to proceed.
pub fn set_origin_links(input: &[TauJet], copy: &mut ShallowCopy) -> Result<(), CalibError> {
    if input.len() != copy.taus.len() {
        return Err(CalibError::LinkMismatch {
            input: input.len(),
            copy: copy.taus.len(),
        });
    }
    for (slot, tau) in copy.aux.origin.iter_mut().zip(&copy.taus) {
        *slot = Some(tau.index);
    }
    Ok(())
}

/// Read-only, index-based view over an owning collection in the store.
///
/// `order[k]` is the position (within the owning collection named `source`)
/// of the view's k-th element. The view owns nothing; dropping it leaves the
/// collection untouched.
#[derive(Debug, Clone, PartialEq)]
pub struct TauView {
    /// Store key of the owning collection this view points into.
    pub source: String,
    pub order: Vec<usize>,
}

impl TauView {
    /// Resolve the view against its owning collection.
    pub fn resolve<'a>(&self, taus: &'a [TauJet]) -> Vec<&'a TauJet> {
        self.order.iter().map(|&i| &taus[i]).collect()
    }

    pub fn len(&self) -> usize {
        self.order.len()
    }

    pub fn is_empty(&self) -> bool {
        self.order.is_empty()
    }
}

/// Build a view over all copies, preserving their relative order.
pub fn make_view(source: impl Into<String>, copy: &ShallowCopy) -> TauView {
    TauView {
        source: source.into(),
        order: (0..copy.taus.len()).collect(),
    }
}

/// Stable in-place reorder of a view by descending transverse momentum.
///
/// Non-finite pt values sort last so a single bad object cannot float to the
/// top of the view.
pub fn sort_view_by_pt(view: &mut TauView, taus: &[TauJet]) {
    fn key(pt: f64) -> f64 {
        if pt.is_finite() { pt } else { f64::NEG_INFINITY }
    }
    view.order
        .sort_by(|&ia, &ib| key(taus[ib].pt).total_cmp(&key(taus[ia].pt)));
}

#[cfg(test)]
mod tests {
    use super::*;

    fn tau(index: usize, pt: f64) -> TauJet {
        TauJet {
            index,
            pt,
            eta: 0.1 * index as f64,
            phi: 0.0,
            e: pt * 1.2,
            n_prong: 1,
            truth: None,
        }
    }

    #[test]
    fn shallow_copy_is_independent() {
        let input = vec![tau(0, 50e3), tau(1, 30e3)];
        let mut copy = shallow_copy(&input);
        copy.taus[0].pt = 99e3;

        assert_eq!(input[0].pt, 50e3);
        assert_eq!(copy.taus[1], input[1]);
        assert_eq!(copy.aux.origin, vec![None, None]);
    }

    #[test]
    fn origin_links_map_copies_to_distinct_inputs() {
        let input = vec![tau(0, 50e3), tau(1, 30e3), tau(2, 70e3)];
        let mut copy = shallow_copy(&input);
        set_origin_links(&input, &mut copy).unwrap();

        assert_eq!(copy.aux.origin, vec![Some(0), Some(1), Some(2)]);
    }

    #[test]
    fn origin_links_reject_size_mismatch() {
        let input = vec![tau(0, 50e3)];
        let mut copy = shallow_copy(&input);
        copy.taus.push(tau(1, 30e3));
        copy.aux.origin.push(None);
        copy.aux.calibrated.push(false);

        let err = set_origin_links(&input, &mut copy).unwrap_err();
        assert_eq!(err, CalibError::LinkMismatch { input: 1, copy: 2 });
    }

    #[test]
    fn view_preserves_order_without_sort() {
        let input = vec![tau(0, 30e3), tau(1, 70e3), tau(2, 50e3)];
        let copy = shallow_copy(&input);
        let view = make_view("Out", &copy);

        assert_eq!(view.order, vec![0, 1, 2]);
        let pts: Vec<f64> = view.resolve(&copy.taus).iter().map(|t| t.pt).collect();
        assert_eq!(pts, vec![30e3, 70e3, 50e3]);
    }

    #[test]
    fn sort_orders_by_descending_pt() {
        let input = vec![tau(0, 30e3), tau(1, 70e3), tau(2, 50e3)];
        let copy = shallow_copy(&input);
        let mut view = make_view("Out", &copy);
        sort_view_by_pt(&mut view, &copy.taus);

        assert_eq!(view.order, vec![1, 2, 0]);
    }

    #[test]
    fn sort_pushes_non_finite_pt_last() {
        let input = vec![tau(0, f64::NAN), tau(1, 70e3), tau(2, 50e3)];
        let copy = shallow_copy(&input);
        let mut view = make_view("Out", &copy);
        sort_view_by_pt(&mut view, &copy.taus);

        assert_eq!(view.order, vec![1, 2, 0]);
    }
}
