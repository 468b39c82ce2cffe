//! Precision-recall-gain curves.
//!
//! Precision gain and recall gain rescale precision and recall relative to the
//! positive base rate, so that the always-positive classifier sits at the
//! origin and a perfect classifier at (1, 1). Areas under PRG curves are
//! therefore comparable across tasks with different class balance.
//!
//! Gains divide by the true-positive count, so the first points of a curve
//! legitimately carry `-inf` or NaN values. Those follow IEEE-754 and are
//! excluded from the area by [`calc_auprg`].

use crate::curve::binary_clf_curve;
use crate::error::{CurveError, Result};
use serde::{Deserialize, Serialize};
use std::cmp::Ordering;

/// Precision gain: `1 - (P/N) * (fp/tp)`, or 0 when `tn + fn == 0`.
pub fn precision_gain(tp: f64, fn_: f64, fp: f64, tn: f64) -> f64 {
    if tn + fn_ == 0.0 {
        return 0.0;
    }
    let n_pos = tp + fn_;
    let n_neg = fp + tn;
    1.0 - (n_pos / n_neg) * (fp / tp)
}

/// Recall gain: `1 - (P/N) * (fn/tp)`, or 1 when `tn + fn == 0`.
pub fn recall_gain(tp: f64, fn_: f64, fp: f64, tn: f64) -> f64 {
    if tn + fn_ == 0.0 {
        return 1.0;
    }
    let n_pos = tp + fn_;
    let n_neg = fp + tn;
    1.0 - (n_pos / n_neg) * (fn_ / tp)
}

/// A single operating point on a PRG curve.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct PrgPoint {
    /// Score threshold (NaN for interpolated crossing points).
    pub threshold: f64,
    pub tp: f64,
    pub fp: f64,
    pub fn_: f64,
    pub tn: f64,
    pub precision: f64,
    pub recall: f64,
    pub precision_gain: f64,
    pub recall_gain: f64,
    /// Interpolated point where the curve crosses a gain axis.
    pub is_crossing: bool,
}

impl PrgPoint {
    fn at_threshold(threshold: f64, tp: f64, fp: f64, n_pos: f64, n_neg: f64) -> Self {
        let fn_ = n_pos - tp;
        let tn = n_neg - fp;
        PrgPoint {
            threshold,
            tp,
            fp,
            fn_,
            tn,
            precision: tp / (tp + fp),
            recall: tp / n_pos,
            precision_gain: precision_gain(tp, fn_, fp, tn),
            recall_gain: recall_gain(tp, fn_, fp, tn),
            is_crossing: false,
        }
    }

    /// Linear interpolation of every field from `self` towards `other`.
    fn lerp(&self, other: &PrgPoint, alpha: f64) -> Self {
        let mix = |a: f64, b: f64| a + alpha * (b - a);
        PrgPoint {
            threshold: mix(self.threshold, other.threshold),
            tp: mix(self.tp, other.tp),
            fp: mix(self.fp, other.fp),
            fn_: mix(self.fn_, other.fn_),
            tn: mix(self.tn, other.tn),
            precision: mix(self.precision, other.precision),
            recall: mix(self.recall, other.recall),
            precision_gain: mix(self.precision_gain, other.precision_gain),
            recall_gain: mix(self.recall_gain, other.recall_gain),
            is_crossing: false,
        }
    }

    /// Whether the point lies in the non-negative gain quadrant.
    pub fn in_unit_square(&self) -> bool {
        self.recall_gain >= 0.0 && self.precision_gain >= 0.0
    }
}

/// PRG curve with non-decreasing recall gain.
///
/// Built in threshold order; every inserted crossing point re-sorts the points
/// by recall gain ascending, then precision gain descending.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PrgCurve {
    pub points: Vec<PrgPoint>,
}

impl PrgCurve {
    pub fn len(&self) -> usize {
        self.points.len()
    }

    pub fn is_empty(&self) -> bool {
        self.points.is_empty()
    }

    pub fn recall_gains(&self) -> Vec<f64> {
        self.points.iter().map(|p| p.recall_gain).collect()
    }

    pub fn precision_gains(&self) -> Vec<f64> {
        self.points.iter().map(|p| p.precision_gain).collect()
    }

    /// Area under the curve; see [`calc_auprg`].
    pub fn area(&self) -> f64 {
        calc_auprg(self)
    }

    fn insert_sorted(&mut self, point: PrgPoint) {
        // Insert at the front and stable-sort so that among equal keys the new
        // point comes first.
        self.points.insert(0, point);
        self.points.sort_by(gain_order);
    }

    fn insert_crossing_points(&mut self, n_pos: f64, n_neg: f64) {
        let n = n_pos + n_neg;

        // Crossing of the recall-gain = 0 axis, unless a point already lies on it.
        if let Some(j) = self.points.iter().position(|p| p.recall_gain >= 0.0) {
            if j > 0 && self.points[j].recall_gain > 0.0 {
                let prev = self.points[j - 1];
                let next = self.points[j];
                let delta_tp = next.tp - prev.tp;
                let alpha = if delta_tp > 0.0 {
                    (n_pos * n_pos / n - prev.tp) / delta_tp
                } else {
                    0.5
                };
                let mut point = prev.lerp(&next, alpha);
                point.precision_gain = precision_gain(point.tp, point.fn_, point.fp, point.tn);
                point.recall_gain = 0.0;
                point.is_crossing = true;
                self.insert_sorted(point);
            }
        }

        // Crossings of the precision-gain = 0 axis where recall gain >= 0. An
        // inserted point has zero precision gain, so the scan steps over it.
        let mut i = 1;
        while i < self.points.len() {
            let prev = self.points[i - 1];
            let next = self.points[i];
            let (x0, y0) = (prev.recall_gain, prev.precision_gain);
            let (x1, y1) = (next.recall_gain, next.precision_gain);
            if y0 * y1 < 0.0 && x0 >= 0.0 {
                let cross_x = x0 + (-y0) / (y1 - y0) * (x1 - x0);
                let delta_tp = next.tp - prev.tp;
                let alpha = if delta_tp > 0.0 {
                    (n_pos * n_pos / (n - n_neg * cross_x) - prev.tp) / delta_tp
                } else {
                    (n_neg / n_pos * prev.tp - prev.fp) / (next.fp - prev.fp)
                };
                let mut point = prev.lerp(&next, alpha);
                point.recall_gain = recall_gain(point.tp, point.fn_, point.fp, point.tn);
                point.precision_gain = 0.0;
                point.is_crossing = true;
                self.insert_sorted(point);
            }
            i += 1;
        }
    }
}

fn nan_last(a: f64, b: f64) -> Ordering {
    match (a.is_nan(), b.is_nan()) {
        (true, true) => Ordering::Equal,
        (true, false) => Ordering::Greater,
        (false, true) => Ordering::Less,
        (false, false) => a.partial_cmp(&b).unwrap_or(Ordering::Equal),
    }
}

fn gain_order(a: &PrgPoint, b: &PrgPoint) -> Ordering {
    nan_last(a.recall_gain, b.recall_gain)
        .then_with(|| nan_last(-a.precision_gain, -b.precision_gain))
}

/// Build the precision-recall-gain curve for `labels` and `scores`.
///
/// Produces one point per distinct score plus the initial all-negative point
/// (threshold +inf), then inserts the axis crossing points needed for an exact
/// area. Fails when only one class is present.
pub fn create_prg_curve(labels: &[bool], scores: &[f64]) -> Result<PrgCurve> {
    let clf = binary_clf_curve(labels, scores)?;
    let n_pos = clf.total_positives();
    let n_neg = clf.total_negatives();
    if n_pos == 0.0 || n_neg == 0.0 {
        return Err(CurveError::SingleClass {
            class: n_pos > 0.0,
        });
    }

    let mut points = Vec::with_capacity(clf.thresholds.len() + 1);
    points.push(PrgPoint::at_threshold(f64::INFINITY, 0.0, 0.0, n_pos, n_neg));
    for ((&threshold, &tp), &fp) in clf.thresholds.iter().zip(&clf.tps).zip(&clf.fps) {
        points.push(PrgPoint::at_threshold(threshold, tp, fp, n_pos, n_neg));
    }

    // Threshold order already has non-decreasing recall gain. Sorting here
    // would reorder the tied -inf points that the first crossing interpolates
    // from.
    let mut curve = PrgCurve { points };
    curve.insert_crossing_points(n_pos, n_neg);
    Ok(curve)
}

/// Area under a PRG curve.
///
/// Sums trapezoids between consecutive points whose left end has a
/// non-negative recall gain.
pub fn calc_auprg(curve: &PrgCurve) -> f64 {
    curve
        .points
        .windows(2)
        .filter(|w| w[0].recall_gain >= 0.0)
        .map(|w| {
            let width = w[1].recall_gain - w[0].recall_gain;
            let height = (w[1].precision_gain + w[0].precision_gain) / 2.0;
            width * height
        })
        .sum()
}
