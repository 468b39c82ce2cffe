//! Threshold-sweep curves (ROC, precision/recall) and trapezoidal area.

use crate::error::{CurveError, Result};
use serde::{Deserialize, Serialize};
use std::cmp::Ordering;

/// Cumulative counts at each distinct score, scores sorted descending.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ClfCurve {
    /// False positives with score >= threshold.
    pub fps: Vec<f64>,
    /// True positives with score >= threshold.
    pub tps: Vec<f64>,
    /// Distinct scores, descending.
    pub thresholds: Vec<f64>,
}

impl ClfCurve {
    /// Total positives (the last cumulative count).
    pub fn total_positives(&self) -> f64 {
        self.tps.last().copied().unwrap_or(0.0)
    }

    /// Total negatives (the last cumulative count).
    pub fn total_negatives(&self) -> f64 {
        self.fps.last().copied().unwrap_or(0.0)
    }
}

/// Precision/recall pairs ordered by increasing threshold.
///
/// Recall is non-increasing along the sequence. The final point is the
/// sentinel (precision 1, recall 0) and has no threshold, so
/// `thresholds.len() == precision.len() - 1`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PrecisionRecallCurve {
    pub precision: Vec<f64>,
    pub recall: Vec<f64>,
    pub thresholds: Vec<f64>,
}

impl PrecisionRecallCurve {
    /// Number of points, sentinel included.
    pub fn len(&self) -> usize {
        self.precision.len()
    }

    /// Always false for a curve built by [`precision_recall_curve`].
    pub fn is_empty(&self) -> bool {
        self.precision.is_empty()
    }

    /// Area under the curve with recall on the x-axis.
    pub fn area(&self) -> Result<f64> {
        auc(&self.recall, &self.precision)
    }
}

/// Receiver operating characteristic, starting at the origin.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RocCurve {
    pub fpr: Vec<f64>,
    pub tpr: Vec<f64>,
    /// Decreasing thresholds; the first is +inf for the origin point.
    pub thresholds: Vec<f64>,
}

impl RocCurve {
    /// Area under the curve with FPR on the x-axis.
    pub fn area(&self) -> Result<f64> {
        auc(&self.fpr, &self.tpr)
    }
}

pub(crate) fn validate(labels: &[bool], scores: &[f64]) -> Result<()> {
    if labels.len() != scores.len() {
        return Err(CurveError::LengthMismatch {
            labels: labels.len(),
            scores: scores.len(),
        });
    }
    if labels.is_empty() {
        return Err(CurveError::Empty);
    }
    if let Some((index, &value)) = scores.iter().enumerate().find(|(_, s)| !s.is_finite()) {
        return Err(CurveError::NonFiniteScore { index, value });
    }
    Ok(())
}

/// Compute cumulative true/false positive counts per distinct score.
///
/// Samples are swept from the highest score down; tied scores collapse into a
/// single point.
pub fn binary_clf_curve(labels: &[bool], scores: &[f64]) -> Result<ClfCurve> {
    validate(labels, scores)?;

    let mut order: Vec<usize> = (0..scores.len()).collect();
    order.sort_by(|&a, &b| {
        scores[b]
            .partial_cmp(&scores[a])
            .unwrap_or(Ordering::Equal)
    });

    let mut curve = ClfCurve {
        fps: Vec::new(),
        tps: Vec::new(),
        thresholds: Vec::new(),
    };
    let mut tp = 0.0;
    let mut fp = 0.0;

    for (rank, &idx) in order.iter().enumerate() {
        if labels[idx] {
            tp += 1.0;
        } else {
            fp += 1.0;
        }
        let last_of_run = order
            .get(rank + 1)
            .map_or(true, |&next| scores[next] != scores[idx]);
        if last_of_run {
            curve.tps.push(tp);
            curve.fps.push(fp);
            curve.thresholds.push(scores[idx]);
        }
    }

    Ok(curve)
}

/// Compute precision/recall pairs for every decision threshold.
///
/// Points past the first threshold reaching full recall are dropped. Fails
/// with [`CurveError::NoPositiveSamples`] when recall is undefined.
pub fn precision_recall_curve(labels: &[bool], scores: &[f64]) -> Result<PrecisionRecallCurve> {
    let clf = binary_clf_curve(labels, scores)?;
    let total_tp = clf.total_positives();
    if total_tp == 0.0 {
        return Err(CurveError::NoPositiveSamples);
    }

    // First threshold at which every positive has been recovered.
    let last_ind = clf.tps.partition_point(|&tp| tp < total_tp);

    let mut precision = Vec::with_capacity(last_ind + 2);
    let mut recall = Vec::with_capacity(last_ind + 2);
    let mut thresholds = Vec::with_capacity(last_ind + 1);
    for i in (0..=last_ind).rev() {
        precision.push(clf.tps[i] / (clf.tps[i] + clf.fps[i]));
        recall.push(clf.tps[i] / total_tp);
        thresholds.push(clf.thresholds[i]);
    }
    precision.push(1.0);
    recall.push(0.0);

    Ok(PrecisionRecallCurve {
        precision,
        recall,
        thresholds,
    })
}

/// Compute the ROC curve. Fails when only one class is present.
pub fn roc_curve(labels: &[bool], scores: &[f64]) -> Result<RocCurve> {
    let clf = binary_clf_curve(labels, scores)?;
    let total_tp = clf.total_positives();
    let total_fp = clf.total_negatives();
    if total_tp == 0.0 || total_fp == 0.0 {
        return Err(CurveError::SingleClass {
            class: total_tp > 0.0,
        });
    }

    let fpr = std::iter::once(0.0)
        .chain(clf.fps.iter().map(|fp| fp / total_fp))
        .collect();
    let tpr = std::iter::once(0.0)
        .chain(clf.tps.iter().map(|tp| tp / total_tp))
        .collect();
    let thresholds = std::iter::once(f64::INFINITY)
        .chain(clf.thresholds.iter().copied())
        .collect();

    Ok(RocCurve {
        fpr,
        tpr,
        thresholds,
    })
}

/// Area under the ROC curve, in [0, 1].
pub fn roc_auc_score(labels: &[bool], scores: &[f64]) -> Result<f64> {
    roc_curve(labels, scores)?.area()
}

/// Area under a curve by the trapezoidal rule.
///
/// `x` must be monotone. A non-increasing `x` integrates right to left, so the
/// area comes out positive either way.
pub fn auc(x: &[f64], y: &[f64]) -> Result<f64> {
    if x.len() != y.len() {
        return Err(CurveError::PointCountMismatch {
            x: x.len(),
            y: y.len(),
        });
    }
    if x.len() < 2 {
        return Err(CurveError::TooFewPoints { count: x.len() });
    }

    let mut direction = 1.0;
    if x.windows(2).any(|w| w[1] < w[0]) {
        if x.windows(2).all(|w| w[1] <= w[0]) {
            direction = -1.0;
        } else {
            return Err(CurveError::NotMonotonic);
        }
    }

    let area: f64 = x
        .windows(2)
        .zip(y.windows(2))
        .map(|(xs, ys)| (xs[1] - xs[0]) * (ys[0] + ys[1]) / 2.0)
        .sum();

    Ok(direction * area)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn approx_eq(a: f64, b: f64, tol: f64) -> bool {
        if a.is_nan() || b.is_nan() {
            return false;
        }
        (a - b).abs() <= tol
    }

    #[test]
    fn clf_curve_collapses_ties() {
        let labels = [true, false, true, false];
        let scores = [0.8, 0.8, 0.4, 0.1];
        let curve = binary_clf_curve(&labels, &scores).unwrap();
        assert_eq!(curve.thresholds, vec![0.8, 0.4, 0.1]);
        assert_eq!(curve.tps, vec![1.0, 2.0, 2.0]);
        assert_eq!(curve.fps, vec![1.0, 1.0, 2.0]);
    }

    #[test]
    fn clf_curve_rejects_bad_input() {
        assert_eq!(
            binary_clf_curve(&[true], &[0.1, 0.2]),
            Err(CurveError::LengthMismatch {
                labels: 1,
                scores: 2
            })
        );
        assert_eq!(binary_clf_curve(&[], &[]), Err(CurveError::Empty));
        assert!(matches!(
            binary_clf_curve(&[true, false], &[0.1, f64::NAN]),
            Err(CurveError::NonFiniteScore { index: 1, .. })
        ));
    }

    #[test]
    fn pr_curve_matches_hand_computation() {
        let labels = [false, false, true, true];
        let scores = [0.1, 0.4, 0.35, 0.8];
        let curve = precision_recall_curve(&labels, &scores).unwrap();
        assert_eq!(curve.thresholds, vec![0.35, 0.4, 0.8]);
        let expected_precision = [2.0 / 3.0, 0.5, 1.0, 1.0];
        let expected_recall = [1.0, 0.5, 0.5, 0.0];
        for (got, want) in curve.precision.iter().zip(expected_precision) {
            assert!(approx_eq(*got, want, 1e-12));
        }
        for (got, want) in curve.recall.iter().zip(expected_recall) {
            assert!(approx_eq(*got, want, 1e-12));
        }
    }

    #[test]
    fn pr_curve_ends_with_sentinel() {
        let labels = [true, false, true, false, true];
        let scores = [0.9, 0.7, 0.6, 0.3, 0.2];
        let curve = precision_recall_curve(&labels, &scores).unwrap();
        assert_eq!(curve.precision.last(), Some(&1.0));
        assert_eq!(curve.recall.last(), Some(&0.0));
        assert_eq!(curve.thresholds.len(), curve.len() - 1);
    }

    #[test]
    fn pr_curve_without_positives_fails() {
        let result = precision_recall_curve(&[false, false], &[0.2, 0.7]);
        assert_eq!(result, Err(CurveError::NoPositiveSamples));
    }

    #[test]
    fn roc_auc_perfect_and_inverted() {
        let labels = [true, false, true, false];
        let scores = [0.9, 0.1, 0.8, 0.2];
        assert!(approx_eq(roc_auc_score(&labels, &scores).unwrap(), 1.0, 1e-12));

        let inverted: Vec<f64> = scores.iter().map(|s| 1.0 - s).collect();
        assert!(approx_eq(roc_auc_score(&labels, &inverted).unwrap(), 0.0, 1e-12));
    }

    #[test]
    fn roc_auc_ties_get_half_credit() {
        let labels = [true, false];
        let scores = [0.5, 0.5];
        assert!(approx_eq(roc_auc_score(&labels, &scores).unwrap(), 0.5, 1e-12));
    }

    #[test]
    fn roc_auc_known_value() {
        let labels = [false, false, true, true];
        let scores = [0.1, 0.4, 0.35, 0.8];
        assert!(approx_eq(roc_auc_score(&labels, &scores).unwrap(), 0.75, 1e-12));
    }

    #[test]
    fn roc_single_class_fails() {
        assert_eq!(
            roc_auc_score(&[true, true], &[0.1, 0.9]),
            Err(CurveError::SingleClass { class: true })
        );
        assert_eq!(
            roc_auc_score(&[false, false], &[0.1, 0.9]),
            Err(CurveError::SingleClass { class: false })
        );
    }

    #[test]
    fn auc_either_direction() {
        let x = [0.0, 0.5, 1.0];
        let y = [1.0, 1.0, 1.0];
        assert!(approx_eq(auc(&x, &y).unwrap(), 1.0, 1e-12));

        let rev_x = [1.0, 0.5, 0.0];
        assert!(approx_eq(auc(&rev_x, &y).unwrap(), 1.0, 1e-12));
    }

    #[test]
    fn auc_rejects_bad_shapes() {
        assert_eq!(auc(&[0.0], &[1.0]), Err(CurveError::TooFewPoints { count: 1 }));
        assert_eq!(
            auc(&[0.0, 1.0], &[1.0]),
            Err(CurveError::PointCountMismatch { x: 2, y: 1 })
        );
        assert_eq!(
            auc(&[0.0, 1.0, 0.5], &[1.0, 1.0, 1.0]),
            Err(CurveError::NotMonotonic)
        );
    }
}
