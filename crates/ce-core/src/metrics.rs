//! Per-task metric functions.
//!
//! Each function maps one task's `(labels, predictions)` to a scalar. Accuracy
//! metrics are percentages; area metrics are fractions in [0, 1]; recall at a
//! fixed false-discovery rate is a percentage.

use crate::error::{Error, Result};
use crate::numeric::{check_numeric, NumericIssue};
use ce_math::{auc, calc_auprg, create_prg_curve, precision_recall_curve, roc_auc_score};

/// Decision threshold for the accuracy metrics.
pub const DEFAULT_THRESHOLD: f64 = 0.5;

/// Precision targets for the reported operating points (5%, 10%, 20% FDR).
pub const FDR_PRECISION_THRESHOLDS: [f64; 3] = [0.95, 0.90, 0.80];

fn check_lengths(labels: &[bool], predictions: &[f64]) -> Result<()> {
    if labels.len() != predictions.len() {
        return Err(Error::LengthMismatch {
            labels: labels.len(),
            predictions: predictions.len(),
        });
    }
    Ok(())
}

/// `100 * hits / total`; NaN for an empty selection.
fn percent(hits: usize, total: usize, operation: &'static str) -> Result<f64> {
    if total == 0 {
        check_numeric(NumericIssue::InvalidValue, operation)?;
        return Ok(f64::NAN);
    }
    Ok(100.0 * hits as f64 / total as f64)
}

/// Percentage of positive examples predicted strictly above `threshold`.
///
/// NaN when the task has no positive examples.
pub fn positive_accuracy(labels: &[bool], predictions: &[f64], threshold: f64) -> Result<f64> {
    check_lengths(labels, predictions)?;
    let (hits, total) = labels
        .iter()
        .zip(predictions)
        .filter(|(&label, _)| label)
        .fold((0, 0), |(hits, total), (_, &p)| {
            (hits + usize::from(p > threshold), total + 1)
        });
    percent(hits, total, "positive_accuracy")
}

/// Percentage of negative examples predicted strictly below `threshold`.
///
/// NaN when the task has no negative examples.
pub fn negative_accuracy(labels: &[bool], predictions: &[f64], threshold: f64) -> Result<f64> {
    check_lengths(labels, predictions)?;
    let (hits, total) = labels
        .iter()
        .zip(predictions)
        .filter(|(&label, _)| !label)
        .fold((0, 0), |(hits, total), (_, &p)| {
            (hits + usize::from(p < threshold), total + 1)
        });
    percent(hits, total, "negative_accuracy")
}

/// Mean of [`positive_accuracy`] and [`negative_accuracy`].
pub fn balanced_accuracy(labels: &[bool], predictions: &[f64], threshold: f64) -> Result<f64> {
    let positive = positive_accuracy(labels, predictions, threshold)?;
    let negative = negative_accuracy(labels, predictions, threshold)?;
    Ok((positive + negative) / 2.0)
}

/// Area under the ROC curve. Fails if only one class is present.
pub fn auroc(labels: &[bool], predictions: &[f64]) -> Result<f64> {
    check_lengths(labels, predictions)?;
    Ok(roc_auc_score(labels, predictions)?)
}

/// Area under the precision/recall curve, recall on the x-axis.
pub fn auprc(labels: &[bool], predictions: &[f64]) -> Result<f64> {
    check_lengths(labels, predictions)?;
    let curve = precision_recall_curve(labels, predictions)?;
    Ok(auc(&curve.recall, &curve.precision)?)
}

/// Area under the precision-recall-gain curve.
pub fn auprg(labels: &[bool], predictions: &[f64]) -> Result<f64> {
    check_lengths(labels, predictions)?;
    let curve = create_prg_curve(labels, predictions)?;
    Ok(calc_auprg(&curve))
}

/// Left insertion point of `key` in `values` by bisection.
///
/// `values` need not be sorted; the result is then fixed by the probe
/// sequence `mid = lo + (hi - lo) / 2`. For any input, a larger `key` never
/// yields a smaller index.
fn search_sorted_left(values: &[f64], key: f64) -> usize {
    let (mut lo, mut hi) = (0, values.len());
    while lo < hi {
        let mid = lo + (hi - lo) / 2;
        if values[mid] < key {
            lo = mid + 1;
        } else {
            hi = mid;
        }
    }
    lo
}

/// Recall (percent) at the insertion point of `precision_threshold` in the
/// curve's precision sequence.
///
/// The curve is ordered by increasing decision threshold and its precision
/// is not monotone in general, so the point is located by bisection over
/// `precision - precision_threshold` rather than by a scan. Recall is
/// non-increasing along the curve and the insertion point never moves left as
/// the bar rises, so the result is non-increasing in `precision_threshold`.
///
/// Fails with [`Error::PrecisionUnreachable`] when the insertion point is past
/// the last point, which happens only for targets above 1 since the curve
/// ends at precision 1.
pub fn recall_at_precision_threshold(
    labels: &[bool],
    predictions: &[f64],
    precision_threshold: f64,
) -> Result<f64> {
    if precision_threshold.is_nan() {
        return Err(Error::InvalidThreshold(precision_threshold));
    }
    check_lengths(labels, predictions)?;
    let curve = precision_recall_curve(labels, predictions)?;

    let shifted: Vec<f64> = curve
        .precision
        .iter()
        .map(|&p| p - precision_threshold)
        .collect();
    let index = search_sorted_left(&shifted, 0.0);
    match curve.recall.get(index) {
        Some(&recall) => Ok(100.0 * recall),
        None => Err(Error::PrecisionUnreachable {
            threshold: precision_threshold,
            max_precision: curve
                .precision
                .iter()
                .copied()
                .fold(f64::NEG_INFINITY, f64::max),
        }),
    }
}
