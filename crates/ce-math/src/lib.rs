//! Curve and area primitives for binary classifier evaluation.
//!
//! Every routine takes a boolean ground-truth vector and a score vector of the
//! same length, where a higher score means "more positive".
//!
//! - [`binary_clf_curve`]: cumulative true/false positives per distinct score
//! - [`precision_recall_curve`], [`roc_curve`], [`roc_auc_score`]
//! - [`auc`]: trapezoidal area under a monotone curve
//! - [`create_prg_curve`], [`calc_auprg`]: precision-recall-gain curve and area

pub mod curve;
pub mod error;
pub mod prg;

pub use curve::{
    auc, binary_clf_curve, precision_recall_curve, roc_auc_score, roc_curve, ClfCurve,
    PrecisionRecallCurve, RocCurve,
};
pub use error::{CurveError, Result};
pub use prg::{calc_auprg, create_prg_curve, precision_gain, recall_gain, PrgCurve, PrgPoint};
