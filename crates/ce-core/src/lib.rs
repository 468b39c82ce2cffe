//! Binary classifier evaluation.
//!
//! Scores one or more independent binary prediction tasks against boolean
//! ground truth and produces a fixed set of summary statistics per task:
//! balanced accuracy, auROC, auPRC, auPRG, recall at 5%/10%/20% false
//! discovery rate, and the class counts.
//!
//! # Example
//!
//! ```
//! use ce_core::ClassificationResult;
//! use ndarray::array;
//!
//! let labels = array![[true], [false], [true], [false]];
//! let predictions = array![[0.9], [0.1], [0.8], [0.2]];
//! let result = ClassificationResult::new(labels.view(), predictions.view(), None)?;
//!
//! assert_eq!(result[0].num_positives, 2);
//! assert_eq!(result[0].balanced_accuracy, 100.0);
//! println!("{result}");
//! # Ok::<(), ce_core::Error>(())
//! ```
//!
//! Degenerate tasks produce NaN accuracies; see [`numeric`] for how those are
//! reported and how to silence them for a scope.

pub mod config;
pub mod error;
pub mod input;
pub mod logging;
pub mod metrics;
pub mod numeric;
pub mod result;

pub use config::{load_config, ConfigSource, EvalConfig, OutputFormat, ResolvedConfig};
pub use error::{Error, Result};
pub use input::EvaluationInput;
pub use metrics::{
    auprc, auprg, auroc, balanced_accuracy, negative_accuracy, positive_accuracy,
    recall_at_precision_threshold, DEFAULT_THRESHOLD, FDR_PRECISION_THRESHOLDS,
};
pub use numeric::{
    numeric_error_policy, set_numeric_error_policy, NumericErrorPolicy, NumericErrorScope,
    NumericIssue,
};
pub use result::{ClassificationResult, MetricRecord, MetricValue};
