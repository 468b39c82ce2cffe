//! Error types for classifier evaluation.
//!
//! Errors fall into three groups:
//! - Usage errors (shape or task-name mismatches, bad thresholds, bad config)
//!   raised immediately and never recovered internally
//! - Degenerate-task errors from the curve routines (e.g. a task with a single
//!   class has no ROC curve), surfaced with the offending task index
//! - Floating-point anomalies, raised only under [`NumericErrorPolicy::Raise`]
//!
//! [`NumericErrorPolicy::Raise`]: crate::numeric::NumericErrorPolicy::Raise

use crate::numeric::NumericIssue;
use ce_math::CurveError;
use thiserror::Error;

/// Result type alias for evaluation operations.
pub type Result<T> = std::result::Result<T, Error>;

/// Unified error type for classifier evaluation.
#[derive(Error, Debug)]
pub enum Error {
    /// A curve or area routine rejected its input.
    #[error(transparent)]
    Curve(#[from] CurveError),

    /// Metric failed for one task of a multi-task evaluation.
    #[error("task {task}: {source}")]
    Task {
        task: usize,
        #[source]
        source: Box<Error>,
    },

    /// Label and prediction vectors differ in length.
    #[error("labels and predictions differ in length ({labels} vs {predictions})")]
    LengthMismatch { labels: usize, predictions: usize },

    /// Label and prediction matrices differ in shape.
    #[error("label matrix shape {labels:?} does not match prediction matrix shape {predictions:?}")]
    ShapeMismatch {
        labels: (usize, usize),
        predictions: (usize, usize),
    },

    /// Task names were supplied but do not cover every task.
    #[error("{names} task names supplied for {tasks} tasks")]
    TaskNameCount { names: usize, tasks: usize },

    /// A threshold that cannot be compared against (NaN).
    #[error("invalid threshold: {0}")]
    InvalidThreshold(f64),

    /// No point on the precision/recall curve reaches the requested precision.
    #[error("no operating point reaches precision {threshold} (best precision on curve: {max_precision})")]
    PrecisionUnreachable { threshold: f64, max_precision: f64 },

    /// Floating-point anomaly under the `raise` numeric error policy.
    #[error("floating point error ({issue}) in {operation}")]
    FloatingPoint {
        issue: NumericIssue,
        operation: &'static str,
    },

    /// Malformed evaluation input document.
    #[error("invalid input: {0}")]
    InvalidInput(String),

    /// Invalid configuration value.
    #[error("invalid configuration: {0}")]
    InvalidConfig(String),

    /// Config file could not be parsed.
    #[error("failed to parse config: {0}")]
    ConfigParse(#[from] toml::de::Error),

    /// Config could not be rendered.
    #[error("failed to render config: {0}")]
    ConfigRender(#[from] toml::ser::Error),

    /// JSON serialization/deserialization error.
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// IO error.
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

impl Error {
    /// Innermost error, looking through task wrappers.
    pub fn root(&self) -> &Error {
        match self {
            Error::Task { source, .. } => source.root(),
            other => other,
        }
    }

    /// Whether the error stems from how the evaluation was invoked rather
    /// than from the data being degenerate.
    pub fn is_usage_error(&self) -> bool {
        matches!(
            self.root(),
            Error::LengthMismatch { .. }
                | Error::ShapeMismatch { .. }
                | Error::TaskNameCount { .. }
                | Error::InvalidThreshold(_)
                | Error::InvalidInput(_)
                | Error::InvalidConfig(_)
                | Error::ConfigParse(_)
                | Error::Json(_)
                | Error::Io(_)
        )
    }
}
