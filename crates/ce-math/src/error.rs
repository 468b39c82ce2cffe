//! Error types for curve computation.

use thiserror::Error;

/// Result type for curve operations.
pub type Result<T> = std::result::Result<T, CurveError>;

/// Errors raised by the curve and area routines.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum CurveError {
    /// Labels and scores differ in length.
    #[error("labels and scores differ in length ({labels} labels, {scores} scores)")]
    LengthMismatch { labels: usize, scores: usize },

    /// No samples were provided.
    #[error("no samples provided")]
    Empty,

    /// A score is NaN or infinite.
    #[error("score at index {index} is not finite ({value})")]
    NonFiniteScore { index: usize, value: f64 },

    /// Only one class is present in the labels.
    #[error("only one class present in labels (all {}); the curve is not defined", class_name(.class))]
    SingleClass { class: bool },

    /// No positive samples, so recall is undefined.
    #[error("no positive samples in labels; recall is not defined")]
    NoPositiveSamples,

    /// The x and y coordinates differ in length.
    #[error("x and y differ in length ({x} vs {y})")]
    PointCountMismatch { x: usize, y: usize },

    /// Too few points to integrate.
    #[error("at least 2 points are needed to compute area under curve, got {count}")]
    TooFewPoints { count: usize },

    /// The x coordinates are neither non-decreasing nor non-increasing.
    #[error("x is neither increasing nor decreasing")]
    NotMonotonic,
}

fn class_name(class: &bool) -> &'static str {
    if *class {
        "positive"
    } else {
        "negative"
    }
}
