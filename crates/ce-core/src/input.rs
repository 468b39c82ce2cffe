//! JSON evaluation input document.
//!
//! ```json
//! {
//!   "labels":      [[true, false], [false, true]],
//!   "predictions": [[0.9, 0.2],    [0.3, 0.8]],
//!   "task_names":  ["promoter", "enhancer"]
//! }
//! ```
//!
//! Rows are examples and columns are tasks. Labels must be JSON booleans; a
//! numeric 0/1 label is rejected at parse time.

use crate::error::{Error, Result};
use crate::result::ClassificationResult;
use ndarray::Array2;
use serde::{Deserialize, Serialize};
use std::io::Read;
use std::path::Path;

/// Labels, predictions and optional task names for one evaluation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct EvaluationInput {
    pub labels: Vec<Vec<bool>>,
    pub predictions: Vec<Vec<f64>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub task_names: Option<Vec<String>>,
}

impl EvaluationInput {
    pub fn from_json_str(content: &str) -> Result<Self> {
        Ok(serde_json::from_str(content)?)
    }

    /// Read a document from `path`, or from stdin when `path` is `-`.
    pub fn load(path: &Path) -> Result<Self> {
        let content = if path == Path::new("-") {
            let mut buf = String::new();
            std::io::stdin().read_to_string(&mut buf)?;
            buf
        } else {
            std::fs::read_to_string(path)?
        };
        Self::from_json_str(&content)
    }

    /// Labels as an `(examples, tasks)` matrix.
    pub fn label_matrix(&self) -> Result<Array2<bool>> {
        to_matrix(&self.labels, "labels")
    }

    /// Predictions as an `(examples, tasks)` matrix.
    pub fn prediction_matrix(&self) -> Result<Array2<f64>> {
        to_matrix(&self.predictions, "predictions")
    }

    /// Evaluate every task at `threshold`.
    pub fn evaluate(&self, threshold: f64) -> Result<ClassificationResult> {
        let labels = self.label_matrix()?;
        let predictions = self.prediction_matrix()?;
        ClassificationResult::with_threshold(
            labels.view(),
            predictions.view(),
            self.task_names.clone(),
            threshold,
        )
    }
}

fn to_matrix<T: Clone>(rows: &[Vec<T>], what: &str) -> Result<Array2<T>> {
    let width = rows.first().map_or(0, Vec::len);
    if let Some((index, row)) = rows.iter().enumerate().find(|(_, row)| row.len() != width) {
        return Err(Error::InvalidInput(format!(
            "{} row {} has {} columns, expected {}",
            what,
            index,
            row.len(),
            width
        )));
    }
    let flat: Vec<T> = rows.iter().flatten().cloned().collect();
    Array2::from_shape_vec((rows.len(), width), flat)
        .map_err(|e| Error::InvalidInput(format!("{}: {}", what, e)))
}
