//! Per-task metric records and the multi-task text report.

use crate::error::{Error, Result};
use crate::metrics::{
    auprc, auprg, auroc, balanced_accuracy, recall_at_precision_threshold, DEFAULT_THRESHOLD,
    FDR_PRECISION_THRESHOLDS,
};
use ndarray::ArrayView2;
use serde::Serialize;
use std::fmt;
use std::ops::Index;

/// A single metric value: a score or an example count.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
#[serde(untagged)]
pub enum MetricValue {
    Float(f64),
    Count(usize),
}

impl MetricValue {
    pub fn as_f64(&self) -> f64 {
        match *self {
            MetricValue::Float(v) => v,
            MetricValue::Count(n) => n as f64,
        }
    }
}

impl fmt::Display for MetricValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            MetricValue::Float(v) => write!(f, "{}", v),
            MetricValue::Count(n) => write!(f, "{}", n),
        }
    }
}

/// Metrics for one task, in report order.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct MetricRecord {
    #[serde(rename = "Balanced accuracy")]
    pub balanced_accuracy: f64,
    #[serde(rename = "auROC")]
    pub auroc: f64,
    #[serde(rename = "auPRC")]
    pub auprc: f64,
    #[serde(rename = "auPRG")]
    pub auprg: f64,
    #[serde(rename = "Recall at 5% FDR")]
    pub recall_at_5_fdr: f64,
    #[serde(rename = "Recall at 10% FDR")]
    pub recall_at_10_fdr: f64,
    #[serde(rename = "Recall at 20% FDR")]
    pub recall_at_20_fdr: f64,
    #[serde(rename = "Num Positives")]
    pub num_positives: usize,
    #[serde(rename = "Num Negatives")]
    pub num_negatives: usize,
}

impl MetricRecord {
    /// Metric names in report order.
    pub const NAMES: [&'static str; 9] = [
        "Balanced accuracy",
        "auROC",
        "auPRC",
        "auPRG",
        "Recall at 5% FDR",
        "Recall at 10% FDR",
        "Recall at 20% FDR",
        "Num Positives",
        "Num Negatives",
    ];

    /// Compute every metric for one task.
    pub fn compute(labels: &[bool], predictions: &[f64], threshold: f64) -> Result<Self> {
        let [fdr_5, fdr_10, fdr_20] = FDR_PRECISION_THRESHOLDS;
        let num_positives = labels.iter().filter(|&&label| label).count();

        Ok(MetricRecord {
            balanced_accuracy: balanced_accuracy(labels, predictions, threshold)?,
            auroc: auroc(labels, predictions)?,
            auprc: auprc(labels, predictions)?,
            auprg: auprg(labels, predictions)?,
            recall_at_5_fdr: recall_at_precision_threshold(labels, predictions, fdr_5)?,
            recall_at_10_fdr: recall_at_precision_threshold(labels, predictions, fdr_10)?,
            recall_at_20_fdr: recall_at_precision_threshold(labels, predictions, fdr_20)?,
            num_positives,
            num_negatives: labels.len() - num_positives,
        })
    }

    /// `(name, value)` pairs in report order.
    pub fn entries(&self) -> [(&'static str, MetricValue); 9] {
        let values = [
            MetricValue::Float(self.balanced_accuracy),
            MetricValue::Float(self.auroc),
            MetricValue::Float(self.auprc),
            MetricValue::Float(self.auprg),
            MetricValue::Float(self.recall_at_5_fdr),
            MetricValue::Float(self.recall_at_10_fdr),
            MetricValue::Float(self.recall_at_20_fdr),
            MetricValue::Count(self.num_positives),
            MetricValue::Count(self.num_negatives),
        ];
        std::array::from_fn(|i| (Self::NAMES[i], values[i]))
    }

    /// Look up a metric by its report name.
    pub fn get(&self, name: &str) -> Option<MetricValue> {
        self.entries()
            .into_iter()
            .find(|(metric, _)| *metric == name)
            .map(|(_, value)| value)
    }
}

/// Fixed-precision float rendering with `nan`/`inf` spelled in lowercase.
struct Fixed(f64, usize);

impl fmt::Display for Fixed {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let Fixed(value, precision) = *self;
        if value.is_nan() {
            f.write_str("nan")
        } else if value.is_infinite() {
            f.write_str(if value > 0.0 { "inf" } else { "-inf" })
        } else {
            write!(f, "{:.*}", precision, value)
        }
    }
}

/// Metrics for every task of a label/prediction matrix pair.
///
/// Built once from complete inputs and immutable afterwards. Index with a
/// task number to get its [`MetricRecord`]; format with `{}` for the report.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ClassificationResult {
    #[serde(rename = "tasks")]
    results: Vec<MetricRecord>,
    task_names: Option<Vec<String>>,
    multitask: bool,
}

impl ClassificationResult {
    /// Evaluate every task (column) at the default accuracy threshold.
    ///
    /// `labels` and `predictions` are `(examples, tasks)` matrices of the same
    /// shape. `task_names`, when given, must name every task.
    pub fn new(
        labels: ArrayView2<'_, bool>,
        predictions: ArrayView2<'_, f64>,
        task_names: Option<Vec<String>>,
    ) -> Result<Self> {
        Self::with_threshold(labels, predictions, task_names, DEFAULT_THRESHOLD)
    }

    /// Evaluate every task with a caller-chosen accuracy threshold.
    pub fn with_threshold(
        labels: ArrayView2<'_, bool>,
        predictions: ArrayView2<'_, f64>,
        task_names: Option<Vec<String>>,
        threshold: f64,
    ) -> Result<Self> {
        if labels.dim() != predictions.dim() {
            return Err(Error::ShapeMismatch {
                labels: labels.dim(),
                predictions: predictions.dim(),
            });
        }
        let (examples, tasks) = labels.dim();
        if let Some(names) = &task_names {
            if names.len() != tasks {
                return Err(Error::TaskNameCount {
                    names: names.len(),
                    tasks,
                });
            }
        }

        let _span = tracing::debug_span!("classification_result", examples, tasks).entered();

        let results = labels
            .columns()
            .into_iter()
            .zip(predictions.columns())
            .enumerate()
            .map(|(task, (task_labels, task_predictions))| {
                let task_labels = task_labels.to_vec();
                let task_predictions = task_predictions.to_vec();
                let record = MetricRecord::compute(&task_labels, &task_predictions, threshold)
                    .map_err(|source| Error::Task {
                        task,
                        source: Box::new(source),
                    })?;
                tracing::debug!(
                    task,
                    positives = record.num_positives,
                    negatives = record.num_negatives,
                    auroc = record.auroc,
                    "evaluated task"
                );
                Ok(record)
            })
            .collect::<Result<Vec<_>>>()?;

        Ok(ClassificationResult {
            results,
            task_names,
            multitask: tasks > 1,
        })
    }

    /// Number of tasks.
    pub fn len(&self) -> usize {
        self.results.len()
    }

    pub fn is_empty(&self) -> bool {
        self.results.is_empty()
    }

    pub fn is_multitask(&self) -> bool {
        self.multitask
    }

    pub fn task_names(&self) -> Option<&[String]> {
        self.task_names.as_deref()
    }

    /// Record for task `index`, or `None` if out of range.
    pub fn get(&self, index: usize) -> Option<&MetricRecord> {
        self.results.get(index)
    }

    pub fn records(&self) -> &[MetricRecord] {
        &self.results
    }

    pub fn iter(&self) -> std::slice::Iter<'_, MetricRecord> {
        self.results.iter()
    }

    /// Display label for a task: its name if names were given, else its index.
    pub fn task_label(&self, index: usize) -> String {
        match self.task_names.as_ref().and_then(|names| names.get(index)) {
            Some(name) => name.clone(),
            None => index.to_string(),
        }
    }
}

impl Index<usize> for ClassificationResult {
    type Output = MetricRecord;

    fn index(&self, index: usize) -> &MetricRecord {
        &self.results[index]
    }
}

impl<'a> IntoIterator for &'a ClassificationResult {
    type Item = &'a MetricRecord;
    type IntoIter = std::slice::Iter<'a, MetricRecord>;

    fn into_iter(self) -> Self::IntoIter {
        self.results.iter()
    }
}

impl fmt::Display for ClassificationResult {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (task_index, record) in self.results.iter().enumerate() {
            if task_index > 0 {
                f.write_str("\n")?;
            }
            if self.multitask {
                write!(f, "Task {}: ", self.task_label(task_index))?;
            }
            write!(
                f,
                "Balanced Accuracy: {}%\t auROC: {}\t auPRC: {}\t auPRG: {}\n\
                 Recall at 5%|10%|20% FDR: {}%|{}%|{}%\t \
                 Num Positives: {}\t Num Negatives: {}\t ",
                Fixed(record.balanced_accuracy, 2),
                Fixed(record.auroc, 3),
                Fixed(record.auprc, 3),
                Fixed(record.auprg, 3),
                Fixed(record.recall_at_5_fdr, 1),
                Fixed(record.recall_at_10_fdr, 1),
                Fixed(record.recall_at_20_fdr, 1),
                record.num_positives,
                record.num_negatives,
            )?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use ndarray::{array, Array2};

    fn two_task_inputs() -> (Array2<bool>, Array2<f64>) {
        let labels = array![
            [true, false],
            [false, true],
            [true, true],
            [false, false],
            [true, false],
        ];
        let predictions = array![
            [0.9, 0.2],
            [0.1, 0.7],
            [0.8, 0.4],
            [0.3, 0.6],
            [0.4, 0.1],
        ];
        (labels, predictions)
    }

    #[test]
    fn example_from_four_rows() {
        let labels = array![[true], [false], [true], [false]];
        let predictions = array![[0.9], [0.1], [0.8], [0.2]];
        let result = ClassificationResult::new(labels.view(), predictions.view(), None).unwrap();
        assert_eq!(result.len(), 1);
        assert!(!result.is_multitask());
        assert_eq!(result[0].num_positives, 2);
        assert_eq!(result[0].num_negatives, 2);
        assert_eq!(result[0].balanced_accuracy, 100.0);
        assert!((result[0].auroc - 1.0).abs() < 1e-12);
    }

    #[test]
    fn single_task_report_has_no_prefix() {
        let labels = array![[true], [false], [true], [false]];
        let predictions = array![[0.9], [0.1], [0.8], [0.2]];
        let result = ClassificationResult::new(labels.view(), predictions.view(), None).unwrap();
        let report = result.to_string();
        assert_eq!(
            report,
            "Balanced Accuracy: 100.00%\t auROC: 1.000\t auPRC: 1.000\t auPRG: 1.000\n\
             Recall at 5%|10%|20% FDR: 100.0%|100.0%|100.0%\t \
             Num Positives: 2\t Num Negatives: 2\t "
        );
        assert!(!report.contains("Task"));
    }

    #[test]
    fn fdr_recalls_on_non_monotone_precision() {
        // Two negatives outrank ten positives. Precision along the curve is
        // [10/12, 9/11, ..., 1/3, 0, 0, 1]: full recall already has precision
        // above 0.8, but bisection lands on the final point for all three bars.
        let mut labels = vec![false, false];
        labels.extend([true; 10]);
        let predictions = [
            0.99, 0.98, 0.9, 0.85, 0.8, 0.75, 0.7, 0.65, 0.6, 0.55, 0.52, 0.51,
        ];
        let labels = Array2::from_shape_vec((12, 1), labels).unwrap();
        let predictions = Array2::from_shape_vec((12, 1), predictions.to_vec()).unwrap();
        let result = ClassificationResult::new(labels.view(), predictions.view(), None).unwrap();

        assert_eq!(result[0].recall_at_20_fdr, 0.0);
        let report = result.to_string();
        assert_eq!(
            report.lines().nth(1),
            Some("Recall at 5%|10%|20% FDR: 0.0%|0.0%|0.0%\t Num Positives: 10\t Num Negatives: 2\t ")
        );
    }

    #[test]
    fn multitask_report_uses_names() {
        let (labels, predictions) = two_task_inputs();
        let names = vec!["A".to_string(), "B".to_string()];
        let result =
            ClassificationResult::new(labels.view(), predictions.view(), Some(names)).unwrap();
        assert!(result.is_multitask());
        let report = result.to_string();
        let task_lines: Vec<&str> = report.lines().filter(|l| l.starts_with("Task ")).collect();
        assert_eq!(task_lines.len(), 2);
        assert!(task_lines[0].starts_with("Task A: Balanced Accuracy: "));
        assert!(task_lines[1].starts_with("Task B: Balanced Accuracy: "));
    }

    #[test]
    fn multitask_report_falls_back_to_indices() {
        let (labels, predictions) = two_task_inputs();
        let result = ClassificationResult::new(labels.view(), predictions.view(), None).unwrap();
        let report = result.to_string();
        assert!(report.starts_with("Task 0: "));
        assert!(report.contains("\nTask 1: "));
        assert_eq!(report.lines().count(), 4);
    }

    #[test]
    fn counts_cover_every_example() {
        let (labels, predictions) = two_task_inputs();
        let result = ClassificationResult::new(labels.view(), predictions.view(), None).unwrap();
        for record in &result {
            assert_eq!(record.num_positives + record.num_negatives, 5);
        }
        assert_eq!(result[0].num_positives, 3);
        assert_eq!(result[1].num_positives, 2);
    }

    #[test]
    fn shape_mismatch_rejected() {
        let labels = array![[true], [false]];
        let predictions = array![[0.9, 0.1], [0.1, 0.9]];
        let err = ClassificationResult::new(labels.view(), predictions.view(), None).unwrap_err();
        assert!(matches!(
            err,
            Error::ShapeMismatch {
                labels: (2, 1),
                predictions: (2, 2)
            }
        ));
    }

    #[test]
    fn task_name_count_rejected() {
        let (labels, predictions) = two_task_inputs();
        let names = vec!["only-one".to_string()];
        let err =
            ClassificationResult::new(labels.view(), predictions.view(), Some(names)).unwrap_err();
        assert!(matches!(err, Error::TaskNameCount { names: 1, tasks: 2 }));
    }

    #[test]
    fn single_class_task_fails_with_index() {
        let _quiet = crate::numeric::NumericErrorScope::ignore();
        let labels = array![[true, true], [false, true], [true, true]];
        let predictions = array![[0.9, 0.8], [0.2, 0.7], [0.6, 0.9]];
        let err = ClassificationResult::new(labels.view(), predictions.view(), None).unwrap_err();
        match err {
            Error::Task { task, source } => {
                assert_eq!(task, 1);
                assert!(matches!(*source, Error::Curve(_)));
            }
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn get_out_of_range_is_none() {
        let (labels, predictions) = two_task_inputs();
        let result = ClassificationResult::new(labels.view(), predictions.view(), None).unwrap();
        assert!(result.get(1).is_some());
        assert!(result.get(2).is_none());
    }

    #[test]
    #[should_panic]
    fn index_out_of_range_panics() {
        let (labels, predictions) = two_task_inputs();
        let result = ClassificationResult::new(labels.view(), predictions.view(), None).unwrap();
        let _ = result[2];
    }

    #[test]
    fn entries_follow_report_order() {
        let labels = array![[true], [false], [true], [false]];
        let predictions = array![[0.9], [0.1], [0.8], [0.2]];
        let result = ClassificationResult::new(labels.view(), predictions.view(), None).unwrap();
        let names: Vec<&str> = result[0].entries().iter().map(|(name, _)| *name).collect();
        assert_eq!(names, MetricRecord::NAMES);
        assert_eq!(result[0].get("Num Positives"), Some(MetricValue::Count(2)));
        assert_eq!(result[0].get("auROC").map(|v| v.as_f64()), Some(1.0));
        assert_eq!(result[0].get("F1"), None);
    }

    #[test]
    fn non_finite_values_render_lowercase() {
        assert_eq!(Fixed(f64::NAN, 2).to_string(), "nan");
        assert_eq!(Fixed(f64::INFINITY, 3).to_string(), "inf");
        assert_eq!(Fixed(f64::NEG_INFINITY, 1).to_string(), "-inf");
        assert_eq!(Fixed(66.666_666, 2).to_string(), "66.67");
        assert_eq!(Fixed(0.5, 3).to_string(), "0.500");
    }

    #[test]
    fn json_uses_report_names() {
        let labels = array![[true], [false], [true], [false]];
        let predictions = array![[0.9], [0.1], [0.8], [0.2]];
        let result = ClassificationResult::new(labels.view(), predictions.view(), None).unwrap();
        let value = serde_json::to_value(&result).unwrap();
        assert_eq!(value["tasks"][0]["Num Negatives"], 2);
        assert_eq!(value["tasks"][0]["Balanced accuracy"], 100.0);
        assert_eq!(value["multitask"], false);
    }
}
