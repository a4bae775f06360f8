//! Support-weighted classification metrics.
//!
//! Per-class precision, recall and F1 are computed from a confusion matrix
//! over the union of ground-truth and predicted labels, then averaged with
//! each class's true support as its weight. A class with no predicted
//! instances has precision 0 by definition, not an error, so a degenerate
//! model still produces a comparable report row.

use std::collections::HashMap;

use crate::error::{EvalError, Result};

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ClassificationMetrics {
    pub accuracy: f64,
    pub precision: f64,
    pub recall: f64,
    pub f1: f64,
}

/// Confusion matrix keyed by string labels. Element `[i][j]` counts rows
/// whose true label is class `i` and predicted label class `j`.
#[derive(Debug, Clone)]
pub struct ConfusionMatrix {
    labels: Vec<String>,
    matrix: Vec<Vec<usize>>,
}

impl ConfusionMatrix {
    pub fn from_labels(truth: &[String], predicted: &[String]) -> Result<Self> {
        if truth.len() != predicted.len() {
            return Err(EvalError::Decode(format!(
                "{} predictions for {} ground-truth rows",
                predicted.len(),
                truth.len()
            )));
        }

        // Truth labels first so support-carrying classes come before
        // predicted-only ones.
        let mut labels: Vec<String> = Vec::new();
        let mut index: HashMap<&str, usize> = HashMap::new();
        for label in truth.iter().chain(predicted.iter()) {
            if !index.contains_key(label.as_str()) {
                index.insert(label.as_str(), labels.len());
                labels.push(label.clone());
            }
        }

        let n = labels.len();
        let mut matrix = vec![vec![0usize; n]; n];
        for (t, p) in truth.iter().zip(predicted.iter()) {
            matrix[index[t.as_str()]][index[p.as_str()]] += 1;
        }

        Ok(Self { labels, matrix })
    }

    pub fn labels(&self) -> &[String] {
        &self.labels
    }

    pub fn true_positives(&self, class: usize) -> usize {
        self.matrix[class][class]
    }

    pub fn false_positives(&self, class: usize) -> usize {
        (0..self.labels.len())
            .filter(|&i| i != class)
            .map(|i| self.matrix[i][class])
            .sum()
    }

    pub fn false_negatives(&self, class: usize) -> usize {
        (0..self.labels.len())
            .filter(|&j| j != class)
            .map(|j| self.matrix[class][j])
            .sum()
    }

    /// Number of ground-truth rows in this class.
    pub fn support(&self, class: usize) -> usize {
        self.matrix[class].iter().sum()
    }

    pub fn total(&self) -> usize {
        self.matrix.iter().flatten().sum()
    }

    pub fn accuracy(&self) -> f64 {
        let total = self.total();
        if total == 0 {
            return 0.0;
        }
        let correct: usize = (0..self.labels.len()).map(|i| self.matrix[i][i]).sum();
        correct as f64 / total as f64
    }
}

/// Accuracy plus support-weighted precision/recall/F1.
pub fn weighted_metrics(truth: &[String], predicted: &[String]) -> Result<ClassificationMetrics> {
    let cm = ConfusionMatrix::from_labels(truth, predicted)?;
    let n = cm.labels().len();

    let mut precision_sum = 0.0;
    let mut recall_sum = 0.0;
    let mut f1_sum = 0.0;
    let mut total_support = 0usize;

    for class in 0..n {
        let tp = cm.true_positives(class) as f64;
        let fp = cm.false_positives(class) as f64;
        let fn_ = cm.false_negatives(class) as f64;
        let support = cm.support(class);

        let p = if tp + fp > 0.0 { tp / (tp + fp) } else { 0.0 };
        let r = if tp + fn_ > 0.0 { tp / (tp + fn_) } else { 0.0 };
        let f = if p + r > 0.0 {
            2.0 * p * r / (p + r)
        } else {
            0.0
        };

        precision_sum += p * support as f64;
        recall_sum += r * support as f64;
        f1_sum += f * support as f64;
        total_support += support;
    }

    let norm = if total_support > 0 {
        total_support as f64
    } else {
        1.0
    };

    Ok(ClassificationMetrics {
        accuracy: cm.accuracy(),
        precision: precision_sum / norm,
        recall: recall_sum / norm,
        f1: f1_sum / norm,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn labels(counts: &[(&str, usize)]) -> Vec<String> {
        counts.iter()
            .flat_map(|(label, count)| std::iter::repeat(label.to_string()).take(*count))
            .collect()
    }

    #[test]
    fn test_perfect_predictions() {
        let truth = labels(&[("A", 3), ("B", 2)]);
        let m = weighted_metrics(&truth, &truth).unwrap();
        assert_eq!(m.accuracy, 1.0);
        assert_eq!(m.precision, 1.0);
        assert_eq!(m.recall, 1.0);
        assert_eq!(m.f1, 1.0);
    }

    #[test]
    fn test_degenerate_all_one_class() {
        // {A: 50, B: 30, C: 20}, model predicts A everywhere. B and C have
        // zero predicted instances and contribute zero precision.
        let truth = labels(&[("A", 50), ("B", 30), ("C", 20)]);
        let predicted = labels(&[("A", 100)]);
        let m = weighted_metrics(&truth, &predicted).unwrap();

        assert!((m.accuracy - 0.5).abs() < 1e-12);
        // precision: A = 50/100 weighted 0.5; B, C = 0.
        assert!((m.precision - 0.25).abs() < 1e-12);
        // recall: A = 1.0 weighted 0.5; B, C = 0.
        assert!((m.recall - 0.5).abs() < 1e-12);
        // f1(A) = 2 * 0.5 * 1.0 / 1.5 = 2/3, weighted 0.5.
        assert!((m.f1 - 1.0 / 3.0).abs() < 1e-12);
    }

    #[test]
    fn test_predicted_only_class_has_no_weight() {
        // "D" never appears in truth, so its precision (0 here anyway) gets
        // zero weight and the averages only reflect true classes.
        let truth = labels(&[("A", 2), ("B", 2)]);
        let predicted = vec!["A".into(), "D".into(), "B".into(), "B".into()];
        let m = weighted_metrics(&truth, &predicted).unwrap();
        assert!((m.accuracy - 0.75).abs() < 1e-12);
        // A: p=1, r=0.5; B: p=1, r=1; D: support 0.
        assert!((m.precision - 1.0).abs() < 1e-12);
        assert!((m.recall - 0.75).abs() < 1e-12);
        assert!((m.f1 - 5.0 / 6.0).abs() < 1e-12);
    }

    #[test]
    fn test_length_mismatch_is_error() {
        let truth = labels(&[("A", 3)]);
        let predicted = labels(&[("A", 2)]);
        assert!(weighted_metrics(&truth, &predicted).is_err());
    }

    #[test]
    fn test_confusion_matrix_counts() {
        let truth = vec!["A".to_string(), "A".into(), "B".into()];
        let predicted = vec!["A".to_string(), "B".into(), "B".into()];
        let cm = ConfusionMatrix::from_labels(&truth, &predicted).unwrap();
        assert_eq!(cm.labels(), &["A", "B"]);
        assert_eq!(cm.true_positives(0), 1);
        assert_eq!(cm.false_negatives(0), 1);
        assert_eq!(cm.false_positives(1), 1);
        assert_eq!(cm.support(0), 2);
        assert_eq!(cm.total(), 3);
    }

    #[test]
    fn test_empty_inputs() {
        let m = weighted_metrics(&[], &[]).unwrap();
        assert_eq!(m.accuracy, 0.0);
        assert_eq!(m.precision, 0.0);
    }
}
