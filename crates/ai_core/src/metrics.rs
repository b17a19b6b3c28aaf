//! Classification metrics for held-out evaluation

use serde::{Deserialize, Serialize};

/// Precision, recall and F1 for one class
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ClassMetrics {
    pub precision: f64,
    pub recall: f64,
    pub f1_score: f64,
    pub support: usize,
}

/// Per-class metrics plus macro and support-weighted averages
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ClassificationReport {
    pub classes: Vec<String>,
    pub per_class: Vec<ClassMetrics>,
    pub macro_avg: ClassMetrics,
    pub weighted_avg: ClassMetrics,
}

impl ClassificationReport {
    pub fn class(&self, label: &str) -> Option<&ClassMetrics> {
        self.classes
            .iter()
            .position(|c| c == label)
            .and_then(|i| self.per_class.get(i))
    }
}

/// Everything computed from one held-out evaluation
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EvaluationMetrics {
    pub accuracy: f64,
    /// Row = true class, column = predicted class
    pub confusion_matrix: Vec<Vec<usize>>,
    pub report: ClassificationReport,
    pub y_true: Vec<usize>,
    pub y_pred: Vec<usize>,
}

impl EvaluationMetrics {
    /// Compute metrics for encoded labels; `classes` fixes matrix order and size
    pub fn compute(y_true: Vec<usize>, y_pred: Vec<usize>, classes: &[String]) -> Self {
        let confusion_matrix = confusion_matrix(&y_true, &y_pred, classes.len());
        let report = classification_report(&confusion_matrix, classes);
        Self {
            accuracy: accuracy(&y_true, &y_pred),
            confusion_matrix,
            report,
            y_true,
            y_pred,
        }
    }

    pub fn classes(&self) -> &[String] {
        &self.report.classes
    }

    pub fn test_size(&self) -> usize {
        self.y_true.len()
    }

    /// Held-out labels decoded back to class names
    pub fn true_labels(&self) -> Vec<&str> {
        self.decode(&self.y_true)
    }

    pub fn predicted_labels(&self) -> Vec<&str> {
        self.decode(&self.y_pred)
    }

    fn decode(&self, codes: &[usize]) -> Vec<&str> {
        codes
            .iter()
            .filter_map(|&c| self.report.classes.get(c).map(String::as_str))
            .collect()
    }
}

/// Fraction of matching positions; 0 for empty input
pub fn accuracy(y_true: &[usize], y_pred: &[usize]) -> f64 {
    if y_true.is_empty() {
        return 0.0;
    }
    let correct = y_true
        .iter()
        .zip(y_pred)
        .filter(|(t, p)| t == p)
        .count();
    correct as f64 / y_true.len() as f64
}

/// `n_classes x n_classes` counts; out-of-range labels are ignored
pub fn confusion_matrix(y_true: &[usize], y_pred: &[usize], n_classes: usize) -> Vec<Vec<usize>> {
    let mut matrix = vec![vec![0usize; n_classes]; n_classes];
    for (&t, &p) in y_true.iter().zip(y_pred) {
        if t < n_classes && p < n_classes {
            matrix[t][p] += 1;
        }
    }
    matrix
}

fn ratio(num: usize, den: usize) -> f64 {
    if den == 0 {
        0.0
    } else {
        num as f64 / den as f64
    }
}

fn f1(precision: f64, recall: f64) -> f64 {
    if precision + recall == 0.0 {
        0.0
    } else {
        2.0 * precision * recall / (precision + recall)
    }
}

/// Per-class report from a confusion matrix
///
/// Averages only cover classes that occur in either the true or the
/// predicted labels.
pub fn classification_report(matrix: &[Vec<usize>], classes: &[String]) -> ClassificationReport {
    let n = classes.len();
    let mut per_class = Vec::with_capacity(n);
    let mut present = Vec::with_capacity(n);

    for k in 0..n {
        let tp = matrix[k][k];
        let support: usize = matrix[k].iter().sum();
        let predicted: usize = matrix.iter().map(|row| row[k]).sum();
        let precision = ratio(tp, predicted);
        let recall = ratio(tp, support);
        per_class.push(ClassMetrics {
            precision,
            recall,
            f1_score: f1(precision, recall),
            support,
        });
        present.push(support > 0 || predicted > 0);
    }

    let total_support: usize = per_class.iter().map(|m| m.support).sum();
    let counted: Vec<&ClassMetrics> = per_class
        .iter()
        .zip(&present)
        .filter(|(_, p)| **p)
        .map(|(m, _)| m)
        .collect();

    let macro_avg = if counted.is_empty() {
        ClassMetrics {
            precision: 0.0,
            recall: 0.0,
            f1_score: 0.0,
            support: total_support,
        }
    } else {
        let k = counted.len() as f64;
        ClassMetrics {
            precision: counted.iter().map(|m| m.precision).sum::<f64>() / k,
            recall: counted.iter().map(|m| m.recall).sum::<f64>() / k,
            f1_score: counted.iter().map(|m| m.f1_score).sum::<f64>() / k,
            support: total_support,
        }
    };

    let weighted_avg = ClassMetrics {
        precision: weighted_mean(&per_class, |m| m.precision),
        recall: weighted_mean(&per_class, |m| m.recall),
        f1_score: weighted_mean(&per_class, |m| m.f1_score),
        support: total_support,
    };

    ClassificationReport {
        classes: classes.to_vec(),
        per_class,
        macro_avg,
        weighted_avg,
    }
}

fn weighted_mean(per_class: &[ClassMetrics], field: impl Fn(&ClassMetrics) -> f64) -> f64 {
    let total: usize = per_class.iter().map(|m| m.support).sum();
    if total == 0 {
        return 0.0;
    }
    per_class
        .iter()
        .map(|m| field(m) * m.support as f64)
        .sum::<f64>()
        / total as f64
}
