//! Fitted preprocessing transforms
//!
//! - `LabelEncoder`: bijection between observed strings and integer codes
//! - `StandardScaler`: per-column zero mean / unit variance
//! - `Imputer`: per-column fill values for missing cells

use crate::errors::{AiCoreError, Result};
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, BTreeSet};

/// Fill value used for categorical columns that have no observed values
pub const EMPTY_CATEGORY_FILL: &str = "missing";

/// Maps each distinct observed string to its index in sorted order
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct LabelEncoder {
    classes: Vec<String>,
}

impl LabelEncoder {
    /// Fit on observed values; classes are sorted and deduplicated
    pub fn fit<I, S>(values: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let classes: BTreeSet<String> = values
            .into_iter()
            .map(|v| v.as_ref().to_string())
            .collect();
        Self {
            classes: classes.into_iter().collect(),
        }
    }

    pub fn classes(&self) -> &[String] {
        &self.classes
    }

    pub fn len(&self) -> usize {
        self.classes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.classes.is_empty()
    }

    /// Integer code of a value, `None` when it was not seen during fitting
    pub fn encode(&self, value: &str) -> Option<usize> {
        self.classes
            .binary_search_by(|class| class.as_str().cmp(value))
            .ok()
    }

    pub fn decode(&self, code: usize) -> Option<&str> {
        self.classes.get(code).map(String::as_str)
    }

    /// Classes must be strictly increasing for binary search to hold
    pub fn validate(&self) -> Result<()> {
        if self.classes.windows(2).all(|w| w[0] < w[1]) {
            Ok(())
        } else {
            Err(AiCoreError::InvalidParameters(
                "label encoder classes are not sorted and unique".to_string(),
            ))
        }
    }
}

/// Standardizes each column to zero mean and unit (population) variance
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct StandardScaler {
    mean: Vec<f64>,
    scale: Vec<f64>,
}

impl StandardScaler {
    /// Fit on rows of equal width; constant columns keep a scale of 1
    pub fn fit(rows: &[Vec<f64>]) -> Self {
        let n_features = rows.first().map(Vec::len).unwrap_or(0);
        let n = rows.len() as f64;
        let mut mean = vec![0.0; n_features];
        let mut scale = vec![1.0; n_features];

        if rows.is_empty() {
            return Self { mean, scale };
        }

        for row in rows {
            for (acc, &value) in mean.iter_mut().zip(row) {
                *acc += value;
            }
        }
        for m in &mut mean {
            *m /= n;
        }

        let mut variance = vec![0.0; n_features];
        for row in rows {
            for ((acc, &value), &m) in variance.iter_mut().zip(row).zip(&mean) {
                let d = value - m;
                *acc += d * d;
            }
        }
        for (s, var) in scale.iter_mut().zip(variance) {
            let std = (var / n).sqrt();
            if std > f64::EPSILON {
                *s = std;
            }
        }

        Self { mean, scale }
    }

    pub fn n_features(&self) -> usize {
        self.mean.len()
    }

    pub fn mean(&self) -> &[f64] {
        &self.mean
    }

    pub fn scale(&self) -> &[f64] {
        &self.scale
    }

    pub fn transform_row(&self, row: &[f64]) -> Result<Vec<f64>> {
        if row.len() != self.mean.len() {
            return Err(AiCoreError::InvalidParameters(format!(
                "expected {} features, got {}",
                self.mean.len(),
                row.len()
            )));
        }
        Ok(row
            .iter()
            .zip(self.mean.iter().zip(&self.scale))
            .map(|(&v, (&m, &s))| (v - m) / s)
            .collect())
    }

    pub fn transform(&self, rows: &[Vec<f64>]) -> Result<Vec<Vec<f64>>> {
        rows.iter().map(|row| self.transform_row(row)).collect()
    }

    pub fn validate(&self) -> Result<()> {
        if self.mean.len() != self.scale.len() {
            return Err(AiCoreError::InvalidParameters(
                "scaler mean and scale lengths differ".to_string(),
            ));
        }
        if self.scale.iter().any(|s| !s.is_finite() || *s <= 0.0) {
            return Err(AiCoreError::InvalidParameters(
                "scaler contains a non-positive scale".to_string(),
            ));
        }
        Ok(())
    }
}

/// Fill value for one column
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "strategy", content = "value", rename_all = "snake_case")]
pub enum FillValue {
    Mean(f64),
    MostFrequent(String),
}

/// Per-column fill values fitted on the training table
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Imputer {
    fills: BTreeMap<String, FillValue>,
}

impl Imputer {
    pub fn new() -> Self {
        Self::default()
    }

    /// Mean of observed values, 0 when none are observed
    pub fn mean_of(values: &[Option<f64>]) -> f64 {
        let (sum, count) = values
            .iter()
            .flatten()
            .fold((0.0, 0usize), |(s, c), v| (s + v, c + 1));
        if count == 0 {
            0.0
        } else {
            sum / count as f64
        }
    }

    /// Most frequent observed value; ties go to the smallest string
    pub fn mode_of(values: &[Option<String>]) -> String {
        let mut counts: BTreeMap<&str, usize> = BTreeMap::new();
        for value in values.iter().flatten() {
            *counts.entry(value.as_str()).or_insert(0) += 1;
        }

        // BTreeMap iterates in key order, so the first maximum wins ties
        let mut best: Option<(&str, usize)> = None;
        for (value, count) in counts {
            if best.map_or(true, |(_, c)| count > c) {
                best = Some((value, count));
            }
        }

        best.map(|(v, _)| v.to_string())
            .unwrap_or_else(|| EMPTY_CATEGORY_FILL.to_string())
    }

    pub fn insert(&mut self, column: impl Into<String>, fill: FillValue) {
        self.fills.insert(column.into(), fill);
    }

    pub fn get(&self, column: &str) -> Option<&FillValue> {
        self.fills.get(column)
    }

    pub fn len(&self) -> usize {
        self.fills.len()
    }

    pub fn is_empty(&self) -> bool {
        self.fills.is_empty()
    }
}
