//! Feature schema and inference records
//!
//! The schema is fixed at training time: feature order and each feature's
//! kind travel with the artifact so inference can rebuild identical rows.

use crate::errors::Result;
use crate::serialization::hash_canonical_hex;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;

/// Cell values treated as missing when reading tabular input
pub const MISSING_TOKENS: &[&str] = &[
    "", "NA", "N/A", "n/a", "NaN", "nan", "-nan", "null", "NULL", "None", "<NA>", "#N/A",
];

/// Returns true when a raw (already trimmed) cell denotes a missing value
pub fn is_missing_token(raw: &str) -> bool {
    MISSING_TOKENS.contains(&raw)
}

/// Parse a raw cell as a finite number
pub fn parse_number(raw: &str) -> Option<f64> {
    raw.parse::<f64>().ok().filter(|v| v.is_finite())
}

/// Render a number the way categorical cells and labels are compared
pub fn format_number(value: f64) -> String {
    format!("{}", value)
}

/// Kind of a feature column, decided once when the data is loaded
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FeatureKind {
    Numeric,
    Categorical,
}

impl fmt::Display for FeatureKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FeatureKind::Numeric => f.pad("numeric"),
            FeatureKind::Categorical => f.pad("categorical"),
        }
    }
}

/// A named feature and its kind
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FeatureSpec {
    pub name: String,
    pub kind: FeatureKind,
}

impl FeatureSpec {
    pub fn new(name: impl Into<String>, kind: FeatureKind) -> Self {
        Self {
            name: name.into(),
            kind,
        }
    }
}

/// Ordered feature list used at training time
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct FeatureSchema {
    pub features: Vec<FeatureSpec>,
}

impl FeatureSchema {
    pub fn new(features: Vec<FeatureSpec>) -> Self {
        Self { features }
    }

    pub fn len(&self) -> usize {
        self.features.len()
    }

    pub fn is_empty(&self) -> bool {
        self.features.is_empty()
    }

    /// Feature names in training order
    pub fn names(&self) -> Vec<&str> {
        self.features.iter().map(|f| f.name.as_str()).collect()
    }

    pub fn position(&self, name: &str) -> Option<usize> {
        self.features.iter().position(|f| f.name == name)
    }

    pub fn categorical(&self) -> impl Iterator<Item = &FeatureSpec> {
        self.features
            .iter()
            .filter(|f| f.kind == FeatureKind::Categorical)
    }

    /// Blake3 fingerprint of the canonical schema JSON
    pub fn fingerprint(&self) -> Result<String> {
        Ok(hash_canonical_hex(self)?)
    }
}

/// Raw value supplied for one feature at inference time
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum FeatureValue {
    Number(f64),
    Text(String),
    Missing,
}

impl FeatureValue {
    /// Interpret a raw string the same way a CSV cell is interpreted
    pub fn parse(raw: &str) -> Self {
        let trimmed = raw.trim();
        if is_missing_token(trimmed) {
            FeatureValue::Missing
        } else if let Some(number) = parse_number(trimmed) {
            FeatureValue::Number(number)
        } else {
            FeatureValue::Text(trimmed.to_string())
        }
    }

    pub fn is_missing(&self) -> bool {
        matches!(self, FeatureValue::Missing)
    }

    /// Category string for this value (numbers are rendered as text)
    pub fn as_category(&self) -> Option<String> {
        match self {
            FeatureValue::Number(n) => Some(format_number(*n)),
            FeatureValue::Text(s) => Some(s.clone()),
            FeatureValue::Missing => None,
        }
    }
}

impl fmt::Display for FeatureValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FeatureValue::Number(n) => write!(f, "{}", n),
            FeatureValue::Text(s) => write!(f, "{}", s),
            FeatureValue::Missing => write!(f, "<missing>"),
        }
    }
}

impl From<f64> for FeatureValue {
    fn from(value: f64) -> Self {
        FeatureValue::Number(value)
    }
}

impl From<&str> for FeatureValue {
    fn from(value: &str) -> Self {
        FeatureValue::Text(value.to_string())
    }
}

impl From<String> for FeatureValue {
    fn from(value: String) -> Self {
        FeatureValue::Text(value)
    }
}

/// Observed span of a numeric feature at training time
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct NumericRange {
    pub min: f64,
    pub mean: f64,
    pub max: f64,
}

impl NumericRange {
    /// Range of the observed values; `None` when nothing was observed
    pub fn of(values: &[Option<f64>]) -> Option<Self> {
        let observed: Vec<f64> = values.iter().flatten().copied().collect();
        if observed.is_empty() {
            return None;
        }
        let min = observed.iter().copied().fold(f64::INFINITY, f64::min);
        let max = observed.iter().copied().fold(f64::NEG_INFINITY, f64::max);
        let mean = observed.iter().sum::<f64>() / observed.len() as f64;
        Some(Self { min, mean, max })
    }
}

/// One inference record: feature name to raw value
pub type FeatureRecord = BTreeMap<String, FeatureValue>;
