//! Trained model artifact
//!
//! Everything one training run produces, bundled so that inference can
//! rebuild feature rows exactly as they were built during training.
//! Persisted as a single canonical JSON document.

use crate::errors::{AiCoreError, Result};
use crate::metrics::EvaluationMetrics;
use crate::model::FittedModel;
use crate::preprocessing::{FillValue, Imputer, LabelEncoder};
use crate::schema::{
    format_number, parse_number, FeatureKind, FeatureRecord, FeatureSchema, FeatureValue,
    NumericRange,
};
use crate::serialization::write_canonical_json;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fs;
use std::io::{BufWriter, Write};
use std::path::Path;
use tracing::info;

/// Version of the persisted artifact layout
pub const ARTIFACT_FORMAT_VERSION: u32 = 1;

/// Immutable bundle produced by one training run
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TrainedArtifact {
    pub format_version: u32,
    pub created_at: DateTime<Utc>,
    pub schema: FeatureSchema,
    /// Blake3 fingerprint of `schema`
    pub schema_hash: String,
    pub imputer: Imputer,
    /// One encoder per categorical feature
    pub feature_encoders: BTreeMap<String, LabelEncoder>,
    pub target_encoder: LabelEncoder,
    pub model: FittedModel,
    pub metrics: Option<EvaluationMetrics>,
    /// Training span of each numeric feature, shown as input hints
    #[serde(default)]
    pub numeric_ranges: BTreeMap<String, NumericRange>,
}

/// What a caller may supply for one feature
#[derive(Debug, Clone, PartialEq)]
pub enum FeatureHint {
    /// Categories seen at training, sorted
    Categories(Vec<String>),
    Range(NumericRange),
    /// Numeric feature with no observed values
    Unknown,
}

/// Outcome of predicting one record
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Prediction {
    pub label: String,
    pub class_index: usize,
    /// Aligned with `classes`
    pub probabilities: Vec<f64>,
    pub classes: Vec<String>,
}

impl Prediction {
    /// Probability of the predicted label
    pub fn confidence(&self) -> f64 {
        self.probabilities
            .get(self.class_index)
            .copied()
            .unwrap_or(0.0)
    }

    /// Classes paired with their probabilities, most probable first
    pub fn ranked(&self) -> Vec<(&str, f64)> {
        let mut ranked: Vec<(&str, f64)> = self
            .classes
            .iter()
            .map(String::as_str)
            .zip(self.probabilities.iter().copied())
            .collect();
        ranked.sort_by(|a, b| b.1.total_cmp(&a.1));
        ranked
    }
}

impl TrainedArtifact {
    /// Bundle fitted parts; the schema fingerprint is computed here
    pub fn new(
        schema: FeatureSchema,
        imputer: Imputer,
        feature_encoders: BTreeMap<String, LabelEncoder>,
        target_encoder: LabelEncoder,
        model: FittedModel,
        metrics: Option<EvaluationMetrics>,
    ) -> Result<Self> {
        let artifact = Self {
            format_version: ARTIFACT_FORMAT_VERSION,
            created_at: Utc::now(),
            schema_hash: schema.fingerprint()?,
            schema,
            imputer,
            feature_encoders,
            target_encoder,
            model,
            metrics,
            numeric_ranges: BTreeMap::new(),
        };
        artifact.validate()?;
        Ok(artifact)
    }

    pub fn with_numeric_ranges(mut self, ranges: BTreeMap<String, NumericRange>) -> Self {
        self.numeric_ranges = ranges;
        self
    }

    /// Accepted input for every feature, in training order
    pub fn input_hints(&self) -> Vec<(&str, FeatureHint)> {
        self.schema
            .features
            .iter()
            .map(|f| {
                let hint = match f.kind {
                    FeatureKind::Categorical => FeatureHint::Categories(
                        self.feature_encoders
                            .get(&f.name)
                            .map(|e| e.classes().to_vec())
                            .unwrap_or_default(),
                    ),
                    FeatureKind::Numeric => self
                        .numeric_ranges
                        .get(&f.name)
                        .map(|r| FeatureHint::Range(*r))
                        .unwrap_or(FeatureHint::Unknown),
                };
                (f.name.as_str(), hint)
            })
            .collect()
    }

    pub fn classes(&self) -> &[String] {
        self.target_encoder.classes()
    }

    pub fn feature_names(&self) -> Vec<&str> {
        self.schema.names()
    }

    /// Build the encoded, unscaled feature row for one record
    ///
    /// Fields are taken in training order; extra fields are ignored.
    pub fn encode_record(&self, record: &FeatureRecord) -> Result<Vec<f64>> {
        let missing: Vec<String> = self
            .schema
            .features
            .iter()
            .filter(|f| !record.contains_key(&f.name))
            .map(|f| f.name.clone())
            .collect();
        if !missing.is_empty() {
            return Err(AiCoreError::FeatureOrderMismatch { missing });
        }

        let mut row = Vec::with_capacity(self.schema.len());
        for spec in &self.schema.features {
            let value = match &record[&spec.name] {
                FeatureValue::Missing => self.fill_for(&spec.name)?,
                other => other.clone(),
            };

            let encoded = match spec.kind {
                FeatureKind::Numeric => match value {
                    FeatureValue::Number(n) => n,
                    FeatureValue::Text(ref text) => {
                        crate::schema::parse_number(text.trim()).ok_or_else(|| {
                            AiCoreError::InvalidFeatureValue {
                                feature: spec.name.clone(),
                                value: text.clone(),
                            }
                        })?
                    }
                    FeatureValue::Missing => 0.0,
                },
                FeatureKind::Categorical => {
                    let encoder = self.feature_encoders.get(&spec.name).ok_or_else(|| {
                        AiCoreError::IncompatibleArtifact(format!(
                            "no encoder stored for categorical feature '{}'",
                            spec.name
                        ))
                    })?;
                    encode_category(encoder, &value).ok_or_else(|| {
                        AiCoreError::UnseenCategory {
                            feature: spec.name.clone(),
                            value: value.as_category().unwrap_or_default(),
                        }
                    })? as f64
                }
            };
            row.push(encoded);
        }
        Ok(row)
    }

    fn fill_for(&self, feature: &str) -> Result<FeatureValue> {
        match self.imputer.get(feature) {
            Some(FillValue::Mean(mean)) => Ok(FeatureValue::Number(*mean)),
            Some(FillValue::MostFrequent(mode)) => Ok(FeatureValue::Text(mode.clone())),
            None => Err(AiCoreError::IncompatibleArtifact(format!(
                "no fill value stored for feature '{}'",
                feature
            ))),
        }
    }

    /// Predict the label of one record
    pub fn predict(&self, record: &FeatureRecord) -> Result<Prediction> {
        let row = self.encode_record(record)?;
        let probabilities = self.model.predict_proba(&row)?;
        let class_index = crate::forest::argmax(&probabilities);
        let label = self
            .target_encoder
            .decode(class_index)
            .ok_or_else(|| {
                AiCoreError::InvalidParameters(format!(
                    "class index {} outside the target encoder",
                    class_index
                ))
            })?
            .to_string();

        Ok(Prediction {
            label,
            class_index,
            probabilities,
            classes: self.classes().to_vec(),
        })
    }

    /// Predict every record; the first failing record aborts the batch
    pub fn predict_many(&self, records: &[FeatureRecord]) -> Result<Vec<Prediction>> {
        records.iter().map(|r| self.predict(r)).collect()
    }

    /// Feature names with normalized importances, highest first
    pub fn feature_importance(&self) -> Vec<(String, f64)> {
        let mut pairs: Vec<(String, f64)> = self
            .schema
            .features
            .iter()
            .map(|f| f.name.clone())
            .zip(self.model.classifier.feature_importances())
            .collect();
        pairs.sort_by(|a, b| b.1.total_cmp(&a.1).then_with(|| a.0.cmp(&b.0)));
        pairs
    }

    /// Check internal consistency of the bundle
    pub fn validate(&self) -> Result<()> {
        if self.format_version != ARTIFACT_FORMAT_VERSION {
            return Err(AiCoreError::IncompatibleArtifact(format!(
                "unsupported format version {} (expected {})",
                self.format_version, ARTIFACT_FORMAT_VERSION
            )));
        }

        let fingerprint = self.schema.fingerprint()?;
        if fingerprint != self.schema_hash {
            return Err(AiCoreError::IncompatibleArtifact(
                "schema fingerprint does not match the stored schema".to_string(),
            ));
        }

        self.model.validate()?;
        self.target_encoder.validate()?;

        if self.model.classifier.n_features != self.schema.len() {
            return Err(AiCoreError::IncompatibleArtifact(format!(
                "classifier expects {} features but schema lists {}",
                self.model.classifier.n_features,
                self.schema.len()
            )));
        }
        if self.model.classifier.n_classes != self.target_encoder.len() {
            return Err(AiCoreError::IncompatibleArtifact(format!(
                "classifier has {} classes but target encoder has {}",
                self.model.classifier.n_classes,
                self.target_encoder.len()
            )));
        }

        for spec in self.schema.categorical() {
            match self.feature_encoders.get(&spec.name) {
                Some(encoder) => encoder.validate()?,
                None => {
                    return Err(AiCoreError::IncompatibleArtifact(format!(
                        "missing encoder for '{}'",
                        spec.name
                    )))
                }
            }
        }
        Ok(())
    }

    /// Write canonical JSON atomically: temp file in the target directory, then rename
    pub fn save<P: AsRef<Path>>(&self, path: P) -> Result<()> {
        let path = path.as_ref();
        let dir = match path.parent() {
            Some(parent) if !parent.as_os_str().is_empty() => parent,
            _ => Path::new("."),
        };
        fs::create_dir_all(dir)?;

        let mut temp = tempfile::NamedTempFile::new_in(dir)?;
        {
            let mut writer = BufWriter::new(temp.as_file_mut());
            write_canonical_json(&mut writer, self)?;
            writer.write_all(b"\n")?;
            writer.flush()?;
        }
        temp.persist(path).map_err(|e| AiCoreError::Io(e.error))?;

        info!("Artifact saved to: {}", path.display());
        Ok(())
    }

    /// Load and verify an artifact
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        let json = fs::read_to_string(path)?;

        let value: serde_json::Value = serde_json::from_str(&json)?;
        match value.get("format_version").and_then(|v| v.as_u64()) {
            Some(v) if v == ARTIFACT_FORMAT_VERSION as u64 => {}
            Some(v) => {
                return Err(AiCoreError::IncompatibleArtifact(format!(
                    "unsupported format version {} (expected {})",
                    v, ARTIFACT_FORMAT_VERSION
                )))
            }
            None => {
                return Err(AiCoreError::IncompatibleArtifact(
                    "document has no format version".to_string(),
                ))
            }
        }

        let artifact: TrainedArtifact = serde_json::from_value(value)?;
        artifact.validate()?;

        info!(
            "Artifact loaded from {} ({} features, {} classes)",
            path.display(),
            artifact.schema.len(),
            artifact.target_encoder.len()
        );
        Ok(artifact)
    }

    /// Load an artifact and require that it was trained on `expected`
    pub fn load_expecting<P: AsRef<Path>>(path: P, expected: &FeatureSchema) -> Result<Self> {
        let artifact = Self::load(path)?;
        if artifact.schema != *expected {
            let expected_desc: Vec<String> = expected
                .features
                .iter()
                .map(|f| format!("{}:{}", f.name, f.kind))
                .collect();
            return Err(AiCoreError::IncompatibleArtifact(format!(
                "artifact was trained on [{}], expected [{}]",
                artifact
                    .schema
                    .features
                    .iter()
                    .map(|f| format!("{}:{}", f.name, f.kind))
                    .collect::<Vec<_>>()
                    .join(", "),
                expected_desc.join(", ")
            )));
        }
        Ok(artifact)
    }
}

/// Code of a categorical value
///
/// Exact text wins. Otherwise a numeric value matches the training
/// category that parses to the same number, so `2.0`, `"2"` and `"2.0"`
/// all reach a category stored as `"2.0"`.
fn encode_category(encoder: &LabelEncoder, value: &FeatureValue) -> Option<usize> {
    if let Some(code) = value.as_category().and_then(|c| encoder.encode(&c)) {
        return Some(code);
    }
    let number = match value {
        FeatureValue::Number(n) => *n,
        FeatureValue::Text(text) => parse_number(text.trim())?,
        FeatureValue::Missing => return None,
    };
    encoder
        .classes()
        .iter()
        .position(|class| parse_number(class) == Some(number))
}

/// Render a fill value for display
pub fn describe_fill(fill: &FillValue) -> String {
    match fill {
        FillValue::Mean(m) => format!("mean {}", format_number(*m)),
        FillValue::MostFrequent(s) => format!("mode '{}'", s),
    }
}
