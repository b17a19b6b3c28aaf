//! Moodcheck AI Core
//!
//! Inference side of the tabular classifier pipeline: the immutable
//! trained artifact and everything it bundles.
//!
//! Modules:
//! - `schema`: Feature schema, raw inference values and missing-value tokens
//! - `preprocessing`: Label encoders, standardizer and imputer fill values
//! - `forest`: Random Forest trees and probability averaging
//! - `model`: Standardizer + classifier pair
//! - `metrics`: Accuracy, confusion matrix and classification report
//! - `artifact`: Trained artifact, record encoding, persistence
//! - `config`: Pipeline configuration (defaults, TOML, environment)
//! - `serialization`: Canonical JSON and blake3 fingerprints

pub mod artifact;
pub mod config;
pub mod errors;
pub mod forest;
pub mod metrics;
pub mod model;
pub mod preprocessing;
pub mod schema;
pub mod serialization;

pub use artifact::{FeatureHint, Prediction, TrainedArtifact, ARTIFACT_FORMAT_VERSION};
pub use config::{ForestConfig, PipelineConfig};
pub use errors::{AiCoreError, Result};
pub use forest::{argmax, Node, RandomForest, Tree};
pub use metrics::{ClassMetrics, ClassificationReport, EvaluationMetrics};
pub use model::FittedModel;
pub use preprocessing::{FillValue, Imputer, LabelEncoder, StandardScaler};
pub use schema::{
    FeatureKind, FeatureRecord, FeatureSchema, FeatureSpec, FeatureValue, NumericRange,
};

/// Crate version string for artifact metadata and reports
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
