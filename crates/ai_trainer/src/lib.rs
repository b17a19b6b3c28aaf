//! Moodcheck AI Trainer - deterministic Random Forest training
//!
//! Loads CSV datasets, prepares and splits them, grows a seeded Random
//! Forest and bundles the result into a `TrainedArtifact`. The `Session`
//! type ties these steps together for interactive use.

pub mod cart;
pub mod dataset;
pub mod deterministic;
pub mod errors;
pub mod loader;
pub mod session;
pub mod split;
pub mod trainer;

use moodcheck_ai_core::config::PipelineConfig;
use moodcheck_ai_core::TrainedArtifact;
use std::path::Path;

pub use dataset::{Column, ColumnData, ColumnInfo, ColumnKind, Dataset, DatasetSummary};
pub use deterministic::LcgRng;
pub use errors::TrainerError;
pub use loader::DataSource;
pub use session::Session;
pub use split::{stratified_split, SplitIndices};
pub use trainer::{ModelTrainer, PreparedData};

/// Train and evaluate a model directly from a CSV file.
pub fn train_model_from_csv(
    path: &Path,
    config: PipelineConfig,
) -> Result<TrainedArtifact, TrainerError> {
    let dataset = Dataset::from_csv(path)?;
    ModelTrainer::new(config).train_and_evaluate(&dataset)
}

/// Library version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
