use moodcheck_ai_core::AiCoreError;
use thiserror::Error;

/// Errors returned by dataset loading, training and the session context.
#[derive(Debug, Error)]
pub enum TrainerError {
    #[error("target column '{0}' not found in dataset")]
    MissingTargetColumn(String),

    #[error("failed to load data: {0}")]
    DataLoad(String),

    #[error("dataset has no rows")]
    EmptyDataset,

    #[error("insufficient data: {0}")]
    InsufficientData(String),

    #[error("invalid configuration: {0}")]
    InvalidConfig(String),

    #[error("no dataset loaded")]
    NoDataset,

    #[error("no trained model available")]
    NotTrained,

    #[error(transparent)]
    Core(#[from] AiCoreError),
}

impl From<csv::Error> for TrainerError {
    fn from(err: csv::Error) -> Self {
        TrainerError::DataLoad(err.to_string())
    }
}

pub type Result<T> = std::result::Result<T, TrainerError>;
