//! Error types for the AI Core module

use thiserror::Error;

/// Errors that can occur while running or persisting a trained artifact
#[derive(Error, Debug)]
pub enum AiCoreError {
    /// Inference record does not carry every feature the artifact was trained on
    #[error("Feature order mismatch: record is missing features {missing:?}")]
    FeatureOrderMismatch { missing: Vec<String> },

    /// Categorical value never observed during training
    #[error("Unseen category '{value}' for feature '{feature}'")]
    UnseenCategory { feature: String, value: String },

    /// Numeric feature received a value that is not a number
    #[error("Invalid value '{value}' for numeric feature '{feature}'")]
    InvalidFeatureValue { feature: String, value: String },

    /// Persisted artifact does not match the expected format or schema
    #[error("Incompatible artifact: {0}")]
    IncompatibleArtifact(String),

    /// Invalid model parameters
    #[error("Invalid model parameters: {0}")]
    InvalidParameters(String),

    /// Configuration could not be read or is out of range
    #[error("Configuration error: {0}")]
    Config(String),

    /// I/O error
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Serialization error
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

/// Result type for AI Core operations
pub type Result<T> = std::result::Result<T, AiCoreError>;
