use thiserror::Error;

/// Errors raised while reading questionnaire input
#[derive(Debug, Error, PartialEq, Eq)]
pub enum ScreeningError {
    #[error("unknown symptom dimension '{0}'")]
    UnknownDimension(String),
}

pub type Result<T> = std::result::Result<T, ScreeningError>;
