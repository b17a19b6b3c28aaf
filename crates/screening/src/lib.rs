//! Moodcheck Screening - heuristic depression questionnaire scoring
//!
//! Maps eleven symptom answers to ordinals, combines them into a weighted
//! 0-100 score, buckets the score into a severity tier and attaches
//! guidance for elevated dimensions. Pure and deterministic; no I/O.

pub mod errors;
pub mod insights;
pub mod score;
pub mod table;

pub use errors::{Result, ScreeningError};
pub use insights::{Insight, Priority, CRISIS_RESOURCES};
pub use score::{assess, calculate_score, Assessment, DimensionScore, Responses, Tier};
pub use table::{ordinal_of, question, Category, Dimension, Question, MAX_ORDINAL, QUESTIONS};

/// Shown with every screening result
pub const DISCLAIMER: &str = "This screening is for informational purposes only and is not a \
substitute for professional medical advice, diagnosis or treatment. If you are struggling, \
please reach out to a qualified mental health professional.";

/// Library version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
