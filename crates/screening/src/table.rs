//! Static scoring tables: symptom dimensions, weights, the answer ordinal
//! map and the question catalogue.

use serde::{Deserialize, Deserializer, Serialize};
use std::fmt;
use std::str::FromStr;

use crate::errors::ScreeningError;

/// Highest ordinal an answer can map to
pub const MAX_ORDINAL: u8 = 4;

/// One symptom dimension of the questionnaire
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Dimension {
    Mood,
    Sleep,
    Energy,
    Appetite,
    Concentration,
    Anxiety,
    Social,
    Interest,
    Guilt,
    Suicidal,
    Hobby,
}

impl Dimension {
    pub const ALL: [Dimension; 11] = [
        Dimension::Mood,
        Dimension::Sleep,
        Dimension::Energy,
        Dimension::Appetite,
        Dimension::Concentration,
        Dimension::Anxiety,
        Dimension::Social,
        Dimension::Interest,
        Dimension::Guilt,
        Dimension::Suicidal,
        Dimension::Hobby,
    ];

    /// Key used in response maps and on the command line
    pub fn key(self) -> &'static str {
        match self {
            Dimension::Mood => "mood",
            Dimension::Sleep => "sleep",
            Dimension::Energy => "energy",
            Dimension::Appetite => "appetite",
            Dimension::Concentration => "concentration",
            Dimension::Anxiety => "anxiety",
            Dimension::Social => "social",
            Dimension::Interest => "interest",
            Dimension::Guilt => "guilt",
            Dimension::Suicidal => "suicidal",
            Dimension::Hobby => "hobby",
        }
    }

    /// Clinical weight; suicidal ideation weighs the most
    pub fn weight(self) -> f64 {
        match self {
            Dimension::Mood => 1.5,
            Dimension::Sleep => 1.2,
            Dimension::Energy => 1.3,
            Dimension::Appetite => 1.0,
            Dimension::Concentration => 1.4,
            Dimension::Anxiety => 1.3,
            Dimension::Social => 1.2,
            Dimension::Interest => 1.5,
            Dimension::Guilt => 1.1,
            Dimension::Suicidal => 2.0,
            Dimension::Hobby => 1.3,
        }
    }

    /// Human-readable label for breakdowns
    pub fn label(self) -> &'static str {
        match self {
            Dimension::Mood => "Mood Disturbance",
            Dimension::Sleep => "Sleep Problems",
            Dimension::Energy => "Low Energy",
            Dimension::Appetite => "Appetite Changes",
            Dimension::Concentration => "Poor Concentration",
            Dimension::Anxiety => "Anxiety Levels",
            Dimension::Social => "Social Withdrawal",
            Dimension::Interest => "Loss of Interest",
            Dimension::Guilt => "Guilt or Worthlessness",
            Dimension::Suicidal => "Thoughts of Self-harm",
            Dimension::Hobby => "Hobby Disengagement",
        }
    }

    /// Ordinal at or above which an insight is emitted
    pub fn insight_threshold(self) -> u8 {
        match self {
            Dimension::Suicidal => 2,
            _ => 3,
        }
    }
}

impl fmt::Display for Dimension {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.key())
    }
}

impl FromStr for Dimension {
    type Err = ScreeningError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let key = s.trim().to_ascii_lowercase();
        Dimension::ALL
            .iter()
            .copied()
            .find(|d| d.key() == key)
            .ok_or_else(|| ScreeningError::UnknownDimension(s.to_string()))
    }
}

/// Keys read from JSON follow the same lenient rules as `FromStr`
impl<'de> Deserialize<'de> for Dimension {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let key = String::deserialize(deserializer)?;
        key.parse().map_err(serde::de::Error::custom)
    }
}

/// Answer text to ordinal severity (0 best, 4 worst)
///
/// One flat table shared by every question. "Always", "Constantly" and
/// "Frequently" all close their scales at 4.
pub const ORDINAL_TABLE: &[(&str, u8)] = &[
    // Rating
    ("Very good", 0),
    ("Good", 1),
    ("Fair", 2),
    ("Poor", 3),
    ("Very poor", 4),
    // Frequency
    ("Never", 0),
    ("Rarely", 1),
    ("Sometimes", 2),
    ("Often", 3),
    ("Always", 4),
    ("Constantly", 4),
    ("Frequently", 4),
    // Energy
    ("Very energetic", 0),
    ("Energetic", 1),
    ("Average", 2),
    ("Low", 3),
    ("Very low", 4),
    // Social interest
    ("Very interested", 0),
    ("Interested", 1),
    ("Neutral", 2),
    ("Disinterested", 3),
    ("Very disinterested", 4),
    // Activity interest
    ("Full interest", 0),
    ("Most interest", 1),
    ("Some interest", 2),
    ("Little interest", 3),
    ("No interest", 4),
    // Engagement
    ("Very engaged", 0),
    ("Engaged", 1),
    ("Disengaged", 3),
    ("Very disengaged", 4),
    // Change
    ("No change", 0),
    ("Slight change", 1),
    ("Moderate change", 2),
    ("Significant change", 3),
    ("Extreme change", 4),
    // Difficulty
    ("Not at all", 0),
    ("Slightly", 1),
    ("Moderately", 2),
    ("Very", 3),
    ("Extremely", 4),
];

/// Ordinal of an answer; `None` for empty or unrecognized text
pub fn ordinal_of(answer: &str) -> Option<u8> {
    let answer = answer.trim();
    ORDINAL_TABLE
        .iter()
        .find(|(text, _)| *text == answer)
        .map(|(_, ordinal)| *ordinal)
}

/// Question grouping used when presenting the questionnaire
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Category {
    Core,
    Emotional,
    Physical,
    Cognitive,
    Social,
    Critical,
}

impl Category {
    pub fn title(self) -> &'static str {
        match self {
            Category::Core => "Core Symptoms",
            Category::Emotional => "Emotional Symptoms",
            Category::Physical => "Physical Symptoms",
            Category::Cognitive => "Cognitive Symptoms",
            Category::Social => "Social Symptoms",
            Category::Critical => "Critical Symptoms",
        }
    }
}

/// One questionnaire item
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct Question {
    pub dimension: Dimension,
    pub prompt: &'static str,
    /// Options from least to most severe
    pub options: &'static [&'static str],
    pub category: Category,
    /// Sensitive item; show a notice before asking
    pub sensitive: bool,
}

/// Question catalogue in presentation order
pub const QUESTIONS: &[Question] = &[
    Question {
        dimension: Dimension::Mood,
        prompt: "How would you rate your overall mood in the past 2 weeks?",
        options: &["Very good", "Good", "Fair", "Poor", "Very poor"],
        category: Category::Core,
        sensitive: false,
    },
    Question {
        dimension: Dimension::Interest,
        prompt: "How much interest do you have in activities you used to enjoy?",
        options: &["Full interest", "Most interest", "Some interest", "Little interest", "No interest"],
        category: Category::Core,
        sensitive: false,
    },
    Question {
        dimension: Dimension::Anxiety,
        prompt: "How often do you feel anxious or worried?",
        options: &["Never", "Rarely", "Sometimes", "Often", "Constantly"],
        category: Category::Emotional,
        sensitive: false,
    },
    Question {
        dimension: Dimension::Guilt,
        prompt: "Do you experience feelings of guilt or worthlessness?",
        options: &["Never", "Rarely", "Sometimes", "Often", "Always"],
        category: Category::Emotional,
        sensitive: false,
    },
    Question {
        dimension: Dimension::Sleep,
        prompt: "Have you experienced sleep problems (insomnia or excessive sleeping)?",
        options: &["Never", "Rarely", "Sometimes", "Often", "Always"],
        category: Category::Physical,
        sensitive: false,
    },
    Question {
        dimension: Dimension::Energy,
        prompt: "How has your energy level been?",
        options: &["Very energetic", "Energetic", "Average", "Low", "Very low"],
        category: Category::Physical,
        sensitive: false,
    },
    Question {
        dimension: Dimension::Appetite,
        prompt: "Have you experienced changes in appetite?",
        options: &["No change", "Slight change", "Moderate change", "Significant change", "Extreme change"],
        category: Category::Physical,
        sensitive: false,
    },
    Question {
        dimension: Dimension::Concentration,
        prompt: "How difficult has it been to concentrate?",
        options: &["Not at all", "Slightly", "Moderately", "Very", "Extremely"],
        category: Category::Cognitive,
        sensitive: false,
    },
    Question {
        dimension: Dimension::Hobby,
        prompt: "How engaged have you been with hobbies or activities you enjoy?",
        options: &["Very engaged", "Engaged", "Neutral", "Disengaged", "Very disengaged"],
        category: Category::Social,
        sensitive: false,
    },
    Question {
        dimension: Dimension::Social,
        prompt: "How interested are you in social activities?",
        options: &["Very interested", "Interested", "Neutral", "Disinterested", "Very disinterested"],
        category: Category::Social,
        sensitive: false,
    },
    Question {
        dimension: Dimension::Suicidal,
        prompt: "Have you had thoughts of self-harm or suicide?",
        options: &["Never", "Rarely", "Sometimes", "Often", "Frequently"],
        category: Category::Critical,
        sensitive: true,
    },
];

/// Catalogue entry for a dimension
pub fn question(dimension: Dimension) -> Option<&'static Question> {
    QUESTIONS.iter().find(|q| q.dimension == dimension)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashSet;

    #[test]
    fn table_has_unique_answers_in_range() {
        let mut seen = HashSet::new();
        for (text, ordinal) in ORDINAL_TABLE {
            assert!(seen.insert(*text), "duplicate answer {}", text);
            assert!(*ordinal <= MAX_ORDINAL);
        }
    }

    #[test]
    fn every_option_is_scored_and_scales_are_monotonic() {
        for question in QUESTIONS {
            let ordinals: Vec<u8> = question
                .options
                .iter()
                .map(|o| ordinal_of(o).unwrap_or_else(|| panic!("unscored option {}", o)))
                .collect();
            assert!(ordinals.windows(2).all(|w| w[0] < w[1]), "{:?}", question.dimension);
            assert_eq!(ordinals.first(), Some(&0));
            assert_eq!(ordinals.last(), Some(&MAX_ORDINAL));
        }
    }

    #[test]
    fn catalogue_covers_every_dimension_once() {
        assert_eq!(QUESTIONS.len(), Dimension::ALL.len());
        for dimension in Dimension::ALL {
            assert!(question(dimension).is_some(), "{}", dimension);
        }
        assert!(question(Dimension::Suicidal).unwrap().sensitive);
    }

    #[test]
    fn weights_match_clinical_emphasis() {
        let max = Dimension::ALL
            .iter()
            .copied()
            .max_by(|a, b| a.weight().total_cmp(&b.weight()))
            .unwrap();
        assert_eq!(max, Dimension::Suicidal);
        let total: f64 = Dimension::ALL.iter().map(|d| d.weight()).sum();
        assert!((total - 15.0).abs() < 1e-9);
    }

    #[test]
    fn lookups() {
        assert_eq!(ordinal_of("Frequently"), Some(4));
        assert_eq!(ordinal_of(" Neutral "), Some(2));
        assert_eq!(ordinal_of("Select..."), None);
        assert_eq!(ordinal_of(""), None);

        assert_eq!("Mood".parse::<Dimension>(), Ok(Dimension::Mood));
        assert_eq!(
            "happiness".parse::<Dimension>(),
            Err(ScreeningError::UnknownDimension("happiness".into()))
        );
    }
}
