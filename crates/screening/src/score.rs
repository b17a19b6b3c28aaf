//! Weighted questionnaire score and severity tiers

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;
use tracing::debug;

use crate::errors::Result;
use crate::insights::{collect_insights, Insight};
use crate::table::{ordinal_of, Dimension, MAX_ORDINAL};

/// Selected answer per dimension
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Responses(BTreeMap<Dimension, String>);

impl Responses {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, dimension: Dimension, answer: impl Into<String>) {
        self.0.insert(dimension, answer.into());
    }

    /// Insert by textual key, e.g. `"mood"`
    pub fn set(&mut self, key: &str, answer: impl Into<String>) -> Result<()> {
        let dimension = key.parse()?;
        self.insert(dimension, answer);
        Ok(())
    }

    pub fn get(&self, dimension: Dimension) -> Option<&str> {
        self.0.get(&dimension).map(String::as_str)
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Build from textual keys; fails on the first unknown key
    pub fn from_pairs<I, K, V>(pairs: I) -> Result<Self>
    where
        I: IntoIterator<Item = (K, V)>,
        K: AsRef<str>,
        V: Into<String>,
    {
        let mut responses = Self::new();
        for (key, value) in pairs {
            responses.set(key.as_ref(), value)?;
        }
        Ok(responses)
    }

    /// Ordinal of the recognized answer for `dimension`
    pub fn ordinal(&self, dimension: Dimension) -> Option<u8> {
        self.get(dimension).and_then(ordinal_of)
    }
}

impl FromIterator<(Dimension, String)> for Responses {
    fn from_iter<T: IntoIterator<Item = (Dimension, String)>>(iter: T) -> Self {
        Self(iter.into_iter().collect())
    }
}

/// Five ordered severity tiers
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
pub enum Tier {
    Normal,
    Mild,
    Moderate,
    Severe,
    Critical,
}

impl Tier {
    /// Bucket a 0-100 score: [0,20) [20,40) [40,60) [60,80) [80,100]
    pub fn from_score(score: f64) -> Self {
        if score < 20.0 {
            Tier::Normal
        } else if score < 40.0 {
            Tier::Mild
        } else if score < 60.0 {
            Tier::Moderate
        } else if score < 80.0 {
            Tier::Severe
        } else {
            Tier::Critical
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            Tier::Normal => "Normal",
            Tier::Mild => "Mild",
            Tier::Moderate => "Moderate",
            Tier::Severe => "Severe",
            Tier::Critical => "Critical",
        }
    }

    pub fn severity(self) -> &'static str {
        match self {
            Tier::Normal => "Low",
            Tier::Mild => "Low-Moderate",
            Tier::Moderate => "Moderate",
            Tier::Severe => "High",
            Tier::Critical => "Very High",
        }
    }

    pub fn recommendation(self) -> &'static str {
        match self {
            Tier::Normal => "You appear to have good mental health. Maintain healthy habits!",
            Tier::Mild => "Mild symptoms detected. Consider stress management techniques.",
            Tier::Moderate => "Moderate symptoms detected. Consider speaking with a professional.",
            Tier::Severe => "Severe symptoms detected. Please seek professional help immediately.",
            Tier::Critical => {
                "Critical symptoms detected. Urgent professional help is strongly recommended."
            }
        }
    }
}

impl fmt::Display for Tier {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

/// Per-dimension detail of an assessment
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DimensionScore {
    pub dimension: Dimension,
    pub answer: String,
    pub ordinal: u8,
    /// `ordinal / 4 * 100`
    pub percentage: f64,
}

/// Score, tier, breakdown and insights for one set of responses
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Assessment {
    pub score: f64,
    pub tier: Tier,
    pub severity: &'static str,
    pub recommendation: &'static str,
    /// Dimensions with a recognized answer
    pub answered: usize,
    pub breakdown: Vec<DimensionScore>,
    pub insights: Vec<Insight>,
}

/// Weighted 0-100 score over the recognized answers
///
/// Each ordinal is normalized to 0-10 and weighted; the sum is divided by
/// the maximum attainable over the answered dimensions only. No recognized
/// answers scores 0.
pub fn calculate_score(responses: &Responses) -> f64 {
    let mut total = 0.0;
    let mut max_possible = 0.0;

    for dimension in Dimension::ALL {
        if let Some(ordinal) = responses.ordinal(dimension) {
            let normalized = ordinal as f64 / MAX_ORDINAL as f64 * 10.0;
            total += normalized * dimension.weight();
            max_possible += 10.0 * dimension.weight();
        }
    }

    if max_possible > 0.0 {
        total / max_possible * 100.0
    } else {
        0.0
    }
}

/// Full assessment of a response set
pub fn assess(responses: &Responses) -> Assessment {
    let score = calculate_score(responses);
    let tier = Tier::from_score(score);

    let breakdown: Vec<DimensionScore> = Dimension::ALL
        .iter()
        .filter_map(|&dimension| {
            let answer = responses.get(dimension)?;
            let ordinal = ordinal_of(answer)?;
            Some(DimensionScore {
                dimension,
                answer: answer.trim().to_string(),
                ordinal,
                percentage: ordinal as f64 / MAX_ORDINAL as f64 * 100.0,
            })
        })
        .collect();

    let insights = collect_insights(breakdown.iter().map(|d| (d.dimension, d.ordinal)));

    debug!(
        "Assessed {} answers: score {:.1}, tier {}",
        breakdown.len(),
        score,
        tier
    );

    Assessment {
        score,
        tier,
        severity: tier.severity(),
        recommendation: tier.recommendation(),
        answered: breakdown.len(),
        breakdown,
        insights,
    }
}
