//! Canned guidance for elevated symptom dimensions

use serde::Serialize;

use crate::table::Dimension;

/// Urgency of an insight
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Priority {
    /// Crisis-resource guidance, always listed first
    Crisis,
    Advisory,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Insight {
    pub dimension: Dimension,
    pub priority: Priority,
    pub title: &'static str,
    pub message: &'static str,
}

/// Crisis lines shown alongside crisis insights
pub const CRISIS_RESOURCES: &[(&str, &str)] = &[
    ("Suicide & Crisis Lifeline", "call or text 988 (24/7)"),
    ("Crisis Text Line", "text HOME to 741741"),
    ("Emergency services", "911 if in immediate danger"),
];

fn guidance(dimension: Dimension) -> (&'static str, &'static str) {
    match dimension {
        Dimension::Mood => (
            "Mood",
            "Persistent low mood detected. Consider mood tracking and journaling.",
        ),
        Dimension::Sleep => (
            "Sleep",
            "Sleep disturbances noted. Establish a regular sleep routine and reduce screen time before bed.",
        ),
        Dimension::Energy => (
            "Energy",
            "Low energy levels. Consider regular physical activity and balanced nutrition.",
        ),
        Dimension::Appetite => (
            "Appetite",
            "Marked appetite changes. Keep regular mealtimes and mention the change to a doctor.",
        ),
        Dimension::Concentration => (
            "Focus",
            "Difficulty concentrating. Try mindfulness exercises and break tasks into smaller steps.",
        ),
        Dimension::Anxiety => (
            "Anxiety",
            "Frequent anxiety or worry. Breathing exercises and limiting caffeine can help; persistent worry is worth discussing with a professional.",
        ),
        Dimension::Social => (
            "Social",
            "Social withdrawal detected. Consider joining support groups or social activities.",
        ),
        Dimension::Interest => (
            "Interest",
            "Loss of interest in once-enjoyed activities. Schedule one small pleasant activity each day.",
        ),
        Dimension::Guilt => (
            "Self-worth",
            "Strong feelings of guilt or worthlessness. Talking them through with someone you trust or a counselor can help.",
        ),
        Dimension::Suicidal => (
            "Important",
            "If you're having suicidal thoughts, please call emergency services or a crisis hotline immediately.",
        ),
        Dimension::Hobby => (
            "Hobbies",
            "Loss of interest in hobbies. Try reintroducing small enjoyable activities gradually.",
        ),
    }
}

/// Insight for a dimension at the given ordinal, if it crosses the threshold
pub fn insight_for(dimension: Dimension, ordinal: u8) -> Option<Insight> {
    if ordinal < dimension.insight_threshold() {
        return None;
    }
    let (title, message) = guidance(dimension);
    let priority = if dimension == Dimension::Suicidal {
        Priority::Crisis
    } else {
        Priority::Advisory
    };
    Some(Insight {
        dimension,
        priority,
        title,
        message,
    })
}

/// Insights for `(dimension, ordinal)` pairs, crisis items first
pub fn collect_insights<I>(ordinals: I) -> Vec<Insight>
where
    I: IntoIterator<Item = (Dimension, u8)>,
{
    let mut insights: Vec<Insight> = ordinals
        .into_iter()
        .filter_map(|(dimension, ordinal)| insight_for(dimension, ordinal))
        .collect();
    // Stable sort keeps dimension order within a priority
    insights.sort_by_key(|i| i.priority);
    insights
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn thresholds() {
        assert!(insight_for(Dimension::Mood, 2).is_none());
        assert!(insight_for(Dimension::Mood, 3).is_some());
        assert!(insight_for(Dimension::Suicidal, 1).is_none());
        assert_eq!(
            insight_for(Dimension::Suicidal, 2).map(|i| i.priority),
            Some(Priority::Crisis)
        );
    }

    #[test]
    fn crisis_is_listed_first() {
        let insights = collect_insights([
            (Dimension::Mood, 4),
            (Dimension::Sleep, 3),
            (Dimension::Suicidal, 2),
        ]);
        let order: Vec<Dimension> = insights.iter().map(|i| i.dimension).collect();
        assert_eq!(order, vec![Dimension::Suicidal, Dimension::Mood, Dimension::Sleep]);
    }

    #[test]
    fn every_dimension_has_guidance() {
        for dimension in Dimension::ALL {
            let insight = insight_for(dimension, 4).unwrap();
            assert!(!insight.message.is_empty());
        }
    }
}
