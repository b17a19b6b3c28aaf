//! Plain-text rendering of results

use moodcheck_ai_core::artifact::{describe_fill, FeatureHint, Prediction};
use moodcheck_ai_core::schema::format_number;
use moodcheck_ai_core::metrics::EvaluationMetrics;
use moodcheck_ai_core::TrainedArtifact;
use moodcheck_ai_trainer::DatasetSummary;
use moodcheck_screening::{Assessment, Priority, CRISIS_RESOURCES, DISCLAIMER};
use std::fmt::Write;

const RULE: &str = "═══════════════════════════════════════════";

/// Number of importances listed after training
pub const TOP_FEATURES: usize = 10;

pub fn assessment(result: &Assessment) -> String {
    let mut out = String::new();
    let _ = writeln!(out, "{}", RULE);
    let _ = writeln!(out, "Risk score:     {:.1} / 100", result.score);
    let _ = writeln!(out, "Tier:           {}", result.tier);
    let _ = writeln!(out, "Severity:       {}", result.severity);
    let _ = writeln!(out, "Answered:       {} of 11", result.answered);
    let _ = writeln!(out, "Recommendation: {}", result.recommendation);

    if !result.breakdown.is_empty() {
        let _ = writeln!(out, "\nSymptom breakdown:");
        for entry in &result.breakdown {
            let _ = writeln!(
                out,
                "  {:<24} {:<20} {:>5.1}%",
                entry.dimension.label(),
                entry.answer,
                entry.percentage
            );
        }
    }

    if !result.insights.is_empty() {
        let _ = writeln!(out, "\nInsights:");
        for insight in &result.insights {
            let marker = match insight.priority {
                Priority::Crisis => "!!",
                Priority::Advisory => "-",
            };
            let _ = writeln!(out, "  {} {}: {}", marker, insight.title, insight.message);
        }
    }

    if result.insights.iter().any(|i| i.priority == Priority::Crisis) {
        let _ = writeln!(out, "\nCrisis resources:");
        for (name, contact) in CRISIS_RESOURCES {
            let _ = writeln!(out, "  {}: {}", name, contact);
        }
    }

    let _ = writeln!(out, "\n{}", DISCLAIMER);
    out
}

pub fn summary(summary: &DatasetSummary, target: &str) -> String {
    let mut out = String::new();
    let _ = writeln!(out, "Rows:                {}", summary.rows);
    let _ = writeln!(out, "Columns:             {}", summary.columns);
    let _ = writeln!(out, "Missing cells:       {}", summary.missing_cells);
    let _ = writeln!(out, "Duplicate rows:      {}", summary.duplicate_rows);
    let _ = writeln!(out, "Numeric columns:     {}", list(&summary.numeric_columns));
    let _ = writeln!(out, "Categorical columns: {}", list(&summary.categorical_columns));

    if !summary.column_info.is_empty() {
        let _ = writeln!(out, "\nColumns:");
        let _ = writeln!(
            out,
            "  {:<24} {:<12} {:>9} {:>7}",
            "name", "type", "non-null", "unique"
        );
        for info in &summary.column_info {
            let _ = writeln!(
                out,
                "  {:<24} {:<12} {:>9} {:>7}",
                info.name, info.kind, info.non_null, info.unique
            );
        }
        let _ = writeln!(out);
    }

    match &summary.target_distribution {
        Some(distribution) => {
            let _ = writeln!(out, "Target '{}':", target);
            for (label, count) in distribution {
                let share = *count as f64 / summary.rows.max(1) as f64 * 100.0;
                let _ = writeln!(out, "  {:<16} {:>6} ({:.1}%)", label, count, share);
            }
        }
        None => {
            let _ = writeln!(out, "Target '{}': column not found", target);
        }
    }
    out
}

fn list(names: &[String]) -> String {
    if names.is_empty() {
        "-".to_string()
    } else {
        names.join(", ")
    }
}

pub fn metrics(metrics: &EvaluationMetrics) -> String {
    let mut out = String::new();
    let classes = metrics.classes();
    let _ = writeln!(
        out,
        "Accuracy: {:.4} ({} held-out rows)",
        metrics.accuracy,
        metrics.test_size()
    );

    let width = classes.iter().map(String::len).max().unwrap_or(0).max(8);
    let _ = writeln!(out, "\nConfusion matrix (rows = true, columns = predicted):");
    let _ = write!(out, "  {:<width$}", "", width = width);
    for class in classes {
        let _ = write!(out, " {:>width$}", class, width = width);
    }
    let _ = writeln!(out);
    for (class, row) in classes.iter().zip(&metrics.confusion_matrix) {
        let _ = write!(out, "  {:<width$}", class, width = width);
        for count in row {
            let _ = write!(out, " {:>width$}", count, width = width);
        }
        let _ = writeln!(out);
    }

    let report = &metrics.report;
    let _ = writeln!(out, "\nClassification report:");
    let _ = writeln!(
        out,
        "  {:<width$} {:>9} {:>9} {:>9} {:>8}",
        "",
        "precision",
        "recall",
        "f1-score",
        "support",
        width = width
    );
    let rows = classes
        .iter()
        .map(String::as_str)
        .zip(report.per_class.iter())
        .chain([
            ("macro avg", &report.macro_avg),
            ("weighted avg", &report.weighted_avg),
        ]);
    for (name, m) in rows {
        let _ = writeln!(
            out,
            "  {:<width$} {:>9.3} {:>9.3} {:>9.3} {:>8}",
            name,
            m.precision,
            m.recall,
            m.f1_score,
            m.support,
            width = width
        );
    }
    out
}

pub fn importances(importances: &[(String, f64)], limit: usize) -> String {
    let mut out = String::new();
    let _ = writeln!(out, "Top feature importances:");
    for (name, value) in importances.iter().take(limit) {
        let _ = writeln!(out, "  {:<24} {:.4}", name, value);
    }
    out
}

/// Training outcome: metrics plus top importances
pub fn training(artifact: &TrainedArtifact) -> String {
    let mut out = String::new();
    if let Some(m) = &artifact.metrics {
        out.push_str(&metrics(m));
        out.push('\n');
    }
    out.push_str(&importances(&artifact.feature_importance(), TOP_FEATURES));
    out
}

/// Schema, fill values and classes of a loaded artifact
pub fn artifact(artifact: &TrainedArtifact) -> String {
    let mut out = String::new();
    let _ = writeln!(
        out,
        "Model v{} trained {}",
        artifact.format_version,
        artifact.created_at.format("%Y-%m-%d %H:%M:%S UTC")
    );
    let _ = writeln!(out, "Classes: {}", artifact.classes().join(", "));
    let _ = writeln!(out, "Features:");
    for feature in &artifact.schema.features {
        let fill = artifact
            .imputer
            .get(&feature.name)
            .map(describe_fill)
            .unwrap_or_else(|| "-".to_string());
        let _ = writeln!(out, "  {:<24} {:<12} fill {}", feature.name, feature.kind, fill);
    }
    out.push_str(&input_hints(artifact));
    out
}

/// Accepted categories and training ranges per feature
pub fn input_hints(artifact: &TrainedArtifact) -> String {
    let mut out = String::new();
    let _ = writeln!(out, "Accepted input:");
    for (name, hint) in artifact.input_hints() {
        let accepted = match hint {
            FeatureHint::Categories(values) => format!("one of: {}", values.join(", ")),
            FeatureHint::Range(range) => format!(
                "number, trained on {} to {} (mean {:.2})",
                format_number(range.min),
                format_number(range.max),
                range.mean
            ),
            FeatureHint::Unknown => "number".to_string(),
        };
        let _ = writeln!(out, "  {:<24} {}", name, accepted);
    }
    out
}

pub fn prediction(prediction: &Prediction) -> String {
    let mut out = String::new();
    let _ = writeln!(
        out,
        "Prediction: {} ({:.1}% confidence)",
        prediction.label,
        prediction.confidence() * 100.0
    );
    for (class, probability) in prediction.ranked() {
        let _ = writeln!(out, "  {:<16} {:.3}", class, probability);
    }
    out
}
