//! Integration tests for the Random Forest pipeline
//!
//! Train on CSV input, predict, persist and reload.

use anyhow::Result;
use moodcheck_ai_core::config::{ForestConfig, PipelineConfig};
use moodcheck_ai_core::schema::{FeatureRecord, FeatureValue};
use moodcheck_ai_core::{AiCoreError, FeatureHint, TrainedArtifact};
use moodcheck_ai_trainer::{train_model_from_csv, Dataset, ModelTrainer, TrainerError};
use std::io::Write;
use tempfile::{tempdir, NamedTempFile};

fn fast_config() -> PipelineConfig {
    PipelineConfig::default().with_forest(ForestConfig {
        n_trees: 15,
        max_depth: 6,
        min_samples_split: 5,
    })
}

/// Questionnaire-shaped dataset where Mood and Interest drive the label
fn create_screening_dataset() -> Result<NamedTempFile> {
    let mut file = NamedTempFile::new()?;
    writeln!(file, "Age,Gender,Mood,Interest,Sleep_Hours,Depression")?;

    let moods = ["Very good", "Good", "Fair", "Poor", "Very poor"];
    let interests = ["Very interested", "Interested", "Neutral", "Disinterested"];
    for i in 0..120usize {
        let mood = moods[i % moods.len()];
        let interest = interests[(i / 5) % interests.len()];
        let severity = (i % moods.len()) + (i / 5) % interests.len();
        let label = match severity {
            0..=1 => "Normal",
            2..=4 => "Mild",
            _ => "Severe",
        };
        let gender = if i % 2 == 0 { "F" } else { "M" };
        let sleep = if i % 11 == 0 {
            "NA".to_string()
        } else {
            format!("{:.1}", 4.0 + (i % 6) as f64)
        };
        writeln!(
            file,
            "{},{},{},{},{},{}",
            18 + (i * 7) % 50,
            gender,
            mood,
            interest,
            sleep,
            label
        )?;
    }

    file.flush()?;
    Ok(file)
}

fn record(pairs: &[(&str, FeatureValue)]) -> FeatureRecord {
    pairs
        .iter()
        .map(|(k, v)| (k.to_string(), v.clone()))
        .collect()
}

fn sample_record() -> FeatureRecord {
    record(&[
        ("Age", FeatureValue::Number(25.0)),
        ("Gender", "F".into()),
        ("Mood", "Good".into()),
        ("Interest", "Interested".into()),
        ("Sleep_Hours", FeatureValue::Missing),
    ])
}

#[test]
fn test_train_then_predict_known_label() -> Result<()> {
    let file = create_screening_dataset()?;
    let artifact = train_model_from_csv(file.path(), fast_config())?;

    let classes = artifact.classes().to_vec();
    assert_eq!(classes, vec!["Mild", "Normal", "Severe"]);

    let prediction = artifact.predict(&sample_record())?;
    assert!(classes.contains(&prediction.label));
    assert_eq!(prediction.probabilities.len(), 3);
    let total: f64 = prediction.probabilities.iter().sum();
    assert!((total - 1.0).abs() < 1e-9);

    // Target encoder round trip covers every training label
    for (code, class) in classes.iter().enumerate() {
        assert_eq!(artifact.target_encoder.encode(class), Some(code));
        assert_eq!(artifact.target_encoder.decode(code), Some(class.as_str()));
    }
    Ok(())
}

#[test]
fn test_deterministic_training() -> Result<()> {
    let file = create_screening_dataset()?;
    let dataset = Dataset::from_csv(file.path())?;

    let a = ModelTrainer::new(fast_config()).train_and_evaluate(&dataset)?;
    let b = ModelTrainer::new(fast_config()).train_and_evaluate(&dataset)?;

    let (ma, mb) = (a.metrics.as_ref().unwrap(), b.metrics.as_ref().unwrap());
    assert_eq!(ma.accuracy, mb.accuracy);
    assert_eq!(ma.confusion_matrix, mb.confusion_matrix);
    assert_eq!(a.model, b.model);

    let c = ModelTrainer::new(fast_config().with_seed(7)).train_and_evaluate(&dataset)?;
    assert_ne!(a.model, c.model);
    Ok(())
}

#[test]
fn test_constant_features_many_labels() -> Result<()> {
    let labels = ["No", "Yes", "Maybe"];
    let mut csv = String::from("Age,Mood,Depression\n");
    for i in 0..100 {
        csv.push_str(&format!("30,Good,{}\n", labels[i % labels.len()]));
    }
    let dataset = Dataset::from_csv_str(&csv)?;
    let artifact = ModelTrainer::new(fast_config()).train_and_evaluate(&dataset)?;
    let metrics = artifact.metrics.as_ref().unwrap();

    assert_eq!(metrics.confusion_matrix.len(), 3);
    assert!(metrics.confusion_matrix.iter().all(|row| row.len() == 3));
    assert!((0.0..=1.0).contains(&metrics.accuracy));
    Ok(())
}

#[test]
fn test_single_class_dataset() -> Result<()> {
    let mut csv = String::from("Age,Mood,Depression\n");
    for i in 0..20 {
        csv.push_str(&format!("{},Good,No\n", 20 + i));
    }
    let dataset = Dataset::from_csv_str(&csv)?;
    let artifact = ModelTrainer::new(fast_config()).train_and_evaluate(&dataset)?;

    assert_eq!(artifact.classes(), ["No"]);
    let prediction = artifact.predict(&record(&[
        ("Age", FeatureValue::Number(40.0)),
        ("Mood", "Good".into()),
    ]))?;
    assert_eq!(prediction.label, "No");
    assert_eq!(prediction.probabilities, vec![1.0]);
    Ok(())
}

#[test]
fn test_inference_errors() -> Result<()> {
    let file = create_screening_dataset()?;
    let artifact = train_model_from_csv(file.path(), fast_config())?;

    let mut unseen = sample_record();
    unseen.insert("Mood".into(), "Ecstatic".into());
    assert!(matches!(
        artifact.predict(&unseen),
        Err(AiCoreError::UnseenCategory { ref feature, .. }) if feature == "Mood"
    ));

    let mut missing = sample_record();
    missing.remove("Interest");
    assert!(matches!(
        artifact.predict(&missing),
        Err(AiCoreError::FeatureOrderMismatch { .. })
    ));
    Ok(())
}

#[test]
fn test_saved_artifact_reloads() -> Result<()> {
    let file = create_screening_dataset()?;
    let artifact = train_model_from_csv(file.path(), fast_config())?;

    let dir = tempdir()?;
    let path = dir.path().join("models").join("depression_model.json");
    artifact.save(&path)?;

    let loaded = TrainedArtifact::load_expecting(&path, &artifact.schema)?;
    assert_eq!(
        loaded.predict(&sample_record())?,
        artifact.predict(&sample_record())?
    );
    assert_eq!(loaded.metrics, artifact.metrics);

    let mut csv = String::from("Age,Depression\n");
    for i in 0..10 {
        csv.push_str(&format!("{},{}\n", 20 + i, if i % 2 == 0 { "No" } else { "Yes" }));
    }
    let other = ModelTrainer::new(fast_config())
        .prepare_data(&Dataset::from_csv_str(&csv)?)?
        .schema;
    assert!(matches!(
        TrainedArtifact::load_expecting(&path, &other),
        Err(AiCoreError::IncompatibleArtifact(_))
    ));
    Ok(())
}

#[test]
fn test_missing_target_column() -> Result<()> {
    let dataset = Dataset::from_csv_str("Age,Mood\n30,Good\n31,Poor\n")?;
    let err = ModelTrainer::new(fast_config())
        .train_and_evaluate(&dataset)
        .unwrap_err();
    assert!(matches!(err, TrainerError::MissingTargetColumn(_)));
    Ok(())
}

#[test]
fn test_numeric_looking_categories_predict() -> Result<()> {
    let levels = ["1.0", "2.0", "?"];
    let mut csv = String::from("Financial Stress,Depression\n");
    for i in 0..60usize {
        let stress = levels[i % levels.len()];
        let label = if stress == "2.0" { "Yes" } else { "No" };
        csv.push_str(&format!("{},{}\n", stress, label));
    }
    let dataset = Dataset::from_csv_str(&csv)?;
    let artifact = ModelTrainer::new(fast_config()).train_and_evaluate(&dataset)?;
    assert_eq!(
        artifact.feature_encoders["Financial Stress"].classes(),
        ["1.0", "2.0", "?"]
    );

    for raw in ["2.0", "2", "?", "1.0"] {
        let prediction =
            artifact.predict(&record(&[("Financial Stress", FeatureValue::parse(raw))]))?;
        let expected = if raw.starts_with('2') { "Yes" } else { "No" };
        assert_eq!(prediction.label, expected, "stress {}", raw);
    }
    Ok(())
}

#[test]
fn test_input_hints_cover_every_feature() -> Result<()> {
    let file = create_screening_dataset()?;
    let artifact = train_model_from_csv(file.path(), fast_config())?;

    let hints = artifact.input_hints();
    let names: Vec<&str> = hints.iter().map(|(name, _)| *name).collect();
    assert_eq!(names, artifact.feature_names());

    for (name, hint) in &hints {
        match (*name, hint) {
            ("Gender", FeatureHint::Categories(values)) => assert_eq!(values, &["F", "M"]),
            ("Age", FeatureHint::Range(range)) => {
                assert!(range.min >= 18.0 && range.max <= 67.0 && range.min < range.mean);
            }
            ("Sleep_Hours", FeatureHint::Range(range)) => assert_eq!(range.max, 9.0),
            ("Mood" | "Interest", FeatureHint::Categories(values)) => assert!(!values.is_empty()),
            other => panic!("unexpected hint {:?}", other),
        }
    }
    Ok(())
}
