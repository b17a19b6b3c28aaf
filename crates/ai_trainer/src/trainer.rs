//! Random Forest training pipeline
//!
//! prepare (impute, encode) -> stratified split -> standardize -> grow
//! trees -> evaluate -> bundle into a [`TrainedArtifact`].

use moodcheck_ai_core::config::PipelineConfig;
use moodcheck_ai_core::forest::RandomForest;
use moodcheck_ai_core::metrics::EvaluationMetrics;
use moodcheck_ai_core::model::FittedModel;
use moodcheck_ai_core::preprocessing::{FillValue, Imputer, LabelEncoder, StandardScaler};
use moodcheck_ai_core::schema::{FeatureKind, FeatureSchema, FeatureSpec, NumericRange};
use moodcheck_ai_core::TrainedArtifact;
use std::collections::BTreeMap;
use tracing::{debug, info, instrument, warn};

use crate::cart::{CartBuilder, TreeConfig};
use crate::dataset::{ColumnData, Dataset};
use crate::deterministic::{mix64, LcgRng};
use crate::errors::{Result, TrainerError};
use crate::split::stratified_split;

/// Encoded table ready for splitting
#[derive(Debug, Clone)]
pub struct PreparedData {
    pub schema: FeatureSchema,
    pub imputer: Imputer,
    pub feature_encoders: BTreeMap<String, LabelEncoder>,
    pub target_encoder: LabelEncoder,
    /// Observed span of each numeric feature before filling
    pub numeric_ranges: BTreeMap<String, NumericRange>,
    /// Row-major, imputed and encoded, not yet scaled
    pub features: Vec<Vec<f64>>,
    pub labels: Vec<usize>,
    /// Rows dropped because their target cell was missing
    pub dropped_rows: usize,
}

impl PreparedData {
    pub fn n_classes(&self) -> usize {
        self.target_encoder.len()
    }

    fn select(&self, rows: &[usize]) -> (Vec<Vec<f64>>, Vec<usize>) {
        rows.iter()
            .map(|&r| (self.features[r].clone(), self.labels[r]))
            .unzip()
    }
}

/// Random Forest trainer
pub struct ModelTrainer {
    config: PipelineConfig,
}

impl ModelTrainer {
    pub fn new(config: PipelineConfig) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &PipelineConfig {
        &self.config
    }

    /// Drop unlabeled rows, fill missing cells and encode categories
    pub fn prepare_data(&self, dataset: &Dataset) -> Result<PreparedData> {
        let target_name = self.config.target_column.as_str();
        let target = dataset
            .column(target_name)
            .ok_or_else(|| TrainerError::MissingTargetColumn(target_name.to_string()))?;

        let mut kept = Vec::with_capacity(dataset.n_rows());
        let mut raw_labels = Vec::with_capacity(dataset.n_rows());
        for row in 0..dataset.n_rows() {
            if let Some(label) = target.data.text_at(row) {
                kept.push(row);
                raw_labels.push(label);
            }
        }

        let dropped_rows = dataset.n_rows() - kept.len();
        if dropped_rows > 0 {
            warn!(
                "Dropped {} rows with a missing '{}' value",
                dropped_rows, target_name
            );
        }
        if kept.is_empty() {
            return Err(TrainerError::InsufficientData(format!(
                "no rows have a '{}' value",
                target_name
            )));
        }

        let target_encoder = LabelEncoder::fit(&raw_labels);
        let labels = raw_labels
            .iter()
            .map(|l| target_encoder.encode(l).unwrap_or_default())
            .collect();

        let mut specs = Vec::new();
        let mut imputer = Imputer::new();
        let mut feature_encoders = BTreeMap::new();
        let mut numeric_ranges = BTreeMap::new();
        let mut encoded_columns: Vec<Vec<f64>> = Vec::new();

        for column in dataset.columns().iter().filter(|c| c.name != target_name) {
            match &column.data {
                ColumnData::Numeric(cells) => {
                    let observed: Vec<Option<f64>> = kept.iter().map(|&r| cells[r]).collect();
                    let mean = Imputer::mean_of(&observed);
                    if let Some(range) = NumericRange::of(&observed) {
                        numeric_ranges.insert(column.name.clone(), range);
                    }
                    imputer.insert(column.name.clone(), FillValue::Mean(mean));
                    encoded_columns.push(observed.iter().map(|v| v.unwrap_or(mean)).collect());
                    specs.push(FeatureSpec::new(column.name.clone(), FeatureKind::Numeric));
                }
                ColumnData::Categorical(cells) => {
                    let observed: Vec<Option<String>> =
                        kept.iter().map(|&r| cells[r].clone()).collect();
                    let mode = Imputer::mode_of(&observed);
                    let filled: Vec<String> = observed
                        .into_iter()
                        .map(|v| v.unwrap_or_else(|| mode.clone()))
                        .collect();

                    let encoder = LabelEncoder::fit(&filled);
                    encoded_columns.push(
                        filled
                            .iter()
                            .map(|v| encoder.encode(v).unwrap_or_default() as f64)
                            .collect(),
                    );
                    debug!(
                        "Encoded '{}' with {} categories",
                        column.name,
                        encoder.len()
                    );
                    imputer.insert(column.name.clone(), FillValue::MostFrequent(mode));
                    feature_encoders.insert(column.name.clone(), encoder);
                    specs.push(FeatureSpec::new(
                        column.name.clone(),
                        FeatureKind::Categorical,
                    ));
                }
            }
        }

        if specs.is_empty() {
            warn!("Dataset has no feature columns besides '{}'", target_name);
        }

        let features = (0..kept.len())
            .map(|i| encoded_columns.iter().map(|col| col[i]).collect())
            .collect();

        Ok(PreparedData {
            schema: FeatureSchema::new(specs),
            imputer,
            feature_encoders,
            target_encoder,
            numeric_ranges,
            features,
            labels,
            dropped_rows,
        })
    }

    /// Fit the standardizer and grow the forest on training rows
    pub fn train(
        &self,
        features: &[Vec<f64>],
        labels: &[usize],
        n_classes: usize,
    ) -> Result<FittedModel> {
        if features.is_empty() {
            return Err(TrainerError::InsufficientData(
                "training partition is empty".to_string(),
            ));
        }

        let scaler = StandardScaler::fit(features);
        let scaled = scaler.transform(features)?;
        let n_samples = scaled.len();
        let n_features = scaler.n_features();

        let forest_config = &self.config.forest;
        let tree_config = TreeConfig {
            max_depth: forest_config.max_depth,
            min_samples_split: forest_config.min_samples_split,
            max_features: ((n_features as f64).sqrt().floor() as usize).max(1),
        };
        let builder = CartBuilder::new(&scaled, labels, n_classes, tree_config);

        let mut trees = Vec::with_capacity(forest_config.n_trees);
        for tree_idx in 0..forest_config.n_trees {
            let mut rng = LcgRng::new(mix64(self.config.seed, tree_idx as u64 + 1));
            let bootstrap: Vec<usize> = (0..n_samples).map(|_| rng.next_below(n_samples)).collect();
            let tree = builder.build(&bootstrap, &mut rng);

            debug!(
                "Tree {}/{}: {} nodes, {} leaves, depth {}",
                tree_idx + 1,
                forest_config.n_trees,
                tree.nodes.len(),
                tree.leaf_count(),
                tree.depth()
            );
            trees.push(tree);
        }

        Ok(FittedModel::new(
            scaler,
            RandomForest::new(trees, n_classes, n_features),
        ))
    }

    /// Score a fitted model on held-out rows
    pub fn evaluate(
        model: &FittedModel,
        features: &[Vec<f64>],
        labels: &[usize],
        classes: &[String],
    ) -> Result<EvaluationMetrics> {
        let predictions = features
            .iter()
            .map(|row| model.predict(row))
            .collect::<std::result::Result<Vec<_>, _>>()?;
        Ok(EvaluationMetrics::compute(
            labels.to_vec(),
            predictions,
            classes,
        ))
    }

    /// Full pipeline from a loaded dataset to an evaluated artifact
    #[instrument(skip_all, fields(target = %self.config.target_column, seed = self.config.seed))]
    pub fn train_and_evaluate(&self, dataset: &Dataset) -> Result<TrainedArtifact> {
        self.config
            .validate()
            .map_err(|e| TrainerError::InvalidConfig(e.to_string()))?;

        info!("═══════════════════════════════════════════");
        info!(
            "Training on {} rows x {} columns",
            dataset.n_rows(),
            dataset.n_columns()
        );

        let prepared = self.prepare_data(dataset)?;
        let classes = prepared.target_encoder.classes().to_vec();
        info!(
            "Prepared {} features, {} classes: {:?}",
            prepared.schema.len(),
            classes.len(),
            classes
        );

        let mut rng = LcgRng::new(self.config.seed);
        let split = stratified_split(
            &prepared.labels,
            prepared.n_classes(),
            self.config.test_size,
            &mut rng,
        )?;
        let (x_train, y_train) = prepared.select(&split.train);
        let (x_test, y_test) = prepared.select(&split.test);
        info!("Split: {} train / {} test", x_train.len(), x_test.len());

        info!("Growing {} trees...", self.config.forest.n_trees);
        let model = self.train(&x_train, &y_train, prepared.n_classes())?;
        let metrics = Self::evaluate(&model, &x_test, &y_test, &classes)?;

        info!("Training complete!");
        info!("  Accuracy: {:.4}", metrics.accuracy);
        info!("═══════════════════════════════════════════");

        let PreparedData {
            schema,
            imputer,
            feature_encoders,
            target_encoder,
            numeric_ranges,
            ..
        } = prepared;

        Ok(TrainedArtifact::new(
            schema,
            imputer,
            feature_encoders,
            target_encoder,
            model,
            Some(metrics),
        )?
        .with_numeric_ranges(numeric_ranges))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use moodcheck_ai_core::config::ForestConfig;

    fn small_config() -> PipelineConfig {
        PipelineConfig::default().with_forest(ForestConfig {
            n_trees: 10,
            max_depth: 4,
            min_samples_split: 2,
        })
    }

    fn dataset() -> Dataset {
        let mut csv = String::from("Age,Mood,Depression\n");
        for i in 0..40 {
            let (mood, label) = if i % 2 == 0 { ("Good", "No") } else { ("Poor", "Yes") };
            csv.push_str(&format!("{},{},{}\n", 30 + i % 3, mood, label));
        }
        csv.push_str(",NA,No\n");
        csv.push_str("33,Good,\n");
        Dataset::from_csv_str(&csv).unwrap()
    }

    #[test]
    fn test_prepare_data() {
        let trainer = ModelTrainer::new(small_config());
        let prepared = trainer.prepare_data(&dataset()).unwrap();

        assert_eq!(prepared.dropped_rows, 1);
        assert_eq!(prepared.features.len(), 41);
        assert_eq!(prepared.schema.names(), vec!["Age", "Mood"]);
        assert_eq!(prepared.target_encoder.classes(), ["No", "Yes"]);

        // Missing Age is filled with the mean of the 40 observed ages
        let mean = (0..40).map(|i| 30.0 + (i % 3) as f64).sum::<f64>() / 40.0;
        assert!((prepared.features[40][0] - mean).abs() < 1e-12);
        // Missing Mood is filled with the mode (tie -> "Good")
        assert_eq!(prepared.features[40][1], 0.0);
        assert_eq!(
            prepared.imputer.get("Mood"),
            Some(&FillValue::MostFrequent("Good".to_string()))
        );
    }

    #[test]
    fn test_missing_target_column() {
        let mut config = small_config();
        config.target_column = "Label".to_string();
        let err = ModelTrainer::new(config).prepare_data(&dataset()).unwrap_err();
        assert!(matches!(err, TrainerError::MissingTargetColumn(ref c) if c == "Label"));
    }

    #[test]
    fn test_train_and_evaluate() {
        let trainer = ModelTrainer::new(small_config());
        let artifact = trainer.train_and_evaluate(&dataset()).unwrap();
        let metrics = artifact.metrics.as_ref().unwrap();

        assert_eq!(artifact.model.classifier.trees.len(), 10);
        assert_eq!(metrics.test_size(), 9);
        assert_eq!(metrics.confusion_matrix.len(), 2);
        // Mood alone separates the classes
        assert!(metrics.accuracy >= 0.8, "accuracy {}", metrics.accuracy);
    }

    #[test]
    fn test_determinism() {
        let a = ModelTrainer::new(small_config())
            .train_and_evaluate(&dataset())
            .unwrap();
        let b = ModelTrainer::new(small_config())
            .train_and_evaluate(&dataset())
            .unwrap();
        assert_eq!(a.model, b.model);
        assert_eq!(a.metrics, b.metrics);
    }

    #[test]
    fn test_numeric_ranges_travel_with_artifact() {
        let trainer = ModelTrainer::new(small_config());
        let prepared = trainer.prepare_data(&dataset()).unwrap();
        let age = prepared.numeric_ranges["Age"];
        assert_eq!((age.min, age.max), (30.0, 32.0));
        assert!(!prepared.numeric_ranges.contains_key("Mood"));

        let artifact = trainer.train_and_evaluate(&dataset()).unwrap();
        assert_eq!(artifact.numeric_ranges, prepared.numeric_ranges);
    }

    #[test]
    fn test_singleton_classes_leave_nothing_held_out() {
        let dataset = Dataset::from_csv_str("Age,Depression\n30,No\n40,Yes\n").unwrap();
        let artifact = ModelTrainer::new(small_config())
            .train_and_evaluate(&dataset)
            .unwrap();
        let metrics = artifact.metrics.as_ref().unwrap();

        assert_eq!(metrics.test_size(), 0);
        assert_eq!(metrics.accuracy, 0.0);
        assert_eq!(metrics.confusion_matrix, vec![vec![0, 0], vec![0, 0]]);
        assert_eq!(artifact.classes(), ["No", "Yes"]);
    }

    #[test]
    fn test_invalid_config() {
        let trainer = ModelTrainer::new(small_config().with_test_size(1.5));
        assert!(matches!(
            trainer.train_and_evaluate(&dataset()),
            Err(TrainerError::InvalidConfig(_))
        ));
    }
}
