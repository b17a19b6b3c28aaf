//! Session context: the current dataset, trained artifact and configuration

use moodcheck_ai_core::artifact::Prediction;
use moodcheck_ai_core::config::PipelineConfig;
use moodcheck_ai_core::schema::FeatureRecord;
use moodcheck_ai_core::TrainedArtifact;
use std::path::{Path, PathBuf};
use tracing::info;

use crate::dataset::{Dataset, DatasetSummary};
use crate::errors::{Result, TrainerError};
use crate::loader::DataSource;
use crate::trainer::ModelTrainer;

/// Owns everything one interactive run works on
#[derive(Debug, Clone, Default)]
pub struct Session {
    config: PipelineConfig,
    source: Option<DataSource>,
    dataset: Option<Dataset>,
    artifact: Option<TrainedArtifact>,
}

impl Session {
    pub fn new(config: PipelineConfig) -> Self {
        Self {
            config,
            ..Self::default()
        }
    }

    pub fn config(&self) -> &PipelineConfig {
        &self.config
    }

    pub fn source(&self) -> Option<&DataSource> {
        self.source.as_ref()
    }

    pub fn dataset(&self) -> Option<&Dataset> {
        self.dataset.as_ref()
    }

    pub fn artifact(&self) -> Option<&TrainedArtifact> {
        self.artifact.as_ref()
    }

    /// Replace the dataset; any trained artifact is dropped
    pub fn load(&mut self, source: DataSource) -> Result<&Dataset> {
        let dataset = source.load()?;
        if self.artifact.take().is_some() {
            info!("Discarded trained model after loading new data");
        }
        self.source = Some(source);
        Ok(&*self.dataset.insert(dataset))
    }

    pub fn load_path<P: AsRef<Path>>(&mut self, path: P) -> Result<&Dataset> {
        self.load(DataSource::File(path.as_ref().to_path_buf()))
    }

    pub fn load_url(&mut self, url: &str) -> Result<&Dataset> {
        self.load(DataSource::Url(url.to_string()))
    }

    pub fn summary(&self) -> Result<DatasetSummary> {
        let dataset = self.dataset.as_ref().ok_or(TrainerError::NoDataset)?;
        Ok(dataset.summary(&self.config.target_column))
    }

    /// Train on the loaded dataset, optionally overriding test size and seed
    pub fn train(&mut self, test_size: Option<f64>, seed: Option<u64>) -> Result<&TrainedArtifact> {
        let dataset = self.dataset.as_ref().ok_or(TrainerError::NoDataset)?;

        let mut config = self.config.clone();
        if let Some(test_size) = test_size {
            config = config.with_test_size(test_size);
        }
        if let Some(seed) = seed {
            config = config.with_seed(seed);
        }

        let artifact = ModelTrainer::new(config).train_and_evaluate(dataset)?;
        Ok(&*self.artifact.insert(artifact))
    }

    pub fn predict(&self, record: &FeatureRecord) -> Result<Prediction> {
        let artifact = self.artifact.as_ref().ok_or(TrainerError::NotTrained)?;
        Ok(artifact.predict(record)?)
    }

    pub fn predict_many(&self, records: &[FeatureRecord]) -> Result<Vec<Prediction>> {
        let artifact = self.artifact.as_ref().ok_or(TrainerError::NotTrained)?;
        Ok(artifact.predict_many(records)?)
    }

    /// Persist the artifact; defaults to the configured model path
    pub fn save_model(&self, path: Option<&Path>) -> Result<PathBuf> {
        let artifact = self.artifact.as_ref().ok_or(TrainerError::NotTrained)?;
        let path = path
            .map(Path::to_path_buf)
            .unwrap_or_else(|| self.config.model_path.clone());
        artifact.save(&path)?;
        Ok(path)
    }

    /// Load a persisted artifact; defaults to the configured model path
    pub fn load_model(&mut self, path: Option<&Path>) -> Result<&TrainedArtifact> {
        let path = path
            .map(Path::to_path_buf)
            .unwrap_or_else(|| self.config.model_path.clone());
        let artifact = TrainedArtifact::load(&path)?;
        Ok(&*self.artifact.insert(artifact))
    }

    /// Forget the dataset and the artifact, keeping the configuration
    pub fn reset(&mut self) {
        self.source = None;
        self.dataset = None;
        self.artifact = None;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use moodcheck_ai_core::config::ForestConfig;
    use moodcheck_ai_core::schema::FeatureValue;
    use std::io::Write;
    use tempfile::{tempdir, NamedTempFile};

    fn config() -> PipelineConfig {
        PipelineConfig::default().with_forest(ForestConfig {
            n_trees: 5,
            max_depth: 3,
            min_samples_split: 2,
        })
    }

    fn csv_file() -> NamedTempFile {
        let mut file = NamedTempFile::new().unwrap();
        writeln!(file, "Sleep,Mood,Depression").unwrap();
        for i in 0..30 {
            let (mood, label) = if i % 3 == 0 { ("Poor", "Yes") } else { ("Good", "No") };
            writeln!(file, "{},{},{}", 5 + i % 4, mood, label).unwrap();
        }
        file.flush().unwrap();
        file
    }

    #[test]
    fn operations_require_state() {
        let mut session = Session::new(config());
        assert!(matches!(session.summary(), Err(TrainerError::NoDataset)));
        assert!(matches!(session.train(None, None), Err(TrainerError::NoDataset)));
        assert!(matches!(
            session.predict(&FeatureRecord::new()),
            Err(TrainerError::NotTrained)
        ));
        assert!(matches!(session.save_model(None), Err(TrainerError::NotTrained)));
    }

    #[test]
    fn load_train_predict_save() {
        let file = csv_file();
        let mut session = Session::new(config());
        session.load_path(file.path()).unwrap();
        assert_eq!(session.summary().unwrap().rows, 30);

        session.train(Some(0.3), Some(7)).unwrap();
        let record: FeatureRecord = [
            ("Sleep".to_string(), FeatureValue::Number(6.0)),
            ("Mood".to_string(), FeatureValue::Text("Good".into())),
        ]
        .into_iter()
        .collect();
        let prediction = session.predict(&record).unwrap();
        assert!(["No", "Yes"].contains(&prediction.label.as_str()));

        let dir = tempdir().unwrap();
        let path = dir.path().join("model.json");
        session.save_model(Some(&path)).unwrap();

        let mut other = Session::new(config());
        other.load_model(Some(&path)).unwrap();
        assert_eq!(other.predict(&record).unwrap(), prediction);
    }

    #[test]
    fn reloading_data_drops_the_model() {
        let file = csv_file();
        let mut session = Session::new(config());
        session.load_path(file.path()).unwrap();
        session.train(None, None).unwrap();
        assert!(session.artifact().is_some());

        session.load_path(file.path()).unwrap();
        assert!(session.artifact().is_none());

        // A failed load keeps the current state
        assert!(session.load_path("/no/such/file.csv").is_err());
        assert!(session.dataset().is_some());

        session.reset();
        assert!(session.dataset().is_none());
    }
}
