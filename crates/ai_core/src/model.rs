//! Standardizer + classifier pair fitted by one training run

use crate::errors::Result;
use crate::forest::{argmax, RandomForest};
use crate::preprocessing::StandardScaler;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FittedModel {
    pub scaler: StandardScaler,
    pub classifier: RandomForest,
}

impl FittedModel {
    pub fn new(scaler: StandardScaler, classifier: RandomForest) -> Self {
        Self { scaler, classifier }
    }

    /// Class probabilities for an encoded, unscaled feature row
    pub fn predict_proba(&self, row: &[f64]) -> Result<Vec<f64>> {
        let scaled = self.scaler.transform_row(row)?;
        Ok(self.classifier.predict_proba(&scaled))
    }

    pub fn predict(&self, row: &[f64]) -> Result<usize> {
        Ok(argmax(&self.predict_proba(row)?))
    }

    pub fn validate(&self) -> Result<()> {
        self.scaler.validate()?;
        self.classifier.validate()?;
        if self.scaler.n_features() != self.classifier.n_features {
            return Err(crate::errors::AiCoreError::InvalidParameters(format!(
                "scaler expects {} features but classifier expects {}",
                self.scaler.n_features(),
                self.classifier.n_features
            )));
        }
        Ok(())
    }
}
