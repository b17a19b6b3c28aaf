//! Dataset sources: local files and HTTP URLs

use std::fmt;
use std::path::PathBuf;
use tracing::info;

use crate::dataset::Dataset;
use crate::errors::{Result, TrainerError};

/// Where a CSV dataset comes from
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DataSource {
    File(PathBuf),
    Url(String),
}

impl DataSource {
    /// `http://` and `https://` locations are URLs, anything else is a path
    pub fn parse(location: &str) -> Self {
        let trimmed = location.trim();
        if trimmed.starts_with("http://") || trimmed.starts_with("https://") {
            DataSource::Url(trimmed.to_string())
        } else {
            DataSource::File(PathBuf::from(trimmed))
        }
    }

    pub fn load(&self) -> Result<Dataset> {
        match self {
            DataSource::File(path) => Dataset::from_csv(path),
            DataSource::Url(url) => {
                let body = fetch_csv(url)?;
                let dataset = Dataset::from_csv_str(&body)?;
                info!(
                    "Loaded {} rows x {} columns from {}",
                    dataset.n_rows(),
                    dataset.n_columns(),
                    url
                );
                Ok(dataset)
            }
        }
    }
}

impl fmt::Display for DataSource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            DataSource::File(path) => write!(f, "{}", path.display()),
            DataSource::Url(url) => write!(f, "{}", url),
        }
    }
}

/// Fetch CSV text with one blocking GET
#[cfg(feature = "remote_loading")]
pub fn fetch_csv(url: &str) -> Result<String> {
    info!("Fetching dataset from: {}", url);
    let response = reqwest::blocking::get(url)
        .and_then(|r| r.error_for_status())
        .map_err(|e| TrainerError::DataLoad(format!("request to {} failed: {}", url, e)))?;

    response
        .text()
        .map_err(|e| TrainerError::DataLoad(format!("failed to read body from {}: {}", url, e)))
}

#[cfg(not(feature = "remote_loading"))]
pub fn fetch_csv(url: &str) -> Result<String> {
    Err(TrainerError::DataLoad(format!(
        "cannot fetch {}: built without remote loading support",
        url
    )))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parse_distinguishes_urls() {
        assert_eq!(
            DataSource::parse("https://example.org/data.csv"),
            DataSource::Url("https://example.org/data.csv".into())
        );
        assert_eq!(
            DataSource::parse(" data/mental_health.csv "),
            DataSource::File(PathBuf::from("data/mental_health.csv"))
        );
    }

    #[test]
    fn unreachable_url_is_data_load_error() {
        // Port 9 on localhost (discard) is expected to refuse connections
        let result = DataSource::parse("http://127.0.0.1:9/data.csv").load();
        assert!(matches!(result, Err(TrainerError::DataLoad(_))));
    }
}
