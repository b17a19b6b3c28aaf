//! CSV dataset loading and typing
//!
//! Reads a header row plus data rows, trims every field and fixes each
//! column's kind once: a column is numeric when every non-missing cell
//! parses as a finite number, categorical otherwise.

use moodcheck_ai_core::schema::{format_number, is_missing_token, parse_number, FeatureKind};
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, BTreeSet, HashSet};
use std::fs::File;
use std::io::Read;
use std::path::Path;
use tracing::{debug, info};

use crate::errors::{Result, TrainerError};

/// Column kind decided at load time
pub type ColumnKind = FeatureKind;

/// Typed cells of one column; `None` marks a missing cell
#[derive(Debug, Clone, PartialEq)]
pub enum ColumnData {
    Numeric(Vec<Option<f64>>),
    Categorical(Vec<Option<String>>),
}

impl ColumnData {
    pub fn kind(&self) -> ColumnKind {
        match self {
            ColumnData::Numeric(_) => FeatureKind::Numeric,
            ColumnData::Categorical(_) => FeatureKind::Categorical,
        }
    }

    pub fn len(&self) -> usize {
        match self {
            ColumnData::Numeric(v) => v.len(),
            ColumnData::Categorical(v) => v.len(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn is_missing(&self, row: usize) -> bool {
        match self {
            ColumnData::Numeric(v) => v.get(row).map_or(true, Option::is_none),
            ColumnData::Categorical(v) => v.get(row).map_or(true, Option::is_none),
        }
    }

    pub fn missing_count(&self) -> usize {
        match self {
            ColumnData::Numeric(v) => v.iter().filter(|c| c.is_none()).count(),
            ColumnData::Categorical(v) => v.iter().filter(|c| c.is_none()).count(),
        }
    }

    /// Cell rendered as text; numbers use the same rendering as labels
    pub fn text_at(&self, row: usize) -> Option<String> {
        match self {
            ColumnData::Numeric(v) => v.get(row).copied().flatten().map(format_number),
            ColumnData::Categorical(v) => v.get(row).cloned().flatten(),
        }
    }

    /// Type a column of trimmed raw cells
    fn from_raw(cells: Vec<String>) -> Self {
        let numeric = cells
            .iter()
            .filter(|c| !is_missing_token(c))
            .all(|c| parse_number(c).is_some());

        if numeric {
            ColumnData::Numeric(
                cells
                    .iter()
                    .map(|c| if is_missing_token(c) { None } else { parse_number(c) })
                    .collect(),
            )
        } else {
            ColumnData::Categorical(
                cells
                    .into_iter()
                    .map(|c| if is_missing_token(&c) { None } else { Some(c) })
                    .collect(),
            )
        }
    }
}

/// A named column
#[derive(Debug, Clone, PartialEq)]
pub struct Column {
    pub name: String,
    pub data: ColumnData,
}

impl Column {
    pub fn new(name: impl Into<String>, data: ColumnData) -> Self {
        Self {
            name: name.into(),
            data,
        }
    }

    pub fn kind(&self) -> ColumnKind {
        self.data.kind()
    }
}

/// Loaded table with typed columns
#[derive(Debug, Clone, PartialEq)]
pub struct Dataset {
    columns: Vec<Column>,
    n_rows: usize,
}

/// Descriptive overview of a dataset
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DatasetSummary {
    pub rows: usize,
    pub columns: usize,
    pub missing_cells: usize,
    pub numeric_columns: Vec<String>,
    pub categorical_columns: Vec<String>,
    pub duplicate_rows: usize,
    /// Label counts of the target column, when present
    pub target_distribution: Option<BTreeMap<String, usize>>,
    /// One entry per column, in header order
    pub column_info: Vec<ColumnInfo>,
}

/// Kind and fill statistics of one column
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ColumnInfo {
    pub name: String,
    pub kind: ColumnKind,
    pub non_null: usize,
    pub unique: usize,
}

impl Dataset {
    /// Load dataset from a CSV file with a header row
    pub fn from_csv<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        let file = File::open(path).map_err(|e| {
            TrainerError::DataLoad(format!("failed to open {}: {}", path.display(), e))
        })?;
        let dataset = Self::from_reader(file)?;
        info!(
            "Loaded {} rows x {} columns from {}",
            dataset.n_rows(),
            dataset.n_columns(),
            path.display()
        );
        Ok(dataset)
    }

    /// Parse CSV text held in memory
    pub fn from_csv_str(text: &str) -> Result<Self> {
        Self::from_reader(text.as_bytes())
    }

    /// Parse CSV from any reader
    pub fn from_reader<R: Read>(reader: R) -> Result<Self> {
        let mut reader = csv::ReaderBuilder::new()
            .has_headers(true)
            .trim(csv::Trim::All)
            .from_reader(reader);

        let headers: Vec<String> = reader.headers()?.iter().map(str::to_string).collect();
        if headers.is_empty() {
            return Err(TrainerError::DataLoad("CSV has no header row".to_string()));
        }

        let mut seen = HashSet::new();
        for name in &headers {
            if !seen.insert(name.as_str()) {
                return Err(TrainerError::DataLoad(format!(
                    "duplicate column name '{}'",
                    name
                )));
            }
        }

        let mut raw: Vec<Vec<String>> = vec![Vec::new(); headers.len()];
        for record in reader.records() {
            let record = record?;
            for (cells, field) in raw.iter_mut().zip(record.iter()) {
                cells.push(field.to_string());
            }
        }

        let columns = headers
            .into_iter()
            .zip(raw)
            .map(|(name, cells)| Column::new(name, ColumnData::from_raw(cells)))
            .collect();

        Self::from_columns(columns)
    }

    /// Assemble a dataset from already typed columns
    pub fn from_columns(columns: Vec<Column>) -> Result<Self> {
        let n_rows = columns.first().map(|c| c.data.len()).unwrap_or(0);

        if let Some(bad) = columns.iter().find(|c| c.data.len() != n_rows) {
            return Err(TrainerError::DataLoad(format!(
                "column '{}' has {} cells, expected {}",
                bad.name,
                bad.data.len(),
                n_rows
            )));
        }
        if n_rows == 0 {
            return Err(TrainerError::EmptyDataset);
        }

        for column in &columns {
            debug!("Column '{}' typed as {}", column.name, column.kind());
        }

        Ok(Self { columns, n_rows })
    }

    pub fn n_rows(&self) -> usize {
        self.n_rows
    }

    pub fn n_columns(&self) -> usize {
        self.columns.len()
    }

    pub fn columns(&self) -> &[Column] {
        &self.columns
    }

    pub fn column(&self, name: &str) -> Option<&Column> {
        self.columns.iter().find(|c| c.name == name)
    }

    pub fn column_names(&self) -> Vec<&str> {
        self.columns.iter().map(|c| c.name.as_str()).collect()
    }

    /// Label of `row` in `column`, `None` when missing or out of range
    pub fn label_at(&self, column: &str, row: usize) -> Option<String> {
        self.column(column).and_then(|c| c.data.text_at(row))
    }

    fn duplicate_rows(&self) -> usize {
        let mut seen = HashSet::with_capacity(self.n_rows);
        let mut duplicates = 0;
        for row in 0..self.n_rows {
            let key: Vec<Option<String>> =
                self.columns.iter().map(|c| c.data.text_at(row)).collect();
            if !seen.insert(key) {
                duplicates += 1;
            }
        }
        duplicates
    }

    /// Overview of shape, kinds, missing cells and the target distribution
    pub fn summary(&self, target: &str) -> DatasetSummary {
        let names_of = |kind: ColumnKind| -> Vec<String> {
            self.columns
                .iter()
                .filter(|c| c.kind() == kind)
                .map(|c| c.name.clone())
                .collect()
        };

        let target_distribution = self.column(target).map(|column| {
            let mut counts = BTreeMap::new();
            for row in 0..self.n_rows {
                if let Some(label) = column.data.text_at(row) {
                    *counts.entry(label).or_insert(0) += 1;
                }
            }
            counts
        });

        DatasetSummary {
            rows: self.n_rows,
            columns: self.columns.len(),
            missing_cells: self.columns.iter().map(|c| c.data.missing_count()).sum(),
            numeric_columns: names_of(FeatureKind::Numeric),
            categorical_columns: names_of(FeatureKind::Categorical),
            duplicate_rows: self.duplicate_rows(),
            target_distribution,
            column_info: self.column_info(),
        }
    }

    fn column_info(&self) -> Vec<ColumnInfo> {
        self.columns
            .iter()
            .map(|c| ColumnInfo {
                name: c.name.clone(),
                kind: c.kind(),
                non_null: c.data.len() - c.data.missing_count(),
                unique: self.distinct_values(&c.name).len(),
            })
            .collect()
    }

    /// Distinct non-missing values of a column as text, sorted
    fn distinct_values(&self, column: &str) -> BTreeSet<String> {
        (0..self.n_rows)
            .filter_map(|row| self.label_at(column, row))
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use anyhow::Result;
    use std::io::Write;
    use tempfile::NamedTempFile;

    const SAMPLE: &str = "\
Age, Mood ,Sleep,Depression
25,Good,7,No
31, Poor ,NA,Yes
,Fair,6.5,No
25,Good,7,No
";

    #[test]
    fn test_load_csv_types_columns() -> Result<()> {
        let mut file = NamedTempFile::new()?;
        write!(file, "{}", SAMPLE)?;
        file.flush()?;

        let dataset = Dataset::from_csv(file.path())?;
        assert_eq!(dataset.n_rows(), 4);
        assert_eq!(dataset.column_names(), vec!["Age", "Mood", "Sleep", "Depression"]);

        let age = dataset.column("Age").unwrap();
        assert_eq!(
            age.data,
            ColumnData::Numeric(vec![Some(25.0), Some(31.0), None, Some(25.0)])
        );
        assert_eq!(dataset.column("Mood").unwrap().kind(), FeatureKind::Categorical);
        assert_eq!(dataset.label_at("Mood", 1).as_deref(), Some("Poor"));
        assert!(dataset.column("Sleep").unwrap().data.is_missing(1));
        Ok(())
    }

    #[test]
    fn test_summary() -> Result<()> {
        let dataset = Dataset::from_csv_str(SAMPLE)?;
        let summary = dataset.summary("Depression");

        assert_eq!(summary.rows, 4);
        assert_eq!(summary.columns, 4);
        assert_eq!(summary.missing_cells, 2);
        assert_eq!(summary.numeric_columns, vec!["Age", "Sleep"]);
        assert_eq!(summary.categorical_columns, vec!["Mood", "Depression"]);
        assert_eq!(summary.duplicate_rows, 1);

        let dist = summary.target_distribution.unwrap();
        assert_eq!(dist["No"], 3);
        assert_eq!(dist["Yes"], 1);

        assert!(dataset.summary("Label").target_distribution.is_none());

        let sleep = &summary.column_info[2];
        assert_eq!(sleep.name, "Sleep");
        assert_eq!(sleep.kind, FeatureKind::Numeric);
        assert_eq!((sleep.non_null, sleep.unique), (3, 2));
        let age = &summary.column_info[0];
        assert_eq!((age.non_null, age.unique), (3, 2));
        let mood = &summary.column_info[1];
        assert_eq!((mood.kind, mood.non_null, mood.unique), (FeatureKind::Categorical, 4, 3));
        Ok(())
    }

    #[test]
    fn test_numeric_labels_render_without_decimals() -> Result<()> {
        let dataset = Dataset::from_csv_str("x,Depression\n1,0\n2,1\n3,1\n")?;
        assert_eq!(
            dataset.distinct_values("Depression").into_iter().collect::<Vec<_>>(),
            vec!["0", "1"]
        );
        Ok(())
    }

    #[test]
    fn test_malformed_input_is_data_load_error() {
        let ragged = Dataset::from_csv_str("a,b\n1,2\n3\n");
        assert!(matches!(ragged, Err(TrainerError::DataLoad(_))));

        let duplicate = Dataset::from_csv_str("a,a\n1,2\n");
        assert!(matches!(duplicate, Err(TrainerError::DataLoad(_))));

        let missing = Dataset::from_csv("/definitely/not/here.csv");
        assert!(matches!(missing, Err(TrainerError::DataLoad(_))));
    }

    #[test]
    fn test_header_only_is_empty() {
        assert!(matches!(
            Dataset::from_csv_str("a,b\n"),
            Err(TrainerError::EmptyDataset)
        ));
    }

    #[test]
    fn test_all_missing_column_is_numeric() -> Result<()> {
        let dataset = Dataset::from_csv_str("a,b\n1,\n2,NA\n")?;
        assert_eq!(dataset.column("b").unwrap().kind(), FeatureKind::Numeric);
        Ok(())
    }
}
