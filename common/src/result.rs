use std::path::{Path, PathBuf};

use csv::{ReaderBuilder, StringRecord};
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tokio::fs::read_to_string;
use tracing::debug;

/// Number of positional fields a results row must carry
pub const MIN_FIELDS: usize = 8;

#[derive(Error, Debug)]
pub enum ResultError {
    #[error("Could not read {path:?}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("Malformed row on line {line}: expected at least {min} fields, got {fields}", min = MIN_FIELDS)]
    MalformedRow { line: u64, fields: usize },
    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),
}

/// One data row of a Celero results file.
///
/// Fields are kept as raw strings, numeric interpretation happens during aggregation.
/// Columns, in order: group, experiment, problem space, samples, iterations, baseline,
/// us/iteration, iterations/sec.
#[derive(Debug, Default, Clone, PartialEq, Serialize, Deserialize)]
pub struct Row {
    /// 1-based line in the source file
    pub line: u64,
    pub dataset: String,
    pub implementation: String,
    pub elements: String,
    pub samples: String,
    pub iterations: String,
    pub baseline: String,
    pub us_per_iteration: String,
    pub iterations_per_sec: String,
    /// Anything after the eighth column
    pub extra: Vec<String>,
}

impl Row {
    fn from_record(record: &StringRecord) -> Result<Self, ResultError> {
        let line = record.position().map(|p| p.line()).unwrap_or_default();
        if record.len() < MIN_FIELDS {
            return Err(ResultError::MalformedRow {
                line,
                fields: record.len(),
            });
        }
        let field = |i: usize| record[i].to_owned();
        Ok(Self {
            line,
            dataset: field(0),
            implementation: field(1),
            elements: field(2),
            samples: field(3),
            iterations: field(4),
            baseline: field(5),
            us_per_iteration: field(6),
            iterations_per_sec: field(7),
            extra: record.iter().skip(MIN_FIELDS).map(str::to_owned).collect(),
        })
    }
}

/// Parses results text. The first record is a header and is discarded.
pub fn parse_rows(data: &str) -> Result<Vec<Row>, ResultError> {
    let mut reader = ReaderBuilder::new()
        .has_headers(true)
        .flexible(true)
        .from_reader(data.as_bytes());

    let mut rows = Vec::new();
    for record in reader.records() {
        rows.push(Row::from_record(&record?)?);
    }
    Ok(rows)
}

/// Reads and parses a results file
pub async fn load_rows(path: &Path) -> Result<Vec<Row>, ResultError> {
    let data = read_to_string(path).await.map_err(|source| ResultError::Io {
        path: path.to_path_buf(),
        source,
    })?;
    let rows = parse_rows(&data)?;
    debug!("Loaded {} rows from {path:?}", rows.len());
    Ok(rows)
}
