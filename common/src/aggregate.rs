use std::{
    collections::HashMap,
    fmt::{self, Display},
    num::{ParseFloatError, ParseIntError},
};

use itertools::Itertools;
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::debug;

use crate::result::Row;

pub const ELEMENTS_SCALE: f64 = 1_000_000.0;

#[derive(Error, Debug)]
pub enum AggregateError {
    #[error("Dataset {0} was not seeded before aggregation")]
    UnknownDataset(String),
    #[error("Line {line}: element count {value:?} is not an integer: {source}")]
    InvalidElements {
        line: u64,
        value: String,
        #[source]
        source: ParseIntError,
    },
    #[error("Line {line}: iterations/sec {value:?} is not a number: {source}")]
    InvalidTiming {
        line: u64,
        value: String,
        #[source]
        source: ParseFloatError,
    },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ViewKind {
    /// Timing relative to the baseline implementation
    Baseline,
    /// Millions of operations per second
    Absolute,
}

impl ViewKind {
    pub const ALL: [ViewKind; 2] = [ViewKind::Baseline, ViewKind::Absolute];

    pub fn name(&self) -> &'static str {
        match self {
            ViewKind::Baseline => "baseline",
            ViewKind::Absolute => "absolute",
        }
    }

    pub fn y_label(&self) -> &'static str {
        match self {
            ViewKind::Baseline => "seconds per operation in comparison to std::map",
            ViewKind::Absolute => "# of Million Operations/Second",
        }
    }
}

impl Display for ViewKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Y value of a point. Baseline scores are passed through as written in the results file.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Metric {
    Throughput(f64),
    Verbatim(String),
}

impl Metric {
    /// Numeric value of the metric, if it has one
    pub fn value(&self) -> Option<f64> {
        match self {
            Metric::Throughput(v) => Some(*v),
            Metric::Verbatim(s) => s.trim().parse().ok(),
        }
    }
}

impl Display for Metric {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Metric::Throughput(v) => write!(f, "{v}"),
            Metric::Verbatim(s) => f.write_str(s),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ResultPoint {
    /// Element count in millions
    pub elements: f64,
    pub metric: Metric,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Series {
    pub implementation: String,
    pub points: Vec<ResultPoint>,
}

/// All series of one dataset, in the order implementations were first seen.
#[derive(Debug, Clone, Default, Serialize)]
pub struct DatasetResults {
    pub dataset: String,
    series: Vec<Series>,
    #[serde(skip)]
    index: HashMap<String, usize>,
}

impl DatasetResults {
    fn new(dataset: String) -> Self {
        Self {
            dataset,
            ..Default::default()
        }
    }

    fn push(&mut self, implementation: &str, point: ResultPoint) {
        let idx = match self.index.get(implementation) {
            Some(idx) => *idx,
            None => {
                self.series.push(Series {
                    implementation: implementation.to_owned(),
                    points: Vec::new(),
                });
                self.index
                    .insert(implementation.to_owned(), self.series.len() - 1);
                self.series.len() - 1
            }
        };
        self.series[idx].points.push(point);
    }

    pub fn series(&self) -> &[Series] {
        &self.series
    }

    pub fn get(&self, implementation: &str) -> Option<&Series> {
        self.index.get(implementation).map(|idx| &self.series[*idx])
    }

    pub fn implementations(&self) -> impl Iterator<Item = &str> {
        self.series.iter().map(|s| s.implementation.as_str())
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct View {
    pub kind: ViewKind,
    datasets: Vec<DatasetResults>,
    #[serde(skip)]
    index: HashMap<String, usize>,
}

impl View {
    fn new(kind: ViewKind) -> Self {
        Self {
            kind,
            datasets: Vec::new(),
            index: HashMap::new(),
        }
    }

    fn seed(&mut self, dataset: &str) {
        if !self.index.contains_key(dataset) {
            self.datasets.push(DatasetResults::new(dataset.to_owned()));
            self.index.insert(dataset.to_owned(), self.datasets.len() - 1);
        }
    }

    fn dataset_mut(&mut self, dataset: &str) -> Result<&mut DatasetResults, AggregateError> {
        let idx = *self
            .index
            .get(dataset)
            .ok_or_else(|| AggregateError::UnknownDataset(dataset.to_owned()))?;
        Ok(&mut self.datasets[idx])
    }

    pub fn datasets(&self) -> &[DatasetResults] {
        &self.datasets
    }

    pub fn get(&self, dataset: &str) -> Option<&DatasetResults> {
        self.index.get(dataset).map(|idx| &self.datasets[*idx])
    }
}

/// Aggregated results, read-only once built
#[derive(Debug, Clone, Serialize)]
pub struct ResultSet {
    views: [View; 2],
}

impl ResultSet {
    pub fn views(&self) -> &[View] {
        &self.views
    }

    pub fn view(&self, kind: ViewKind) -> &View {
        &self.views[kind as usize]
    }

    /// Dataset ids in first-appearance order
    pub fn datasets(&self) -> impl Iterator<Item = &str> {
        self.views[0].datasets.iter().map(|d| d.dataset.as_str())
    }

    /// Stable sort of every series by element count. Input order is otherwise kept as-is.
    pub fn into_sorted_by_elements(mut self) -> Self {
        for view in &mut self.views {
            for dataset in &mut view.datasets {
                for series in &mut dataset.series {
                    series
                        .points
                        .sort_by(|a, b| a.elements.total_cmp(&b.elements));
                }
            }
        }
        self
    }
}

#[derive(Debug)]
pub struct ResultSetBuilder {
    views: [View; 2],
}

impl Default for ResultSetBuilder {
    fn default() -> Self {
        Self {
            views: ViewKind::ALL.map(View::new),
        }
    }
}

impl ResultSetBuilder {
    /// Registers dataset keys in both views. Rows for unseeded datasets are rejected.
    pub fn with_datasets<'a>(mut self, datasets: impl IntoIterator<Item = &'a str>) -> Self {
        for dataset in datasets {
            for view in &mut self.views {
                view.seed(dataset);
            }
        }
        self
    }

    pub fn push(&mut self, row: &Row) -> Result<(), AggregateError> {
        let count: u64 =
            row.elements
                .trim()
                .parse()
                .map_err(|source| AggregateError::InvalidElements {
                    line: row.line,
                    value: row.elements.clone(),
                    source,
                })?;
        let per_sec: f64 = row.iterations_per_sec.trim().parse().map_err(|source| {
            AggregateError::InvalidTiming {
                line: row.line,
                value: row.iterations_per_sec.clone(),
                source,
            }
        })?;

        let elements = count as f64 / ELEMENTS_SCALE;
        let throughput = (count as f64 * per_sec).trunc() / ELEMENTS_SCALE;

        self.views[ViewKind::Baseline as usize]
            .dataset_mut(&row.dataset)?
            .push(
                &row.implementation,
                ResultPoint {
                    elements,
                    metric: Metric::Verbatim(row.baseline.clone()),
                },
            );
        self.views[ViewKind::Absolute as usize]
            .dataset_mut(&row.dataset)?
            .push(
                &row.implementation,
                ResultPoint {
                    elements,
                    metric: Metric::Throughput(throughput),
                },
            );
        Ok(())
    }

    pub fn build(self) -> ResultSet {
        ResultSet { views: self.views }
    }
}

/// Groups rows by dataset and implementation into both views
pub fn aggregate(rows: &[Row]) -> Result<ResultSet, AggregateError> {
    let mut builder = ResultSetBuilder::default()
        .with_datasets(rows.iter().map(|r| r.dataset.as_str()).unique());
    for row in rows {
        builder.push(row)?;
    }
    let results = builder.build();
    debug!(
        "Aggregated {} rows into {} datasets",
        rows.len(),
        results.datasets().count()
    );
    Ok(results)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn row(dataset: &str, implementation: &str, elements: &str, baseline: &str, per_sec: &str) -> Row {
        Row {
            line: 2,
            dataset: dataset.to_owned(),
            implementation: implementation.to_owned(),
            elements: elements.to_owned(),
            baseline: baseline.to_owned(),
            iterations_per_sec: per_sec.to_owned(),
            ..Default::default()
        }
    }

    #[test]
    fn single_row() {
        let results = aggregate(&[row("sparse", "ArtMap", "1000000", "0.5", "2.0")]).unwrap();

        let absolute = results.view(ViewKind::Absolute).get("sparse").unwrap();
        let series = absolute.get("ArtMap").unwrap();
        assert_eq!(series.points.len(), 1);
        assert_eq!(series.points[0].elements, 1.0);
        assert_eq!(series.points[0].metric, Metric::Throughput(2.0));

        let baseline = results.view(ViewKind::Baseline).get("sparse").unwrap();
        assert_eq!(
            baseline.get("ArtMap").unwrap().points[0].metric,
            Metric::Verbatim("0.5".to_owned())
        );
    }

    #[test]
    fn throughput_is_truncated_before_scaling() {
        let results = aggregate(&[row("d", "Map", "3", "1", "333333.7")]).unwrap();
        let point = &results.view(ViewKind::Absolute).get("d").unwrap().series()[0].points[0];
        // 3 * 333333.7 = 1000001.1 -> 1000001
        assert_eq!(point.metric, Metric::Throughput(1000001.0 / 1_000_000.0));
        assert_eq!(point.elements, 3.0 / 1_000_000.0);
    }

    #[test]
    fn baseline_is_verbatim() {
        let results = aggregate(&[row("d", "Map", "10", " 1.000 ", "1")]).unwrap();
        let point = &results.view(ViewKind::Baseline).get("d").unwrap().series()[0].points[0];
        assert_eq!(point.metric, Metric::Verbatim(" 1.000 ".to_owned()));
        assert_eq!(point.metric.value(), Some(1.0));
    }

    #[test]
    fn ordering_follows_input() {
        let rows = [
            row("dense", "Map", "1000000", "1", "1"),
            row("sparse", "ArtMap", "1000000", "1", "1"),
            row("dense", "ArtMap", "1000000", "1", "1"),
            row("dense", "Map", "500000", "1", "1"),
        ];
        let results = aggregate(&rows).unwrap();
        assert_eq!(results.datasets().collect::<Vec<_>>(), vec!["dense", "sparse"]);

        let dense = results.view(ViewKind::Absolute).get("dense").unwrap();
        assert_eq!(dense.implementations().collect::<Vec<_>>(), vec!["Map", "ArtMap"]);
        let xs = dense
            .get("Map")
            .unwrap()
            .points
            .iter()
            .map(|p| p.elements)
            .collect::<Vec<_>>();
        assert_eq!(xs, vec![1.0, 0.5]);

        let sorted = results.into_sorted_by_elements();
        let xs = sorted
            .view(ViewKind::Absolute)
            .get("dense")
            .unwrap()
            .get("Map")
            .unwrap()
            .points
            .iter()
            .map(|p| p.elements)
            .collect::<Vec<_>>();
        assert_eq!(xs, vec![0.5, 1.0]);
    }

    #[test]
    fn every_view_has_every_dataset() {
        let rows = [
            row("a", "Map", "1", "1", "1"),
            row("b", "Map", "1", "1", "1"),
        ];
        let results = aggregate(&rows).unwrap();
        for view in results.views() {
            assert_eq!(view.datasets().len(), 2);
        }
    }

    #[test]
    fn unseeded_dataset_is_rejected() {
        let mut builder = ResultSetBuilder::default().with_datasets(["a"]);
        let err = builder.push(&row("b", "Map", "1", "1", "1")).unwrap_err();
        assert!(matches!(err, AggregateError::UnknownDataset(d) if d == "b"));
    }

    #[test]
    fn non_numeric_fields_fail() {
        assert!(matches!(
            aggregate(&[row("a", "Map", "1.5", "1", "1")]),
            Err(AggregateError::InvalidElements { .. })
        ));
        assert!(matches!(
            aggregate(&[row("a", "Map", "1", "1", "fast")]),
            Err(AggregateError::InvalidTiming { .. })
        ));
    }
}
