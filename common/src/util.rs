use std::path::{Path, PathBuf};

use regex::Regex;

use crate::{
    aggregate::{DatasetResults, View, ViewKind},
    config::ImageFormat,
};

/// `<view>_<dataset>.<ext>` inside `plot_dir`
pub fn chart_path(plot_dir: &Path, view: ViewKind, dataset: &str, format: ImageFormat) -> PathBuf {
    plot_dir.join(format!("{}_{dataset}.{}", view.name(), format.extension()))
}

/// Datasets of a view, optionally restricted to those matching `filter`
pub fn selected_datasets<'a>(
    view: &'a View,
    filter: Option<&'a Regex>,
) -> impl Iterator<Item = &'a DatasetResults> {
    view.datasets()
        .iter()
        .filter(move |d| filter.is_none_or(|re| re.is_match(&d.dataset)))
}

/// Min and max of the values, widened when they coincide so an axis can be built on them
pub fn axis_range(values: impl IntoIterator<Item = f64>) -> Option<(f64, f64)> {
    let (min, max) = values
        .into_iter()
        .filter(|v| v.is_finite())
        .fold(None, |acc: Option<(f64, f64)>, v| match acc {
            None => Some((v, v)),
            Some((lo, hi)) => Some((lo.min(v), hi.max(v))),
        })?;
    if min == max {
        let pad = if min == 0.0 { 1.0 } else { min.abs() * 0.1 };
        return Some((min - pad, max + pad));
    }
    let pad = (max - min) * 0.05;
    Some((min - pad, max + pad))
}
