use std::{
    fs,
    path::{Path, PathBuf},
};

use common::{
    aggregate::{ResultSet, ViewKind},
    config::{ImageFormat, Settings, UnknownStyle},
    plot::Plot,
    style::{SeriesStyle, StyleError, StyleTable},
    util::{chart_path, selected_datasets},
};
use eyre::{Context, ContextCompat, Result};
use rayon::iter::{IntoParallelIterator, ParallelIterator};
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tokio::task::spawn_blocking;
use tracing::{debug, info, warn};

mod render;

#[derive(Error, Debug)]
pub enum MapLinesError {
    #[error("Dataset {dataset} ({view}): {source}")]
    Style {
        dataset: String,
        view: ViewKind,
        #[source]
        source: StyleError,
    },
    #[error("Dataset {dataset}, {implementation}: {view} value {value:?} is not a number")]
    NonNumeric {
        dataset: String,
        implementation: String,
        view: ViewKind,
        value: String,
    },
}

/// One line chart per (view, dataset), one line per map implementation
#[derive(Debug, Default, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct MapLines {
    /// Also write the plotted points to `plot_data/<chart>.json`
    pub dump_data: bool,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ChartLine {
    pub label: String,
    pub style: SeriesStyle,
    pub points: Vec<(f64, f64)>,
}

/// Everything needed to draw one chart file
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ChartJob {
    pub filepath: PathBuf,
    pub title: String,
    pub view: ViewKind,
    pub lines: Vec<ChartLine>,
}

/// Resolves styles and y values for every chart before anything is drawn.
///
/// Fails on the first implementation without a style when `unknown_style` is
/// [`UnknownStyle::Abort`], so no chart is written for a run that cannot complete.
pub fn plan_charts(
    results: &ResultSet,
    plot_path: &Path,
    settings: &Settings,
    styles: &StyleTable,
) -> Result<Vec<ChartJob>> {
    let filter = settings.dataset_filter()?;
    let mut jobs = Vec::new();

    for view in results.views() {
        for dataset in selected_datasets(view, filter.as_ref()) {
            let mut lines = Vec::new();
            for series in dataset.series() {
                let style = match styles.resolve(&series.implementation) {
                    Ok(style) => *style,
                    Err(source) if settings.unknown_style == UnknownStyle::Abort => {
                        return Err(MapLinesError::Style {
                            dataset: dataset.dataset.clone(),
                            view: view.kind,
                            source,
                        }
                        .into());
                    }
                    Err(err) => {
                        warn!("Skipping series in {} ({}): {err}", dataset.dataset, view.kind);
                        continue;
                    }
                };

                let points = series
                    .points
                    .iter()
                    .map(|p| {
                        let y = p.metric.value().ok_or_else(|| MapLinesError::NonNumeric {
                            dataset: dataset.dataset.clone(),
                            implementation: series.implementation.clone(),
                            view: view.kind,
                            value: p.metric.to_string(),
                        })?;
                        Ok((p.elements, y))
                    })
                    .collect::<Result<Vec<_>, MapLinesError>>()?;

                lines.push(ChartLine {
                    label: series.implementation.clone(),
                    style,
                    points,
                });
            }

            jobs.push(ChartJob {
                filepath: chart_path(plot_path, view.kind, &dataset.dataset, settings.format),
                title: format!("{} ({})", dataset.dataset, view.kind),
                view: view.kind,
                lines,
            });
        }
    }
    debug!("Planned {} charts", jobs.len());
    Ok(jobs)
}

fn dump_plot_data(job: &ChartJob, plot_data_dir: &Path) -> Result<()> {
    let stem = job
        .filepath
        .file_stem()
        .and_then(|s| s.to_str())
        .context(format!("Invalid chart path {:?}", job.filepath))?;
    let data_path = plot_data_dir.join(format!("{stem}.json"));
    fs::write(&data_path, serde_json::to_string(job)?)
        .context(format!("Write plot data {data_path:?}"))?;
    Ok(())
}

/// Draws the charts on the rayon pool; output order matches `jobs`
pub fn render_charts(
    jobs: Vec<ChartJob>,
    size: (u32, u32),
    format: ImageFormat,
    plot_data_dir: Option<&Path>,
) -> Result<Vec<PathBuf>> {
    if let Some(dir) = plot_data_dir
        && !dir.exists()
    {
        fs::create_dir_all(dir)?;
    }

    jobs.into_par_iter()
        .map(|job| -> Result<PathBuf> {
            if let Some(dir) = plot_data_dir {
                dump_plot_data(&job, dir)?;
            }
            render::draw_line_chart(&job, size, format)
                .wrap_err(format!("Render {:?}", job.filepath))?;
            info!("Wrote {:?}", job.filepath);
            Ok(job.filepath)
        })
        .collect()
}

#[async_trait::async_trait]
#[typetag::serde]
impl Plot for MapLines {
    fn name(&self) -> &'static str {
        "MapLines"
    }

    async fn plot(
        &self,
        results: &ResultSet,
        plot_path: &Path,
        settings: &Settings,
    ) -> Result<Vec<PathBuf>> {
        let jobs = plan_charts(results, plot_path, settings, &StyleTable::default())?;
        if jobs.is_empty() {
            return Ok(Vec::new());
        }

        let plot_data_dir = self.dump_data.then(|| plot_path.join("plot_data"));
        let (size, format) = (settings.size, settings.format);
        spawn_blocking(move || render_charts(jobs, size, format, plot_data_dir.as_deref())).await?
    }
}
