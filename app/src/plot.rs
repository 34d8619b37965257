use std::path::{Path, PathBuf};

use common::{
    aggregate::{ResultSet, ViewKind, aggregate},
    config::{Config, ImageFormat},
    result::load_rows,
    style::StyleTable,
};
use eyre::{Context, Result};
use map_lines::MapLines;
use tokio::fs::read_to_string;
use tracing::debug;

/// Command line values that take precedence over the config file
#[derive(Debug, Default)]
pub struct Overrides {
    pub results: Option<PathBuf>,
    pub out_dir: Option<PathBuf>,
    pub format: Option<ImageFormat>,
}

pub async fn load_config(config_file: Option<&str>, overrides: Overrides) -> Result<Config> {
    let mut config: Config = match config_file {
        Some(file) => serde_yml::from_str(
            &read_to_string(file)
                .await
                .context(format!("Read config {file}"))?,
        )
        .context(format!("Parse config {file}"))?,
        None => Config::default(),
    };

    if config.plots.is_empty() {
        config.plots.push(Box::new(MapLines::default()));
    }
    if let Some(results) = overrides.results {
        config.settings.results_file = results;
    }
    if let Some(out_dir) = overrides.out_dir {
        config.settings.plot_dir = out_dir;
    }
    if let Some(format) = overrides.format {
        config.settings.format = format;
    }
    Ok(config)
}

async fn load_results(path: &Path, sort_by_elements: bool) -> Result<ResultSet> {
    let rows = load_rows(path)
        .await
        .wrap_err(format!("Load {path:?}"))?;
    let results = aggregate(&rows).context(format!("Aggregate {path:?}"))?;
    Ok(if sort_by_elements {
        results.into_sorted_by_elements()
    } else {
        results
    })
}

pub async fn run(config_file: Option<&str>, overrides: Overrides) -> Result<()> {
    let config = load_config(config_file, overrides).await?;
    debug!("Config: {config:?}");

    let results = load_results(
        &config.settings.results_file,
        config.settings.sort_by_elements,
    )
    .await?;
    let written = common::plot::plot(&config.plots, &results, &config.settings).await?;
    for file in written {
        println!("{}", file.display());
    }
    Ok(())
}

pub async fn list(results_file: &Path, json: bool) -> Result<()> {
    let results = load_results(results_file, false).await?;
    if json {
        println!("{}", serde_json::to_string_pretty(&results)?);
        return Ok(());
    }

    for dataset in results.view(ViewKind::Absolute).datasets() {
        println!("{}", dataset.dataset);
        for series in dataset.series() {
            println!("  {} ({} points)", series.implementation, series.points.len());
        }
    }
    Ok(())
}

pub fn print_styles() {
    for (name, style) in StyleTable::default().iter() {
        println!("{name}: {style}");
    }
}
