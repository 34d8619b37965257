use core::fmt::Debug;
use std::path::{Path, PathBuf};

use dyn_clone::{DynClone, clone_trait_object};
use eyre::Result;
use futures::future::join_all;
use tokio::fs::create_dir_all;
use tracing::debug;

use crate::{aggregate::ResultSet, config::Settings};

#[typetag::serde(tag = "type")]
#[async_trait::async_trait]
pub trait Plot: Debug + DynClone + Send + Sync {
    /// Name of the plot, for identification in logs
    fn name(&self) -> &'static str;
    /// Renders charts for the aggregated results
    ///
    /// Arguments:
    /// * `results` - Aggregated results, shared by every plot
    /// * `plot_path` - Directory the charts are written to
    /// * `settings` - The settings from the config file
    ///
    /// Returns the files that were written, in render order
    async fn plot(
        &self,
        results: &ResultSet,
        plot_path: &Path,
        settings: &Settings,
    ) -> Result<Vec<PathBuf>>;
}
clone_trait_object!(Plot);

pub async fn ensure_plot_dirs(dirs: &[PathBuf]) -> Result<()> {
    let create_jobs = dirs.iter().map(create_dir_all);
    for res in join_all(create_jobs).await {
        res?;
    }
    Ok(())
}

/// Runs every configured plot against the same results
pub async fn plot(
    plots: &[Box<dyn Plot>],
    results: &ResultSet,
    settings: &Settings,
) -> Result<Vec<PathBuf>> {
    if plots.is_empty() {
        debug!("No plots");
        return Ok(Vec::new());
    }

    ensure_plot_dirs(std::slice::from_ref(&settings.plot_dir)).await?;
    let mut written = Vec::new();
    for plot in plots {
        debug!("Running plot {}", plot.name());
        written.extend(plot.plot(results, &settings.plot_dir, settings).await?);
    }
    Ok(written)
}
