use std::{path::PathBuf, str::FromStr};

use eyre::{Context, Result};
use regex::Regex;
use serde::{Deserialize, Serialize};

use crate::plot::Plot;

pub const DEFAULT_RESULTS_FILE: &str = "results.csv";

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    pub name: String,
    pub settings: Settings,
    pub plots: Vec<Box<dyn Plot>>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct Settings {
    pub results_file: PathBuf,
    pub plot_dir: PathBuf,
    pub format: ImageFormat,
    pub size: (u32, u32),
    /// Regex over dataset ids, only matching datasets are plotted
    pub datasets: Option<String>,
    pub unknown_style: UnknownStyle,
    pub sort_by_elements: bool,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            results_file: PathBuf::from(DEFAULT_RESULTS_FILE),
            plot_dir: PathBuf::from("."),
            format: ImageFormat::default(),
            size: (1024, 768),
            datasets: None,
            unknown_style: UnknownStyle::default(),
            sort_by_elements: false,
        }
    }
}

impl Settings {
    pub fn dataset_filter(&self) -> Result<Option<Regex>> {
        self.datasets
            .as_deref()
            .map(|pattern| {
                Regex::new(pattern).context(format!("Parse dataset filter {pattern}"))
            })
            .transpose()
    }
}

#[derive(Debug, Default, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ImageFormat {
    #[default]
    Png,
    Svg,
}

impl ImageFormat {
    pub fn extension(&self) -> &'static str {
        match self {
            ImageFormat::Png => "png",
            ImageFormat::Svg => "svg",
        }
    }
}

impl FromStr for ImageFormat {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "png" => Ok(ImageFormat::Png),
            "svg" => Ok(ImageFormat::Svg),
            other => Err(format!("Unsupported image format {other}")),
        }
    }
}

/// What to do with a series whose implementation has no style
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum UnknownStyle {
    #[default]
    Abort,
    Skip,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn partial_settings_use_defaults() {
        let settings: Settings = serde_yml::from_str("format: svg\nunknown_style: skip\n").unwrap();
        assert_eq!(settings.format, ImageFormat::Svg);
        assert_eq!(settings.unknown_style, UnknownStyle::Skip);
        assert_eq!(settings.results_file, PathBuf::from(DEFAULT_RESULTS_FILE));
        assert_eq!(settings.size, (1024, 768));
        assert!(!settings.sort_by_elements);
    }

    #[test]
    fn image_format_from_str() {
        assert_eq!("PNG".parse::<ImageFormat>(), Ok(ImageFormat::Png));
        assert_eq!("svg".parse::<ImageFormat>(), Ok(ImageFormat::Svg));
        assert!("pdf".parse::<ImageFormat>().is_err());
    }

    #[test]
    fn dataset_filter() {
        let mut settings = Settings::default();
        assert!(settings.dataset_filter().unwrap().is_none());

        settings.datasets = Some("^dense".to_owned());
        let re = settings.dataset_filter().unwrap().unwrap();
        assert!(re.is_match("dense-16M"));
        assert!(!re.is_match("sparse"));

        settings.datasets = Some("(".to_owned());
        assert!(settings.dataset_filter().is_err());
    }
}
