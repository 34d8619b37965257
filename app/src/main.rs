use std::path::PathBuf;

use clap::{Parser, Subcommand};
use common::config::{DEFAULT_RESULTS_FILE, ImageFormat};
use eyre::Result;
use tracing::error;
use tracing_subscriber::{
    EnvFilter,
    fmt::{layer, time::ChronoLocal},
    layer::SubscriberExt,
    util::SubscriberInitExt,
};

mod plot;

/// Crates whose log level follows `RUST_LOG` unless overridden with `--log`
const MODULES: &[&str] = &["common", "map_lines"];

#[derive(Parser)]
#[command(version, about = "Line charts for map benchmark results")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
    #[arg(short, long)]
    log: Vec<String>,
}

#[derive(Subcommand)]
enum Commands {
    /// Render one chart per view and dataset
    Plot {
        #[arg(short, long = "config")]
        config_file: Option<String>,
        /// Results csv, overrides the config file
        #[arg(short, long)]
        results: Option<PathBuf>,
        /// Chart directory, overrides the config file
        #[arg(short, long)]
        out_dir: Option<PathBuf>,
        /// png or svg
        #[arg(short, long)]
        format: Option<ImageFormat>,
    },
    /// List datasets and the implementations measured in each
    Ls {
        #[arg(short, long, default_value = DEFAULT_RESULTS_FILE)]
        results: PathBuf,
        /// Print the aggregated results as json
        #[arg(long, default_value_t = false)]
        json: bool,
    },
    /// Print the implementation style table
    Styles,
}

#[tokio::main]
async fn main() -> Result<()> {
    let log_level = std::env::var("RUST_LOG").unwrap_or("warn".to_owned());
    let args = Cli::parse();
    let file_appender = tracing_appender::rolling::never(".", "log.log");
    let (non_blocking, _guard) = tracing_appender::non_blocking(file_appender);

    let mut env_filter = EnvFilter::new(format!("map_bench_plot={log_level}"));

    if !args.log.is_empty() {
        for log in &args.log {
            env_filter = env_filter.add_directive(log.parse()?);
        }
    }

    for module in MODULES {
        if !args.log.iter().any(|x| x.starts_with(module)) {
            env_filter = env_filter.add_directive(format!("{module}={log_level}").parse()?);
        }
    }

    tracing_subscriber::registry()
        .with(env_filter)
        .with(
            layer()
                .with_timer(ChronoLocal::new("%v %k:%M:%S %z".to_owned()))
                .compact(),
        )
        .with(layer().with_writer(non_blocking))
        .init();

    match args.command {
        Commands::Plot {
            config_file,
            results,
            out_dir,
            format,
        } => {
            let overrides = plot::Overrides {
                results,
                out_dir,
                format,
            };
            if let Err(err) = plot::run(config_file.as_deref(), overrides).await {
                error!("{err:#?}");
                return Err(err);
            }
        }
        Commands::Ls { results, json } => plot::list(&results, json).await?,
        Commands::Styles => plot::print_styles(),
    };

    Ok(())
}
