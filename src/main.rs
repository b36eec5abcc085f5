mod config;
mod error;
mod indicator;
mod model;
mod report;
mod source;

use std::io;
use std::path::{Path, PathBuf};

use chrono::{Local, NaiveDate};
use clap::{Parser, Subcommand};
use derive_more::{Display, Error};
use error_stack::{Report, ResultExt};
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

use config::AppConfig;
use error::IndicatorError;
use indicator::Indicator;
use indicator::ma::{Sma, compute_moving_averages};
use indicator::macd::{Macd, compute_macd};
use model::PricePoint;
use source::csv_file::CsvFileSource;
use source::{PriceSource, trailing_years};

#[derive(Debug, Display, Error)]
pub enum AppError {
    #[display("configuration error")]
    Config,
    #[display("price source error")]
    Source,
    #[display("indicator error")]
    Indicator,
    #[display("output error")]
    Output,
}

#[derive(Parser)]
#[command(
    name = "stock-indicators",
    about = "Moving averages and MACD for daily stock prices"
)]
struct Cli {
    /// Path to the TOML configuration file (defaults apply when omitted)
    #[arg(short, long)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Simple and exponential moving averages of the adjusted close
    Ma {
        #[command(flatten)]
        history: HistoryArgs,
        /// Window size in trading days (5..=500)
        #[arg(short, long)]
        window: Option<usize>,
    },
    /// MACD line and signal line of the adjusted close
    Macd {
        #[command(flatten)]
        history: HistoryArgs,
    },
}

#[derive(clap::Args)]
struct HistoryArgs {
    /// CSV file with Date,Open,High,Low,Close,Adj Close,Volume columns
    #[arg(short, long)]
    input: PathBuf,
    /// Look-back period in years (1..=10)
    #[arg(short, long)]
    years: Option<u32>,
    /// Last date of the look-back period, YYYY-MM-DD (defaults to today)
    #[arg(long)]
    end: Option<NaiveDate>,
    /// Output format: json | csv
    #[arg(short, long)]
    format: Option<String>,
}

fn main() {
    if let Err(report) = run() {
        eprintln!("{report:?}");
        std::process::exit(1);
    }
}

fn run() -> Result<(), Report<AppError>> {
    let cli = Cli::parse();
    let config = config::load(cli.config.as_deref()).change_context(AppError::Config)?;

    init_tracing(&config);

    match cli.command {
        Command::Ma { history, window } => run_moving_averages(&config, &history, window),
        Command::Macd { history } => run_macd(&config, &history),
    }
}

fn init_tracing(config: &AppConfig) {
    let filter = EnvFilter::new(&config.general.log_level);
    match config.general.log_format.as_str() {
        "json" => {
            tracing_subscriber::fmt()
                .json()
                .with_env_filter(filter)
                .with_writer(io::stderr)
                .init();
        }
        _ => {
            tracing_subscriber::fmt()
                .with_env_filter(filter)
                .with_writer(io::stderr)
                .init();
        }
    }
}

fn run_moving_averages(
    config: &AppConfig,
    history: &HistoryArgs,
    window: Option<usize>,
) -> Result<(), Report<AppError>> {
    let technicals = config
        .technicals
        .with_overrides(window, history.years)
        .change_context(AppError::Config)?;
    let format = config
        .output
        .resolve(history.format.as_deref())
        .change_context(AppError::Config)?;

    let series = load_history(&history.input, history.end, technicals.years)?;
    let sma = Sma::new(technicals.window_size).change_context(AppError::Indicator)?;
    check_history(&sma, &series, technicals.years);

    let points = compute_moving_averages(&series, technicals.window_size)
        .change_context(AppError::Indicator)?;

    info!(
        window_size = technicals.window_size,
        years = technicals.years,
        rows = points.len(),
        "moving averages ready"
    );

    report::write_moving_averages(io::stdout().lock(), format, &points)
        .change_context(AppError::Output)
}

fn run_macd(config: &AppConfig, history: &HistoryArgs) -> Result<(), Report<AppError>> {
    let technicals = config
        .technicals
        .with_overrides(None, history.years)
        .change_context(AppError::Config)?;
    let format = config
        .output
        .resolve(history.format.as_deref())
        .change_context(AppError::Config)?;
    let params = config.macd.params();

    let series = load_history(&history.input, history.end, technicals.years)?;
    let macd = Macd::new(params).change_context(AppError::Indicator)?;
    check_history(&macd, &series, technicals.years);

    let points = compute_macd(&series, params).change_context(AppError::Indicator)?;

    info!(
        fast = params.fast_period,
        slow = params.slow_period,
        signal = params.signal_period,
        years = technicals.years,
        rows = points.len(),
        "macd ready"
    );

    report::write_macd(io::stdout().lock(), format, &points).change_context(AppError::Output)
}

/// Load the full series and keep the trailing `years` up to `end`.
fn load_history(
    input: &Path,
    end: Option<NaiveDate>,
    years: u32,
) -> Result<Vec<PricePoint>, Report<AppError>> {
    let source = CsvFileSource::new(input);
    let all = source.load().change_context(AppError::Source)?;

    let end = end.unwrap_or_else(|| Local::now().date_naive());
    let window = trailing_years(&all, end, years);

    info!(
        source = %source.describe(),
        end = %end,
        years,
        loaded = all.len(),
        kept = window.len(),
        "history selected"
    );

    Ok(window.to_vec())
}

/// Warn ahead of the computation when the selected history is too short,
/// so the user knows a longer period is needed.
fn check_history(indicator: &dyn Indicator, series: &[PricePoint], years: u32) {
    let required = indicator.required_points();
    if series.len() < required {
        let err = IndicatorError::InsufficientData {
            required,
            available: series.len(),
        };
        warn!(
            indicator = indicator.name(),
            years,
            "{err}; request a longer period with --years"
        );
    }
}
