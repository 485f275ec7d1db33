//! CLI entry point: create a map visualization of bip! fare transactions
//! by stop for each day in a date range.

use anyhow::Result;
use bip_stop_viz::config::Config;
use bip_stop_viz::pipeline::{self, PipelineError};
use bip_stop_viz::store::S3Store;
use chrono::NaiveDate;
use clap::Parser;
use std::ffi::OsStr;
use std::path::Path;
use tracing::info;
use tracing_subscriber::{
    EnvFilter, Layer,
    fmt::{self, format::FmtSpan},
    layer::SubscriberExt,
    util::SubscriberInitExt,
};

#[derive(Parser)]
#[command(name = "bip_stop_viz")]
#[command(about = "create visualization of bip! transactions by stop for each day", long_about = None)]
struct Cli {
    /// Lower bound date, for instance 2020-01-01
    start_date: NaiveDate,

    /// Upper bound date, for instance 2020-12-31
    end_date: NaiveDate,

    /// Base filename of the csv and html files created by the process
    output_filename: String,
}

#[tokio::main]
async fn main() -> Result<()> {
    dotenvy::dotenv().ok(); // Load .env file

    // Logging setup: colored stderr + JSON rolling log file
    let log_file_path =
        std::env::var("LOG_FILE_PATH").unwrap_or_else(|_| "logs/bip_stop_viz.log".to_string());
    let log_dir = Path::new(&log_file_path)
        .parent()
        .unwrap_or(Path::new("logs"));
    let log_file_name = Path::new(&log_file_path)
        .file_name()
        .unwrap_or(OsStr::new("bip_stop_viz.log"));

    let file_appender = tracing_appender::rolling::daily(log_dir, log_file_name);
    let (non_blocking_file, _file_guard) = tracing_appender::non_blocking(file_appender);

    let stderr_layer = fmt::layer()
        .with_target(true)
        .with_span_events(FmtSpan::CLOSE)
        .with_ansi(true)
        .with_writer(std::io::stderr)
        .with_filter(EnvFilter::from_env("RUST_LOG").add_directive("info".parse()?));

    let json_layer = fmt::layer()
        .json()
        .with_current_span(true)
        .with_span_list(true)
        .with_writer(non_blocking_file)
        .with_filter(EnvFilter::from_env("RUST_LOG_JSON").add_directive("debug".parse()?));

    tracing_subscriber::registry()
        .with(stderr_layer)
        .with(json_layer)
        .init();

    let cli = Cli::parse();

    info!("Welcome DTPM");

    let config = Config::from_env()?;
    let store = S3Store::from_env(&config.bucket).await;

    match pipeline::run(
        &store,
        &config,
        cli.start_date,
        cli.end_date,
        &cli.output_filename,
    )
    .await
    {
        Ok(summary) => {
            info!(
                dates = summary.dates,
                stops = summary.stops,
                rows = summary.rows,
                csv = %summary.csv_path.display(),
                html = %summary.html_path.display(),
                "outputs successfully created"
            );
            println!("{} successfully created!", cli.output_filename);
            Ok(())
        }
        Err(err @ PipelineError::NoDataInRange { .. }) => {
            eprintln!("{err}");
            std::process::exit(1);
        }
        Err(err) => Err(err.into()),
    }
}
