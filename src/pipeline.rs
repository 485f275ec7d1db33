//! Pipeline driver: resolve dates → ensure snapshots cached → aggregate →
//! enrich → report. Stages run strictly in sequence and data only flows
//! forward.

use chrono::NaiveDate;
use std::path::PathBuf;
use thiserror::Error;
use tracing::info;

use crate::aggregate::aggregate_snapshots;
use crate::cache::SnapshotCache;
use crate::config::Config;
use crate::dates::resolve_dates;
use crate::enrich::{enrich_bus_stops, enrich_metro_stations, enrich_rail_stations};
use crate::html::write_map_html;
use crate::report::{build_rows, write_csv};
use crate::schema;
use crate::store::{RemoteStore, StoreError};

#[derive(Debug, Error)]
pub enum PipelineError {
    #[error("there is no data between {start} and {end}")]
    NoDataInRange { start: NaiveDate, end: NaiveDate },
    #[error(transparent)]
    Store(#[from] StoreError),
    #[error(transparent)]
    Io(#[from] std::io::Error),
    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

/// What a successful run produced.
#[derive(Debug)]
pub struct RunSummary {
    pub dates: usize,
    pub stops: usize,
    pub rows: usize,
    pub csv_path: PathBuf,
    pub html_path: PathBuf,
}

/// Runs the whole pipeline for `[start, end]`, writing
/// `<output_filename>.csv` and `<output_filename>.html` into the configured
/// outputs directory.
///
/// Range and fetch failures abort before any output exists; row-level and
/// stop-level problems are contained and logged by the stages themselves.
pub async fn run(
    store: &dyn RemoteStore,
    config: &Config,
    start: NaiveDate,
    end: NaiveDate,
    output_filename: &str,
) -> Result<RunSummary, PipelineError> {
    let available = store.available_dates().await?;
    let dates = resolve_dates(&available, start, end);
    if dates.is_empty() {
        return Err(PipelineError::NoDataInRange { start, end });
    }
    info!(count = dates.len(), "dates found in period");

    let cache = SnapshotCache::new(store, &config.data_dir);
    let files = cache.ensure_all(&dates).await?;

    let mut aggregate = aggregate_snapshots(&files, &schema::SNAPSHOT_V2)?;
    info!(stops = aggregate.len(), "snapshots aggregated");

    enrich_bus_stops(&mut aggregate, &config.inputs_dir)?;
    enrich_metro_stations(&mut aggregate, &config.inputs_dir)?;
    enrich_rail_stations(&mut aggregate, &config.inputs_dir)?;

    let rows = build_rows(&aggregate);

    std::fs::create_dir_all(&config.outputs_dir)?;
    let csv_path = config.outputs_dir.join(format!("{output_filename}.csv"));
    write_csv(&csv_path, &rows)?;
    let html_path = write_map_html(
        &config.template_dir,
        &config.outputs_dir,
        output_filename,
        &config.mapbox_key,
        &rows,
    )?;

    Ok(RunSummary {
        dates: dates.len(),
        stops: aggregate.len(),
        rows: rows.len(),
        csv_path,
        html_path,
    })
}
