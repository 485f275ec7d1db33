//! Run configuration, built once at startup from the environment.

use anyhow::{Context, Result};
use std::env;
use std::path::PathBuf;

/// Everything the pipeline needs from the environment. Constructed in
/// `main` and passed by reference; there is no ambient global state.
#[derive(Debug, Clone)]
pub struct Config {
    /// S3 bucket holding the daily `<date>.transaction.gz` dumps.
    pub bucket: String,
    /// Mapbox access key substituted into the HTML template.
    pub mapbox_key: String,
    /// Local snapshot cache.
    pub data_dir: PathBuf,
    /// Location reference tables (`stop.csv`, `metro.csv`, `metrotren.csv`).
    pub inputs_dir: PathBuf,
    /// Directory containing `template.html`.
    pub template_dir: PathBuf,
    /// Where the `.csv` and `.html` artifacts land.
    pub outputs_dir: PathBuf,
}

impl Config {
    pub fn from_env() -> Result<Self> {
        let bucket =
            env::var("TRANSACTION_BUCKET_NAME").context("TRANSACTION_BUCKET_NAME must be set")?;
        let mapbox_key = env::var("MAPBOX_KEY").context("MAPBOX_KEY must be set")?;

        Ok(Self {
            bucket,
            mapbox_key,
            data_dir: dir_from_env("DATA_DIR", "data"),
            inputs_dir: dir_from_env("INPUTS_DIR", "inputs"),
            template_dir: dir_from_env("TEMPLATE_DIR", "template"),
            outputs_dir: dir_from_env("OUTPUTS_DIR", "outputs"),
        })
    }
}

fn dir_from_env(var: &str, default: &str) -> PathBuf {
    env::var(var).unwrap_or_else(|_| default.to_string()).into()
}
