//! Local snapshot cache: one file per date, fetched from the remote store
//! only on a local miss. Existing files are never re-fetched, so re-running
//! a range costs one download per date at most.

use chrono::NaiveDate;
use std::path::{Path, PathBuf};
use tracing::info;

use crate::store::{RemoteStore, StoreError, object_key};

pub struct SnapshotCache<'a> {
    store: &'a dyn RemoteStore,
    data_dir: &'a Path,
}

impl<'a> SnapshotCache<'a> {
    pub fn new(store: &'a dyn RemoteStore, data_dir: &'a Path) -> Self {
        Self { store, data_dir }
    }

    /// Returns the local path for `date`, downloading the snapshot first if
    /// it is not already cached.
    pub async fn ensure(&self, date: NaiveDate) -> Result<PathBuf, StoreError> {
        std::fs::create_dir_all(self.data_dir)?;

        let filename = object_key(date);
        let path = self.data_dir.join(&filename);
        if path.exists() {
            info!(file = %filename, "file exists in local storage, skipping fetch");
        } else {
            info!(file = %filename, "fetching snapshot from remote store");
            self.store.fetch(date, &path).await?;
        }
        Ok(path)
    }

    /// Resolves every date in order. Any fetch failure aborts the run.
    pub async fn ensure_all(&self, dates: &[NaiveDate]) -> Result<Vec<PathBuf>, StoreError> {
        let mut paths = Vec::with_capacity(dates.len());
        for &date in dates {
            paths.push(self.ensure(date).await?);
        }
        Ok(paths)
    }
}
