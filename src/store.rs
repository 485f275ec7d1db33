//! Remote snapshot store capability and its S3 implementation.
//!
//! The pipeline only ever talks to the store through [`RemoteStore`], so
//! tests substitute a local fixture store and the S3 wiring stays at the
//! edge of the program.

use async_trait::async_trait;
use aws_sdk_s3::error::{DisplayErrorContext, SdkError};
use chrono::NaiveDate;
use std::path::Path;
use thiserror::Error;
use tracing::debug;

/// Failure modes of the remote store, tagged so callers can react per kind
/// instead of matching on error-code strings.
#[derive(Debug, Error)]
pub enum StoreError {
    #[error("object {key} not found in remote store")]
    NotFound { key: String },
    #[error("access denied for object {key}")]
    AccessDenied { key: String },
    #[error("transient store failure: {0}")]
    Transient(String),
    #[error(transparent)]
    Io(#[from] std::io::Error),
}

/// Remote object key for one day's snapshot.
pub fn object_key(date: NaiveDate) -> String {
    format!("{}.transaction.gz", date.format("%Y-%m-%d"))
}

/// Capability interface over the remote snapshot bucket.
#[async_trait]
pub trait RemoteStore: Send + Sync {
    /// All snapshot dates the store holds, ascending.
    async fn available_dates(&self) -> Result<Vec<NaiveDate>, StoreError>;

    /// Whether a snapshot exists for `date`.
    async fn exists(&self, date: NaiveDate) -> Result<bool, StoreError>;

    /// Downloads the snapshot for `date` to `dest`.
    async fn fetch(&self, date: NaiveDate, dest: &Path) -> Result<(), StoreError>;
}

/// [`RemoteStore`] backed by an S3 bucket of `<date>.transaction.gz` objects.
pub struct S3Store {
    client: aws_sdk_s3::Client,
    bucket: String,
}

impl S3Store {
    /// Builds a store from the ambient AWS environment (credentials and
    /// region resolve through the standard `aws-config` chain).
    pub async fn from_env(bucket: &str) -> Self {
        let config = aws_config::load_from_env().await;
        Self {
            client: aws_sdk_s3::Client::new(&config),
            bucket: bucket.to_string(),
        }
    }
}

/// Maps an SDK failure onto the [`StoreError`] taxonomy by HTTP status.
fn classify<E>(key: &str, err: SdkError<E>) -> StoreError
where
    E: std::error::Error + Send + Sync + 'static,
{
    let status = err.raw_response().map(|r| r.status().as_u16());
    match status {
        Some(404) => StoreError::NotFound {
            key: key.to_string(),
        },
        Some(403) => StoreError::AccessDenied {
            key: key.to_string(),
        },
        _ => StoreError::Transient(format!("{}", DisplayErrorContext(&err))),
    }
}

#[async_trait]
impl RemoteStore for S3Store {
    async fn available_dates(&self) -> Result<Vec<NaiveDate>, StoreError> {
        let mut dates = Vec::new();

        let mut pages = self
            .client
            .list_objects_v2()
            .bucket(&self.bucket)
            .into_paginator()
            .send();

        while let Some(page) = pages.next().await {
            let page = page.map_err(|e| classify("<list>", e))?;
            for object in page.contents() {
                let Some(object_name) = object.key() else {
                    continue;
                };
                // Keys look like `2020-05-08.transaction.gz`; anything else
                // in the bucket is ignored.
                let prefix = object_name.split('.').next().unwrap_or("");
                match NaiveDate::parse_from_str(prefix, "%Y-%m-%d") {
                    Ok(date) => dates.push(date),
                    Err(_) => debug!(key = %object_name, "skipping non-snapshot object"),
                }
            }
        }

        dates.sort_unstable();
        Ok(dates)
    }

    async fn exists(&self, date: NaiveDate) -> Result<bool, StoreError> {
        let key = object_key(date);
        match self
            .client
            .head_object()
            .bucket(&self.bucket)
            .key(&key)
            .send()
            .await
        {
            Ok(_) => Ok(true),
            Err(err) => match classify(&key, err) {
                StoreError::NotFound { .. } => Ok(false),
                other => Err(other),
            },
        }
    }

    async fn fetch(&self, date: NaiveDate, dest: &Path) -> Result<(), StoreError> {
        let key = object_key(date);
        let resp = self
            .client
            .get_object()
            .bucket(&self.bucket)
            .key(&key)
            .send()
            .await
            .map_err(|e| classify(&key, e))?;

        let body = resp
            .body
            .collect()
            .await
            .map_err(|e| StoreError::Transient(e.to_string()))?;
        std::fs::write(dest, body.into_bytes())?;

        debug!(key = %key, dest = %dest.display(), "snapshot downloaded");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_object_key_format() {
        let date: NaiveDate = "2020-05-08".parse().unwrap();
        assert_eq!(object_key(date), "2020-05-08.transaction.gz");
    }
}
