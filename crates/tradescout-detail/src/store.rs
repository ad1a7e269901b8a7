//! Persistent listing store behind the detail pipeline.
//!
//! The pipeline only needs two operations: read a listing's cached detail
//! blob and overwrite it with a newer one. The trait keeps the storage
//! backend out of the service; tests and the demo run use the in-memory
//! implementation.

use std::collections::HashMap;
use std::sync::Mutex;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use thiserror::Error;

#[derive(Debug, Error)]
pub enum StoreError {
    #[error("listing not found: {id}")]
    NotFound { id: String },

    #[error("store backend failure: {reason}")]
    Backend { reason: String },
}

/// One persisted listing row, as the detail pipeline sees it.
#[derive(Debug, Clone)]
pub struct ListingRecord {
    pub id: String,
    pub url: String,
    /// Serialized normalized detail from the last successful enrichment.
    pub cached_detail_json: Option<String>,
    pub cached_at: Option<DateTime<Utc>>,
}

impl ListingRecord {
    #[must_use]
    pub fn new(id: &str, url: &str) -> Self {
        Self {
            id: id.to_owned(),
            url: url.to_owned(),
            cached_detail_json: None,
            cached_at: None,
        }
    }
}

/// Read/overwrite access to persisted listing details.
#[async_trait]
pub trait ListingStore: Send + Sync {
    async fn read(&self, id: &str) -> Result<ListingRecord, StoreError>;

    /// Overwrites the cached detail and its timestamp for `id`.
    async fn update(
        &self,
        id: &str,
        detail_json: &str,
        cached_at: DateTime<Utc>,
    ) -> Result<(), StoreError>;
}

/// Mirrors remote images into owned storage, returning the serving URL.
///
/// A mirroring failure is never fatal; the caller keeps the remote URL.
#[async_trait]
pub trait ImageStore: Send + Sync {
    async fn cache_image(&self, remote_url: &str) -> Result<String, StoreError>;
}

/// Hash-map-backed store for tests and single-process runs.
pub struct InMemoryListingStore {
    records: Mutex<HashMap<String, ListingRecord>>,
    fail_updates: Mutex<bool>,
}

impl InMemoryListingStore {
    #[must_use]
    pub fn new(seed: Vec<ListingRecord>) -> Self {
        let records = seed.into_iter().map(|r| (r.id.clone(), r)).collect();
        Self {
            records: Mutex::new(records),
            fail_updates: Mutex::new(false),
        }
    }

    /// Makes every subsequent `update` fail, for persistence-failure tests.
    pub fn fail_updates(&self, fail: bool) {
        *self.fail_updates.lock().expect("store lock poisoned") = fail;
    }

    /// Snapshot of one record, bypassing the trait, for assertions.
    #[must_use]
    pub fn snapshot(&self, id: &str) -> Option<ListingRecord> {
        self.records
            .lock()
            .expect("store lock poisoned")
            .get(id)
            .cloned()
    }
}

impl Default for InMemoryListingStore {
    fn default() -> Self {
        Self::new(Vec::new())
    }
}

#[async_trait]
impl ListingStore for InMemoryListingStore {
    async fn read(&self, id: &str) -> Result<ListingRecord, StoreError> {
        self.records
            .lock()
            .expect("store lock poisoned")
            .get(id)
            .cloned()
            .ok_or_else(|| StoreError::NotFound { id: id.to_owned() })
    }

    async fn update(
        &self,
        id: &str,
        detail_json: &str,
        cached_at: DateTime<Utc>,
    ) -> Result<(), StoreError> {
        if *self.fail_updates.lock().expect("store lock poisoned") {
            return Err(StoreError::Backend {
                reason: "simulated write failure".to_owned(),
            });
        }
        let mut records = self.records.lock().expect("store lock poisoned");
        let record = records
            .get_mut(id)
            .ok_or_else(|| StoreError::NotFound { id: id.to_owned() })?;
        record.cached_detail_json = Some(detail_json.to_owned());
        record.cached_at = Some(cached_at);
        Ok(())
    }
}
