//! Read-through detail enrichment service.
//!
//! Lookup order per request: process-local memo, then the persisted record
//! when it is inside the freshness window, then one live fetch. Weak records
//! never satisfy a cache read, so a sparse scrape gets one bounded retry on
//! the next request instead of being served forever. `force_refresh` skips
//! both cache tiers and always restamps the persisted row, weak or not.
//!
//! Concurrent requests for the same URL are coalesced behind a per-URL lock
//! so a burst produces one upstream fetch, not one per caller.

use std::collections::HashMap;
use std::sync::Arc;

use chrono::Duration;
use tokio::sync::Mutex;

use tradescout_core::{ListingFallback, NormalizedDetail};
use tradescout_scraper::{normalize, parse_detail, PageFetcher};

use crate::clock::Clock;
use crate::memo::DetailMemo;
use crate::store::{ImageStore, ListingRecord, ListingStore};

pub struct DetailService {
    fetcher: PageFetcher,
    memo: DetailMemo,
    store: Arc<dyn ListingStore>,
    images: Option<Arc<dyn ImageStore>>,
    freshness: Duration,
    clock: Arc<dyn Clock>,
    inflight: Mutex<HashMap<String, Arc<Mutex<()>>>>,
}

impl DetailService {
    #[must_use]
    pub fn new(
        fetcher: PageFetcher,
        memo: DetailMemo,
        store: Arc<dyn ListingStore>,
        freshness_window_secs: u64,
        clock: Arc<dyn Clock>,
    ) -> Self {
        Self {
            fetcher,
            memo,
            store,
            images: None,
            // Absurdly large configured windows clamp instead of panicking.
            freshness: Duration::try_seconds(
                i64::try_from(freshness_window_secs).unwrap_or(i64::MAX),
            )
            .unwrap_or(Duration::MAX),
            clock,
            inflight: Mutex::new(HashMap::new()),
        }
    }

    /// Mirrors the best image into owned storage on each live enrichment.
    #[must_use]
    pub fn with_image_store(mut self, images: Arc<dyn ImageStore>) -> Self {
        self.images = Some(images);
        self
    }

    /// Returns the enriched detail for one listing.
    ///
    /// Never fails: a fetch or parse problem degrades to the listing
    /// fallback, and a persistence problem is logged and swallowed.
    ///
    /// # Errors
    ///
    /// Only when the listing id itself is unknown to the store.
    pub async fn get_detail(
        &self,
        listing_id: &str,
        source_url: &str,
        fallback: &ListingFallback,
        force_refresh: bool,
    ) -> Result<NormalizedDetail, crate::store::StoreError> {
        if !force_refresh {
            if let Some(hit) = self.memo.get(source_url) {
                if !hit.is_weak() {
                    tracing::debug!(source_url, "memo hit");
                    return Ok(hit);
                }
            }
        }

        let lock = self.lock_for(source_url).await;
        let result = {
            let _guard = lock.lock().await;
            self.get_detail_locked(listing_id, source_url, fallback, force_refresh)
                .await
        };
        self.release_lock(source_url, &lock).await;
        result
    }

    /// The cache walk proper, run while holding the per-URL lock.
    async fn get_detail_locked(
        &self,
        listing_id: &str,
        source_url: &str,
        fallback: &ListingFallback,
        force_refresh: bool,
    ) -> Result<NormalizedDetail, crate::store::StoreError> {
        if force_refresh {
            // Invalidate up front so concurrent readers stop seeing the
            // entry being replaced while the refetch is in flight.
            self.memo.evict(source_url);
        } else {
            // Another task may have finished this URL while we waited.
            if let Some(hit) = self.memo.get(source_url) {
                if !hit.is_weak() {
                    return Ok(hit);
                }
            }
        }

        let record = self.store.read(listing_id).await?;
        let persisted = self.parse_persisted(&record);

        if !force_refresh {
            if let Some(detail) = &persisted {
                if self.is_fresh(&record) && !detail.is_weak() {
                    tracing::debug!(listing_id, source_url, "persisted record fresh");
                    self.memo.insert(source_url, detail.clone());
                    return Ok(detail.clone());
                }
            }
        }

        Ok(self
            .refresh(listing_id, source_url, fallback, persisted)
            .await)
    }

    /// One live fetch plus downstream bookkeeping.
    async fn refresh(
        &self,
        listing_id: &str,
        source_url: &str,
        fallback: &ListingFallback,
        persisted: Option<NormalizedDetail>,
    ) -> NormalizedDetail {
        let html = match self.fetcher.fetch_html(source_url).await {
            Ok(body) => body,
            Err(error) => {
                tracing::warn!(source_url, %error, "detail fetch failed");
                // No new data. A stale persisted record still beats the
                // listing fallback; either way nothing is re-stamped.
                let stale = persisted.filter(|d| !d.is_weak());
                let detail =
                    stale.unwrap_or_else(|| normalize(None, fallback, source_url));
                self.memo.insert(source_url, detail.clone());
                return detail;
            }
        };

        let draft = parse_detail(&html, source_url);
        let mut detail = normalize(draft, fallback, source_url);

        if let (Some(images), Some(remote)) = (&self.images, detail.best_image.clone()) {
            match images.cache_image(&remote).await {
                Ok(local) => detail.best_image = Some(local),
                Err(error) => {
                    tracing::warn!(%remote, %error, "image mirror failed, keeping remote URL");
                }
            }
        }

        self.persist(listing_id, &detail).await;
        self.memo.insert(source_url, detail.clone());
        detail
    }

    /// Writes the refreshed detail back, swallowing store failures.
    async fn persist(&self, listing_id: &str, detail: &NormalizedDetail) {
        let json = match serde_json::to_string(detail) {
            Ok(json) => json,
            Err(error) => {
                tracing::warn!(listing_id, %error, "detail serialization failed");
                return;
            }
        };
        if let Err(error) = self.store.update(listing_id, &json, self.clock.now()).await {
            tracing::warn!(listing_id, %error, "detail persist failed");
        }
    }

    fn parse_persisted(&self, record: &ListingRecord) -> Option<NormalizedDetail> {
        let json = record.cached_detail_json.as_deref()?;
        match serde_json::from_str(json) {
            Ok(detail) => Some(detail),
            Err(error) => {
                tracing::warn!(id = %record.id, %error, "cached detail unreadable, ignoring");
                None
            }
        }
    }

    /// Exclusive boundary: a record aged exactly the window is stale.
    fn is_fresh(&self, record: &ListingRecord) -> bool {
        record
            .cached_at
            .is_some_and(|at| self.clock.now() - at < self.freshness)
    }

    async fn lock_for(&self, source_url: &str) -> Arc<Mutex<()>> {
        let mut inflight = self.inflight.lock().await;
        inflight
            .entry(source_url.to_owned())
            .or_insert_with(|| Arc::new(Mutex::new(())))
            .clone()
    }

    /// Drops the lock entry once no other task holds a handle to it.
    async fn release_lock(&self, source_url: &str, lock: &Arc<Mutex<()>>) {
        let mut inflight = self.inflight.lock().await;
        // Two handles: the map's and ours.
        if Arc::strong_count(lock) <= 2 {
            inflight.remove(source_url);
        }
    }
}
