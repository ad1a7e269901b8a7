//! Bounded-concurrency batch enrichment.
//!
//! Runs [`DetailService::get_detail`] over a batch of listing entries with a
//! fixed worker bound. Items complete in whatever order the network allows;
//! results are keyed by source URL so callers never depend on ordering. An
//! item that fails contributes nothing to the result map and nothing to the
//! store (the service only persists after a successful fetch).

use std::collections::HashMap;

use futures::stream::{self, StreamExt};
use serde::{Deserialize, Serialize};

use tradescout_core::{ListingFallback, NormalizedDetail};

use crate::service::DetailService;

/// One batch entry: the listing identity plus its always-available fallback.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EnrichItem {
    pub listing_id: String,
    pub source_url: String,
    #[serde(default)]
    pub fallback: ListingFallback,
}

/// Outcome of one batch run.
#[derive(Debug, Default)]
pub struct EnrichOutcome {
    /// Enriched details keyed by source URL.
    pub details: HashMap<String, NormalizedDetail>,
    pub failed: usize,
}

/// Enriches `items` with at most `concurrency` requests in flight.
pub async fn enrich_batch(
    service: &DetailService,
    items: Vec<EnrichItem>,
    concurrency: usize,
) -> EnrichOutcome {
    let total = items.len();
    let max_concurrent = concurrency.max(1);

    let results: Vec<(String, Result<NormalizedDetail, crate::store::StoreError>)> =
        stream::iter(items)
            .map(|item| async move {
                let detail = service
                    .get_detail(&item.listing_id, &item.source_url, &item.fallback, false)
                    .await;
                (item.source_url, detail)
            })
            .buffer_unordered(max_concurrent)
            .collect()
            .await;

    let mut outcome = EnrichOutcome::default();
    for (source_url, result) in results {
        match result {
            Ok(detail) => {
                outcome.details.insert(source_url, detail);
            }
            Err(error) => {
                tracing::error!(%source_url, %error, "enrichment failed for listing");
                outcome.failed += 1;
            }
        }
    }

    if outcome.failed > 0 {
        tracing::warn!(failed = outcome.failed, total, "some listings failed enrichment");
    }
    outcome
}
