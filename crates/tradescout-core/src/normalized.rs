//! The canonical merged detail record consumed downstream.

use serde::{Deserialize, Serialize};

use crate::detail::{LabeledValue, PriceTier, Rating, Supplier, Variation};

/// A [`crate::ProductDetail`] draft merged with its listing fallback.
///
/// This is the only shape the storefront and the cache layer see. Every field
/// is either populated or explicitly `None`/empty; `Option` makes "absent"
/// impossible to distinguish from "null", which is the point.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct NormalizedDetail {
    /// Canonical source URL this record was built from.
    pub source_url: String,

    pub title: String,

    #[serde(default)]
    pub price_text: Option<String>,

    /// Sorted strictly ascending by `min`; non-empty whenever `price_text`
    /// is present (an open-ended tier is synthesized if the page had none).
    #[serde(default)]
    pub price_tiers: Vec<PriceTier>,

    #[serde(default)]
    pub moq_text: Option<String>,

    #[serde(default)]
    pub attributes: Vec<LabeledValue>,

    #[serde(default)]
    pub packaging: Vec<LabeledValue>,

    #[serde(default)]
    pub variations: Vec<Variation>,

    #[serde(default)]
    pub supplier: Option<Supplier>,

    #[serde(default)]
    pub gallery: Vec<String>,

    /// Highest-scoring image, already upgraded to a large CDN variant.
    #[serde(default)]
    pub best_image: Option<String>,

    #[serde(default)]
    pub rating: Option<Rating>,

    #[serde(default)]
    pub sold_count: Option<u64>,

    /// Which parser (or `"fallback"`) produced the bulk of this record.
    #[serde(default)]
    pub debug_source: String,
}

impl NormalizedDetail {
    /// Whether this record is too sparse to trust: no title, or no price
    /// information of any kind.
    ///
    /// A weak cached record is treated as a cache miss and triggers one live
    /// re-fetch; a weak scrape result gets synthesized presentation content
    /// instead of an empty page.
    #[must_use]
    pub fn is_weak(&self) -> bool {
        if self.title.trim().is_empty() {
            return true;
        }
        let has_price_text = self
            .price_text
            .as_deref()
            .is_some_and(|p| !p.trim().is_empty());
        !has_price_text && self.price_tiers.is_empty()
    }
}

/// A normalized record can be replayed through normalization as if it were a
/// fresh draft; merging is idempotent, so this round trip is lossless apart
/// from `source_url` and `best_image`, which the normalizer rebuilds.
impl From<NormalizedDetail> for crate::detail::ProductDetail {
    fn from(detail: NormalizedDetail) -> Self {
        Self {
            title: detail.title,
            price_text: detail.price_text,
            price_tiers: detail.price_tiers,
            moq_text: detail.moq_text,
            attributes: detail.attributes,
            packaging: detail.packaging,
            variations: detail.variations,
            supplier: detail.supplier,
            gallery: detail.gallery,
            rating: detail.rating,
            sold_count: detail.sold_count,
            debug_source: detail.debug_source,
        }
    }
}
