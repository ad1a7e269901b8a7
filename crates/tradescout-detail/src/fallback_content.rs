//! Synthesized presentation content for weak scrape results.
//!
//! When a detail record comes back weak, the page still has to show
//! something useful: a price summary from the discovery-time fallback and a
//! handful of generic sourcing rows. Rendering these blocks instead of an
//! empty page is explicit policy, not best effort.

use tradescout_core::{LabeledValue, ListingFallback, NormalizedDetail};

/// Generic presentation blocks shown when the scraped detail is too sparse.
#[derive(Debug, Clone, PartialEq)]
pub struct FallbackContent {
    /// Price-range summary, when the listing card captured any price signal.
    pub price_summary: Option<String>,
    /// Generic packaging/lead-time rows.
    pub packaging: Vec<LabeledValue>,
    pub buyer_protection: String,
}

/// Returns presentation content for `detail` only when it is weak.
///
/// A usable record gets `None`; its own fields carry the page.
#[must_use]
pub fn for_weak_detail(
    detail: &NormalizedDetail,
    fallback: &ListingFallback,
) -> Option<FallbackContent> {
    if !detail.is_weak() {
        return None;
    }

    tracing::debug!(
        source_url = %detail.source_url,
        "weak detail, synthesizing fallback content"
    );

    Some(FallbackContent {
        price_summary: detail
            .price_text
            .clone()
            .filter(|t| !t.trim().is_empty())
            .or_else(|| fallback.price_summary()),
        packaging: vec![
            LabeledValue::new("Packaging", "Standard export packaging"),
            LabeledValue::new("Lead time", "Typically ships within 7-15 days"),
            LabeledValue::new("Samples", "Contact supplier for sample availability"),
        ],
        buyer_protection: "Order through the marketplace for payment protection \
and dispute resolution."
            .to_owned(),
    })
}
