//! Merging a parser draft with the listing fallback into the canonical
//! record.
//!
//! Merge policy, per field: the scraped draft wins; an absent or empty draft
//! field is backfilled from the fallback; whatever is still unknown stays
//! explicitly `None`. Normalization is idempotent — replaying an
//! already-normalized record through [`normalize`] is a no-op.

use regex::Regex;

use tradescout_core::{ListingFallback, NormalizedDetail, ProductDetail};

use crate::images;
use crate::price;

/// Builds the canonical [`NormalizedDetail`] for `source_url`.
///
/// `draft` is `None` when no parser matched or the fetch failed; the record
/// is then built from the fallback alone (and will usually classify as weak
/// unless the fallback carries a price).
#[must_use]
pub fn normalize(
    draft: Option<ProductDetail>,
    fallback: &ListingFallback,
    source_url: &str,
) -> NormalizedDetail {
    let draft = draft.unwrap_or_default();

    let title = non_empty(draft.title)
        .or_else(|| fallback.title.clone().and_then(non_empty))
        .unwrap_or_default();

    let price_text = draft
        .price_text
        .and_then(non_empty)
        .or_else(|| fallback.price_summary());

    let moq_text = draft.moq_text.and_then(non_empty);

    let price_tiers = price::ensure_tiers(
        draft.price_tiers,
        price_text.as_deref(),
        moq_text.as_deref(),
    );

    let mut gallery = draft.gallery;
    if gallery.is_empty() {
        if let Some(image) = fallback.image.as_deref() {
            if !image.trim().is_empty() {
                gallery.push(images::upgrade_image_url(image.trim()));
            }
        }
    }
    let best_image = best_gallery_image(&gallery);

    let sold_count = draft
        .sold_count
        .or_else(|| fallback.orders_text.as_deref().and_then(leading_count));

    let debug_source = if draft.debug_source.is_empty() {
        "fallback".to_owned()
    } else {
        draft.debug_source
    };

    NormalizedDetail {
        source_url: source_url.to_owned(),
        title,
        price_text,
        price_tiers,
        moq_text,
        attributes: draft.attributes,
        packaging: draft.packaging,
        variations: draft.variations,
        supplier: draft.supplier,
        gallery,
        best_image,
        rating: draft.rating,
        sold_count,
        debug_source,
    }
}

/// Highest-scoring gallery entry, ties broken by first-seen order. The
/// gallery is already filtered and upgraded, so this is a plain rescore.
fn best_gallery_image(gallery: &[String]) -> Option<String> {
    let mut best: Option<(&String, i64)> = None;
    for url in gallery {
        let score = images::score_image_url(url);
        if best.is_none_or(|(_, s)| score > s) {
            best = Some((url, score));
        }
    }
    best.map(|(url, _)| url.clone())
}

fn non_empty(s: String) -> Option<String> {
    let trimmed = s.trim();
    if trimmed.is_empty() {
        None
    } else {
        Some(trimmed.to_owned())
    }
}

/// Leading integer of an orders blurb like `"500+ sold"` or `"1,200 orders"`.
fn leading_count(text: &str) -> Option<u64> {
    let re = Regex::new(r"\d[\d,]*").expect("valid regex");
    re.find(text)?.as_str().replace(',', "").parse().ok()
}
