//! Near-duplicate merging for aggregated search-result lists.
//!
//! The same product shows up under several URLs (tracking parameters,
//! mobile/desktop hosts) and under near-identical titles across result
//! pages. Entries are keyed by canonicalized URL with a canonicalized-title
//! fallback; merging keeps the first-seen entry, fills its gaps, and trades
//! its thumbnail up when a duplicate carries a higher-scoring image.

use serde::{Deserialize, Serialize};

use crate::clean::collapse_whitespace;
use crate::images;

/// Query parameters that carry tracking state, not identity.
const TRACKING_PARAMS: &[&str] = &["spm", "from", "ref", "src", "tracelog"];

/// One entry of an aggregated search-result list, pre-detail-scrape.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SearchListing {
    pub url: String,
    pub title: String,
    #[serde(default)]
    pub price_text: Option<String>,
    #[serde(default)]
    pub image: Option<String>,
}

/// Canonicalizes a listing URL for identity comparison: lowercases scheme
/// and host, drops the fragment, tracking parameters (including `utm_*`),
/// and any trailing slash.
#[must_use]
pub fn canonical_url(raw: &str) -> String {
    let Ok(mut url) = url::Url::parse(raw.trim()) else {
        return raw.trim().to_owned();
    };

    url.set_fragment(None);
    let kept: Vec<(String, String)> = url
        .query_pairs()
        .filter(|(k, _)| {
            let key = k.to_lowercase();
            !key.starts_with("utm_") && !TRACKING_PARAMS.contains(&key.as_str())
        })
        .map(|(k, v)| (k.into_owned(), v.into_owned()))
        .collect();
    if kept.is_empty() {
        url.set_query(None);
    } else {
        let query = kept
            .iter()
            .map(|(k, v)| format!("{k}={v}"))
            .collect::<Vec<_>>()
            .join("&");
        url.set_query(Some(&query));
    }

    let mut out = url.to_string();
    if out.ends_with('/') {
        out.pop();
    }
    out
}

/// Title fold for near-duplicate detection: whitespace-collapsed, lowercased.
#[must_use]
pub fn canonical_title(title: &str) -> String {
    collapse_whitespace(title).to_lowercase()
}

/// Merges near-duplicate listings, preserving first-seen order.
#[must_use]
pub fn merge_listings(listings: Vec<SearchListing>) -> Vec<SearchListing> {
    let mut out: Vec<SearchListing> = Vec::with_capacity(listings.len());
    let mut keys: Vec<(String, String)> = Vec::with_capacity(listings.len());

    for listing in listings {
        let url_key = canonical_url(&listing.url);
        let title_key = canonical_title(&listing.title);

        let existing = keys.iter().position(|(u, t)| {
            *u == url_key || (!title_key.is_empty() && *t == title_key)
        });

        match existing {
            Some(idx) => merge_into(&mut out[idx], listing),
            None => {
                keys.push((url_key, title_key));
                out.push(listing);
            }
        }
    }
    out
}

/// Fills gaps in `kept` from `dup` and upgrades the thumbnail when the
/// duplicate's image scores higher.
fn merge_into(kept: &mut SearchListing, dup: SearchListing) {
    if kept.price_text.is_none() {
        kept.price_text = dup.price_text;
    }
    match (&kept.image, dup.image) {
        (None, Some(image)) => kept.image = Some(image),
        (Some(current), Some(candidate)) => {
            if images::score_image_url(&candidate) > images::score_image_url(current) {
                kept.image = Some(candidate);
            }
        }
        _ => {}
    }
}
