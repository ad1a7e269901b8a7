//! Canonical product-detail shapes shared by the scraper and cache layers.
//!
//! ## Observed marketplace behavior driving this model
//!
//! ### Prices
//! B2B marketplaces quote either a single display price (`"US$ 5.80"`), a
//! range (`"US$ 5 - 8"`), or a quantity ladder (`"50 - 499 pieces US$8.89
//! ≥ 1000 pieces US$6.95"`). We keep the raw display string in `price_text`
//! and the parsed ladder in `price_tiers`; downstream rendering only consumes
//! tiers, so any record with a price must carry at least one tier (an
//! open-ended one is synthesized when only a display string is known).
//!
//! ### Attributes and packaging
//! Rendered as key-value grids that frequently contain placeholder rows
//! ("Customization Options" with no value, single-letter labels). Parsers
//! filter those before the data reaches this model; order is preserved
//! because sources list the most important attributes first.
//!
//! ### Galleries
//! A detail page mixes real product photos with badges, sprites, and
//! watermark overlays. `gallery` holds only URLs that survived candidate
//! filtering, in first-seen order, deduplicated.

use serde::{Deserialize, Serialize};

/// A raw extraction draft for one marketplace detail page.
///
/// Produced by exactly one source parser; immutable once returned. Fields a
/// parser could not extract stay empty and are backfilled from the listing
/// fallback during normalization.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ProductDetail {
    /// Display title with marketing suffixes stripped. Empty when the parser
    /// found no usable heading.
    pub title: String,

    /// Raw display price exactly as the page showed it, e.g. `"US$8.89"` or
    /// `"US$ 5 - 8"`.
    #[serde(default)]
    pub price_text: Option<String>,

    /// Parsed quantity ladder, sorted strictly ascending by `min`.
    #[serde(default)]
    pub price_tiers: Vec<PriceTier>,

    /// Raw minimum-order text, e.g. `"1200 pieces (MOQ)"`.
    #[serde(default)]
    pub moq_text: Option<String>,

    /// Specification rows in page order, placeholder rows removed.
    #[serde(default)]
    pub attributes: Vec<LabeledValue>,

    /// Packaging / shipping rows in page order.
    #[serde(default)]
    pub packaging: Vec<LabeledValue>,

    /// Product variations (color, size) with their swatch images.
    #[serde(default)]
    pub variations: Vec<Variation>,

    #[serde(default)]
    pub supplier: Option<Supplier>,

    /// Surviving image URLs in first-seen order, deduplicated.
    #[serde(default)]
    pub gallery: Vec<String>,

    #[serde(default)]
    pub rating: Option<Rating>,

    /// Units sold, when the page exposes it anywhere. Sources under-report
    /// in some locations, so the parser keeps the maximum candidate found.
    #[serde(default)]
    pub sold_count: Option<u64>,

    /// Provenance tag for diagnostics, e.g. `"alibaba"`.
    #[serde(default)]
    pub debug_source: String,
}

/// One rung of a quantity-ladder price.
///
/// `max: None` means open-ended (`"≥ 1000 pieces"`). Collections of tiers are
/// kept sorted strictly ascending by `min` with unique `min` values; use
/// [`canonicalize_tiers`] to restore the invariant after merging.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PriceTier {
    pub min: u32,
    #[serde(default)]
    pub max: Option<u32>,
    /// Display price for this rung, currency token included, e.g. `"US$8.89"`.
    pub price: String,
}

impl PriceTier {
    /// Builds an open-ended tier from a bare price string, used when a page
    /// shows a price but no ladder. `min` defaults to 1 when no MOQ is known.
    #[must_use]
    pub fn open_ended(min: u32, price: impl Into<String>) -> Self {
        Self {
            min: min.max(1),
            max: None,
            price: price.into(),
        }
    }

    /// Human-readable range label, e.g. `"50 - 499"` or `"≥ 1000"`.
    #[must_use]
    pub fn range_label(&self) -> String {
        match self.max {
            Some(max) => format!("{} - {}", self.min, max),
            None => format!("\u{2265} {}", self.min),
        }
    }
}

/// Restores the tier-list invariant: sorted strictly ascending by `min`,
/// first occurrence wins on duplicate `min`.
#[must_use]
pub fn canonicalize_tiers(tiers: Vec<PriceTier>) -> Vec<PriceTier> {
    let mut seen: Vec<u32> = Vec::with_capacity(tiers.len());
    let mut out: Vec<PriceTier> = Vec::with_capacity(tiers.len());
    for tier in tiers {
        if seen.contains(&tier.min) {
            continue;
        }
        seen.push(tier.min);
        out.push(tier);
    }
    out.sort_by_key(|t| t.min);
    out
}

/// An order-preserving label/value row from an attribute or packaging grid.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LabeledValue {
    pub label: String,
    pub value: String,
}

impl LabeledValue {
    #[must_use]
    pub fn new(label: impl Into<String>, value: impl Into<String>) -> Self {
        Self {
            label: label.into(),
            value: value.into(),
        }
    }

    /// Case-insensitive dedup key over both halves of the row.
    #[must_use]
    pub fn dedup_key(&self) -> String {
        format!(
            "{}|{}",
            self.label.trim().to_lowercase(),
            self.value.trim().to_lowercase()
        )
    }
}

/// A product variation swatch (e.g. a color) with its image.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Variation {
    pub label: String,
    #[serde(default)]
    pub image_url: Option<String>,
}

/// Supplier block from the detail page sidebar.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Supplier {
    pub name: String,
    /// Business type, e.g. `"Manufacturer"` or `"Trading Company"`.
    #[serde(default)]
    pub kind: Option<String>,
    #[serde(default)]
    pub location: Option<String>,
    #[serde(default)]
    pub logo: Option<String>,
    #[serde(default)]
    pub profile_url: Option<String>,
    /// Verification / membership badges, e.g. `"Verified Supplier"`.
    #[serde(default)]
    pub badges: Vec<String>,
}

/// Star rating with its review count.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Rating {
    pub value: f64,
    pub count: u64,
}
