//! The lightweight listing record captured at discovery time.

use serde::{Deserialize, Serialize};

/// Data captured when a listing first appeared in search results, before any
/// detail-page scrape. Always available, so it backfills whatever the detail
/// parser could not extract.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ListingFallback {
    #[serde(default)]
    pub title: Option<String>,

    /// Raw price text from the result card, e.g. `"US$ 5 - 8"`.
    #[serde(default)]
    pub price_text: Option<String>,

    #[serde(default)]
    pub price_min: Option<f64>,

    #[serde(default)]
    pub price_max: Option<f64>,

    /// Currency token as shown on the card, e.g. `"US$"`.
    #[serde(default)]
    pub currency: Option<String>,

    /// Raw orders/sold text, e.g. `"500+ sold"`.
    #[serde(default)]
    pub orders_text: Option<String>,

    /// The single card thumbnail chosen at discovery time.
    #[serde(default)]
    pub image: Option<String>,
}

impl ListingFallback {
    /// A display price summary derived from the captured min/max, used when
    /// no price text survived anywhere.
    #[must_use]
    pub fn price_summary(&self) -> Option<String> {
        if let Some(text) = self.price_text.as_deref() {
            if !text.trim().is_empty() {
                return Some(text.trim().to_owned());
            }
        }
        let currency = self.currency.as_deref().unwrap_or("US$");
        match (self.price_min, self.price_max) {
            (Some(min), Some(max)) if (max - min).abs() > f64::EPSILON => {
                Some(format!("{currency} {min} - {max}"))
            }
            (Some(min), _) => Some(format!("{currency} {min}")),
            (None, Some(max)) => Some(format!("{currency} {max}")),
            (None, None) => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn price_summary_prefers_raw_text() {
        let fb = ListingFallback {
            price_text: Some("US$ 5 - 8".to_owned()),
            price_min: Some(4.0),
            price_max: Some(9.0),
            ..ListingFallback::default()
        };
        assert_eq!(fb.price_summary().as_deref(), Some("US$ 5 - 8"));
    }

    #[test]
    fn price_summary_builds_range_from_min_max() {
        let fb = ListingFallback {
            currency: Some("US$".to_owned()),
            price_min: Some(5.0),
            price_max: Some(8.0),
            ..ListingFallback::default()
        };
        assert_eq!(fb.price_summary().as_deref(), Some("US$ 5 - 8"));
    }

    #[test]
    fn price_summary_collapses_equal_min_max() {
        let fb = ListingFallback {
            currency: Some("US$".to_owned()),
            price_min: Some(5.0),
            price_max: Some(5.0),
            ..ListingFallback::default()
        };
        assert_eq!(fb.price_summary().as_deref(), Some("US$ 5"));
    }

    #[test]
    fn price_summary_none_when_nothing_known() {
        assert!(ListingFallback::default().price_summary().is_none());
    }
}
