//! The extraction cascades shared by every source parser.
//!
//! Each marketplace renders the same information behind different selectors,
//! but the *order of strategies* is identical: structured UI blocks first,
//! embedded JSON and meta tags next, a whole-page regex scan as the last
//! resort. Parsers supply selector tables; this module supplies the
//! algorithm.

use regex::Regex;
use scraper::{Html, Selector};

use tradescout_core::detail::{LabeledValue, PriceTier};

use crate::clean::{collapse_whitespace, is_placeholder_value};
use crate::price;

use super::{first_text, meta_content, text_of, visible_text};

/// Selector tables a parser supplies to the price cascade.
pub(super) struct PriceSelectors {
    /// Structured range/ladder price blocks.
    pub ladder: &'static [&'static str],
    /// Promotional fixed-price blocks.
    pub promo: &'static [&'static str],
    /// Legacy table-row price blocks.
    pub legacy: &'static [&'static str],
}

const CURRENCY_TOKEN: &str = r"(?:US\s?\$|USD|RMB|CNY|¥|€|₹|Rs\.?|\$)";

/// Runs the price strategy cascade. Returns the display price and any parsed
/// tiers; both may be empty when nothing matched anywhere.
pub(super) fn extract_price(
    doc: &Html,
    raw_html: &str,
    selectors: &PriceSelectors,
) -> (Option<String>, Vec<PriceTier>) {
    // (a) structured ladder blocks
    for raw in selectors.ladder {
        let selector = Selector::parse(raw).expect("valid selector");
        for el in doc.select(&selector) {
            let tiers = price::extract_tiers(&block_text_with_lines(el));
            if !tiers.is_empty() {
                tracing::debug!(strategy = "ladder", selector = *raw, "price extracted");
                return (Some(tier_summary(&tiers)), tiers);
            }
        }
    }

    // (b) promotional fixed-price blocks, (c) legacy table rows
    for (strategy, list) in [("promo", selectors.promo), ("legacy", selectors.legacy)] {
        if let Some(text) = first_text(doc, list) {
            if let Some(price) = first_price_token(&text) {
                tracing::debug!(strategy, "price extracted");
                let tiers = price::extract_tiers(&text);
                return (Some(price), tiers);
            }
        }
    }

    // (d) generic scan of visible text for currency + quantity-range lines
    let page_text = visible_text(doc);
    let tiers = price::extract_tiers(&page_text);
    if !tiers.is_empty() {
        tracing::debug!(strategy = "generic-scan", "price extracted");
        return (Some(tier_summary(&tiers)), tiers);
    }

    // (e) embedded JSON globals
    if let Some(price) = price_from_embedded_json(raw_html) {
        tracing::debug!(strategy = "embedded-json", "price extracted");
        return (Some(price), vec![]);
    }

    // (f) meta price tags
    if let Some(amount) = meta_content(doc, "product:price:amount")
        .or_else(|| meta_content(doc, "og:price:amount"))
    {
        let currency = meta_content(doc, "product:price:currency")
            .or_else(|| meta_content(doc, "og:price:currency"))
            .unwrap_or_else(|| "US$".to_owned());
        tracing::debug!(strategy = "meta", "price extracted");
        return (Some(format!("{currency} {amount}")), vec![]);
    }

    // (g) first bare price token anywhere in the page body
    if let Some(price) = first_price_token(&page_text) {
        tracing::debug!(strategy = "body-regex", "price extracted");
        return (Some(price), vec![]);
    }

    (None, vec![])
}

/// Runs the MOQ cascade: labeled DOM regions first, then the loose text
/// passes from [`crate::price::extract_moq`] over the whole page.
pub(super) fn extract_moq_text(doc: &Html, selectors: &[&str]) -> Option<String> {
    if let Some(text) = first_text(doc, selectors) {
        if let Some(moq) = price::extract_moq(&text) {
            return Some(moq);
        }
    }
    price::extract_moq(&visible_text(doc))
}

/// Extracts label/value rows from a grid, table, or definition list.
///
/// `row` selects one logical row; `label` and `value` select within it.
/// When `value` is `None`, the row's cells are paired positionally
/// (cell 0 → label, cell 1 → value), which covers `<td>`-only tables.
/// Placeholder rows are dropped and rows dedup case-insensitively on
/// `label|value`.
pub(super) fn extract_pairs(
    doc: &Html,
    row: &str,
    label: &str,
    value: Option<&str>,
) -> Vec<LabeledValue> {
    let row_sel = Selector::parse(row).expect("valid selector");
    let label_sel = Selector::parse(label).expect("valid selector");
    let value_sel = value.map(|v| Selector::parse(v).expect("valid selector"));

    let mut seen: Vec<String> = Vec::new();
    let mut out: Vec<LabeledValue> = Vec::new();

    for row_el in doc.select(&row_sel) {
        let pair = match &value_sel {
            Some(value_sel) => {
                let label_text = row_el.select(&label_sel).next().map(text_of);
                let value_text = row_el.select(&value_sel).next().map(text_of);
                label_text.zip(value_text)
            }
            None => {
                let mut cells = row_el.select(&label_sel).map(text_of);
                cells.next().zip(cells.next())
            }
        };

        let Some((label_text, value_text)) = pair else {
            continue;
        };
        let label_text = label_text.trim_end_matches(':').trim().to_owned();
        if is_placeholder_value(&label_text) || is_placeholder_value(&value_text) {
            continue;
        }

        let pair = LabeledValue::new(label_text, value_text);
        let key = pair.dedup_key();
        if seen.contains(&key) {
            continue;
        }
        seen.push(key);
        out.push(pair);
    }

    out
}

// ---------------------------------------------------------------------------
// Internals
// ---------------------------------------------------------------------------

/// Element text with child-element boundaries preserved as newlines, so the
/// line-oriented tier extractor can run against grid layouts.
fn block_text_with_lines(el: scraper::ElementRef<'_>) -> String {
    el.text()
        .map(collapse_whitespace)
        .filter(|t| !t.is_empty())
        .collect::<Vec<_>>()
        .join("\n")
}

/// Display summary for a parsed ladder: cheapest-to-priciest range, or the
/// single price when the ladder has one rung.
fn tier_summary(tiers: &[PriceTier]) -> String {
    let first = &tiers[0].price;
    let last = &tiers[tiers.len() - 1].price;
    if first == last {
        first.clone()
    } else {
        format!("{last} - {first}")
    }
}

fn first_price_token(text: &str) -> Option<String> {
    let re = Regex::new(&format!(
        r"{CURRENCY_TOKEN}\s?\d[\d,]*(?:\.\d+)?(?:\s*-\s*(?:{CURRENCY_TOKEN})?\s?\d[\d,]*(?:\.\d+)?)?"
    ))
    .expect("valid regex");
    re.find(text).map(|m| collapse_whitespace(m.as_str()))
}

/// Known embedded-JSON price keys from marketplace detail bundles.
fn price_from_embedded_json(raw_html: &str) -> Option<String> {
    let re = Regex::new(
        r#""(?:formatPrice|promotionPrice|priceRange|price|refPrice)"\s*:\s*"([^"]{1,48})""#,
    )
    .expect("valid regex");
    for caps in re.captures_iter(raw_html) {
        let candidate = collapse_whitespace(&caps[1]);
        // Keys collide with non-price data; require a digit and a currency hint.
        if candidate.chars().any(|c| c.is_ascii_digit())
            && Regex::new(CURRENCY_TOKEN)
                .expect("valid regex")
                .is_match(&candidate)
        {
            return Some(candidate);
        }
    }
    None
}
