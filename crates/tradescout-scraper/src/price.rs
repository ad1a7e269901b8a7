//! Pure-text extraction of quantity-ladder prices and MOQ phrases.
//!
//! Marketplace pages render ladder prices in at least three layouts:
//!
//! 1. One run of text: `"50 - 499 pieces US$8.89 500 - 999 pieces US$8.28
//!    ≥ 1000 pieces US$6.95"`.
//! 2. Bar-delimited segments: `"1-99 pcs US$2.10 | 100-999 pcs US$1.80"`.
//! 3. Multi-line grids where the quantity range and its price land on
//!    separate lines, up to two lines apart.
//!
//! Each strategy is an independent pure function tried in order; the first
//! one that yields tiers wins.

use regex::Regex;

use tradescout_core::detail::{canonicalize_tiers, PriceTier};

use crate::clean::collapse_whitespace;

/// Currency tokens accepted in front of an amount. `US$` appears with and
/// without a space; IndiaMART uses `₹` and `Rs.`.
const CURRENCY: &str = r"US\s?\$|USD|RMB|CNY|¥|€|₹|Rs\.?|\$";

/// Quantity units seen in range and MOQ phrases.
const UNIT: &str = r"pieces?|pcs?|sets?|units?|pairs?|bags?|boxes?|cartons?|rolls?|dozens?|tons?|kgs?|meters?|sheets?";

/// Extracts ladder-price tiers from plain text.
///
/// Output tiers are sorted strictly ascending by `min` with unique `min`
/// values (first occurrence wins). Returns an empty vector when no ladder
/// pattern matches; callers synthesize an open-ended tier from the display
/// price in that case (see [`ensure_tiers`]).
#[must_use]
pub fn extract_tiers(text: &str) -> Vec<PriceTier> {
    let flat = collapse_whitespace(text);

    let mut tiers = match_tier_runs(&flat);

    if tiers.is_empty() && flat.contains('|') {
        for segment in flat.split('|') {
            tiers.extend(match_tier_runs(segment));
        }
    }

    if tiers.is_empty() && text.contains('\n') {
        tiers = match_tier_lines(text);
    }

    canonicalize_tiers(tiers)
}

/// Guarantees the "any price ⇒ at least one tier" invariant.
///
/// When extraction produced zero tiers but a display price is known, emits a
/// single open-ended tier whose `min` is the parsed MOQ quantity (default 1)
/// and whose price is the display string.
#[must_use]
pub fn ensure_tiers(
    tiers: Vec<PriceTier>,
    price_text: Option<&str>,
    moq_text: Option<&str>,
) -> Vec<PriceTier> {
    let tiers = canonicalize_tiers(tiers);
    if !tiers.is_empty() {
        return tiers;
    }
    match price_text.map(str::trim).filter(|p| !p.is_empty()) {
        Some(price) => {
            let min = moq_text.and_then(parse_moq_quantity).unwrap_or(1);
            vec![PriceTier::open_ended(min, price)]
        }
        None => tiers,
    }
}

/// Extracts a minimum-order-quantity phrase from plain text.
///
/// Ordered passes; the first that matches wins and later passes are not
/// attempted:
///
/// 1. Labeled: `"MOQ: 1200 pieces"`, `"Min. Order: 500 Sets"`,
///    `"Minimum Order Quantity 100"`, `"≥ 500 Sets"`.
/// 2. Loose co-occurrence: `"1200 pcs (MOQ)"`.
/// 3. Bare unit-suffixed quantity with no currency token just before it:
///    `"500 pieces"` (but not the `"US$8.89 / 500 pieces"` shape).
#[must_use]
pub fn extract_moq(text: &str) -> Option<String> {
    let flat = collapse_whitespace(text);

    let labeled = Regex::new(&format!(
        r"(?i)(?:MOQ|Min(?:imum)?\.?\s*Order(?:\s*Quantity)?)\s*:?\s*(\d[\d,]*(?:\s*(?:{UNIT}))?)"
    ))
    .expect("valid regex");
    if let Some(caps) = labeled.captures(&flat) {
        return Some(collapse_whitespace(&caps[1]));
    }

    let geq = Regex::new(&format!(r"(?i)(?:≥|>=)\s*(\d[\d,]*)\s*({UNIT})"))
        .expect("valid regex");
    if let Some(caps) = geq.captures(&flat) {
        return Some(format!("≥ {} {}", &caps[1], &caps[2]));
    }

    let loose = Regex::new(&format!(
        r"(?i)(\d[\d,]*\s*(?:{UNIT}))\s*\(\s*MOQ\s*\)"
    ))
    .expect("valid regex");
    if let Some(caps) = loose.captures(&flat) {
        return Some(format!("{} (MOQ)", collapse_whitespace(&caps[1])));
    }

    let bare = Regex::new(&format!(r"(?i)\d[\d,]*\s*(?:{UNIT})\b")).expect("valid regex");
    for m in bare.find_iter(&flat) {
        if !currency_precedes(&flat, m.start()) {
            return Some(collapse_whitespace(m.as_str()));
        }
    }

    None
}

/// Parses the leading integer out of an MOQ phrase, e.g. `"1,200 pcs (MOQ)"`
/// → `1200`.
#[must_use]
pub fn parse_moq_quantity(moq_text: &str) -> Option<u32> {
    let re = Regex::new(r"\d[\d,]*").expect("valid regex");
    parse_qty(re.find(moq_text)?.as_str())
}

// ---------------------------------------------------------------------------
// Strategies
// ---------------------------------------------------------------------------

/// Strategy 1: repeated `[min-max | ≥min] [unit]? [currency][amount]` runs
/// across one flattened string.
fn match_tier_runs(flat: &str) -> Vec<PriceTier> {
    let re = Regex::new(&format!(
        r"(?i)(?:(\d[\d,]*)\s*[-–—~]\s*(\d[\d,]*)|(?:≥|>=|>)\s*(\d[\d,]*))\s*(?:{UNIT})?\s*[:/]?\s*((?:{CURRENCY})\s?\d[\d,]*(?:\.\d+)?)"
    ))
    .expect("valid regex");

    let mut tiers = Vec::new();
    for caps in re.captures_iter(flat) {
        let price = collapse_whitespace(&caps[4]);
        if let (Some(min), Some(max)) = (caps.get(1), caps.get(2)) {
            let (Some(min), Some(max)) = (parse_qty(min.as_str()), parse_qty(max.as_str()))
            else {
                continue;
            };
            tiers.push(PriceTier {
                min,
                max: Some(max),
                price,
            });
        } else if let Some(min) = caps.get(3).and_then(|m| parse_qty(m.as_str())) {
            tiers.push(PriceTier {
                min,
                max: None,
                price,
            });
        }
    }
    tiers
}

/// Strategy 3: pair a quantity-range line with the nearest following price
/// token, tolerating up to two intervening lines.
fn match_tier_lines(text: &str) -> Vec<PriceTier> {
    let range_re = Regex::new(&format!(
        r"(?i)^(?:(\d[\d,]*)\s*[-–—~]\s*(\d[\d,]*)|(?:≥|>=|>)\s*(\d[\d,]*))\s*(?:{UNIT})?\s*$"
    ))
    .expect("valid regex");
    let price_re = Regex::new(&format!(r"(?i)((?:{CURRENCY})\s?\d[\d,]*(?:\.\d+)?)"))
        .expect("valid regex");

    let lines: Vec<&str> = text.lines().map(str::trim).collect();
    let mut tiers = Vec::new();

    for (i, line) in lines.iter().enumerate() {
        let Some(caps) = range_re.captures(line) else {
            continue;
        };
        let range = if let (Some(min), Some(max)) = (caps.get(1), caps.get(2)) {
            match (parse_qty(min.as_str()), parse_qty(max.as_str())) {
                (Some(min), Some(max)) => Some((min, Some(max))),
                _ => None,
            }
        } else {
            caps.get(3)
                .and_then(|m| parse_qty(m.as_str()))
                .map(|min| (min, None))
        };
        let Some((min, max)) = range else { continue };

        // The price may sit on the next line or the one after it.
        let price = lines
            .iter()
            .skip(i + 1)
            .take(2)
            .find_map(|l| price_re.captures(l).map(|c| collapse_whitespace(&c[1])));
        if let Some(price) = price {
            tiers.push(PriceTier { min, max, price });
        }
    }
    tiers
}

fn parse_qty(raw: &str) -> Option<u32> {
    raw.replace(',', "").parse::<u32>().ok()
}

/// Whether a currency token sits just before byte offset `at`, indicating
/// the quantity is a price denominator ("US$8.89 / 500 pieces", with or
/// without a space after the symbol) rather than an MOQ. `at` is a regex
/// match start, so it is always a char boundary.
fn currency_precedes(flat: &str, at: usize) -> bool {
    flat[..at]
        .split_whitespace()
        .rev()
        .take(3)
        .any(is_currency_token)
}

fn is_currency_token(token: &str) -> bool {
    let lowered = token.to_lowercase();
    token.contains(['$', '€', '₹', '¥'])
        || lowered.contains("usd")
        || lowered.contains("rs.")
        || lowered.contains("rmb")
}
