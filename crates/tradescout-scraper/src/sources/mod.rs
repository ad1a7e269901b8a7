//! Per-marketplace detail-page parsers.
//!
//! One parser per site family, selected by host name. Parsers never fail:
//! every field is extracted independently and a field that cannot be found
//! stays empty, to be backfilled from the listing fallback during
//! normalization. Partial data plus fallback beats no data.

mod alibaba;
mod extract;
mod indiamart;
mod made_in_china;

use regex::Regex;
use scraper::{ElementRef, Html, Selector};

use tradescout_core::ProductDetail;

use crate::clean::collapse_whitespace;

/// The marketplace families this pipeline understands.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Source {
    Alibaba,
    MadeInChina,
    IndiaMart,
}

impl Source {
    /// Provenance tag recorded in `ProductDetail::debug_source`.
    #[must_use]
    pub fn tag(self) -> &'static str {
        match self {
            Source::Alibaba => "alibaba",
            Source::MadeInChina => "made-in-china",
            Source::IndiaMart => "indiamart",
        }
    }
}

/// Maps a detail-page URL to its source family by host suffix.
#[must_use]
pub fn source_for_url(url: &str) -> Option<Source> {
    let parsed = url::Url::parse(url).ok()?;
    let host = parsed.host_str()?.to_lowercase();
    let matches_domain = |domain: &str| host == domain || host.ends_with(&format!(".{domain}"));

    if matches_domain("alibaba.com") {
        Some(Source::Alibaba)
    } else if matches_domain("made-in-china.com") {
        Some(Source::MadeInChina)
    } else if matches_domain("indiamart.com") {
        Some(Source::IndiaMart)
    } else {
        None
    }
}

/// Parses a detail page, dispatching on the URL's host.
///
/// Returns `None` for unknown hosts; otherwise always returns a draft, even
/// a nearly-empty one, so the caller can merge it with the listing fallback.
#[must_use]
pub fn parse_detail(html: &str, source_url: &str) -> Option<ProductDetail> {
    let source = source_for_url(source_url)?;
    tracing::debug!(source = source.tag(), source_url, "parsing detail page");

    let doc = Html::parse_document(html);
    let mut detail = match source {
        Source::Alibaba => alibaba::parse(&doc, html),
        Source::MadeInChina => made_in_china::parse(&doc, html),
        Source::IndiaMart => indiamart::parse(&doc, html),
    };
    detail.debug_source = source.tag().to_owned();

    if detail.title.is_empty() {
        tracing::debug!(source = source.tag(), source_url, "no title extracted");
    }
    Some(detail)
}

// ---------------------------------------------------------------------------
// Helpers shared by the per-source parsers
// ---------------------------------------------------------------------------

/// Collapsed text content of an element subtree.
pub(crate) fn text_of(el: ElementRef<'_>) -> String {
    collapse_whitespace(&el.text().collect::<Vec<_>>().join(" "))
}

/// First non-empty collapsed text among an ordered selector list.
pub(crate) fn first_text(doc: &Html, selectors: &[&str]) -> Option<String> {
    for raw in selectors {
        let selector = Selector::parse(raw).expect("valid selector");
        for el in doc.select(&selector) {
            let text = text_of(el);
            if !text.is_empty() {
                return Some(text);
            }
        }
    }
    None
}

/// First matching attribute value among an ordered `(selector, attr)` list.
pub(crate) fn first_attr(doc: &Html, pairs: &[(&str, &str)]) -> Option<String> {
    for (raw, attr) in pairs {
        let selector = Selector::parse(raw).expect("valid selector");
        for el in doc.select(&selector) {
            if let Some(value) = el.value().attr(attr) {
                let trimmed = value.trim();
                if !trimmed.is_empty() {
                    return Some(trimmed.to_owned());
                }
            }
        }
    }
    None
}

/// `<meta>` content by `property` or `name`.
pub(crate) fn meta_content(doc: &Html, key: &str) -> Option<String> {
    let by_property = format!("meta[property=\"{key}\"]");
    let by_name = format!("meta[name=\"{key}\"]");
    first_attr(
        doc,
        &[(by_property.as_str(), "content"), (by_name.as_str(), "content")],
    )
}

/// Visible page text, one line per text node, scripts and styles excluded.
/// Line boundaries are preserved so the line-oriented tier extractor can
/// still see the original layout.
pub(crate) fn visible_text(doc: &Html) -> String {
    let mut out = String::new();
    collect_visible_text(doc.root_element(), &mut out);
    out
}

fn collect_visible_text(el: ElementRef<'_>, out: &mut String) {
    let name = el.value().name();
    if name == "script" || name == "style" || name == "noscript" {
        return;
    }
    for child in el.children() {
        if let Some(child_el) = ElementRef::wrap(child) {
            collect_visible_text(child_el, out);
        } else if let Some(text) = child.value().as_text() {
            let collapsed = collapse_whitespace(text);
            if !collapsed.is_empty() {
                out.push_str(&collapsed);
                out.push('\n');
            }
        }
    }
}

/// Concatenated contents of all `<script>` tags, for embedded-JSON scans.
pub(crate) fn script_text(doc: &Html) -> String {
    let selector = Selector::parse("script").expect("valid selector");
    doc.select(&selector)
        .map(|el| el.text().collect::<String>())
        .collect::<Vec<_>>()
        .join("\n")
}

/// First decimal number in a text blob, for rating values like `"4.8/5"`.
pub(crate) fn first_number_f64(text: &str) -> Option<f64> {
    let re = Regex::new(r"\d+(?:\.\d+)?").expect("valid regex");
    re.find(text)?.as_str().parse().ok()
}

/// First integer in a text blob, commas tolerated, for counts like
/// `"1,203 Reviews"`.
pub(crate) fn first_number_u64(text: &str) -> Option<u64> {
    let re = Regex::new(r"\d[\d,]*").expect("valid regex");
    re.find(text)?.as_str().replace(',', "").parse().ok()
}

/// Best sold-count across the page: short visible text nodes matching
/// `"<n> sold"` (but not `"sold by"`), plus known trade-count keys in
/// embedded scripts. Sources under-report in some locations, so the maximum
/// candidate wins.
pub(crate) fn max_sold_count(doc: &Html) -> Option<u64> {
    let mut best: Option<u64> = None;
    let mut consider = |value: u64| {
        best = Some(best.map_or(value, |b| b.max(value)));
    };

    let text_re = Regex::new(r"(?i)([\d,]+)\+?\s*sold\b").expect("valid regex");
    for line in visible_text(doc).lines() {
        if line.len() > 80 {
            continue;
        }
        let lowered = line.to_lowercase();
        if lowered.contains("sold by") {
            continue;
        }
        if let Some(caps) = text_re.captures(line) {
            if let Ok(v) = caps[1].replace(',', "").parse::<u64>() {
                consider(v);
            }
        }
    }

    let script_re =
        Regex::new(r#""(?:tradeCount|soldCount|saleCount|totalOrders)"\s*:\s*"?([\d,]+)"#)
            .expect("valid regex");
    for caps in script_re.captures_iter(&script_text(doc)) {
        if let Ok(v) = caps[1].replace(',', "").parse::<u64>() {
            consider(v);
        }
    }

    best
}
