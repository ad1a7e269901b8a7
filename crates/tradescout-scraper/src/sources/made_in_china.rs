//! Parser for `*.made-in-china.com` detail pages.
//!
//! Made-in-China renders most data server-side in `sr-proMainInfo-*` blocks
//! and a "Basic Info" definition table, which makes it the friendliest of the
//! three families. Prices frequently appear only as a range next to a
//! per-quantity table, and the supplier card sits in a `J-company-info`
//! sidebar.

use scraper::{Html, Selector};

use tradescout_core::detail::{LabeledValue, ProductDetail, Rating, Supplier, Variation};

use crate::clean::{is_placeholder_value, strip_title_suffix};
use crate::images;

use super::extract::{extract_moq_text, extract_pairs, extract_price, PriceSelectors};
use super::{first_attr, first_number_f64, first_number_u64, first_text, max_sold_count,
    meta_content, text_of};

const PRICE_SELECTORS: PriceSelectors = PriceSelectors {
    ladder: &[
        ".sr-proMainInfo-baseInfo-price",
        ".price-ladder",
        ".pro-price-area",
    ],
    promo: &[".sr-proMainInfo-promotion .price", ".promotion-price"],
    legacy: &["table.price-quantity tr", ".price-table tr"],
};

const MOQ_SELECTORS: &[&str] = &[
    ".sr-proMainInfo-baseInfo-minOrder",
    ".J-min-order",
    ".min-order-num",
];

const TITLE_SELECTORS: &[&str] = &[
    "h1.sr-proMainInfo-baseInfo-name",
    ".pro-name h1",
    "h1",
];

pub(super) fn parse(doc: &Html, raw_html: &str) -> ProductDetail {
    let title = first_text(doc, TITLE_SELECTORS)
        .or_else(|| meta_content(doc, "og:title"))
        .map(|t| strip_title_suffix(&t))
        .unwrap_or_default();

    let (price_text, price_tiers) = extract_price(doc, raw_html, &PRICE_SELECTORS);
    let moq_text = extract_moq_text(doc, MOQ_SELECTORS);

    let attributes = first_non_empty_pairs(&[
        extract_pairs(doc, ".basic-info-list .bsc-item", ".bac-item-label", Some(".bac-item-value")),
        extract_pairs(doc, ".sr-proInfo-baseInfo tr", "th", Some("td")),
        extract_pairs(doc, ".product-property tr", "td", None),
    ]);

    let packaging = first_non_empty_pairs(&[
        extract_pairs(doc, ".sr-proInfo-packing tr", "th", Some("td")),
        extract_pairs(doc, "#packaging tr", "td", None),
    ]);

    ProductDetail {
        title,
        price_text,
        price_tiers,
        moq_text,
        attributes,
        packaging,
        variations: variations(doc),
        supplier: supplier(doc),
        gallery: images::collect_gallery(doc.root_element()),
        rating: rating(doc),
        sold_count: max_sold_count(doc),
        debug_source: String::new(),
    }
}

fn supplier(doc: &Html) -> Option<Supplier> {
    let name = first_text(
        doc,
        &[".J-company-info .company-name", ".com-name a", ".company-name"],
    )?;
    if is_placeholder_value(&name) {
        return None;
    }
    Some(Supplier {
        name,
        kind: first_text(doc, &[".business-type", ".com-type"]),
        location: first_text(doc, &[".com-address", ".company-address"]),
        logo: first_attr(doc, &[(".com-logo img", "src"), (".company-logo img", "src")]),
        profile_url: first_attr(
            doc,
            &[("a.company-name", "href"), (".com-name a", "href"), (".company-name a", "href")],
        ),
        badges: badges(doc),
    })
}

fn badges(doc: &Html) -> Vec<String> {
    let selector =
        Selector::parse(".audited-icon, .com-tag, .member-tag").expect("valid selector");
    let mut out = Vec::new();
    for el in doc.select(&selector) {
        let text = text_of(el);
        if !is_placeholder_value(&text) && !out.contains(&text) {
            out.push(text);
        }
    }
    out
}

fn rating(doc: &Html) -> Option<Rating> {
    let value = first_text(doc, &[".review-score", ".rating-num"])
        .and_then(|t| first_number_f64(&t))?;
    let count = first_text(doc, &[".review-amount", ".review-num"])
        .and_then(|t| first_number_u64(&t))
        .unwrap_or(0);
    Some(Rating { value, count })
}

fn variations(doc: &Html) -> Vec<Variation> {
    let selector = Selector::parse(".sku-props .sku-prop-item").expect("valid selector");
    let img_sel = Selector::parse("img").expect("valid selector");
    let mut out = Vec::new();
    for el in doc.select(&selector) {
        let label = text_of(el);
        if is_placeholder_value(&label) {
            continue;
        }
        let image_url = el
            .select(&img_sel)
            .next()
            .and_then(|img| img.value().attr("src").or_else(|| img.value().attr("data-src")))
            .map(str::to_owned);
        out.push(Variation { label, image_url });
    }
    out
}

fn first_non_empty_pairs(candidates: &[Vec<LabeledValue>]) -> Vec<LabeledValue> {
    candidates
        .iter()
        .find(|c| !c.is_empty())
        .cloned()
        .unwrap_or_default()
}
