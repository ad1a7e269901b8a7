//! Parser for `*.alibaba.com` detail pages.
//!
//! Alibaba has shipped at least three detail layouts that are all still live:
//! the classic `do-entry-list` attribute grid, the module-based redesign with
//! `module_*` ids, and a React bundle that renders prices from embedded JSON.
//! Selector tables below carry entries for each generation; the cascade in
//! [`super::extract`] stops at the first that yields data.

use scraper::{Html, Selector};

use tradescout_core::detail::{LabeledValue, ProductDetail, Rating, Supplier, Variation};

use crate::clean::{is_placeholder_value, strip_title_suffix};
use crate::images;

use super::extract::{extract_moq_text, extract_pairs, extract_price, PriceSelectors};
use super::{first_attr, first_number_f64, first_number_u64, first_text, max_sold_count,
    meta_content, text_of};

const PRICE_SELECTORS: PriceSelectors = PriceSelectors {
    ladder: &[
        ".ladder-price",
        ".price-list",
        ".range-price",
        "[data-range-price]",
        ".module_price .price-content",
    ],
    promo: &[
        ".promotion-price .price",
        ".product-price .price",
        ".price-now",
        ".ma-ref-price",
    ],
    legacy: &["table.price-table tr", "tr.price-row"],
};

const MOQ_SELECTORS: &[&str] = &[
    ".ladder-price .min-order",
    ".minimum-order",
    ".ma-min-order",
    "[class*=\"moq\"]",
];

const TITLE_SELECTORS: &[&str] = &[
    "h1[title]",
    ".product-title h1",
    ".module_title h1",
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
        extract_pairs(doc, ".do-entry-list .do-entry-item", ".do-entry-item-base", Some(".do-entry-item-val")),
        extract_pairs(doc, ".attribute-list .attribute-item", ".left", Some(".right")),
        extract_pairs(doc, ".product-props tr", "td", None),
    ]);

    let packaging = first_non_empty_pairs(&[
        extract_pairs(doc, ".packaging-list .do-entry-item", ".do-entry-item-base", Some(".do-entry-item-val")),
        extract_pairs(doc, ".module_packaging tr", "td", None),
        extract_pairs(doc, "#packaging-detail tr", "td", None),
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
    let name = first_text(doc, &[".company-name", ".supplier-name a", "a.company-name"])?;
    if is_placeholder_value(&name) {
        return None;
    }
    Some(Supplier {
        name,
        kind: first_text(doc, &[".supplier-type", ".company-type", ".bc-badge-type"]),
        location: first_text(doc, &[".company-location", ".supplier-location"]),
        logo: first_attr(doc, &[(".company-logo img", "src"), (".supplier-logo img", "src")]),
        profile_url: first_attr(doc, &[("a.company-name", "href"), (".company-name a", "href")]),
        badges: badges(doc),
    })
}

fn badges(doc: &Html) -> Vec<String> {
    let selector = Selector::parse(".supplier-tag, .verified-tag, .ma-icon-trade-assurance")
        .expect("valid selector");
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
    let value = first_text(doc, &[".score-value", ".rating-value", ".satisfaction-score"])
        .and_then(|t| first_number_f64(&t))?;
    let count = first_text(doc, &[".review-count", ".rating-count", ".satisfaction-count"])
        .and_then(|t| first_number_u64(&t))
        .unwrap_or(0);
    Some(Rating { value, count })
}

fn variations(doc: &Html) -> Vec<Variation> {
    let selector = Selector::parse(".sku-item, .sku-list .sku-wrapper").expect("valid selector");
    let img_sel = Selector::parse("img").expect("valid selector");
    let mut out = Vec::new();
    for el in doc.select(&selector) {
        let label = el
            .value()
            .attr("title")
            .map(str::to_owned)
            .unwrap_or_else(|| text_of(el));
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

#[cfg(test)]
mod tests {
    use super::*;

    const PAGE: &str = r#"<html><head>
        <meta property="og:title" content="Fallback Title">
    </head><body>
        <h1 title="Stainless Steel Water Bottle - Buy Water Bottle Product on Alibaba.com">
            Stainless Steel Water Bottle - Buy Water Bottle Product on Alibaba.com</h1>
        <div class="ladder-price">
            <span>50 - 499 pieces</span><span>US$8.89</span>
            <span>500 - 999 pieces</span><span>US$8.28</span>
            <span>≥ 1000 pieces</span><span>US$6.95</span>
            <div class="min-order">1200 pieces (MOQ)</div>
        </div>
        <div class="do-entry-list">
            <div class="do-entry-item"><span class="do-entry-item-base">Material</span>
                <span class="do-entry-item-val">18/8 Stainless Steel</span></div>
            <div class="do-entry-item"><span class="do-entry-item-base">Capacity</span>
                <span class="do-entry-item-val">500ml</span></div>
            <div class="do-entry-item"><span class="do-entry-item-base">Customization Options</span>
                <span class="do-entry-item-val">-</span></div>
        </div>
        <a class="company-name" href="https://supplier.alibaba.com/acme">Acme Houseware Co., Ltd.</a>
        <span class="supplier-type">Manufacturer</span>
        <span class="company-location">Zhejiang, China</span>
        <span class="supplier-tag">Verified Supplier</span>
        <span class="score-value">4.8</span>
        <span class="review-count">1,203 Reviews</span>
        <span>2,400 sold</span>
        <img src="https://sc01.alicdn.com/kf/H99.jpg_960x960q80.jpg">
        <img src="https://i.example.com/@img/badge.png">
    </body></html>"#;

    fn parsed() -> ProductDetail {
        let doc = Html::parse_document(PAGE);
        parse(&doc, PAGE)
    }

    #[test]
    fn title_is_stripped_of_marketing_suffix() {
        assert_eq!(parsed().title, "Stainless Steel Water Bottle");
    }

    #[test]
    fn ladder_yields_three_sorted_tiers() {
        let detail = parsed();
        let mins: Vec<u32> = detail.price_tiers.iter().map(|t| t.min).collect();
        assert_eq!(mins, vec![50, 500, 1000]);
        assert_eq!(detail.price_tiers[2].max, None);
        assert_eq!(detail.price_text.as_deref(), Some("US$6.95 - US$8.89"));
    }

    #[test]
    fn moq_comes_from_the_labeled_region() {
        assert_eq!(parsed().moq_text.as_deref(), Some("1200 pieces (MOQ)"));
    }

    #[test]
    fn attributes_skip_placeholder_rows() {
        let attrs = parsed().attributes;
        assert_eq!(attrs.len(), 2);
        assert_eq!(attrs[0].label, "Material");
        assert_eq!(attrs[1].value, "500ml");
    }

    #[test]
    fn supplier_block_is_complete() {
        let supplier = parsed().supplier.unwrap();
        assert_eq!(supplier.name, "Acme Houseware Co., Ltd.");
        assert_eq!(supplier.kind.as_deref(), Some("Manufacturer"));
        assert_eq!(supplier.location.as_deref(), Some("Zhejiang, China"));
        assert_eq!(
            supplier.profile_url.as_deref(),
            Some("https://supplier.alibaba.com/acme")
        );
        assert_eq!(supplier.badges, vec!["Verified Supplier".to_owned()]);
    }

    #[test]
    fn rating_and_sold_count_are_parsed() {
        let detail = parsed();
        assert_eq!(detail.rating, Some(Rating { value: 4.8, count: 1203 }));
        assert_eq!(detail.sold_count, Some(2400));
    }

    #[test]
    fn gallery_keeps_the_photo_not_the_badge() {
        let gallery = parsed().gallery;
        assert_eq!(gallery.len(), 1);
        assert!(gallery[0].contains("H99"));
    }

    #[test]
    fn empty_page_parses_to_empty_draft() {
        let doc = Html::parse_document("<html><body></body></html>");
        let detail = parse(&doc, "<html><body></body></html>");
        assert!(detail.title.is_empty());
        assert!(detail.price_text.is_none());
        assert!(detail.price_tiers.is_empty());
    }
}
