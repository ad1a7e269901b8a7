//! Parser for `*.indiamart.com` detail pages.
//!
//! IndiaMART differs from the Chinese marketplaces in two ways that matter
//! here: prices are quoted in rupees as "approx" single values far more often
//! than as ladders, and MOQ always appears as a labeled "Minimum Order
//! Quantity" specification row rather than inside the price block.

use scraper::{Html, Selector};

use tradescout_core::detail::{LabeledValue, ProductDetail, Rating, Supplier, Variation};

use crate::clean::{is_placeholder_value, strip_title_suffix};
use crate::images;

use super::extract::{extract_moq_text, extract_pairs, extract_price, PriceSelectors};
use super::{first_attr, first_number_f64, first_number_u64, first_text, max_sold_count,
    meta_content, text_of};

const PRICE_SELECTORS: PriceSelectors = PriceSelectors {
    ladder: &[".price-ladder", ".qty-price-table"],
    promo: &["span.prc", ".bo.price-unit", ".prd-price"],
    legacy: &[".price-table tr", "table.prc-tbl tr"],
};

const MOQ_SELECTORS: &[&str] = &[
    ".moq-row",
    ".fs14 .moq",
    "[class*=\"min-order\"]",
];

const TITLE_SELECTORS: &[&str] = &[
    "h1.bo.center-heading",
    "h1.cp-hed",
    ".prd-name h1",
    "h1",
];

pub(super) fn parse(doc: &Html, raw_html: &str) -> ProductDetail {
    let title = first_text(doc, TITLE_SELECTORS)
        .or_else(|| meta_content(doc, "og:title"))
        .map(|t| strip_title_suffix(&t))
        .unwrap_or_default();

    let (price_text, price_tiers) = extract_price(doc, raw_html, &PRICE_SELECTORS);

    let attributes = first_non_empty_pairs(&[
        extract_pairs(doc, ".dtls table tr", "td", None),
        extract_pairs(doc, ".spec-table tr", "td", None),
        extract_pairs(doc, ".isq-row", ".isq-label", Some(".isq-value")),
    ]);

    // MOQ lives in the specification grid more often than in its own block.
    let moq_text = attributes
        .iter()
        .find(|pair| pair.label.to_lowercase().contains("minimum order"))
        .map(|pair| pair.value.clone())
        .or_else(|| extract_moq_text(doc, MOQ_SELECTORS));

    let packaging = first_non_empty_pairs(&[
        extract_pairs(doc, ".packaging-table tr", "td", None),
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
    let name = first_text(doc, &[".compny-name", ".cmpny-nm", ".comp-nm a", ".lcname"])?;
    if is_placeholder_value(&name) {
        return None;
    }
    Some(Supplier {
        name,
        kind: first_text(doc, &[".biz-type", ".nature-business"]),
        location: first_text(doc, &[".city-highlight", ".comp-loc", ".clr7"]),
        logo: first_attr(doc, &[(".comp-logo img", "src")]),
        profile_url: first_attr(doc, &[(".comp-nm a", "href"), (".compny-name a", "href")]),
        badges: badges(doc),
    })
}

fn badges(doc: &Html) -> Vec<String> {
    let selector = Selector::parse(".trust-seal, .verified-badge, .gst-badge")
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
    let value = first_text(doc, &[".bo.color", ".rating-value", ".rtng"])
        .and_then(|t| first_number_f64(&t))?;
    let count = first_text(doc, &[".tot-rate", ".rating-count"])
        .and_then(|t| first_number_u64(&t))
        .unwrap_or(0);
    Some(Rating { value, count })
}

fn variations(doc: &Html) -> Vec<Variation> {
    let selector = Selector::parse(".variant-item").expect("valid selector");
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

#[cfg(test)]
mod tests {
    use super::*;

    const PAGE: &str = r#"<html><body>
        <h1 class="bo center-heading">Brass Door Handle</h1>
        <span class="prc">₹ 250 / Piece</span>
        <div class="dtls"><table>
            <tr><td>Minimum Order Quantity</td><td>100 Piece</td></tr>
            <tr><td>Material</td><td>Brass</td></tr>
            <tr><td>Finish</td><td>Polished</td></tr>
        </table></div>
        <div class="comp-nm"><a href="https://www.indiamart.com/royal-hardware/">Royal Hardware</a></div>
        <span class="compny-name">Royal Hardware</span>
        <span class="biz-type">Manufacturer</span>
        <span class="city-highlight">Aligarh, Uttar Pradesh</span>
        <span class="bo color">4.2</span>
        <span class="tot-rate">(87)</span>
        <img src="https://5.imimg.com/data5/SELLER/Default/2024/1/handle-500x500.jpg">
    </body></html>"#;

    fn parsed() -> ProductDetail {
        let doc = Html::parse_document(PAGE);
        parse(&doc, PAGE)
    }

    #[test]
    fn title_is_plain() {
        assert_eq!(parsed().title, "Brass Door Handle");
    }

    #[test]
    fn rupee_price_comes_from_promo_block() {
        let detail = parsed();
        assert_eq!(detail.price_text.as_deref(), Some("₹ 250"));
        assert!(detail.price_tiers.is_empty(), "no ladder on this page");
    }

    #[test]
    fn moq_comes_from_the_spec_grid() {
        assert_eq!(parsed().moq_text.as_deref(), Some("100 Piece"));
    }

    #[test]
    fn spec_grid_keeps_row_order() {
        let attrs = parsed().attributes;
        assert_eq!(attrs.len(), 3);
        assert_eq!(attrs[1], LabeledValue::new("Material", "Brass"));
    }

    #[test]
    fn supplier_and_rating_parse() {
        let detail = parsed();
        let supplier = detail.supplier.unwrap();
        assert_eq!(supplier.name, "Royal Hardware");
        assert_eq!(supplier.location.as_deref(), Some("Aligarh, Uttar Pradesh"));
        assert_eq!(detail.rating, Some(Rating { value: 4.2, count: 87 }));
    }

    #[test]
    fn imimg_dashed_dimensions_score_in() {
        let gallery = parsed().gallery;
        assert_eq!(gallery.len(), 1);
        assert!(gallery[0].contains("handle-500x500"));
    }
}
