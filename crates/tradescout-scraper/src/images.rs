//! Image candidate collection, scoring, and CDN-size upgrading.
//!
//! A marketplace page mixes real product photos with badges, sprites,
//! watermarks, and lazy-load placeholders, and hides the real URLs behind a
//! zoo of attributes (`src`, `data-src`, `srcset`, inline `background-image`,
//! JSON blobs in `data-*`). The collector gathers everything, the filter
//! drops the obviously-bad, and the scorer ranks the survivors so that a
//! placeholder can still win when it is the only candidate.
//!
//! The scorer is scope-agnostic: callers hand it a search-result card or a
//! whole document root and get the same ranking behavior.

use regex::Regex;
use scraper::ElementRef;

/// Attributes that lazy-load libraries stash the real image URL in.
const LAZY_ATTRS: &[&str] = &[
    "src",
    "data-src",
    "data-lazy-src",
    "data-lazy",
    "data-original",
    "data-image",
    "data-img",
    "data-ks-lazyload",
    "data-zoom-image",
];

/// Path fragments that are never product photos.
const REJECT_FRAGMENTS: &[&str] = &["sprite", "favicon", "/icons/", "icon_", "pixel.gif"];

/// Path fragments that mark badges, logos, and placeholder art. Penalized
/// heavily instead of rejected so a placeholder is only chosen when nothing
/// else survived.
const PENALTY_FRAGMENTS: &[&str] = &[
    "badge",
    "logo",
    "watermark",
    "placeholder",
    "no-image",
    "no_image",
    "noimage",
    "default.",
    "blank.",
    "loading.",
    "grey.gif",
];

/// Path fragments of known product-photo CDNs, scored highest.
const PRODUCT_CDN_FRAGMENTS: &[&str] = &[
    "alicdn.com",
    "/kf/",
    "image.made-in-china.com",
    "imimg.com",
    "/product-detail/",
    "/product/",
];

/// Minimum encoded side length below which an image is treated as an icon.
const MIN_ICON_SIDE: u32 = 64;

/// A discovered image URL, kept in first-seen order for deterministic
/// tie-breaking. Ephemeral during extraction; never persisted.
#[derive(Debug, Clone)]
pub struct ImageCandidate {
    pub url: String,
    /// Where the URL came from, for diagnostics (`"src"`, `"srcset"`,
    /// `"style"`, `"data-json"`).
    pub source_tag: &'static str,
}

/// Collects every plausible image URL within `scope`, deduplicated in
/// first-seen order. Hard-rejected URLs (data URIs, sprites, icon-sized
/// dimensions) never enter the set.
#[must_use]
pub fn collect_candidates(scope: ElementRef<'_>) -> Vec<ImageCandidate> {
    let mut out: Vec<ImageCandidate> = Vec::new();
    let mut push = |url: &str, source_tag: &'static str, out: &mut Vec<ImageCandidate>| {
        let Some(url) = normalize_candidate_url(url) else {
            return;
        };
        if is_rejected(&url) {
            return;
        }
        if out.iter().any(|c| c.url == url) {
            return;
        }
        out.push(ImageCandidate { url, source_tag });
    };

    for node in scope.descendants() {
        let Some(el) = ElementRef::wrap(node) else {
            continue;
        };
        let value = el.value();

        for attr in LAZY_ATTRS {
            if let Some(raw) = value.attr(attr) {
                push(raw, "src", &mut out);
            }
        }

        if let Some(srcset) = value.attr("srcset") {
            for entry in srcset.split(',') {
                if let Some(url) = entry.trim().split_whitespace().next() {
                    push(url, "srcset", &mut out);
                }
            }
        }

        if let Some(style) = value.attr("style") {
            if style.contains("background-image") {
                let re = Regex::new(r#"url\(\s*['"]?([^'")]+)['"]?\s*\)"#).expect("valid regex");
                for caps in re.captures_iter(style) {
                    push(&caps[1], "style", &mut out);
                }
            }
        }

        // JSON blobs in data-* attributes (gallery configs, zoom data).
        for (name, raw) in value.attrs() {
            if !name.starts_with("data-") {
                continue;
            }
            let trimmed = raw.trim_start();
            if !(trimmed.starts_with('{') || trimmed.starts_with('[')) {
                continue;
            }
            // JSON often escapes slashes (`https:\/\/…`); match both shapes.
            let re = Regex::new(r#"https?:(?:\\/|/){2}[^"'\s]+\.(?:jpe?g|png|webp)[^"'\s]*"#)
                .expect("valid regex");
            for m in re.find_iter(raw) {
                push(&m.as_str().replace("\\/", "/"), "data-json", &mut out);
            }
        }
    }

    out
}

/// Picks the highest-scoring candidate within `scope` and upgrades it to a
/// large CDN variant. Deterministic: score ties break on first-seen order.
#[must_use]
pub fn pick_best_image(scope: ElementRef<'_>) -> Option<String> {
    let candidates = collect_candidates(scope);
    pick_best_candidate(&candidates).map(|c| upgrade_image_url(&c.url))
}

/// The filtered, upgraded gallery for `scope`, in first-seen order.
#[must_use]
pub fn collect_gallery(scope: ElementRef<'_>) -> Vec<String> {
    let candidates = collect_candidates(scope);
    let mut out: Vec<String> = Vec::with_capacity(candidates.len());
    for c in &candidates {
        if score_image_url(&c.url) < 0 {
            continue;
        }
        let upgraded = upgrade_image_url(&c.url);
        if !out.contains(&upgraded) {
            out.push(upgraded);
        }
    }
    out
}

fn pick_best_candidate<'a>(candidates: &'a [ImageCandidate]) -> Option<&'a ImageCandidate> {
    let mut best: Option<(&ImageCandidate, i64)> = None;
    for c in candidates {
        let score = score_image_url(&c.url);
        // Strictly-greater keeps the earliest candidate on ties.
        if best.is_none_or(|(_, s)| score > s) {
            best = Some((c, score));
        }
    }
    best.map(|(c, _)| c)
}

/// Scores a single URL. Higher wins. Also used by the listing merger to
/// decide which duplicate entry carries the better thumbnail.
#[must_use]
pub fn score_image_url(url: &str) -> i64 {
    let lowered = url.to_lowercase();
    let mut score: i64 = 0;

    if PRODUCT_CDN_FRAGMENTS.iter().any(|f| lowered.contains(f)) {
        score += 400;
    }

    let dims = parse_encoded_dims(&lowered);
    if has_extension(&lowered, &["jpg", "jpeg"]) {
        score += 200;
    } else if has_extension(&lowered, &["webp"]) {
        score += 180;
    } else if has_extension(&lowered, &["png"]) {
        score += 40;
        // A PNG with no encoded size is usually an icon, not a photo.
        if dims.is_none() {
            score -= 800;
        }
    }

    if let Some((w, h)) = dims {
        let pixels = i64::from(w) * i64::from(h);
        score += (pixels / 2000).min(400);
        let ratio = f64::from(w) / f64::from(h.max(1));
        if (0.75..=1.34).contains(&ratio) {
            score += 100;
        }
    }

    if PENALTY_FRAGMENTS.iter().any(|f| lowered.contains(f)) {
        score -= 1000;
    }

    score
}

/// Rewrites known low-resolution CDN size suffixes to a large canonical
/// variant, or appends one when the URL has none. Pure string transform.
#[must_use]
pub fn upgrade_image_url(url: &str) -> String {
    let re = Regex::new(r"_(\d{2,4})x(\d{2,4})(?:q\d+)?(?:xz)?").expect("valid regex");
    if let Some(caps) = re.captures(url) {
        let w: u32 = caps[1].parse().unwrap_or(0);
        let h: u32 = caps[2].parse().unwrap_or(0);
        if w <= 400 && h <= 400 {
            return re.replace(url, "_960x960q80").into_owned();
        }
        return url.to_owned();
    }

    // Alibaba CDN accepts a size-suffix variant appended to the original
    // file name: `H99.jpg` → `H99.jpg_960x960q80.jpg`.
    let lowered = url.to_lowercase();
    if lowered.contains("alicdn.com") && has_extension(&lowered, &["jpg", "jpeg", "webp"]) {
        return format!("{url}_960x960q80.jpg");
    }

    url.to_owned()
}

// ---------------------------------------------------------------------------
// Filtering helpers
// ---------------------------------------------------------------------------

/// Accepts absolute and protocol-relative URLs; everything else (data URIs,
/// bare relative paths) is dropped at collection time.
fn normalize_candidate_url(raw: &str) -> Option<String> {
    let trimmed = raw.trim();
    if trimmed.is_empty() || trimmed.starts_with("data:") {
        return None;
    }
    if let Some(rest) = trimmed.strip_prefix("//") {
        return Some(format!("https://{rest}"));
    }
    if trimmed.starts_with("http://") || trimmed.starts_with("https://") {
        return Some(trimmed.to_owned());
    }
    None
}

fn is_rejected(url: &str) -> bool {
    let lowered = url.to_lowercase();
    if REJECT_FRAGMENTS.iter().any(|f| lowered.contains(f)) {
        return true;
    }
    // Tracking pixels name a literal 1x1 dimension token. Require delimiters
    // so larger dimensions containing the digits (`_701x1000`) pass through.
    let pixel = Regex::new(r"(?:^|[/_\-.])1x1(?:[/_\-.]|$)").expect("valid regex");
    if pixel.is_match(&lowered) {
        return true;
    }
    if let Some((w, h)) = parse_encoded_dims(&lowered) {
        if w.min(h) < MIN_ICON_SIDE {
            return true;
        }
    }
    false
}

/// Parses pixel dimensions encoded in the file name: `_WxH` (optionally with
/// a quality suffix) or `-W-H.` shapes.
fn parse_encoded_dims(lowered: &str) -> Option<(u32, u32)> {
    let underscore = Regex::new(r"[_-](\d{2,4})x(\d{2,4})").expect("valid regex");
    if let Some(caps) = underscore.captures(lowered) {
        return Some((caps[1].parse().ok()?, caps[2].parse().ok()?));
    }
    let dashed = Regex::new(r"-(\d{2,4})-(\d{2,4})\.(?:jpe?g|png|webp)").expect("valid regex");
    if let Some(caps) = dashed.captures(lowered) {
        return Some((caps[1].parse().ok()?, caps[2].parse().ok()?));
    }
    None
}

fn has_extension(lowered: &str, exts: &[&str]) -> bool {
    // Match the final extension, tolerating CDN suffixes like
    // `.jpg_960x960q80.jpg` and query strings.
    let path_end = lowered.find(['?', '#']).unwrap_or(lowered.len());
    let path = &lowered[..path_end];
    exts.iter().any(|e| path.ends_with(&format!(".{e}")))
}
