//! Text cleaning shared by every source parser.
//!
//! Marketplace pages are full of decorative rows: empty "Customization
//! Options" cells, single-letter grid labels, "N/A" values. One predicate
//! ([`is_placeholder_value`]) rejects them at every call site so no parser
//! grows its own ad hoc denylist.

/// Strings that marketplaces render as grid values when no real data exists.
/// Matched case-insensitively after trimming.
const PLACEHOLDER_VALUES: &[&str] = &[
    "customization options",
    "customized logo",
    "customized packaging",
    "graphic customization",
    "n/a",
    "na",
    "null",
    "undefined",
    "-",
    "--",
    "...",
    "more",
    "view more",
    "contact supplier",
    "click to view",
];

/// Trailing marketing suffixes stripped from titles; each entry is matched
/// case-insensitively as `" - <suffix>…"` or `" | <suffix>…"`.
const TITLE_SUFFIX_MARKERS: &[&str] = &["buy ", "made-in-china.com", "alibaba.com", "indiamart"];

/// Whether a scraped label or value is a known placeholder rather than data.
///
/// Single-character tokens are treated as placeholders too: real attribute
/// labels are words, while layout grids leak one-letter cell markers.
#[must_use]
pub fn is_placeholder_value(text: &str) -> bool {
    let trimmed = text.trim();
    if trimmed.is_empty() || trimmed.chars().count() <= 1 {
        return true;
    }
    let lowered = trimmed.to_lowercase();
    PLACEHOLDER_VALUES.iter().any(|p| lowered == *p)
}

/// Collapses all whitespace runs (including newlines and NBSP) to single
/// spaces and trims. Parsers apply this before any regex-based extraction.
#[must_use]
pub fn collapse_whitespace(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    let mut last_was_space = true;
    for ch in text.chars() {
        if ch.is_whitespace() || ch == '\u{a0}' {
            if !last_was_space {
                out.push(' ');
                last_was_space = true;
            }
        } else {
            out.push(ch);
            last_was_space = false;
        }
    }
    while out.ends_with(' ') {
        out.pop();
    }
    out
}

/// Strips trailing marketing suffixes from a page title, e.g.
/// `"Steel Bottle - Buy Bottle Product on Alibaba.com"` → `"Steel Bottle"`.
#[must_use]
pub fn strip_title_suffix(title: &str) -> String {
    let cleaned = collapse_whitespace(title);
    let lowered = cleaned.to_lowercase();

    let mut cut = cleaned.len();
    for (idx, _) in lowered.match_indices(" - ") {
        let tail = &lowered[idx + 3..];
        if TITLE_SUFFIX_MARKERS.iter().any(|m| tail.starts_with(m)) {
            cut = cut.min(idx);
        }
    }
    for (idx, _) in lowered.match_indices(" | ") {
        let tail = &lowered[idx + 3..];
        if TITLE_SUFFIX_MARKERS.iter().any(|m| tail.contains(m)) {
            cut = cut.min(idx);
        }
    }

    // Lowercasing is length-preserving for the ASCII markers we match, but
    // guard the boundary anyway for exotic titles.
    if cut < cleaned.len() && cleaned.is_char_boundary(cut) {
        cleaned[..cut].trim().to_owned()
    } else {
        cleaned
    }
}
