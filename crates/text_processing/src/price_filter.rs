//! Price filter extraction
//!
//! Recognized phrases (case-insensitive, `$` and a trailing "dollars"/"bucks"
//! optional):
//!
//! | phrase                          | result            |
//! |---------------------------------|-------------------|
//! | `under / below / less than N`   | `max = N`         |
//! | `over / above / more than N`    | `min = N`         |
//! | `between / from N and / to M`   | `min = N, max = M`|
//!
//! The first match per category wins. A range overrides any partial bound.
//! Amounts are whole numbers, optionally with thousands separators
//! (`1,000`); anything that does not fit a `u32` is ignored.

use once_cell::sync::Lazy;
use regex::Regex;
use voice_shop_core::PriceFilter;

/// Whole number, grouped by commas or not
const NUMBER: &str = r"\d{1,3}(?:,\d{3})+|\d+";

/// `$`-prefixed or bare amount with optional currency word
static AMOUNT: Lazy<String> =
    Lazy::new(|| format!(r"\$?\s*({NUMBER})(?:\s*(?:dollars?|bucks))?\b"));

pub(crate) static UNDER: Lazy<Regex> = Lazy::new(|| {
    Regex::new(&format!(r"(?i)\b(?:under|below|less\s+than)\s+{}", AMOUNT.as_str())).unwrap()
});

pub(crate) static OVER: Lazy<Regex> = Lazy::new(|| {
    Regex::new(&format!(r"(?i)\b(?:over|above|more\s+than)\s+{}", AMOUNT.as_str())).unwrap()
});

pub(crate) static BETWEEN: Lazy<Regex> = Lazy::new(|| {
    Regex::new(&format!(
        r"(?i)\b(?:between|from)\s+{amount}\s*(?:and|to)\s+{amount}",
        amount = AMOUNT.as_str()
    ))
    .unwrap()
});

pub(crate) static BARE_DOLLARS: Lazy<Regex> = Lazy::new(|| {
    Regex::new(&format!(r"(?i)\$\s*(?:{NUMBER})(?:\s*(?:dollars?|bucks))?\b")).unwrap()
});

fn amount(caps: &regex::Captures<'_>, group: usize) -> Option<u32> {
    caps.get(group)
        .and_then(|m| m.as_str().replace(',', "").parse::<u32>().ok())
}

/// Extract a price filter from free text
pub fn extract_price_filter(text: &str) -> PriceFilter {
    let mut filter = PriceFilter::default();

    if let Some(caps) = UNDER.captures(text) {
        filter.max = amount(&caps, 1);
    }

    if let Some(caps) = OVER.captures(text) {
        filter.min = amount(&caps, 1);
    }

    if let Some(caps) = BETWEEN.captures(text) {
        filter = PriceFilter::new(amount(&caps, 1), amount(&caps, 2));
    }

    filter
}
