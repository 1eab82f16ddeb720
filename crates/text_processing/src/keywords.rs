//! Search keyword normalization
//!
//! Strips every price phrase understood by [`crate::price_filter`], plus bare
//! `$N` amounts, so that what remains can be sent to a keyword search.

use once_cell::sync::Lazy;
use regex::Regex;

use crate::price_filter::{BARE_DOLLARS, BETWEEN, OVER, UNDER};

static WHITESPACE: Lazy<Regex> = Lazy::new(|| Regex::new(r"\s+").unwrap());

fn strip_once(text: &str) -> String {
    let text = BETWEEN.replace_all(text, " ");
    let text = UNDER.replace_all(&text, " ");
    let text = OVER.replace_all(&text, " ");
    let text = BARE_DOLLARS.replace_all(&text, " ");
    WHITESPACE.replace_all(&text, " ").trim().to_string()
}

/// Remove price phrases and collapse whitespace
///
/// Removal repeats until nothing changes, so the output never contains a
/// price phrase even when one removal exposes another.
pub fn normalize_keywords(text: &str) -> String {
    let mut current = strip_once(text);
    loop {
        let next = strip_once(&current);
        if next == current {
            return current;
        }
        current = next;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::extract_price_filter;

    #[test]
    fn test_strips_filter_phrases() {
        assert_eq!(normalize_keywords("running shoes under $100"), "running shoes");
        assert_eq!(
            normalize_keywords("trail shoes between 50 and 120 dollars"),
            "trail shoes"
        );
        assert_eq!(normalize_keywords("boots over 60 bucks in black"), "boots in black");
        assert_eq!(normalize_keywords("sandals for $40"), "sandals for");
    }

    #[test]
    fn test_range_numerals_removed() {
        let out = normalize_keywords("between 70 and 90 cloud runners");
        assert!(!out.contains("70"));
        assert!(!out.contains("90"));
        assert_eq!(out, "cloud runners");
    }

    #[test]
    fn test_strips_grouped_amounts() {
        assert_eq!(normalize_keywords("boots under $1,000"), "boots");
        assert_eq!(normalize_keywords("$2,500 designer sneakers"), "designer sneakers");
        assert_eq!(
            normalize_keywords("loafers between 1,200 and 1,500 dollars"),
            "loafers"
        );
    }

    #[test]
    fn test_collapses_whitespace() {
        assert_eq!(
            normalize_keywords("  red   sneakers  under 80   size 9 "),
            "red sneakers size 9"
        );
    }

    #[test]
    fn test_idempotent() {
        for text in [
            "running shoes under 100 dollars",
            "under under 5 10",
            "from 10 to 20 and over 30",
            "plain words",
        ] {
            let once = normalize_keywords(text);
            assert_eq!(normalize_keywords(&once), once, "{text}");
            assert!(extract_price_filter(&once).is_unbounded(), "{text}");
        }
    }

    #[test]
    fn test_no_price_passthrough() {
        assert_eq!(normalize_keywords("Speed Pro 2"), "Speed Pro 2");
    }
}
