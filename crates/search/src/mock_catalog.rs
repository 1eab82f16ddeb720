//! Degraded-mode product fixtures
//!
//! When no backend produces results, a well-formed query still gets a small
//! set of plausible products named after what was asked for.

use voice_shop_core::{PriceFilter, Product};

const PLACEHOLDER_IMAGE: &str = "/placeholder-shoe.jpg";

/// Fixed mock catalog
#[derive(Debug, Clone, Default)]
pub struct MockCatalog;

impl MockCatalog {
    pub fn new() -> Self {
        Self
    }

    /// Every mock product for a keyword, unfiltered
    pub fn products(&self, keyword: &str) -> Vec<Product> {
        let subject = match keyword.trim() {
            "" => "shoes",
            k => k,
        };

        vec![
            Product::new(1, format!("Sample {subject} - Athletic Running Shoe"), 120.0)
                .with_description(format!(
                    "High-quality {subject} designed for performance and comfort"
                ))
                .with_image(PLACEHOLDER_IMAGE)
                .with_categories(&["Running", "Athletic"]),
            Product::new(2, format!("Premium {subject} - Training Sneaker"), 95.0)
                .with_description(format!(
                    "Versatile {subject} perfect for training and everyday wear"
                ))
                .with_image(PLACEHOLDER_IMAGE)
                .with_categories(&["Training", "Casual"]),
        ]
    }

    /// Mock products satisfying the price bounds
    pub fn search(&self, keyword: &str, filter: PriceFilter) -> Vec<Product> {
        self.products(keyword)
            .into_iter()
            .filter(|p| filter.admits(p.price))
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_products_named_after_keyword() {
        let products = MockCatalog::new().products("trail runners");
        assert_eq!(products.len(), 2);
        assert_eq!(products[0].name, "Sample trail runners - Athletic Running Shoe");
        assert_eq!(products[1].price, 95.0);
        assert_eq!(products[1].primary_image(), Some(PLACEHOLDER_IMAGE));
    }

    #[test]
    fn test_empty_keyword() {
        let products = MockCatalog::new().products("  ");
        assert!(products[0].name.starts_with("Sample shoes"));
    }

    #[test]
    fn test_price_filtering() {
        let mock = MockCatalog::new();
        let under_100 = mock.search("shoes", PriceFilter::under(100));
        assert_eq!(under_100.len(), 1);
        assert_eq!(under_100[0].id, 2);

        assert_eq!(mock.search("shoes", PriceFilter::over(100))[0].id, 1);
        assert!(mock.search("shoes", PriceFilter::under(50)).is_empty());
        assert_eq!(mock.search("shoes", PriceFilter::default()).len(), 2);
    }
}
