//! Product catalog types
//!
//! Products are read-only views of the external catalog. Queries carry an
//! optional integer price range; results remember whether they came from the
//! real catalog or from the degraded-mode mock catalog.

use serde::{Deserialize, Deserializer, Serialize};

/// Maximum number of products shown in a live progress preview
pub const PREVIEW_LIMIT: usize = 6;

/// Product image reference
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ProductImage {
    /// Catalog APIs differ on the field name; `url_standard` is the catalog's full-size image
    #[serde(alias = "url_standard")]
    pub url: String,
}

/// Catalog product
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Product {
    pub id: u64,
    pub name: String,
    pub price: f64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub images: Vec<ProductImage>,
    /// Category labels; numeric catalog category ids are kept as their decimal string
    #[serde(
        default,
        skip_serializing_if = "Vec::is_empty",
        deserialize_with = "labels_or_ids"
    )]
    pub categories: Vec<String>,
}

impl Product {
    /// Create a product with only the required fields set
    pub fn new(id: u64, name: impl Into<String>, price: f64) -> Self {
        Self {
            id,
            name: name.into(),
            price,
            description: None,
            images: Vec::new(),
            categories: Vec::new(),
        }
    }

    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = Some(description.into());
        self
    }

    pub fn with_image(mut self, url: impl Into<String>) -> Self {
        self.images.push(ProductImage { url: url.into() });
        self
    }

    pub fn with_categories(mut self, categories: &[&str]) -> Self {
        self.categories = categories.iter().map(|c| c.to_string()).collect();
        self
    }

    /// First image URL, if any
    pub fn primary_image(&self) -> Option<&str> {
        self.images.first().map(|i| i.url.as_str())
    }

    /// Text used for embedding and similarity search
    pub fn search_text(&self) -> String {
        let categories = self.categories.join(" ");
        [
            self.name.as_str(),
            self.description.as_deref().unwrap_or(""),
            categories.as_str(),
        ]
        .iter()
        .map(|part| part.trim())
        .filter(|part| !part.is_empty())
        .collect::<Vec<_>>()
        .join(" ")
    }
}

fn labels_or_ids<'de, D>(deserializer: D) -> Result<Vec<String>, D::Error>
where
    D: Deserializer<'de>,
{
    #[derive(Deserialize)]
    #[serde(untagged)]
    enum Label {
        Text(String),
        Id(u64),
    }

    let labels: Option<Vec<Label>> = Option::deserialize(deserializer)?;
    Ok(labels
        .unwrap_or_default()
        .into_iter()
        .map(|l| match l {
            Label::Text(s) => s,
            Label::Id(id) => id.to_string(),
        })
        .collect())
}

/// Inclusive integer price bounds
///
/// Bounds are independent: `min > max` is allowed and admits nothing.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct PriceFilter {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub min: Option<u32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub max: Option<u32>,
}

impl PriceFilter {
    pub fn new(min: Option<u32>, max: Option<u32>) -> Self {
        Self { min, max }
    }

    pub fn under(max: u32) -> Self {
        Self { min: None, max: Some(max) }
    }

    pub fn over(min: u32) -> Self {
        Self { min: Some(min), max: None }
    }

    pub fn between(min: u32, max: u32) -> Self {
        Self { min: Some(min), max: Some(max) }
    }

    /// True when neither bound is set
    pub fn is_unbounded(&self) -> bool {
        self.min.is_none() && self.max.is_none()
    }

    /// Whether a price satisfies both bounds
    pub fn admits(&self, price: f64) -> bool {
        let above_min = self.min.map_or(true, |min| price >= f64::from(min));
        let below_max = self.max.map_or(true, |max| price <= f64::from(max));
        above_min && below_max
    }

    /// Fill unset bounds from another filter
    pub fn or(self, other: PriceFilter) -> Self {
        Self {
            min: self.min.or(other.min),
            max: self.max.or(other.max),
        }
    }
}

/// A catalog query: keywords plus optional price bounds
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct ProductQuery {
    pub keyword: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub price_min: Option<u32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub price_max: Option<u32>,
}

impl ProductQuery {
    pub fn new(keyword: impl Into<String>) -> Self {
        Self {
            keyword: keyword.into(),
            price_min: None,
            price_max: None,
        }
    }

    pub fn with_filter(mut self, filter: PriceFilter) -> Self {
        self.price_min = filter.min;
        self.price_max = filter.max;
        self
    }

    pub fn filter(&self) -> PriceFilter {
        PriceFilter::new(self.price_min, self.price_max)
    }
}

/// Where the products in a [`SearchResult`] came from
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SearchSource {
    /// Returned by the live catalog
    #[default]
    Catalog,
    /// Fabricated from the mock catalog because no backend produced results
    Degraded,
}

impl SearchSource {
    pub fn as_str(&self) -> &'static str {
        match self {
            SearchSource::Catalog => "catalog",
            SearchSource::Degraded => "degraded",
        }
    }
}

/// Ordered search result
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct SearchResult {
    pub products: Vec<Product>,
    pub source: SearchSource,
}

impl SearchResult {
    pub fn catalog(products: Vec<Product>) -> Self {
        Self {
            products,
            source: SearchSource::Catalog,
        }
    }

    pub fn degraded(products: Vec<Product>) -> Self {
        Self {
            products,
            source: SearchSource::Degraded,
        }
    }

    pub fn empty() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.products.len()
    }

    pub fn is_empty(&self) -> bool {
        self.products.is_empty()
    }

    pub fn is_degraded(&self) -> bool {
        self.source == SearchSource::Degraded
    }

    pub fn first(&self) -> Option<&Product> {
        self.products.first()
    }

    /// Leading products for a live preview, never more than [`PREVIEW_LIMIT`]
    pub fn preview(&self) -> &[Product] {
        let end = self.products.len().min(PREVIEW_LIMIT);
        &self.products[..end]
    }

    /// Keep at most `limit` products
    pub fn truncated(mut self, limit: usize) -> Self {
        self.products.truncate(limit);
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_filter_admits() {
        let under = PriceFilter::under(100);
        assert!(under.admits(99.99));
        assert!(under.admits(100.0));
        assert!(!under.admits(100.01));

        let over = PriceFilter::over(50);
        assert!(over.admits(50.0));
        assert!(!over.admits(49.0));

        assert!(PriceFilter::default().admits(1_000_000.0));
    }

    #[test]
    fn test_inverted_range_admits_nothing() {
        let inverted = PriceFilter::between(200, 100);
        for price in [0.0, 100.0, 150.0, 200.0, 500.0] {
            assert!(!inverted.admits(price));
        }
    }

    #[test]
    fn test_filter_or_keeps_own_bounds() {
        let llm = PriceFilter::new(None, Some(80));
        let text = PriceFilter::between(20, 100);
        assert_eq!(llm.or(text), PriceFilter::between(20, 80));
    }

    #[test]
    fn test_preview_is_capped() {
        let products = (0..10).map(|i| Product::new(i, format!("Shoe {i}"), 50.0)).collect();
        let result = SearchResult::catalog(products);
        assert_eq!(result.preview().len(), PREVIEW_LIMIT);
        assert_eq!(result.preview()[0].id, 0);

        let small = SearchResult::catalog(vec![Product::new(1, "Solo", 10.0)]);
        assert_eq!(small.preview().len(), 1);
    }

    #[test]
    fn test_product_deserializes_catalog_shape() {
        let json = r#"{
            "id": 77,
            "name": "Cloud Runner",
            "price": 89.5,
            "description": "Light trainer",
            "images": [{"url_standard": "https://cdn.example.com/77.jpg"}],
            "categories": [23, 41],
            "sku": "CR-77"
        }"#;
        let product: Product = serde_json::from_str(json).unwrap();
        assert_eq!(product.id, 77);
        assert_eq!(product.primary_image(), Some("https://cdn.example.com/77.jpg"));
        assert_eq!(product.categories, vec!["23", "41"]);
    }

    #[test]
    fn test_product_minimal_fields() {
        let product: Product =
            serde_json::from_str(r#"{"id": 1, "name": "Plain", "price": 10}"#).unwrap();
        assert!(product.description.is_none());
        assert!(product.images.is_empty());
        assert!(product.categories.is_empty());
    }

    #[test]
    fn test_search_text() {
        let product = Product::new(3, "Speed Pro", 120.0)
            .with_description("Racing flat")
            .with_categories(&["Running", "Racing"]);
        assert_eq!(product.search_text(), "Speed Pro Racing flat Running Racing");
    }
}
