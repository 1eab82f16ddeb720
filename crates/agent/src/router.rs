//! Keyword routing for one-shot voice queries
//!
//! No LLM involved: the query's wording alone picks the action.

use std::sync::Arc;

use serde::Serialize;
use voice_shop_core::{Product, ProductQuery};
use voice_shop_search::SearchOrchestrator;
use voice_shop_text_processing::{extract_price_filter, normalize_keywords};

use crate::cart::CartStore;
use crate::registry::SessionRegistry;

const CART_PHRASES: [&str; 2] = ["add to cart", "buy this"];
const DETAIL_PHRASES: [&str; 2] = ["tell me about", "show me details"];

/// Routed result, serialized as `{"action": ..., ...}`
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "action", rename_all = "snake_case")]
pub enum RoutedAction {
    Compare { products: Vec<Product> },
    AddToCart { product: Option<Product> },
    ShowProduct { product: Option<Product> },
    Search { products: Vec<Product>, query: String },
}

pub struct KeywordRouter {
    orchestrator: Arc<SearchOrchestrator>,
    registry: Arc<SessionRegistry>,
    carts: Arc<CartStore>,
}

impl KeywordRouter {
    pub fn new(
        orchestrator: Arc<SearchOrchestrator>,
        registry: Arc<SessionRegistry>,
        carts: Arc<CartStore>,
    ) -> Self {
        Self {
            orchestrator,
            registry,
            carts,
        }
    }

    /// Route a query; `session_id` scopes the cart and last shown product
    pub async fn route(&self, query: &str, session_id: Option<&str>) -> RoutedAction {
        let lower = query.to_lowercase();
        let filter = extract_price_filter(query);

        if lower.contains("compare") {
            let result = self.orchestrator.compare(query, filter).await;
            self.remember(session_id, result.first());
            return RoutedAction::Compare {
                products: result.products,
            };
        }

        if CART_PHRASES.iter().any(|p| lower.contains(p)) {
            let product = session_id.and_then(|id| {
                let product = self.registry.last_product(id)?;
                self.carts.add(id, product.clone());
                Some(product)
            });
            return RoutedAction::AddToCart { product };
        }

        if DETAIL_PHRASES.iter().any(|p| lower.contains(p)) {
            let product = self.orchestrator.show_product(query).await;
            self.remember(session_id, product.as_ref());
            return RoutedAction::ShowProduct { product };
        }

        let keywords = normalize_keywords(query);
        let result = self
            .orchestrator
            .search(&ProductQuery::new(keywords).with_filter(filter))
            .await;
        if !result.is_degraded() {
            self.remember(session_id, result.first());
        }
        RoutedAction::Search {
            products: result.products,
            query: query.to_string(),
        }
    }

    fn remember(&self, session_id: Option<&str>, product: Option<&Product>) {
        if let (Some(id), Some(product)) = (session_id, product) {
            self.registry.remember_product(id, product.clone());
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn router() -> KeywordRouter {
        KeywordRouter::new(
            Arc::new(SearchOrchestrator::offline()),
            Arc::new(SessionRegistry::default()),
            Arc::new(CartStore::new()),
        )
    }

    #[tokio::test]
    async fn test_search_is_default_route() {
        let routed = router().route("trail shoes under 100", None).await;
        match routed {
            RoutedAction::Search { products, query } => {
                assert_eq!(query, "trail shoes under 100");
                assert_eq!(products.len(), 1);
                assert!(products[0].name.contains("trail shoes"));
            }
            other => panic!("unexpected route: {other:?}"),
        }
    }

    #[tokio::test]
    async fn test_cart_without_memory_is_null() {
        let routed = router().route("add to cart please", Some("s1")).await;
        assert_eq!(routed, RoutedAction::AddToCart { product: None });
        assert_eq!(
            serde_json::to_value(&routed).unwrap(),
            serde_json::json!({"action": "add_to_cart", "product": null})
        );
    }

    #[tokio::test]
    async fn test_cart_uses_remembered_product() {
        let router = router();
        router
            .registry
            .remember_product("s1", Product::new(4, "Cloud Pro", 140.0));

        let routed = router.route("buy this", Some("s1")).await;
        assert_eq!(
            routed,
            RoutedAction::AddToCart {
                product: Some(Product::new(4, "Cloud Pro", 140.0))
            }
        );
        assert_eq!(router.carts.len("s1"), 1);
    }

    #[tokio::test]
    async fn test_compare_and_detail_routes() {
        let router = router();
        let compare = router.route("Compare the cloud and speed", None).await;
        assert_eq!(compare, RoutedAction::Compare { products: vec![] });

        let detail = router.route("tell me about the cloud pro", None).await;
        assert_eq!(detail, RoutedAction::ShowProduct { product: None });
    }
}
