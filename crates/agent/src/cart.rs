//! Per-session in-memory carts

use std::collections::HashMap;

use parking_lot::RwLock;
use voice_shop_core::Product;

#[derive(Default)]
pub struct CartStore {
    carts: RwLock<HashMap<String, Vec<Product>>>,
}

impl CartStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a product, returning the cart size afterwards
    pub fn add(&self, session_id: &str, product: Product) -> usize {
        let mut carts = self.carts.write();
        let cart = carts.entry(session_id.to_string()).or_default();
        cart.push(product);
        tracing::debug!(session_id, items = cart.len(), "Added product to cart");
        cart.len()
    }

    pub fn items(&self, session_id: &str) -> Vec<Product> {
        self.carts
            .read()
            .get(session_id)
            .cloned()
            .unwrap_or_default()
    }

    pub fn len(&self, session_id: &str) -> usize {
        self.carts.read().get(session_id).map_or(0, Vec::len)
    }

    /// Empty and forget a session's cart
    pub fn clear(&self, session_id: &str) {
        self.carts.write().remove(session_id);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_add_list_clear() {
        let carts = CartStore::new();
        assert_eq!(carts.add("s1", Product::new(1, "Cloud Pro", 140.0)), 1);
        assert_eq!(carts.add("s1", Product::new(2, "Speed Pro", 120.0)), 2);
        assert_eq!(carts.add("s2", Product::new(1, "Cloud Pro", 140.0)), 1);

        assert_eq!(carts.len("s1"), 2);
        assert_eq!(carts.items("s1")[1].name, "Speed Pro");

        carts.clear("s1");
        assert!(carts.items("s1").is_empty());
        assert_eq!(carts.len("s2"), 1);
    }
}
