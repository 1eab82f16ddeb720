//! Product catalog trait

use async_trait::async_trait;

use crate::product::{PriceFilter, Product};
use crate::Result;

/// Read-only access to the store catalog
///
/// Implementations:
/// - `BigCommerceCatalog` - BigCommerce v3 catalog API
#[async_trait]
pub trait CatalogClient: Send + Sync + 'static {
    /// Keyword search with optional price bounds
    ///
    /// Implementations may pass the bounds to the backend; callers must not
    /// assume every returned product satisfies them.
    async fn search(&self, keyword: &str, filter: PriceFilter) -> Result<Vec<Product>>;

    /// Fetch a single product, `None` when the id is unknown
    async fn get(&self, id: u64) -> Result<Option<Product>>;

    /// One page of the full catalog, pages start at 1
    async fn list(&self, page: u32, limit: u32) -> Result<Vec<Product>>;

    /// Backend name for logging
    fn name(&self) -> &str;
}
