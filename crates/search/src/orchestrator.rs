//! Search orchestration
//!
//! Catalog keyword search and vector similarity search run concurrently.
//! Only the catalog branch feeds the returned list; the vector branch is
//! observed (hit count logged) but never blended in. When the catalog comes
//! back empty, for whatever reason, a price-filtered mock catalog stands in.

use std::sync::Arc;

use futures::future::join_all;
use voice_shop_config::constants::limits;
use voice_shop_core::{
    CatalogClient, PriceFilter, Product, ProductQuery, SearchResult, TextEmbedder, VectorIndex,
};
use voice_shop_text_processing::{comparison_subjects, extract_subject};

use crate::mock_catalog::MockCatalog;

/// Orchestrator limits
#[derive(Debug, Clone)]
pub struct OrchestratorConfig {
    /// Maximum products returned by a keyword search
    pub search_limit: usize,
    /// Maximum products returned by a comparison
    pub compare_limit: usize,
    /// Neighbours requested from the vector index
    pub vector_top_k: usize,
}

impl Default for OrchestratorConfig {
    fn default() -> Self {
        Self {
            search_limit: limits::SEARCH_RESULTS,
            compare_limit: limits::COMPARE_RESULTS,
            vector_top_k: limits::VECTOR_TOP_K,
        }
    }
}

impl OrchestratorConfig {
    pub fn from_settings(settings: &voice_shop_config::Settings) -> Self {
        Self {
            search_limit: settings.catalog.search_limit.min(limits::SEARCH_RESULTS),
            vector_top_k: settings.vector.top_k,
            ..Self::default()
        }
    }
}

/// Embedder plus index, used together or not at all
#[derive(Clone)]
pub struct VectorBranch {
    pub embedder: Arc<dyn TextEmbedder>,
    pub index: Arc<dyn VectorIndex>,
}

impl VectorBranch {
    pub fn new(embedder: Arc<dyn TextEmbedder>, index: Arc<dyn VectorIndex>) -> Self {
        Self { embedder, index }
    }

    async fn hit_count(&self, text: &str, top_k: usize) -> voice_shop_core::Result<usize> {
        let embedding = self.embedder.embed(text).await?;
        Ok(self.index.search(&embedding, top_k).await?.len())
    }
}

/// Product search orchestrator
pub struct SearchOrchestrator {
    catalog: Option<Arc<dyn CatalogClient>>,
    vector: Option<VectorBranch>,
    mock: MockCatalog,
    config: OrchestratorConfig,
}

impl SearchOrchestrator {
    pub fn new(
        catalog: Option<Arc<dyn CatalogClient>>,
        vector: Option<VectorBranch>,
        config: OrchestratorConfig,
    ) -> Self {
        Self {
            catalog,
            vector,
            mock: MockCatalog::new(),
            config,
        }
    }

    /// Orchestrator with no live backends; every search is degraded
    pub fn offline() -> Self {
        Self::new(None, None, OrchestratorConfig::default())
    }

    pub fn has_catalog(&self) -> bool {
        self.catalog.is_some()
    }

    pub fn has_vector(&self) -> bool {
        self.vector.is_some()
    }

    pub fn config(&self) -> &OrchestratorConfig {
        &self.config
    }

    /// Keyword search with price bounds
    ///
    /// Never fails. At most `search_limit` products, each within the query's
    /// bounds.
    pub async fn search(&self, query: &ProductQuery) -> SearchResult {
        let filter = query.filter();
        let catalog_future = self.catalog_branch(&query.keyword, filter);
        let vector_future = self.vector_branch(&query.keyword);

        let (catalog_products, vector_hits) = tokio::join!(catalog_future, vector_future);

        if let Some(hits) = vector_hits {
            tracing::debug!(keyword = %query.keyword, hits, "Vector search completed");
        }

        let result = if catalog_products.is_empty() {
            tracing::warn!(
                keyword = %query.keyword,
                "No catalog results, using degraded mock catalog"
            );
            SearchResult::degraded(self.mock.search(&query.keyword, filter))
        } else {
            SearchResult::catalog(catalog_products)
        }
        .truncated(self.config.search_limit);

        metrics::counter!("voice_shop_search_total", "source" => result.source.as_str())
            .increment(1);

        tracing::info!(
            keyword = %query.keyword,
            count = result.len(),
            source = result.source.as_str(),
            "Search completed"
        );

        result
    }

    /// Comparison over the shoe lines named in `text`
    pub async fn compare(&self, text: &str, filter: PriceFilter) -> SearchResult {
        let subjects = comparison_subjects(text);
        self.compare_subjects(&subjects, filter).await
    }

    /// One top-1 catalog lookup per subject, in subject order
    ///
    /// Subjects without a match are skipped. No mock fallback.
    pub async fn compare_subjects(&self, subjects: &[String], filter: PriceFilter) -> SearchResult {
        let lookups = subjects
            .iter()
            .take(self.config.compare_limit)
            .map(|subject| self.top_match(subject, filter));

        let products: Vec<Product> = join_all(lookups).await.into_iter().flatten().collect();

        tracing::info!(
            subjects = subjects.len(),
            matched = products.len(),
            "Comparison completed"
        );

        SearchResult::catalog(products).truncated(self.config.compare_limit)
    }

    /// Top catalog match for the product named in `text`
    pub async fn show_product(&self, text: &str) -> Option<Product> {
        let subject = extract_subject(text);
        if subject.is_empty() {
            return None;
        }
        let product = self.top_match(&subject, PriceFilter::default()).await;
        if product.is_none() {
            tracing::info!(subject = %subject, "No catalog match for product lookup");
        }
        product
    }

    async fn top_match(&self, keyword: &str, filter: PriceFilter) -> Option<Product> {
        self.catalog_branch(keyword, filter).await.into_iter().next()
    }

    async fn catalog_branch(&self, keyword: &str, filter: PriceFilter) -> Vec<Product> {
        let Some(catalog) = self.catalog.as_ref() else {
            return Vec::new();
        };

        match catalog.search(keyword, filter).await {
            Ok(products) => products
                .into_iter()
                .filter(|p| filter.admits(p.price))
                .collect(),
            Err(e) => {
                tracing::warn!(catalog = catalog.name(), error = %e, "Catalog search failed");
                Vec::new()
            }
        }
    }

    async fn vector_branch(&self, keyword: &str) -> Option<usize> {
        let branch = self.vector.as_ref()?;
        match branch.hit_count(keyword, self.config.vector_top_k).await {
            Ok(hits) => Some(hits),
            Err(e) => {
                tracing::warn!(index = branch.index.name(), error = %e, "Vector search failed");
                None
            }
        }
    }
}
