//! Catalog to vector index sync
//!
//! Pages through the whole catalog, embeds each product's search text and
//! upserts it. A product that fails to embed or upsert is logged and skipped;
//! a page that fails to load aborts the run.

use std::sync::Arc;

use voice_shop_config::constants::limits;
use voice_shop_core::{CatalogClient, Product, TextEmbedder, VectorIndex};

/// Outcome of a sync run
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct SyncReport {
    /// Catalog pages fetched, including the terminating page
    pub pages: u32,
    pub upserted: usize,
    pub failed: usize,
}

/// Catalog sync job
pub struct CatalogSync {
    catalog: Arc<dyn CatalogClient>,
    embedder: Arc<dyn TextEmbedder>,
    index: Arc<dyn VectorIndex>,
    page_size: u32,
}

impl CatalogSync {
    pub fn new(
        catalog: Arc<dyn CatalogClient>,
        embedder: Arc<dyn TextEmbedder>,
        index: Arc<dyn VectorIndex>,
    ) -> Self {
        Self {
            catalog,
            embedder,
            index,
            page_size: limits::SYNC_PAGE_SIZE,
        }
    }

    pub fn with_page_size(mut self, page_size: u32) -> Self {
        self.page_size = page_size.max(1);
        self
    }

    /// Run the sync to completion
    pub async fn run(&self) -> voice_shop_core::Result<SyncReport> {
        let mut report = SyncReport::default();
        let mut page = 1;

        loop {
            let products = self.catalog.list(page, self.page_size).await?;
            report.pages += 1;

            tracing::info!(page, count = products.len(), "Fetched catalog page");

            for product in &products {
                match self.index_product(product).await {
                    Ok(()) => report.upserted += 1,
                    Err(e) => {
                        report.failed += 1;
                        tracing::warn!(product_id = product.id, error = %e, "Failed to index product");
                    }
                }
            }

            if products.len() < self.page_size as usize {
                break;
            }
            page += 1;
        }

        tracing::info!(
            pages = report.pages,
            upserted = report.upserted,
            failed = report.failed,
            index = self.index.name(),
            "Catalog sync completed"
        );

        Ok(report)
    }

    async fn index_product(&self, product: &Product) -> voice_shop_core::Result<()> {
        let embedding = self.embedder.embed(&product.search_text()).await?;
        self.index.upsert_product(product, embedding).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use parking_lot::Mutex;
    use voice_shop_core::{Error, PriceFilter, ScoredMatch};

    struct PagedCatalog {
        total: u64,
        fail_on_page: Option<u32>,
        pages_requested: Mutex<Vec<u32>>,
    }

    impl PagedCatalog {
        fn new(total: u64) -> Self {
            Self {
                total,
                fail_on_page: None,
                pages_requested: Mutex::new(Vec::new()),
            }
        }
    }

    #[async_trait]
    impl CatalogClient for PagedCatalog {
        async fn search(
            &self,
            _keyword: &str,
            _filter: PriceFilter,
        ) -> voice_shop_core::Result<Vec<Product>> {
            Ok(Vec::new())
        }

        async fn get(&self, _id: u64) -> voice_shop_core::Result<Option<Product>> {
            Ok(None)
        }

        async fn list(&self, page: u32, limit: u32) -> voice_shop_core::Result<Vec<Product>> {
            self.pages_requested.lock().push(page);
            if self.fail_on_page == Some(page) {
                return Err(Error::Catalog("HTTP 500".into()));
            }
            let start = (page as u64 - 1) * limit as u64 + 1;
            let end = (start + limit as u64 - 1).min(self.total);
            Ok((start..=end)
                .map(|id| Product::new(id, format!("Shoe {id}"), 50.0).with_categories(&["Running"]))
                .collect())
        }

        fn name(&self) -> &str {
            "paged"
        }
    }

    /// Fails for product names containing "13"
    struct PickyEmbedder;

    #[async_trait]
    impl TextEmbedder for PickyEmbedder {
        async fn embed(&self, text: &str) -> voice_shop_core::Result<Vec<f32>> {
            if text.contains("13") {
                return Err(Error::Embedding("rate limited".into()));
            }
            Ok(vec![text.len() as f32])
        }

        fn dim(&self) -> usize {
            1
        }
    }

    #[derive(Default)]
    struct RecordingIndex {
        upserts: Mutex<Vec<(u64, Vec<f32>)>>,
    }

    #[async_trait]
    impl VectorIndex for RecordingIndex {
        async fn search(
            &self,
            _embedding: &[f32],
            _top_k: usize,
        ) -> voice_shop_core::Result<Vec<ScoredMatch>> {
            Ok(Vec::new())
        }

        async fn upsert_product(
            &self,
            product: &Product,
            embedding: Vec<f32>,
        ) -> voice_shop_core::Result<()> {
            self.upserts.lock().push((product.id, embedding));
            Ok(())
        }

        fn name(&self) -> &str {
            "recording"
        }
    }

    #[tokio::test]
    async fn test_pages_until_short_page() {
        let catalog = Arc::new(PagedCatalog::new(25));
        let index = Arc::new(RecordingIndex::default());
        let sync = CatalogSync::new(catalog.clone(), Arc::new(PickyEmbedder), index.clone())
            .with_page_size(10);

        let report = sync.run().await.unwrap();
        assert_eq!(report.pages, 3);
        assert_eq!(report.upserted, 24);
        assert_eq!(report.failed, 1);
        assert_eq!(*catalog.pages_requested.lock(), vec![1, 2, 3]);

        let upserts = index.upserts.lock();
        assert!(upserts.iter().all(|(id, _)| *id != 13));
        // "Shoe 1 Running"
        assert_eq!(upserts[0], (1, vec![14.0]));
    }

    #[tokio::test]
    async fn test_exact_multiple_ends_on_empty_page() {
        let catalog = Arc::new(PagedCatalog::new(20));
        let index = Arc::new(RecordingIndex::default());
        let sync = CatalogSync::new(catalog.clone(), Arc::new(PickyEmbedder), index)
            .with_page_size(10);

        let report = sync.run().await.unwrap();
        assert_eq!(report.pages, 3);
        assert_eq!(report.upserted + report.failed, 20);
    }

    #[tokio::test]
    async fn test_page_failure_aborts() {
        let catalog = Arc::new(PagedCatalog {
            fail_on_page: Some(2),
            ..PagedCatalog::new(50)
        });
        let sync = CatalogSync::new(
            catalog,
            Arc::new(PickyEmbedder),
            Arc::new(RecordingIndex::default()),
        )
        .with_page_size(10);

        let err = sync.run().await.unwrap_err();
        assert!(matches!(err, Error::Catalog(_)));
    }
}
