//! Product search for the voice shopping assistant
//!
//! Features:
//! - BigCommerce v3 catalog client
//! - Hosted feature-extraction embeddings
//! - Dense product vectors in Qdrant
//! - Search orchestration with concurrent catalog/vector fan-out and a
//!   degraded-mode mock catalog
//! - Catalog to vector index sync

pub mod catalog;
pub mod embeddings;
pub mod mock_catalog;
pub mod orchestrator;
pub mod sync;
pub mod vector_store;

pub use catalog::{BigCommerceCatalog, BigCommerceConfig};
pub use embeddings::{HttpEmbedder, HttpEmbeddingConfig};
pub use mock_catalog::MockCatalog;
pub use orchestrator::{OrchestratorConfig, SearchOrchestrator, VectorBranch};
pub use sync::{CatalogSync, SyncReport};
pub use vector_store::{QdrantIndex, VectorStoreConfig};

use thiserror::Error;

/// Search errors
#[derive(Error, Debug)]
pub enum SearchError {
    #[error("Catalog error: {0}")]
    Catalog(String),

    #[error("Embedding error: {0}")]
    Embedding(String),

    #[error("Vector store error: {0}")]
    VectorStore(String),

    #[error("Connection error: {0}")]
    Connection(String),

    #[error("Not configured: {0}")]
    NotConfigured(String),
}

impl From<SearchError> for voice_shop_core::Error {
    fn from(err: SearchError) -> Self {
        match err {
            SearchError::Catalog(_) => voice_shop_core::Error::Catalog(err.to_string()),
            SearchError::Embedding(_) => voice_shop_core::Error::Embedding(err.to_string()),
            SearchError::VectorStore(_) | SearchError::Connection(_) => {
                voice_shop_core::Error::Vector(err.to_string())
            }
            SearchError::NotConfigured(_) => voice_shop_core::Error::Config(err.to_string()),
        }
    }
}
