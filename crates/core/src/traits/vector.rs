//! Embedding and vector index traits

use std::collections::HashMap;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::product::Product;
use crate::Result;

/// Text embedding service
#[async_trait]
pub trait TextEmbedder: Send + Sync + 'static {
    async fn embed(&self, text: &str) -> Result<Vec<f32>>;

    /// Embedding dimension
    fn dim(&self) -> usize;
}

/// A nearest-neighbour hit
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ScoredMatch {
    pub id: String,
    pub score: f32,
    #[serde(default)]
    pub metadata: HashMap<String, serde_json::Value>,
}

impl ScoredMatch {
    pub fn new(id: impl Into<String>, score: f32) -> Self {
        Self {
            id: id.into(),
            score,
            metadata: HashMap::new(),
        }
    }

    /// String metadata field, if present
    pub fn meta_str(&self, key: &str) -> Option<&str> {
        self.metadata.get(key).and_then(|v| v.as_str())
    }
}

/// Vector similarity index over catalog products
#[async_trait]
pub trait VectorIndex: Send + Sync + 'static {
    async fn search(&self, embedding: &[f32], top_k: usize) -> Result<Vec<ScoredMatch>>;

    /// Insert or replace the vector for a product
    async fn upsert_product(&self, product: &Product, embedding: Vec<f32>) -> Result<()>;

    fn name(&self) -> &str;
}
