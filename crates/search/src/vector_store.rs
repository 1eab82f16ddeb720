//! Product vectors in Qdrant
//!
//! One point per catalog product, keyed by product id. The payload carries
//! enough to render a hit without a catalog round trip.

use std::collections::HashMap;

use async_trait::async_trait;
use qdrant_client::{
    qdrant::{
        point_id::PointIdOptions, value::Kind, CreateCollectionBuilder, Distance, PointStruct,
        SearchPointsBuilder, UpsertPointsBuilder, Value as QdrantValue, VectorParamsBuilder,
    },
    Qdrant,
};
use voice_shop_config::constants::endpoints;
use voice_shop_core::{Product, ScoredMatch, VectorIndex};

use crate::SearchError;

/// Qdrant collection settings
///
/// Product vectors are compared by cosine similarity.
#[derive(Debug, Clone)]
pub struct VectorStoreConfig {
    /// REST or gRPC url of the Qdrant instance
    pub endpoint: String,
    pub collection: String,
    /// Must equal the embedder's output dimension
    pub vector_dim: usize,
    pub api_key: Option<String>,
}

impl Default for VectorStoreConfig {
    fn default() -> Self {
        Self {
            endpoint: endpoints::QDRANT_DEFAULT.to_string(),
            collection: endpoints::QDRANT_COLLECTION_DEFAULT.to_string(),
            vector_dim: endpoints::EMBEDDING_DIM_DEFAULT,
            api_key: None,
        }
    }
}

impl VectorStoreConfig {
    pub fn from_settings(
        vector: &voice_shop_config::VectorConfig,
        embedding: &voice_shop_config::EmbeddingConfig,
    ) -> Self {
        Self {
            endpoint: vector.endpoint.clone(),
            collection: vector.collection.clone(),
            vector_dim: embedding.dim,
            api_key: vector.api_key.clone(),
        }
    }
}

/// Payload stored with each product vector
pub(crate) fn product_payload(product: &Product) -> HashMap<String, QdrantValue> {
    let mut payload: HashMap<String, QdrantValue> = HashMap::new();
    payload.insert("name".to_string(), product.name.clone().into());
    payload.insert("price".to_string(), product.price.into());
    payload.insert(
        "description".to_string(),
        product.description.clone().unwrap_or_default().into(),
    );
    payload.insert(
        "image".to_string(),
        product.primary_image().unwrap_or_default().to_string().into(),
    );
    payload.insert("categories".to_string(), product.categories.join(", ").into());
    payload
}

fn to_json(value: QdrantValue) -> serde_json::Value {
    match value.kind {
        Some(Kind::StringValue(s)) => serde_json::Value::String(s),
        Some(Kind::DoubleValue(d)) => serde_json::json!(d),
        Some(Kind::IntegerValue(i)) => serde_json::json!(i),
        Some(Kind::BoolValue(b)) => serde_json::Value::Bool(b),
        _ => serde_json::Value::Null,
    }
}

/// Product vector index in Qdrant
pub struct QdrantIndex {
    client: Qdrant,
    config: VectorStoreConfig,
}

impl QdrantIndex {
    /// Build the client; no request is made until the first call
    pub fn new(config: VectorStoreConfig) -> Result<Self, SearchError> {
        let client = Qdrant::from_url(&config.endpoint)
            .api_key(config.api_key.clone())
            .build()
            .map_err(|e| SearchError::Connection(e.to_string()))?;

        tracing::debug!(
            endpoint = %config.endpoint,
            collection = %config.collection,
            authenticated = config.api_key.is_some(),
            "Qdrant client ready"
        );
        Ok(Self { client, config })
    }

    /// Create the product collection unless it already exists
    pub async fn ensure_collection(&self) -> Result<(), SearchError> {
        let collection = self.config.collection.as_str();
        let vector_store = |e: qdrant_client::QdrantError| SearchError::VectorStore(e.to_string());

        if self.client.collection_exists(collection).await.map_err(vector_store)? {
            return Ok(());
        }

        tracing::info!(collection, dim = self.config.vector_dim, "Creating vector collection");
        let vectors = VectorParamsBuilder::new(self.config.vector_dim as u64, Distance::Cosine);
        self.client
            .create_collection(CreateCollectionBuilder::new(collection).vectors_config(vectors))
            .await
            .map_err(vector_store)?;
        Ok(())
    }
}

#[async_trait]
impl VectorIndex for QdrantIndex {
    async fn search(
        &self,
        embedding: &[f32],
        top_k: usize,
    ) -> voice_shop_core::Result<Vec<ScoredMatch>> {
        let request =
            SearchPointsBuilder::new(&self.config.collection, embedding.to_vec(), top_k as u64)
                .with_payload(true);

        let results = self
            .client
            .search_points(request)
            .await
            .map_err(|e| SearchError::VectorStore(e.to_string()))?;

        Ok(results
            .result
            .into_iter()
            .map(|point| {
                let id = point
                    .id
                    .and_then(|pid| pid.point_id_options)
                    .map(|opt| match opt {
                        PointIdOptions::Uuid(u) => u,
                        PointIdOptions::Num(n) => n.to_string(),
                    })
                    .unwrap_or_default();

                ScoredMatch {
                    id,
                    score: point.score,
                    metadata: point
                        .payload
                        .into_iter()
                        .map(|(k, v)| (k, to_json(v)))
                        .collect(),
                }
            })
            .collect())
    }

    async fn upsert_product(
        &self,
        product: &Product,
        embedding: Vec<f32>,
    ) -> voice_shop_core::Result<()> {
        let point = PointStruct::new(product.id, embedding, product_payload(product));

        self.client
            .upsert_points(UpsertPointsBuilder::new(&self.config.collection, vec![point]))
            .await
            .map_err(|e| SearchError::VectorStore(e.to_string()))?;

        Ok(())
    }

    fn name(&self) -> &str {
        "qdrant"
    }
}
