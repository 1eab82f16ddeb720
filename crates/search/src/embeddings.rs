//! Hosted feature-extraction embeddings
//!
//! `POST {endpoint}/{model}` with `{"inputs": text}` and bearer auth. The
//! service answers with either a flat vector or a batch of one.

use std::time::Duration;

use async_trait::async_trait;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use voice_shop_core::TextEmbedder;

use crate::SearchError;

/// Embedding service configuration
#[derive(Debug, Clone)]
pub struct HttpEmbeddingConfig {
    pub endpoint: String,
    pub model: String,
    pub api_key: Option<String>,
    /// Embedding dimension
    pub embedding_dim: usize,
    pub timeout: Duration,
}

impl HttpEmbeddingConfig {
    pub fn from_settings(settings: &voice_shop_config::EmbeddingConfig) -> Self {
        Self {
            endpoint: settings.endpoint.trim_end_matches('/').to_string(),
            model: settings.model.clone(),
            api_key: settings.api_key.clone(),
            embedding_dim: settings.dim,
            timeout: Duration::from_millis(settings.timeout_ms),
        }
    }

    fn url(&self) -> String {
        format!("{}/{}", self.endpoint, self.model)
    }
}

#[derive(Debug, Serialize)]
struct EmbedRequest<'a> {
    inputs: &'a str,
    options: EmbedOptions,
}

#[derive(Debug, Serialize)]
struct EmbedOptions {
    wait_for_model: bool,
}

#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum EmbedResponse {
    Flat(Vec<f32>),
    Batch(Vec<Vec<f32>>),
}

impl EmbedResponse {
    fn into_vector(self) -> Option<Vec<f32>> {
        match self {
            EmbedResponse::Flat(v) => Some(v),
            EmbedResponse::Batch(batch) => batch.into_iter().next(),
        }
    }
}

/// Embedder backed by a feature-extraction HTTP endpoint
pub struct HttpEmbedder {
    client: Client,
    config: HttpEmbeddingConfig,
}

impl HttpEmbedder {
    pub fn new(config: HttpEmbeddingConfig) -> Result<Self, SearchError> {
        let client = Client::builder()
            .timeout(config.timeout)
            .build()
            .map_err(|e| SearchError::Connection(format!("Failed to create HTTP client: {}", e)))?;
        Ok(Self { client, config })
    }

    async fn embed_raw(&self, text: &str) -> Result<Vec<f32>, SearchError> {
        let request = EmbedRequest {
            inputs: text,
            options: EmbedOptions {
                wait_for_model: true,
            },
        };

        let mut builder = self.client.post(self.config.url()).json(&request);
        if let Some(ref key) = self.config.api_key {
            builder = builder.bearer_auth(key);
        }

        let response = builder
            .send()
            .await
            .map_err(|e| SearchError::Embedding(format!("request failed: {}", e)))?;

        if !response.status().is_success() {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();
            return Err(SearchError::Embedding(format!(
                "embedding failed: {} - {}",
                status, body
            )));
        }

        let parsed: EmbedResponse = response
            .json()
            .await
            .map_err(|e| SearchError::Embedding(format!("Failed to parse response: {}", e)))?;

        let vector = parsed
            .into_vector()
            .filter(|v| !v.is_empty())
            .ok_or_else(|| SearchError::Embedding("No embedding returned".to_string()))?;

        if vector.len() != self.config.embedding_dim {
            tracing::warn!(
                expected = self.config.embedding_dim,
                actual = vector.len(),
                "Embedding dimension mismatch"
            );
        }

        Ok(vector)
    }
}

#[async_trait]
impl TextEmbedder for HttpEmbedder {
    async fn embed(&self, text: &str) -> voice_shop_core::Result<Vec<f32>> {
        Ok(self.embed_raw(text).await?)
    }

    fn dim(&self) -> usize {
        self.config.embedding_dim
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::{http::HeaderMap, routing::post, Json, Router};
    use serde_json::{json, Value};

    async fn serve(router: Router) -> String {
        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        tokio::spawn(async move {
            axum::serve(listener, router).await.unwrap();
        });
        format!("http://{}", addr)
    }

    fn embedder_at(endpoint: &str) -> HttpEmbedder {
        HttpEmbedder::new(HttpEmbeddingConfig {
            endpoint: endpoint.to_string(),
            model: "mini".to_string(),
            api_key: Some("hf-key".to_string()),
            embedding_dim: 3,
            timeout: Duration::from_secs(5),
        })
        .unwrap()
    }

    #[test]
    fn test_response_shapes() {
        let flat: EmbedResponse = serde_json::from_str("[0.1, 0.2]").unwrap();
        assert_eq!(flat.into_vector(), Some(vec![0.1, 0.2]));

        let batch: EmbedResponse = serde_json::from_str("[[0.3, 0.4], [0.5, 0.6]]").unwrap();
        assert_eq!(batch.into_vector(), Some(vec![0.3, 0.4]));

        let empty: EmbedResponse = serde_json::from_str("[]").unwrap();
        assert_eq!(empty.into_vector(), Some(vec![]));
    }

    #[tokio::test]
    async fn test_embed_sends_bearer_and_inputs() {
        let router = Router::new().route(
            "/mini",
            post(|headers: HeaderMap, Json(body): Json<Value>| async move {
                assert_eq!(headers["authorization"], "Bearer hf-key");
                assert_eq!(body["inputs"], "cloud runner");
                assert_eq!(body["options"]["wait_for_model"], true);
                Json(json!([[0.1, 0.2, 0.3]]))
            }),
        );
        let endpoint = serve(router).await;

        let vector = embedder_at(&endpoint).embed("cloud runner").await.unwrap();
        assert_eq!(vector, vec![0.1, 0.2, 0.3]);
    }

    #[tokio::test]
    async fn test_embed_error_status() {
        let router = Router::new().route(
            "/mini",
            post(|| async { (axum::http::StatusCode::SERVICE_UNAVAILABLE, "loading") }),
        );
        let endpoint = serve(router).await;

        let err = embedder_at(&endpoint).embed("x").await.unwrap_err();
        assert!(matches!(err, voice_shop_core::Error::Embedding(_)));
    }
}
