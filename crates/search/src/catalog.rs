//! BigCommerce v3 catalog client
//!
//! `GET {api_base}/stores/{store_hash}/v3/catalog/products` with an
//! `X-Auth-Token` header. Responses wrap their payload as `{ "data": ... }`.

use std::time::Duration;

use async_trait::async_trait;
use reqwest::{Client, StatusCode};
use serde::de::DeserializeOwned;
use serde::Deserialize;
use voice_shop_core::{CatalogClient, PriceFilter, Product};

use crate::SearchError;

/// BigCommerce client configuration
#[derive(Debug, Clone)]
pub struct BigCommerceConfig {
    pub api_base: String,
    pub store_hash: String,
    pub access_token: String,
    /// Products requested per keyword search
    pub search_limit: usize,
    pub timeout: Duration,
}

impl BigCommerceConfig {
    /// Build from loaded settings, `None` when credentials are missing
    pub fn from_settings(settings: &voice_shop_config::CatalogConfig) -> Option<Self> {
        Some(Self {
            api_base: settings.api_base.trim_end_matches('/').to_string(),
            store_hash: settings.store_hash.clone()?,
            access_token: settings.access_token.clone()?,
            search_limit: settings.search_limit,
            timeout: Duration::from_millis(settings.timeout_ms),
        })
    }

    fn products_url(&self) -> String {
        format!(
            "{}/stores/{}/v3/catalog/products",
            self.api_base, self.store_hash
        )
    }
}

#[derive(Debug, Deserialize)]
struct Envelope<T> {
    data: Option<T>,
}

/// BigCommerce catalog
pub struct BigCommerceCatalog {
    client: Client,
    config: BigCommerceConfig,
}

impl BigCommerceCatalog {
    pub fn new(config: BigCommerceConfig) -> Result<Self, SearchError> {
        let client = Client::builder()
            .timeout(config.timeout)
            .build()
            .map_err(|e| SearchError::Connection(format!("Failed to create HTTP client: {}", e)))?;

        Ok(Self { client, config })
    }

    async fn fetch<T: DeserializeOwned>(
        &self,
        url: &str,
        query: &[(&str, String)],
    ) -> Result<Option<T>, SearchError> {
        let response = self
            .client
            .get(url)
            .header("X-Auth-Token", &self.config.access_token)
            .header("Accept", "application/json")
            .query(query)
            .send()
            .await
            .map_err(|e| SearchError::Catalog(format!("request failed: {}", e)))?;

        let status = response.status();
        if status == StatusCode::NOT_FOUND {
            return Ok(None);
        }
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(SearchError::Catalog(format!("HTTP {}: {}", status, body)));
        }

        let envelope: Envelope<T> = response
            .json()
            .await
            .map_err(|e| SearchError::Catalog(format!("invalid response: {}", e)))?;

        Ok(envelope.data)
    }
}

#[async_trait]
impl CatalogClient for BigCommerceCatalog {
    async fn search(
        &self,
        keyword: &str,
        filter: PriceFilter,
    ) -> voice_shop_core::Result<Vec<Product>> {
        let mut query = vec![
            ("keyword", keyword.to_string()),
            ("limit", self.config.search_limit.to_string()),
            ("include", "images".to_string()),
        ];
        if let Some(min) = filter.min {
            query.push(("price:min", min.to_string()));
        }
        if let Some(max) = filter.max {
            query.push(("price:max", max.to_string()));
        }

        let products: Option<Vec<Product>> = self.fetch(&self.config.products_url(), &query).await?;
        let products = products.unwrap_or_default();
        tracing::debug!(keyword, count = products.len(), "Catalog search");
        Ok(products)
    }

    async fn get(&self, id: u64) -> voice_shop_core::Result<Option<Product>> {
        let url = format!("{}/{}", self.config.products_url(), id);
        Ok(self.fetch(&url, &[("include", "images".to_string())]).await?)
    }

    async fn list(&self, page: u32, limit: u32) -> voice_shop_core::Result<Vec<Product>> {
        let query = [
            ("page", page.to_string()),
            ("limit", limit.to_string()),
            ("include", "images".to_string()),
        ];
        let products: Option<Vec<Product>> = self.fetch(&self.config.products_url(), &query).await?;
        Ok(products.unwrap_or_default())
    }

    fn name(&self) -> &str {
        "bigcommerce"
    }
}
