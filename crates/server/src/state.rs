//! Application State
//!
//! Shared state across all handlers.

use std::sync::Arc;

use metrics_exporter_prometheus::PrometheusHandle;
use voice_shop_agent::{
    CartStore, ControllerConfig, KeywordRouter, RegistryConfig, SessionRegistry,
    StreamController, TranscriptRelay,
};
use voice_shop_config::Settings;
use voice_shop_core::CatalogClient;
use voice_shop_llm::{create_backend, LlmBackend};
use voice_shop_search::{
    BigCommerceCatalog, BigCommerceConfig, HttpEmbedder, HttpEmbeddingConfig, OrchestratorConfig,
    QdrantIndex, SearchOrchestrator, VectorBranch, VectorStoreConfig,
};

use crate::ServerError;

/// Application state
#[derive(Clone)]
pub struct AppState {
    pub settings: Arc<Settings>,
    pub controller: Arc<StreamController>,
    pub router: Arc<KeywordRouter>,
    pub relay: Arc<TranscriptRelay>,
    pub orchestrator: Arc<SearchOrchestrator>,
    pub llm: Arc<dyn LlmBackend>,
    pub metrics: Option<PrometheusHandle>,
}

impl AppState {
    /// Wire the agent around an LLM backend and a search orchestrator
    pub fn new(
        settings: Settings,
        llm: Arc<dyn LlmBackend>,
        orchestrator: Arc<SearchOrchestrator>,
    ) -> Self {
        let registry = Arc::new(SessionRegistry::new(RegistryConfig::from_settings(
            &settings.session,
        )));
        let relay = Arc::new(TranscriptRelay::from_settings(&settings.session));
        let carts = Arc::new(CartStore::new());

        let controller = Arc::new(StreamController::new(
            Arc::clone(&llm),
            Arc::clone(&orchestrator),
            Arc::clone(&registry),
            Arc::clone(&relay),
            Arc::clone(&carts),
            ControllerConfig::from_settings(&settings),
        ));
        let router = Arc::new(KeywordRouter::new(
            Arc::clone(&orchestrator),
            registry,
            carts,
        ));

        Self {
            settings: Arc::new(settings),
            controller,
            router,
            relay,
            orchestrator,
            llm,
            metrics: None,
        }
    }

    /// Build every backend from settings
    ///
    /// Missing catalog credentials or a disabled vector index leave that
    /// branch out; searches then run in degraded mode.
    pub fn from_settings(settings: Settings) -> Result<Self, ServerError> {
        let llm = create_backend(&settings.llm)?;

        let catalog: Option<Arc<dyn CatalogClient>> =
            match BigCommerceConfig::from_settings(&settings.catalog) {
                Some(config) => Some(Arc::new(BigCommerceCatalog::new(config)?)),
                None => {
                    tracing::warn!("Catalog credentials missing, searches will be degraded");
                    None
                }
            };

        let vector = if settings.vector.enabled {
            let embedder = HttpEmbedder::new(HttpEmbeddingConfig::from_settings(&settings.embedding))?;
            let index = QdrantIndex::new(VectorStoreConfig::from_settings(
                &settings.vector,
                &settings.embedding,
            ))?;
            tracing::info!(
                endpoint = %settings.vector.endpoint,
                collection = %settings.vector.collection,
                "Vector search enabled"
            );
            Some(VectorBranch::new(Arc::new(embedder), Arc::new(index)))
        } else {
            None
        };

        let orchestrator = Arc::new(SearchOrchestrator::new(
            catalog,
            vector,
            OrchestratorConfig::from_settings(&settings),
        ));

        Ok(Self::new(settings, llm, orchestrator))
    }

    pub fn with_metrics(mut self, handle: PrometheusHandle) -> Self {
        self.metrics = Some(handle);
        self
    }
}
