//! Settings tree
//!
//! Every section is `#[serde(default)]`, so a config file only has to name
//! the values it changes.

use config::{Config, Environment, File};
use serde::{Deserialize, Serialize};
use std::path::Path;

use crate::constants::{endpoints, env_vars, limits, llm, session, timeouts};
use crate::ConfigError;

/// Deployment stage
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum RuntimeEnvironment {
    #[default]
    Development,
    Staging,
    /// Adds warnings for open CORS and unsigned webhooks
    Production,
}

impl RuntimeEnvironment {
    pub fn is_production(&self) -> bool {
        *self == Self::Production
    }
}

fn invalid(field: &str, message: impl Into<String>) -> ConfigError {
    ConfigError::InvalidValue {
        field: field.to_string(),
        message: message.into(),
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, Default)]
#[serde(default)]
pub struct Settings {
    pub environment: RuntimeEnvironment,
    pub server: ServerConfig,
    /// LLM completion service
    pub llm: LlmConfig,
    /// Store catalog API
    pub catalog: CatalogConfig,
    pub vector: VectorConfig,
    /// Text embedding service feeding the vector index
    pub embedding: EmbeddingConfig,
    /// Session registry and transcript relay
    pub session: SessionConfig,
    /// Voice transport webhook
    pub webhook: WebhookConfig,
    pub observability: ObservabilityConfig,
}

impl Settings {
    /// Reject values the server cannot run with
    pub fn validate(&self) -> Result<(), ConfigError> {
        self.validate_server()?;
        self.validate_llm()?;
        self.validate_session()?;
        self.validate_webhook()?;
        self.warn_missing_backends();
        Ok(())
    }

    fn validate_server(&self) -> Result<(), ConfigError> {
        let server = &self.server;
        if server.port == 0 {
            return Err(invalid("server.port", "Port cannot be 0"));
        }
        if server.timeout_seconds == 0 {
            return Err(invalid(
                "server.timeout_seconds",
                "Timeout must be at least 1 second",
            ));
        }
        if self.environment.is_production() && server.cors_enabled && server.cors_origins.is_empty()
        {
            tracing::warn!("No CORS origins configured in production, any origin is allowed");
        }
        Ok(())
    }

    fn validate_llm(&self) -> Result<(), ConfigError> {
        let budgets = [
            ("llm.intent_max_tokens", self.llm.intent_max_tokens),
            ("llm.reply_max_tokens", self.llm.reply_max_tokens),
        ];
        if let Some((field, _)) = budgets.iter().find(|(_, tokens)| *tokens == 0) {
            return Err(invalid(field, "Token budget must be at least 1"));
        }
        if !(0.0..=1.0).contains(&self.llm.temperature) {
            return Err(invalid(
                "llm.temperature",
                format!("Must be between 0.0 and 1.0, got {}", self.llm.temperature),
            ));
        }
        Ok(())
    }

    fn validate_session(&self) -> Result<(), ConfigError> {
        if self.session.transcript_freshness_secs == 0 {
            return Err(invalid(
                "session.transcript_freshness_secs",
                "Freshness window must be at least 1 second",
            ));
        }
        if self.session.max_sessions == 0 {
            return Err(invalid("session.max_sessions", "Must track at least 1 session"));
        }
        Ok(())
    }

    fn validate_webhook(&self) -> Result<(), ConfigError> {
        match (&self.webhook.secret, self.webhook.verify_signature) {
            (None, true) => Err(invalid(
                "webhook.secret",
                "Secret must be set when signature verification is enabled",
            )),
            (_, false) if self.environment.is_production() => {
                tracing::warn!("Webhook signature verification is disabled in production");
                Ok(())
            }
            _ => Ok(()),
        }
    }

    fn warn_missing_backends(&self) {
        if self.llm.api_key.is_none() {
            tracing::warn!("No LLM API key configured; every turn will use fallback replies");
        }
        if !self.catalog.is_configured() {
            tracing::warn!("Catalog credentials missing; searches will run in degraded mode");
        }
    }

    /// Fill unset secrets from their conventional environment variables
    pub fn fill_secrets_from<F>(&mut self, lookup: F)
    where
        F: Fn(&str) -> Option<String>,
    {
        let fill = |slot: &mut Option<String>, var: &str| {
            if slot.is_none() {
                *slot = lookup(var).filter(|v| !v.trim().is_empty());
            }
        };

        fill(&mut self.llm.api_key, env_vars::ANTHROPIC_API_KEY);
        fill(&mut self.catalog.store_hash, env_vars::BIGCOMMERCE_STORE_HASH);
        fill(&mut self.catalog.access_token, env_vars::BIGCOMMERCE_ACCESS_TOKEN);
        fill(&mut self.vector.api_key, env_vars::QDRANT_API_KEY);
        fill(&mut self.embedding.api_key, env_vars::EMBEDDING_API_KEY);
        fill(&mut self.webhook.secret, env_vars::WEBHOOK_SECRET);
    }
}

/// HTTP listener
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
    /// Per-request timeout, seconds
    pub timeout_seconds: u64,
    pub cors_enabled: bool,
    /// Allowed origins, empty means any
    pub cors_origins: Vec<String>,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: "0.0.0.0".to_string(),
            port: 8080,
            timeout_seconds: 60,
            cors_enabled: true,
            cors_origins: Vec::new(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct LlmConfig {
    pub endpoint: String,
    pub api_key: Option<String>,
    pub model: String,
    /// Output tokens for intent classification
    pub intent_max_tokens: u32,
    /// Output tokens for the final reply
    pub reply_max_tokens: u32,
    pub temperature: f32,
    pub timeout_ms: u64,
}

impl Default for LlmConfig {
    fn default() -> Self {
        Self {
            endpoint: endpoints::ANTHROPIC_DEFAULT.to_string(),
            api_key: None,
            model: llm::DEFAULT_MODEL.to_string(),
            intent_max_tokens: llm::INTENT_MAX_TOKENS,
            reply_max_tokens: llm::REPLY_MAX_TOKENS,
            temperature: 0.3,
            timeout_ms: timeouts::LLM_REQUEST_MS,
        }
    }
}

/// BigCommerce credentials and limits
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct CatalogConfig {
    pub api_base: String,
    pub store_hash: Option<String>,
    pub access_token: Option<String>,
    /// Products requested per keyword search
    pub search_limit: usize,
    pub timeout_ms: u64,
}

impl CatalogConfig {
    /// Both store hash and access token are present
    pub fn is_configured(&self) -> bool {
        self.store_hash.is_some() && self.access_token.is_some()
    }
}

impl Default for CatalogConfig {
    fn default() -> Self {
        Self {
            api_base: endpoints::BIGCOMMERCE_DEFAULT.to_string(),
            store_hash: None,
            access_token: None,
            search_limit: limits::SEARCH_RESULTS,
            timeout_ms: timeouts::CATALOG_REQUEST_MS,
        }
    }
}

/// Qdrant connection
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct VectorConfig {
    /// Disable to skip the similarity branch entirely
    pub enabled: bool,
    pub endpoint: String,
    pub collection: String,
    pub api_key: Option<String>,
    pub top_k: usize,
}

impl Default for VectorConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            endpoint: endpoints::QDRANT_DEFAULT.to_string(),
            collection: endpoints::QDRANT_COLLECTION_DEFAULT.to_string(),
            api_key: None,
            top_k: limits::VECTOR_TOP_K,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct EmbeddingConfig {
    pub endpoint: String,
    pub model: String,
    pub api_key: Option<String>,
    /// Must match the model's output dimension
    pub dim: usize,
    pub timeout_ms: u64,
}

impl Default for EmbeddingConfig {
    fn default() -> Self {
        Self {
            endpoint: endpoints::EMBEDDING_DEFAULT.to_string(),
            model: endpoints::EMBEDDING_MODEL_DEFAULT.to_string(),
            api_key: None,
            dim: endpoints::EMBEDDING_DIM_DEFAULT,
            timeout_ms: timeouts::EMBEDDING_REQUEST_MS,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct SessionConfig {
    /// Inactivity after which a welcomed session is forgotten
    pub welcome_ttl_secs: u64,
    pub max_sessions: usize,
    /// Relay freshness window
    pub transcript_freshness_secs: u64,
    pub welcome_message: String,
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            welcome_ttl_secs: session::WELCOME_TTL_SECS,
            max_sessions: session::MAX_SESSIONS,
            transcript_freshness_secs: session::TRANSCRIPT_FRESHNESS_SECS,
            welcome_message: session::WELCOME_MESSAGE.to_string(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct WebhookConfig {
    pub verify_signature: bool,
    pub secret: Option<String>,
    /// Maximum accepted signature age in seconds
    pub tolerance_secs: u64,
}

impl Default for WebhookConfig {
    fn default() -> Self {
        Self {
            verify_signature: false,
            secret: None,
            tolerance_secs: timeouts::WEBHOOK_TOLERANCE_SECS,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ObservabilityConfig {
    /// Level for the `voice_shop` crates when `RUST_LOG` is unset
    pub log_level: String,
    pub log_json: bool,
    /// Serve Prometheus metrics at /metrics
    pub metrics_enabled: bool,
}

impl Default for ObservabilityConfig {
    fn default() -> Self {
        Self {
            log_level: "info".to_string(),
            log_json: false,
            metrics_enabled: true,
        }
    }
}

/// Load settings from `./config` and the environment
///
/// Later sources win:
/// 1. `config/default.*`
/// 2. `config/{env}.*` when an environment name is given
/// 3. `VOICE_SHOP__SECTION__FIELD` variables
///
/// Secrets still unset afterwards are read from their conventional variables
/// (`ANTHROPIC_API_KEY`, ...).
pub fn load_settings(env: Option<&str>) -> Result<Settings, ConfigError> {
    load_settings_from(Path::new("config"), env)
}

/// Load settings with an explicit config directory
pub fn load_settings_from(dir: &Path, env: Option<&str>) -> Result<Settings, ConfigError> {
    let files = std::iter::once("default").chain(env);
    let builder = files.fold(Config::builder(), |builder, name| {
        builder.add_source(File::from(dir.join(name)).required(false))
    });

    let mut settings: Settings = builder
        .add_source(
            Environment::with_prefix("VOICE_SHOP")
                .separator("__")
                .try_parsing(true),
        )
        .build()?
        .try_deserialize()?;

    settings.fill_secrets_from(|var| std::env::var(var).ok());
    settings.validate()?;
    Ok(settings)
}
