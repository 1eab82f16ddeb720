//! Fixed limits and default values
//!
//! Single source for numbers that several crates must agree on. Values that
//! operators may want to tune live in [`crate::Settings`] and default to these.

/// Result size caps
pub mod limits {
    /// Products returned by a keyword search
    pub const SEARCH_RESULTS: usize = 12;

    /// Products carried by a live progress preview
    pub const PREVIEW_RESULTS: usize = 6;

    /// Products returned by a comparison
    pub const COMPARE_RESULTS: usize = 3;

    /// Neighbours requested from the vector index
    pub const VECTOR_TOP_K: usize = 12;

    /// Words allowed in a spoken reply
    pub const REPLY_WORDS: usize = 40;

    /// Catalog page size used by the catalog sync
    pub const SYNC_PAGE_SIZE: u32 = 250;
}

/// Session and relay defaults
pub mod session {
    /// Transcripts at least this old are treated as absent
    pub const TRANSCRIPT_FRESHNESS_SECS: u64 = 10;

    /// Welcomed sessions are forgotten after this much inactivity
    pub const WELCOME_TTL_SECS: u64 = 30 * 60;

    /// Hard bound on tracked sessions
    pub const MAX_SESSIONS: usize = 1000;

    pub const WELCOME_MESSAGE: &str =
        "Hello! Welcome to Stuart's Shoes. How can I help you find the perfect pair today?";

    pub const APOLOGY_MESSAGE: &str =
        "I'm sorry, I'm having trouble processing your request right now. Please try again.";
}

/// LLM token budgets and model
pub mod llm {
    pub const DEFAULT_MODEL: &str = "claude-3-5-sonnet-20241022";

    /// Output tokens for intent classification
    pub const INTENT_MAX_TOKENS: u32 = 1000;

    /// Output tokens for the final reply
    pub const REPLY_MAX_TOKENS: u32 = 500;

    pub const API_VERSION: &str = "2023-06-01";
}

/// Service endpoints (defaults for local development)
pub mod endpoints {
    /// Anthropic API endpoint
    pub const ANTHROPIC_DEFAULT: &str = "https://api.anthropic.com";

    /// BigCommerce API root
    pub const BIGCOMMERCE_DEFAULT: &str = "https://api.bigcommerce.com";

    /// Qdrant vector store endpoint (REST API port)
    pub const QDRANT_DEFAULT: &str = "http://127.0.0.1:6333";

    /// Hugging Face feature-extraction endpoint
    pub const EMBEDDING_DEFAULT: &str =
        "https://api-inference.huggingface.co/pipeline/feature-extraction";

    pub const EMBEDDING_MODEL_DEFAULT: &str = "sentence-transformers/all-MiniLM-L6-v2";

    pub const QDRANT_COLLECTION_DEFAULT: &str = "stuarts-shoes";

    /// Output dimension of the default embedding model
    pub const EMBEDDING_DIM_DEFAULT: usize = 384;
}

/// Timeouts (in milliseconds unless noted)
pub mod timeouts {
    /// LLM request timeout
    pub const LLM_REQUEST_MS: u64 = 30_000;

    /// Catalog request timeout
    pub const CATALOG_REQUEST_MS: u64 = 10_000;

    /// Embedding request timeout
    pub const EMBEDDING_REQUEST_MS: u64 = 10_000;

    /// Accepted webhook signature age (seconds)
    pub const WEBHOOK_TOLERANCE_SECS: u64 = 300;
}

/// Conventional environment variables holding secrets
pub mod env_vars {
    pub const ANTHROPIC_API_KEY: &str = "ANTHROPIC_API_KEY";
    pub const BIGCOMMERCE_STORE_HASH: &str = "BIGCOMMERCE_STORE_HASH";
    pub const BIGCOMMERCE_ACCESS_TOKEN: &str = "BIGCOMMERCE_ACCESS_TOKEN";
    pub const QDRANT_API_KEY: &str = "QDRANT_API_KEY";
    pub const EMBEDDING_API_KEY: &str = "EMBEDDING_API_KEY";
    pub const WEBHOOK_SECRET: &str = "WEBHOOK_SECRET";
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_caps_are_ordered() {
        assert!(limits::COMPARE_RESULTS < limits::PREVIEW_RESULTS);
        assert!(limits::PREVIEW_RESULTS < limits::SEARCH_RESULTS);
    }

    #[test]
    fn test_endpoints_are_urls() {
        for url in [
            endpoints::ANTHROPIC_DEFAULT,
            endpoints::BIGCOMMERCE_DEFAULT,
            endpoints::QDRANT_DEFAULT,
            endpoints::EMBEDDING_DEFAULT,
        ] {
            assert!(url.starts_with("http"), "{url}");
            assert!(!url.ends_with('/'), "{url}");
        }
    }
}
