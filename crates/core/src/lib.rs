//! Core traits and types for the voice shopping assistant
//!
//! This crate provides foundational types used across all other crates:
//! - Product catalog types and price filters
//! - Classified intents and response tones
//! - Transcripts delivered by the voice transport
//! - Stream events emitted back over a session channel
//! - Traits for pluggable backends (catalog, vector index, embeddings)
//! - Error types

pub mod error;
pub mod intent;
pub mod product;
pub mod stream;
pub mod traits;
pub mod transcript;

pub use error::{Error, Result};
pub use intent::{Action, Intent, Tone};
pub use product::{
    PriceFilter, Product, ProductImage, ProductQuery, SearchResult, SearchSource,
    PREVIEW_LIMIT,
};
pub use stream::{ProgressMarker, StreamEvent, TurnSink};
pub use traits::{CatalogClient, ScoredMatch, TextEmbedder, VectorIndex};
pub use transcript::{Transcript, TranscriptSignature};
