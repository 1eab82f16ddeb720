//! Backend traits for the shopping assistant
//!
//! Every external service the turn pipeline talks to sits behind one of these
//! traits so that backends can be swapped by configuration and mocked in tests.
//!
//! ```text
//! Catalog:
//!   - CatalogClient: keyword search, lookup by id, paginated listing
//!
//! Similarity search:
//!   - TextEmbedder: text -> dense vector
//!   - VectorIndex: nearest-neighbour search and product upsert
//! ```
//!
//! The LLM seam lives in `voice-shop-llm` next to its message types.

mod catalog;
mod vector;

pub use catalog::CatalogClient;
pub use vector::{ScoredMatch, TextEmbedder, VectorIndex};
