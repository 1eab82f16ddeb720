//! Error types shared across crates

use thiserror::Error;

/// Core error type
///
/// Backend crates keep their own error enums and convert into this one at
/// the trait seams defined in [`crate::traits`].
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum Error {
    #[error("LLM error: {0}")]
    Llm(String),

    #[error("Catalog error: {0}")]
    Catalog(String),

    #[error("Vector index error: {0}")]
    Vector(String),

    #[error("Embedding error: {0}")]
    Embedding(String),

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Invalid input: {0}")]
    InvalidInput(String),

    #[error("Internal error: {0}")]
    Internal(String),
}

impl Error {
    /// Whether the error came from an upstream service rather than the caller
    pub fn is_upstream(&self) -> bool {
        matches!(
            self,
            Error::Llm(_) | Error::Catalog(_) | Error::Vector(_) | Error::Embedding(_)
        )
    }
}

pub type Result<T> = std::result::Result<T, Error>;
