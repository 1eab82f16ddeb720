//! Text processing for shopping utterances
//!
//! Pure, allocation-light helpers used by the intent classifier and the
//! search orchestrator:
//! - **Price filters**: "under $100", "between 50 and 80" → integer bounds
//! - **Keywords**: the utterance with price phrases removed
//! - **Subjects**: shoe-line names for comparisons and product lookups

pub mod keywords;
pub mod price_filter;
pub mod subjects;

pub use keywords::normalize_keywords;
pub use price_filter::extract_price_filter;
pub use subjects::{comparison_subjects, extract_subject, extract_subjects, DEFAULT_SUBJECT};
