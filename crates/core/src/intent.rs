//! Classified user intent
//!
//! An [`Intent`] is derived from a single transcript and never persisted.

use serde::{Deserialize, Serialize};

use crate::product::{PriceFilter, ProductQuery};

/// What the user asked the assistant to do
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Action {
    #[default]
    Search,
    ShowProduct,
    Compare,
    AddToCart,
    Greeting,
    Help,
}

impl Action {
    /// Parse the wire name; unknown names yield `None`
    pub fn parse(s: &str) -> Option<Self> {
        match s.trim().to_ascii_lowercase().as_str() {
            "search" => Some(Action::Search),
            "show_product" => Some(Action::ShowProduct),
            "compare" => Some(Action::Compare),
            "add_to_cart" => Some(Action::AddToCart),
            "greeting" => Some(Action::Greeting),
            "help" => Some(Action::Help),
            _ => None,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Action::Search => "search",
            Action::ShowProduct => "show_product",
            Action::Compare => "compare",
            Action::AddToCart => "add_to_cart",
            Action::Greeting => "greeting",
            Action::Help => "help",
        }
    }

    /// Actions answered with a catalog lookup
    pub fn needs_search(&self) -> bool {
        matches!(self, Action::Search | Action::ShowProduct | Action::Compare)
    }
}

impl std::fmt::Display for Action {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Speaking style requested for the reply
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Tone {
    #[default]
    Helpful,
    Enthusiastic,
    Friendly,
    Professional,
    Empathetic,
}

impl Tone {
    /// Lenient parse; anything unrecognized is `Helpful`
    pub fn parse(s: &str) -> Self {
        match s.trim().to_ascii_lowercase().as_str() {
            "enthusiastic" | "excited" => Tone::Enthusiastic,
            "friendly" | "casual" => Tone::Friendly,
            "professional" | "formal" => Tone::Professional,
            "empathetic" | "apologetic" => Tone::Empathetic,
            _ => Tone::Helpful,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Tone::Helpful => "helpful",
            Tone::Enthusiastic => "enthusiastic",
            Tone::Friendly => "friendly",
            Tone::Professional => "professional",
            Tone::Empathetic => "empathetic",
        }
    }
}

/// Structured result of classifying one transcript
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct Intent {
    pub action: Action,
    pub keywords: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub price_min: Option<u32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub price_max: Option<u32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub specific_product: Option<String>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub comparison_targets: Vec<String>,
    #[serde(default)]
    pub tone: Tone,
}

impl Intent {
    /// Deterministic intent used whenever classification fails
    pub fn fallback(transcript: &str) -> Self {
        Self {
            action: Action::Search,
            keywords: transcript.to_string(),
            tone: Tone::Helpful,
            ..Default::default()
        }
    }

    pub fn price_filter(&self) -> PriceFilter {
        PriceFilter::new(self.price_min, self.price_max)
    }

    /// Catalog query for this intent
    pub fn query(&self) -> ProductQuery {
        ProductQuery::new(self.keywords.clone()).with_filter(self.price_filter())
    }
}
