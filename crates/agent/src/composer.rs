//! Spoken reply composition
//!
//! Every turn gets a templated provisional reply first. A second LLM call
//! rephrases it for speech; if that call fails or produces nothing usable,
//! the provisional reply is spoken as is.

use std::sync::Arc;

use once_cell::sync::Lazy;
use regex::Regex;
use voice_shop_config::constants::{limits, llm as llm_defaults, session};
use voice_shop_core::{Action, Intent, Product, SearchResult};
use voice_shop_llm::{reply_prompt, GenerationOptions, LlmBackend, ReplyContext};

static LEADING_GREETING: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(?i)^(?:hi|hello|hey|greetings)(?:\s+there)?\b[\s,!.:;\-]*").unwrap()
});

const SURROUNDING_QUOTES: &[char] = &['"', '\'', '\u{201C}', '\u{201D}'];

/// What a turn did, as far as the reply is concerned
#[derive(Debug, Clone, PartialEq)]
pub enum TurnOutcome {
    Searched(SearchResult),
    Product(Option<Product>),
    Compared(SearchResult),
    AddedToCart {
        product: Option<Product>,
        cart_size: usize,
    },
    Greeting,
    Help,
}

impl TurnOutcome {
    /// Products the reply talks about
    pub fn product_count(&self) -> usize {
        match self {
            TurnOutcome::Searched(result) | TurnOutcome::Compared(result) => result.len(),
            TurnOutcome::Product(product) => usize::from(product.is_some()),
            TurnOutcome::AddedToCart { product, .. } => usize::from(product.is_some()),
            TurnOutcome::Greeting | TurnOutcome::Help => 0,
        }
    }
}

fn subject_or_default(keywords: &str) -> &str {
    match keywords.trim() {
        "" => "shoes",
        k => k,
    }
}

/// Templated reply for an outcome
pub fn provisional_reply(intent: &Intent, outcome: &TurnOutcome) -> String {
    match outcome {
        TurnOutcome::Searched(result) if result.is_empty() => format!(
            "I couldn't find any {} right now. Would you like to try a different search?",
            subject_or_default(&intent.keywords)
        ),
        TurnOutcome::Searched(result) => format!(
            "Great! I found {} {} for you. Let me show you the options.",
            result.len(),
            subject_or_default(&intent.keywords)
        ),
        TurnOutcome::Product(Some(product)) => format!(
            "Here are the details for the {}. It's priced at ${:.2}.",
            product.name, product.price
        ),
        TurnOutcome::Product(None) => {
            "I couldn't find that product. Could you tell me its name again?".to_string()
        }
        TurnOutcome::Compared(result) => match result.products.as_slice() {
            [] => "I couldn't find those shoes to compare. Try naming two shoes you'd like to compare."
                .to_string(),
            [only] => format!(
                "I only found the {} to compare. Which other shoe should I add?",
                only.name
            ),
            products => {
                let names: Vec<&str> = products.iter().map(|p| p.name.as_str()).collect();
                format!(
                    "Here's a side-by-side comparison of the {}.",
                    join_names(&names)
                )
            }
        },
        TurnOutcome::AddedToCart {
            product: Some(product),
            cart_size,
        } => format!(
            "I've added the {} to your cart. You now have {} {} in your cart.",
            product.name,
            cart_size,
            if *cart_size == 1 { "item" } else { "items" }
        ),
        TurnOutcome::AddedToCart { product: None, .. } => {
            "Which product would you like to add to your cart?".to_string()
        }
        TurnOutcome::Greeting => session::WELCOME_MESSAGE.to_string(),
        TurnOutcome::Help => "I can search for shoes by style or price, tell you about a \
             specific pair, compare shoes, or add one to your cart. Try saying \
             \"show me running shoes under 100 dollars\"."
            .to_string(),
    }
}

fn join_names(names: &[&str]) -> String {
    match names {
        [] => String::new(),
        [one] => one.to_string(),
        [init @ .., last] => format!("{} and {}", init.join(", "), last),
    }
}

/// Clean an LLM reply for speech; `None` if nothing usable is left
fn polish(raw: &str, allow_greeting: bool, max_words: usize) -> Option<String> {
    let mut text = raw.trim().trim_matches(SURROUNDING_QUOTES).trim().to_string();

    if !allow_greeting {
        text = LEADING_GREETING.replace(&text, "").into_owned();
        text = capitalize_first(&text);
    }

    let words: Vec<&str> = text.split_whitespace().collect();
    if words.is_empty() {
        return None;
    }
    if words.len() > max_words {
        tracing::debug!(words = words.len(), max_words, "Truncating reply");
    }
    Some(words[..words.len().min(max_words)].join(" "))
}

fn capitalize_first(text: &str) -> String {
    let mut chars = text.chars();
    match chars.next() {
        Some(first) => first.to_uppercase().chain(chars).collect(),
        None => String::new(),
    }
}

/// Reply composer
pub struct ResponseComposer {
    llm: Arc<dyn LlmBackend>,
    max_tokens: u32,
    max_words: usize,
    temperature: Option<f32>,
}

impl ResponseComposer {
    pub fn new(llm: Arc<dyn LlmBackend>) -> Self {
        Self {
            llm,
            max_tokens: llm_defaults::REPLY_MAX_TOKENS,
            max_words: limits::REPLY_WORDS,
            temperature: None,
        }
    }

    pub fn with_max_tokens(mut self, max_tokens: u32) -> Self {
        self.max_tokens = max_tokens;
        self
    }

    pub fn with_max_words(mut self, max_words: usize) -> Self {
        self.max_words = max_words.max(1);
        self
    }

    pub fn with_temperature(mut self, temperature: f32) -> Self {
        self.temperature = Some(temperature);
        self
    }

    /// Compose the spoken reply for a turn. Never fails.
    pub async fn compose(&self, transcript: &str, intent: &Intent, outcome: &TurnOutcome) -> String {
        let provisional = provisional_reply(intent, outcome);
        let allow_greeting = intent.action == Action::Greeting;

        let ctx = ReplyContext {
            transcript,
            provisional: &provisional,
            product_count: outcome.product_count(),
            tone: intent.tone,
            allow_greeting,
            max_words: self.max_words,
        };

        let mut options = GenerationOptions::with_max_tokens(self.max_tokens);
        if let Some(t) = self.temperature {
            options = options.temperature(t);
        }

        match self.llm.generate(&reply_prompt(&ctx), &options).await {
            Ok(result) => match polish(&result.text, allow_greeting, self.max_words) {
                Some(reply) => reply,
                None => {
                    tracing::warn!("Empty reply from LLM, using provisional reply");
                    Self::fallback(provisional)
                }
            },
            Err(e) => {
                tracing::warn!(error = %e, "Reply composition failed, using provisional reply");
                Self::fallback(provisional)
            }
        }
    }

    fn fallback(provisional: String) -> String {
        metrics::counter!("voice_shop_llm_fallback_total", "stage" => "reply").increment(1);
        provisional
    }
}
