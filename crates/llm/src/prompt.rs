//! Prompt building
//!
//! Two prompts drive a turn: intent classification (strict JSON out) and
//! reply styling (plain spoken text out).

use std::fmt;

use serde::{Deserialize, Serialize};
use voice_shop_core::Tone;

/// Message role
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    System,
    User,
    Assistant,
}

impl fmt::Display for Role {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Role::System => write!(f, "system"),
            Role::User => write!(f, "user"),
            Role::Assistant => write!(f, "assistant"),
        }
    }
}

/// Chat message
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Message {
    pub role: Role,
    pub content: String,
}

impl Message {
    pub fn system(content: impl Into<String>) -> Self {
        Self {
            role: Role::System,
            content: content.into(),
        }
    }

    pub fn user(content: impl Into<String>) -> Self {
        Self {
            role: Role::User,
            content: content.into(),
        }
    }

    pub fn assistant(content: impl Into<String>) -> Self {
        Self {
            role: Role::Assistant,
            content: content.into(),
        }
    }
}

/// Builder for prompt message lists
#[derive(Debug, Clone, Default)]
pub struct PromptBuilder {
    system: Vec<String>,
    messages: Vec<Message>,
}

impl PromptBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    /// Append a paragraph to the system prompt
    pub fn system(mut self, text: impl Into<String>) -> Self {
        self.system.push(text.into());
        self
    }

    pub fn user_message(mut self, text: impl Into<String>) -> Self {
        self.messages.push(Message::user(text));
        self
    }

    pub fn build(self) -> Vec<Message> {
        let mut out = Vec::with_capacity(self.messages.len() + 1);
        if !self.system.is_empty() {
            out.push(Message::system(self.system.join("\n\n")));
        }
        out.extend(self.messages);
        out
    }
}

const STORE_PERSONA: &str =
    "You are a voice shopping assistant for Stuart's Shoes, an online shoe store.";

const INTENT_SCHEMA: &str = r#"Classify the user's request and respond with ONLY a JSON object of this shape:
{
  "action": "search" | "show_product" | "compare" | "add_to_cart" | "greeting" | "help",
  "keywords": "<search keywords with price phrases removed>",
  "price_min": <integer or null>,
  "price_max": <integer or null>,
  "specific_product": "<product name or null>",
  "comparison_targets": ["<product name>", ...],
  "tone": "helpful" | "enthusiastic" | "friendly" | "professional" | "empathetic"
}

Examples:
- "show me running shoes under 100 dollars" -> {"action":"search","keywords":"running shoes","price_min":null,"price_max":100,"specific_product":null,"comparison_targets":[],"tone":"helpful"}
- "hello" -> {"action":"greeting","keywords":"","price_min":null,"price_max":null,"specific_product":null,"comparison_targets":[],"tone":"friendly"}
- "compare the cloud pro and the speed runner" -> {"action":"compare","keywords":"cloud pro speed runner","price_min":null,"price_max":null,"specific_product":null,"comparison_targets":["cloud pro","speed runner"],"tone":"helpful"}

Respond with the JSON object only, no other text."#;

/// Messages for intent classification
pub fn intent_prompt(transcript: &str) -> Vec<Message> {
    PromptBuilder::new()
        .system(STORE_PERSONA)
        .system(INTENT_SCHEMA)
        .user_message(format!("User said: \"{}\"", transcript.trim()))
        .build()
}

/// Inputs for the reply styling prompt
#[derive(Debug, Clone)]
pub struct ReplyContext<'a> {
    pub transcript: &'a str,
    /// Templated reply the model should rephrase
    pub provisional: &'a str,
    pub product_count: usize,
    pub tone: Tone,
    /// Greeting turns may open with a greeting
    pub allow_greeting: bool,
    pub max_words: usize,
}

/// Messages for reply styling
pub fn reply_prompt(ctx: &ReplyContext<'_>) -> Vec<Message> {
    let greeting_rule = if ctx.allow_greeting {
        "You may open with a short greeting."
    } else {
        "Do not start with a greeting such as \"hi\" or \"hello\"; the conversation is already under way."
    };

    PromptBuilder::new()
        .system(STORE_PERSONA)
        .system(format!(
            "Rewrite the initial response so it sounds natural when spoken aloud. \
             Use a {} tone. Keep it under {} words. {} \
             Respond with ONLY the spoken text, no JSON, quotes or formatting.",
            ctx.tone.as_str(),
            ctx.max_words,
            greeting_rule
        ))
        .user_message(format!(
            "User said: \"{}\"\nInitial response: \"{}\"\nProducts found: {}",
            ctx.transcript.trim(),
            ctx.provisional,
            ctx.product_count
        ))
        .build()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_builder_merges_system_paragraphs() {
        let messages = PromptBuilder::new()
            .system("one")
            .system("two")
            .user_message("hi")
            .build();
        assert_eq!(messages.len(), 2);
        assert_eq!(messages[0], Message::system("one\n\ntwo"));
        assert_eq!(messages[1].role, Role::User);
    }

    #[test]
    fn test_intent_prompt_quotes_transcript() {
        let messages = intent_prompt("  cloud runners under 90 ");
        let user = messages.last().unwrap();
        assert_eq!(user.content, "User said: \"cloud runners under 90\"");
        assert!(messages[0].content.contains("\"action\""));
    }

    #[test]
    fn test_reply_prompt_greeting_rule() {
        let mut ctx = ReplyContext {
            transcript: "running shoes",
            provisional: "Great! I found 2 running shoes for you.",
            product_count: 2,
            tone: Tone::Enthusiastic,
            allow_greeting: false,
            max_words: 40,
        };
        let system = &reply_prompt(&ctx)[0].content;
        assert!(system.contains("Do not start with a greeting"));
        assert!(system.contains("enthusiastic"));
        assert!(system.contains("40 words"));

        ctx.allow_greeting = true;
        assert!(reply_prompt(&ctx)[0].content.contains("may open with a short greeting"));
        assert!(reply_prompt(&ctx)[1].content.contains("Products found: 2"));
    }
}
