//! Events streamed back to the voice transport during a turn
//!
//! Wire shape (one JSON object per event):
//!
//! ```text
//! {"type":"response.data","content":{"status":"thinking"}}
//! {"type":"response.tts","content":"Here are some running shoes."}
//! {"type":"response.end"}
//! ```

use serde::{Deserialize, Serialize};

use crate::intent::Action;
use crate::product::Product;

/// Structured out-of-band progress payload
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum ProgressMarker {
    Thinking,
    Searching {
        query: String,
    },
    SearchComplete {
        action: Action,
        count: usize,
        preview: Vec<Product>,
        degraded: bool,
    },
    Error {
        message: String,
    },
}

/// One event on a session channel
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", content = "content")]
pub enum StreamEvent {
    #[serde(rename = "response.data")]
    Data(ProgressMarker),
    #[serde(rename = "response.tts")]
    Tts(String),
    #[serde(rename = "response.end")]
    End,
}

impl StreamEvent {
    pub fn is_end(&self) -> bool {
        matches!(self, StreamEvent::End)
    }

    pub fn is_speech(&self) -> bool {
        matches!(self, StreamEvent::Tts(_))
    }
}

/// Session-scoped outbound channel
///
/// Sending never fails from the caller's point of view: events sent after the
/// consumer has gone away are dropped by the implementation.
pub trait TurnSink: Send + Sync {
    fn send(&self, event: StreamEvent);

    fn data(&self, marker: ProgressMarker) {
        self.send(StreamEvent::Data(marker));
    }

    fn tts(&self, text: &str) {
        self.send(StreamEvent::Tts(text.to_string()));
    }

    fn end(&self) {
        self.send(StreamEvent::End);
    }
}
