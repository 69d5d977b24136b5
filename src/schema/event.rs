use serde::{Deserialize, Serialize};

use crate::error::EngineError;
use crate::gateway::Gateway;
use crate::schema::{short_id, Content, Timestamps};

/// Interaction trigger that provokes thought generation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum EventType {
    Click,
    IdleTime,
    WordCountChange,
    SentenceEnd,
    NamedEntity,
}

impl EventType {
    pub fn as_str(&self) -> &'static str {
        match self {
            EventType::Click => "CLICK",
            EventType::IdleTime => "IDLE_TIME",
            EventType::WordCountChange => "WORD_COUNT_CHANGE",
            EventType::SentenceEnd => "SENTENCE_END",
            EventType::NamedEntity => "NAMED_ENTITY",
        }
    }
}

/// A user-interaction event. Immutable once created.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Event {
    pub id: String,
    pub timestamps: Timestamps,
    pub content: Content,
    #[serde(rename = "type")]
    pub kind: EventType,
    #[serde(default)]
    pub duration: Option<f64>,
}

/// Boundary input for creating an [`Event`] without an id or embedding.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SimpleEventInput {
    pub text: String,
    #[serde(rename = "type")]
    pub kind: EventType,
    #[serde(default)]
    pub duration: Option<f64>,
}

impl Event {
    /// Materialize an event from simple input, capturing an embedding for
    /// its text. Blank text leaves the embedding unset (the gateway rejects
    /// empty input).
    pub async fn from_simple_input(
        input: SimpleEventInput,
        gateway: &dyn Gateway,
        embedding_model: &str,
    ) -> Result<Self, EngineError> {
        let embedding = if input.text.trim().is_empty() {
            None
        } else {
            Some(gateway.embed(&input.text, embedding_model).await?)
        };

        Ok(Self {
            id: short_id("event"),
            timestamps: Timestamps::now(),
            content: Content {
                text: input.text,
                embedding,
            },
            kind: input.kind,
            duration: input.duration,
        })
    }
}
