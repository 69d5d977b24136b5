use serde::{Deserialize, Serialize};

use crate::error::EngineError;
use crate::gateway::Gateway;
use crate::schema::{short_id, Content, Timestamps};
use crate::text_splitter::SentenceSplitter;

/// Memory tier a [`MemoryItem`] belongs to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum MemoryKind {
    LongTerm,
    ShortTerm,
}

/// One remembered fact. Long-term items hold durable persona/background
/// facts; short-term items hold recent conversational context.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MemoryItem {
    pub id: String,
    pub timestamps: Timestamps,
    #[serde(rename = "type")]
    pub kind: MemoryKind,
    pub content: Content,
}

/// Two-tier memory. Insertion order within each tier is chronological and
/// is what age-based pruning keys on.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Memory {
    #[serde(default)]
    pub long_term: Vec<MemoryItem>,
    #[serde(default)]
    pub short_term: Vec<MemoryItem>,
}

impl Memory {
    pub fn is_empty(&self) -> bool {
        self.long_term.is_empty() && self.short_term.is_empty()
    }

    /// Labeled tier-by-tier rendering shared by the generation and
    /// articulation prompts. Empty tiers are omitted.
    pub fn context_block(&self) -> String {
        let mut lines: Vec<String> = Vec::new();
        if !self.long_term.is_empty() {
            lines.push("Long-term memory (persona, background, etc.):".to_string());
            for item in &self.long_term {
                lines.push(item.content.text.clone());
            }
        }
        if !self.short_term.is_empty() {
            lines.push("Short-term memory (conversation history):".to_string());
            for item in &self.short_term {
                lines.push(item.content.text.clone());
            }
        }
        lines.join("\n")
    }

    /// Build memory items from raw paragraphs: each paragraph is split into
    /// sentences and every non-blank sentence becomes one item with its own
    /// embedding.
    pub async fn from_simple_input(
        input: SimpleMemoryInput,
        gateway: &dyn Gateway,
        embedding_model: &str,
    ) -> Result<Self, EngineError> {
        let splitter = SentenceSplitter::new();
        let mut memory = Memory::default();

        if let Some(paragraph) = input.long_term.as_deref() {
            for sentence in splitter.split_text(paragraph) {
                memory.long_term.push(
                    make_item(MemoryKind::LongTerm, &sentence, gateway, embedding_model).await?,
                );
            }
        }
        if let Some(paragraph) = input.short_term.as_deref() {
            for sentence in splitter.split_text(paragraph) {
                memory.short_term.push(
                    make_item(MemoryKind::ShortTerm, &sentence, gateway, embedding_model).await?,
                );
            }
        }

        Ok(memory)
    }
}

/// Boundary input for creating memory from plain paragraphs.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct SimpleMemoryInput {
    #[serde(default)]
    pub long_term: Option<String>,
    #[serde(default)]
    pub short_term: Option<String>,
}

async fn make_item(
    kind: MemoryKind,
    sentence: &str,
    gateway: &dyn Gateway,
    embedding_model: &str,
) -> Result<MemoryItem, EngineError> {
    let prefix = match kind {
        MemoryKind::LongTerm => "memory_lt",
        MemoryKind::ShortTerm => "memory_st",
    };
    let embedding = if sentence.trim().is_empty() {
        None
    } else {
        Some(gateway.embed(sentence, embedding_model).await?)
    };
    Ok(MemoryItem {
        id: short_id(prefix),
        timestamps: Timestamps::now(),
        kind,
        content: Content {
            text: sentence.to_string(),
            embedding,
        },
    })
}
