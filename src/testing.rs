//! Deterministic test double for the [`Gateway`] trait.
//!
//! Completions pop from a FIFO queue (falling back to a canned reply) and
//! embeddings are either registered per text or derived deterministically
//! from the text bytes, so tests run without a network.

use std::collections::hash_map::DefaultHasher;
use std::collections::{HashMap, VecDeque};
use std::hash::{Hash, Hasher};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Mutex;

use async_trait::async_trait;

use crate::error::EngineError;
use crate::gateway::{CompletionParams, Gateway};
use crate::schema::{
    short_id, Content, Event, EventType, Memory, MemoryItem, MemoryKind, Score, Thought,
    ThoughtConfig, Timestamps,
};

const DERIVED_DIMENSIONS: usize = 8;

pub struct MockGateway {
    responses: Mutex<VecDeque<String>>,
    embeddings: Mutex<HashMap<String, Vec<f32>>>,
    complete_calls: AtomicUsize,
    embed_calls: AtomicUsize,
    last_params: Mutex<Option<CompletionParams>>,
}

impl MockGateway {
    pub fn new() -> Self {
        Self {
            responses: Mutex::new(VecDeque::new()),
            embeddings: Mutex::new(HashMap::new()),
            complete_calls: AtomicUsize::new(0),
            embed_calls: AtomicUsize::new(0),
            last_params: Mutex::new(None),
        }
    }

    pub fn with_responses(responses: Vec<String>) -> Self {
        let gateway = Self::new();
        *gateway.responses.lock().unwrap() = VecDeque::from(responses);
        gateway
    }

    /// Queue the next completion reply.
    pub fn push_response(&self, text: impl Into<String>) {
        self.responses.lock().unwrap().push_back(text.into());
    }

    /// Pin the embedding returned for an exact text.
    pub fn set_embedding(&self, text: impl Into<String>, embedding: Vec<f32>) {
        self.embeddings.lock().unwrap().insert(text.into(), embedding);
    }

    pub fn complete_calls(&self) -> usize {
        self.complete_calls.load(Ordering::SeqCst)
    }

    pub fn embed_calls(&self) -> usize {
        self.embed_calls.load(Ordering::SeqCst)
    }

    /// Parameters of the most recent completion call, for prompt assertions.
    pub fn last_completion(&self) -> Option<CompletionParams> {
        self.last_params.lock().unwrap().clone()
    }
}

impl Default for MockGateway {
    fn default() -> Self {
        Self::new()
    }
}

/// Stable pseudo-embedding derived from the text bytes. Distinct texts map
/// to distinct directions with overwhelming likelihood.
fn derived_embedding(text: &str) -> Vec<f32> {
    (0..DERIVED_DIMENSIONS)
        .map(|dimension| {
            let mut hasher = DefaultHasher::new();
            text.hash(&mut hasher);
            dimension.hash(&mut hasher);
            let raw = hasher.finish() as u32;
            (raw as f32 / u32::MAX as f32) * 2.0 - 1.0
        })
        .collect()
}

#[async_trait]
impl Gateway for MockGateway {
    async fn complete(&self, params: CompletionParams) -> Result<String, EngineError> {
        self.complete_calls.fetch_add(1, Ordering::SeqCst);
        *self.last_params.lock().unwrap() = Some(params);
        Ok(self
            .responses
            .lock()
            .unwrap()
            .pop_front()
            .unwrap_or_else(|| r#"{"thought": "mock thought", "saliency": 5}"#.to_string()))
    }

    async fn embed(&self, text: &str, _model: &str) -> Result<Vec<f32>, EngineError> {
        if text.trim().is_empty() {
            return Err(EngineError::Validation(
                "cannot embed empty text".to_string(),
            ));
        }
        self.embed_calls.fetch_add(1, Ordering::SeqCst);
        if let Some(pinned) = self.embeddings.lock().unwrap().get(text) {
            return Ok(pinned.clone());
        }
        Ok(derived_embedding(text))
    }
}

/// A plain COMMENT-level thought around `text`, for tests.
pub fn sample_thought(text: &str) -> Thought {
    Thought {
        id: short_id("thought"),
        timestamps: Timestamps::now(),
        content: Content::new(text),
        config: ThoughtConfig {
            interactivity: crate::schema::Interactivity::Comment,
            ..Default::default()
        },
        seed: None,
        trigger_event: Event {
            id: short_id("event"),
            timestamps: Timestamps::now(),
            content: Content::new("sample trigger"),
            kind: EventType::Click,
            duration: None,
        },
        references: Vec::new(),
        user_comments: Vec::new(),
        score: Score::default(),
    }
}

/// A memory item in the given tier, for tests.
pub fn sample_memory_item(kind: MemoryKind, text: &str) -> MemoryItem {
    let prefix = match kind {
        MemoryKind::LongTerm => "memory_lt",
        MemoryKind::ShortTerm => "memory_st",
    };
    MemoryItem {
        id: short_id(prefix),
        timestamps: Timestamps::now(),
        kind,
        content: Content::new(text),
    }
}

/// A memory with one item per tier, for tests.
pub fn sample_memory() -> Memory {
    Memory {
        long_term: vec![sample_memory_item(
            MemoryKind::LongTerm,
            "The user is a marine biologist.",
        )],
        short_term: vec![sample_memory_item(
            MemoryKind::ShortTerm,
            "The user asked about tides.",
        )],
    }
}
