pub mod event;
pub mod memory;
pub mod thought;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

pub use event::{Event, EventType, SimpleEventInput};
pub use memory::{Memory, MemoryItem, MemoryKind, SimpleMemoryInput};
pub use thought::{Interactivity, Modality, Prompt, Thought, ThoughtConfig, ThoughtSeed};

/// Creation/modification times carried by every record in the system.
/// `updated` is rewritten on every mutation.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Timestamps {
    pub created: DateTime<Utc>,
    pub updated: DateTime<Utc>,
}

impl Timestamps {
    pub fn now() -> Self {
        let now = Utc::now();
        Self {
            created: now,
            updated: now,
        }
    }

    /// Rewrite `updated` to the current instant.
    pub fn touch(&mut self) {
        self.updated = Utc::now();
    }
}

impl Default for Timestamps {
    fn default() -> Self {
        Self::now()
    }
}

/// Text payload with an optional embedding, computed once at creation.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Content {
    pub text: String,
    #[serde(default)]
    pub embedding: Option<Vec<f32>>,
}

impl Content {
    pub fn new(text: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            embedding: None,
        }
    }
}

/// Scoring pair used for ranking and eviction.
///
/// `weight` is the user/operator-controlled importance; `saliency` is the
/// system-assessed relevance assigned at generation time. Operations never
/// touch saliency except the similarity-merge path.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Score {
    #[serde(default)]
    pub weight: f64,
    #[serde(default)]
    pub saliency: f64,
}

impl Score {
    /// Combined importance used for articulation ranking.
    pub fn combined(&self) -> f64 {
        self.weight + self.saliency
    }
}

/// Kind-prefixed short id, e.g. `thought_1a2b3c4d`.
pub fn short_id(prefix: &str) -> String {
    let hex = Uuid::new_v4().simple().to_string();
    format!("{}_{}", prefix, &hex[..8])
}

/// Round to two decimal places, the precision used for all score mutations.
pub fn round2(value: f64) -> f64 {
    (value * 100.0).round() / 100.0
}
