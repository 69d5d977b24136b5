use serde::{Deserialize, Serialize};

use crate::error::EngineError;
use crate::schema::{Content, Event, Score, Timestamps};

/// How a thought's content is expressed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Modality {
    Text,
    Emoji,
    Visual,
}

impl Modality {
    pub fn as_str(&self) -> &'static str {
        match self {
            Modality::Text => "TEXT",
            Modality::Emoji => "EMOJI",
            Modality::Visual => "VISUAL",
        }
    }
}

/// What the user is allowed to do with a thought. VIEW-only thoughts are
/// exempt from the weight-mutating operations.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Interactivity {
    View,
    Comment,
    Edit,
}

/// System/user prompt pair for one LLM interaction.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Prompt {
    pub system_prompt: String,
    pub user_prompt: String,
}

/// Immutable description of how a thought was produced. Fixed at generation
/// time and never mutated afterward.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ThoughtSeed {
    pub prompt: Prompt,
    pub model: String,
    pub temperature: f32,
    #[serde(rename = "type")]
    pub kind: String,
    #[serde(default)]
    pub max_tokens: Option<u32>,
}

impl ThoughtSeed {
    pub fn validate(&self) -> Result<(), EngineError> {
        if self.model.trim().is_empty() {
            return Err(EngineError::Validation(
                "thought seed requires a model identifier".to_string(),
            ));
        }
        if !(0.0..=1.0).contains(&self.temperature) {
            return Err(EngineError::Validation(format!(
                "seed temperature must be within [0, 1], got {}",
                self.temperature
            )));
        }
        Ok(())
    }
}

/// Behavior configuration for a thought. Mutable post-creation.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ThoughtConfig {
    #[serde(default = "default_modality")]
    pub modality: Modality,
    #[serde(default = "default_depth")]
    pub depth: u8,
    #[serde(default = "default_length")]
    pub length: u32,
    #[serde(default = "default_interactivity")]
    pub interactivity: Interactivity,
    #[serde(default)]
    pub persistent: bool,
    #[serde(default)]
    pub weight: f64,
}

fn default_modality() -> Modality {
    Modality::Text
}

fn default_depth() -> u8 {
    1
}

fn default_length() -> u32 {
    10
}

fn default_interactivity() -> Interactivity {
    Interactivity::View
}

impl Default for ThoughtConfig {
    fn default() -> Self {
        Self {
            modality: default_modality(),
            depth: default_depth(),
            length: default_length(),
            interactivity: default_interactivity(),
            persistent: false,
            weight: 0.0,
        }
    }
}

impl ThoughtConfig {
    pub fn validate(&self) -> Result<(), EngineError> {
        if !(1..=5).contains(&self.depth) {
            return Err(EngineError::Validation(format!(
                "thought depth must be within [1, 5], got {}",
                self.depth
            )));
        }
        if self.length < 1 {
            return Err(EngineError::Validation(
                "thought length must be at least 1 word".to_string(),
            ));
        }
        if !(0.0..=1.0).contains(&self.weight) {
            return Err(EngineError::Validation(format!(
                "config weight must be within [0, 1], got {}",
                self.weight
            )));
        }
        Ok(())
    }
}

/// A scored, mutable artifact representing one generated reflection tied to
/// a triggering event.
///
/// Created once by generation, mutated in place by operations and the
/// similarity-merge path, removed only by capacity-driven eviction or
/// explicit deletion.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Thought {
    pub id: String,
    pub timestamps: Timestamps,
    pub content: Content,
    pub config: ThoughtConfig,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub seed: Option<ThoughtSeed>,
    pub trigger_event: Event,
    #[serde(default)]
    pub references: Vec<String>,
    #[serde(default)]
    pub user_comments: Vec<String>,
    pub score: Score,
}
