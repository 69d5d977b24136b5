//! muser: a thought lifecycle engine.
//!
//! Generates short LLM "thoughts" from user-interaction events, scores
//! them, mutates them through a named-operation registry, folds
//! near-duplicates together by embedding similarity, and articulates a
//! selected set into one natural-language reply. Everything lives in
//! bounded in-memory stores for the lifetime of the process; nothing is
//! persisted.
//!
//! The HTTP transport and the LLM service itself are external: the engine
//! consumes the LLM through the narrow [`gateway::Gateway`] trait and
//! exposes typed operations for a transport layer to call.

pub mod articulator;
pub mod config;
pub mod engine;
pub mod error;
pub mod gateway;
pub mod generator;
pub mod operator;
pub mod presets;
pub mod schema;
pub mod similarity;
pub mod store;
pub mod testing;
pub mod text_splitter;

pub use articulator::Articulator;
pub use config::EngineConfig;
pub use engine::ThoughtEngine;
pub use error::EngineError;
pub use gateway::{CompletionParams, Gateway, OpenAiGateway, ResponseFormat};
pub use generator::ThoughtGenerator;
pub use operator::{OperationOptions, ThoughtOperator};
pub use schema::{
    Content, Event, EventType, Interactivity, Memory, MemoryItem, MemoryKind, Modality, Prompt,
    Score, SimpleEventInput, SimpleMemoryInput, Thought, ThoughtConfig, ThoughtSeed, Timestamps,
};
pub use similarity::{cosine_similarity, merge_duplicate};
pub use store::{MemoryStore, ThoughtStore};
pub use text_splitter::SentenceSplitter;
