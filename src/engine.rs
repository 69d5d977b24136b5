use std::sync::Arc;

use tokio::sync::Mutex;

use crate::articulator::Articulator;
use crate::config::EngineConfig;
use crate::error::EngineError;
use crate::gateway::{Gateway, OpenAiGateway};
use crate::generator::ThoughtGenerator;
use crate::operator::{OperationOptions, ThoughtOperator};
use crate::schema::{Memory, SimpleEventInput, SimpleMemoryInput, Thought, ThoughtConfig, ThoughtSeed};
use crate::similarity::merge_duplicate;
use crate::store::{MemoryStore, ThoughtStore};

/// Context-owned composition of the thought lifecycle: generator, operator,
/// articulator, and the two bounded stores.
///
/// Created on service start and dropped on service stop. Store mutations
/// are serialized behind one async lock per store; gateway calls never hold
/// a lock, so concurrent `generate` calls cannot race eviction.
pub struct ThoughtEngine {
    config: EngineConfig,
    gateway: Arc<dyn Gateway>,
    generator: ThoughtGenerator,
    operator: ThoughtOperator,
    articulator: Articulator,
    thought_store: Mutex<ThoughtStore>,
    memory_store: Mutex<MemoryStore>,
}

impl ThoughtEngine {
    /// Engine backed by the OpenAI-compatible HTTP gateway from `config`.
    pub fn new(config: EngineConfig) -> Self {
        let gateway: Arc<dyn Gateway> = Arc::new(OpenAiGateway::with_max_retries(
            config.llm_api_url.clone(),
            config.llm_api_key.clone().unwrap_or_default(),
            config.max_retries,
        ));
        Self::with_gateway(gateway, config)
    }

    /// Engine backed by an arbitrary gateway implementation.
    pub fn with_gateway(gateway: Arc<dyn Gateway>, config: EngineConfig) -> Self {
        let operator = ThoughtOperator::with_builtins();
        tracing::info!(
            "thought engine initialized, operations: {:?}",
            operator.available_operations()
        );
        Self {
            generator: ThoughtGenerator::new(gateway.clone(), config.embedding_model.clone()),
            articulator: Articulator::new(gateway.clone()),
            operator,
            thought_store: Mutex::new(ThoughtStore::new(config.max_thought_count)),
            memory_store: Mutex::new(MemoryStore::new(
                config.max_short_term_count,
                config.max_long_term_count,
            )),
            gateway,
            config,
        }
    }

    pub fn config(&self) -> &EngineConfig {
        &self.config
    }

    /// Store handles for direct CRUD by the transport layer.
    pub fn thought_store(&self) -> &Mutex<ThoughtStore> {
        &self.thought_store
    }

    pub fn memory_store(&self) -> &Mutex<MemoryStore> {
        &self.memory_store
    }

    /// Generate a thought for `event_input`, using the current memory and
    /// stored thoughts as context, then either insert it or fold it into a
    /// near-duplicate already in the store. Returns the stored record.
    pub async fn generate(
        &self,
        event_input: SimpleEventInput,
        seed: &ThoughtSeed,
        config: &ThoughtConfig,
    ) -> Result<Thought, EngineError> {
        let (memory, previous) = {
            let memory = self.memory_store.lock().await.snapshot();
            let previous = self.thought_store.lock().await.list();
            (memory, previous)
        };

        let memory_ref = (!memory.is_empty()).then_some(&memory);
        let fresh = self
            .generator
            .generate(event_input, seed, config, memory_ref, &previous)
            .await?;

        // Re-read candidates under the lock: another generate call may have
        // landed while the gateway calls were in flight.
        let mut store = self.thought_store.lock().await;
        let existing = store.list();
        match merge_duplicate(&fresh, &existing) {
            Some(survivor) => {
                store.update(&survivor.id, survivor.clone());
                Ok(survivor)
            }
            None => {
                store.add(fresh.clone());
                Ok(fresh)
            }
        }
    }

    /// Run a registered operation over caller-supplied thoughts, with the
    /// current memory snapshot as context.
    pub async fn operate(
        &self,
        name: &str,
        thoughts: Vec<Thought>,
        options: &OperationOptions,
    ) -> Result<Vec<Thought>, EngineError> {
        let memory = self.memory_store.lock().await.snapshot();
        let memory_ref = (!memory.is_empty()).then_some(&memory);
        self.operator.operate(name, thoughts, memory_ref, options)
    }

    /// Compose caller-supplied thoughts and the current memory snapshot
    /// into one reply.
    pub async fn articulate(
        &self,
        thoughts: &[Thought],
        temperature: f32,
    ) -> Result<String, EngineError> {
        let memory = self.memory_store.lock().await.snapshot();
        let memory_ref = (!memory.is_empty()).then_some(&memory);
        self.articulator
            .articulate(
                thoughts,
                memory_ref,
                &self.config.articulation_model,
                temperature,
            )
            .await
    }

    /// Split raw memory paragraphs into embedded per-sentence items and add
    /// them to the store.
    pub async fn ingest_memory(&self, input: SimpleMemoryInput) -> Result<Memory, EngineError> {
        let ingested =
            Memory::from_simple_input(input, self.gateway.as_ref(), &self.config.embedding_model)
                .await?;

        let mut store = self.memory_store.lock().await;
        for item in ingested.long_term {
            store.add_item(item);
        }
        for item in ingested.short_term {
            store.add_item(item);
        }
        Ok(store.snapshot())
    }

    /// Replace the rolling short-term conversational context.
    pub async fn set_rolling_context(&self, text: impl Into<String>) {
        self.memory_store.lock().await.set_rolling_context(text);
    }

    /// Registered operation names.
    pub fn available_operations(&self) -> Vec<&str> {
        self.operator.available_operations()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::schema::{EventType, Interactivity, Modality, Prompt};
    use crate::testing::MockGateway;

    fn test_engine(gateway: Arc<MockGateway>) -> ThoughtEngine {
        let config = EngineConfig {
            max_thought_count: 3,
            ..Default::default()
        };
        ThoughtEngine::with_gateway(gateway, config)
    }

    fn seed() -> ThoughtSeed {
        ThoughtSeed {
            prompt: Prompt {
                system_prompt: "You are a reflective inner voice.".to_string(),
                user_prompt: "Reflect briefly.".to_string(),
            },
            model: "gpt-4o-mini".to_string(),
            temperature: 0.7,
            kind: "reflective".to_string(),
            max_tokens: Some(100),
        }
    }

    fn config() -> ThoughtConfig {
        ThoughtConfig {
            modality: Modality::Text,
            depth: 3,
            length: 15,
            interactivity: Interactivity::Comment,
            persistent: false,
            weight: 0.5,
        }
    }

    fn event(text: &str) -> SimpleEventInput {
        SimpleEventInput {
            text: text.to_string(),
            kind: EventType::SentenceEnd,
            duration: None,
        }
    }

    #[tokio::test]
    async fn generated_thoughts_land_in_the_store() {
        let gateway = Arc::new(MockGateway::with_responses(vec![
            r#"{"thought": "first idea", "saliency": 6}"#.to_string(),
        ]));
        let engine = test_engine(gateway);

        let thought = engine.generate(event("typing"), &seed(), &config()).await.unwrap();
        let stored = engine.thought_store().lock().await.list();
        assert_eq!(stored.len(), 1);
        assert_eq!(stored[0].id, thought.id);
    }

    #[tokio::test]
    async fn near_duplicates_merge_instead_of_inserting() {
        let gateway = Arc::new(MockGateway::with_responses(vec![
            r#"{"thought": "the tide is rising", "saliency": 5}"#.to_string(),
            r#"{"thought": "the tide rises", "saliency": 4}"#.to_string(),
        ]));
        gateway.set_embedding("the tide is rising", vec![1.0, 0.0, 0.0]);
        gateway.set_embedding("the tide rises", vec![0.99, 0.1, 0.0]);
        let engine = test_engine(gateway);

        let first = engine.generate(event("tide"), &seed(), &config()).await.unwrap();
        let merged = engine.generate(event("tide again"), &seed(), &config()).await.unwrap();

        assert_eq!(merged.id, first.id);
        assert!((merged.score.saliency - 0.7).abs() < 1e-9);
        let stored = engine.thought_store().lock().await.list();
        assert_eq!(stored.len(), 1, "duplicate must not create a second record");
        assert!((stored[0].score.saliency - 0.7).abs() < 1e-9);
    }

    #[tokio::test]
    async fn distinct_thoughts_accumulate_until_capacity() {
        let gateway = Arc::new(MockGateway::new());
        let replies = [
            ("alpha", vec![1.0, 0.0, 0.0], 2),
            ("beta", vec![0.0, 1.0, 0.0], 6),
            ("gamma", vec![0.0, 0.0, 1.0], 7),
            ("delta", vec![0.5, -0.5, 0.5], 9),
        ];
        for (text, embedding, saliency) in &replies {
            gateway.push_response(format!(
                r#"{{"thought": "{text}", "saliency": {saliency}}}"#
            ));
            gateway.set_embedding(*text, embedding.clone());
        }
        let engine = test_engine(gateway);

        for index in 0..replies.len() {
            engine
                .generate(event(&format!("event {index}")), &seed(), &config())
                .await
                .unwrap();
        }

        let stored = engine.thought_store().lock().await.list();
        assert_eq!(stored.len(), 3, "store capacity is 3");
        assert!(
            !stored.iter().any(|t| t.content.text == "alpha"),
            "lowest-saliency thought must have been evicted"
        );
    }

    #[tokio::test]
    async fn operate_routes_through_the_registry() {
        let gateway = Arc::new(MockGateway::new());
        let engine = test_engine(gateway);

        let mut thought = crate::testing::sample_thought("idea");
        thought.score.weight = 0.8;
        thought.score.saliency = 0.75;

        let result = engine
            .operate(
                "like",
                vec![thought],
                &OperationOptions {
                    amount: Some(0.5),
                    ..Default::default()
                },
            )
            .await
            .unwrap();
        assert!((result[0].score.weight - 1.25).abs() < 1e-9);

        let err = engine
            .operate("unknown", Vec::new(), &OperationOptions::default())
            .await
            .unwrap_err();
        assert!(matches!(err, EngineError::UnknownOperation { .. }));
    }

    #[tokio::test]
    async fn articulate_empty_never_calls_the_gateway() {
        let gateway = Arc::new(MockGateway::new());
        let engine = test_engine(gateway.clone());
        let reply = engine.articulate(&[], 0.7).await.unwrap();
        assert_eq!(reply, "");
        assert_eq!(gateway.complete_calls(), 0);
    }

    #[tokio::test]
    async fn ingest_memory_splits_and_stores_sentences() {
        let gateway = Arc::new(MockGateway::new());
        let engine = test_engine(gateway);

        let memory = engine
            .ingest_memory(SimpleMemoryInput {
                long_term: Some("The user rows. They race on weekends.".to_string()),
                short_term: Some("They asked about training plans.".to_string()),
            })
            .await
            .unwrap();

        assert_eq!(memory.long_term.len(), 2);
        assert_eq!(memory.short_term.len(), 1);
    }

    #[tokio::test]
    async fn rolling_context_feeds_generation() {
        let gateway = Arc::new(MockGateway::new());
        let engine = test_engine(gateway.clone());

        engine.set_rolling_context("The user just mentioned regattas.").await;
        engine.generate(event("typing"), &seed(), &config()).await.unwrap();

        let prompt = gateway.last_completion().unwrap().user_prompt;
        assert!(prompt.contains("The user just mentioned regattas."));
    }
}
