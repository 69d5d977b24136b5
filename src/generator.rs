use std::sync::Arc;

use serde_json::Value;

use crate::error::EngineError;
use crate::gateway::{CompletionParams, Gateway, ResponseFormat};
use crate::schema::{
    short_id, Content, Event, Memory, Score, SimpleEventInput, Thought, ThoughtConfig,
    ThoughtSeed, Timestamps,
};

/// How many of the highest-saliency previous thoughts are fed back into the
/// generation context.
const PREVIOUS_THOUGHT_CONTEXT: usize = 3;

/// Qualitative descriptions for the five thought depth levels.
const DEPTH_DESCRIPTIONS: [&str; 5] = [
    "Very Superficially: do not think deeply at all, just glance quickly and rely entirely on impressions or feelings.",
    "Somewhat Superficially: consider a few aspects, but mostly rely on quick impressions or simple cues.",
    "Moderately: give moderate thought to the content, considering both simple cues and some message details.",
    "Somewhat Deeply: evaluate the message thoughtfully, analyzing arguments with considerable attention and cognitive effort.",
    "Very Deeply: carefully and systematically analyze and scrutinize the content, paying close attention to argument quality and details.",
];

pub fn depth_description(depth: u8) -> &'static str {
    let index = (depth.clamp(1, 5) - 1) as usize;
    DEPTH_DESCRIPTIONS[index]
}

/// Generates one thought per call by assembling a layered context prompt
/// and asking the gateway for a `{thought, saliency}` reply.
pub struct ThoughtGenerator {
    gateway: Arc<dyn Gateway>,
    embedding_model: String,
}

impl ThoughtGenerator {
    pub fn new(gateway: Arc<dyn Gateway>, embedding_model: impl Into<String>) -> Self {
        Self {
            gateway,
            embedding_model: embedding_model.into(),
        }
    }

    /// Generate a thought for `event_input` under `seed` and `config`,
    /// optionally informed by memory and previous thoughts.
    ///
    /// A malformed structured reply is not an error: the raw reply becomes
    /// the thought text with saliency 0.
    pub async fn generate(
        &self,
        event_input: SimpleEventInput,
        seed: &ThoughtSeed,
        config: &ThoughtConfig,
        memory: Option<&Memory>,
        previous_thoughts: &[Thought],
    ) -> Result<Thought, EngineError> {
        seed.validate()?;
        config.validate()?;

        let trigger_event =
            Event::from_simple_input(event_input, self.gateway.as_ref(), &self.embedding_model)
                .await?;

        let top_thoughts = top_by_saliency(previous_thoughts, PREVIOUS_THOUGHT_CONTEXT);
        let context = build_context(&trigger_event, config, memory, &top_thoughts);
        let user_prompt = build_user_prompt(&seed.prompt.user_prompt, &context, config.length);

        let response = self
            .gateway
            .complete(CompletionParams {
                system_prompt: seed.prompt.system_prompt.clone(),
                user_prompt,
                model: seed.model.clone(),
                temperature: seed.temperature,
                max_tokens: seed.max_tokens,
                response_format: Some(ResponseFormat::JsonObject),
            })
            .await?;

        let (text, saliency) = match parse_structured_reply(&response) {
            Some((text, raw_saliency)) => (text, (raw_saliency / 10.0).clamp(0.0, 1.0)),
            None => {
                tracing::warn!(
                    "structured thought reply did not parse, keeping raw text with zero saliency"
                );
                (response, 0.0)
            }
        };

        let embedding = if text.trim().is_empty() {
            None
        } else {
            Some(self.gateway.embed(&text, &self.embedding_model).await?)
        };

        let mut references: Vec<String> = Vec::new();
        if let Some(memory) = memory {
            references.extend(memory.long_term.iter().map(|item| item.id.clone()));
            references.extend(memory.short_term.iter().map(|item| item.id.clone()));
        }
        references.extend(top_thoughts.iter().map(|thought| thought.id.clone()));

        Ok(Thought {
            id: short_id("thought"),
            timestamps: Timestamps::now(),
            content: Content { text, embedding },
            config: config.clone(),
            seed: Some(seed.clone()),
            trigger_event,
            references,
            user_comments: Vec::new(),
            score: Score {
                weight: config.weight,
                saliency,
            },
        })
    }
}

/// Highest-saliency thoughts first; ties keep the input order.
fn top_by_saliency(thoughts: &[Thought], limit: usize) -> Vec<Thought> {
    let mut sorted: Vec<Thought> = thoughts.to_vec();
    sorted.sort_by(|a, b| {
        b.score
            .saliency
            .partial_cmp(&a.score.saliency)
            .unwrap_or(std::cmp::Ordering::Equal)
    });
    sorted.truncate(limit);
    sorted
}

fn build_context(
    event: &Event,
    config: &ThoughtConfig,
    memory: Option<&Memory>,
    top_thoughts: &[Thought],
) -> String {
    let mut sections: Vec<String> = Vec::new();

    sections.push(format!(
        "## Event (what triggered the thought)\nType: {}\nEvent Content: \"{}\"\n",
        event.kind.as_str(),
        event.content.text
    ));

    sections.push(format!(
        "## Thought Configuration (additional specifications for the thought)\nModality: {}\nDepth: {} - {}\nLength: Maximum {} words\n",
        config.modality.as_str(),
        config.depth,
        depth_description(config.depth),
        config.length
    ));

    if let Some(memory) = memory {
        if !memory.is_empty() {
            sections.push(format!("## Memory\n{}\n", memory.context_block()));
        }
    }

    if !top_thoughts.is_empty() {
        let listed = top_thoughts
            .iter()
            .map(|thought| format!("- \"{}\"", thought.content.text))
            .collect::<Vec<_>>()
            .join("\n");
        sections.push(format!(
            "## Previous Thoughts (highest scoring thoughts of yours)\n{listed}\n"
        ));
    }

    sections.join("\n")
}

fn build_user_prompt(seed_user_prompt: &str, context: &str, max_words: u32) -> String {
    format!(
        r#"<Task Instructions>
{seed_user_prompt}

<Context Information>
{context}

<Generation Guidelines>
1. Generate exactly ONE thought that directly responds to the task instructions while considering the context.
2. IMPORTANT: the EVENT is the most important context element and should be the main driver of the thought. Avoid thoughts too similar to previous ones.
3. Adhere to the specified MODALITY: TEXT is a textual thought; EMOJI expresses the thought with emoji(s); VISUAL describes a visual representation of the thought.
4. Follow the specified DEPTH level from the configuration.
5. Keep the thought to a maximum of {max_words} words.
6. Task instructions always take precedence over context; the triggering event outweighs memory and previous thoughts.

<Saliency Evaluation>
Evaluate the thought's saliency (0-10) by how much it builds common ground with the user:
- 0-3: minimal shared understanding, does not acknowledge the user's perspective.
- 4-7: aligns with the user's mental model, bridges knowledge gaps, clarifies misunderstandings.
- 8-10: significantly enhances mutual understanding and creates clear reference points for future communication.

<Response Format>
Respond with a JSON object containing:
{{
  "thought": "Your generated thought here",
  "saliency": "number between 0 and 10"
}}
"#
    )
}

/// Extract `(thought, saliency)` from a structured reply. `None` means the
/// reply is malformed and the caller should fall back to the raw text.
fn parse_structured_reply(response: &str) -> Option<(String, f64)> {
    let value: Value = serde_json::from_str(response.trim()).ok()?;
    let object = value.as_object()?;

    let text = object
        .get("thought")
        .and_then(Value::as_str)
        .unwrap_or("")
        .to_string();

    let saliency = match object.get("saliency") {
        None => 0.0,
        Some(Value::Number(number)) => number.as_f64()?,
        Some(Value::String(raw)) => raw.trim().parse::<f64>().ok()?,
        Some(_) => return None,
    };

    Some((text, saliency))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::schema::{EventType, Interactivity, Modality, Prompt};
    use crate::testing::MockGateway;

    fn seed() -> ThoughtSeed {
        ThoughtSeed {
            prompt: Prompt {
                system_prompt: "You are a reflective inner voice.".to_string(),
                user_prompt: "Reflect briefly on what the user is doing.".to_string(),
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
            weight: 0.9,
        }
    }

    fn event_input(text: &str) -> SimpleEventInput {
        SimpleEventInput {
            text: text.to_string(),
            kind: EventType::WordCountChange,
            duration: None,
        }
    }

    fn generator(gateway: Arc<MockGateway>) -> ThoughtGenerator {
        ThoughtGenerator::new(gateway, "test-embed")
    }

    #[tokio::test]
    async fn generate_parses_structured_reply() {
        let gateway = Arc::new(MockGateway::with_responses(vec![
            r#"{"thought": "Exercise builds momentum.", "saliency": 8}"#.to_string(),
        ]));
        let generator = generator(gateway.clone());

        let thought = generator
            .generate(event_input("Tell me about exercise."), &seed(), &config(), None, &[])
            .await
            .unwrap();

        assert_eq!(thought.content.text, "Exercise builds momentum.");
        assert!((thought.score.saliency - 0.8).abs() < 1e-9);
        assert!((thought.score.weight - 0.9).abs() < 1e-9);
        assert!(thought.content.embedding.is_some());
        assert!(thought.id.starts_with("thought_"));
        assert_eq!(thought.seed.as_ref().unwrap().kind, "reflective");
        // Event embedding + generated-text embedding.
        assert_eq!(gateway.embed_calls(), 2);
    }

    #[tokio::test]
    async fn saliency_accepts_numeric_strings() {
        let gateway = Arc::new(MockGateway::with_responses(vec![
            r#"{"thought": "A quiet observation.", "saliency": "6"}"#.to_string(),
        ]));
        let thought = generator(gateway)
            .generate(event_input("typing"), &seed(), &config(), None, &[])
            .await
            .unwrap();
        assert!((thought.score.saliency - 0.6).abs() < 1e-9);
    }

    #[tokio::test]
    async fn malformed_reply_degrades_to_raw_text() {
        let gateway = Arc::new(MockGateway::with_responses(vec![
            "not json at all".to_string(),
        ]));
        let thought = generator(gateway)
            .generate(event_input("typing"), &seed(), &config(), None, &[])
            .await
            .unwrap();
        assert_eq!(thought.content.text, "not json at all");
        assert_eq!(thought.score.saliency, 0.0);
        assert!(thought.content.embedding.is_some());
    }

    #[tokio::test]
    async fn empty_reply_leaves_embedding_unset() {
        let gateway = Arc::new(MockGateway::with_responses(vec![
            r#"{"thought": "", "saliency": 2}"#.to_string(),
        ]));
        let thought = generator(gateway)
            .generate(event_input("typing"), &seed(), &config(), None, &[])
            .await
            .unwrap();
        assert!(thought.content.text.is_empty());
        assert!(thought.content.embedding.is_none());
    }

    #[tokio::test]
    async fn out_of_scale_saliency_is_clamped() {
        let gateway = Arc::new(MockGateway::with_responses(vec![
            r#"{"thought": "loud", "saliency": 14}"#.to_string(),
        ]));
        let thought = generator(gateway)
            .generate(event_input("typing"), &seed(), &config(), None, &[])
            .await
            .unwrap();
        assert_eq!(thought.score.saliency, 1.0);
    }

    #[tokio::test]
    async fn invalid_config_fails_before_any_gateway_call() {
        let gateway = Arc::new(MockGateway::new());
        let bad_config = ThoughtConfig {
            depth: 9,
            ..config()
        };
        let err = generator(gateway.clone())
            .generate(event_input("typing"), &seed(), &bad_config, None, &[])
            .await
            .unwrap_err();
        assert!(matches!(err, EngineError::Validation(_)));
        assert_eq!(gateway.complete_calls(), 0);
        assert_eq!(gateway.embed_calls(), 0);
    }

    #[tokio::test]
    async fn context_carries_top_three_previous_thoughts_and_memory() {
        let gateway = Arc::new(MockGateway::new());
        let generator = generator(gateway.clone());

        let mut previous = Vec::new();
        for (index, saliency) in [0.2, 0.9, 0.5, 0.7].into_iter().enumerate() {
            let mut thought = crate::testing::sample_thought(&format!("prior {index}"));
            thought.score.saliency = saliency;
            previous.push(thought);
        }
        let memory = Memory {
            long_term: vec![crate::testing::sample_memory_item(
                crate::schema::MemoryKind::LongTerm,
                "The user rows competitively.",
            )],
            short_term: Vec::new(),
        };

        let thought = generator
            .generate(
                event_input("Tell me about exercise."),
                &seed(),
                &config(),
                Some(&memory),
                &previous,
            )
            .await
            .unwrap();

        let prompt = gateway.last_completion().unwrap().user_prompt;
        assert!(prompt.contains("## Previous Thoughts"));
        assert!(prompt.contains("prior 1"));
        assert!(prompt.contains("prior 3"));
        assert!(prompt.contains("prior 2"));
        assert!(!prompt.contains("prior 0"), "lowest-saliency thought must be dropped");
        assert!(prompt.contains("The user rows competitively."));
        assert!(prompt.contains("WORD_COUNT_CHANGE"));
        assert!(prompt.contains("Maximum 15 words"));

        // References record what was consulted: 1 memory item + 3 thoughts.
        assert_eq!(thought.references.len(), 4);
    }

    #[test]
    fn depth_descriptions_cover_all_levels() {
        assert!(depth_description(1).starts_with("Very Superficially"));
        assert!(depth_description(5).starts_with("Very Deeply"));
    }

    #[test]
    fn parse_rejects_non_object_replies() {
        assert!(parse_structured_reply("\"just a string\"").is_none());
        assert!(parse_structured_reply("[1, 2]").is_none());
        assert!(parse_structured_reply(r#"{"thought": "x", "saliency": true}"#).is_none());
    }

    #[test]
    fn parse_defaults_missing_fields() {
        let (text, saliency) = parse_structured_reply(r#"{"other": 1}"#).unwrap();
        assert!(text.is_empty());
        assert_eq!(saliency, 0.0);
    }
}
