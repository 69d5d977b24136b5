use std::sync::Arc;

use crate::error::EngineError;
use crate::gateway::{CompletionParams, Gateway};
use crate::schema::{Memory, Thought};

const SYSTEM_PROMPT: &str = "You are an articulate AI assistant that generates a response to the user based on your previous thoughts.\nDo not mention that you are transforming thoughts or that you have access to internal thoughts.\nJust create a natural response to the previous user message using the provided thoughts as your foundation.";

/// Composes a ranked set of thoughts, plus optional memory, into one
/// natural-language reply.
pub struct Articulator {
    gateway: Arc<dyn Gateway>,
}

impl Articulator {
    pub fn new(gateway: Arc<dyn Gateway>) -> Self {
        Self { gateway }
    }

    /// Articulate `thoughts` into a single reply. An empty input yields an
    /// empty string without touching the gateway.
    pub async fn articulate(
        &self,
        thoughts: &[Thought],
        memory: Option<&Memory>,
        model: &str,
        temperature: f32,
    ) -> Result<String, EngineError> {
        if thoughts.is_empty() {
            return Ok(String::new());
        }

        let context = render_context(thoughts, memory);
        let user_prompt = format!(
            r#"<Context>
{context}

<Task>
Compose a natural, coherent response using the provided thoughts as your foundation.
Consider the following guidelines:
1. Prioritize thoughts with a higher importance score when crafting your response.
2. If user comments are provided, consider them when crafting your response.
3. Maintain the key insights and perspectives from the thoughts.
4. Create a cohesive flow rather than listing thoughts in sequence.
5. Use a natural, conversational tone.
6. Do not mention that you are using "thoughts" or that this is an articulation process.
7. If memory context is provided, ensure your response is consistent with it.

<Response Format>
Provide your response directly, as if you are responding to the user.
Do not include any meta-commentary about the process or the thoughts.
"#
        );

        let response = self
            .gateway
            .complete(CompletionParams {
                system_prompt: SYSTEM_PROMPT.to_string(),
                user_prompt,
                model: model.to_string(),
                temperature,
                max_tokens: None,
                response_format: None,
            })
            .await?;

        Ok(response.trim().to_string())
    }
}

/// Render thoughts ranked by combined importance, then memory context.
fn render_context(thoughts: &[Thought], memory: Option<&Memory>) -> String {
    let mut ranked: Vec<&Thought> = thoughts.iter().collect();
    // Stable sort: equal importance keeps caller order.
    ranked.sort_by(|a, b| {
        b.score
            .combined()
            .partial_cmp(&a.score.combined())
            .unwrap_or(std::cmp::Ordering::Equal)
    });

    let mut lines: Vec<String> = vec!["## Selected Thoughts (ordered by importance)".to_string()];
    for (rank, thought) in ranked.iter().enumerate() {
        let importance = thought.score.combined();
        let mut line = format!(
            "{}. [Importance: {:.2}] \"{}\"",
            rank + 1,
            importance,
            thought.content.text
        );
        if !thought.user_comments.is_empty() {
            line.push_str(&format!(
                " (User comments: {})",
                thought.user_comments.join(", ")
            ));
        }
        lines.push(line);
    }
    lines.push(String::new());

    let mut context = lines.join("\n");
    if let Some(memory) = memory {
        if !memory.is_empty() {
            context.push_str(&format!("\n## Memory Context\n{}\n", memory.context_block()));
        }
    }
    context
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::{sample_memory, sample_thought, MockGateway};

    #[tokio::test]
    async fn empty_input_skips_the_gateway() {
        let gateway = Arc::new(MockGateway::new());
        let articulator = Articulator::new(gateway.clone());
        let reply = articulator
            .articulate(&[], None, "gpt-4o", 0.7)
            .await
            .unwrap();
        assert_eq!(reply, "");
        assert_eq!(gateway.complete_calls(), 0);
    }

    #[tokio::test]
    async fn response_text_is_trimmed() {
        let gateway = Arc::new(MockGateway::with_responses(vec![
            "  a composed reply \n".to_string(),
        ]));
        let articulator = Articulator::new(gateway);
        let reply = articulator
            .articulate(&[sample_thought("one idea")], None, "gpt-4o", 0.7)
            .await
            .unwrap();
        assert_eq!(reply, "a composed reply");
    }

    #[tokio::test]
    async fn context_ranks_by_combined_importance() {
        let gateway = Arc::new(MockGateway::new());
        let articulator = Articulator::new(gateway.clone());

        let mut low = sample_thought("background idea");
        low.score.weight = 0.1;
        low.score.saliency = 0.2;
        let mut high = sample_thought("central idea");
        high.score.weight = 0.9;
        high.score.saliency = 0.6;
        high.user_comments.push("expand this".to_string());

        articulator
            .articulate(&[low, high], Some(&sample_memory()), "gpt-4o", 0.7)
            .await
            .unwrap();

        let prompt = gateway.last_completion().unwrap().user_prompt;
        let central = prompt.find("central idea").unwrap();
        let background = prompt.find("background idea").unwrap();
        assert!(central < background, "higher importance must rank first");
        assert!(prompt.contains("1. [Importance: 1.50] \"central idea\""));
        assert!(prompt.contains("(User comments: expand this)"));
        assert!(prompt.contains("## Memory Context"));
        assert!(prompt.contains("marine biologist"));
    }

    #[tokio::test]
    async fn equal_importance_keeps_input_order() {
        let gateway = Arc::new(MockGateway::new());
        let articulator = Articulator::new(gateway.clone());

        let first = sample_thought("first equal");
        let second = sample_thought("second equal");
        articulator
            .articulate(&[first, second], None, "gpt-4o", 0.7)
            .await
            .unwrap();

        let prompt = gateway.last_completion().unwrap().user_prompt;
        assert!(prompt.find("first equal").unwrap() < prompt.find("second equal").unwrap());
    }
}
