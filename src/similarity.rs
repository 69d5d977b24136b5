//! Embedding similarity and the near-duplicate merge applied at the
//! generation boundary.

use crate::schema::Thought;

/// Similarity above which a freshly generated thought is folded into an
/// existing one instead of being stored as a new record.
pub const MERGE_THRESHOLD: f32 = 0.8;

/// Saliency bump applied to the surviving thought on merge.
const MERGE_SALIENCY_BONUS: f64 = 0.2;

/// Cosine similarity between two optional embeddings.
///
/// Absent, empty, length-mismatched, or zero-magnitude vectors compare as
/// 0 rather than erroring. The result is clamped to [-1, 1] to absorb
/// floating-point drift.
pub fn cosine_similarity(a: Option<&[f32]>, b: Option<&[f32]>) -> f32 {
    let (a, b) = match (a, b) {
        (Some(a), Some(b)) => (a, b),
        _ => return 0.0,
    };
    if a.is_empty() || b.is_empty() || a.len() != b.len() {
        return 0.0;
    }

    let dot: f32 = a.iter().zip(b.iter()).map(|(x, y)| x * y).sum();
    let magnitude_a = a.iter().map(|x| x * x).sum::<f32>().sqrt();
    let magnitude_b = b.iter().map(|x| x * x).sum::<f32>().sqrt();
    if magnitude_a == 0.0 || magnitude_b == 0.0 {
        return 0.0;
    }

    (dot / (magnitude_a * magnitude_b)).clamp(-1.0, 1.0)
}

/// Check a newly generated thought against existing candidates and, when it
/// duplicates one, return the updated survivor.
///
/// First match wins, in candidate scan order. The survivor keeps its own
/// identity and content; only its saliency is bumped (clamped so
/// `weight + saliency` stays at or below 2.0) and its `updated` timestamp
/// rewritten. `None` means the new thought is genuinely new.
pub fn merge_duplicate(new_thought: &Thought, candidates: &[Thought]) -> Option<Thought> {
    let embedding = new_thought.content.embedding.as_deref();
    for candidate in candidates {
        let similarity = cosine_similarity(embedding, candidate.content.embedding.as_deref());
        if similarity > MERGE_THRESHOLD {
            tracing::debug!(
                "thought '{}' duplicates '{}' (similarity {:.3}), merging",
                new_thought.id,
                candidate.id,
                similarity
            );
            let mut survivor = candidate.clone();
            survivor.score.saliency = (survivor.score.saliency + MERGE_SALIENCY_BONUS)
                .min(2.0 - survivor.score.weight);
            survivor.timestamps.touch();
            return Some(survivor);
        }
    }
    None
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::schema::{
        Content, Event, EventType, Score, Thought, ThoughtConfig, Timestamps,
    };

    fn thought_with_embedding(id: &str, embedding: Option<Vec<f32>>, score: Score) -> Thought {
        Thought {
            id: id.to_string(),
            timestamps: Timestamps::now(),
            content: Content {
                text: format!("thought {id}"),
                embedding,
            },
            config: ThoughtConfig::default(),
            seed: None,
            trigger_event: Event {
                id: "event_1".to_string(),
                timestamps: Timestamps::now(),
                content: Content::new("something happened"),
                kind: EventType::Click,
                duration: None,
            },
            references: Vec::new(),
            user_comments: Vec::new(),
            score,
        }
    }

    #[test]
    fn identical_vectors_have_similarity_one() {
        let v = vec![0.3, -0.5, 0.8];
        let sim = cosine_similarity(Some(&v), Some(&v));
        assert!((sim - 1.0).abs() < 1e-6);
    }

    #[test]
    fn missing_or_degenerate_vectors_compare_as_zero() {
        let v = vec![1.0, 0.0];
        assert_eq!(cosine_similarity(None, Some(&v)), 0.0);
        assert_eq!(cosine_similarity(Some(&v), None), 0.0);
        assert_eq!(cosine_similarity(Some(&[]), Some(&v)), 0.0);
        assert_eq!(cosine_similarity(Some(&[0.0, 0.0]), Some(&v)), 0.0);
        assert_eq!(cosine_similarity(Some(&[1.0]), Some(&v)), 0.0);
    }

    #[test]
    fn opposite_vectors_have_similarity_negative_one() {
        let a = vec![2.0, 0.0];
        let b = vec![-1.0, 0.0];
        let sim = cosine_similarity(Some(&a), Some(&b));
        assert!((sim + 1.0).abs() < 1e-6);
    }

    #[test]
    fn merge_picks_first_candidate_over_threshold() {
        let new = thought_with_embedding("thought_new", Some(vec![1.0, 0.0]), Score::default());
        let first = thought_with_embedding(
            "thought_a",
            Some(vec![0.99, 0.141]),
            Score {
                weight: 0.1,
                saliency: 0.5,
            },
        );
        let second = thought_with_embedding(
            "thought_b",
            Some(vec![1.0, 0.0]),
            Score {
                weight: 0.1,
                saliency: 0.9,
            },
        );

        let survivor = merge_duplicate(&new, &[first, second]).unwrap();
        assert_eq!(survivor.id, "thought_a");
        assert!((survivor.score.saliency - 0.7).abs() < 1e-9);
    }

    #[test]
    fn merge_clamps_saliency_against_weight() {
        let new = thought_with_embedding("thought_new", Some(vec![1.0, 0.0]), Score::default());
        let existing = thought_with_embedding(
            "thought_a",
            Some(vec![1.0, 0.0]),
            Score {
                weight: 0.95,
                saliency: 0.95,
            },
        );
        let survivor = merge_duplicate(&new, &[existing]).unwrap();
        assert!((survivor.score.saliency - 1.05).abs() < 1e-9);
        assert!(survivor.score.combined() <= 2.0 + 1e-9);
    }

    #[test]
    fn dissimilar_or_unembedded_thoughts_do_not_merge() {
        let new = thought_with_embedding("thought_new", Some(vec![1.0, 0.0]), Score::default());
        let orthogonal = thought_with_embedding("thought_a", Some(vec![0.0, 1.0]), Score::default());
        let unembedded = thought_with_embedding("thought_b", None, Score::default());
        assert!(merge_duplicate(&new, &[orthogonal, unembedded]).is_none());
        assert!(merge_duplicate(&new, &[]).is_none());
    }
}
