use std::collections::HashMap;

use crate::schema::Thought;

pub const DEFAULT_THOUGHT_CAPACITY: usize = 5;

/// Bounded in-memory collection of thoughts, keyed by id.
///
/// When capacity is exceeded, the non-persistent thought with the lowest
/// saliency is evicted. If every thought is persistent nothing is evicted
/// and the store may transiently exceed its capacity; that tradeoff is
/// accepted rather than dropping pinned thoughts.
pub struct ThoughtStore {
    thoughts: HashMap<String, Thought>,
    capacity: usize,
}

impl ThoughtStore {
    pub fn new(capacity: usize) -> Self {
        Self {
            thoughts: HashMap::new(),
            capacity,
        }
    }

    pub fn add(&mut self, thought: Thought) {
        self.thoughts.insert(thought.id.clone(), thought);
        self.evict_excess();
    }

    pub fn get(&self, id: &str) -> Option<&Thought> {
        self.thoughts.get(id)
    }

    /// Snapshot of all stored thoughts. Iteration order is unspecified and
    /// in particular is not generation order.
    pub fn list(&self) -> Vec<Thought> {
        self.thoughts.values().cloned().collect()
    }

    /// Replace the thought stored under `id`, returning the new value, or
    /// `None` when the id is unknown.
    pub fn update(&mut self, id: &str, thought: Thought) -> Option<Thought> {
        if !self.thoughts.contains_key(id) {
            return None;
        }
        self.thoughts.insert(id.to_string(), thought.clone());
        Some(thought)
    }

    pub fn remove(&mut self, id: &str) -> bool {
        self.thoughts.remove(id).is_some()
    }

    pub fn clear(&mut self) {
        self.thoughts.clear();
    }

    pub fn len(&self) -> usize {
        self.thoughts.len()
    }

    pub fn is_empty(&self) -> bool {
        self.thoughts.is_empty()
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }

    /// Change the capacity, evicting immediately if the store now overflows.
    pub fn set_capacity(&mut self, capacity: usize) {
        self.capacity = capacity;
        self.evict_excess();
    }

    fn evict_excess(&mut self) {
        while self.thoughts.len() > self.capacity {
            let victim = self
                .thoughts
                .values()
                .filter(|thought| !thought.config.persistent)
                .min_by(|a, b| {
                    a.score
                        .saliency
                        .partial_cmp(&b.score.saliency)
                        .unwrap_or(std::cmp::Ordering::Equal)
                })
                .map(|thought| thought.id.clone());

            match victim {
                Some(id) => {
                    tracing::debug!("evicting thought '{}' (lowest saliency)", id);
                    self.thoughts.remove(&id);
                }
                None => {
                    tracing::warn!(
                        "thought store over capacity ({}/{}) but all thoughts are persistent, skipping eviction",
                        self.thoughts.len(),
                        self.capacity
                    );
                    break;
                }
            }
        }
    }
}

impl Default for ThoughtStore {
    fn default() -> Self {
        Self::new(DEFAULT_THOUGHT_CAPACITY)
    }
}
