use crate::schema::{short_id, Content, Memory, MemoryItem, MemoryKind, Timestamps};

pub const DEFAULT_SHORT_TERM_CAPACITY: usize = 10;
pub const DEFAULT_LONG_TERM_CAPACITY: usize = 20;

/// Two-tier bounded memory store. Each tier keeps insertion order and
/// evicts its oldest item (by creation time) on overflow.
pub struct MemoryStore {
    memory: Memory,
    short_term_capacity: usize,
    long_term_capacity: usize,
}

impl MemoryStore {
    pub fn new(short_term_capacity: usize, long_term_capacity: usize) -> Self {
        Self {
            memory: Memory::default(),
            short_term_capacity,
            long_term_capacity,
        }
    }

    /// Add an item to the tier named by its `kind`.
    pub fn add_item(&mut self, item: MemoryItem) {
        match item.kind {
            MemoryKind::LongTerm => {
                self.memory.long_term.push(item);
                evict_oldest(&mut self.memory.long_term, self.long_term_capacity);
            }
            MemoryKind::ShortTerm => {
                self.memory.short_term.push(item);
                evict_oldest(&mut self.memory.short_term, self.short_term_capacity);
            }
        }
    }

    pub fn get(&self, id: &str) -> Option<&MemoryItem> {
        self.memory
            .long_term
            .iter()
            .chain(self.memory.short_term.iter())
            .find(|item| item.id == id)
    }

    pub fn all(&self) -> &Memory {
        &self.memory
    }

    /// Owned copy of the current memory, for use as generation context.
    pub fn snapshot(&self) -> Memory {
        self.memory.clone()
    }

    pub fn long_term(&self) -> &[MemoryItem] {
        &self.memory.long_term
    }

    pub fn short_term(&self) -> &[MemoryItem] {
        &self.memory.short_term
    }

    /// Replace the item stored under `id`, returning the new value. The
    /// replacement stays in the slot (and tier list) of the original.
    pub fn update(&mut self, id: &str, item: MemoryItem) -> Option<MemoryItem> {
        for tier in [&mut self.memory.long_term, &mut self.memory.short_term] {
            if let Some(slot) = tier.iter_mut().find(|existing| existing.id == id) {
                *slot = item.clone();
                return Some(item);
            }
        }
        None
    }

    pub fn remove(&mut self, id: &str) -> bool {
        for tier in [&mut self.memory.long_term, &mut self.memory.short_term] {
            if let Some(index) = tier.iter().position(|item| item.id == id) {
                tier.remove(index);
                return true;
            }
        }
        false
    }

    pub fn clear(&mut self) {
        self.memory = Memory::default();
    }

    pub fn clear_short_term(&mut self) {
        self.memory.short_term.clear();
    }

    /// Change tier capacities, evicting immediately where a tier overflows.
    pub fn set_capacity(&mut self, short_term: usize, long_term: usize) {
        self.short_term_capacity = short_term;
        self.long_term_capacity = long_term;
        evict_oldest(&mut self.memory.short_term, self.short_term_capacity);
        evict_oldest(&mut self.memory.long_term, self.long_term_capacity);
    }

    /// Maintain the single rolling conversational-context item: rewrite the
    /// text of short-term slot 0 in place, creating the slot if the tier is
    /// empty. The embedding is not recomputed for the rolling slot.
    pub fn set_rolling_context(&mut self, text: impl Into<String>) -> &MemoryItem {
        let text = text.into();
        if self.memory.short_term.is_empty() {
            self.memory.short_term.push(MemoryItem {
                id: short_id("memory_st"),
                timestamps: Timestamps::now(),
                kind: MemoryKind::ShortTerm,
                content: Content::new(text),
            });
        } else {
            let slot = &mut self.memory.short_term[0];
            slot.content.text = text;
            slot.content.embedding = None;
            slot.timestamps.touch();
        }
        &self.memory.short_term[0]
    }
}

impl Default for MemoryStore {
    fn default() -> Self {
        Self::new(DEFAULT_SHORT_TERM_CAPACITY, DEFAULT_LONG_TERM_CAPACITY)
    }
}

/// Drop the earliest-created items until `tier` fits `capacity`. Ties keep
/// the first occurrence in list order.
fn evict_oldest(tier: &mut Vec<MemoryItem>, capacity: usize) {
    while tier.len() > capacity {
        let oldest = tier
            .iter()
            .enumerate()
            .min_by_key(|(_, item)| item.timestamps.created)
            .map(|(index, _)| index);
        match oldest {
            Some(index) => {
                let removed = tier.remove(index);
                tracing::debug!("evicting memory item '{}' (oldest in tier)", removed.id);
            }
            None => break,
        }
    }
}
