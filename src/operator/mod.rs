pub mod operations;

use std::collections::HashMap;

use serde::{Deserialize, Serialize};

use crate::error::EngineError;
use crate::schema::{Memory, Thought};

/// Options accepted by operations. Unknown combinations are ignored by
/// operations that do not use them.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct OperationOptions {
    /// Weight delta for the like/dislike/react family. Defaults to 0.1.
    #[serde(default)]
    pub amount: Option<f64>,
    /// Reaction text appended by `react`.
    #[serde(default)]
    pub reaction: Option<String>,
}

/// Shared signature every operation implements: take the collection, mutate
/// the thoughts in place, hand the same collection back.
pub type OperationFn = fn(Vec<Thought>, Option<&Memory>, &OperationOptions) -> Vec<Thought>;

/// Name-keyed registry of thought operations, built once at startup.
pub struct ThoughtOperator {
    operations: HashMap<String, OperationFn>,
}

impl ThoughtOperator {
    /// An empty registry. Most callers want [`ThoughtOperator::with_builtins`].
    pub fn new() -> Self {
        Self {
            operations: HashMap::new(),
        }
    }

    /// A registry pre-loaded with the built-in operations.
    pub fn with_builtins() -> Self {
        let mut operator = Self::new();
        operations::register_builtins(&mut operator);
        operator
    }

    /// Register `operation` under `name`, replacing any previous entry.
    pub fn register(&mut self, name: impl Into<String>, operation: OperationFn) {
        self.operations.insert(name.into(), operation);
    }

    /// Run the named operation over `thoughts`.
    pub fn operate(
        &self,
        name: &str,
        thoughts: Vec<Thought>,
        memory: Option<&Memory>,
        options: &OperationOptions,
    ) -> Result<Vec<Thought>, EngineError> {
        let operation = self
            .operations
            .get(name)
            .ok_or_else(|| EngineError::UnknownOperation {
                name: name.to_string(),
            })?;
        Ok(operation(thoughts, memory, options))
    }

    /// Registered operation names, sorted.
    pub fn available_operations(&self) -> Vec<&str> {
        let mut names: Vec<&str> = self.operations.keys().map(String::as_str).collect();
        names.sort_unstable();
        names
    }
}

impl Default for ThoughtOperator {
    fn default() -> Self {
        Self::with_builtins()
    }
}
