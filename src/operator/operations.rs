//! Built-in thought operations.
//!
//! `like` clamps weight against `2.0 - saliency` while `react` caps at a
//! flat 1.0; the asymmetry matches long-observed behavior and is kept
//! deliberately (see DESIGN.md).

use crate::operator::{OperationOptions, ThoughtOperator};
use crate::schema::{round2, Interactivity, Memory, Thought};

const DEFAULT_AMOUNT: f64 = 0.1;

pub(super) fn register_builtins(operator: &mut ThoughtOperator) {
    operator.register("like", like);
    operator.register("dislike", dislike);
    operator.register("react", react);
    operator.register("pin", pin);
    operator.register("unpin", unpin);
    operator.register("anchor", anchor);
    operator.register("unanchor", unanchor);
}

/// Single capability check gating every weight-mutating operation:
/// VIEW-only thoughts are left untouched.
pub fn can_mutate(thought: &Thought) -> bool {
    thought.config.interactivity != Interactivity::View
}

/// Increase weight by `amount`, keeping `weight + saliency` at or below 2.0.
pub fn like(
    mut thoughts: Vec<Thought>,
    _memory: Option<&Memory>,
    options: &OperationOptions,
) -> Vec<Thought> {
    let amount = options.amount.unwrap_or(DEFAULT_AMOUNT);
    for thought in &mut thoughts {
        if !can_mutate(thought) {
            continue;
        }
        let new_weight = (thought.score.weight + amount).min(2.0 - thought.score.saliency);
        thought.score.weight = round2(new_weight);
        thought.timestamps.touch();
    }
    thoughts
}

/// Decrease weight by `amount`, floored at 0.
pub fn dislike(
    mut thoughts: Vec<Thought>,
    _memory: Option<&Memory>,
    options: &OperationOptions,
) -> Vec<Thought> {
    let amount = options.amount.unwrap_or(DEFAULT_AMOUNT);
    for thought in &mut thoughts {
        if !can_mutate(thought) {
            continue;
        }
        let new_weight = (thought.score.weight - amount).max(0.0);
        thought.score.weight = round2(new_weight);
        thought.timestamps.touch();
    }
    thoughts
}

/// Append the reaction to `user_comments` and nudge the weight up, capped
/// at 1.0. With no reaction text the whole call is a no-op.
pub fn react(
    mut thoughts: Vec<Thought>,
    _memory: Option<&Memory>,
    options: &OperationOptions,
) -> Vec<Thought> {
    let reaction = match options.reaction.as_deref() {
        Some(reaction) if !reaction.is_empty() => reaction,
        _ => return thoughts,
    };
    let amount = options.amount.unwrap_or(DEFAULT_AMOUNT);
    for thought in &mut thoughts {
        if !can_mutate(thought) {
            continue;
        }
        thought.user_comments.push(reaction.to_string());
        let new_weight = (thought.score.weight + amount).min(1.0);
        thought.score.weight = round2(new_weight);
        thought.timestamps.touch();
    }
    thoughts
}

/// Mark thoughts persistent, exempting them from store eviction.
pub fn pin(
    mut thoughts: Vec<Thought>,
    _memory: Option<&Memory>,
    _options: &OperationOptions,
) -> Vec<Thought> {
    for thought in &mut thoughts {
        thought.config.persistent = true;
        thought.timestamps.touch();
    }
    thoughts
}

pub fn unpin(
    mut thoughts: Vec<Thought>,
    _memory: Option<&Memory>,
    _options: &OperationOptions,
) -> Vec<Thought> {
    for thought in &mut thoughts {
        thought.config.persistent = false;
        thought.timestamps.touch();
    }
    thoughts
}

/// Alias of [`pin`]; both names are part of the public operation surface.
pub fn anchor(
    thoughts: Vec<Thought>,
    memory: Option<&Memory>,
    options: &OperationOptions,
) -> Vec<Thought> {
    pin(thoughts, memory, options)
}

/// Alias of [`unpin`].
pub fn unanchor(
    thoughts: Vec<Thought>,
    memory: Option<&Memory>,
    options: &OperationOptions,
) -> Vec<Thought> {
    unpin(thoughts, memory, options)
}
