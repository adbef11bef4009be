//! Property-based test generators using proptest.
//!
//! Generated batches look like what a real client queues: adds bind fresh
//! temporary ids, and updates/deletes only reference temporary ids bound
//! by an earlier add in the same batch.

use proptest::prelude::*;
use todosync_protocol::ActionToSync;

/// One step of a generated client session, before ids are assigned.
#[derive(Debug, Clone)]
pub enum Step {
    /// Create a todo.
    Add {
        /// Title.
        title: String,
        /// Completion flag.
        completed: bool,
    },
    /// Patch one of the todos added earlier (picked by index modulo count).
    Update {
        /// Index into the adds made so far.
        target: usize,
        /// New title.
        title: Option<String>,
        /// New completion flag.
        completed: Option<bool>,
    },
    /// Delete one of the todos added earlier.
    Delete {
        /// Index into the adds made so far.
        target: usize,
    },
}

/// Strategy for generating todo titles.
pub fn title_strategy() -> impl Strategy<Value = String> {
    prop::string::string_regex("[a-z][a-z ]{0,15}").expect("Invalid regex")
}

/// Strategy for generating a single step.
pub fn step_strategy() -> impl Strategy<Value = Step> {
    prop_oneof![
        3 => (title_strategy(), any::<bool>())
            .prop_map(|(title, completed)| Step::Add { title, completed }),
        2 => (any::<usize>(), prop::option::of(title_strategy()), prop::option::of(any::<bool>()))
            .prop_map(|(target, title, completed)| Step::Update { target, title, completed }),
        1 => any::<usize>().prop_map(|target| Step::Delete { target }),
    ]
}

/// Turns steps into a batch with action ids `1..` and temp ids `-1, -2, ..`.
///
/// An update or delete with no earlier add to target becomes an add.
pub fn build_batch(steps: Vec<Step>) -> Vec<ActionToSync> {
    let mut temp_ids: Vec<i64> = Vec::new();
    let mut actions = Vec::with_capacity(steps.len());

    for (index, step) in steps.into_iter().enumerate() {
        let id = index as i64 + 1;
        let action = match step {
            Step::Update {
                target,
                title,
                completed,
            } if !temp_ids.is_empty() => {
                ActionToSync::update(id, temp_ids[target % temp_ids.len()], title, completed)
            }
            Step::Delete { target } if !temp_ids.is_empty() => {
                ActionToSync::delete(id, temp_ids[target % temp_ids.len()])
            }
            Step::Add { title, completed } => {
                let temp_id = -(temp_ids.len() as i64 + 1);
                temp_ids.push(temp_id);
                ActionToSync::add(id, temp_id, title, completed)
            }
            Step::Update { .. } | Step::Delete { .. } => {
                let temp_id = -(temp_ids.len() as i64 + 1);
                temp_ids.push(temp_id);
                ActionToSync::add(id, temp_id, format!("todo {id}"), false)
            }
        };
        actions.push(action);
    }

    actions
}

/// Strategy for generating a valid batch of up to `max_len` actions.
pub fn batch_strategy(max_len: usize) -> impl Strategy<Value = Vec<ActionToSync>> {
    prop::collection::vec(step_strategy(), 1..=max_len.max(1)).prop_map(build_batch)
}

/// Strategy for a batch plus a split point `0..=len`.
///
/// Models a device whose first upload got through only for the prefix and
/// which then retransmits the whole queue.
pub fn split_batch_strategy(max_len: usize) -> impl Strategy<Value = (Vec<ActionToSync>, usize)> {
    batch_strategy(max_len).prop_flat_map(|batch| {
        let len = batch.len();
        (Just(batch), 0..=len)
    })
}
