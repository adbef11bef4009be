//! Entities owned by the store.

use std::collections::BTreeMap;
use std::sync::Arc;
use todosync_protocol::TodoView;

/// Recorded outputs of a device's executed actions, keyed by action id.
///
/// The mapping is an immutable value: every update builds a new mapping
/// and leaves the original untouched, so a copy handed out by a store can
/// never observe a later change. Entries are write-once; an id that is
/// already present keeps its first output.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ActionOutputs(Arc<BTreeMap<i64, i64>>);

impl ActionOutputs {
    /// Creates an empty mapping.
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns the recorded output for an action.
    pub fn get(&self, action_id: i64) -> Option<i64> {
        self.0.get(&action_id).copied()
    }

    /// Returns true if the action has a recorded output.
    pub fn contains(&self, action_id: i64) -> bool {
        self.0.contains_key(&action_id)
    }

    /// Returns the number of recorded outputs.
    pub fn len(&self) -> usize {
        self.0.len()
    }

    /// Returns true if nothing has been recorded.
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Iterates over `(action_id, output)` in ascending action id order.
    pub fn iter(&self) -> impl Iterator<Item = (i64, i64)> + '_ {
        self.0.iter().map(|(k, v)| (*k, *v))
    }

    /// Returns a new mapping with `action_id` bound to `output`.
    ///
    /// If `action_id` is already recorded the existing output wins.
    #[must_use]
    pub fn with_output(&self, action_id: i64, output: i64) -> Self {
        if self.contains(action_id) {
            return self.clone();
        }
        let mut next = BTreeMap::clone(&self.0);
        next.insert(action_id, output);
        Self(Arc::new(next))
    }

    /// Returns a new mapping holding every entry of `self` plus the
    /// entries of `other` whose action ids are not yet recorded.
    #[must_use]
    pub fn merge_missing(&self, other: &ActionOutputs) -> Self {
        if other.iter().all(|(id, _)| self.contains(id)) {
            return self.clone();
        }
        let mut next = BTreeMap::clone(&self.0);
        for (id, output) in other.iter() {
            next.entry(id).or_insert(output);
        }
        Self(Arc::new(next))
    }

    /// Renders the mapping with action ids as text, as the wire requires.
    pub fn to_text_keyed(&self) -> BTreeMap<String, i64> {
        self.iter().map(|(k, v)| (k.to_string(), v)).collect()
    }
}

impl FromIterator<(i64, i64)> for ActionOutputs {
    fn from_iter<I: IntoIterator<Item = (i64, i64)>>(iter: I) -> Self {
        let mut map = BTreeMap::new();
        for (id, output) in iter {
            map.entry(id).or_insert(output);
        }
        Self(Arc::new(map))
    }
}

/// A client device known to the server.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Device {
    /// Server-assigned id, never reused.
    pub id: i64,
    /// Client-supplied stable identity.
    pub uid: String,
    /// Outputs of every action already executed for this device.
    pub action_outputs: ActionOutputs,
}

/// A todo item.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Todo {
    /// Store-assigned id, never reused within a run.
    pub id: i64,
    /// Title text.
    pub title: String,
    /// Completion flag.
    pub completed: bool,
}

impl From<Todo> for TodoView {
    fn from(todo: Todo) -> Self {
        TodoView {
            id: todo.id,
            title: todo.title,
            completed: todo.completed,
        }
    }
}

/// Fields to change on an existing todo. `None` leaves a field untouched.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TodoPatch {
    /// New title.
    pub title: Option<String>,
    /// New completion flag.
    pub completed: Option<bool>,
}

impl TodoPatch {
    /// Applies the patch to a todo in place.
    pub fn apply_to(&self, todo: &mut Todo) {
        if let Some(title) = &self.title {
            todo.title = title.clone();
        }
        if let Some(completed) = self.completed {
            todo.completed = completed;
        }
    }
}

/// One resolved todo mutation, ready to execute against a store.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TodoMutation {
    /// Create a todo. Output is the new id.
    Create {
        /// Title of the new todo.
        title: String,
        /// Completion flag of the new todo.
        completed: bool,
    },
    /// Patch a todo. Output is the number of rows affected.
    Update {
        /// Real todo id.
        id: i64,
        /// Fields to change.
        patch: TodoPatch,
    },
    /// Delete a todo. Output is the number of rows affected.
    Delete {
        /// Real todo id.
        id: i64,
    },
}
