//! Queued client mutations.

use serde::{Deserialize, Serialize};
use std::fmt;

/// The kind of mutation an action performs.
///
/// The wire carries the kind as free text so that an unrecognized value
/// survives decoding and is rejected only when the action is executed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ActionKind {
    /// Create a todo.
    AddTodo,
    /// Change the title and/or completion flag of a todo.
    UpdateTodo,
    /// Remove a todo.
    DeleteTodo,
}

impl ActionKind {
    /// Parses a wire type name.
    ///
    /// Accepts the bare names (`ADD_TODO`) as well as the namespaced
    /// names emitted by the reference client (`TODOS/ADD_TODO`,
    /// `TODO/UPDATE_TODO`, `TODOS/DELETE_TODO`).
    pub fn parse(name: &str) -> Option<Self> {
        match name {
            "ADD_TODO" | "TODOS/ADD_TODO" => Some(Self::AddTodo),
            "UPDATE_TODO" | "TODO/UPDATE_TODO" | "TODOS/UPDATE_TODO" => Some(Self::UpdateTodo),
            "DELETE_TODO" | "TODOS/DELETE_TODO" => Some(Self::DeleteTodo),
            _ => None,
        }
    }

    /// Returns the canonical wire name.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::AddTodo => "ADD_TODO",
            Self::UpdateTodo => "UPDATE_TODO",
            Self::DeleteTodo => "DELETE_TODO",
        }
    }
}

impl fmt::Display for ActionKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One mutation queued on a device, as uploaded in a batch.
///
/// `todo_id_maybe_temp` is a real todo id when positive, a client-local
/// temporary id when negative, and zero only for [`ActionKind::AddTodo`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ActionToSync {
    /// Action id, unique within the issuing device's action stream.
    pub id: i64,
    /// Wire type name, see [`ActionKind::parse`].
    #[serde(rename = "type")]
    pub kind: String,
    /// Real or temporary todo reference.
    #[serde(default)]
    pub todo_id_maybe_temp: i64,
    /// New title (required for adds).
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,
    /// New completion flag (required for adds).
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub completed: Option<bool>,
}

impl ActionToSync {
    /// Builds an add action bound to a temporary id.
    pub fn add(id: i64, temp_id: i64, title: impl Into<String>, completed: bool) -> Self {
        Self {
            id,
            kind: ActionKind::AddTodo.as_str().to_string(),
            todo_id_maybe_temp: temp_id,
            title: Some(title.into()),
            completed: Some(completed),
        }
    }

    /// Builds an update action. Unset fields are left untouched.
    pub fn update(id: i64, todo_ref: i64, title: Option<String>, completed: Option<bool>) -> Self {
        Self {
            id,
            kind: ActionKind::UpdateTodo.as_str().to_string(),
            todo_id_maybe_temp: todo_ref,
            title,
            completed,
        }
    }

    /// Builds a delete action.
    pub fn delete(id: i64, todo_ref: i64) -> Self {
        Self {
            id,
            kind: ActionKind::DeleteTodo.as_str().to_string(),
            todo_id_maybe_temp: todo_ref,
            title: None,
            completed: None,
        }
    }

    /// Returns the parsed kind, or `None` for an unrecognized type name.
    pub fn action_kind(&self) -> Option<ActionKind> {
        ActionKind::parse(&self.kind)
    }

    /// Returns true if this action creates a todo.
    pub fn is_add(&self) -> bool {
        self.action_kind() == Some(ActionKind::AddTodo)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parse_accepts_bare_and_namespaced_names() {
        assert_eq!(ActionKind::parse("ADD_TODO"), Some(ActionKind::AddTodo));
        assert_eq!(ActionKind::parse("TODOS/ADD_TODO"), Some(ActionKind::AddTodo));
        assert_eq!(ActionKind::parse("TODO/UPDATE_TODO"), Some(ActionKind::UpdateTodo));
        assert_eq!(ActionKind::parse("TODOS/DELETE_TODO"), Some(ActionKind::DeleteTodo));
        assert_eq!(ActionKind::parse("TODOS/RENAME"), None);
        assert_eq!(ActionKind::parse("add_todo"), None);
    }

    #[test]
    fn decode_uses_wire_field_names() {
        let json = r#"{"id":3,"type":"TODOS/ADD_TODO","todoIdMaybeTemp":-4,"title":"milk","completed":false}"#;
        let action: ActionToSync = serde_json::from_str(json).unwrap();
        assert_eq!(action.id, 3);
        assert_eq!(action.kind, "TODOS/ADD_TODO");
        assert_eq!(action.todo_id_maybe_temp, -4);
        assert_eq!(action.title.as_deref(), Some("milk"));
        assert_eq!(action.completed, Some(false));
        assert!(action.is_add());
    }

    #[test]
    fn optional_fields_are_omitted() {
        let json = serde_json::to_string(&ActionToSync::delete(7, 2)).unwrap();
        assert_eq!(json, r#"{"id":7,"type":"DELETE_TODO","todoIdMaybeTemp":2}"#);
    }

    #[test]
    fn unknown_type_survives_decoding() {
        let json = r#"{"id":1,"type":"TODOS/ARCHIVE","todoIdMaybeTemp":1}"#;
        let action: ActionToSync = serde_json::from_str(json).unwrap();
        assert_eq!(action.action_kind(), None);
        assert!(!action.is_add());
    }
}
