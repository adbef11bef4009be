//! Protocol messages for one sync round-trip.

use crate::action::ActionToSync;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Upload of a device's unsynced actions.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct SyncRequest {
    /// Clears all server state before processing. Testing only.
    pub reset_model: bool,
    /// Stable client-chosen device identity.
    pub device_uid: String,
    /// Actions in the order the device queued them.
    pub actions_to_sync: Vec<ActionToSync>,
}

impl SyncRequest {
    /// Creates a request for a device.
    pub fn new(device_uid: impl Into<String>, actions_to_sync: Vec<ActionToSync>) -> Self {
        Self {
            reset_model: false,
            device_uid: device_uid.into(),
            actions_to_sync,
        }
    }

    /// Requests a full server reset before this batch is applied.
    pub fn with_reset(mut self) -> Self {
        self.reset_model = true;
        self
    }
}

/// A todo as rendered to clients.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TodoView {
    /// Server-assigned id.
    pub id: i64,
    /// Title text.
    pub title: String,
    /// Completion flag.
    pub completed: bool,
}

/// Reply to a [`SyncRequest`].
///
/// `todos` is always the complete current list; clients replace their
/// local view with it wholesale.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SyncResponse {
    /// Server-assigned device id.
    pub device_id: i64,
    /// Every recorded output for this device, keyed by action id as text.
    pub action_to_sync_id_to_output: BTreeMap<String, i64>,
    /// Current todo list in store order.
    pub todos: Vec<TodoView>,
}

impl SyncResponse {
    /// Looks up the recorded output of an action.
    pub fn output_of(&self, action_id: i64) -> Option<i64> {
        self.action_to_sync_id_to_output
            .get(&action_id.to_string())
            .copied()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_object_decodes_to_default_request() {
        let request: SyncRequest = serde_json::from_str("{}").unwrap();
        assert_eq!(request, SyncRequest::default());
    }

    #[test]
    fn response_uses_wire_field_names() {
        let mut outputs = BTreeMap::new();
        outputs.insert("1".to_string(), 1);
        let response = SyncResponse {
            device_id: 1,
            action_to_sync_id_to_output: outputs,
            todos: vec![TodoView {
                id: 1,
                title: "title".into(),
                completed: true,
            }],
        };

        let json = serde_json::to_string(&response).unwrap();
        assert_eq!(
            json,
            r#"{"deviceId":1,"actionToSyncIdToOutput":{"1":1},"todos":[{"id":1,"title":"title","completed":true}]}"#
        );
        assert_eq!(response.output_of(1), Some(1));
        assert_eq!(response.output_of(2), None);
    }
}
