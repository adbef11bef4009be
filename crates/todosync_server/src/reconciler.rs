//! Idempotent application of uploaded action batches.
//!
//! A device uploads every action it has not yet seen an output for. Some of
//! those may already have been executed by an earlier upload whose response
//! was lost, so each action is looked up in the device's recorded outputs
//! first and only executed if it has none. Temporary ids bound by adds are
//! visible to later actions of the same batch, including adds that were
//! replays.

use crate::config::ServerConfig;
use crate::error::{ServerError, ServerResult};
use crate::response::ResponseAssembler;
use std::collections::HashMap;
use std::sync::Arc;
use todosync_protocol::{ActionKind, ActionToSync, SyncRequest, SyncResponse};
use todosync_store::{EntityStore, TodoMutation, TodoPatch};
use tracing::{debug, info};

/// Temporary id to real todo id, scoped to one batch.
type TempIdMap = HashMap<i64, i64>;

/// Applies action batches against a device's history and the todo list.
///
/// The reconciler holds no state between calls; everything persistent lives
/// in the [`EntityStore`].
pub struct Reconciler {
    store: Arc<dyn EntityStore>,
    config: ServerConfig,
}

impl Reconciler {
    /// Creates a reconciler over a store.
    pub fn new(store: Arc<dyn EntityStore>, config: ServerConfig) -> Self {
        Self { store, config }
    }

    /// Returns the underlying store.
    pub fn store(&self) -> &Arc<dyn EntityStore> {
        &self.store
    }

    /// Returns the configuration.
    pub fn config(&self) -> &ServerConfig {
        &self.config
    }

    /// Processes a decoded request.
    pub fn handle(&self, request: SyncRequest) -> ServerResult<SyncResponse> {
        self.process(
            &request.device_uid,
            request.reset_model,
            &request.actions_to_sync,
        )
    }

    /// Applies a batch of actions for one device and returns the reply.
    ///
    /// Actions run strictly in order. A failing action aborts the batch;
    /// actions before it stay applied and their outputs stay recorded.
    pub fn process(
        &self,
        device_uid: &str,
        reset_requested: bool,
        actions: &[ActionToSync],
    ) -> ServerResult<SyncResponse> {
        if reset_requested {
            info!("resetting store on request");
            self.store.reset()?;
        }

        if device_uid.is_empty() {
            return Err(ServerError::InvalidRequest("blank device uid".into()));
        }

        if actions.len() > self.config.max_batch_actions {
            return Err(ServerError::InvalidRequest(format!(
                "too many actions: {} > {}",
                actions.len(),
                self.config.max_batch_actions
            )));
        }

        let mut device = self.store.find_or_create_device(device_uid)?;
        let mut temp_ids = TempIdMap::new();
        let mut executed = 0usize;

        for action in actions {
            if device.action_outputs.contains(action.id) {
                debug!(device_id = device.id, action_id = action.id, "replaying action");
            } else {
                let mutation = resolve(action, &temp_ids)?;
                let output = self.store.apply_action(&device, action.id, &mutation)?;
                debug!(
                    device_id = device.id,
                    action_id = action.id,
                    kind = %action.kind,
                    output,
                    "executed action"
                );
                device.action_outputs = device.action_outputs.with_output(action.id, output);
                executed += 1;
            }

            // Rebind even on replay so later actions can resolve the temp id.
            if action.is_add() {
                if let Some(todo_id) = device.action_outputs.get(action.id) {
                    temp_ids.insert(action.todo_id_maybe_temp, todo_id);
                }
            }
        }

        self.store.persist_device_action_outputs(&device)?;

        // Concurrent batches for the same uid may have recorded more outputs.
        let device = self.store.find_or_create_device(device_uid)?;

        info!(
            device_id = device.id,
            actions = actions.len(),
            executed,
            replayed = actions.len() - executed,
            "batch reconciled"
        );

        ResponseAssembler::new(self.store.as_ref()).assemble(&device)
    }
}

/// Turns a not-yet-executed action into a store mutation.
fn resolve(action: &ActionToSync, temp_ids: &TempIdMap) -> ServerResult<TodoMutation> {
    let kind = action.action_kind();

    // Every non-add action has its reference resolved before dispatch.
    let todo_id = match kind {
        Some(ActionKind::AddTodo) => None,
        _ => Some(resolve_todo_ref(action, temp_ids)?),
    };

    match (kind, todo_id) {
        (Some(ActionKind::AddTodo), _) => {
            let title = action.title.clone().ok_or_else(|| {
                ServerError::invalid_action(action.id, "ADD_TODO requires a title")
            })?;
            let completed = action.completed.ok_or_else(|| {
                ServerError::invalid_action(action.id, "ADD_TODO requires a completed flag")
            })?;
            Ok(TodoMutation::Create { title, completed })
        }
        (Some(ActionKind::UpdateTodo), Some(id)) => Ok(TodoMutation::Update {
            id,
            patch: TodoPatch {
                title: action.title.clone(),
                completed: action.completed,
            },
        }),
        (Some(ActionKind::DeleteTodo), Some(id)) => Ok(TodoMutation::Delete { id }),
        _ => Err(ServerError::UnknownActionType {
            action_id: action.id,
            kind: action.kind.clone(),
        }),
    }
}

/// Maps a todo reference to a real id: negative ids through the batch's
/// temp-id map, positive ids as-is, zero is invalid.
fn resolve_todo_ref(action: &ActionToSync, temp_ids: &TempIdMap) -> ServerResult<i64> {
    let todo_ref = action.todo_id_maybe_temp;
    if todo_ref < 0 {
        temp_ids
            .get(&todo_ref)
            .copied()
            .ok_or(ServerError::UnresolvedTempId {
                action_id: action.id,
                temp_id: todo_ref,
            })
    } else if todo_ref > 0 {
        Ok(todo_ref)
    } else {
        Err(ServerError::invalid_action(
            action.id,
            "todo reference must be non-zero",
        ))
    }
}
