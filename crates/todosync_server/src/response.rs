//! Builds the reply for a reconciled batch.

use crate::error::ServerResult;
use todosync_protocol::{SyncResponse, TodoView};
use todosync_store::{Device, EntityStore};

/// Assembles a [`SyncResponse`] from a device and the current todo list.
pub struct ResponseAssembler<'a> {
    store: &'a dyn EntityStore,
}

impl<'a> ResponseAssembler<'a> {
    /// Creates an assembler reading from `store`.
    pub fn new(store: &'a dyn EntityStore) -> Self {
        Self { store }
    }

    /// Renders the device id, every recorded output and the full todo list.
    ///
    /// The list is never a delta: clients replace their local view with it.
    pub fn assemble(&self, device: &Device) -> ServerResult<SyncResponse> {
        let todos = self
            .store
            .list_todos()?
            .into_iter()
            .map(TodoView::from)
            .collect();

        Ok(SyncResponse {
            device_id: device.id,
            action_to_sync_id_to_output: device.action_outputs.to_text_keyed(),
            todos,
        })
    }
}
