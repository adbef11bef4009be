//! Entity store trait definition.

use crate::error::StoreResult;
use crate::model::{Device, Todo, TodoMutation, TodoPatch};

/// Persistent state behind the sync server.
///
/// # Invariants
///
/// - Device and todo ids are assigned monotonically and never reused
///   until [`EntityStore::reset`]
/// - A recorded action output never changes once written
/// - Returned values are snapshots; later mutations are not visible
///   through them
/// - Implementations must be `Send + Sync` and tolerate concurrent
///   requests, including simultaneous first contact from one device uid
///
/// # Implementors
///
/// - [`super::MemoryStore`] - For testing
/// - [`super::SqliteStore`] - For persistent storage
pub trait EntityStore: Send + Sync {
    /// Returns the device with this uid, creating it if it is unseen.
    ///
    /// A new device gets the next unused id and no recorded outputs.
    fn find_or_create_device(&self, uid: &str) -> StoreResult<Device>;

    /// Stores the device's action outputs.
    ///
    /// Callers pass the full mapping. Entries already stored keep their
    /// value; nothing previously recorded is dropped.
    fn persist_device_action_outputs(&self, device: &Device) -> StoreResult<()>;

    /// Creates a todo and returns it with its new id.
    fn create_todo(&self, title: &str, completed: bool) -> StoreResult<Todo>;

    /// Sets the supplied fields on a todo.
    ///
    /// Returns the number of rows affected: 1 if the todo exists, 0 if not.
    fn update_todo(&self, id: i64, patch: &TodoPatch) -> StoreResult<usize>;

    /// Deletes a todo. Returns the number of rows affected (0 or 1).
    fn delete_todo(&self, id: i64) -> StoreResult<usize>;

    /// Returns every todo in store order.
    fn list_todos(&self) -> StoreResult<Vec<Todo>>;

    /// Removes all devices and todos and restarts id assignment at 1.
    fn reset(&self) -> StoreResult<()>;

    /// Executes a mutation on behalf of one device action and records its
    /// output in the same atomic step.
    ///
    /// If an output is already recorded for `(device, action_id)` it is
    /// returned and the mutation is not executed.
    fn apply_action(
        &self,
        device: &Device,
        action_id: i64,
        mutation: &TodoMutation,
    ) -> StoreResult<i64>;
}
