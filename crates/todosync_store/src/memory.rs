//! In-memory entity store.

use crate::error::{StoreError, StoreResult};
use crate::model::{Device, Todo, TodoMutation, TodoPatch};
use crate::store::EntityStore;
use parking_lot::RwLock;
use tracing::debug;

#[derive(Debug)]
struct MemoryState {
    devices: Vec<Device>,
    next_device_id: i64,
    todos: Vec<Todo>,
    next_todo_id: i64,
}

impl Default for MemoryState {
    fn default() -> Self {
        Self {
            devices: Vec::new(),
            next_device_id: 1,
            todos: Vec::new(),
            next_todo_id: 1,
        }
    }
}

impl MemoryState {
    fn create_todo(&mut self, title: &str, completed: bool) -> Todo {
        let todo = Todo {
            id: self.next_todo_id,
            title: title.to_string(),
            completed,
        };
        self.next_todo_id += 1;
        self.todos.push(todo.clone());
        todo
    }

    fn update_todo(&mut self, id: i64, patch: &TodoPatch) -> usize {
        match self.todos.iter_mut().find(|todo| todo.id == id) {
            Some(todo) => {
                patch.apply_to(todo);
                1
            }
            None => 0,
        }
    }

    fn delete_todo(&mut self, id: i64) -> usize {
        let before = self.todos.len();
        self.todos.retain(|todo| todo.id != id);
        before - self.todos.len()
    }

    fn execute(&mut self, mutation: &TodoMutation) -> i64 {
        match mutation {
            TodoMutation::Create { title, completed } => self.create_todo(title, *completed).id,
            TodoMutation::Update { id, patch } => self.update_todo(*id, patch) as i64,
            TodoMutation::Delete { id } => self.delete_todo(*id) as i64,
        }
    }
}

/// An in-memory entity store.
///
/// This store keeps all state in memory and is suitable for:
/// - Unit and integration tests
/// - Ephemeral servers that don't need persistence
///
/// # Thread Safety
///
/// All state sits behind one lock, so every operation (including
/// find-or-create of a device) is atomic with respect to the others.
#[derive(Debug, Default)]
pub struct MemoryStore {
    state: RwLock<MemoryState>,
}

impl MemoryStore {
    /// Creates a new empty store.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns a copy of every device in creation order.
    ///
    /// Useful for testing and debugging.
    #[must_use]
    pub fn devices(&self) -> Vec<Device> {
        self.state.read().devices.clone()
    }

    /// Returns the id the next created todo will get.
    #[must_use]
    pub fn next_todo_id(&self) -> i64 {
        self.state.read().next_todo_id
    }
}

impl EntityStore for MemoryStore {
    fn find_or_create_device(&self, uid: &str) -> StoreResult<Device> {
        if let Some(device) = self.state.read().devices.iter().find(|d| d.uid == uid) {
            return Ok(device.clone());
        }

        // Re-check under the write lock: another request may have created it.
        let mut state = self.state.write();
        if let Some(device) = state.devices.iter().find(|d| d.uid == uid) {
            return Ok(device.clone());
        }

        let device = Device {
            id: state.next_device_id,
            uid: uid.to_string(),
            action_outputs: Default::default(),
        };
        state.next_device_id += 1;
        state.devices.push(device.clone());
        debug!(device_id = device.id, uid, "created device");
        Ok(device)
    }

    fn persist_device_action_outputs(&self, device: &Device) -> StoreResult<()> {
        let mut state = self.state.write();
        let stored = state
            .devices
            .iter_mut()
            .find(|d| d.id == device.id)
            .ok_or_else(|| StoreError::Corrupted(format!("unknown device id {}", device.id)))?;
        stored.action_outputs = stored.action_outputs.merge_missing(&device.action_outputs);
        Ok(())
    }

    fn create_todo(&self, title: &str, completed: bool) -> StoreResult<Todo> {
        Ok(self.state.write().create_todo(title, completed))
    }

    fn update_todo(&self, id: i64, patch: &TodoPatch) -> StoreResult<usize> {
        Ok(self.state.write().update_todo(id, patch))
    }

    fn delete_todo(&self, id: i64) -> StoreResult<usize> {
        Ok(self.state.write().delete_todo(id))
    }

    fn list_todos(&self) -> StoreResult<Vec<Todo>> {
        Ok(self.state.read().todos.clone())
    }

    fn reset(&self) -> StoreResult<()> {
        *self.state.write() = MemoryState::default();
        Ok(())
    }

    fn apply_action(
        &self,
        device: &Device,
        action_id: i64,
        mutation: &TodoMutation,
    ) -> StoreResult<i64> {
        let mut state = self.state.write();
        let index = state
            .devices
            .iter()
            .position(|d| d.id == device.id)
            .ok_or_else(|| StoreError::Corrupted(format!("unknown device id {}", device.id)))?;

        if let Some(output) = state.devices[index].action_outputs.get(action_id) {
            return Ok(output);
        }

        let output = state.execute(mutation);
        let stored = &mut state.devices[index];
        stored.action_outputs = stored.action_outputs.with_output(action_id, output);
        Ok(output)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::ActionOutputs;

    #[test]
    fn memory_new_is_empty() {
        let store = MemoryStore::new();
        assert!(store.devices().is_empty());
        assert!(store.list_todos().unwrap().is_empty());
        assert_eq!(store.next_todo_id(), 1);
    }

    #[test]
    fn memory_find_or_create_assigns_sequential_ids() {
        let store = MemoryStore::new();
        let b = store.find_or_create_device("B").unwrap();
        let c = store.find_or_create_device("C").unwrap();
        let b_again = store.find_or_create_device("B").unwrap();

        assert_eq!(b.id, 1);
        assert_eq!(c.id, 2);
        assert_eq!(b_again, b);
        assert_eq!(store.devices().len(), 2);
    }

    #[test]
    fn memory_update_missing_todo_affects_nothing() {
        let store = MemoryStore::new();
        let patch = TodoPatch {
            title: Some("x".into()),
            completed: None,
        };
        assert_eq!(store.update_todo(42, &patch).unwrap(), 0);
    }

    #[test]
    fn memory_delete_does_not_reuse_ids() {
        let store = MemoryStore::new();
        let first = store.create_todo("a", false).unwrap();
        assert_eq!(store.delete_todo(first.id).unwrap(), 1);
        assert_eq!(store.delete_todo(first.id).unwrap(), 0);

        let second = store.create_todo("b", false).unwrap();
        assert_eq!(second.id, 2);
    }

    #[test]
    fn memory_list_is_a_snapshot() {
        let store = MemoryStore::new();
        let todo = store.create_todo("a", false).unwrap();
        let snapshot = store.list_todos().unwrap();

        store
            .update_todo(todo.id, &TodoPatch {
                title: Some("changed".into()),
                completed: Some(true),
            })
            .unwrap();

        assert_eq!(snapshot[0].title, "a");
        assert!(!snapshot[0].completed);
    }

    #[test]
    fn memory_device_snapshot_is_not_aliased() {
        let store = MemoryStore::new();
        let device = store.find_or_create_device("A").unwrap();
        let held = device.action_outputs.clone();

        let updated = Device {
            action_outputs: device.action_outputs.with_output(1, 1),
            ..device
        };
        store.persist_device_action_outputs(&updated).unwrap();

        assert!(held.is_empty());
        assert_eq!(
            store.find_or_create_device("A").unwrap().action_outputs.get(1),
            Some(1)
        );
    }

    #[test]
    fn memory_persist_never_overwrites() {
        let store = MemoryStore::new();
        let device = store.find_or_create_device("A").unwrap();

        let first = Device {
            action_outputs: [(1, 5)].into_iter().collect(),
            ..device.clone()
        };
        store.persist_device_action_outputs(&first).unwrap();

        let second = Device {
            action_outputs: ActionOutputs::from_iter([(1, 9), (2, 1)]),
            ..device
        };
        store.persist_device_action_outputs(&second).unwrap();

        let outputs = store.find_or_create_device("A").unwrap().action_outputs;
        assert_eq!(outputs.get(1), Some(5));
        assert_eq!(outputs.get(2), Some(1));
    }

    #[test]
    fn memory_apply_action_is_deduplicated() {
        let store = MemoryStore::new();
        let device = store.find_or_create_device("A").unwrap();
        let create = TodoMutation::Create {
            title: "once".into(),
            completed: false,
        };

        assert_eq!(store.apply_action(&device, 1, &create).unwrap(), 1);
        assert_eq!(store.apply_action(&device, 1, &create).unwrap(), 1);
        assert_eq!(store.list_todos().unwrap().len(), 1);
    }

    #[test]
    fn memory_reset_restarts_ids() {
        let store = MemoryStore::new();
        store.find_or_create_device("A").unwrap();
        store.create_todo("a", true).unwrap();

        store.reset().unwrap();

        assert!(store.devices().is_empty());
        assert!(store.list_todos().unwrap().is_empty());
        assert_eq!(store.find_or_create_device("Z").unwrap().id, 1);
        assert_eq!(store.create_todo("b", false).unwrap().id, 1);
    }
}
