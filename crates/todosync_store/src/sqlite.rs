//! SQLite-backed entity store for persistent storage.

use crate::config::DatabaseConfig;
use crate::error::{StoreError, StoreResult};
use crate::model::{ActionOutputs, Device, Todo, TodoMutation, TodoPatch};
use crate::store::EntityStore;
use parking_lot::Mutex;
use rusqlite::{params, Connection, OptionalExtension};
use std::path::{Path, PathBuf};
use std::time::Duration;
use tracing::{debug, warn};

const SCHEMA: &str = r#"
CREATE TABLE IF NOT EXISTS devices (
  id INTEGER PRIMARY KEY AUTOINCREMENT,
  uid TEXT NOT NULL UNIQUE
);

CREATE TABLE IF NOT EXISTS todos (
  id INTEGER PRIMARY KEY AUTOINCREMENT,
  title TEXT NOT NULL,
  completed INTEGER NOT NULL
);

CREATE TABLE IF NOT EXISTS action_outputs (
  device_id INTEGER NOT NULL REFERENCES devices(id) ON DELETE CASCADE,
  action_id INTEGER NOT NULL,
  output INTEGER NOT NULL,
  PRIMARY KEY (device_id, action_id)
);
"#;

/// A SQLite-backed entity store.
///
/// All state lives in one database file and survives process restarts.
///
/// # Durability
///
/// - Every mutation is committed before the call returns
/// - [`EntityStore::apply_action`] commits a todo mutation together with
///   the action output it produced
/// - `(device, action)` is a primary key, so an output can be written once
///
/// # Thread Safety
///
/// One connection is shared behind a mutex. Several processes may open
/// the same file; simultaneous device creation across them is resolved
/// through the `uid` uniqueness constraint.
///
/// # Example
///
/// ```no_run
/// use todosync_store::{EntityStore, SqliteStore};
/// use std::path::Path;
///
/// let store = SqliteStore::open(Path::new("todos.db")).unwrap();
/// let device = store.find_or_create_device("phone").unwrap();
/// ```
#[derive(Debug)]
pub struct SqliteStore {
    path: Option<PathBuf>,
    conn: Mutex<Connection>,
}

impl SqliteStore {
    /// Opens or creates a store at the given path.
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be opened or the schema
    /// cannot be created.
    pub fn open(path: &Path) -> StoreResult<Self> {
        if let Some(parent) = path.parent() {
            if !parent.as_os_str().is_empty() {
                std::fs::create_dir_all(parent)?;
            }
        }
        let conn = Connection::open(path)?;
        let mode: String =
            conn.pragma_update_and_check(None, "journal_mode", "WAL", |row| row.get(0))?;
        conn.pragma_update(None, "synchronous", "NORMAL")?;
        debug!(path = %path.display(), journal_mode = %mode, "opened sqlite store");
        Self::with_connection(conn, Some(path.to_path_buf()))
    }

    /// Opens a private in-memory SQLite database.
    ///
    /// Useful for exercising the SQL paths without touching disk.
    pub fn open_in_memory() -> StoreResult<Self> {
        Self::with_connection(Connection::open_in_memory()?, None)
    }

    /// Opens the store named by a database config file.
    pub fn open_with_config(config: &DatabaseConfig) -> StoreResult<Self> {
        let ignored = config.ignored_fields();
        if !ignored.is_empty() {
            warn!(
                fields = ?ignored,
                "database config fields have no effect on an embedded store"
            );
        }
        Self::open(&config.database_path())
    }

    fn with_connection(conn: Connection, path: Option<PathBuf>) -> StoreResult<Self> {
        conn.busy_timeout(Duration::from_secs(5))?;
        conn.pragma_update(None, "foreign_keys", true)?;
        conn.execute_batch(SCHEMA)?;
        Ok(Self {
            path,
            conn: Mutex::new(conn),
        })
    }

    /// Returns the database file path, or `None` for an in-memory store.
    #[must_use]
    pub fn path(&self) -> Option<&Path> {
        self.path.as_deref()
    }
}

fn is_unique_violation(err: &rusqlite::Error) -> bool {
    matches!(
        err,
        rusqlite::Error::SqliteFailure(e, _)
            if e.extended_code == rusqlite::ffi::SQLITE_CONSTRAINT_UNIQUE
    )
}

fn find_device(conn: &Connection, uid: &str) -> StoreResult<Option<Device>> {
    let id: Option<i64> = conn
        .query_row("SELECT id FROM devices WHERE uid = ?1", params![uid], |row| {
            row.get(0)
        })
        .optional()?;

    let Some(id) = id else {
        return Ok(None);
    };

    Ok(Some(Device {
        id,
        uid: uid.to_string(),
        action_outputs: load_outputs(conn, id)?,
    }))
}

fn load_outputs(conn: &Connection, device_id: i64) -> StoreResult<ActionOutputs> {
    let mut stmt = conn.prepare(
        "SELECT action_id, output FROM action_outputs WHERE device_id = ?1 ORDER BY action_id",
    )?;
    let rows = stmt.query_map(params![device_id], |row| {
        Ok((row.get::<_, i64>(0)?, row.get::<_, i64>(1)?))
    })?;
    rows.collect::<Result<ActionOutputs, _>>().map_err(Into::into)
}

fn insert_device(conn: &Connection, uid: &str) -> rusqlite::Result<usize> {
    conn.execute("INSERT INTO devices (uid) VALUES (?1)", params![uid])
}

/// Inserts a device after a failed lookup. Another connection may have
/// inserted the same uid in between; the UNIQUE violation is then
/// swallowed and the winner's row is returned.
fn insert_or_reload_device(conn: &Connection, uid: &str) -> StoreResult<Device> {
    match insert_device(conn, uid) {
        Ok(_) => debug!(uid, "created device"),
        Err(err) if is_unique_violation(&err) => {
            debug!(uid, "device created concurrently, reloading");
        }
        Err(err) => return Err(err.into()),
    }

    find_device(conn, uid)?
        .ok_or_else(|| StoreError::Corrupted(format!("device {uid:?} missing after insert")))
}

fn recorded_output(conn: &Connection, device_id: i64, action_id: i64) -> StoreResult<Option<i64>> {
    conn.query_row(
        "SELECT output FROM action_outputs WHERE device_id = ?1 AND action_id = ?2",
        params![device_id, action_id],
        |row| row.get(0),
    )
    .optional()
    .map_err(Into::into)
}

fn create_todo(conn: &Connection, title: &str, completed: bool) -> StoreResult<Todo> {
    conn.execute(
        "INSERT INTO todos (title, completed) VALUES (?1, ?2)",
        params![title, completed],
    )?;
    Ok(Todo {
        id: conn.last_insert_rowid(),
        title: title.to_string(),
        completed,
    })
}

// An empty patch still matches the row, so it reports 1 for an existing todo.
fn update_todo(conn: &Connection, id: i64, patch: &TodoPatch) -> StoreResult<usize> {
    let affected = conn.execute(
        "UPDATE todos SET title = COALESCE(?1, title), completed = COALESCE(?2, completed) \
         WHERE id = ?3",
        params![patch.title, patch.completed, id],
    )?;
    Ok(affected)
}

fn delete_todo(conn: &Connection, id: i64) -> StoreResult<usize> {
    Ok(conn.execute("DELETE FROM todos WHERE id = ?1", params![id])?)
}

fn execute(conn: &Connection, mutation: &TodoMutation) -> StoreResult<i64> {
    let output = match mutation {
        TodoMutation::Create { title, completed } => create_todo(conn, title, *completed)?.id,
        TodoMutation::Update { id, patch } => update_todo(conn, *id, patch)? as i64,
        TodoMutation::Delete { id } => delete_todo(conn, *id)? as i64,
    };
    Ok(output)
}

impl EntityStore for SqliteStore {
    fn find_or_create_device(&self, uid: &str) -> StoreResult<Device> {
        let conn = self.conn.lock();
        if let Some(device) = find_device(&conn, uid)? {
            return Ok(device);
        }
        insert_or_reload_device(&conn, uid)
    }

    fn persist_device_action_outputs(&self, device: &Device) -> StoreResult<()> {
        let mut conn = self.conn.lock();
        let tx = conn.transaction()?;
        {
            let mut stmt = tx.prepare(
                "INSERT OR IGNORE INTO action_outputs (device_id, action_id, output) \
                 VALUES (?1, ?2, ?3)",
            )?;
            for (action_id, output) in device.action_outputs.iter() {
                stmt.execute(params![device.id, action_id, output])?;
            }
        }
        tx.commit()?;
        Ok(())
    }

    fn create_todo(&self, title: &str, completed: bool) -> StoreResult<Todo> {
        create_todo(&self.conn.lock(), title, completed)
    }

    fn update_todo(&self, id: i64, patch: &TodoPatch) -> StoreResult<usize> {
        update_todo(&self.conn.lock(), id, patch)
    }

    fn delete_todo(&self, id: i64) -> StoreResult<usize> {
        delete_todo(&self.conn.lock(), id)
    }

    fn list_todos(&self) -> StoreResult<Vec<Todo>> {
        let conn = self.conn.lock();
        let mut stmt = conn.prepare("SELECT id, title, completed FROM todos ORDER BY id")?;
        let rows = stmt.query_map([], |row| {
            Ok(Todo {
                id: row.get(0)?,
                title: row.get(1)?,
                completed: row.get(2)?,
            })
        })?;
        rows.collect::<Result<Vec<_>, _>>().map_err(Into::into)
    }

    fn reset(&self) -> StoreResult<()> {
        let mut conn = self.conn.lock();
        let tx = conn.transaction()?;
        tx.execute_batch(
            "DELETE FROM action_outputs;
             DELETE FROM devices;
             DELETE FROM todos;
             DELETE FROM sqlite_sequence WHERE name IN ('devices', 'todos');",
        )?;
        tx.commit()?;
        debug!("store reset");
        Ok(())
    }

    fn apply_action(
        &self,
        device: &Device,
        action_id: i64,
        mutation: &TodoMutation,
    ) -> StoreResult<i64> {
        let mut conn = self.conn.lock();
        let tx = conn.transaction()?;

        if let Some(output) = recorded_output(&tx, device.id, action_id)? {
            return Ok(output);
        }

        let output = execute(&tx, mutation)?;
        tx.execute(
            "INSERT INTO action_outputs (device_id, action_id, output) VALUES (?1, ?2, ?3)",
            params![device.id, action_id, output],
        )?;
        tx.commit()?;
        Ok(output)
    }
}
