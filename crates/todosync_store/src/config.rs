//! Database configuration file.

use crate::error::StoreResult;
use serde::Deserialize;
use std::path::{Path, PathBuf};

/// Default database file used when the config names none.
pub const DEFAULT_DATABASE_NAME: &str = "todos.db";

/// Contents of the database credential file.
///
/// The file is a JSON object whose fields are all optional:
///
/// ```json
/// { "username": "todo", "password": "secret", "databaseName": "todos.db", "sslMode": "disable" }
/// ```
///
/// The embedded store only uses `databaseName`, as the path of the
/// database file. The other fields are accepted so that existing
/// credential files keep loading.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DatabaseConfig {
    /// Database user.
    pub username: Option<String>,
    /// Database password.
    pub password: Option<String>,
    /// Database name; the file path for the embedded store.
    pub database_name: Option<String>,
    /// TLS mode.
    pub ssl_mode: Option<String>,
}

impl DatabaseConfig {
    /// Loads a config from a JSON file.
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be read or is not valid JSON.
    pub fn load(path: &Path) -> StoreResult<Self> {
        let text = std::fs::read_to_string(path)?;
        Self::from_json(&text)
    }

    /// Parses a config from JSON text.
    pub fn from_json(text: &str) -> StoreResult<Self> {
        Ok(serde_json::from_str(text)?)
    }

    /// Sets the database name.
    pub fn with_database_name(mut self, name: impl Into<String>) -> Self {
        self.database_name = Some(name.into());
        self
    }

    /// Returns the database file path.
    pub fn database_path(&self) -> PathBuf {
        PathBuf::from(
            self.database_name
                .as_deref()
                .unwrap_or(DEFAULT_DATABASE_NAME),
        )
    }

    /// Returns the names of supplied fields the embedded store ignores.
    pub fn ignored_fields(&self) -> Vec<&'static str> {
        let mut ignored = Vec::new();
        if self.username.is_some() {
            ignored.push("username");
        }
        if self.password.is_some() {
            ignored.push("password");
        }
        if self.ssl_mode.is_some() {
            ignored.push("sslMode");
        }
        ignored
    }
}
