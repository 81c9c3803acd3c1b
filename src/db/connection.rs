use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

use anyhow::{Context, Result};
use rusqlite::Connection;
use tracing::debug;

/// How long a connection waits on a locked database before giving up.
const BUSY_TIMEOUT: Duration = Duration::from_secs(2);

/// Handle to the expense database file. Each operation opens its own
/// connection and drops it when done, so no lock outlives a single action.
#[derive(Debug, Clone)]
pub struct ExpenseStore {
    path: PathBuf,
}

impl ExpenseStore {
    /// Point the store at `path` and make sure the schema exists. The parent
    /// directory and the database file are created on first use.
    pub fn open(path: impl Into<PathBuf>) -> Result<Self> {
        let store = Self { path: path.into() };
        store.initialize()?;
        Ok(store)
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Create the `expenses` table when it is missing. Safe to run on every
    /// start regardless of what the file already holds.
    pub fn initialize(&self) -> Result<()> {
        if let Some(parent) = self.path.parent() {
            if !parent.as_os_str().is_empty() {
                fs::create_dir_all(parent).context("failed to create data directory")?;
            }
        }

        let conn = self.connect()?;
        ensure_schema(&conn)?;
        debug!(path = %self.path.display(), "expense schema ready");
        Ok(())
    }

    /// Open a fresh connection for a single operation.
    pub(crate) fn connect(&self) -> Result<Connection> {
        let conn = Connection::open(&self.path).with_context(|| {
            format!("failed to open SQLite database at {}", self.path.display())
        })?;
        conn.busy_timeout(BUSY_TIMEOUT)
            .context("failed to configure busy timeout")?;
        Ok(conn)
    }
}

/// Run the lazy migration on an open connection. The column names and types are
/// part of the on-disk contract shared with existing databases.
pub(crate) fn ensure_schema(conn: &Connection) -> Result<()> {
    conn.execute(
        "CREATE TABLE IF NOT EXISTS expenses (
            id INTEGER PRIMARY KEY AUTOINCREMENT,
            amount REAL,
            category TEXT,
            date TEXT,
            time TEXT
        )",
        [],
    )
    .context("failed to create expenses table")?;

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn initialize_is_idempotent_and_creates_parent() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("nested").join("expenses.db");

        let store = ExpenseStore::open(&path).unwrap();
        store.initialize().unwrap();
        store.initialize().unwrap();

        assert!(path.exists());
    }

    #[test]
    fn schema_matches_persisted_contract() {
        let dir = tempfile::tempdir().unwrap();
        let store = ExpenseStore::open(dir.path().join("expenses.db")).unwrap();
        let conn = store.connect().unwrap();

        let mut stmt = conn.prepare("PRAGMA table_info(expenses)").unwrap();
        let columns = stmt
            .query_map([], |row| {
                Ok((row.get::<_, String>(1)?, row.get::<_, String>(2)?))
            })
            .unwrap()
            .collect::<Result<Vec<_>, _>>()
            .unwrap();

        assert_eq!(
            columns,
            vec![
                ("id".to_string(), "INTEGER".to_string()),
                ("amount".to_string(), "REAL".to_string()),
                ("category".to_string(), "TEXT".to_string()),
                ("date".to_string(), "TEXT".to_string()),
                ("time".to_string(), "TEXT".to_string()),
            ]
        );
    }
}
