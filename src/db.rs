pub(crate) mod migration;
mod schema;

use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use rusqlite::Connection;
use tracing::info;

use migration::apply_pending_migrations;

/// Database wrapper providing connection management and schema migration.
///
/// Owns the single process-wide connection. Constructed explicitly and
/// handed to `JournalService`; there is no module-level handle.
pub struct Database {
    conn: Connection,
    path: Option<PathBuf>,
}

impl Database {
    /// Opens an in-memory SQLite database.
    ///
    /// Runs all pending migrations on open. A migration failure is fatal:
    /// no connection is handed out.
    pub fn in_memory() -> Result<Self> {
        let mut conn = Connection::open_in_memory()?;
        apply_pending_migrations(&mut conn).context("failed to migrate in-memory database")?;
        Ok(Self { conn, path: None })
    }

    /// Opens a file-based SQLite database at the given path.
    ///
    /// Creates the database file if it does not exist, then runs all
    /// pending migrations. Already-migrated stores skip applied steps.
    pub fn open(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref().to_path_buf();
        let mut conn = Connection::open(&path)
            .with_context(|| format!("failed to open database at {}", path.display()))?;
        apply_pending_migrations(&mut conn)
            .with_context(|| format!("failed to migrate database at {}", path.display()))?;
        Ok(Self {
            conn,
            path: Some(path),
        })
    }

    /// Returns a reference to the underlying connection.
    pub fn connection(&self) -> &Connection {
        &self.conn
    }

    /// Returns the backing file path, if file-based.
    pub fn path(&self) -> Option<&Path> {
        self.path.as_deref()
    }

    /// Destroys all data and reopens a freshly migrated store.
    ///
    /// For a file-backed database the file (and its WAL/SHM siblings) is
    /// deleted and recreated; an in-memory database is simply replaced.
    /// Taking `&mut self` means no other borrow of the connection can be
    /// in flight while the store is torn down.
    pub fn reset(&mut self) -> Result<()> {
        match self.path.clone() {
            Some(path) => {
                // Close the current handle before unlinking the file.
                let placeholder = Connection::open_in_memory()?;
                let old = std::mem::replace(&mut self.conn, placeholder);
                old.close()
                    .map_err(|(_, e)| e)
                    .context("failed to close database before reset")?;

                for suffix in ["", "-wal", "-shm"] {
                    let mut target = path.clone().into_os_string();
                    target.push(suffix);
                    let target = PathBuf::from(target);
                    if target.exists() {
                        std::fs::remove_file(&target).with_context(|| {
                            format!("failed to remove {}", target.display())
                        })?;
                    }
                }

                let mut conn = Connection::open(&path)
                    .with_context(|| format!("failed to reopen database at {}", path.display()))?;
                apply_pending_migrations(&mut conn)
                    .context("failed to migrate database after reset")?;
                self.conn = conn;
            }
            None => {
                let mut conn = Connection::open_in_memory()?;
                apply_pending_migrations(&mut conn)
                    .context("failed to migrate database after reset")?;
                self.conn = conn;
            }
        }
        info!("database reset complete");
        Ok(())
    }
}

#[cfg(test)]
#[path = "db/tests.rs"]
mod tests;
