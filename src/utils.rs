//! Shared path helpers reused across the CLI and TUI interfaces.

use std::path::{Path, PathBuf};

use anyhow::{Context, Result};

/// Gets the cross-platform database path.
///
/// Returns the path as `{data_dir}/chronicle/journal.db` where `data_dir` is:
/// - Linux: `~/.local/share`
/// - macOS: `~/Library/Application Support`
/// - Windows: `C:\Users\<user>\AppData\Roaming`
///
/// # Errors
///
/// Returns an error if the data directory cannot be determined.
pub fn get_database_path() -> Result<PathBuf> {
    let data_dir =
        dirs::data_dir().ok_or_else(|| anyhow::anyhow!("Failed to determine data directory"))?;

    Ok(data_dir.join("chronicle").join("journal.db"))
}

/// Ensures the parent directory of the database file exists.
///
/// # Errors
///
/// Returns an error if directory creation fails.
pub fn ensure_database_directory(db_path: &Path) -> Result<()> {
    if let Some(parent) = db_path.parent() {
        std::fs::create_dir_all(parent).with_context(|| {
            format!("Failed to create database directory: {}", parent.display())
        })?;
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn get_database_path_returns_valid_path() {
        let path = get_database_path();
        assert!(path.is_ok());
        let path = path.unwrap();
        assert!(path.to_string_lossy().contains("chronicle"));
        assert!(path.to_string_lossy().contains("journal.db"));
    }

    #[test]
    fn ensure_database_directory_creates_parents() {
        let dir = tempfile::tempdir().unwrap();
        let db_path = dir.path().join("nested").join("deeper").join("journal.db");

        ensure_database_directory(&db_path).unwrap();
        assert!(db_path.parent().unwrap().exists());
    }
}
