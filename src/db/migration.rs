use tracing::info;

use super::schema::{V1_INITIAL_SCHEMA, V2_VERSION_STAMPS};

/// Individual migration with version metadata.
#[derive(Debug, Clone)]
pub struct Migration {
    pub version: u32,
    pub description: &'static str,
    pub up: &'static str,
}

impl Migration {
    /// Creates a new migration.
    pub const fn new(version: u32, description: &'static str, up: &'static str) -> Self {
        Self {
            version,
            description,
            up,
        }
    }

    /// Checks if this migration has been applied to the database.
    pub fn is_applied(&self, conn: &rusqlite::Connection) -> anyhow::Result<bool> {
        let exists: bool = conn.query_row(
            "SELECT EXISTS(SELECT 1 FROM schema_migrations WHERE version = ?1)",
            [self.version],
            |row| row.get(0),
        )?;
        Ok(exists)
    }

    /// Applies this migration and records it in `schema_migrations`.
    ///
    /// Runs inside a transaction: a failed step rolls back completely and
    /// leaves the store at its prior version.
    pub fn apply(&self, conn: &mut rusqlite::Connection) -> anyhow::Result<()> {
        let tx = conn.transaction()?;

        tx.execute_batch(self.up)?;

        let applied_at = std::time::SystemTime::now()
            .duration_since(std::time::UNIX_EPOCH)
            .map(|d| d.as_secs() as i64)
            .unwrap_or(0);
        tx.execute(
            "INSERT INTO schema_migrations (version, applied_at, description) VALUES (?1, ?2, ?3)",
            rusqlite::params![self.version, applied_at, self.description],
        )?;

        tx.commit()?;
        Ok(())
    }
}

/// Registry of all migrations in version order.
pub const MIGRATIONS: &[Migration] = &[
    Migration::new(
        1,
        "Initial schema: create stories, tags, settings tables and indexes",
        V1_INITIAL_SCHEMA,
    ),
    Migration::new(
        2,
        "Add version/create_at/updated_at to stories and tags, backfill existing rows",
        V2_VERSION_STAMPS,
    ),
];

/// Applies all pending migrations to the database.
///
/// Migrations run in version order and are additive-only; already-applied
/// versions are skipped. A failure here is fatal for startup: the caller
/// must not hand out the connection.
pub fn apply_pending_migrations(conn: &mut rusqlite::Connection) -> anyhow::Result<()> {
    ensure_migration_table_exists(conn)?;

    for migration in MIGRATIONS {
        if !migration.is_applied(conn)? {
            migration.apply(conn)?;
            info!(
                version = migration.version,
                "applied migration: {}", migration.description
            );
        }
    }

    Ok(())
}

/// Creates the `schema_migrations` table if it doesn't exist.
/// Idempotent and safe to call multiple times.
fn ensure_migration_table_exists(conn: &rusqlite::Connection) -> anyhow::Result<()> {
    conn.execute_batch(
        r#"
        CREATE TABLE IF NOT EXISTS schema_migrations (
            version INTEGER PRIMARY KEY,
            applied_at INTEGER NOT NULL,
            description TEXT
        );
        "#,
    )?;
    Ok(())
}
