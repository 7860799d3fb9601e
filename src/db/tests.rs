use super::*;
use super::migration::MIGRATIONS;
use tempfile::tempdir;

#[test]
fn in_memory_opens_successfully() {
    let result = Database::in_memory();
    assert!(result.is_ok());
}

#[test]
fn schema_tables_exist() {
    let db = Database::in_memory().unwrap();

    let tables: Vec<String> = db
        .connection()
        .prepare("SELECT name FROM sqlite_master WHERE type='table' ORDER BY name")
        .unwrap()
        .query_map([], |row| row.get(0))
        .unwrap()
        .filter_map(|r| r.ok())
        .collect();

    assert!(tables.contains(&"stories".to_string()));
    assert!(tables.contains(&"tags".to_string()));
    assert!(tables.contains(&"settings".to_string()));
    assert!(tables.contains(&"schema_migrations".to_string()));
}

#[test]
fn schema_indexes_exist() {
    let db = Database::in_memory().unwrap();

    let indexes: Vec<String> = db
        .connection()
        .prepare(
            "SELECT name FROM sqlite_master WHERE type='index' AND name LIKE 'idx_%' ORDER BY name",
        )
        .unwrap()
        .query_map([], |row| row.get(0))
        .unwrap()
        .filter_map(|r| r.ok())
        .collect();

    assert!(indexes.contains(&"idx_stories_happened".to_string()));
    assert!(indexes.contains(&"idx_tags_name".to_string()));
}

#[test]
fn all_migrations_are_recorded() {
    let db = Database::in_memory().unwrap();

    let applied: Vec<u32> = db
        .connection()
        .prepare("SELECT version FROM schema_migrations ORDER BY version")
        .unwrap()
        .query_map([], |row| row.get(0))
        .unwrap()
        .filter_map(|r| r.ok())
        .collect();

    let expected: Vec<u32> = MIGRATIONS.iter().map(|m| m.version).collect();
    assert_eq!(applied, expected);
}

#[test]
fn migration_versions_are_strictly_increasing() {
    let versions: Vec<u32> = MIGRATIONS.iter().map(|m| m.version).collect();
    for pair in versions.windows(2) {
        assert!(pair[0] < pair[1], "migration registry out of order");
    }
}

#[test]
fn v2_backfills_version_stamps_on_pre_migration_rows() {
    // Simulate a store that stopped at v1: apply only the first migration,
    // write rows without the versioning triple, then run the full chain.
    let mut conn = rusqlite::Connection::open_in_memory().unwrap();
    conn.execute_batch(
        "CREATE TABLE schema_migrations (
            version INTEGER PRIMARY KEY,
            applied_at INTEGER NOT NULL,
            description TEXT
        );",
    )
    .unwrap();
    MIGRATIONS[0].apply(&mut conn).unwrap();

    conn.execute(
        "INSERT INTO stories (title, happened_at) VALUES ('old story', 1000)",
        [],
    )
    .unwrap();
    conn.execute("INSERT INTO tags (name) VALUES ('old tag')", [])
        .unwrap();

    migration::apply_pending_migrations(&mut conn).unwrap();

    let (version, create_at, updated_at): (u32, i64, i64) = conn
        .query_row(
            "SELECT version, create_at, updated_at FROM stories WHERE title = 'old story'",
            [],
            |row| Ok((row.get(0)?, row.get(1)?, row.get(2)?)),
        )
        .unwrap();
    assert_eq!(version, 1);
    assert!(create_at > 0);
    assert_eq!(create_at, updated_at);

    let tag_version: u32 = conn
        .query_row("SELECT version FROM tags WHERE name = 'old tag'", [], |row| {
            row.get(0)
        })
        .unwrap();
    assert_eq!(tag_version, 1);
}

#[test]
fn open_creates_database_file() {
    let dir = tempdir().unwrap();
    let db_path = dir.path().join("journal.db");

    let result = Database::open(&db_path);
    assert!(result.is_ok());
    assert!(db_path.exists());
}

#[test]
fn reopen_is_idempotent() {
    let dir = tempdir().unwrap();
    let db_path = dir.path().join("journal.db");

    {
        let db = Database::open(&db_path).unwrap();
        db.connection()
            .execute(
                "INSERT INTO stories (title, happened_at) VALUES ('kept', 42)",
                [],
            )
            .unwrap();
    }

    // Reopen: migrations must be skipped, data must survive
    let db2 = Database::open(&db_path).unwrap();
    let count: i64 = db2
        .connection()
        .query_row("SELECT COUNT(*) FROM stories", [], |row| row.get(0))
        .unwrap();
    assert_eq!(count, 1);
}

#[test]
fn reset_discards_all_rows() {
    let dir = tempdir().unwrap();
    let db_path = dir.path().join("journal.db");

    let mut db = Database::open(&db_path).unwrap();
    db.connection()
        .execute(
            "INSERT INTO stories (title, happened_at) VALUES ('gone soon', 7)",
            [],
        )
        .unwrap();

    db.reset().unwrap();

    let count: i64 = db
        .connection()
        .query_row("SELECT COUNT(*) FROM stories", [], |row| row.get(0))
        .unwrap();
    assert_eq!(count, 0);
    // Fresh store is fully migrated and writable
    db.connection()
        .execute(
            "INSERT INTO stories (title, happened_at) VALUES ('fresh', 8)",
            [],
        )
        .unwrap();
    assert!(db_path.exists());
}

#[test]
fn reset_in_memory_replaces_store() {
    let mut db = Database::in_memory().unwrap();
    db.connection()
        .execute("INSERT INTO tags (name) VALUES ('temp')", [])
        .unwrap();

    db.reset().unwrap();

    let count: i64 = db
        .connection()
        .query_row("SELECT COUNT(*) FROM tags", [], |row| row.get(0))
        .unwrap();
    assert_eq!(count, 0);
}
