/// Versioned schema steps for the journal database.
///
/// Each constant is one migration, applied exactly once in version order.
/// Steps are additive-only: later versions add tables, columns, or backfill
/// data, never rewrite earlier structure.

/// v1: base tables.
///
/// `stories.tag_ids` is a JSON array of tag ids with no foreign key on
/// purpose: deleting a tag must not cascade into stories, and consumers
/// treat dangling ids as "tag not found". Ids are AUTOINCREMENT so a
/// deleted id is never reassigned; a dangling reference must keep
/// resolving to nothing, not to a later unrelated tag.
pub const V1_INITIAL_SCHEMA: &str = r#"
-- Stories table: timeline events
CREATE TABLE IF NOT EXISTS stories (
    id INTEGER PRIMARY KEY AUTOINCREMENT,
    title TEXT NOT NULL,
    happened_at INTEGER NOT NULL,
    detail TEXT NOT NULL DEFAULT '',
    tag_ids TEXT NOT NULL DEFAULT '[]',
    color TEXT NOT NULL DEFAULT '',
    is_archived INTEGER NOT NULL DEFAULT 0
);

-- Tags table: unique label names
CREATE TABLE IF NOT EXISTS tags (
    id INTEGER PRIMARY KEY AUTOINCREMENT,
    name TEXT NOT NULL,
    description TEXT NOT NULL DEFAULT '',
    color TEXT NOT NULL DEFAULT ''
);

-- Settings table: single logical row
CREATE TABLE IF NOT EXISTS settings (
    id INTEGER PRIMARY KEY,
    lang TEXT NOT NULL,
    theme TEXT NOT NULL,
    is_populated INTEGER
);

-- Index for range scans and ordering over the timeline
CREATE INDEX IF NOT EXISTS idx_stories_happened ON stories(happened_at);

-- Unique index backing the tag-name constraint
CREATE UNIQUE INDEX IF NOT EXISTS idx_tags_name ON tags(name);
"#;

/// v2: introduce the optimistic-concurrency triple and backfill every
/// pre-existing row with `version = 1` and current timestamps
/// (Unix milliseconds, matching what the repositories stamp).
pub const V2_VERSION_STAMPS: &str = r#"
ALTER TABLE stories ADD COLUMN version INTEGER;
ALTER TABLE stories ADD COLUMN create_at INTEGER;
ALTER TABLE stories ADD COLUMN updated_at INTEGER;

ALTER TABLE tags ADD COLUMN version INTEGER;
ALTER TABLE tags ADD COLUMN create_at INTEGER;
ALTER TABLE tags ADD COLUMN updated_at INTEGER;

UPDATE stories SET
    version = 1,
    create_at = CAST(strftime('%s', 'now') AS INTEGER) * 1000,
    updated_at = CAST(strftime('%s', 'now') AS INTEGER) * 1000
WHERE version IS NULL;

UPDATE tags SET
    version = 1,
    create_at = CAST(strftime('%s', 'now') AS INTEGER) * 1000,
    updated_at = CAST(strftime('%s', 'now') AS INTEGER) * 1000
WHERE version IS NULL;
"#;
