use rusqlite::{Connection, OptionalExtension, Row, params_from_iter};
use time::OffsetDateTime;

use crate::db::Database;
use crate::error::{RepoError, RepoResult};
use crate::models::{Language, Settings, Story, StoryId, Tag, TagId, Theme};
use crate::query::StoryQuery;

/// Repository layer for stories, tags, and settings.
///
/// `JournalService` owns the `Database` and is the only writer. Each
/// operation runs one transaction scoped to the table it touches; failures
/// surface as [`RepoError`] and are never swallowed here. The service is
/// UI-independent and shared by the CLI and the TUI.
///
/// Updates use optimistic concurrency: the submitted `version` must be
/// strictly greater than the stored one, and on success the stored version
/// becomes `stored + 1` (server-assigned, not a client pass-through).
///
/// # Examples
///
/// ```
/// use chronicle::{Database, JournalService};
///
/// # fn main() -> anyhow::Result<()> {
/// let db = Database::in_memory()?;
/// let service = JournalService::new(db);
/// # Ok(())
/// # }
/// ```
pub struct JournalService {
    db: Database,
}

/// Current wall-clock time as Unix milliseconds.
fn now_ms() -> i64 {
    (OffsetDateTime::now_utc().unix_timestamp_nanos() / 1_000_000) as i64
}

/// Runs `body` inside an immediate transaction on `conn`.
///
/// BEGIN IMMEDIATE takes the write lock up front, so the read-check-write
/// inside an update is serialized against other writers on this database.
fn with_write_tx<T>(
    conn: &Connection,
    body: impl FnOnce() -> RepoResult<T>,
) -> RepoResult<T> {
    conn.execute("BEGIN IMMEDIATE", [])?;
    match body() {
        Ok(value) => {
            conn.execute("COMMIT", [])?;
            Ok(value)
        }
        Err(e) => {
            conn.execute("ROLLBACK", []).ok();
            Err(e)
        }
    }
}

fn story_from_row(row: &Row<'_>) -> rusqlite::Result<(Story, String)> {
    let story = Story {
        id: row.get::<_, Option<i64>>(0)?.map(StoryId::new),
        title: row.get(1)?,
        happened_at: row.get(2)?,
        detail: row.get(3)?,
        tag_ids: Vec::new(),
        color: row.get(5)?,
        is_archived: row.get(6)?,
        version: row.get(7)?,
        create_at: row.get(8)?,
        updated_at: row.get(9)?,
    };
    let raw_tag_ids: String = row.get(4)?;
    Ok((story, raw_tag_ids))
}

fn decode_tag_ids(raw: &str) -> RepoResult<Vec<TagId>> {
    let ids: Vec<i64> = serde_json::from_str(raw)?;
    Ok(ids.into_iter().map(TagId::new).collect())
}

fn tag_from_row(row: &Row<'_>) -> rusqlite::Result<Tag> {
    Ok(Tag {
        id: row.get::<_, Option<i64>>(0)?.map(TagId::new),
        name: row.get(1)?,
        description: row.get(2)?,
        color: row.get(3)?,
        version: row.get(4)?,
        create_at: row.get(5)?,
        updated_at: row.get(6)?,
    })
}

const STORY_COLUMNS: &str =
    "id, title, happened_at, detail, tag_ids, color, is_archived, version, create_at, updated_at";
const TAG_COLUMNS: &str = "id, name, description, color, version, create_at, updated_at";

impl JournalService {
    /// Creates a new service owning the given database.
    pub fn new(db: Database) -> Self {
        Self { db }
    }

    /// Returns a reference to the underlying database.
    pub fn database(&self) -> &Database {
        &self.db
    }

    /// Destroys all persisted data and reopens a freshly migrated store.
    ///
    /// Destructive and unguarded beyond the `&mut` borrow: callers that
    /// mirror state (e.g. an [`EntityCache`](crate::cache::EntityCache))
    /// must clear it themselves afterwards.
    pub fn reset(&mut self) -> RepoResult<()> {
        self.db
            .reset()
            .map_err(|e| RepoError::Persistence(e.to_string()))
    }

    // --- stories ---

    /// Inserts a story, assigning id, `version = 1`, and timestamps.
    ///
    /// Any version or timestamps on the payload are ignored; the store is
    /// authoritative.
    ///
    /// # Examples
    ///
    /// ```
    /// use chronicle::{Database, JournalService, StoryBuilder};
    ///
    /// # fn main() -> anyhow::Result<()> {
    /// let db = Database::in_memory()?;
    /// let service = JournalService::new(db);
    ///
    /// let draft = StoryBuilder::new().title("A").happened_at(1000).build();
    /// let story = service.insert_story(draft)?;
    /// assert!(story.id.is_some());
    /// assert_eq!(story.version, Some(1));
    /// # Ok(())
    /// # }
    /// ```
    pub fn insert_story(&self, mut story: Story) -> RepoResult<Story> {
        let conn = self.db.connection();
        let now = now_ms();

        story.version = Some(1);
        story.create_at = Some(now);
        story.updated_at = Some(now);

        let tag_ids_json = serde_json::to_string(
            &story.tag_ids.iter().map(|t| t.get()).collect::<Vec<i64>>(),
        )?;

        with_write_tx(conn, || {
            conn.execute(
                "INSERT INTO stories (title, happened_at, detail, tag_ids, color, is_archived, \
                 version, create_at, updated_at) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9)",
                rusqlite::params![
                    story.title,
                    story.happened_at,
                    story.detail,
                    tag_ids_json,
                    story.color,
                    story.is_archived,
                    1,
                    now,
                    now,
                ],
            )?;
            story.id = Some(StoryId::new(conn.last_insert_rowid()));
            Ok(())
        })?;

        Ok(story)
    }

    /// Retrieves a story by id. `Ok(None)` when absent; not an error.
    pub fn story_by_id(&self, id: StoryId) -> RepoResult<Option<Story>> {
        let conn = self.db.connection();

        let found = conn
            .query_row(
                &format!("SELECT {STORY_COLUMNS} FROM stories WHERE id = ?1"),
                [id.get()],
                story_from_row,
            )
            .optional()?;

        match found {
            Some((mut story, raw)) => {
                story.tag_ids = decode_tag_ids(&raw)?;
                Ok(Some(story))
            }
            None => Ok(None),
        }
    }

    /// Returns every story in store order. No ordering guarantee beyond
    /// the store's physical one; use [`fetch_story_page`](Self::fetch_story_page)
    /// for sorted, filtered access.
    pub fn all_stories(&self) -> RepoResult<Vec<Story>> {
        let conn = self.db.connection();
        let mut stmt = conn.prepare(&format!("SELECT {STORY_COLUMNS} FROM stories"))?;
        let rows = stmt.query_map([], story_from_row)?;

        let mut stories = Vec::new();
        for row in rows {
            let (mut story, raw) = row?;
            story.tag_ids = decode_tag_ids(&raw)?;
            stories.push(story);
        }
        Ok(stories)
    }

    /// Updates a story under the optimistic version check.
    ///
    /// Fails with `Validation("missing id")` when the payload has no id,
    /// `Conflict("not found")` when the row no longer exists, and
    /// `Conflict("stale version")` when the submitted version is not
    /// strictly greater than the stored one. On success `updated_at` is
    /// re-stamped, the stored version becomes `stored + 1`, and the stored
    /// entity is returned. `create_at` is never rewritten.
    ///
    /// # Examples
    ///
    /// ```
    /// use chronicle::{Database, JournalService, StoryBuilder};
    ///
    /// # fn main() -> anyhow::Result<()> {
    /// let db = Database::in_memory()?;
    /// let service = JournalService::new(db);
    /// let story = service
    ///     .insert_story(StoryBuilder::new().title("A").happened_at(1000).build())?;
    ///
    /// // Re-submitting the stored version is a stale write
    /// assert!(service.update_story(story.clone()).is_err());
    ///
    /// // Claiming the next version succeeds
    /// let mut next = story.clone();
    /// next.title = "B".to_string();
    /// next.version = Some(2);
    /// let updated = service.update_story(next)?;
    /// assert_eq!(updated.version, Some(2));
    /// assert_eq!(updated.title, "B");
    /// # Ok(())
    /// # }
    /// ```
    pub fn update_story(&self, mut story: Story) -> RepoResult<Story> {
        let id = story.id.ok_or_else(RepoError::missing_id)?;
        let conn = self.db.connection();
        let now = now_ms();

        let tag_ids_json = serde_json::to_string(
            &story.tag_ids.iter().map(|t| t.get()).collect::<Vec<i64>>(),
        )?;

        with_write_tx(conn, || {
            let stored: Option<(Option<u32>, Option<i64>)> = conn
                .query_row(
                    "SELECT version, create_at FROM stories WHERE id = ?1",
                    [id.get()],
                    |row| Ok((row.get(0)?, row.get(1)?)),
                )
                .optional()?;

            let (stored_version, stored_create_at) = match stored {
                Some((version, create_at)) => (version.unwrap_or(0), create_at),
                None => return Err(RepoError::Conflict("not found".to_string())),
            };

            if story.version.unwrap_or(0) <= stored_version {
                return Err(RepoError::Conflict("stale version".to_string()));
            }

            let next_version = stored_version + 1;
            conn.execute(
                "UPDATE stories SET title = ?1, happened_at = ?2, detail = ?3, tag_ids = ?4, \
                 color = ?5, is_archived = ?6, version = ?7, updated_at = ?8 WHERE id = ?9",
                rusqlite::params![
                    story.title,
                    story.happened_at,
                    story.detail,
                    tag_ids_json,
                    story.color,
                    story.is_archived,
                    next_version,
                    now,
                    id.get(),
                ],
            )?;

            story.version = Some(next_version);
            story.updated_at = Some(now);
            story.create_at = stored_create_at;
            Ok(())
        })?;

        Ok(story)
    }

    /// Deletes a story. Requires an id; otherwise idempotent.
    ///
    /// No cascade runs in either direction.
    pub fn delete_story(&self, story: &Story) -> RepoResult<()> {
        let id = story.id.ok_or_else(RepoError::missing_id)?;
        let conn = self.db.connection();

        with_write_tx(conn, || {
            conn.execute("DELETE FROM stories WHERE id = ?1", [id.get()])?;
            Ok(())
        })
    }

    /// One page of the filtered, sorted timeline.
    ///
    /// Returns up to `limit` stories starting at the `offset`-th match in
    /// the criteria's sort order. Evaluates the same predicate as
    /// [`count_stories`](Self::count_stories), so walking pages until
    /// `offset == count` reconstructs the whole filtered set.
    pub fn fetch_story_page(
        &self,
        query: &StoryQuery,
        offset: u64,
        limit: u64,
    ) -> RepoResult<Vec<Story>> {
        let conn = self.db.connection();
        let (sql, params) = query.page_sql(offset, limit);
        let mut stmt = conn.prepare(&sql)?;
        let rows = stmt.query_map(params_from_iter(params), story_from_row)?;

        let mut stories = Vec::new();
        for row in rows {
            let (mut story, raw) = row?;
            story.tag_ids = decode_tag_ids(&raw)?;
            stories.push(story);
        }
        Ok(stories)
    }

    /// Total number of stories matching the criteria, ignoring pagination.
    pub fn count_stories(&self, query: &StoryQuery) -> RepoResult<u64> {
        let conn = self.db.connection();
        let (sql, params) = query.count_sql();
        let count: i64 = conn.query_row(&sql, params_from_iter(params), |row| row.get(0))?;
        Ok(count as u64)
    }

    // --- tags ---

    /// Inserts a tag, assigning id, `version = 1`, and timestamps.
    ///
    /// A duplicate name violates the unique index and surfaces as
    /// `Persistence`.
    pub fn insert_tag(&self, mut tag: Tag) -> RepoResult<Tag> {
        let conn = self.db.connection();
        let now = now_ms();

        tag.version = Some(1);
        tag.create_at = Some(now);
        tag.updated_at = Some(now);

        with_write_tx(conn, || {
            conn.execute(
                "INSERT INTO tags (name, description, color, version, create_at, updated_at) \
                 VALUES (?1, ?2, ?3, ?4, ?5, ?6)",
                rusqlite::params![tag.name, tag.description, tag.color, 1, now, now],
            )?;
            tag.id = Some(TagId::new(conn.last_insert_rowid()));
            Ok(())
        })?;

        Ok(tag)
    }

    /// Retrieves a tag by id. `Ok(None)` when absent; not an error.
    /// Dangling ids from a story's `tag_ids` land here and must be shown
    /// as "tag not found" by the caller.
    pub fn tag_by_id(&self, id: TagId) -> RepoResult<Option<Tag>> {
        let conn = self.db.connection();
        let tag = conn
            .query_row(
                &format!("SELECT {TAG_COLUMNS} FROM tags WHERE id = ?1"),
                [id.get()],
                tag_from_row,
            )
            .optional()?;
        Ok(tag)
    }

    /// Returns every tag in store order.
    pub fn all_tags(&self) -> RepoResult<Vec<Tag>> {
        let conn = self.db.connection();
        let mut stmt = conn.prepare(&format!("SELECT {TAG_COLUMNS} FROM tags"))?;
        let rows = stmt.query_map([], tag_from_row)?;

        let mut tags = Vec::new();
        for row in rows {
            tags.push(row?);
        }
        Ok(tags)
    }

    /// Updates a tag under the same optimistic version check as stories.
    pub fn update_tag(&self, mut tag: Tag) -> RepoResult<Tag> {
        let id = tag.id.ok_or_else(RepoError::missing_id)?;
        let conn = self.db.connection();
        let now = now_ms();

        with_write_tx(conn, || {
            let stored: Option<(Option<u32>, Option<i64>)> = conn
                .query_row(
                    "SELECT version, create_at FROM tags WHERE id = ?1",
                    [id.get()],
                    |row| Ok((row.get(0)?, row.get(1)?)),
                )
                .optional()?;

            let (stored_version, stored_create_at) = match stored {
                Some((version, create_at)) => (version.unwrap_or(0), create_at),
                None => return Err(RepoError::Conflict("not found".to_string())),
            };

            if tag.version.unwrap_or(0) <= stored_version {
                return Err(RepoError::Conflict("stale version".to_string()));
            }

            let next_version = stored_version + 1;
            conn.execute(
                "UPDATE tags SET name = ?1, description = ?2, color = ?3, version = ?4, \
                 updated_at = ?5 WHERE id = ?6",
                rusqlite::params![
                    tag.name,
                    tag.description,
                    tag.color,
                    next_version,
                    now,
                    id.get(),
                ],
            )?;

            tag.version = Some(next_version);
            tag.updated_at = Some(now);
            tag.create_at = stored_create_at;
            Ok(())
        })?;

        Ok(tag)
    }

    /// Deletes a tag. Requires an id; otherwise idempotent.
    ///
    /// Stories referencing the tag keep the now-dangling id in their
    /// `tag_ids`; nothing cascades.
    pub fn delete_tag(&self, tag: &Tag) -> RepoResult<()> {
        let id = tag.id.ok_or_else(RepoError::missing_id)?;
        let conn = self.db.connection();

        with_write_tx(conn, || {
            conn.execute("DELETE FROM tags WHERE id = ?1", [id.get()])?;
            Ok(())
        })
    }

    // --- settings ---

    /// The single settings row, or `Ok(None)` on a never-populated store.
    pub fn fetch_settings(&self) -> RepoResult<Option<Settings>> {
        let conn = self.db.connection();
        let found = conn
            .query_row(
                "SELECT id, lang, theme, is_populated FROM settings ORDER BY id LIMIT 1",
                [],
                |row| {
                    Ok((
                        row.get::<_, i64>(0)?,
                        row.get::<_, String>(1)?,
                        row.get::<_, String>(2)?,
                        row.get::<_, Option<bool>>(3)?,
                    ))
                },
            )
            .optional()?;

        match found {
            Some((id, lang, theme, is_populated)) => Ok(Some(Settings {
                id: Some(id),
                lang: lang
                    .parse::<Language>()
                    .map_err(RepoError::Persistence)?,
                theme: theme.parse::<Theme>().map_err(RepoError::Persistence)?,
                is_populated,
            })),
            None => Ok(None),
        }
    }

    /// First-run populate: inserts the settings row and marks it populated.
    ///
    /// At most one settings row exists; populating an already-populated
    /// store is `Conflict("already populated")` and leaves the stored row
    /// untouched.
    pub fn insert_settings(&self, mut settings: Settings) -> RepoResult<Settings> {
        let conn = self.db.connection();
        settings.is_populated = Some(true);

        with_write_tx(conn, || {
            let existing: Option<i64> = conn
                .query_row("SELECT id FROM settings ORDER BY id LIMIT 1", [], |row| {
                    row.get(0)
                })
                .optional()?;
            if existing.is_some() {
                return Err(RepoError::Conflict("already populated".to_string()));
            }

            conn.execute(
                "INSERT INTO settings (lang, theme, is_populated) VALUES (?1, ?2, 1)",
                rusqlite::params![settings.lang.as_str(), settings.theme.as_str()],
            )?;
            settings.id = Some(conn.last_insert_rowid());
            Ok(())
        })?;

        Ok(settings)
    }

    /// Rewrites the settings row in place.
    ///
    /// Settings carry no version stamp (single writer, single row); a
    /// vanished row is still a `Conflict("not found")`.
    pub fn update_settings(&self, settings: Settings) -> RepoResult<Settings> {
        let id = settings.id.ok_or_else(RepoError::missing_id)?;
        let conn = self.db.connection();

        with_write_tx(conn, || {
            let changed = conn.execute(
                "UPDATE settings SET lang = ?1, theme = ?2 WHERE id = ?3",
                rusqlite::params![settings.lang.as_str(), settings.theme.as_str(), id],
            )?;
            if changed == 0 {
                return Err(RepoError::Conflict("not found".to_string()));
            }
            Ok(())
        })?;

        Ok(settings)
    }

    /// Fetch-or-populate used at startup by the CLI and TUI.
    pub fn ensure_settings(&self) -> RepoResult<Settings> {
        match self.fetch_settings()? {
            Some(settings) => Ok(settings),
            None => self.insert_settings(Settings::default()),
        }
    }
}
