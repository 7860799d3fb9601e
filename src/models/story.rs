use serde::{Deserialize, Serialize};

use super::{StoryId, TagId};

/// A user-recorded timeline event.
///
/// `id` is `None` until the store assigns one on first insert. The
/// versioning triple (`version`, `create_at`, `updated_at`) is stamped by
/// the repository; it is absent on rows written before the upgrade that
/// introduced those columns. Timestamps are Unix milliseconds.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Story {
    /// Store-assigned identifier, absent before first insert.
    pub id: Option<StoryId>,
    /// Short headline for the event.
    pub title: String,
    /// When the event happened, Unix milliseconds.
    pub happened_at: i64,
    /// Freeform body text.
    pub detail: String,
    /// Attached tag ids. Order is irrelevant and references may dangle:
    /// deleting a tag does not cascade into stories.
    pub tag_ids: Vec<TagId>,
    /// Display color for the timeline dot.
    pub color: String,
    /// Whether the story is hidden from the default timeline.
    pub is_archived: bool,
    /// Optimistic-concurrency stamp; 1 on insert, strictly increasing.
    pub version: Option<u32>,
    /// When the row was first inserted, Unix milliseconds.
    pub create_at: Option<i64>,
    /// When the row was last written, Unix milliseconds.
    pub updated_at: Option<i64>,
}

/// Builder for constructing `Story` values with optional fields.
///
/// # Examples
///
/// ```
/// use chronicle::StoryBuilder;
///
/// let story = StoryBuilder::new()
///     .title("Moved to Tokyo")
///     .happened_at(1_650_000_000_000)
///     .build();
///
/// assert_eq!(story.title, "Moved to Tokyo");
/// assert!(story.id.is_none());
/// assert!(story.tag_ids.is_empty());
/// ```
#[derive(Debug, Default)]
pub struct StoryBuilder {
    id: Option<StoryId>,
    title: Option<String>,
    happened_at: Option<i64>,
    detail: Option<String>,
    tag_ids: Option<Vec<TagId>>,
    color: Option<String>,
    is_archived: bool,
    version: Option<u32>,
    create_at: Option<i64>,
    updated_at: Option<i64>,
}

impl StoryBuilder {
    /// Creates a new `StoryBuilder`.
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets the story id.
    pub fn id(mut self, id: StoryId) -> Self {
        self.id = Some(id);
        self
    }

    /// Sets the title.
    pub fn title(mut self, title: impl Into<String>) -> Self {
        self.title = Some(title.into());
        self
    }

    /// Sets when the event happened (Unix milliseconds).
    pub fn happened_at(mut self, happened_at: i64) -> Self {
        self.happened_at = Some(happened_at);
        self
    }

    /// Sets the body text.
    pub fn detail(mut self, detail: impl Into<String>) -> Self {
        self.detail = Some(detail.into());
        self
    }

    /// Sets the attached tag ids.
    pub fn tag_ids(mut self, tag_ids: Vec<TagId>) -> Self {
        self.tag_ids = Some(tag_ids);
        self
    }

    /// Sets the display color.
    pub fn color(mut self, color: impl Into<String>) -> Self {
        self.color = Some(color.into());
        self
    }

    /// Sets the archived flag.
    pub fn is_archived(mut self, is_archived: bool) -> Self {
        self.is_archived = is_archived;
        self
    }

    /// Sets the version stamp.
    pub fn version(mut self, version: u32) -> Self {
        self.version = Some(version);
        self
    }

    /// Sets the created timestamp (Unix milliseconds).
    pub fn create_at(mut self, create_at: i64) -> Self {
        self.create_at = Some(create_at);
        self
    }

    /// Sets the updated timestamp (Unix milliseconds).
    pub fn updated_at(mut self, updated_at: i64) -> Self {
        self.updated_at = Some(updated_at);
        self
    }

    /// Builds the `Story`, using defaults for optional fields.
    ///
    /// # Panics
    ///
    /// Panics if `title` or `happened_at` have not been set.
    pub fn build(self) -> Story {
        Story {
            id: self.id,
            title: self.title.expect("title is required"),
            happened_at: self.happened_at.expect("happened_at is required"),
            detail: self.detail.unwrap_or_default(),
            tag_ids: self.tag_ids.unwrap_or_default(),
            color: self.color.unwrap_or_default(),
            is_archived: self.is_archived,
            version: self.version,
            create_at: self.create_at,
            updated_at: self.updated_at,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn builder_creates_story_with_defaults() {
        let story = StoryBuilder::new().title("A").happened_at(1000).build();

        assert_eq!(story.id, None);
        assert_eq!(story.title, "A");
        assert_eq!(story.happened_at, 1000);
        assert_eq!(story.detail, "");
        assert!(story.tag_ids.is_empty());
        assert!(!story.is_archived);
        assert_eq!(story.version, None);
    }

    #[test]
    fn builder_allows_setting_all_fields() {
        let story = StoryBuilder::new()
            .id(StoryId::new(7))
            .title("Trip")
            .happened_at(2000)
            .detail("two weeks in Kyoto")
            .tag_ids(vec![TagId::new(1), TagId::new(2)])
            .color("#f39800")
            .is_archived(true)
            .version(3)
            .create_at(1500)
            .updated_at(1800)
            .build();

        assert_eq!(story.id, Some(StoryId::new(7)));
        assert_eq!(story.tag_ids.len(), 2);
        assert_eq!(story.color, "#f39800");
        assert!(story.is_archived);
        assert_eq!(story.version, Some(3));
        assert_eq!(story.create_at, Some(1500));
        assert_eq!(story.updated_at, Some(1800));
    }

    #[test]
    #[should_panic(expected = "title is required")]
    fn builder_panics_without_title() {
        StoryBuilder::new().happened_at(1).build();
    }
}
