use crate::cache::{StoryCache, TagCache};
use crate::i18n::Messages;
use crate::models::{Story, StoryId, Tag, TagId, Theme};
use crate::query::StoryQuery;

/// Application state for the terminal timeline.
///
/// All story and tag reads go through the normalized caches; the panels
/// never touch the database directly. `timeline` keeps the ids of loaded
/// stories in query order, since the cache itself makes no ordering
/// promise.
#[derive(Debug, Clone)]
pub struct App {
    stories: StoryCache,
    tags: TagCache,
    /// Loaded story ids in query order (the cache is unordered).
    timeline: Vec<StoryId>,
    /// Total matching rows for the current criteria, from `count`.
    total_count: u64,
    /// Criteria driving pagination.
    query: StoryQuery,
    selected_index: Option<usize>,
    filter_input: String,
    focus: Focus,
    detail_scroll: u16,
    load_more_requested: bool,
    messages: &'static Messages,
    theme: Theme,
}

/// Panel focus state for keyboard navigation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Focus {
    /// Filter bar is focused (typing narrows the visible stories)
    FilterInput,
    /// Story list is focused (j/k navigation, m loads the next page)
    StoryList,
    /// Detail panel is focused (j/k scrolls)
    DetailView,
}

impl App {
    /// Creates a new App with empty caches, the given locale, and the
    /// stored display theme.
    pub fn new(messages: &'static Messages, theme: Theme) -> Self {
        Self {
            stories: StoryCache::new(),
            tags: TagCache::new(),
            timeline: Vec::new(),
            total_count: 0,
            query: StoryQuery::default(),
            selected_index: None,
            filter_input: String::new(),
            focus: Focus::FilterInput,
            detail_scroll: 0,
            load_more_requested: false,
            messages,
            theme,
        }
    }

    /// Returns the locale catalog for the chrome.
    pub fn messages(&self) -> &'static Messages {
        self.messages
    }

    /// Returns the display theme the panels render with.
    pub fn theme(&self) -> Theme {
        self.theme
    }

    /// Returns the criteria driving pagination.
    pub fn query(&self) -> &StoryQuery {
        &self.query
    }

    /// Merges one fetched page into the cache and the ordered timeline.
    pub fn apply_page(&mut self, page: Vec<Story>) {
        for story in page {
            if let Some(id) = story.id {
                if !self.timeline.contains(&id) {
                    self.timeline.push(id);
                }
                self.stories.upsert_one(story);
            }
        }
    }

    /// Replaces the tag cache with a bulk-fetch result.
    pub fn apply_tags(&mut self, tags: Vec<Tag>) {
        self.tags.upsert_many(tags);
    }

    /// Records the matching-row total from the count query.
    pub fn set_total_count(&mut self, total: u64) {
        self.total_count = total;
    }

    /// Number of stories loaded so far.
    pub fn loaded_count(&self) -> u64 {
        self.timeline.len() as u64
    }

    /// Total matching rows for the current criteria.
    pub fn total_count(&self) -> u64 {
        self.total_count
    }

    /// Whether more pages remain on the timeline.
    pub fn has_more(&self) -> bool {
        self.loaded_count() < self.total_count
    }

    /// Marks that the user asked for the next page. The event loop owns
    /// the service handle and performs the fetch.
    pub fn request_load_more(&mut self) {
        if self.has_more() {
            self.load_more_requested = true;
        }
    }

    /// Consumes a pending load-more request.
    pub fn take_load_more_request(&mut self) -> bool {
        std::mem::take(&mut self.load_more_requested)
    }

    /// Loaded stories in timeline order, narrowed by the filter input.
    ///
    /// Resolves ids through the story cache; an id whose entity was
    /// evicted is skipped rather than rendered stale.
    pub fn visible_stories(&self) -> Vec<&Story> {
        let needle = self.filter_input.to_lowercase();
        self.timeline
            .iter()
            .filter_map(|id| self.stories.select_by_id(*id))
            .filter(|story| {
                needle.is_empty()
                    || story.title.to_lowercase().contains(&needle)
                    || story.detail.to_lowercase().contains(&needle)
            })
            .collect()
    }

    /// Returns the currently selected story, if any.
    pub fn selected_story(&self) -> Option<&Story> {
        let visible = self.visible_stories();
        self.selected_index.and_then(move |i| visible.into_iter().nth(i))
    }

    /// Display name for a tag id, through the tag cache.
    ///
    /// Dangling references resolve to the localized "tag not found"
    /// placeholder, never an error.
    pub fn tag_label(&self, id: TagId) -> String {
        match self.tags.select_by_id(id) {
            Some(tag) => tag.name.clone(),
            None => format!("#{} ({})", id, self.messages.missing_tag),
        }
    }

    pub fn selected_index(&self) -> Option<usize> {
        self.selected_index
    }

    pub fn filter_input(&self) -> &str {
        &self.filter_input
    }

    pub fn focus(&self) -> Focus {
        self.focus
    }

    pub fn detail_scroll(&self) -> u16 {
        self.detail_scroll
    }

    /// Appends a character to the filter and resets the selection.
    pub fn push_filter_char(&mut self, c: char) {
        self.filter_input.push(c);
        self.selected_index = None;
    }

    /// Removes the last filter character and resets the selection.
    pub fn pop_filter_char(&mut self) {
        self.filter_input.pop();
        self.selected_index = None;
    }

    /// Cycles focus: FilterInput -> StoryList -> DetailView -> FilterInput.
    pub fn next_focus(&mut self) {
        self.focus = match self.focus {
            Focus::FilterInput => Focus::StoryList,
            Focus::StoryList => Focus::DetailView,
            Focus::DetailView => Focus::FilterInput,
        };
        self.auto_select_on_list_focus();
    }

    /// Cycles focus in reverse Tab order.
    pub fn prev_focus(&mut self) {
        self.focus = match self.focus {
            Focus::FilterInput => Focus::DetailView,
            Focus::StoryList => Focus::FilterInput,
            Focus::DetailView => Focus::StoryList,
        };
        self.auto_select_on_list_focus();
    }

    /// Returns focus to the filter bar.
    pub fn reset_focus(&mut self) {
        self.focus = Focus::FilterInput;
    }

    /// Clears the current selection and detail scroll.
    pub fn clear_selection(&mut self) {
        self.selected_index = None;
        self.detail_scroll = 0;
    }

    /// Moves the selection down, clamping at the last visible story.
    pub fn select_next(&mut self) {
        let len = self.visible_stories().len();
        if len == 0 {
            self.selected_index = None;
            return;
        }
        self.selected_index = Some(match self.selected_index {
            None => 0,
            Some(i) => (i + 1).min(len - 1),
        });
        self.detail_scroll = 0;
    }

    /// Moves the selection up, clamping at the first visible story.
    pub fn select_previous(&mut self) {
        let len = self.visible_stories().len();
        if len == 0 {
            self.selected_index = None;
            return;
        }
        self.selected_index = Some(match self.selected_index {
            None => 0,
            Some(i) => i.saturating_sub(1),
        });
        self.detail_scroll = 0;
    }

    pub fn scroll_detail_down(&mut self, lines: u16) {
        self.detail_scroll = self.detail_scroll.saturating_add(lines);
    }

    pub fn scroll_detail_up(&mut self, lines: u16) {
        self.detail_scroll = self.detail_scroll.saturating_sub(lines);
    }

    /// Entering the list with nothing selected selects the first story.
    fn auto_select_on_list_focus(&mut self) {
        if self.focus == Focus::StoryList
            && self.selected_index.is_none()
            && !self.visible_stories().is_empty()
        {
            self.selected_index = Some(0);
        }
    }
}
