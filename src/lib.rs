pub mod cache;
pub mod db;
pub mod error;
pub mod i18n;
pub mod models;
pub mod query;
pub mod service;
pub mod tui;
pub mod utils;

pub use cache::{EntityCache, Keyed, StoryCache, TagCache};
pub use db::Database;
pub use error::{RepoError, RepoResult};
pub use models::{Language, Settings, Story, StoryBuilder, StoryId, Tag, TagId, Theme};
pub use query::{SortOrder, StoryQuery};
pub use service::JournalService;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn database_accessible_from_crate_root() {
        let db = Database::in_memory();
        assert!(db.is_ok());
    }

    #[test]
    fn types_accessible_from_crate_root() {
        let story = StoryBuilder::new().title("first").happened_at(1).build();
        assert_eq!(story.title, "first");

        let tag = Tag::new("Work");
        assert_eq!(tag.name, "Work");

        let settings = Settings::default();
        assert_eq!(settings.lang, Language::En);
    }
}
