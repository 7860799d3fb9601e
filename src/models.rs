mod ids;
mod settings;
mod story;
mod tag;

pub use ids::{StoryId, TagId};
pub use settings::{Language, Settings, Theme};
pub use story::{Story, StoryBuilder};
pub use tag::Tag;
