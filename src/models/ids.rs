use serde::{Deserialize, Serialize};
use std::fmt;

/// Unique identifier for a story.
///
/// Wraps the store-assigned row id to prevent accidental mixing of
/// different id types.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct StoryId(i64);

impl StoryId {
    /// Creates a new story id.
    pub fn new(id: i64) -> Self {
        Self(id)
    }

    /// Returns the underlying id value.
    pub fn get(self) -> i64 {
        self.0
    }
}

impl fmt::Display for StoryId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Unique identifier for a tag.
///
/// Wraps the store-assigned row id to prevent accidental mixing of
/// different id types.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct TagId(i64);

impl TagId {
    /// Creates a new tag id.
    pub fn new(id: i64) -> Self {
        Self(id)
    }

    /// Returns the underlying id value.
    pub fn get(self) -> i64 {
        self.0
    }
}

impl fmt::Display for TagId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn story_id_serializes_as_raw_integer() {
        let id = StoryId::new(42);
        let json = serde_json::to_string(&id).unwrap();
        assert_eq!(json, "42");

        let deserialized: StoryId = serde_json::from_str(&json).unwrap();
        assert_eq!(deserialized, id);
    }

    #[test]
    fn tag_id_serializes_as_raw_integer() {
        let id = TagId::new(99);
        let json = serde_json::to_string(&id).unwrap();
        assert_eq!(json, "99");

        let deserialized: TagId = serde_json::from_str(&json).unwrap();
        assert_eq!(deserialized, id);
    }

    #[test]
    fn ids_are_not_interchangeable() {
        // These lines would fail to compile:
        // let story_id: StoryId = TagId::new(1);
        // let tag_id: TagId = StoryId::new(1);

        let story_id = StoryId::new(1);
        let tag_id = TagId::new(1);

        // Same underlying value, but different types
        assert_eq!(story_id.get(), tag_id.get());
    }
}
