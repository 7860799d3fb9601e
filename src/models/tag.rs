use serde::{Deserialize, Serialize};

use super::TagId;

/// A named, colored label attachable to many stories.
///
/// Tag names are unique; the store enforces this with a unique index and a
/// second insert of the same name fails with a persistence error.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Tag {
    /// Store-assigned identifier, absent before first insert.
    pub id: Option<TagId>,
    /// Unique display name.
    pub name: String,
    /// Freeform description.
    pub description: String,
    /// Display color.
    pub color: String,
    /// Optimistic-concurrency stamp; 1 on insert, strictly increasing.
    pub version: Option<u32>,
    /// When the row was first inserted, Unix milliseconds.
    pub create_at: Option<i64>,
    /// When the row was last written, Unix milliseconds.
    pub updated_at: Option<i64>,
}

impl Tag {
    /// Creates an unsaved tag with the given name.
    ///
    /// # Examples
    ///
    /// ```
    /// use chronicle::Tag;
    ///
    /// let tag = Tag::new("Work");
    /// assert_eq!(tag.name, "Work");
    /// assert!(tag.id.is_none());
    /// ```
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            id: None,
            name: name.into(),
            description: String::new(),
            color: String::new(),
            version: None,
            create_at: None,
            updated_at: None,
        }
    }

    /// Sets the description, builder-style.
    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = description.into();
        self
    }

    /// Sets the color, builder-style.
    pub fn with_color(mut self, color: impl Into<String>) -> Self {
        self.color = color.into();
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn new_creates_unsaved_tag() {
        let tag = Tag::new("Travel");

        assert_eq!(tag.id, None);
        assert_eq!(tag.name, "Travel");
        assert_eq!(tag.description, "");
        assert_eq!(tag.version, None);
    }

    #[test]
    fn with_methods_fill_optional_fields() {
        let tag = Tag::new("Work")
            .with_description("everything office")
            .with_color("#44617b");

        assert_eq!(tag.description, "everything office");
        assert_eq!(tag.color, "#44617b");
    }
}
