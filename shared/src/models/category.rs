//! Category models

use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Label used wherever an item has no category
pub const NO_CATEGORY_LABEL: &str = "(None)";

/// Image content types accepted for category pictures
pub const CATEGORY_IMAGE_TYPES: [&str; 3] = ["image/png", "image/jpg", "image/jpeg"];

/// Largest accepted category picture, in bytes
pub const CATEGORY_IMAGE_MAX_BYTES: usize = 1_000_000;

/// A grouping of items (e.g. "Dairy", "Syrups")
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Category {
    pub id: Uuid,
    pub name: String,
    pub description: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub image: Option<CategoryImage>,
}

/// Picture attached to a category. The bytes are served by a dedicated endpoint.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct CategoryImage {
    pub content_type: String,
    #[serde(skip)]
    pub data: Vec<u8>,
}

impl Category {
    pub fn new(name: impl Into<String>, description: impl Into<String>) -> Self {
        Self {
            id: Uuid::new_v4(),
            name: name.into(),
            description: description.into(),
            image: None,
        }
    }
}

/// Sort key for an optional category name: named categories first, by name,
/// then uncategorised items
pub fn category_sort_key(name: Option<&str>) -> (bool, String) {
    match name {
        Some(name) => (false, name.to_lowercase()),
        None => (true, String::new()),
    }
}

/// Display label for an optional category name
pub fn category_label(name: Option<&str>) -> &str {
    name.unwrap_or(NO_CATEGORY_LABEL)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_uncategorised_sorts_last() {
        let mut keys = vec![
            category_sort_key(None),
            category_sort_key(Some("Syrups")),
            category_sort_key(Some("dairy")),
        ];
        keys.sort();

        assert_eq!(keys[0], category_sort_key(Some("dairy")));
        assert_eq!(keys[1], category_sort_key(Some("Syrups")));
        assert_eq!(keys[2], category_sort_key(None));
    }

    #[test]
    fn test_category_label() {
        assert_eq!(category_label(None), "(None)");
        assert_eq!(category_label(Some("Dairy")), "Dairy");
    }
}
