//! Cache Key Module
//!
//! Builds cache keys from a route tag and resolved request parameters.

use std::fmt::Display;

// == Cache Key Builder ==
/// Builder for `_`-joined cache keys.
///
/// Values passed to [`CacheKey::part`] must already have their defaults
/// applied, so an omitted parameter and an explicit default produce the same
/// key. [`CacheKey::labelled`] is for parameters without a default: the
/// segment is appended only when a value is present, prefixed by its label.
#[derive(Debug, Clone)]
pub struct CacheKey {
    segments: Vec<String>,
}

impl CacheKey {
    // == Constructor ==
    /// Starts a key with the route tag (e.g. `headlines`).
    pub fn new(tag: &str) -> Self {
        Self {
            segments: vec![tag.to_string()],
        }
    }

    // == Part ==
    /// Appends a resolved parameter value.
    pub fn part(mut self, value: impl Display) -> Self {
        self.segments.push(value.to_string());
        self
    }

    // == Labelled ==
    /// Appends `{label}{value}` when `value` is present.
    pub fn labelled<T: Display>(mut self, label: &str, value: Option<T>) -> Self {
        if let Some(value) = value {
            self.segments.push(format!("{}{}", label, value));
        }
        self
    }

    // == Build ==
    /// Returns the finished key.
    pub fn build(self) -> String {
        self.segments.join("_")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_tag_only() {
        assert_eq!(CacheKey::new("sources").build(), "sources");
    }

    #[test]
    fn test_parts_joined_in_order() {
        let key = CacheKey::new("headlines")
            .part("general")
            .part("us")
            .part(1)
            .part(20)
            .build();
        assert_eq!(key, "headlines_general_us_1_20");
    }

    #[test]
    fn test_labelled_skipped_when_absent() {
        let key = CacheKey::new("search")
            .part("rust")
            .labelled("from", None::<&str>)
            .labelled("to", Some("2024-02-01"))
            .build();
        assert_eq!(key, "search_rust_to2024-02-01");
    }

    #[test]
    fn test_labels_keep_from_and_to_apart() {
        let only_from = CacheKey::new("search")
            .labelled("from", Some("2024-01-01"))
            .labelled("to", None::<&str>)
            .build();
        let only_to = CacheKey::new("search")
            .labelled("from", None::<&str>)
            .labelled("to", Some("2024-01-01"))
            .build();
        assert_ne!(only_from, only_to);
    }
}
