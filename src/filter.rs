//! Defines the [`TagFilterSet`] type, the facet filter applied to loaded
//! collections: the universe of tags is derived from the collection
//! itself, and a user-chosen subset of it selects which records a list
//! page shows.

use std::collections::BTreeSet;

/// Implemented by items that carry a set of tag strings.
pub trait Tagged {
    fn tags(&self) -> &[String];
}

/// The tag universe derived from one collection plus the active subset
/// used to filter that collection. An empty active subset means "no
/// filter": everything matches.
#[derive(Clone, Debug, Default)]
pub struct TagFilterSet {
    all_tags: BTreeSet<String>,
    active: BTreeSet<String>,
}

impl TagFilterSet {
    pub fn new() -> TagFilterSet {
        TagFilterSet::default()
    }

    /// Recomputes the tag universe as the deduplicated union of tags
    /// across `items`; item order is irrelevant and the operation is
    /// idempotent. The active subset is left alone: filters chosen before
    /// the source collection shrank may go stale, in which case they
    /// simply match nothing.
    pub fn recompute<T: Tagged>(&mut self, items: &[T]) {
        self.all_tags = items
            .iter()
            .flat_map(|item| item.tags().iter().cloned())
            .collect();
    }

    /// Adds `tag` to the active subset if absent, removes it otherwise.
    /// Toggling a tag outside the universe is legal and harmless.
    pub fn toggle(&mut self, tag: &str) {
        if !self.active.remove(tag) {
            self.active.insert(tag.to_owned());
        }
    }

    /// True when no filter is active, or when `item` carries at least one
    /// active tag.
    pub fn matches<T: Tagged>(&self, item: &T) -> bool {
        self.active.is_empty() || item.tags().iter().any(|tag| self.active.contains(tag))
    }

    /// Lazily filters `items` down to those that match, preserving their
    /// relative order.
    pub fn apply<'a, T: Tagged>(&'a self, items: &'a [T]) -> impl Iterator<Item = &'a T> {
        items.iter().filter(move |item| self.matches(*item))
    }

    /// The tag universe from the last [`TagFilterSet::recompute`].
    pub fn all_tags(&self) -> &BTreeSet<String> {
        &self.all_tags
    }

    /// The currently active filters.
    pub fn active(&self) -> &BTreeSet<String> {
        &self.active
    }
}

#[cfg(test)]
mod test {
    use super::*;

    struct Item {
        tags: Vec<String>,
    }

    impl Tagged for Item {
        fn tags(&self) -> &[String] {
            &self.tags
        }
    }

    fn item(tags: &[&str]) -> Item {
        Item {
            tags: tags.iter().map(|tag| String::from(*tag)).collect(),
        }
    }

    #[test]
    fn test_recompute_dedups_and_is_idempotent() {
        let items = vec![item(&["x", "y"]), item(&["y", "z"]), item(&[])];
        let mut filter = TagFilterSet::new();

        filter.recompute(&items);
        let first: Vec<&String> = filter.all_tags().iter().collect();
        assert_eq!(first, vec!["x", "y", "z"]);

        filter.recompute(&items);
        let second: Vec<&String> = filter.all_tags().iter().collect();
        assert_eq!(second, vec!["x", "y", "z"]);
    }

    #[test]
    fn test_empty_active_set_matches_everything() {
        let items = vec![item(&["x"]), item(&[])];
        let mut filter = TagFilterSet::new();
        filter.recompute(&items);

        for it in &items {
            assert!(filter.matches(it));
        }
        assert_eq!(filter.apply(&items).count(), 2);
    }

    #[test]
    fn test_toggle_narrows_and_widens() {
        let items = vec![item(&["x", "y"]), item(&["y", "z"])];
        let mut filter = TagFilterSet::new();
        filter.recompute(&items);

        filter.toggle("y");
        assert_eq!(filter.apply(&items).count(), 2);

        // Toggling "y" back off and "x" on leaves only the first item.
        filter.toggle("y");
        filter.toggle("x");
        let visible: Vec<&Item> = filter.apply(&items).collect();
        assert_eq!(visible.len(), 1);
        assert_eq!(visible[0].tags, vec!["x", "y"]);
    }

    #[test]
    fn test_matching_is_or_across_active_tags() {
        let items = vec![item(&["x"]), item(&["z"]), item(&["q"])];
        let mut filter = TagFilterSet::new();
        filter.recompute(&items);

        filter.toggle("x");
        filter.toggle("z");
        let visible: Vec<&Item> = filter.apply(&items).collect();
        assert_eq!(visible.len(), 2);
    }

    #[test]
    fn test_unknown_tag_toggle_is_harmless() {
        let items = vec![item(&["x"])];
        let mut filter = TagFilterSet::new();
        filter.recompute(&items);

        filter.toggle("nope");
        assert_eq!(filter.apply(&items).count(), 0);

        filter.toggle("nope");
        assert_eq!(filter.apply(&items).count(), 1);
    }

    #[test]
    fn test_stale_filters_survive_shrinking_source() {
        let mut items = vec![item(&["x", "y"]), item(&["z"])];
        let mut filter = TagFilterSet::new();
        filter.recompute(&items);
        filter.toggle("z");

        // The "z" record disappears from the source; the active filter
        // stays and now matches nothing.
        items.pop();
        filter.recompute(&items);
        assert!(!filter.all_tags().contains("z"));
        assert!(filter.active().contains("z"));
        assert_eq!(filter.apply(&items).count(), 0);
    }
}
