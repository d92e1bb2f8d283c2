// ── Generic keyed entry collection ──
//
// Ordered storage for one entry type, keyed by object path. Both patch
// flavors the remote service emits (manager-level list rewrites and
// per-object removals) reduce to upsert/remove-by-key on this type.

use indexmap::IndexMap;

use crate::model::ObjectPath;

/// Entries that identify themselves by object path.
pub(crate) trait Keyed {
    fn key(&self) -> &ObjectPath;
}

/// An ordered collection with at most one entry per object path.
///
/// Upserting an existing key keeps the entry's position; removal keeps
/// the relative order of the remaining entries.
#[derive(Debug, Clone)]
pub(crate) struct EntryCollection<T: Keyed> {
    entries: IndexMap<ObjectPath, T>,
}

impl<T: Keyed> EntryCollection<T> {
    pub(crate) fn new() -> Self {
        Self {
            entries: IndexMap::new(),
        }
    }

    /// Insert or replace an entry. Returns `true` if the key was new.
    pub(crate) fn upsert(&mut self, entry: T) -> bool {
        self.entries.insert(entry.key().clone(), entry).is_none()
    }

    /// Remove an entry by key, preserving the order of the remainder.
    pub(crate) fn remove(&mut self, key: &ObjectPath) -> Option<T> {
        self.entries.shift_remove(key)
    }

    pub(crate) fn get(&self, key: &ObjectPath) -> Option<&T> {
        self.entries.get(key)
    }

    pub(crate) fn get_mut(&mut self, key: &ObjectPath) -> Option<&mut T> {
        self.entries.get_mut(key)
    }

    pub(crate) fn contains(&self, key: &ObjectPath) -> bool {
        self.entries.contains_key(key)
    }

    pub(crate) fn iter(&self) -> impl Iterator<Item = &T> {
        self.entries.values()
    }

    pub(crate) fn len(&self) -> usize {
        self.entries.len()
    }

    #[allow(dead_code)]
    pub(crate) fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Replace the whole collection from a bulk snapshot.
    pub(crate) fn reload(&mut self, entries: impl IntoIterator<Item = T>) {
        self.entries.clear();
        for entry in entries {
            self.upsert(entry);
        }
    }
}

impl Keyed for crate::model::ServiceEntry {
    fn key(&self) -> &ObjectPath {
        self.path()
    }
}

impl Keyed for crate::model::TechnologyEntry {
    fn key(&self) -> &ObjectPath {
        self.path()
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use crate::model::{PropertyMap, ServiceEntry};
    use pretty_assertions::assert_eq;

    fn service(path: &str) -> ServiceEntry {
        ServiceEntry::new(path, PropertyMap::new())
    }

    fn paths(collection: &EntryCollection<ServiceEntry>) -> Vec<&str> {
        collection.iter().map(|e| e.path().as_str()).collect()
    }

    #[test]
    fn upsert_returns_true_for_new_key() {
        let mut col = EntryCollection::new();
        assert!(col.upsert(service("/s/a")));
        assert!(!col.upsert(service("/s/a")));
        assert_eq!(col.len(), 1);
    }

    #[test]
    fn upsert_keeps_position_of_existing_key() {
        let mut col = EntryCollection::new();
        col.upsert(service("/s/a"));
        col.upsert(service("/s/b"));
        col.upsert(service("/s/c"));

        col.upsert(service("/s/b"));
        assert_eq!(paths(&col), ["/s/a", "/s/b", "/s/c"]);
    }

    #[test]
    fn remove_preserves_relative_order() {
        let mut col = EntryCollection::new();
        for path in ["/s/a", "/s/b", "/s/c", "/s/d"] {
            col.upsert(service(path));
        }

        assert!(col.remove(&ObjectPath::new("/s/b")).is_some());
        assert_eq!(paths(&col), ["/s/a", "/s/c", "/s/d"]);
    }

    #[test]
    fn remove_missing_key_is_a_no_op() {
        let mut col = EntryCollection::new();
        col.upsert(service("/s/a"));

        assert!(col.remove(&ObjectPath::new("/s/zzz")).is_none());
        assert_eq!(paths(&col), ["/s/a"]);
    }

    #[test]
    fn reload_replaces_contents() {
        let mut col = EntryCollection::new();
        col.upsert(service("/s/old"));

        col.reload([service("/s/a"), service("/s/b")]);
        assert_eq!(paths(&col), ["/s/a", "/s/b"]);
        assert!(!col.contains(&ObjectPath::new("/s/old")));
    }

    #[test]
    fn reload_deduplicates_by_key() {
        let mut col = EntryCollection::new();
        col.reload([service("/s/a"), service("/s/a"), service("/s/b")]);
        assert_eq!(col.len(), 2);
    }
}
