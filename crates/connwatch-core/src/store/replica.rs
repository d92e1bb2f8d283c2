// ── The in-memory replica ──
//
// Local mirror of the remote service's exposed state: the global state
// dictionary plus the technology and service collections. Owned
// exclusively by the session's single control flow; populated by the
// initialization fetches and mutated only through the patch operations
// below. Every patch either fully applies or leaves the replica
// untouched.

use chrono::{DateTime, Utc};
use serde_json::Value;

use connwatch_bus::ObjectRecord;

use super::collection::EntryCollection;
use crate::model::{GlobalState, ObjectPath, PropertyMap, ServiceEntry, TechnologyEntry};

/// The local mirror of remote state.
#[derive(Debug, Clone)]
pub struct Replica {
    state: GlobalState,
    technologies: EntryCollection<TechnologyEntry>,
    services: EntryCollection<ServiceEntry>,
    last_loaded: Option<DateTime<Utc>>,
    last_patch: Option<DateTime<Utc>>,
}

impl Replica {
    pub(crate) fn new() -> Self {
        Self {
            state: GlobalState::default(),
            technologies: EntryCollection::new(),
            services: EntryCollection::new(),
            last_loaded: None,
            last_patch: None,
        }
    }

    // ── Bulk loads (initialization) ──────────────────────────────────

    pub(crate) fn load_state(&mut self, properties: PropertyMap) {
        self.state = GlobalState::from_properties(properties);
        self.last_loaded = Some(Utc::now());
    }

    pub(crate) fn load_technologies(&mut self, records: Vec<ObjectRecord>) {
        self.technologies
            .reload(records.into_iter().map(TechnologyEntry::from));
        self.last_loaded = Some(Utc::now());
    }

    pub(crate) fn load_services(&mut self, records: Vec<ObjectRecord>) {
        self.services
            .reload(records.into_iter().map(ServiceEntry::from));
        self.last_loaded = Some(Utc::now());
    }

    // ── Read access ──────────────────────────────────────────────────

    pub fn global_state(&self) -> &GlobalState {
        &self.state
    }

    pub fn technology(&self, path: &ObjectPath) -> Option<&TechnologyEntry> {
        self.technologies.get(path)
    }

    pub fn service(&self, path: &ObjectPath) -> Option<&ServiceEntry> {
        self.services.get(path)
    }

    pub fn has_service(&self, path: &ObjectPath) -> bool {
        self.services.contains(path)
    }

    pub fn technologies(&self) -> impl Iterator<Item = &TechnologyEntry> {
        self.technologies.iter()
    }

    pub fn services(&self) -> impl Iterator<Item = &ServiceEntry> {
        self.services.iter()
    }

    pub fn technology_count(&self) -> usize {
        self.technologies.len()
    }

    pub fn service_count(&self) -> usize {
        self.services.len()
    }

    /// Services running over `technology_type`, optionally narrowed to
    /// the ones currently carrying traffic.
    pub fn services_matching(
        &self,
        technology_type: &str,
        connected_only: bool,
    ) -> Vec<&ServiceEntry> {
        self.services
            .iter()
            .filter(|s| s.service_type() == Some(technology_type))
            .filter(|s| !connected_only || s.is_connected())
            .collect()
    }

    // ── Patch operations (notification reactor) ──────────────────────

    /// Replace one property of a service in place. No-op when the service
    /// or the property is unknown; returns whether the patch applied.
    pub(crate) fn patch_service_property(
        &mut self,
        path: &ObjectPath,
        name: &str,
        value: Value,
    ) -> bool {
        let applied = self
            .services
            .get_mut(path)
            .is_some_and(|s| s.replace_property(name, value));
        if applied {
            self.touch();
        }
        applied
    }

    /// Replace one property of a technology in place. Same no-op rules as
    /// [`patch_service_property`](Self::patch_service_property).
    pub(crate) fn patch_technology_property(
        &mut self,
        path: &ObjectPath,
        name: &str,
        value: Value,
    ) -> bool {
        let applied = self
            .technologies
            .get_mut(path)
            .is_some_and(|t| t.replace_property(name, value));
        if applied {
            self.touch();
        }
        applied
    }

    /// Replace a global-state property unconditionally, adding it if
    /// absent.
    pub(crate) fn set_global_property(&mut self, name: &str, value: Value) {
        self.state.set(name, value);
        self.touch();
    }

    /// Upsert a service: replace its properties in place if the path is
    /// known, append otherwise.
    pub(crate) fn upsert_service(&mut self, path: ObjectPath, properties: PropertyMap) {
        match self.services.get_mut(&path) {
            Some(existing) => existing.replace_properties(properties),
            None => {
                self.services.upsert(ServiceEntry::new(path, properties));
            }
        }
        self.touch();
    }

    /// Remove a service by path. Returns whether it was present.
    pub(crate) fn remove_service(&mut self, path: &ObjectPath) -> bool {
        let removed = self.services.remove(path).is_some();
        if removed {
            self.touch();
        }
        removed
    }

    /// Upsert a technology entry.
    pub(crate) fn upsert_technology(&mut self, path: ObjectPath, properties: PropertyMap) {
        self.technologies
            .upsert(TechnologyEntry::new(path, properties));
        self.touch();
    }

    /// Remove a technology by path, preserving the order of the rest.
    /// Returns whether it was present.
    pub(crate) fn remove_technology(&mut self, path: &ObjectPath) -> bool {
        let removed = self.technologies.remove(path).is_some();
        if removed {
            self.touch();
        }
        removed
    }

    // ── Bookkeeping ──────────────────────────────────────────────────

    /// When the last bulk snapshot was loaded, if ever.
    pub fn last_loaded(&self) -> Option<DateTime<Utc>> {
        self.last_loaded
    }

    /// When the last notification patch applied, if any.
    pub fn last_patch(&self) -> Option<DateTime<Utc>> {
        self.last_patch
    }

    /// How long ago the replica last changed, by load or by patch.
    pub fn data_age(&self) -> Option<chrono::Duration> {
        let newest = match (self.last_loaded, self.last_patch) {
            (Some(l), Some(p)) => Some(l.max(p)),
            (l, p) => l.or(p),
        };
        newest.map(|t| Utc::now() - t)
    }

    fn touch(&mut self) {
        self.last_patch = Some(Utc::now());
    }
}
