// ── Technology domain type ──

use serde::Serialize;
use serde_json::Value;

use super::{ObjectPath, PropertyMap};

/// A connection medium exposed by the remote service (wifi, ethernet,
/// bluetooth, …).
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct TechnologyEntry {
    path: ObjectPath,
    properties: PropertyMap,
}

impl TechnologyEntry {
    pub fn new(path: impl Into<ObjectPath>, properties: PropertyMap) -> Self {
        Self {
            path: path.into(),
            properties,
        }
    }

    pub fn path(&self) -> &ObjectPath {
        &self.path
    }

    pub fn properties(&self) -> &PropertyMap {
        &self.properties
    }

    pub fn name(&self) -> Option<&str> {
        self.properties.get("Name")?.as_str()
    }

    /// The medium type (`wifi`, `ethernet`, …) services are matched on.
    pub fn technology_type(&self) -> Option<&str> {
        self.properties.get("Type")?.as_str()
    }

    pub fn powered(&self) -> bool {
        self.flag("Powered")
    }

    pub fn connected(&self) -> bool {
        self.flag("Connected")
    }

    pub fn tethering(&self) -> bool {
        self.flag("Tethering")
    }

    fn flag(&self, name: &str) -> bool {
        self.properties.get(name).and_then(Value::as_bool) == Some(true)
    }

    /// Replace a property in place. Unknown properties are not introduced
    /// through this path; returns whether the patch applied.
    pub(crate) fn replace_property(&mut self, name: &str, value: Value) -> bool {
        match self.properties.get_mut(name) {
            Some(slot) => {
                *slot = value;
                true
            }
            None => false,
        }
    }
}
