// ── Service domain type ──

use serde::{Deserialize, Serialize};
use serde_json::Value;
use strum::{Display, EnumString};

use super::{ObjectPath, PropertyMap};

/// Connection state of a service, as reported by the remote service.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Display, EnumString, Serialize, Deserialize,
)]
#[strum(serialize_all = "lowercase")]
#[non_exhaustive]
pub enum ServiceState {
    Idle,
    Failure,
    Association,
    Configuration,
    Ready,
    Disconnect,
    Online,
}

impl ServiceState {
    /// Whether the service carries traffic (`ready` or `online`).
    pub fn is_connected(self) -> bool {
        matches!(self, Self::Ready | Self::Online)
    }
}

/// A connectable network known to the remote service.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ServiceEntry {
    path: ObjectPath,
    properties: PropertyMap,
}

impl ServiceEntry {
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

    /// The medium type this service runs over (`wifi`, `ethernet`, …).
    pub fn service_type(&self) -> Option<&str> {
        self.properties.get("Type")?.as_str()
    }

    /// The parsed connection state, if present and recognized.
    pub fn state(&self) -> Option<ServiceState> {
        self.properties.get("State")?.as_str()?.parse().ok()
    }

    /// Signal strength in percent, for wireless services.
    pub fn strength(&self) -> Option<u8> {
        let raw = self.properties.get("Strength")?.as_u64()?;
        u8::try_from(raw).ok()
    }

    pub fn is_connected(&self) -> bool {
        self.state().is_some_and(ServiceState::is_connected)
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

    /// Replace the whole property dictionary (manager-level upsert).
    pub(crate) fn replace_properties(&mut self, properties: PropertyMap) {
        self.properties = properties;
    }
}
