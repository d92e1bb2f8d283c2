// ── Global manager state ──

use serde::{Deserialize, Serialize};
use serde_json::Value;
use strum::{Display, EnumString};

use super::PropertyMap;

/// Overall operational state reported by the remote service.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Display, EnumString, Serialize, Deserialize,
)]
#[strum(serialize_all = "lowercase")]
#[non_exhaustive]
pub enum SystemState {
    Offline,
    Idle,
    Ready,
    Online,
}

/// The singleton global-state root of the replica.
///
/// A flat property dictionary (`State`, `OfflineMode`, `SessionMode`, …).
/// Populated wholesale at initialization, then only ever patched
/// field-by-field from manager-level `PropertyChanged` notifications.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(transparent)]
pub struct GlobalState {
    properties: PropertyMap,
}

impl GlobalState {
    pub(crate) fn from_properties(properties: PropertyMap) -> Self {
        Self { properties }
    }

    pub fn get(&self, name: &str) -> Option<&Value> {
        self.properties.get(name)
    }

    pub fn properties(&self) -> &PropertyMap {
        &self.properties
    }

    /// The parsed operational state, if present and recognized.
    pub fn system_state(&self) -> Option<SystemState> {
        self.get("State")?.as_str()?.parse().ok()
    }

    pub fn offline_mode(&self) -> bool {
        self.get("OfflineMode").and_then(Value::as_bool) == Some(true)
    }

    /// Replace a property unconditionally, adding it if absent.
    pub(crate) fn set(&mut self, name: impl Into<String>, value: Value) {
        self.properties.insert(name.into(), value);
    }
}
