// ── Wire record types ──
//
// Everything the binding delivers to the core is one of these shapes.
// Property dictionaries keep their wire order (`IndexMap`) so consumers
// can display them stably.

use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use strum::{AsRefStr, Display, EnumString};

/// An ordered property dictionary as it appears on the wire.
pub type Properties = IndexMap<String, Value>;

/// Object categories the remote service exposes signals for.
///
/// `Manager` covers service-list and global-state changes, `Technology`
/// and `Service` cover per-object property changes.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, Display, EnumString, AsRefStr, Serialize, Deserialize,
)]
pub enum Category {
    Manager,
    Technology,
    Service,
}

/// An unsolicited change notification from the remote service.
///
/// `interface` is kept as a raw string: bindings may forward signals from
/// interfaces the core does not track (e.g. `Agent`), and the core decides
/// how to react. `path` is the originating object path, usually the tail
/// relative to the service namespace.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NotificationRecord {
    pub interface: String,
    #[serde(default)]
    pub path: String,
    pub signal: String,
    #[serde(default)]
    pub data: Option<Value>,
}

/// A remote object as returned by the bulk fetches: its stable object
/// path plus its property dictionary.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ObjectRecord {
    pub path: String,
    pub properties: Properties,
}

impl ObjectRecord {
    pub fn new(path: impl Into<String>, properties: Properties) -> Self {
        Self {
            path: path.into(),
            properties,
        }
    }
}
