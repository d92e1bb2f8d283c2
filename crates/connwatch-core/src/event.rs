// ── Normalized session events ──
//
// What subscribers receive after the reactor patched the replica. These
// describe the change that actually applied -- notifications that were
// no-ops (unknown entry, unknown property) produce no event.

use serde::Serialize;
use serde_json::Value;

use connwatch_bus::Category;

use crate::model::ObjectPath;

/// An event broadcast to session subscribers.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub enum SessionEvent {
    /// The replica changed in response to a remote notification.
    Change(ChangeEvent),
    /// The remote service asked for interactive credentials; this core
    /// does not implement an agent and rejected the request.
    AgentRequestRejected,
}

/// A single applied replica patch.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub enum ChangeEvent {
    /// A global-state property was set.
    GlobalProperty { name: String, value: Value },
    /// A property of an existing service was replaced.
    ServiceProperty {
        path: ObjectPath,
        name: String,
        value: Value,
    },
    /// A property of an existing technology was replaced.
    TechnologyProperty {
        path: ObjectPath,
        name: String,
        value: Value,
    },
    /// The service list was rewritten; both lists hold the identifiers
    /// that actually changed.
    ServicesUpdated {
        added: Vec<ObjectPath>,
        removed: Vec<ObjectPath>,
    },
    /// A technology appeared.
    TechnologyAdded { path: ObjectPath },
    /// A technology disappeared.
    TechnologyRemoved { path: ObjectPath },
}

impl ChangeEvent {
    /// The notification category this change originated from, used to
    /// filter forwarding by subscriber interest.
    pub fn category(&self) -> Category {
        match self {
            Self::ServiceProperty { .. } => Category::Service,
            Self::TechnologyProperty { .. } => Category::Technology,
            Self::GlobalProperty { .. }
            | Self::ServicesUpdated { .. }
            | Self::TechnologyAdded { .. }
            | Self::TechnologyRemoved { .. } => Category::Manager,
        }
    }
}
