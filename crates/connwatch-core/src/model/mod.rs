// ── Domain model ──
//
// Canonical representations of the remote objects the replica mirrors:
// the global manager state, technologies, and services. Entries keep
// their raw property dictionaries (wire order preserved) and expose
// typed accessors for the properties the core itself branches on.

pub mod path;
pub mod service;
pub mod state;
pub mod technology;

// ── Re-exports ──────────────────────────────────────────────────────

pub use path::ObjectPath;
pub use service::{ServiceEntry, ServiceState};
pub use state::{GlobalState, SystemState};
pub use technology::TechnologyEntry;

/// An ordered property dictionary, as delivered on the wire.
pub use connwatch_bus::Properties as PropertyMap;
