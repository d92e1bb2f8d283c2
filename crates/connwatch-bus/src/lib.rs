// connwatch-bus: the wire contract between connwatch-core and the bus binding.
//
// The actual D-Bus plumbing lives in a separate binding crate. This crate
// only defines what crosses the seam: the record types the binding delivers,
// the categories the core can subscribe to, the `RemoteBinding` trait the
// core is generic over, and the transport-side error type.

pub mod binding;
pub mod error;
pub mod record;

// ── Primary re-exports ──────────────────────────────────────────────
pub use binding::RemoteBinding;
pub use error::BusError;
pub use record::{Category, NotificationRecord, ObjectRecord, Properties};
