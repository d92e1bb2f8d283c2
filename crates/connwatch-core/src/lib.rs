// connwatch-core: reactive replica and command layer for the ConnMan
// connection manager. Consumers (CLI/TUI) drive a `Session` over a
// `RemoteBinding` and observe state through the replica and the event
// stream.

pub mod command;
pub mod config;
mod convert;
pub mod error;
pub mod event;
pub mod model;
mod multiplex;
mod reactor;
pub mod session;
pub mod store;
pub mod stream;

// ── Primary re-exports ──────────────────────────────────────────────
pub use command::{Command, CommandRequest, Reply};
pub use config::{NotifyInterest, SessionConfig};
pub use error::CoreError;
pub use event::{ChangeEvent, SessionEvent};
pub use session::{InitPhase, Session, SessionHandle};
pub use store::Replica;
pub use stream::EventStream;

// Re-export model types at the crate root for ergonomics.
pub use model::{
    GlobalState, ObjectPath, PropertyMap, ServiceEntry, ServiceState, SystemState, TechnologyEntry,
};

// The wire contract, re-exported so embedders depend on one crate.
pub use connwatch_bus as bus;
