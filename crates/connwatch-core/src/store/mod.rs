// ── Replica storage ──
//
// Keyed ordered collections plus the replica aggregate built on them.

mod collection;
mod replica;

pub use replica::Replica;
