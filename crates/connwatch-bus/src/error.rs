// ── Transport-side error contract ──
//
// Errors a bus binding may hand back to the core. The core translates
// these into its own taxonomy (`CoreError`) at the crate seam; consumers
// of connwatch-core never match on `BusError` directly.

use thiserror::Error;

/// Errors produced by a bus binding.
#[derive(Debug, Error)]
pub enum BusError {
    /// The bus itself could not be reached or the connection was lost
    /// mid-flight. Fatal to the core's run loop.
    #[error("Cannot reach the connection manager: {reason}")]
    Connection { reason: String },

    /// The remote service rejected a method call (e.g. connect refused,
    /// operation already in progress).
    #[error("Method call {method} failed: {message}")]
    Call { method: String, message: String },

    /// The notification channel closed: the binding shut down or the
    /// remote service went away.
    #[error("Bus connection closed")]
    Disconnected,

    /// The signal subscription was refused.
    #[error("Subscription rejected: {reason}")]
    Subscription { reason: String },

    /// The binding delivered a payload that does not match the wire
    /// contract. Indicates a broken binding, not a recoverable condition.
    #[error("Malformed payload from the bus binding: {context}")]
    Payload { context: String },
}
