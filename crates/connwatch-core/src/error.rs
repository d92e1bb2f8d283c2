// ── Core error types ──
//
// User-facing errors from connwatch-core. Consumers never see raw bus
// errors for command failures -- the `From<BusError>` impl translates
// transport-layer errors into domain-appropriate variants. Each variant
// has a stable negative code for callers that speak the numeric
// status convention (0 = success).

use thiserror::Error;

use connwatch_bus::BusError;

/// Unified error type for the core crate.
#[derive(Debug, Error)]
pub enum CoreError {
    // ── Request errors ───────────────────────────────────────────────
    /// The command name is not in the registry.
    #[error("Unknown command: {name}")]
    InvalidCommand { name: String },

    /// The command payload failed trusted-schema validation.
    #[error("Invalid command data: {reason}")]
    InvalidArgument { reason: String },

    /// A referenced technology or service is absent from the replica.
    #[error("{kind} not found: {identifier}")]
    NotFound {
        kind: &'static str,
        identifier: String,
    },

    /// Capability intentionally unsupported (e.g. agent-driven auth).
    #[error("Not implemented: {operation}")]
    NotImplemented { operation: &'static str },

    // ── Remote errors ────────────────────────────────────────────────
    /// The remote service rejected a method call.
    #[error("Remote call {method} rejected: {message}")]
    Rejected { method: String, message: String },

    /// Transport-level failure. Fatal to the run loop; the owner decides
    /// whether it is fatal to the process.
    #[error("Transport failure: {0}")]
    Transport(#[source] BusError),

    /// A notification or response does not match the remote contract.
    #[error("Protocol violation: {context}")]
    ProtocolViolation { context: String },

    // ── Internal errors ──────────────────────────────────────────────
    #[error("Internal error: {0}")]
    Internal(String),
}

impl CoreError {
    /// Stable negative status code for this error. Success is 0 by
    /// convention; `InvalidCommand` and `InvalidArgument` are distinct.
    pub fn code(&self) -> i32 {
        match self {
            Self::InvalidCommand { .. } => -1,
            Self::InvalidArgument { .. } => -2,
            Self::NotFound { .. } => -3,
            Self::NotImplemented { .. } => -4,
            Self::Rejected { .. } => -5,
            Self::Transport(_) => -6,
            Self::ProtocolViolation { .. } => -7,
            Self::Internal(_) => -8,
        }
    }

    pub(crate) fn protocol(context: impl Into<String>) -> Self {
        Self::ProtocolViolation {
            context: context.into(),
        }
    }
}

// ── Conversion from transport-layer errors ───────────────────────────

impl From<BusError> for CoreError {
    fn from(err: BusError) -> Self {
        match err {
            BusError::Call { method, message } => CoreError::Rejected { method, message },
            BusError::Payload { context } => CoreError::ProtocolViolation { context },
            e @ (BusError::Connection { .. }
            | BusError::Disconnected
            | BusError::Subscription { .. }) => CoreError::Transport(e),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn codes_are_distinct() {
        let errors = [
            CoreError::InvalidCommand { name: "x".into() },
            CoreError::InvalidArgument { reason: "x".into() },
            CoreError::NotFound {
                kind: "service",
                identifier: "x".into(),
            },
            CoreError::NotImplemented { operation: "agent" },
            CoreError::Rejected {
                method: "Connect".into(),
                message: "x".into(),
            },
            CoreError::Transport(BusError::Disconnected),
            CoreError::ProtocolViolation { context: "x".into() },
            CoreError::Internal("x".into()),
        ];

        let mut codes: Vec<i32> = errors.iter().map(CoreError::code).collect();
        codes.sort_unstable();
        codes.dedup();
        assert_eq!(codes.len(), errors.len());
        assert!(codes.iter().all(|c| *c < 0));
    }

    #[test]
    fn call_rejection_is_not_fatal_transport() {
        let err = CoreError::from(BusError::Call {
            method: "Connect".into(),
            message: "already connected".into(),
        });
        assert!(matches!(err, CoreError::Rejected { .. }));

        let err = CoreError::from(BusError::Disconnected);
        assert!(matches!(err, CoreError::Transport(_)));
    }
}
