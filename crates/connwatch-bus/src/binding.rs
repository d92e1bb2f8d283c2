// ── Remote binding contract ──
//
// The core drives the remote service exclusively through this trait.
// A production binding wraps the system bus; tests script one in memory.
// All calls are serialized by the core's single control flow, so methods
// take `&mut self` and no interior synchronization is required.

use tokio::sync::mpsc;

use crate::error::BusError;
use crate::record::{Category, NotificationRecord, ObjectRecord, Properties};

/// Contract a bus binding must satisfy.
///
/// `subscribe` must be called first: it registers the signal match rules
/// for the given categories and hands back the channel on which the
/// binding will deliver notifications, in the order it received them.
/// The bulk fetches return the remote snapshots the core's replica is
/// initialized from; `connect_service` resolves when the remote service
/// has acknowledged (or rejected) the connection attempt.
#[allow(async_fn_in_trait)]
pub trait RemoteBinding {
    /// Register for change notifications on the given categories.
    ///
    /// Dropping the returned receiver, or the binding closing its sending
    /// side, ends notification delivery for good.
    async fn subscribe(
        &mut self,
        categories: &[Category],
    ) -> Result<mpsc::Receiver<NotificationRecord>, BusError>;

    /// Fetch the global manager state dictionary.
    async fn fetch_state(&mut self) -> Result<Properties, BusError>;

    /// Fetch the technology snapshot.
    async fn fetch_technologies(&mut self) -> Result<Vec<ObjectRecord>, BusError>;

    /// Fetch the service snapshot.
    async fn fetch_services(&mut self) -> Result<Vec<ObjectRecord>, BusError>;

    /// Ask the remote service to connect the service at `path`.
    async fn connect_service(&mut self, path: &str) -> Result<(), BusError>;
}
