// ── Transport multiplexer ──
//
// The session's single wait point. Blocks until any readiness source
// fires: the notification channel from the binding, the inbound command
// channel, the optional secondary input channel, or the quit flag. When
// notifications are ready, the channel is drained completely before
// control returns, so a batch is always processed to the end before the
// next wait.

use std::sync::Arc;

use tokio::sync::{mpsc, Notify};

use connwatch_bus::NotificationRecord;

use crate::command::CommandEnvelope;

/// What the wait returned.
pub(crate) enum Ready {
    /// Everything the notification channel had buffered, in delivery
    /// order.
    Notifications(Vec<NotificationRecord>),
    /// One inbound command.
    Command(CommandEnvelope),
    /// The secondary input source became readable.
    Secondary,
    /// `quit()` was called; the loop should return to its caller.
    Quit,
    /// The binding closed the notification channel. Fatal to the loop.
    TransportClosed,
}

pub(crate) struct Multiplexer {
    notifications: mpsc::Receiver<NotificationRecord>,
    commands: mpsc::Receiver<CommandEnvelope>,
    secondary: Option<mpsc::UnboundedReceiver<()>>,
    quit: Arc<Notify>,
    commands_open: bool,
}

impl Multiplexer {
    pub(crate) fn new(
        notifications: mpsc::Receiver<NotificationRecord>,
        commands: mpsc::Receiver<CommandEnvelope>,
        secondary: Option<mpsc::UnboundedReceiver<()>>,
        quit: Arc<Notify>,
    ) -> Self {
        Self {
            notifications,
            commands,
            secondary,
            quit,
            commands_open: true,
        }
    }

    /// Wait until any source is ready.
    ///
    /// A stored quit permit wins over pending work, so `quit()` takes
    /// effect at the next loop check even when channels are backed up.
    /// The permit is consumed on return, which makes the loop re-entrant.
    pub(crate) async fn poll_next(&mut self, poll_secondary: bool) -> Ready {
        loop {
            tokio::select! {
                biased;

                () = self.quit.notified() => return Ready::Quit,

                envelope = self.commands.recv(), if self.commands_open => {
                    match envelope {
                        Some(envelope) => return Ready::Command(envelope),
                        // All handles dropped: keep serving notifications.
                        None => self.commands_open = false,
                    }
                }

                first = self.notifications.recv() => {
                    return match first {
                        Some(first) => Ready::Notifications(self.drain_from(first)),
                        None => Ready::TransportClosed,
                    };
                }

                () = secondary_readable(self.secondary.as_mut()), if poll_secondary => {
                    return Ready::Secondary;
                }
            }
        }
    }

    /// Drain everything the notification channel has buffered.
    fn drain_from(&mut self, first: NotificationRecord) -> Vec<NotificationRecord> {
        let mut batch = vec![first];
        while let Ok(record) = self.notifications.try_recv() {
            batch.push(record);
        }
        batch
    }
}

/// Resolve when the secondary input source has a readiness tick. Absent
/// or closed sources never resolve.
async fn secondary_readable(source: Option<&mut mpsc::UnboundedReceiver<()>>) {
    match source {
        Some(rx) => {
            if rx.recv().await.is_none() {
                std::future::pending::<()>().await;
            }
        }
        None => std::future::pending::<()>().await,
    }
}
