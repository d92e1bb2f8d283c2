// ── Event stream adapter ──
//
// `Stream`-based consumption of the session's event broadcast, for
// callers that prefer combinators over a raw `broadcast::Receiver`.

use std::pin::Pin;
use std::sync::Arc;
use std::task::{Context, Poll};

use futures_core::Stream;
use tokio::sync::broadcast;
use tokio_stream::wrappers::errors::BroadcastStreamRecvError;
use tokio_stream::wrappers::BroadcastStream;
use tracing::warn;

use crate::event::SessionEvent;

/// A subscription to session events as a `Stream`.
///
/// Forwarding is best-effort: a subscriber that falls behind the
/// broadcast capacity loses the oldest events. The lag is logged and the
/// stream continues with the next available event.
pub struct EventStream {
    inner: BroadcastStream<Arc<SessionEvent>>,
}

impl EventStream {
    pub(crate) fn new(receiver: broadcast::Receiver<Arc<SessionEvent>>) -> Self {
        Self {
            inner: BroadcastStream::new(receiver),
        }
    }
}

impl Stream for EventStream {
    type Item = Arc<SessionEvent>;

    fn poll_next(mut self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Option<Self::Item>> {
        loop {
            match Pin::new(&mut self.inner).poll_next(cx) {
                Poll::Ready(Some(Ok(event))) => return Poll::Ready(Some(event)),
                Poll::Ready(Some(Err(BroadcastStreamRecvError::Lagged(skipped)))) => {
                    warn!(skipped, "event subscriber lagged; events dropped");
                }
                Poll::Ready(None) => return Poll::Ready(None),
                Poll::Pending => return Poll::Pending,
            }
        }
    }
}
