use std::fmt;
use std::pin::Pin;
use std::sync::Arc;
use std::task::{Context, Poll};

use futures_util::stream::{self, BoxStream, FusedStream};
use futures_util::{Stream, StreamExt, future};
use tokio::sync::watch;

use super::session::{Session, StopHandle};

/// Lazy sequence of "… ago" strings.
///
/// A live stream first yields the text rendered when `format` was called,
/// then each text the session's producer refreshes after a backoff delay,
/// until the session is stopped. Streams over the same session share one
/// producer and see the same texts. A degenerate stream emits one empty
/// string and ends.
///
/// Live streams must be polled inside a tokio runtime.
pub struct AgoStream {
    inner: BoxStream<'static, String>,
    handle: Option<StopHandle>,
    done: bool,
}

struct Cursor {
    session: Arc<Session>,
    cancelled: watch::Receiver<bool>,
    updates: watch::Receiver<String>,
}

impl AgoStream {
    pub(crate) fn degenerate() -> Self {
        Self {
            inner: stream::once(future::ready(String::new())).boxed(),
            handle: None,
            done: false,
        }
    }

    pub(crate) fn live(session: Arc<Session>) -> Self {
        let cursor = Cursor {
            cancelled: session.cancellation(),
            updates: session.updates(),
            session: Arc::clone(&session),
        };
        Self {
            inner: stream::unfold(cursor, step).boxed(),
            handle: Some(StopHandle::new(session)),
            done: false,
        }
    }

    /// Stop hook for the underlying session; `None` for a degenerate stream.
    #[must_use]
    pub fn stop_handle(&self) -> Option<StopHandle> {
        self.handle.clone()
    }

    /// Whether the input was rejected and this stream only yields `""`.
    #[must_use]
    pub fn is_degenerate(&self) -> bool {
        self.handle.is_none()
    }
}

async fn step(mut cursor: Cursor) -> Option<(String, Cursor)> {
    if cursor.session.is_stopped() {
        return None;
    }
    cursor.session.start_producer();

    // The senders live in the session, so `changed` only errs once it is gone.
    tokio::select! {
        biased;
        _ = cursor.cancelled.changed() => return None,
        changed = cursor.updates.changed() => {
            if changed.is_err() {
                return None;
            }
        }
    }
    if cursor.session.is_stopped() {
        return None;
    }
    let text = cursor.updates.borrow_and_update().clone();
    Some((text, cursor))
}

impl Stream for AgoStream {
    type Item = String;

    fn poll_next(mut self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Option<String>> {
        if self.done {
            return Poll::Ready(None);
        }
        match self.inner.poll_next_unpin(cx) {
            Poll::Ready(Some(text)) => {
                if self.handle.is_none() {
                    self.done = true;
                }
                Poll::Ready(Some(text))
            }
            Poll::Ready(None) => {
                self.done = true;
                Poll::Ready(None)
            }
            Poll::Pending => Poll::Pending,
        }
    }
}

impl FusedStream for AgoStream {
    fn is_terminated(&self) -> bool {
        self.done
    }
}

impl fmt::Debug for AgoStream {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("AgoStream")
            .field("handle", &self.handle)
            .field("done", &self.done)
            .finish_non_exhaustive()
    }
}
