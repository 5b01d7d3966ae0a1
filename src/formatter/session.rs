use std::fmt;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::time::Duration;

use tokio::sync::watch;
use tracing::{debug, trace};

use crate::backoff;
use crate::clock::Clock;
use crate::distance::distance_in_words;

/// Lifecycle of a formatter session.
#[derive(Debug, Clone, Copy, PartialEq, Eq, serde::Serialize)]
pub enum SessionState {
    /// No session bound yet.
    Idle,
    /// Emitting on a timer.
    Active,
    /// Stopped, or never started because the input was rejected. Absorbing.
    Terminated,
}

/// Runtime state bound to one normalized timestamp.
///
/// A single producer task refreshes the text; every stream over the
/// session subscribes to the latest value.
pub struct Session {
    millis: i64,
    clock: Arc<dyn Clock>,
    next_delay_ms: AtomicU64,
    emissions: AtomicU64,
    producing: AtomicBool,
    cancel: watch::Sender<bool>,
    latest: watch::Sender<String>,
}

impl Session {
    /// Open a session whose first text is rendered against `now_millis`.
    pub(crate) fn open(millis: i64, now_millis: i64, clock: Arc<dyn Clock>) -> Arc<Self> {
        let text = render(millis, now_millis);
        let delay = backoff::next_delay(millis, now_millis);
        let (cancel, _) = watch::channel(false);
        let (latest, _) = watch::channel(text);
        debug!(millis, next_delay_ms = as_millis(delay), "opened time-ago session");

        Arc::new(Self {
            millis,
            clock,
            next_delay_ms: AtomicU64::new(as_millis(delay)),
            emissions: AtomicU64::new(1),
            producing: AtomicBool::new(false),
            cancel,
            latest,
        })
    }

    /// The bound timestamp as epoch-milliseconds.
    #[must_use]
    pub fn millis(&self) -> i64 {
        self.millis
    }

    /// Delay the stream waits before its next emission.
    #[must_use]
    pub fn next_delay(&self) -> Duration {
        Duration::from_millis(self.next_delay_ms.load(Ordering::Relaxed))
    }

    /// Most recent text produced by the session.
    #[must_use]
    pub fn latest(&self) -> String {
        self.latest.borrow().clone()
    }

    /// Number of texts the session has produced, shared by all its streams.
    #[must_use]
    pub fn emissions(&self) -> u64 {
        self.emissions.load(Ordering::Relaxed)
    }

    #[must_use]
    pub fn is_stopped(&self) -> bool {
        *self.cancel.borrow()
    }

    #[must_use]
    pub fn state(&self) -> SessionState {
        if self.is_stopped() {
            SessionState::Terminated
        } else {
            SessionState::Active
        }
    }

    pub(crate) fn stop(&self) {
        if !self.cancel.send_replace(true) {
            debug!(
                millis = self.millis,
                emissions = self.emissions(),
                "stopped time-ago session"
            );
        }
    }

    pub(crate) fn cancellation(&self) -> watch::Receiver<bool> {
        self.cancel.subscribe()
    }

    /// Receiver that sees the current text as unread.
    pub(crate) fn updates(&self) -> watch::Receiver<String> {
        let mut rx = self.latest.subscribe();
        rx.mark_changed();
        rx
    }

    /// Spawn the refresh task on the first call; later calls do nothing.
    ///
    /// Must run inside a tokio runtime.
    pub(crate) fn start_producer(self: &Arc<Self>) {
        if self.producing.swap(true, Ordering::AcqRel) {
            return;
        }
        tokio::spawn(produce(Arc::clone(self)));
    }

    /// Render the current text and recompute the delay from the same "now".
    fn emit(&self) {
        let now = self.clock.now_millis();
        let text = render(self.millis, now);
        let delay = backoff::next_delay(self.millis, now);
        self.next_delay_ms.store(as_millis(delay), Ordering::Relaxed);
        let emission = self.emissions.fetch_add(1, Ordering::Relaxed) + 1;

        trace!(
            millis = self.millis,
            emission,
            next_delay_ms = as_millis(delay),
            text = %text,
            "time-ago emission"
        );
        self.latest.send_replace(text);
    }
}

async fn produce(session: Arc<Session>) {
    let mut cancelled = session.cancellation();
    loop {
        let delay = session.next_delay();
        tokio::select! {
            () = tokio::time::sleep(delay) => {}
            _ = cancelled.changed() => {}
            () = session.latest.closed() => {
                debug!(millis = session.millis, "no streams left on time-ago session");
                session.stop();
            }
        }
        if session.is_stopped() {
            break;
        }
        session.emit();
    }
}

fn render(millis: i64, now_millis: i64) -> String {
    format!("{} ago", distance_in_words(millis, now_millis))
}

impl fmt::Debug for Session {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Session")
            .field("millis", &self.millis)
            .field("next_delay", &self.next_delay())
            .field("emissions", &self.emissions())
            .field("stopped", &self.is_stopped())
            .finish_non_exhaustive()
    }
}

fn as_millis(delay: Duration) -> u64 {
    u64::try_from(delay.as_millis()).unwrap_or(u64::MAX)
}

/// Disposal hook for a running session. Cheap to clone and safe to call from any thread.
#[derive(Debug, Clone)]
pub struct StopHandle {
    session: Arc<Session>,
}

impl StopHandle {
    pub(crate) fn new(session: Arc<Session>) -> Self {
        Self { session }
    }

    /// Ask the session to stop. Takes effect at the stream's next iteration boundary.
    pub fn stop(&self) {
        self.session.stop();
    }

    #[must_use]
    pub fn is_stopped(&self) -> bool {
        self.session.is_stopped()
    }

    #[must_use]
    pub fn next_delay(&self) -> Duration {
        self.session.next_delay()
    }

    #[must_use]
    pub fn millis(&self) -> i64 {
        self.session.millis()
    }
}
