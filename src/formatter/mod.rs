//! Self-refreshing "time ago" formatter.

mod session;
mod stream;

use std::fmt;
use std::sync::Arc;

use tracing::debug;

use crate::clock::{Clock, SystemClock};
use crate::distance::distance_in_words;
use crate::errors::{AgoError, Result};
use crate::timestamp::TimeInput;

pub use session::{Session, SessionState, StopHandle};
pub use stream::AgoStream;

/// Format `input` against the system clock, detached from any owning formatter.
///
/// The first text is rendered here, at call time, however late the stream
/// is first polled. The returned stream runs until its [`StopHandle`] is
/// used or the stream is dropped.
pub fn format(input: impl Into<TimeInput>) -> AgoStream {
    format_with_clock(input, Arc::new(SystemClock))
}

/// Like [`format`], reading "now" from `clock`.
pub fn format_with_clock(input: impl Into<TimeInput>, clock: Arc<dyn Clock>) -> AgoStream {
    let input = input.into();
    let now = clock.now_millis();
    match validate(&input, now) {
        Ok(millis) => AgoStream::live(Session::open(millis, now, clock)),
        Err(err) => rejected(&input, &err),
    }
}

/// Normalize `input` and reject timestamps after `now_millis`.
///
/// # Errors
/// Returns the normalization error, or `FutureTimestamp`.
pub fn validate(input: &TimeInput, now_millis: i64) -> Result<i64> {
    let millis = input.to_epoch_millis()?;
    if millis > now_millis {
        return Err(AgoError::FutureTimestamp {
            millis,
            now: now_millis,
        });
    }
    Ok(millis)
}

fn rejected(input: &TimeInput, err: &AgoError) -> AgoStream {
    debug!(input = ?input, error = %err, "time-ago input rejected");
    AgoStream::degenerate()
}

/// A formatter instance owning at most one live session at a time.
///
/// Formatting the same timestamp again shares the running session; a
/// different timestamp stops it and opens a new one. Dropping the
/// formatter stops its session.
pub struct TimeAgo {
    clock: Arc<dyn Clock>,
    session: Option<Arc<Session>>,
    disposed: bool,
}

impl TimeAgo {
    #[must_use]
    pub fn new() -> Self {
        Self::with_clock(Arc::new(SystemClock))
    }

    #[must_use]
    pub fn with_clock(clock: Arc<dyn Clock>) -> Self {
        Self {
            clock,
            session: None,
            disposed: false,
        }
    }

    /// Stream the text for `input`, rendered first at call time.
    pub fn format(&mut self, input: impl Into<TimeInput>) -> AgoStream {
        let input = input.into();
        if self.disposed {
            debug!(input = ?input, "format called on a stopped formatter");
            return AgoStream::degenerate();
        }

        let now = self.clock.now_millis();
        let millis = match validate(&input, now) {
            Ok(millis) => millis,
            Err(err) => return rejected(&input, &err),
        };

        if let Some(session) = &self.session {
            if session.millis() == millis && !session.is_stopped() {
                return AgoStream::live(Arc::clone(session));
            }
            session.stop();
        }

        let session = Session::open(millis, now, Arc::clone(&self.clock));
        self.session = Some(Arc::clone(&session));
        AgoStream::live(session)
    }

    /// Current text for `input` without opening a session; `""` when rejected.
    #[must_use]
    pub fn render(&self, input: impl Into<TimeInput>) -> String {
        let input = input.into();
        let now = self.clock.now_millis();
        match validate(&input, now) {
            Ok(millis) => format!("{} ago", distance_in_words(millis, now)),
            Err(err) => {
                debug!(input = ?input, error = %err, "time-ago input rejected");
                String::new()
            }
        }
    }

    /// Dispose of the formatter. Later `format` calls yield the empty stream.
    pub fn stop(&mut self) {
        self.disposed = true;
        if let Some(session) = &self.session {
            session.stop();
        }
    }

    #[must_use]
    pub fn state(&self) -> SessionState {
        if self.disposed {
            return SessionState::Terminated;
        }
        self.session
            .as_ref()
            .map_or(SessionState::Idle, |session| session.state())
    }

    #[must_use]
    pub fn session(&self) -> Option<&Session> {
        self.session.as_deref()
    }

    #[must_use]
    pub fn stop_handle(&self) -> Option<StopHandle> {
        self.session
            .as_ref()
            .map(|session| StopHandle::new(Arc::clone(session)))
    }
}

impl fmt::Debug for TimeAgo {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TimeAgo")
            .field("session", &self.session)
            .field("disposed", &self.disposed)
            .finish_non_exhaustive()
    }
}

impl Default for TimeAgo {
    fn default() -> Self {
        Self::new()
    }
}

impl Drop for TimeAgo {
    fn drop(&mut self) {
        self.stop();
    }
}
