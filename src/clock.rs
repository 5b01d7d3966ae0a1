//! Wall-clock access for the formatter.

use chrono::Utc;
use mockall::automock;

/// Source of "now" as epoch-milliseconds.
#[automock]
pub trait Clock: Send + Sync {
    fn now_millis(&self) -> i64;
}

/// Reads the system wall clock.
#[derive(Debug, Clone, Copy, Default)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now_millis(&self) -> i64 {
        Utc::now().timestamp_millis()
    }
}
