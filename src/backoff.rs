//! Refresh delay as a step function of elapsed time.

use std::time::Duration;

const MILLIS_PER_MINUTE: i64 = 60_000;

/// Refresh tier for a timestamp, ordered from most to least frequent.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, serde::Serialize)]
pub enum BackoffTier {
    /// Under 2 minutes elapsed.
    Fresh,
    /// 2 to 5 minutes.
    Recent,
    /// 5 minutes to an hour.
    Settled,
    /// An hour or more.
    Stale,
}

impl BackoffTier {
    pub const ALL: [BackoffTier; 4] = [
        BackoffTier::Fresh,
        BackoffTier::Recent,
        BackoffTier::Settled,
        BackoffTier::Stale,
    ];

    /// Tier for a whole number of elapsed minutes. Negative values count as zero.
    #[must_use]
    pub fn for_elapsed_minutes(minutes: i64) -> Self {
        match minutes {
            i64::MIN..=1 => BackoffTier::Fresh,
            2..=4 => BackoffTier::Recent,
            5..=59 => BackoffTier::Settled,
            _ => BackoffTier::Stale,
        }
    }

    #[must_use]
    pub fn delay(self) -> Duration {
        let secs = match self {
            BackoffTier::Fresh => 5,
            BackoffTier::Recent => 15,
            BackoffTier::Settled => 30,
            BackoffTier::Stale => 300,
        };
        Duration::from_secs(secs)
    }
}

/// Whole minutes from `from_millis` to `to_millis`, truncated toward zero.
#[must_use]
pub fn minutes_elapsed(from_millis: i64, to_millis: i64) -> i64 {
    to_millis.saturating_sub(from_millis) / MILLIS_PER_MINUTE
}

/// Delay before the next refresh of `timestamp_millis`, measured at `now_millis`.
#[must_use]
pub fn next_delay(timestamp_millis: i64, now_millis: i64) -> Duration {
    BackoffTier::for_elapsed_minutes(minutes_elapsed(timestamp_millis, now_millis)).delay()
}
