//! "Distance in words" between two instants.

const SECONDS_PER_MINUTE: i64 = 60;
const MINUTES_IN_HOUR: i64 = 60;
const MINUTES_IN_DAY: i64 = 1_440;
const MINUTES_IN_ALMOST_TWO_DAYS: i64 = 2_520;
const MINUTES_IN_MONTH: i64 = 43_200;
const MINUTES_IN_TWO_MONTHS: i64 = 86_400;
const MONTHS_IN_YEAR: i64 = 12;

/// Describe the distance between two epoch-millisecond instants, e.g. `3 minutes`.
///
/// Only the magnitude matters; argument order does not change the wording.
#[must_use]
pub fn distance_in_words(from_millis: i64, to_millis: i64) -> String {
    let seconds = (to_millis.saturating_sub(from_millis) / 1_000).saturating_abs();
    describe_minutes(seconds / SECONDS_PER_MINUTE)
}

fn describe_minutes(minutes: i64) -> String {
    if minutes == 0 {
        "less than a minute".to_string()
    } else if minutes < 45 {
        count(minutes, "minute")
    } else if minutes < 90 {
        "about 1 hour".to_string()
    } else if minutes < MINUTES_IN_DAY {
        format!("about {}", count(rounded(minutes, MINUTES_IN_HOUR), "hour"))
    } else if minutes < MINUTES_IN_ALMOST_TWO_DAYS {
        "1 day".to_string()
    } else if minutes < MINUTES_IN_MONTH {
        count(rounded(minutes, MINUTES_IN_DAY), "day")
    } else if minutes < MINUTES_IN_TWO_MONTHS {
        format!("about {}", count(rounded(minutes, MINUTES_IN_MONTH), "month"))
    } else {
        describe_months(minutes)
    }
}

fn describe_months(minutes: i64) -> String {
    let months = minutes / MINUTES_IN_MONTH;
    if months < MONTHS_IN_YEAR {
        return count(rounded(minutes, MINUTES_IN_MONTH), "month");
    }

    let years = months / MONTHS_IN_YEAR;
    match months % MONTHS_IN_YEAR {
        0..=2 => format!("about {}", count(years, "year")),
        3..=8 => format!("over {}", count(years, "year")),
        _ => format!("almost {}", count(years + 1, "year")),
    }
}

/// Nearest whole number of `unit`s, halves rounding up.
fn rounded(minutes: i64, unit: i64) -> i64 {
    (minutes + unit / 2) / unit
}

fn count(n: i64, unit: &str) -> String {
    if n == 1 {
        format!("1 {unit}")
    } else {
        format!("{n} {unit}s")
    }
}
