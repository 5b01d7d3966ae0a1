//! Accepted timestamp shapes and their normalization to epoch-milliseconds.

use chrono::{
    DateTime, FixedOffset, Local, NaiveDate, NaiveDateTime, TimeZone, Utc,
};
use regex::Regex;
use serde_json::Value;
use std::sync::LazyLock;
use std::time::SystemTime;

use crate::errors::{AgoError, Result};

/// Largest magnitude of epoch-milliseconds accepted (±100,000,000 days).
pub const MAX_EPOCH_MILLIS: i64 = 8_640_000_000_000_000;

static OFFSET_SUFFIXED: LazyLock<std::result::Result<Regex, regex::Error>> = LazyLock::new(|| {
    Regex::new(
        r"^(?P<datetime>\d{4}-\d{2}-\d{2}[ T]\d{2}:\d{2}:\d{2}(?:\.\d+)?)\s*(?P<tz_offset>[+-]\d{4})(?:\s+[A-Za-z]+)?$",
    )
});

const NAIVE_FORMATS: &[&str] = &[
    "%Y-%m-%dT%H:%M:%S%.f",
    "%Y-%m-%d %H:%M:%S%.f",
    "%Y-%m-%dT%H:%M:%S",
    "%Y-%m-%d %H:%M:%S",
    "%Y-%m-%dT%H:%M",
    "%Y-%m-%d %H:%M",
];

/// A point in time as handed to the formatter.
#[derive(Debug, Clone, PartialEq)]
pub enum TimeInput {
    /// Integer epoch-milliseconds.
    Millis(i64),
    /// Any other numeric epoch-milliseconds value.
    Number(f64),
    /// A date/time string.
    Text(String),
    /// A structured date value.
    Date(DateTime<FixedOffset>),
    /// No value at all.
    Absent,
    /// A value of some other shape, named by its kind.
    Unsupported(&'static str),
}

impl TimeInput {
    /// Normalize to epoch-milliseconds.
    ///
    /// # Errors
    /// Returns `InvalidInputShape` for absent, zero, non-finite, blank or
    /// unsupported values, and `DateParsing` for strings no known format accepts.
    #[allow(clippy::cast_possible_truncation, clippy::cast_precision_loss)]
    pub fn to_epoch_millis(&self) -> Result<i64> {
        let millis = match self {
            TimeInput::Absent => return Err(shape("no timestamp given")),
            TimeInput::Unsupported(kind) => {
                return Err(shape(&format!("unsupported value of type {kind}")));
            }
            TimeInput::Millis(0) => return Err(shape("zero timestamp")),
            TimeInput::Millis(ms) => *ms,
            TimeInput::Number(n) if !n.is_finite() => {
                return Err(shape("timestamp is not a finite number"));
            }
            #[allow(clippy::float_cmp)]
            TimeInput::Number(n) if *n == 0.0 => return Err(shape("zero timestamp")),
            TimeInput::Number(n) => {
                if n.abs() > MAX_EPOCH_MILLIS as f64 {
                    return Err(out_of_range(&n.to_string()));
                }
                n.trunc() as i64
            }
            TimeInput::Text(s) if s.trim().is_empty() => {
                return Err(shape("empty timestamp string"));
            }
            TimeInput::Text(s) => parse_datetime_str(s)?,
            TimeInput::Date(dt) => dt.timestamp_millis(),
        };

        if !(-MAX_EPOCH_MILLIS..=MAX_EPOCH_MILLIS).contains(&millis) {
            return Err(out_of_range(&millis.to_string()));
        }
        Ok(millis)
    }
}

fn shape(msg: &str) -> AgoError {
    AgoError::InvalidInputShape(msg.to_string())
}

fn out_of_range(raw: &str) -> AgoError {
    AgoError::InvalidInputShape(format!("timestamp {raw} is outside the representable range"))
}

/// Parse a date/time string into epoch-milliseconds.
///
/// Strings without an offset are read as local time.
///
/// # Errors
/// Returns `DateParsing` when no supported format matches.
pub fn parse_datetime_str(raw: &str) -> Result<i64> {
    let s = raw.trim();

    if let Some(ms) = parse_integer_millis(s) {
        return Ok(ms);
    }
    if let Ok(dt) = DateTime::parse_from_rfc3339(s) {
        return Ok(dt.timestamp_millis());
    }
    if let Ok(dt) = DateTime::parse_from_rfc2822(s) {
        return Ok(dt.timestamp_millis());
    }
    if let Some(ms) = parse_offset_suffixed(s)? {
        return Ok(ms);
    }
    for fmt in NAIVE_FORMATS {
        if let Ok(naive) = NaiveDateTime::parse_from_str(s, fmt) {
            return local_millis(&naive, raw);
        }
    }
    if let Ok(date) = NaiveDate::parse_from_str(s, "%Y-%m-%d") {
        if let Some(midnight) = date.and_hms_opt(0, 0, 0) {
            return local_millis(&midnight, raw);
        }
    }

    Err(AgoError::DateParsing(format!(
        "Failed to parse date from '{raw}'"
    )))
}

fn parse_integer_millis(s: &str) -> Option<i64> {
    let digits = s.strip_prefix('-').unwrap_or(s);
    if digits.is_empty() || !digits.bytes().all(|b| b.is_ascii_digit()) {
        return None;
    }
    s.parse::<i64>().ok()
}

/// Handles `2024-05-01 10:00:00.123 +0000 UTC` as printed by container tooling.
fn parse_offset_suffixed(s: &str) -> Result<Option<i64>> {
    let regex = OFFSET_SUFFIXED.as_ref().map_err(|e| AgoError::RegexError(e.clone()))?;
    let Some(captures) = regex.captures(s) else {
        return Ok(None);
    };

    let datetime_part = captures
        .name("datetime")
        .map(|m| m.as_str().replace('T', " "))
        .unwrap_or_default();
    let tz_offset = captures
        .name("tz_offset")
        .map(|m| m.as_str())
        .unwrap_or("+0000");

    let cleaned = format!("{datetime_part} {tz_offset}");
    DateTime::parse_from_str(&cleaned, "%Y-%m-%d %H:%M:%S%.f %z")
        .map(|dt| Some(dt.timestamp_millis()))
        .map_err(|e| AgoError::DateParsing(format!("Failed to parse date '{s}': {e}")))
}

fn local_millis(naive: &NaiveDateTime, raw: &str) -> Result<i64> {
    Local
        .from_local_datetime(naive)
        .earliest()
        .map(|dt| dt.timestamp_millis())
        .ok_or_else(|| {
            AgoError::DateParsing(format!("'{raw}' does not exist in the local time zone"))
        })
}

impl From<i64> for TimeInput {
    fn from(ms: i64) -> Self {
        TimeInput::Millis(ms)
    }
}

impl From<i32> for TimeInput {
    fn from(ms: i32) -> Self {
        TimeInput::Millis(i64::from(ms))
    }
}

impl From<u64> for TimeInput {
    fn from(ms: u64) -> Self {
        i64::try_from(ms).map_or(TimeInput::Number(ms as f64), TimeInput::Millis)
    }
}

impl From<f64> for TimeInput {
    fn from(n: f64) -> Self {
        TimeInput::Number(n)
    }
}

impl From<&str> for TimeInput {
    fn from(s: &str) -> Self {
        TimeInput::Text(s.to_string())
    }
}

impl From<String> for TimeInput {
    fn from(s: String) -> Self {
        TimeInput::Text(s)
    }
}

impl From<&String> for TimeInput {
    fn from(s: &String) -> Self {
        TimeInput::Text(s.clone())
    }
}

impl<Tz: TimeZone> From<DateTime<Tz>> for TimeInput {
    fn from(dt: DateTime<Tz>) -> Self {
        TimeInput::Date(dt.fixed_offset())
    }
}

impl From<NaiveDateTime> for TimeInput {
    fn from(naive: NaiveDateTime) -> Self {
        Local
            .from_local_datetime(&naive)
            .earliest()
            .map_or(TimeInput::Unsupported("nonexistent local time"), TimeInput::from)
    }
}

impl From<SystemTime> for TimeInput {
    fn from(t: SystemTime) -> Self {
        TimeInput::from(DateTime::<Utc>::from(t))
    }
}

impl<T: Into<TimeInput>> From<Option<T>> for TimeInput {
    fn from(value: Option<T>) -> Self {
        value.map_or(TimeInput::Absent, Into::into)
    }
}

impl From<Value> for TimeInput {
    fn from(value: Value) -> Self {
        match value {
            Value::Null => TimeInput::Absent,
            Value::Number(n) => match n.as_i64() {
                Some(ms) => TimeInput::Millis(ms),
                None => n.as_f64().map_or(TimeInput::Unsupported("number"), TimeInput::Number),
            },
            Value::String(s) => TimeInput::Text(s),
            Value::Bool(_) => TimeInput::Unsupported("boolean"),
            Value::Array(_) => TimeInput::Unsupported("array"),
            Value::Object(_) => TimeInput::Unsupported("object"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn integer_and_float_millis_normalize() {
        assert_eq!(TimeInput::from(1_700_000_000_000_i64).to_epoch_millis().unwrap(), 1_700_000_000_000);
        assert_eq!(TimeInput::from(1_700_000_000_000.9).to_epoch_millis().unwrap(), 1_700_000_000_000);
    }

    #[test]
    fn falsy_values_are_rejected() {
        for input in [
            TimeInput::Millis(0),
            TimeInput::Number(0.0),
            TimeInput::Number(f64::NAN),
            TimeInput::Number(f64::INFINITY),
            TimeInput::Text(String::new()),
            TimeInput::Text("   ".into()),
            TimeInput::Absent,
        ] {
            let err = input.to_epoch_millis().unwrap_err();
            assert!(
                matches!(err, AgoError::InvalidInputShape(_)),
                "{input:?} should be an invalid shape, got {err:?}"
            );
        }
    }

    #[test]
    fn json_values_map_to_shapes() {
        assert_eq!(TimeInput::from(json!(null)), TimeInput::Absent);
        assert_eq!(TimeInput::from(json!(5)), TimeInput::Millis(5));
        assert_eq!(TimeInput::from(json!(1.5)), TimeInput::Number(1.5));
        assert_eq!(TimeInput::from(json!("x")), TimeInput::Text("x".into()));
        assert_eq!(TimeInput::from(json!(true)), TimeInput::Unsupported("boolean"));
        assert_eq!(TimeInput::from(json!([1])), TimeInput::Unsupported("array"));
        assert_eq!(TimeInput::from(json!({"a": 1})), TimeInput::Unsupported("object"));
        assert!(TimeInput::from(json!(true)).to_epoch_millis().is_err());
    }

    #[test]
    fn option_none_is_absent() {
        assert_eq!(TimeInput::from(None::<i64>), TimeInput::Absent);
        assert_eq!(TimeInput::from(Some(7_i64)), TimeInput::Millis(7));
    }

    #[test]
    fn rfc3339_strings_parse() {
        assert_eq!(parse_datetime_str("2024-05-01T10:00:00Z").unwrap(), 1_714_557_600_000);
        assert_eq!(
            parse_datetime_str("2024-05-01T12:00:00.250+02:00").unwrap(),
            1_714_557_600_250
        );
    }

    #[test]
    fn rfc2822_strings_parse() {
        assert_eq!(
            parse_datetime_str("Wed, 01 May 2024 10:00:00 +0000").unwrap(),
            1_714_557_600_000
        );
    }

    #[test]
    fn container_style_strings_parse() {
        assert_eq!(
            parse_datetime_str("2024-05-01 10:00:00.123456 +0000 UTC").unwrap(),
            1_714_557_600_123
        );
        assert_eq!(
            parse_datetime_str("2024-05-01 11:00:00 +0100").unwrap(),
            1_714_557_600_000
        );
    }

    #[test]
    fn naive_strings_are_local_time() {
        let expected = Local
            .with_ymd_and_hms(2024, 5, 1, 10, 0, 0)
            .earliest()
            .unwrap()
            .timestamp_millis();
        assert_eq!(parse_datetime_str("2024-05-01 10:00:00").unwrap(), expected);
        assert_eq!(parse_datetime_str("2024-05-01T10:00").unwrap(), expected);

        let midnight = Local
            .with_ymd_and_hms(2024, 5, 1, 0, 0, 0)
            .earliest()
            .unwrap()
            .timestamp_millis();
        assert_eq!(parse_datetime_str("2024-05-01").unwrap(), midnight);
    }

    #[test]
    fn integer_strings_are_millis() {
        assert_eq!(parse_datetime_str("1714557600000").unwrap(), 1_714_557_600_000);
        assert_eq!(parse_datetime_str(" -1000 ").unwrap(), -1000);
    }

    #[test]
    fn garbage_strings_fail_to_parse() {
        let err = parse_datetime_str("not a date").unwrap_err();
        assert!(matches!(err, AgoError::DateParsing(_)));
        assert!(err.is_degenerate());
    }

    #[test]
    fn structured_dates_keep_their_instant() {
        let dt = Utc.with_ymd_and_hms(2024, 5, 1, 10, 0, 0).unwrap();
        assert_eq!(TimeInput::from(dt).to_epoch_millis().unwrap(), 1_714_557_600_000);
    }

    #[test]
    fn out_of_range_millis_are_rejected() {
        assert!(TimeInput::Millis(i64::MAX).to_epoch_millis().is_err());
        assert!(TimeInput::Number(1e300).to_epoch_millis().is_err());
    }

    #[test]
    fn most_negative_millis_are_rejected_without_overflow() {
        let err = TimeInput::Millis(i64::MIN).to_epoch_millis().unwrap_err();
        assert!(matches!(err, AgoError::InvalidInputShape(_)));

        let err = TimeInput::from("-9223372036854775808").to_epoch_millis().unwrap_err();
        assert!(matches!(err, AgoError::InvalidInputShape(_)));

        assert_eq!(
            TimeInput::Millis(-MAX_EPOCH_MILLIS).to_epoch_millis().unwrap(),
            -MAX_EPOCH_MILLIS
        );
    }

    #[test]
    fn container_style_regex_is_reused() {
        for _ in 0..3 {
            assert_eq!(
                parse_datetime_str("2024-05-01T10:00:00 +0000 UTC").unwrap(),
                1_714_557_600_000
            );
        }
    }
}
