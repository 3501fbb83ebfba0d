//! The in-story clock.

use chrono::{DateTime, Datelike, NaiveDateTime, Timelike, Utc};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

const MONTHS: [&str; 12] = [
    "january",
    "february",
    "march",
    "april",
    "may",
    "june",
    "july",
    "august",
    "september",
    "october",
    "november",
    "december",
];

/// Month number for a full or three-letter English month name.
///
/// # Examples
///
/// ```
/// use storyguard_time::month_from_name;
///
/// assert_eq!(month_from_name("March"), Some(3));
/// assert_eq!(month_from_name("sep"), Some(9));
/// assert_eq!(month_from_name("Marchember"), None);
/// ```
pub fn month_from_name(name: &str) -> Option<i64> {
    let name = name.trim().to_lowercase();
    MONTHS
        .iter()
        .position(|month| *month == name || (name.len() == 3 && month.starts_with(&name)))
        .map(|index| index as i64 + 1)
}

/// A point on the story clock.
///
/// Ordering compares the fields as a tuple in declaration order. There is no
/// calendar normalization: campaign calendars vary, so only sub-day fields
/// carry into `day` and months or days never roll over.
#[derive(
    Debug,
    Clone,
    Copy,
    Default,
    PartialEq,
    Eq,
    PartialOrd,
    Ord,
    Hash,
    Serialize,
    Deserialize,
    derive_more::Display,
)]
#[display(
    "{year:04}-{month:02}-{day:02} {hour:02}:{minute:02}:{second:02}.{microsecond:06}"
)]
#[serde(default)]
pub struct WorldTime {
    /// Year.
    pub year: i64,
    /// Month, 1 to 12.
    pub month: i64,
    /// Day of month.
    pub day: i64,
    /// Hour, 0 to 23.
    pub hour: i64,
    /// Minute, 0 to 59.
    pub minute: i64,
    /// Second, 0 to 59.
    pub second: i64,
    /// Microsecond, 0 to 999 999.
    pub microsecond: i64,
}

fn int_field(object: &Map<String, Value>, key: &str) -> i64 {
    match object.get(key) {
        Some(Value::Number(n)) => n
            .as_i64()
            .or_else(|| n.as_f64().map(|f| f as i64))
            .unwrap_or(0),
        Some(Value::String(s)) => s.trim().parse().unwrap_or(0),
        _ => 0,
    }
}

fn month_field(object: &Map<String, Value>) -> i64 {
    match object.get("month") {
        Some(Value::String(s)) => s
            .trim()
            .parse()
            .ok()
            .or_else(|| month_from_name(s))
            .unwrap_or(0),
        _ => int_field(object, "month"),
    }
}

impl WorldTime {
    /// Build from a UTC instant.
    pub fn from_datetime(instant: DateTime<Utc>) -> Self {
        Self {
            year: i64::from(instant.year()),
            month: i64::from(instant.month()),
            day: i64::from(instant.day()),
            hour: i64::from(instant.hour()),
            minute: i64::from(instant.minute()),
            second: i64::from(instant.second()),
            microsecond: i64::from(instant.nanosecond() / 1_000),
        }
    }

    /// Read a clock value from a state payload field.
    ///
    /// Objects are read field by field, missing or unparseable fields
    /// becoming 0 and textual months going through [`month_from_name`].
    /// Strings are parsed as ISO-8601 timestamps. Anything else, or a string
    /// that is not a timestamp, yields `None`.
    pub fn from_value(value: &Value) -> Option<Self> {
        match value {
            Value::Object(object) => Some(Self {
                year: int_field(object, "year"),
                month: month_field(object),
                day: int_field(object, "day"),
                hour: int_field(object, "hour"),
                minute: int_field(object, "minute"),
                second: int_field(object, "second"),
                microsecond: int_field(object, "microsecond"),
            }),
            Value::String(s) => parse_timestamp(s),
            _ => None,
        }
    }

    /// The clock as a JSON object with all seven fields.
    pub fn to_value(&self) -> Value {
        serde_json::json!({
            "year": self.year,
            "month": self.month,
            "day": self.day,
            "hour": self.hour,
            "minute": self.minute,
            "second": self.second,
            "microsecond": self.microsecond,
        })
    }

    /// Advance by whole seconds, carrying into minutes, hours and days.
    ///
    /// Returns `None` when the carry would overflow a field.
    pub fn advance_seconds(&self, seconds: i64) -> Option<Self> {
        let total = self.second.checked_add(seconds)?;
        let mut next = *self;
        next.second = total.rem_euclid(60);
        next.advance_minutes(total.div_euclid(60))
    }

    /// Advance by microseconds, carrying into seconds and above.
    ///
    /// Returns `None` when the carry would overflow a field.
    pub fn advance_microseconds(&self, microseconds: i64) -> Option<Self> {
        let total = self.microsecond.checked_add(microseconds)?;
        let mut next = *self;
        next.microsecond = total.rem_euclid(1_000_000);
        next.advance_seconds(total.div_euclid(1_000_000))
    }

    fn advance_minutes(mut self, minutes: i64) -> Option<Self> {
        let total = self.minute.checked_add(minutes)?;
        self.minute = total.rem_euclid(60);
        let hours = self.hour.checked_add(total.div_euclid(60))?;
        self.hour = hours.rem_euclid(24);
        self.day = self.day.checked_add(hours.div_euclid(24))?;
        Some(self)
    }
}

/// Parse an ISO-8601 timestamp, normalizing any offset to UTC.
///
/// Timestamps without an offset are taken as UTC. Empty or malformed input
/// yields `None`.
///
/// # Examples
///
/// ```
/// use storyguard_time::parse_timestamp;
///
/// let t = parse_timestamp("1492-03-15T23:30:00-02:00").unwrap();
/// assert_eq!((t.day, t.hour, t.minute), (16, 1, 30));
/// assert!(parse_timestamp("sometime after dawn").is_none());
/// ```
pub fn parse_timestamp(text: &str) -> Option<WorldTime> {
    let text = text.trim();
    if text.is_empty() {
        return None;
    }
    if let Ok(instant) = DateTime::parse_from_rfc3339(text) {
        return Some(WorldTime::from_datetime(instant.with_timezone(&Utc)));
    }
    ["%Y-%m-%dT%H:%M:%S%.f", "%Y-%m-%d %H:%M:%S%.f"]
        .iter()
        .find_map(|format| NaiveDateTime::parse_from_str(text, format).ok())
        .map(|naive| WorldTime::from_datetime(naive.and_utc()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn time(fields: [i64; 7]) -> WorldTime {
        let [year, month, day, hour, minute, second, microsecond] = fields;
        WorldTime {
            year,
            month,
            day,
            hour,
            minute,
            second,
            microsecond,
        }
    }

    #[test]
    fn test_tuple_ordering() {
        assert!(time([1492, 3, 15, 0, 0, 0, 1]) > time([1492, 3, 15, 0, 0, 0, 0]));
        assert!(time([1492, 4, 1, 0, 0, 0, 0]) > time([1492, 3, 31, 23, 59, 59, 999_999]));
    }

    #[test]
    fn test_from_object_lenient() {
        let value = json!({"year": 1492, "month": "March", "day": "15", "hour": 9.0, "minute": null});
        assert_eq!(
            WorldTime::from_value(&value),
            Some(time([1492, 3, 15, 9, 0, 0, 0]))
        );
    }

    #[test]
    fn test_from_iso_string() {
        let parsed = WorldTime::from_value(&json!("1492-03-15T10:00:00.000250Z")).unwrap();
        assert_eq!(parsed, time([1492, 3, 15, 10, 0, 0, 250]));
        assert_eq!(
            parse_timestamp("1492-03-15 10:00:00"),
            Some(time([1492, 3, 15, 10, 0, 0, 0]))
        );
        assert!(WorldTime::from_value(&json!("")).is_none());
        assert!(WorldTime::from_value(&json!(42)).is_none());
    }

    #[test]
    fn test_value_round_trip_shape() {
        let t = time([1492, 3, 15, 10, 5, 0, 0]);
        assert_eq!(WorldTime::from_value(&t.to_value()), Some(t));
    }

    #[test]
    fn test_second_carry_rolls_into_day_only() {
        let t = time([1492, 12, 31, 23, 59, 59, 0]);
        assert_eq!(t.advance_seconds(1), Some(time([1492, 12, 32, 0, 0, 0, 0])));
    }

    #[test]
    fn test_microsecond_carry() {
        let t = time([1492, 3, 15, 10, 0, 59, 999_999]);
        assert_eq!(t.advance_microseconds(1), Some(time([1492, 3, 15, 10, 1, 0, 0])));
    }

    #[test]
    fn test_day_overflow_is_refused() {
        let t = time([1492, 3, i64::MAX, 23, 59, 59, 999_999]);
        assert_eq!(t.advance_seconds(1), None);
        assert_eq!(t.advance_microseconds(1), None);
        assert_eq!(time([0, 0, 0, 0, 0, i64::MAX, 0]).advance_seconds(1), None);
    }

    #[test]
    fn test_display() {
        assert_eq!(
            time([1492, 3, 5, 7, 8, 9, 10]).to_string(),
            "1492-03-05 07:08:09.000010"
        );
    }
}
