//! Created/updated timestamps and their conversion from stored values

use chrono::{DateTime, NaiveDate, NaiveDateTime, TimeZone, Utc};
use serde::{Deserialize, Serialize};

use super::capabilities::HasTimestamps;
use crate::error::{OrmError, OrmResult};
use crate::value::DatabaseValue;

const OFFSET_FORMAT: &str = "%Y-%m-%d %H:%M:%S %:z";
const NAIVE_FORMAT: &str = "%Y-%m-%d %H:%M:%S";

/// Interpret a stored value as a UTC instant.
///
/// Accepts date-times, integer unix timestamps and strings in RFC 3339,
/// `YYYY-MM-DD HH:MM:SS ±HH:MM` or `YYYY-MM-DD HH:MM:SS` (read as UTC).
pub fn datetime_from_value(value: &DatabaseValue) -> OrmResult<DateTime<Utc>> {
    match value {
        DatabaseValue::DateTime(dt) => Ok(*dt),
        DatabaseValue::Int32(_) | DatabaseValue::Int64(_) => value
            .as_i64()
            .and_then(|secs| Utc.timestamp_opt(secs, 0).single())
            .ok_or_else(|| OrmError::conversion("DateTime<Utc>", value)),
        DatabaseValue::Date(d) => d
            .and_hms_opt(0, 0, 0)
            .map(|naive| naive.and_utc())
            .ok_or_else(|| OrmError::conversion("DateTime<Utc>", value)),
        DatabaseValue::String(s) => parse_datetime(s).ok_or_else(|| OrmError::conversion("DateTime<Utc>", value)),
        other => Err(OrmError::conversion("DateTime<Utc>", other)),
    }
}

fn parse_datetime(input: &str) -> Option<DateTime<Utc>> {
    let input = input.trim();
    if let Ok(dt) = DateTime::parse_from_rfc3339(input) {
        return Some(dt.with_timezone(&Utc));
    }
    if let Ok(dt) = DateTime::parse_from_str(input, OFFSET_FORMAT) {
        return Some(dt.with_timezone(&Utc));
    }
    if let Ok(naive) = NaiveDateTime::parse_from_str(input, NAIVE_FORMAT) {
        return Some(naive.and_utc());
    }
    NaiveDate::parse_from_str(input, "%Y-%m-%d")
        .ok()
        .and_then(|d| d.and_hms_opt(0, 0, 0))
        .map(|naive| naive.and_utc())
}

/// Embeddable created/updated pair for models that track timestamps
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Timestamps {
    pub created: Option<DateTime<Utc>>,
    pub updated: Option<DateTime<Utc>>,
}

impl HasTimestamps for Timestamps {
    fn created(&self) -> Option<DateTime<Utc>> {
        self.created
    }

    fn set_created(&mut self, at: DateTime<Utc>) {
        self.created = Some(at);
    }

    fn updated(&self) -> Option<DateTime<Utc>> {
        self.updated
    }

    fn set_updated(&mut self, at: DateTime<Utc>) {
        self.updated = Some(at);
    }
}
