//! Timestamp conventions for the JSON files.
//!
//! Timestamps are written as RFC 3339 text in UTC (`2024-03-01T18:30:00Z`).
//! Fractional seconds are written only when present, as 3, 6 or 9 digits,
//! so a reload gives back the exact in-memory value. On load, the fields listed by
//! [`EntityKind::date_fields`](super::EntityKind::date_fields) are normalised
//! into that form first, so files written by older tooling (naive
//! timestamps, bare dates, epoch milliseconds) still decode.

use chrono::{DateTime, NaiveDate, NaiveDateTime, SecondsFormat, Utc};
use serde::{Deserialize, Deserializer, Serializer};
use serde_json::Value;

const NAIVE_FORMATS: [&str; 2] = ["%Y-%m-%dT%H:%M:%S%.f", "%Y-%m-%d %H:%M:%S%.f"];

/// Render a timestamp in the canonical on-disk form.
pub fn to_canonical(ts: &DateTime<Utc>) -> String {
    ts.to_rfc3339_opts(SecondsFormat::AutoSi, true)
}

/// Parse any supported textual timestamp.
pub fn parse_text(text: &str) -> Option<DateTime<Utc>> {
    let text = text.trim();
    if let Ok(ts) = DateTime::parse_from_rfc3339(text) {
        return Some(ts.with_timezone(&Utc));
    }
    for format in NAIVE_FORMATS {
        if let Ok(naive) = NaiveDateTime::parse_from_str(text, format) {
            return Some(naive.and_utc());
        }
    }
    NaiveDate::parse_from_str(text, "%Y-%m-%d")
        .ok()
        .and_then(|d| d.and_hms_opt(0, 0, 0))
        .map(|naive| naive.and_utc())
}

/// Interpret a stored JSON value as a timestamp.
///
/// Strings go through [`parse_text`]; integers are epoch milliseconds.
pub fn parse_value(value: &Value) -> Option<DateTime<Utc>> {
    match value {
        Value::String(text) => parse_text(text),
        Value::Number(n) => n.as_i64().and_then(DateTime::from_timestamp_millis),
        _ => None,
    }
}

/// Rewrite the named fields of one stored record into canonical text.
///
/// `null` and absent fields are left alone. Returns the names of fields that
/// held a value that could not be read as a timestamp.
pub fn rehydrate_record(record: &mut Value, fields: &[&'static str]) -> Vec<&'static str> {
    let mut rejected = Vec::new();
    let Some(object) = record.as_object_mut() else {
        return rejected;
    };
    for &field in fields {
        let Some(value) = object.get_mut(field) else {
            continue;
        };
        if value.is_null() {
            continue;
        }
        match parse_value(value) {
            Some(ts) => *value = Value::String(to_canonical(&ts)),
            None => rejected.push(field),
        }
    }
    rejected
}

pub fn serialize<S: Serializer>(ts: &DateTime<Utc>, serializer: S) -> Result<S::Ok, S::Error> {
    serializer.serialize_str(&to_canonical(ts))
}

pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<DateTime<Utc>, D::Error> {
    let text = String::deserialize(deserializer)?;
    parse_text(&text).ok_or_else(|| serde::de::Error::custom(format!("invalid timestamp: {text}")))
}

/// Same convention for optional timestamps; use with `#[serde(default, with = "dates::option")]`.
pub mod option {
    use super::*;

    pub fn serialize<S: Serializer>(
        ts: &Option<DateTime<Utc>>,
        serializer: S,
    ) -> Result<S::Ok, S::Error> {
        match ts {
            Some(ts) => serializer.serialize_some(&to_canonical(ts)),
            None => serializer.serialize_none(),
        }
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(
        deserializer: D,
    ) -> Result<Option<DateTime<Utc>>, D::Error> {
        match Option::<String>::deserialize(deserializer)? {
            Some(text) => parse_text(&text)
                .map(Some)
                .ok_or_else(|| serde::de::Error::custom(format!("invalid timestamp: {text}"))),
            None => Ok(None),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;
    use serde_json::json;

    fn at(y: i32, mo: u32, d: u32, h: u32, mi: u32, s: u32) -> DateTime<Utc> {
        Utc.with_ymd_and_hms(y, mo, d, h, mi, s).unwrap()
    }

    #[test]
    fn test_parse_rfc3339_with_offset() {
        let ts = parse_text("2024-05-01T20:00:00+02:00").unwrap();
        assert_eq!(ts, at(2024, 5, 1, 18, 0, 0));
    }

    #[test]
    fn test_parse_legacy_forms() {
        assert_eq!(
            parse_text("2024-05-01 18:00:00").unwrap(),
            at(2024, 5, 1, 18, 0, 0)
        );
        assert_eq!(
            parse_text("2024-05-01T18:00:00.250").unwrap(),
            at(2024, 5, 1, 18, 0, 0) + chrono::Duration::milliseconds(250)
        );
        assert_eq!(parse_text("2024-05-01").unwrap(), at(2024, 5, 1, 0, 0, 0));
        assert!(parse_text("next tuesday").is_none());
    }

    #[test]
    fn test_parse_epoch_millis() {
        let ts = parse_value(&json!(1_714_586_400_000_i64)).unwrap();
        assert_eq!(ts, at(2024, 5, 1, 18, 0, 0));
    }

    #[test]
    fn test_rehydrate_record_only_touches_listed_fields() {
        let mut record = json!({
            "id": 1,
            "start_time": "2024-05-01 18:00:00",
            "end_time": null,
            "title": "2024-05-01 18:00:00",
        });
        let rejected = rehydrate_record(&mut record, &["start_time", "end_time"]);
        assert!(rejected.is_empty());
        assert_eq!(record["start_time"], json!("2024-05-01T18:00:00Z"));
        assert_eq!(record["end_time"], Value::Null);
        assert_eq!(record["title"], json!("2024-05-01 18:00:00"));
    }

    #[test]
    fn test_rehydrate_record_reports_garbage() {
        let mut record = json!({ "id": 1, "created_at": "soon" });
        let rejected = rehydrate_record(&mut record, &["created_at"]);
        assert_eq!(rejected, vec!["created_at"]);
        assert_eq!(record["created_at"], json!("soon"));
    }

    #[test]
    fn test_canonical_form_keeps_subseconds_only_when_present() {
        assert_eq!(to_canonical(&at(2024, 1, 2, 3, 4, 5)), "2024-01-02T03:04:05Z");
        let precise = at(2024, 1, 2, 3, 4, 5) + chrono::Duration::milliseconds(120);
        assert_eq!(to_canonical(&precise), "2024-01-02T03:04:05.120Z");
        assert_eq!(parse_text(&to_canonical(&precise)).unwrap(), precise);
        let finer = precise + chrono::Duration::microseconds(7);
        assert_eq!(to_canonical(&finer), "2024-01-02T03:04:05.120007Z");
        assert_eq!(parse_text(&to_canonical(&finer)).unwrap(), finer);
    }
}
