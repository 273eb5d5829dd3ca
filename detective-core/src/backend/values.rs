//! Conversion of DuckDB cell values into JSON.

use base64::Engine as _;
use base64::engine::general_purpose::STANDARD as BASE64;
use chrono::{DateTime, NaiveDate, NaiveTime};
use duckdb::types::{TimeUnit, Value};
use serde_json::{Number, Value as JsonValue};

/// Days between 0001-01-01 (chrono's CE day 1) and the Unix epoch.
const UNIX_EPOCH_DAYS_FROM_CE: i32 = 719_163;

/// Converts one DuckDB value into its JSON representation.
///
/// Integers and floats become numbers (non-finite floats become null),
/// decimals are rendered as numbers, temporal values as ISO-like strings,
/// blobs as base64 strings and lists as arrays. Types without a natural
/// JSON form fall back to their debug rendering.
pub fn to_json(value: Value) -> JsonValue {
    match value {
        Value::Null => JsonValue::Null,
        Value::Boolean(b) => JsonValue::Bool(b),
        Value::TinyInt(v) => JsonValue::from(v),
        Value::SmallInt(v) => JsonValue::from(v),
        Value::Int(v) => JsonValue::from(v),
        Value::BigInt(v) => JsonValue::from(v),
        Value::UTinyInt(v) => JsonValue::from(v),
        Value::USmallInt(v) => JsonValue::from(v),
        Value::UInt(v) => JsonValue::from(v),
        Value::UBigInt(v) => JsonValue::from(v),
        Value::HugeInt(v) => match i64::try_from(v) {
            Ok(small) => JsonValue::from(small),
            Err(_) => JsonValue::String(v.to_string()),
        },
        Value::Float(v) => float_to_json(f64::from(v)),
        Value::Double(v) => float_to_json(v),
        Value::Decimal(d) => {
            let text = d.to_string();
            text.parse::<f64>()
                .ok()
                .and_then(Number::from_f64)
                .map_or(JsonValue::String(text), JsonValue::Number)
        }
        Value::Text(s) | Value::Enum(s) => JsonValue::String(s),
        Value::Blob(bytes) => JsonValue::String(BASE64.encode(bytes)),
        Value::Date32(days) => date_to_json(days),
        Value::Timestamp(unit, v) => timestamp_to_json(unit, v),
        Value::Time64(unit, v) => time_to_json(unit, v),
        Value::List(items) => JsonValue::Array(items.into_iter().map(to_json).collect()),
        other => JsonValue::String(format!("{other:?}")),
    }
}

/// Renders a JSON value the way a histogram bucket label is shown.
///
/// Strings are taken verbatim, null becomes `"null"`, everything else uses
/// its JSON text.
pub fn display_value(value: &JsonValue) -> String {
    match value {
        JsonValue::String(s) => s.clone(),
        JsonValue::Null => "null".to_string(),
        other => other.to_string(),
    }
}

/// Reads a JSON value as a float, accepting numbers and numeric strings.
pub fn as_f64(value: &JsonValue) -> Option<f64> {
    match value {
        JsonValue::Number(n) => n.as_f64(),
        JsonValue::String(s) => s.parse().ok(),
        _ => None,
    }
}

/// Reads a JSON value as an unsigned count.
pub fn as_u64(value: &JsonValue) -> Option<u64> {
    match value {
        JsonValue::Number(n) => n.as_u64(),
        JsonValue::String(s) => s.parse().ok(),
        _ => None,
    }
}

fn float_to_json(v: f64) -> JsonValue {
    Number::from_f64(v).map_or(JsonValue::Null, JsonValue::Number)
}

fn to_micros(unit: TimeUnit, value: i64) -> i64 {
    match unit {
        TimeUnit::Second => value.saturating_mul(1_000_000),
        TimeUnit::Millisecond => value.saturating_mul(1_000),
        TimeUnit::Microsecond => value,
        TimeUnit::Nanosecond => value.div_euclid(1_000),
    }
}

fn date_to_json(days: i32) -> JsonValue {
    days.checked_add(UNIX_EPOCH_DAYS_FROM_CE)
        .and_then(NaiveDate::from_num_days_from_ce_opt)
        .map_or(JsonValue::Null, |date| {
            JsonValue::String(date.format("%Y-%m-%d").to_string())
        })
}

fn timestamp_to_json(unit: TimeUnit, value: i64) -> JsonValue {
    DateTime::from_timestamp_micros(to_micros(unit, value)).map_or(JsonValue::Null, |ts| {
        JsonValue::String(ts.naive_utc().format("%Y-%m-%d %H:%M:%S%.f").to_string())
    })
}

fn time_to_json(unit: TimeUnit, value: i64) -> JsonValue {
    let micros = to_micros(unit, value);
    let secs = u32::try_from(micros.div_euclid(1_000_000)).ok();
    let nanos = u32::try_from(micros.rem_euclid(1_000_000).saturating_mul(1_000)).ok();
    secs.zip(nanos)
        .and_then(|(s, n)| NaiveTime::from_num_seconds_from_midnight_opt(s, n))
        .map_or(JsonValue::Null, |time| {
            JsonValue::String(time.format("%H:%M:%S%.f").to_string())
        })
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_scalar_conversions() {
        assert_eq!(to_json(Value::Null), JsonValue::Null);
        assert_eq!(to_json(Value::Boolean(true)), json!(true));
        assert_eq!(to_json(Value::Int(-7)), json!(-7));
        assert_eq!(to_json(Value::BigInt(42)), json!(42));
        assert_eq!(to_json(Value::UBigInt(u64::MAX)), json!(u64::MAX));
        assert_eq!(to_json(Value::Double(1.5)), json!(1.5));
        assert_eq!(to_json(Value::Text("abc".to_string())), json!("abc"));
    }

    #[test]
    fn test_hugeint_conversion() {
        assert_eq!(to_json(Value::HugeInt(12)), json!(12));
        let big = i128::from(i64::MAX) + 1;
        assert_eq!(to_json(Value::HugeInt(big)), json!(big.to_string()));
    }

    #[test]
    fn test_non_finite_floats_become_null() {
        assert_eq!(to_json(Value::Double(f64::NAN)), JsonValue::Null);
        assert_eq!(to_json(Value::Float(f32::INFINITY)), JsonValue::Null);
    }

    #[test]
    fn test_blob_is_base64() {
        assert_eq!(to_json(Value::Blob(b"hi".to_vec())), json!("aGk="));
    }

    #[test]
    fn test_temporal_conversions() {
        assert_eq!(to_json(Value::Date32(0)), json!("1970-01-01"));
        assert_eq!(to_json(Value::Date32(19_723)), json!("2024-01-01"));
        assert_eq!(
            to_json(Value::Timestamp(TimeUnit::Second, 86_400)),
            json!("1970-01-02 00:00:00")
        );
        assert_eq!(
            to_json(Value::Time64(TimeUnit::Microsecond, 3_661_000_000)),
            json!("01:01:01")
        );
    }

    #[test]
    fn test_out_of_range_temporals_become_null() {
        assert_eq!(to_json(Value::Date32(i32::MAX)), JsonValue::Null);
        assert_eq!(to_json(Value::Timestamp(TimeUnit::Second, i64::MAX)), JsonValue::Null);
        assert_eq!(to_json(Value::Time64(TimeUnit::Nanosecond, -1)), JsonValue::Null);
        assert_eq!(
            to_json(Value::Timestamp(TimeUnit::Nanosecond, -1)),
            json!("1969-12-31 23:59:59.999999")
        );
    }

    #[test]
    fn test_list_conversion() {
        let list = Value::List(vec![Value::Int(1), Value::Null]);
        assert_eq!(to_json(list), json!([1, null]));
    }

    #[test]
    fn test_display_value() {
        assert_eq!(display_value(&json!("north")), "north");
        assert_eq!(display_value(&JsonValue::Null), "null");
        assert_eq!(display_value(&json!(3)), "3");
        assert_eq!(display_value(&json!(true)), "true");
    }

    #[test]
    fn test_numeric_readers() {
        assert_eq!(as_f64(&json!(2.5)), Some(2.5));
        assert_eq!(as_f64(&json!("2.5")), Some(2.5));
        assert_eq!(as_f64(&JsonValue::Null), None);
        assert_eq!(as_u64(&json!(9)), Some(9));
        assert_eq!(as_u64(&json!(-1)), None);
    }
}
