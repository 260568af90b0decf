//! Named conversions from raw D-Bus values to typed results.
//!
//! Every function takes the property name it is converting so a failure
//! can be reported as [`ProxyError::Decoding`] tagged with that name.
//! Values wrapped in one or more variants are unwrapped first.

use chrono::{DateTime, Utc};
use zvariant::Value;

use crate::api::models::{ProxyError, Version};
use crate::Result;

fn peel<'a, 'v>(value: &'a Value<'v>) -> &'a Value<'v> {
    match value {
        Value::Value(inner) => peel(inner),
        other => other,
    }
}

/// Short name of a value's type, for error messages.
fn kind(value: &Value<'_>) -> &'static str {
    match value {
        Value::U8(_) => "byte",
        Value::Bool(_) => "boolean",
        Value::I16(_) => "int16",
        Value::U16(_) => "uint16",
        Value::I32(_) => "int32",
        Value::U32(_) => "uint32",
        Value::I64(_) => "int64",
        Value::U64(_) => "uint64",
        Value::F64(_) => "double",
        Value::Str(_) => "string",
        Value::ObjectPath(_) => "object path",
        Value::Array(_) => "array",
        Value::Dict(_) => "dict",
        Value::Structure(_) => "struct",
        Value::Value(_) => "variant",
        _ => "unsupported value",
    }
}

fn mismatch(property: &str, expected: &str, found: &Value<'_>) -> ProxyError {
    ProxyError::decoding(property, format!("expected {expected}, found {}", kind(found)))
}

pub fn text(property: &str, value: &Value<'_>) -> Result<String> {
    match peel(value) {
        Value::Str(s) => Ok(s.as_str().to_owned()),
        other => Err(mismatch(property, "string", other)),
    }
}

pub fn boolean(property: &str, value: &Value<'_>) -> Result<bool> {
    match peel(value) {
        Value::Bool(b) => Ok(*b),
        other => Err(mismatch(property, "boolean", other)),
    }
}

pub fn uint8(property: &str, value: &Value<'_>) -> Result<u8> {
    match peel(value) {
        Value::U8(n) => Ok(*n),
        other => Err(mismatch(property, "byte", other)),
    }
}

pub fn uint32(property: &str, value: &Value<'_>) -> Result<u32> {
    match peel(value) {
        Value::U32(n) => Ok(*n),
        other => Err(mismatch(property, "uint32", other)),
    }
}

pub fn uint64(property: &str, value: &Value<'_>) -> Result<u64> {
    match peel(value) {
        Value::U64(n) => Ok(*n),
        other => Err(mismatch(property, "uint64", other)),
    }
}

pub fn object_path(property: &str, value: &Value<'_>) -> Result<String> {
    match peel(value) {
        Value::ObjectPath(p) => Ok(p.as_str().to_owned()),
        other => Err(mismatch(property, "object path", other)),
    }
}

pub fn object_paths(property: &str, value: &Value<'_>) -> Result<Vec<String>> {
    match peel(value) {
        Value::Array(arr) => arr.iter().map(|v| object_path(property, v)).collect(),
        other => Err(mismatch(property, "array of object paths", other)),
    }
}

/// Byte array decoded as strict UTF-8.
///
/// SSIDs and similar identifiers travel as `ay`. Invalid UTF-8 is an error,
/// never replaced with placeholder characters.
pub fn byte_text(property: &str, value: &Value<'_>) -> Result<String> {
    let inner = peel(value);
    let Value::Array(arr) = inner else {
        return Err(mismatch(property, "byte array", inner));
    };

    let bytes = arr
        .iter()
        .map(|v| match v {
            Value::U8(b) => Ok(*b),
            other => Err(mismatch(property, "byte array", other)),
        })
        .collect::<Result<Vec<u8>>>()?;

    String::from_utf8(bytes).map_err(|e| ProxyError::decoding(property, e.to_string()))
}

/// Microseconds since the Unix epoch as a UTC timestamp.
pub fn usec_datetime(property: &str, value: &Value<'_>) -> Result<DateTime<Utc>> {
    let micros = uint64(property, value)?;
    i64::try_from(micros)
        .ok()
        .and_then(DateTime::from_timestamp_micros)
        .ok_or_else(|| ProxyError::decoding(property, format!("{micros} µs is out of range")))
}

/// Elapsed seconds covered by a sequence of named microsecond durations.
///
/// An overflowing total is a decoding error tagged with the property that
/// pushed it out of range.
pub fn seconds_from_usec(components: &[(&str, u64)]) -> Result<f64> {
    let mut total = 0u64;
    for (property, micros) in components {
        total = total.checked_add(*micros).ok_or_else(|| {
            ProxyError::decoding(property, format!("{micros} µs overflows the total"))
        })?;
    }
    Ok(total as f64 / 1_000_000.0)
}

/// A version string such as `1.22.10` or `2.6.1-dev`.
pub fn version(property: &str, value: &Value<'_>) -> Result<Version> {
    let raw = text(property, value)?;
    raw.parse::<Version>()
        .map_err(|e| ProxyError::decoding(property, e.to_string()))
}
