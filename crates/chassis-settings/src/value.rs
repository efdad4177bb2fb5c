//! Generic settings value wrapper with typed coercions.
//!
//! All coercions are total — they return a fallback rather than panicking —
//! except `as_duration`/`as_time`, which return `Result`.

use std::fmt;
use std::time::Duration;

use chrono::{DateTime, Utc};
use serde::de::{DeserializeOwned, Deserializer as _, Visitor};

#[derive(Debug, Clone, thiserror::Error)]
pub enum ValueError {
    #[error("'{0}' is not a recognized duration")]
    InvalidDuration(String),
    #[error("'{0}' is not a recognized timestamp")]
    InvalidTime(String),
}

/// A settings value in its string form, with typed accessors layered on top.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct Value(pub String);

impl Value {
    pub fn new(raw: impl Into<String>) -> Self {
        Self(raw.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Truthy set: `1`, `true`, `yes` (case-insensitive); everything else is
    /// `false`. Total, never panics.
    pub fn as_bool(&self) -> bool {
        matches!(self.0.to_ascii_lowercase().as_str(), "1" | "true" | "yes")
    }

    pub fn as_i64(&self) -> i64 {
        self.0.trim().parse().unwrap_or_default()
    }

    pub fn as_u64(&self) -> u64 {
        self.0.trim().parse().unwrap_or_default()
    }

    pub fn as_i32(&self) -> i32 {
        self.0.trim().parse().unwrap_or_default()
    }

    pub fn as_u32(&self) -> u32 {
        self.0.trim().parse().unwrap_or_default()
    }

    pub fn as_f64(&self) -> f64 {
        self.0.trim().parse().unwrap_or_default()
    }

    pub fn as_f32(&self) -> f32 {
        self.0.trim().parse().unwrap_or_default()
    }

    /// Parses a `humantime`-style duration string (`"2s"`, `"1h30m"`, …).
    pub fn as_duration(&self) -> Result<Duration, ValueError> {
        humantime::parse_duration(self.0.trim())
            .map_err(|_| ValueError::InvalidDuration(self.0.clone()))
    }

    /// Parses an RFC3339 timestamp, or the scheduler's canonical
    /// `"Wkd,YYYY-MM-DD,HH:MM:SS"` string as a fallback.
    pub fn as_time(&self) -> Result<DateTime<Utc>, ValueError> {
        if let Ok(dt) = DateTime::parse_from_rfc3339(self.0.trim()) {
            return Ok(dt.with_timezone(&Utc));
        }
        chrono::NaiveDateTime::parse_from_str(self.0.trim(), "%a,%Y-%m-%d,%H:%M:%S")
            .map(|naive| DateTime::from_naive_utc_and_offset(naive, Utc))
            .map_err(|_| ValueError::InvalidTime(self.0.clone()))
    }

    /// Parses a byte-size string with suffix `kb|mb|gb|tb|eb` (case
    /// insensitive); bare numbers are bytes. Total — unparseable input is 0.
    pub fn as_size_in_bytes(&self) -> u64 {
        let trimmed = self.0.trim();
        let lower = trimmed.to_ascii_lowercase();

        const UNITS: &[(&str, u64)] = &[
            ("eb", 1u64 << 60),
            ("tb", 1u64 << 40),
            ("gb", 1u64 << 30),
            ("mb", 1u64 << 20),
            ("kb", 1u64 << 10),
        ];

        for (suffix, multiplier) in UNITS {
            if let Some(number) = lower.strip_suffix(suffix) {
                let n: f64 = number.trim().parse().unwrap_or_default();
                return (n * (*multiplier as f64)) as u64;
            }
        }

        lower.parse().unwrap_or_default()
    }

    /// Deserializes this value as a JSON scalar/fragment into `T` via serde.
    /// For non-JSON plain strings, falls back to quoting the raw string so
    /// `Value::new("hello").cast_into::<String>()` still works.
    ///
    /// Struct field names are matched case-insensitively and
    /// underscore-insensitively against the JSON object's keys (so
    /// `{"UserName": "a"}` and `{"user_name": "a"}` both populate a
    /// `user_name` field), via [`AliasDeserializer`] — a wrapper over
    /// `serde_json::Value` that intercepts `deserialize_struct` rather than
    /// walking the target type's fields through reflection.
    pub fn cast_into<T: DeserializeOwned>(&self) -> Option<T> {
        let json = serde_json::from_str(&self.0)
            .or_else(|_| serde_json::from_str(&serde_json::to_string(&self.0).ok()?))
            .ok()?;
        T::deserialize(AliasDeserializer(json)).ok()
    }
}

/// Wraps a `serde_json::Value` and normalizes object keys against the
/// target struct's field names — case-insensitively and with underscores
/// stripped — before handing the (possibly relabeled) object off to
/// `serde_json`'s own struct deserialization. Nested structs below the
/// top level are deserialized by `serde_json::Value` directly and so are
/// not themselves re-normalized.
struct AliasDeserializer(serde_json::Value);

fn normalized_key(s: &str) -> String {
    s.chars().filter(|c| *c != '_').flat_map(char::to_lowercase).collect()
}

fn relabel_object_keys(value: serde_json::Value, fields: &'static [&'static str]) -> serde_json::Value {
    let serde_json::Value::Object(map) = value else {
        return value;
    };

    let mut relabeled = serde_json::Map::with_capacity(map.len());
    for (key, v) in map {
        let canonical = fields.iter().copied().find(|field| normalized_key(field) == normalized_key(&key));
        relabeled.insert(canonical.map(|f| f.to_string()).unwrap_or(key), v);
    }
    serde_json::Value::Object(relabeled)
}

impl<'de> serde::de::Deserializer<'de> for AliasDeserializer {
    type Error = serde_json::Error;

    fn deserialize_any<V: Visitor<'de>>(self, visitor: V) -> Result<V::Value, Self::Error> {
        self.0.deserialize_any(visitor)
    }

    fn deserialize_struct<V: Visitor<'de>>(
        self,
        name: &'static str,
        fields: &'static [&'static str],
        visitor: V,
    ) -> Result<V::Value, Self::Error> {
        relabel_object_keys(self.0, fields).deserialize_struct(name, fields, visitor)
    }

    serde::forward_to_deserialize_any! {
        bool i8 i16 i32 i64 i128 u8 u16 u32 u64 u128 f32 f64 char str string
        bytes byte_buf option unit unit_struct newtype_struct seq tuple
        tuple_struct map enum identifier ignored_any
    }
}

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Converts a byte count back into a human `"5MB"`-style string, the inverse
/// of [`Value::as_size_in_bytes`].
pub fn byte_count(bytes: u64) -> String {
    const UNITS: &[(&str, u64)] = &[
        ("EB", 1u64 << 60),
        ("TB", 1u64 << 40),
        ("GB", 1u64 << 30),
        ("MB", 1u64 << 20),
        ("KB", 1u64 << 10),
    ];

    for (suffix, multiplier) in UNITS {
        if bytes >= *multiplier && bytes % multiplier == 0 {
            return format!("{}{}", bytes / multiplier, suffix);
        }
    }
    bytes.to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn bool_truthy_set() {
        for v in ["1", "true", "TRUE", "yes", "Yes"] {
            assert!(Value::new(v).as_bool(), "{v} should be truthy");
        }
        for v in ["0", "false", "no", ""] {
            assert!(!Value::new(v).as_bool(), "{v} should be falsy");
        }
    }

    #[test]
    fn duration_parses_and_errors() {
        assert_eq!(Value::new("2s").as_duration().unwrap(), Duration::from_secs(2));
        assert!(Value::new("not-a-duration").as_duration().is_err());
    }

    #[test]
    fn size_in_bytes_parses_suffixes() {
        assert_eq!(Value::new("5MB").as_size_in_bytes(), 5 * 1024 * 1024);
        assert_eq!(Value::new("5mb").as_size_in_bytes(), 5 * 1024 * 1024);
        assert_eq!(Value::new("1GB").as_size_in_bytes(), 1024 * 1024 * 1024);
        assert_eq!(Value::new("100").as_size_in_bytes(), 100);
    }

    #[test]
    fn byte_count_is_the_inverse() {
        assert_eq!(byte_count(5 * 1024 * 1024), "5MB");
        assert_eq!(byte_count(100), "100");
    }

    #[test]
    fn numeric_coercions_are_total() {
        assert_eq!(Value::new("not a number").as_i64(), 0);
        assert_eq!(Value::new("42").as_i64(), 42);
    }

    #[derive(serde::Deserialize, PartialEq, Debug)]
    struct Profile {
        user_name: String,
        retry_count: i32,
    }

    #[test]
    fn cast_into_matches_field_names_exactly() {
        let v = Value::new(r#"{"user_name":"ada","retry_count":3}"#);
        assert_eq!(v.cast_into::<Profile>(), Some(Profile { user_name: "ada".into(), retry_count: 3 }));
    }

    #[test]
    fn cast_into_normalizes_case_and_underscores_in_keys() {
        let v = Value::new(r#"{"UserName":"ada","RETRY_COUNT":3}"#);
        assert_eq!(v.cast_into::<Profile>(), Some(Profile { user_name: "ada".into(), retry_count: 3 }));

        let v = Value::new(r#"{"USERNAME":"grace","retrycount":7}"#);
        assert_eq!(v.cast_into::<Profile>(), Some(Profile { user_name: "grace".into(), retry_count: 7 }));
    }

    #[test]
    fn cast_into_quotes_bare_strings() {
        assert_eq!(Value::new("hello").cast_into::<String>(), Some("hello".to_string()));
    }
}
