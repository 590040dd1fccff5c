//! Typed key/value fields carried alongside log entries

use super::error::Result;
use chrono::{DateTime, Utc};
use serde::Serialize;
use std::fmt;
use std::sync::Arc;
use std::time::Duration;

/// A value that knows how to turn itself into loggable structure.
///
/// Marshaling happens at encode time, only for entries that are written.
/// A failure is reported in place of the field and does not stop the entry.
pub trait MarshalLog: Send + Sync {
    fn marshal_log(&self) -> Result<FieldValue>;
}

impl fmt::Debug for dyn MarshalLog {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("MarshalLog(..)")
    }
}

/// Marshals any `Serialize` type through `serde_json`.
struct Serialized<T>(T);

impl<T> MarshalLog for Serialized<T>
where
    T: Serialize + Send + Sync,
{
    fn marshal_log(&self) -> Result<FieldValue> {
        Ok(FieldValue::from(serde_json::to_value(&self.0)?))
    }
}

/// Value type for structured logging fields
#[derive(Debug, Clone)]
pub enum FieldValue {
    String(String),
    Int(i64),
    Uint(u64),
    Float(f64),
    Bool(bool),
    Null,
    Duration(Duration),
    Time(DateTime<Utc>),
    Error(Arc<dyn std::error::Error + Send + Sync>),
    Array(Vec<FieldValue>),
    Object(Vec<Field>),
    /// Opens a nested scope for the fields that follow it.
    Namespace,
    Marshaler(Arc<dyn MarshalLog>),
}

impl fmt::Display for FieldValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FieldValue::String(s) => write!(f, "{}", s),
            FieldValue::Int(i) => write!(f, "{}", i),
            FieldValue::Uint(u) => write!(f, "{}", u),
            FieldValue::Float(fl) => write!(f, "{}", fl),
            FieldValue::Bool(b) => write!(f, "{}", b),
            FieldValue::Null => write!(f, "null"),
            FieldValue::Duration(d) => write!(f, "{:?}", d),
            FieldValue::Time(t) => write!(f, "{}", t.to_rfc3339()),
            FieldValue::Error(e) => write!(f, "{}", e),
            FieldValue::Array(items) => write!(f, "[{} items]", items.len()),
            FieldValue::Object(fields) => write!(f, "{{{} fields}}", fields.len()),
            FieldValue::Namespace => write!(f, "{{"),
            FieldValue::Marshaler(_) => write!(f, "<marshaler>"),
        }
    }
}

impl From<String> for FieldValue {
    fn from(s: String) -> Self {
        FieldValue::String(s)
    }
}

impl From<&str> for FieldValue {
    fn from(s: &str) -> Self {
        FieldValue::String(s.to_string())
    }
}

impl From<i64> for FieldValue {
    fn from(i: i64) -> Self {
        FieldValue::Int(i)
    }
}

impl From<i32> for FieldValue {
    fn from(i: i32) -> Self {
        FieldValue::Int(i64::from(i))
    }
}

impl From<u64> for FieldValue {
    fn from(u: u64) -> Self {
        FieldValue::Uint(u)
    }
}

impl From<u32> for FieldValue {
    fn from(u: u32) -> Self {
        FieldValue::Uint(u64::from(u))
    }
}

impl From<usize> for FieldValue {
    fn from(u: usize) -> Self {
        FieldValue::Uint(u as u64)
    }
}

impl From<f64> for FieldValue {
    fn from(f: f64) -> Self {
        FieldValue::Float(f)
    }
}

impl From<bool> for FieldValue {
    fn from(b: bool) -> Self {
        FieldValue::Bool(b)
    }
}

impl From<Duration> for FieldValue {
    fn from(d: Duration) -> Self {
        FieldValue::Duration(d)
    }
}

impl From<DateTime<Utc>> for FieldValue {
    fn from(t: DateTime<Utc>) -> Self {
        FieldValue::Time(t)
    }
}

impl From<Vec<FieldValue>> for FieldValue {
    fn from(items: Vec<FieldValue>) -> Self {
        FieldValue::Array(items)
    }
}

impl From<serde_json::Value> for FieldValue {
    fn from(value: serde_json::Value) -> Self {
        use serde_json::Value;
        match value {
            Value::Null => FieldValue::Null,
            Value::Bool(b) => FieldValue::Bool(b),
            Value::Number(n) => {
                if let Some(i) = n.as_i64() {
                    FieldValue::Int(i)
                } else if let Some(u) = n.as_u64() {
                    FieldValue::Uint(u)
                } else {
                    FieldValue::Float(n.as_f64().unwrap_or(f64::NAN))
                }
            }
            Value::String(s) => FieldValue::String(s),
            Value::Array(items) => {
                FieldValue::Array(items.into_iter().map(FieldValue::from).collect())
            }
            Value::Object(map) => FieldValue::Object(
                map.into_iter()
                    .map(|(key, value)| Field::new(key, FieldValue::from(value)))
                    .collect(),
            ),
        }
    }
}

/// A key and its value, ready to be encoded into an entry.
///
/// Keys are expected to be non-empty.
#[derive(Debug, Clone)]
pub struct Field {
    pub key: String,
    pub value: FieldValue,
}

impl Field {
    pub fn new(key: impl Into<String>, value: impl Into<FieldValue>) -> Self {
        Self {
            key: key.into(),
            value: value.into(),
        }
    }

    pub fn string(key: impl Into<String>, value: impl Into<String>) -> Self {
        Self::new(key, FieldValue::String(value.into()))
    }

    pub fn int(key: impl Into<String>, value: i64) -> Self {
        Self::new(key, FieldValue::Int(value))
    }

    pub fn uint(key: impl Into<String>, value: u64) -> Self {
        Self::new(key, FieldValue::Uint(value))
    }

    pub fn float(key: impl Into<String>, value: f64) -> Self {
        Self::new(key, FieldValue::Float(value))
    }

    pub fn bool(key: impl Into<String>, value: bool) -> Self {
        Self::new(key, FieldValue::Bool(value))
    }

    pub fn duration(key: impl Into<String>, value: Duration) -> Self {
        Self::new(key, FieldValue::Duration(value))
    }

    pub fn time(key: impl Into<String>, value: DateTime<Utc>) -> Self {
        Self::new(key, FieldValue::Time(value))
    }

    /// Record an error under `key`
    pub fn error<E>(key: impl Into<String>, err: E) -> Self
    where
        E: std::error::Error + Send + Sync + 'static,
    {
        Self::new(key, FieldValue::Error(Arc::new(err)))
    }

    pub fn array(key: impl Into<String>, items: Vec<FieldValue>) -> Self {
        Self::new(key, FieldValue::Array(items))
    }

    /// A nested object built from other fields
    pub fn object(key: impl Into<String>, fields: Vec<Field>) -> Self {
        Self::new(key, FieldValue::Object(fields))
    }

    /// Open a nested scope: every field encoded after this one, in the same
    /// call or in later calls through a derived logger, lands inside `key`.
    pub fn namespace(key: impl Into<String>) -> Self {
        Self::new(key, FieldValue::Namespace)
    }

    /// Any serializable value, marshaled through `serde_json` when encoded
    pub fn any<T>(key: impl Into<String>, value: T) -> Self
    where
        T: Serialize + Send + Sync + 'static,
    {
        Self::new(key, FieldValue::Marshaler(Arc::new(Serialized(value))))
    }

    pub fn marshaler<M>(key: impl Into<String>, value: M) -> Self
    where
        M: MarshalLog + 'static,
    {
        Self::new(key, FieldValue::Marshaler(Arc::new(value)))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_field_constructors() {
        let field = Field::string("url", "http://example.com");
        assert_eq!(field.key, "url");
        assert!(matches!(field.value, FieldValue::String(ref s) if s == "http://example.com"));

        let field = Field::new("attempt", 3);
        assert!(matches!(field.value, FieldValue::Int(3)));

        let field = Field::new("size", 7_usize);
        assert!(matches!(field.value, FieldValue::Uint(7)));

        let field = Field::duration("backoff", Duration::from_secs(1));
        assert!(matches!(field.value, FieldValue::Duration(d) if d == Duration::from_secs(1)));
    }

    #[test]
    fn test_from_json_value() {
        let value = FieldValue::from(json!({"name": "alice", "ids": [1, 2], "ratio": 0.5}));
        let FieldValue::Object(fields) = value else {
            panic!("expected object");
        };
        assert_eq!(fields.len(), 3);
        assert!(fields
            .iter()
            .any(|f| f.key == "ids" && matches!(f.value, FieldValue::Array(ref v) if v.len() == 2)));
        assert!(fields
            .iter()
            .any(|f| f.key == "ratio" && matches!(f.value, FieldValue::Float(r) if r == 0.5)));
    }

    #[test]
    fn test_any_marshals_lazily() {
        #[derive(Serialize)]
        struct User {
            id: u32,
        }

        let field = Field::any("user", User { id: 42 });
        let FieldValue::Marshaler(ref marshaler) = field.value else {
            panic!("expected marshaler");
        };
        let value = marshaler.marshal_log().unwrap();
        assert!(matches!(value, FieldValue::Object(ref f) if f.len() == 1));
    }

    #[test]
    fn test_display() {
        assert_eq!(FieldValue::from("x").to_string(), "x");
        assert_eq!(FieldValue::Null.to_string(), "null");
        assert_eq!(FieldValue::Bool(true).to_string(), "true");
    }
}
