//! The dynamically-typed metadata value, per §3 and the "Dynamic typing"
//! design note: a tagged-variant value rather than a language-typed struct,
//! because every stage reads and writes an open-ended set of metadata keys.

use chrono::{DateTime, Utc};
use std::collections::HashMap;
use std::fmt;

/// A file's or a template context's metadata map.
pub type Metadata = HashMap<String, Value>;

/// A dynamically-typed metadata value.
///
/// Mirrors the well-known scalar subset from §3: `null, bool, int, float,
/// string, timestamp, list, map`.
#[derive(Debug, Clone, PartialEq)]
pub enum Value {
    /// `null` / `~`.
    Null,
    /// `true` / `false`.
    Bool(bool),
    /// An integer scalar.
    Int(i64),
    /// A floating-point scalar.
    Float(f64),
    /// A string scalar.
    String(String),
    /// A `YYYY-MM-DD` date (UTC midnight) or full ISO-8601 datetime.
    Date(DateTime<Utc>),
    /// An ordered list of values.
    List(Vec<Value>),
    /// A nested map, used for both frontmatter nested objects and for
    /// structured values like `Tag` and `PaginationData`.
    Map(Metadata),
}

impl Value {
    /// Build a `Value::Map` from a list of key/value pairs, for tests and
    /// for stages synthesizing structured metadata.
    pub fn map(entries: impl IntoIterator<Item = (String, Value)>) -> Self {
        Value::Map(entries.into_iter().collect())
    }

    /// Build a `Value::List`.
    pub fn list(entries: impl IntoIterator<Item = Value>) -> Self {
        Value::List(entries.into_iter().collect())
    }

    /// Borrow the value as a string, if it is one. Does not stringify other
    /// variants — callers that want display text should use [`Value::display_string`].
    pub fn as_str(&self) -> Option<&str> {
        match self {
            Value::String(s) => Some(s.as_str()),
            _ => None,
        }
    }

    /// Borrow the value as a bool.
    pub fn as_bool(&self) -> Option<bool> {
        match self {
            Value::Bool(b) => Some(*b),
            _ => None,
        }
    }

    /// Borrow the value as a list.
    pub fn as_list(&self) -> Option<&[Value]> {
        match self {
            Value::List(items) => Some(items.as_slice()),
            _ => None,
        }
    }

    /// Borrow the value as a map.
    pub fn as_map(&self) -> Option<&Metadata> {
        match self {
            Value::Map(m) => Some(m),
            _ => None,
        }
    }

    /// Borrow the value as a date.
    pub fn as_date(&self) -> Option<DateTime<Utc>> {
        match self {
            Value::Date(d) => Some(*d),
            _ => None,
        }
    }

    /// Borrow the value as a number (int or float), widened to `f64`.
    pub fn as_f64(&self) -> Option<f64> {
        match self {
            Value::Int(i) => Some(*i as f64),
            Value::Float(f) => Some(*f),
            _ => None,
        }
    }

    /// `true` for `Value::Null` only.
    pub fn is_null(&self) -> bool {
        matches!(self, Value::Null)
    }

    /// Render a display form suitable for template interpolation. Lists and
    /// maps render empty; callers needing structure should match on the
    /// variant directly instead.
    pub fn display_string(&self) -> String {
        match self {
            Value::Null => String::new(),
            Value::Bool(b) => b.to_string(),
            Value::Int(i) => i.to_string(),
            Value::Float(f) => f.to_string(),
            Value::String(s) => s.clone(),
            Value::Date(d) => d.to_rfc3339(),
            Value::List(_) | Value::Map(_) => String::new(),
        }
    }
}

/// Returns whether every `(key, expected)` pair is satisfied by `metadata`:
/// direct equality, or containment when the actual value is a `Value::List`.
/// Shared by linkset matching and the `filter` predicate collections and
/// pagination accept.
pub fn metadata_matches_all(entries: &[(String, Value)], metadata: &Metadata) -> bool {
    entries.iter().all(|(key, expected)| match metadata.get(key) {
        Some(Value::List(items)) => items.contains(expected),
        Some(other) => other == expected,
        None => false,
    })
}

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.display_string())
    }
}

impl From<&str> for Value {
    fn from(s: &str) -> Self {
        Value::String(s.to_string())
    }
}

impl From<String> for Value {
    fn from(s: String) -> Self {
        Value::String(s)
    }
}

impl From<bool> for Value {
    fn from(b: bool) -> Self {
        Value::Bool(b)
    }
}

impl From<i64> for Value {
    fn from(i: i64) -> Self {
        Value::Int(i)
    }
}

/// Conversion from a parsed `serde_yml::Value` tree, used by the frontmatter
/// decoder. Scalars are widened to `Value`'s variants; strings matching the
/// date/datetime grammar of §4.2 are promoted to `Value::Date` explicitly,
/// since a general-purpose YAML engine does not guarantee timestamp tagging.
impl From<serde_yml::Value> for Value {
    fn from(yml: serde_yml::Value) -> Self {
        use serde_yml::Value as Y;
        match yml {
            Y::Null => Value::Null,
            Y::Bool(b) => Value::Bool(b),
            Y::Number(n) => {
                if let Some(i) = n.as_i64() {
                    Value::Int(i)
                } else if let Some(f) = n.as_f64() {
                    Value::Float(f)
                } else {
                    Value::Null
                }
            }
            Y::String(s) => crate::datefmt::parse_date_scalar(&s)
                .map(Value::Date)
                .unwrap_or(Value::String(s)),
            Y::Sequence(seq) => {
                Value::List(seq.into_iter().map(Value::from).collect())
            }
            Y::Mapping(map) => {
                let mut out = Metadata::new();
                for (k, v) in map {
                    if let Y::String(key) = k {
                        out.insert(key, Value::from(v));
                    }
                }
                Value::Map(out)
            }
            Y::Tagged(tagged) => Value::from(tagged.value),
        }
    }
}

/// Convert a [`Value`] back into a `serde_json::Value`, used where a stage
/// (e.g. the template engine adapter or the config loader's free-form
/// `metadata` section) needs interop with `serde_json`.
impl From<&Value> for serde_json::Value {
    fn from(value: &Value) -> Self {
        match value {
            Value::Null => serde_json::Value::Null,
            Value::Bool(b) => serde_json::Value::Bool(*b),
            Value::Int(i) => serde_json::Value::from(*i),
            Value::Float(f) => serde_json::Number::from_f64(*f)
                .map(serde_json::Value::Number)
                .unwrap_or(serde_json::Value::Null),
            Value::String(s) => serde_json::Value::String(s.clone()),
            Value::Date(d) => serde_json::Value::String(d.to_rfc3339()),
            Value::List(items) => {
                serde_json::Value::Array(items.iter().map(Into::into).collect())
            }
            Value::Map(map) => {
                let mut obj = serde_json::Map::new();
                for (k, v) in map {
                    obj.insert(k.clone(), v.into());
                }
                serde_json::Value::Object(obj)
            }
        }
    }
}

/// Convert a `serde_json::Value` into a [`Value`], used by the config loader
/// when absorbing the free-form `metadata` section of `janos.config.json`.
impl From<&serde_json::Value> for Value {
    fn from(json: &serde_json::Value) -> Self {
        match json {
            serde_json::Value::Null => Value::Null,
            serde_json::Value::Bool(b) => Value::Bool(*b),
            serde_json::Value::Number(n) => {
                if let Some(i) = n.as_i64() {
                    Value::Int(i)
                } else {
                    Value::Float(n.as_f64().unwrap_or(0.0))
                }
            }
            serde_json::Value::String(s) => crate::datefmt::parse_date_scalar(s)
                .map(Value::Date)
                .unwrap_or_else(|| Value::String(s.clone())),
            serde_json::Value::Array(items) => {
                Value::List(items.iter().map(Value::from).collect())
            }
            serde_json::Value::Object(map) => {
                let mut out = Metadata::new();
                for (k, v) in map {
                    out.insert(k.clone(), Value::from(v));
                }
                Value::Map(out)
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn yml_scalars_widen_correctly() {
        let yml: serde_yml::Value = serde_yml::from_str("42").unwrap();
        assert_eq!(Value::from(yml), Value::Int(42));

        let yml: serde_yml::Value = serde_yml::from_str("4.5").unwrap();
        assert_eq!(Value::from(yml), Value::Float(4.5));
    }

    #[test]
    fn yml_date_strings_promote_to_date() {
        let yml: serde_yml::Value =
            serde_yml::from_str("\"2024-01-01\"").unwrap();
        match Value::from(yml) {
            Value::Date(d) => assert_eq!(d.to_rfc3339(), "2024-01-01T00:00:00+00:00"),
            other => panic!("expected Date, got {other:?}"),
        }
    }

    #[test]
    fn json_roundtrip_preserves_shape() {
        let v = Value::map([
            ("a".to_string(), Value::Int(1)),
            ("b".to_string(), Value::list([Value::from("x"), Value::from("y")])),
        ]);
        let json: serde_json::Value = (&v).into();
        assert_eq!(json["a"], 1);
        assert_eq!(json["b"][0], "x");
    }
}
