//! Template data model
//!
//! Generators hand the engine loosely structured dictionaries (usually read
//! from YAML or built from an IDL tree). `Value` is the tagged form of that
//! data: scalars, ordered mappings and sequences.

use crate::error::Result;
use indexmap::IndexMap;
use serde::de::{self, Deserializer, MapAccess, SeqAccess, Visitor};
use serde::{Deserialize, Serialize};
use serde_json::Value as JsonValue;
use std::fmt;

/// Ordered mapping used for nested dictionaries
pub type Mapping = IndexMap<String, Value>;

/// A node of template data
///
/// `Null` is treated as "absent" by key lookups, the same as a missing key.
#[derive(Debug, Clone, PartialEq, Default, Serialize)]
#[serde(untagged)]
pub enum Value {
    #[default]
    Null,
    Bool(bool),
    Int(i64),
    Float(f64),
    String(String),
    Sequence(Vec<Value>),
    Mapping(Mapping),
}

impl Value {
    /// Parse JSON text into a value tree
    pub fn from_json_str(text: &str) -> Result<Self> {
        Ok(serde_json::from_str(text)?)
    }

    /// Parse YAML text into a value tree
    pub fn from_yaml_str(text: &str) -> Result<Self> {
        Ok(serde_yaml::from_str(text)?)
    }

    /// Empty mapping, the usual root for template data
    pub fn mapping() -> Self {
        Value::Mapping(Mapping::new())
    }

    /// Empty sequence
    pub fn sequence() -> Self {
        Value::Sequence(Vec::new())
    }

    /// Builder-style insert. Turns non-mapping values into an empty mapping first.
    pub fn with(mut self, key: impl Into<String>, value: impl Into<Value>) -> Self {
        if !matches!(self, Value::Mapping(_)) {
            self = Value::mapping();
        }
        if let Value::Mapping(map) = &mut self {
            map.insert(key.into(), value.into());
        }
        self
    }

    /// Short name of the variant, used in error messages
    pub fn kind(&self) -> &'static str {
        match self {
            Value::Null => "null",
            Value::Bool(_) => "bool",
            Value::Int(_) => "int",
            Value::Float(_) => "float",
            Value::String(_) => "string",
            Value::Sequence(_) => "sequence",
            Value::Mapping(_) => "mapping",
        }
    }

    pub fn is_null(&self) -> bool {
        matches!(self, Value::Null)
    }

    pub fn as_str(&self) -> Option<&str> {
        match self {
            Value::String(s) => Some(s),
            _ => None,
        }
    }

    pub fn as_i64(&self) -> Option<i64> {
        match self {
            Value::Int(i) => Some(*i),
            _ => None,
        }
    }

    pub fn as_f64(&self) -> Option<f64> {
        match self {
            Value::Float(f) => Some(*f),
            Value::Int(i) => Some(*i as f64),
            _ => None,
        }
    }

    pub fn as_sequence(&self) -> Option<&[Value]> {
        match self {
            Value::Sequence(items) => Some(items),
            _ => None,
        }
    }

    pub fn as_mapping(&self) -> Option<&Mapping> {
        match self {
            Value::Mapping(map) => Some(map),
            _ => None,
        }
    }

    /// Direct child of a mapping
    pub fn get(&self, key: &str) -> Option<&Value> {
        self.as_mapping().and_then(|map| map.get(key))
    }

    /// Walk nested mappings. Only mappings are traversed; sequences and
    /// scalars end the walk. An empty path returns `self`.
    pub fn get_path<S: AsRef<str>>(&self, path: &[S]) -> Option<&Value> {
        let mut current = self;
        for segment in path {
            current = current.get(segment.as_ref())?;
        }
        Some(current)
    }

    /// Text form of a scalar: strings verbatim, numbers in decimal.
    /// Other variants have no text form.
    pub fn to_text(&self) -> Option<String> {
        match self {
            Value::String(s) => Some(s.clone()),
            Value::Int(i) => Some(i.to_string()),
            Value::Float(f) => Some(format_float(*f)),
            _ => None,
        }
    }
}

/// Integral floats keep a trailing `.0` so `2.0` never prints as `2`
fn format_float(f: f64) -> String {
    if f.is_finite() && f.fract() == 0.0 && f.abs() < 1e16 {
        format!("{:.1}", f)
    } else {
        f.to_string()
    }
}

impl<'de> Deserialize<'de> for Value {
    fn deserialize<D>(deserializer: D) -> std::result::Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        deserializer.deserialize_any(ValueVisitor)
    }
}

struct ValueVisitor;

impl<'de> Visitor<'de> for ValueVisitor {
    type Value = Value;

    fn expecting(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("template data")
    }

    fn visit_bool<E: de::Error>(self, b: bool) -> std::result::Result<Value, E> {
        Ok(Value::Bool(b))
    }

    fn visit_i64<E: de::Error>(self, i: i64) -> std::result::Result<Value, E> {
        Ok(Value::Int(i))
    }

    fn visit_u64<E: de::Error>(self, u: u64) -> std::result::Result<Value, E> {
        Ok(i64::try_from(u)
            .map(Value::Int)
            .unwrap_or(Value::Float(u as f64)))
    }

    fn visit_f64<E: de::Error>(self, f: f64) -> std::result::Result<Value, E> {
        Ok(Value::Float(f))
    }

    fn visit_str<E: de::Error>(self, s: &str) -> std::result::Result<Value, E> {
        Ok(Value::String(s.to_string()))
    }

    fn visit_string<E: de::Error>(self, s: String) -> std::result::Result<Value, E> {
        Ok(Value::String(s))
    }

    fn visit_unit<E: de::Error>(self) -> std::result::Result<Value, E> {
        Ok(Value::Null)
    }

    fn visit_none<E: de::Error>(self) -> std::result::Result<Value, E> {
        Ok(Value::Null)
    }

    fn visit_some<D>(self, deserializer: D) -> std::result::Result<Value, D::Error>
    where
        D: Deserializer<'de>,
    {
        Value::deserialize(deserializer)
    }

    fn visit_seq<A>(self, mut seq: A) -> std::result::Result<Value, A::Error>
    where
        A: SeqAccess<'de>,
    {
        let mut items = Vec::with_capacity(seq.size_hint().unwrap_or(0));
        while let Some(item) = seq.next_element()? {
            items.push(item);
        }
        Ok(Value::Sequence(items))
    }

    /// Scalar keys (YAML `1:` or `true:`) are stored under their text form
    fn visit_map<A>(self, mut access: A) -> std::result::Result<Value, A::Error>
    where
        A: MapAccess<'de>,
    {
        let mut map = Mapping::with_capacity(access.size_hint().unwrap_or(0));
        while let Some(key) = access.next_key::<Value>()? {
            let key = key_text(&key).ok_or_else(|| {
                de::Error::custom(format!("mapping key must be a scalar, found {}", key.kind()))
            })?;
            map.insert(key, access.next_value()?);
        }
        Ok(Value::Mapping(map))
    }
}

fn key_text(key: &Value) -> Option<String> {
    match key {
        Value::Null => Some("null".to_string()),
        Value::Bool(b) => Some(b.to_string()),
        other => other.to_text(),
    }
}

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Value::Null => write!(f, "null"),
            Value::Bool(b) => write!(f, "{}", b),
            Value::Int(i) => write!(f, "{}", i),
            Value::Float(v) => write!(f, "{}", format_float(*v)),
            Value::String(s) => write!(f, "{}", s),
            Value::Sequence(items) => write!(f, "<sequence of {}>", items.len()),
            Value::Mapping(map) => write!(f, "<mapping of {}>", map.len()),
        }
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

impl From<i64> for Value {
    fn from(i: i64) -> Self {
        Value::Int(i)
    }
}

impl From<i32> for Value {
    fn from(i: i32) -> Self {
        Value::Int(i as i64)
    }
}

impl From<usize> for Value {
    fn from(i: usize) -> Self {
        i64::try_from(i)
            .map(Value::Int)
            .unwrap_or(Value::Float(i as f64))
    }
}

impl From<f64> for Value {
    fn from(f: f64) -> Self {
        Value::Float(f)
    }
}

impl From<bool> for Value {
    fn from(b: bool) -> Self {
        Value::Bool(b)
    }
}

impl From<Vec<Value>> for Value {
    fn from(items: Vec<Value>) -> Self {
        Value::Sequence(items)
    }
}

impl From<Mapping> for Value {
    fn from(map: Mapping) -> Self {
        Value::Mapping(map)
    }
}

impl From<JsonValue> for Value {
    fn from(json: JsonValue) -> Self {
        match json {
            JsonValue::Null => Value::Null,
            JsonValue::Bool(b) => Value::Bool(b),
            JsonValue::Number(n) => match n.as_i64() {
                Some(i) => Value::Int(i),
                None => Value::Float(n.as_f64().unwrap_or(f64::NAN)),
            },
            JsonValue::String(s) => Value::String(s),
            JsonValue::Array(items) => {
                Value::Sequence(items.into_iter().map(Value::from).collect())
            }
            JsonValue::Object(map) => Value::Mapping(
                map.into_iter()
                    .map(|(k, v)| (k, Value::from(v)))
                    .collect(),
            ),
        }
    }
}

impl FromIterator<Value> for Value {
    fn from_iter<I: IntoIterator<Item = Value>>(iter: I) -> Self {
        Value::Sequence(iter.into_iter().collect())
    }
}

impl<K: Into<String>> FromIterator<(K, Value)> for Value {
    fn from_iter<I: IntoIterator<Item = (K, Value)>>(iter: I) -> Self {
        Value::Mapping(iter.into_iter().map(|(k, v)| (k.into(), v)).collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_from_json_value() {
        let value = Value::from(json!({
            "name": "Foo",
            "count": 3,
            "ratio": 0.5,
            "items": [{"id": 1}, {"id": 2}],
            "missing": null
        }));

        assert_eq!(value.get("name"), Some(&Value::from("Foo")));
        assert_eq!(value.get("count"), Some(&Value::Int(3)));
        assert_eq!(value.get("ratio"), Some(&Value::Float(0.5)));
        assert_eq!(value.get("missing"), Some(&Value::Null));
        assert_eq!(value.get("items").and_then(Value::as_sequence).map(<[Value]>::len), Some(2));
    }

    #[test]
    fn test_mapping_keeps_insertion_order() {
        let value = Value::mapping()
            .with("zeta", 1)
            .with("alpha", 2)
            .with("mid", 3);
        let keys: Vec<&str> = value
            .as_mapping()
            .map(|m| m.keys().map(String::as_str).collect())
            .unwrap_or_default();
        assert_eq!(keys, vec!["zeta", "alpha", "mid"]);
    }

    #[test]
    fn test_get_path() {
        let value = Value::from(json!({"A": {"b": {"c": "deep"}}}));
        assert_eq!(
            value.get_path(&["A", "b", "c"]),
            Some(&Value::from("deep"))
        );
        assert_eq!(value.get_path(&["A", "x"]), None);
        assert_eq!(value.get_path::<&str>(&[]), Some(&value));
    }

    #[test]
    fn test_to_text() {
        assert_eq!(Value::from("x").to_text().as_deref(), Some("x"));
        assert_eq!(Value::Int(-42).to_text().as_deref(), Some("-42"));
        assert_eq!(Value::Float(1.5).to_text().as_deref(), Some("1.5"));
        assert_eq!(Value::Float(2.0).to_text().as_deref(), Some("2.0"));
        assert_eq!(Value::Bool(true).to_text(), None);
        assert_eq!(Value::mapping().to_text(), None);
        assert_eq!(Value::sequence().to_text(), None);
    }

    #[test]
    fn test_from_yaml_str() {
        let yaml = "DeployProject:\n  VSVersion: 800\n  ProjectName: OpenRTM-aist\n  List: [1, 2, 3]\n";
        let value = Value::from_yaml_str(yaml).unwrap();
        assert_eq!(
            value.get_path(&["DeployProject", "VSVersion"]),
            Some(&Value::Int(800))
        );
        assert_eq!(
            value
                .get_path(&["DeployProject", "List"])
                .and_then(Value::as_sequence)
                .map(<[Value]>::len),
            Some(3)
        );
    }

    #[test]
    fn test_yaml_scalar_keys_become_strings() {
        let value = Value::from_yaml_str("1: a\ntrue: b\n2.5: c\n~: d\nname: e\n").unwrap();
        let keys: Vec<&str> = value
            .as_mapping()
            .map(|m| m.keys().map(String::as_str).collect())
            .unwrap_or_default();
        assert_eq!(keys, vec!["1", "true", "2.5", "null", "name"]);
        assert_eq!(value.get("1"), Some(&Value::from("a")));

        let err = Value::from_yaml_str("? [1, 2]\n: a\n").unwrap_err();
        assert_eq!(err.error_code(), "E_YAML");
    }

    #[test]
    fn test_from_json_str_numbers() {
        let value = Value::from_json_str(r#"{"i": 3, "f": 2.0, "big": 18446744073709551615}"#).unwrap();
        assert_eq!(value.get("i"), Some(&Value::Int(3)));
        assert_eq!(value.get("f"), Some(&Value::Float(2.0)));
        assert!(matches!(value.get("big"), Some(Value::Float(_))));
    }

    #[test]
    fn test_from_json_str_error() {
        let err = Value::from_json_str("{not json").unwrap_err();
        assert_eq!(err.error_code(), "E_JSON");
    }

    #[test]
    fn test_collect_into_value() {
        let seq: Value = vec!["a", "b"].into_iter().map(Value::from).collect();
        assert_eq!(seq.as_sequence().map(<[Value]>::len), Some(2));

        let map: Value = vec![("k", Value::Int(1))].into_iter().collect();
        assert_eq!(map.get("k"), Some(&Value::Int(1)));
    }
}
